// =============================================================================
// Signals Module
// =============================================================================
//
// Mock signal detection and the background refresh loop that keeps the
// dashboard's active signal list current.

pub mod generator;
pub mod poller;

pub use generator::{generate_signals, Signal, SignalDetails, SIGNAL_RULE};
pub use poller::{refresh_signals, run_signal_poller};
