// =============================================================================
// Relative Strength Index (RSI) — simple windowed form
// =============================================================================
//
// Unlike Wilder's smoothed RSI this version looks only at the trailing
// `period` closes:
//
// Step 1 — Take the deltas between consecutive closes in the window
//          (`period - 1` deltas).
// Step 2 — gains = Σ positive deltas, losses = Σ |negative deltas|.
// Step 3 — avg_gain = gains / period, avg_loss = losses / period.
// Step 4 — avg_loss == 0 => RSI = 100
//          otherwise RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS)
//
// The result always lies in [0, 100].
// =============================================================================

/// RSI over the last `period` closes.
///
/// # Edge cases
/// - `period == 0` or `closes.len() < period` => `None`
/// - No down moves in the window (including a flat window) => `100.0`
pub fn window_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let (gains, losses) = window.windows(2).fold((0.0_f64, 0.0_f64), |(g, l), w| {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            (g + delta, l)
        } else {
            (g, l - delta)
        }
    });

    let period_f = period as f64;
    let avg_gain = gains / period_f;
    let avg_loss = losses / period_f;

    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}
