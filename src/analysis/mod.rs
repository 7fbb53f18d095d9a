// =============================================================================
// Analysis Requester
// =============================================================================
//
// Turns the active signal set into a prompt for the hosted text-generation
// model. The client is built explicitly at startup; a missing API key yields
// the `Unconfigured` variant, which answers with a fixed advisory message
// instead of calling out.
// =============================================================================

pub mod gemini;
pub mod prompt;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::signals::Signal;

pub use gemini::{GeminiClient, GeminiSettings};
pub use prompt::build_prompt;

/// Reply when there is nothing to analyse.
pub const NO_SIGNALS_MESSAGE: &str = "No active signals to analyze.";
/// Reply when no API key is configured.
pub const UNCONFIGURED_MESSAGE: &str = "Gemini API key is not configured. Analysis is unavailable.";
/// User-facing message for a failed analysis call.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to get analysis from Gemini.";

/// Environment variables checked, in order, for the API key.
pub const API_KEY_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];

/// The analysis backend, either ready to call out or explicitly disabled.
#[derive(Debug, Clone)]
pub enum AnalysisClient {
    Configured(GeminiClient),
    Unconfigured,
}

impl AnalysisClient {
    /// Build from an optional API key. Blank keys count as missing.
    pub fn new(api_key: Option<String>, settings: GeminiSettings) -> Result<Self> {
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                info!(model = %settings.model, "analysis client configured");
                Ok(Self::Configured(GeminiClient::new(key, settings)?))
            }
            None => {
                warn!(vars = ?API_KEY_VARS, "no API key set, AI analysis is unavailable");
                Ok(Self::Unconfigured)
            }
        }
    }

    /// Read the API key from the process environment.
    pub fn from_env(settings: GeminiSettings) -> Result<Self> {
        Self::from_lookup(settings, |name| std::env::var(name).ok())
    }

    /// First non-blank value among [`API_KEY_VARS`], in order.
    fn from_lookup(settings: GeminiSettings, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = API_KEY_VARS
            .iter()
            .find_map(|v| lookup(v).filter(|k| !k.trim().is_empty()));
        Self::new(key, settings)
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Market summary for `signals`.
    ///
    /// Empty input and a missing key both short-circuit with a fixed message
    /// and make no network call. Call failures are returned as-is; there is no
    /// retry at this layer.
    pub async fn analyze_signals(&self, signals: &[Signal]) -> Result<String, AnalysisError> {
        if signals.is_empty() {
            return Ok(NO_SIGNALS_MESSAGE.to_string());
        }

        let client = match self {
            Self::Configured(client) => client,
            Self::Unconfigured => return Ok(UNCONFIGURED_MESSAGE.to_string()),
        };

        let prompt = build_prompt(signals);
        client.generate(&prompt).await
    }
}
