use clap::Args;
use secrecy::{ExposeSecret, SecretString};

use crate::analysis::{GeminiAnalyzer, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Settings for the analysis endpoint. Sources, in order of precedence:
/// - CLI arguments
/// - `GEMINI_API_KEY` / `EDUSTREAM_MODEL` / `EDUSTREAM_API_BASE`
/// - `API_KEY` (key only)
#[derive(Clone, Args)]
pub struct AnalysisSettings {
    /// API key for the generative-AI service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model used for performance analysis
    #[arg(long, env = "EDUSTREAM_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the generative-AI API
    #[arg(long, env = "EDUSTREAM_API_BASE", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_base: String,
}

impl AnalysisSettings {
    /// A missing key is not an error here; the request is sent anyway and
    /// fails remotely.
    pub fn api_key(&self) -> SecretString {
        resolve_api_key(self.api_key.as_deref(), std::env::var("API_KEY").ok())
    }

    pub fn analyzer(&self) -> GeminiAnalyzer {
        let key = self.api_key();
        if key.expose_secret().is_empty() {
            tracing::warn!("no API key configured; analysis requests will be rejected");
        }
        GeminiAnalyzer::new(&self.api_base, &self.model, key)
    }
}

fn resolve_api_key(explicit: Option<&str>, fallback: Option<String>) -> SecretString {
    let key = explicit
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or(fallback)
        .unwrap_or_default();
    SecretString::new(key.into_boxed_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: AnalysisSettings,
    }

    #[test]
    fn explicit_key_wins() {
        let key = resolve_api_key(Some("cli-key"), Some("env-key".into()));
        assert_eq!(key.expose_secret(), "cli-key");
    }

    #[test]
    fn falls_back_then_defaults_to_empty() {
        let key = resolve_api_key(Some(""), Some("env-key".into()));
        assert_eq!(key.expose_secret(), "env-key");

        let key = resolve_api_key(None, None);
        assert_eq!(key.expose_secret(), "");
    }

    #[test]
    fn arguments_override_defaults() {
        let cli = TestCli::parse_from([
            "edustream",
            "--api-key",
            "abc",
            "--model",
            "gemini-test",
            "--api-base",
            "http://127.0.0.1:9000",
        ]);
        assert_eq!(cli.settings.api_key.as_deref(), Some("abc"));
        assert_eq!(cli.settings.model, "gemini-test");
        assert_eq!(cli.settings.api_base, "http://127.0.0.1:9000");
    }
}
