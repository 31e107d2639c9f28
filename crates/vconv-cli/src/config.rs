//! CLI configuration.

use vconv_media::EngineResources;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, colored
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub log_format: LogFormat,
    /// Default `EnvFilter` directives when `RUST_LOG` is unset
    pub log_filter: String,
    pub engine: EngineResources,
}

impl CliConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            log_filter: std::env::var("VCONV_LOG_FILTER")
                .unwrap_or_else(|_| "vconv_cli=info,vconv_media=info".to_string()),
            engine: EngineResources::from_env(),
        }
    }
}
