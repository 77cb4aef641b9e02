use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Which inference implementation backs the detector and the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// Pretrained ONNX models loaded from `MODELS_DIR`.
    Onnx,
    /// Deterministic stand-ins that need no weights.
    Stub,
}

impl FromStr for ModelBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(ModelBackend::Onnx),
            "stub" => Ok(ModelBackend::Stub),
            other => Err(format!("unknown model backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Limits applied to each analysis run. All lengths are in characters
/// unless the name says tokens.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub extract_char_cap: usize,
    pub detector_char_limit: usize,
    pub detector_max_tokens: usize,
    pub detector_ai_label_index: usize,
    pub summary_input_cap: usize,
    pub summary_chunk_chars: usize,
    pub summary_min_tokens: usize,
    pub summary_max_tokens: usize,
    pub preview_chars: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            extract_char_cap: 3000,
            detector_char_limit: 1000,
            detector_max_tokens: 512,
            detector_ai_label_index: 0,
            summary_input_cap: 2000,
            summary_chunk_chars: 1000,
            summary_min_tokens: 30,
            summary_max_tokens: 100,
            preview_chars: 1500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub max_concurrent_requests: usize,
    pub request_timeout_seconds: u64,
    pub model_backend: ModelBackend,
    pub models_dir: PathBuf,
    pub inference_threads: usize,
    pub log_format: LogFormat,
    pub analysis: AnalysisSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests can
    /// feed values without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AnalysisSettings::default();

        let analysis = AnalysisSettings {
            extract_char_cap: parse_var(&lookup, "EXTRACT_CHAR_CAP", defaults.extract_char_cap)?,
            detector_char_limit: parse_var(&lookup, "DETECTOR_CHAR_LIMIT", defaults.detector_char_limit)?,
            detector_max_tokens: parse_var(&lookup, "DETECTOR_MAX_TOKENS", defaults.detector_max_tokens)?,
            detector_ai_label_index: parse_var(
                &lookup,
                "DETECTOR_AI_LABEL_INDEX",
                defaults.detector_ai_label_index,
            )?,
            summary_input_cap: parse_var(&lookup, "SUMMARY_INPUT_CAP", defaults.summary_input_cap)?,
            summary_chunk_chars: parse_var(&lookup, "SUMMARY_CHUNK_CHARS", defaults.summary_chunk_chars)?,
            summary_min_tokens: parse_var(&lookup, "SUMMARY_MIN_TOKENS", defaults.summary_min_tokens)?,
            summary_max_tokens: parse_var(&lookup, "SUMMARY_MAX_TOKENS", defaults.summary_max_tokens)?,
            preview_chars: parse_var(&lookup, "PREVIEW_CHARS", defaults.preview_chars)?,
        };

        // PORT wins over SERVER_PORT on hosted platforms
        let server_port = match lookup("PORT") {
            Some(_) => parse_var(&lookup, "PORT", 8080u16)?,
            None => parse_var(&lookup, "SERVER_PORT", 8080u16)?,
        };

        let config = Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            server_port,
            max_file_size_mb: parse_var(&lookup, "MAX_FILE_SIZE_MB", 10)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            max_concurrent_requests: parse_var(&lookup, "MAX_CONCURRENT_REQUESTS", 4)
                .context("Failed to parse MAX_CONCURRENT_REQUESTS")?,
            request_timeout_seconds: parse_var(&lookup, "REQUEST_TIMEOUT_SECONDS", 120)
                .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
            model_backend: parse_var(&lookup, "MODEL_BACKEND", ModelBackend::Onnx)?,
            models_dir: lookup("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("models")),
            inference_threads: parse_var(&lookup, "INFERENCE_THREADS", 4)?,
            log_format: parse_var(&lookup, "LOG_FORMAT", LogFormat::Text)?,
            analysis,
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.inference_threads == 0 {
            return Err(anyhow::anyhow!("INFERENCE_THREADS must be greater than 0"));
        }

        let a = &self.analysis;
        for (name, value) in [
            ("EXTRACT_CHAR_CAP", a.extract_char_cap),
            ("DETECTOR_CHAR_LIMIT", a.detector_char_limit),
            ("DETECTOR_MAX_TOKENS", a.detector_max_tokens),
            ("SUMMARY_INPUT_CAP", a.summary_input_cap),
            ("SUMMARY_CHUNK_CHARS", a.summary_chunk_chars),
            ("SUMMARY_MAX_TOKENS", a.summary_max_tokens),
            ("PREVIEW_CHARS", a.preview_chars),
        ] {
            if value == 0 {
                return Err(anyhow::anyhow!("{} must be greater than 0", name));
            }
        }
        if a.detector_ai_label_index > 1 {
            return Err(anyhow::anyhow!("DETECTOR_AI_LABEL_INDEX must be 0 or 1"));
        }
        if a.summary_chunk_chars > a.summary_input_cap {
            return Err(anyhow::anyhow!(
                "SUMMARY_CHUNK_CHARS ({}) must not exceed SUMMARY_INPUT_CAP ({})",
                a.summary_chunk_chars,
                a.summary_input_cap
            ));
        }
        if a.summary_min_tokens > a.summary_max_tokens {
            return Err(anyhow::anyhow!("SUMMARY_MIN_TOKENS must not exceed SUMMARY_MAX_TOKENS"));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match lookup(var_name) {
        Some(val) => match val.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                Ok(default)
            }
        },
        None => {
            info!("{} not set, using default: {:?}", var_name, default);
            Ok(default)
        }
    }
}
