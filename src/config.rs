//! Configuration parsing and validation for the gateway binary.
//!
//! Command-line arguments with environment fallbacks, parsed with clap. The
//! completion backend settings come from the environment in every real
//! deployment; the flags exist for local runs.
use anyhow::anyhow;
use clap::Parser;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the gateway listens.
    #[arg(short = 'p', long, default_value_t = 3000)]
    pub port: u16,

    /// Base URL of the OpenAI-compatible completion backend.
    #[arg(long, env = "HYGEIA_COMPLETIONS_URL")]
    pub completions_url: Url,

    /// Model name sent with every completion request.
    #[arg(long, env = "HYGEIA_COMPLETIONS_MODEL")]
    pub completions_model: String,

    /// Bearer key for the completion backend, if it requires one.
    #[arg(long, env = "HYGEIA_COMPLETIONS_KEY")]
    pub completions_key: Option<String>,

    /// Seconds to wait for one completion call before failing the request.
    #[arg(long, default_value_t = 120)]
    pub completion_timeout_secs: u64,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, default_value_t = true)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "hygeia")]
    pub metrics_prefix: String,
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if self.completions_url.host_str().is_none() {
            return Err(anyhow!(
                "Completions URL '{}' has no host",
                self.completions_url
            ));
        }
        if self.completion_timeout_secs == 0 {
            return Err(anyhow!("Completion timeout must be at least one second"));
        }
        Ok(self)
    }
}
