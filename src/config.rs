use std::time::Duration;

use anyhow::Result;
use clap_serde_derive::ClapSerde;

use crate::inference::openai::OpenAiCompatibleConfig;

#[derive(ClapSerde, Debug)]
pub struct Config {
    /// The address the listener binds to
    #[default("0.0.0.0".to_string())]
    #[arg(short, long, env)]
    pub address: String,

    /// The port the listener binds to
    #[default(25566)]
    #[arg(short, long, env)]
    pub port: u16,

    /// Base URL of the OpenAI compatible API, including the version segment
    #[default("http://localhost:11434/v1".to_string())]
    #[arg(long, env)]
    pub backend_url: String,

    /// Model used for structuring
    #[default("llama3.1".to_string())]
    #[arg(long, env)]
    pub backend_model: String,

    /// Bearer token sent to the backend, empty to send none
    #[default(String::new())]
    #[arg(long, env, hide_env_values = true)]
    pub backend_api_key: String,

    /// Sampling temperature of the backend model
    #[default(0.0)]
    #[arg(long, env)]
    pub backend_temperature: f32,

    /// Deadline in seconds for structuring a single request, 0 to disable
    #[default(60)]
    #[arg(long, env)]
    pub request_timeout_secs: u64,

    /// OTLP collector endpoint, empty to only log to the console
    #[default(String::new())]
    #[arg(long, env)]
    pub otlp_endpoint: String,

    /// Also log to the console when exporting to an OTLP collector
    #[default(false)]
    #[arg(long, env)]
    pub console: bool,
}

impl Config {
    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        let opt: <Config as ClapSerde>::Opt = toml::from_str(&str)?;
        Ok(Config::from(opt))
    }

    pub fn backend(&self) -> OpenAiCompatibleConfig {
        OpenAiCompatibleConfig {
            base_url: self.backend_url.clone(),
            model: self.backend_model.clone(),
            api_key: non_empty(&self.backend_api_key),
            temperature: self.backend_temperature,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn otlp_endpoint(&self) -> Option<String> {
        non_empty(&self.otlp_endpoint)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
