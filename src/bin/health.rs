use std::env;
use std::error;
use std::process::ExitCode;

use reqwest::Url;

const DEFAULT_HEALTH_URL: &str = "http://127.0.0.1:25566/health";

/// Probes the health endpoint, for use as a container healthcheck.
fn main() -> Result<ExitCode, Box<dyn error::Error>> {
    let url = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_HEALTH_URL.to_string());
    let url = Url::parse(&url)?;

    let response = reqwest::blocking::get(url)?;
    if !response.status().is_success() {
        eprintln!("Health check failed with status {}", response.status());
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
