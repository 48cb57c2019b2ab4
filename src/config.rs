//! Application configuration and environment variable parsing.
//!
//! This module handles loading configuration settings from the environment (e.g., .env file).
//! It defines the `AppConfig` struct which carries the GitHub credential and API location
//! into the endpoint client, plus the settings the HTTP server needs at start-up.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Optional GitHub Personal Access Token. Requests go out unauthenticated without it.
    pub github_pat: Option<String>,

    /// Base URL of the GitHub REST API.
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the pre-built dashboard front-end.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "dist".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// The API base URL without a trailing slash, ready for path concatenation.
    pub fn api_base(&self) -> &str {
        self.github_api_url.trim_end_matches('/')
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github_pat: None,
            github_api_url: default_github_api_url(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}
