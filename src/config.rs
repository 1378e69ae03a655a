// Configuration: the deployment-time settings of a run, gathered into one
// value that is handed to each component instead of living in globals.

use std::path::PathBuf;

use crate::error::{PipelineError, Result};

pub const DEFAULT_PEXELS_API_URL: &str = "https://api.pexels.com/v1";
pub const DEFAULT_BLOGGER_API_URL: &str = "https://www.googleapis.com/blogger/v3";
pub const DEFAULT_AWS_REGION: &str = "eu-central-1";

/// Credentials and location of the S3 bucket images are rehosted to.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
    /// Serve objects from here instead of the bucket's own endpoint (CDN).
    pub public_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub pexels_api_key: String,
    pub pexels_api_url: String,
    pub storage: StorageConfig,
    pub blogger_api_url: String,
    pub blog_id: String,
    pub client_secret_path: PathBuf,
    pub token_path: PathBuf,
}

impl Config {
    /// Build the configuration from environment variables. Paths default
    /// to files under the user's config directory (`blogpub/`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PipelineError::Config(format!("{} is not set", key)))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_dir = default_config_dir();

        Ok(Config {
            pexels_api_key: required("PEXELS_API_KEY")?,
            pexels_api_url: optional("PEXELS_API_URL")
                .unwrap_or_else(|| DEFAULT_PEXELS_API_URL.into()),
            storage: StorageConfig {
                access_key: required("AWS_ACCESS_KEY_ID")?,
                secret_key: required("AWS_SECRET_ACCESS_KEY")?,
                region: optional("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.into()),
                bucket: required("BLOGPUB_BUCKET")?,
                public_base_url: optional("BLOGPUB_PUBLIC_BASE_URL"),
            },
            blogger_api_url: optional("BLOGGER_API_URL")
                .unwrap_or_else(|| DEFAULT_BLOGGER_API_URL.into()),
            blog_id: required("BLOGGER_BLOG_ID")?,
            client_secret_path: optional("GOOGLE_CLIENT_SECRET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| base_dir.join("client_secret.json")),
            token_path: optional("GOOGLE_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| base_dir.join("token.json")),
        })
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("blogpub")
}
