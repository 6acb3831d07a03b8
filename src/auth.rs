use std::fmt;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::constants::ACCESS_TOKEN_ENV;
use crate::error::{AppError, AppResult};
use crate::settings::Settings;

/// OAuth bearer token of the invoking user
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Finds a token in this order: environment variable, token file from
    /// the settings, then `gcloud auth print-access-token`.
    pub fn resolve(settings: &Settings) -> AppResult<Self> {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                return Ok(Self::new(token.trim()));
            }
        }

        if let Some(ref path) = settings.access_token_file {
            return Self::from_file(Path::new(path));
        }

        Self::from_gcloud()
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Credential(format!("cannot read token file {}: {}", path.display(), e))
        })?;
        let token = content.trim();
        if token.is_empty() {
            return Err(AppError::Credential(format!(
                "token file {} is empty",
                path.display()
            )));
        }
        debug!("Using access token from {}", path.display());
        Ok(Self::new(token))
    }

    fn from_gcloud() -> AppResult<Self> {
        let output = Command::new("gcloud")
            .arg("auth")
            .arg("print-access-token")
            .output()
            .map_err(|e| {
                AppError::Credential(format!(
                    "set {} or install the gcloud CLI ({})",
                    ACCESS_TOKEN_ENV, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Credential(format!(
                "gcloud auth print-access-token failed: {}",
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(AppError::Credential("gcloud returned an empty token".into()));
        }
        info!("🔑 Using access token from gcloud");
        Ok(Self::new(token))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
