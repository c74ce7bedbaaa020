//! Connection defaults persisted between runs. Passwords are never written.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub portainer: PortainerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PortainerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<u64>,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<AuthMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    ApiKey,
    UsernamePassword,
}

impl Config {
    /// The API key wins when both an API key and a username are given.
    #[must_use]
    pub fn new(
        url: String,
        endpoint_id: u64,
        api_key: Option<String>,
        username: Option<String>,
    ) -> Self {
        let auth = match (api_key, username) {
            (Some(api_key), _) => AuthConfig {
                method: Some(AuthMethod::ApiKey),
                api_key: Some(api_key),
                username: None,
            },
            (None, Some(username)) => AuthConfig {
                method: Some(AuthMethod::UsernamePassword),
                api_key: None,
                username: Some(username),
            },
            (None, None) => AuthConfig::default(),
        };

        Self {
            portainer: PortainerConfig {
                url: Some(url),
                endpoint_id: Some(endpoint_id),
                auth,
            },
        }
    }

    /// Returns `None` when the file does not exist or is empty.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file could not be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(Error::Io(path.to_path_buf(), error)),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        serde_yaml::from_str(&contents).map_err(Error::Yaml)
    }

    /// # Errors
    ///
    /// Will return `Err` if the file could not be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_yaml::to_string(self).map_err(Error::Yaml)?;

        std::fs::write(path, contents).map_err(|error| Error::Io(path.to_path_buf(), error))?;

        tracing::info!(path = %path.display(), "configuration saved");

        Ok(())
    }

    /// Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file exists but could not be removed.
    pub fn delete(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "configuration deleted");
                Ok(true)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(Error::Io(path.to_path_buf(), error)),
        }
    }
}
