use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{Error, Result, config::Config, portainer::Auth};

/*
 * ============================================================================
 * Cli
 * ============================================================================
 */
#[allow(clippy::module_name_repetitions)]
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct CliArgs {
    /// Configuration file holding connection defaults
    #[arg(
        long,
        env = "PORTAINER_TO_K8S_CONFIG",
        default_value = "config.yaml",
        global = true,
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: CliCommands,
}

#[must_use]
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[allow(clippy::module_name_repetitions)]
#[derive(Subcommand, Debug)]
pub enum CliCommands {
    /// Configuration
    Config(ConfigArgs),

    /// Containers
    Containers(ContainersArgs),

    /// Convert a saved container inspection document
    Convert(ConvertArgs),

    /// Endpoints
    Endpoints(EndpointsArgs),

    /// Generate manifests for a container managed by Portainer
    Generate(GenerateArgs),
}

/*
 * ============================================================================
 * Portainer
 * ============================================================================
 */
#[derive(Args, Debug, Default)]
pub struct PortainerArgs {
    /// Portainer API key
    #[arg(long, env = "PORTAINER_API_KEY", conflicts_with = "username")]
    pub api_key: Option<String>,

    /// Portainer endpoint id
    #[arg(long, env = "PORTAINER_ENDPOINT")]
    pub endpoint: Option<u64>,

    /// Portainer password, requires a username
    #[arg(long, env = "PORTAINER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Base URL of the Portainer instance, e.g. https://portainer.local
    #[arg(long, env = "PORTAINER_URL", value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// Portainer username
    #[arg(long, env = "PORTAINER_USERNAME")]
    pub username: Option<String>,
}

#[derive(Debug)]
pub struct Connection {
    pub auth: Auth,
    pub endpoint_id: Option<u64>,
    pub url: String,
}

impl PortainerArgs {
    /// Merges flags with the configuration file; flags win.
    ///
    /// # Errors
    ///
    /// Will return `Err` if no url or credentials are available, or a
    /// username is given without a password.
    pub fn connection(&self, config: Option<&Config>) -> Result<Connection> {
        let portainer = config.map(|config| &config.portainer);

        let url = self
            .url
            .clone()
            .or_else(|| portainer.and_then(|portainer| portainer.url.clone()))
            .ok_or(Error::MissingSetting("url"))?;

        let endpoint_id = self
            .endpoint
            .or_else(|| portainer.and_then(|portainer| portainer.endpoint_id));

        let auth = if let Some(api_key) = &self.api_key {
            Auth::ApiKey(api_key.clone())
        } else if let Some(username) = &self.username {
            Auth::Credentials {
                username: username.clone(),
                password: self.password.clone().ok_or(Error::UsernameWithoutPassword)?,
            }
        } else if let Some(api_key) = portainer.and_then(|portainer| portainer.auth.api_key.clone())
        {
            Auth::ApiKey(api_key)
        } else if let Some(username) = portainer.and_then(|portainer| portainer.auth.username.clone())
        {
            Auth::Credentials {
                username,
                password: self.password.clone().ok_or(Error::UsernameWithoutPassword)?,
            }
        } else {
            return Err(Error::MissingCredentials);
        };

        Ok(Connection {
            auth,
            endpoint_id,
            url,
        })
    }
}

/*
 * ============================================================================
 * Config
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Delete
    Delete,

    /// Save, passwords are never written
    Save(ConfigSaveArgs),

    /// Show
    Show,
}

#[derive(Args, Debug)]
pub struct ConfigSaveArgs {
    #[command(flatten)]
    pub portainer: PortainerArgs,
}

/*
 * ============================================================================
 * Containers
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct ContainersArgs {
    #[command(subcommand)]
    pub command: ContainersCommands,
}

#[derive(Subcommand, Debug)]
pub enum ContainersCommands {
    /// List
    List(ContainersListArgs),
}

#[derive(Args, Debug)]
pub struct ContainersListArgs {
    #[command(flatten)]
    pub portainer: PortainerArgs,
}

/*
 * ============================================================================
 * Convert
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Container inspection document, as printed by `docker inspect`
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    #[command(flatten)]
    pub manifest: ManifestArgs,
}

/*
 * ============================================================================
 * Endpoints
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct EndpointsArgs {
    #[command(subcommand)]
    pub command: EndpointsCommands,
}

#[derive(Subcommand, Debug)]
pub enum EndpointsCommands {
    /// List
    List(EndpointsListArgs),
}

#[derive(Args, Debug)]
pub struct EndpointsListArgs {
    #[command(flatten)]
    pub portainer: PortainerArgs,
}

/*
 * ============================================================================
 * Generate
 * ============================================================================
 */
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Container id prefix or name to export
    #[arg(long)]
    pub container: String,

    #[command(flatten)]
    pub manifest: ManifestArgs,

    #[command(flatten)]
    pub portainer: PortainerArgs,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Kubernetes namespace for generated resources
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Write the manifest to this file instead of stdout
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
