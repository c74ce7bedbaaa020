#![warn(clippy::pedantic)]

pub mod cli;
pub mod config;
pub mod docker;
pub mod kubernetes;
pub mod manifest;
pub mod portainer;

/*
 * ============================================================================
 * Error
 * ============================================================================
 */
#[derive(Debug)]
pub enum Error {
    AmbiguousContainer {
        reference: String,
        matches: Vec<String>,
    },
    Authentication {
        status: u16,
        body: String,
    },
    ContainerNotFound {
        reference: String,
        endpoint_id: u64,
    },
    Http(reqwest::Error),
    InvalidUrl(String),
    Io(std::path::PathBuf, std::io::Error),
    Json(serde_json::Error),
    MissingCredentials,
    MissingSetting(&'static str),
    UnexpectedStatus {
        url: String,
        status: u16,
    },
    UsernameWithoutPassword,
    Yaml(serde_yaml::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(error) => Some(error),
            Error::Io(_, error) => Some(error),
            Error::Json(error) => Some(error),
            Error::Yaml(error) => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AmbiguousContainer { reference, matches } => write!(
                f,
                "multiple containers match '{reference}': {}",
                matches.join(", ")
            ),
            Error::Authentication { status, body } => {
                write!(f, "failed to authenticate: HTTP {status} {body}")
            }
            Error::ContainerNotFound {
                reference,
                endpoint_id,
            } => write!(
                f,
                "no container matching '{reference}' on endpoint {endpoint_id}"
            ),
            Error::Http(error) => write!(f, "request to portainer failed: {error}"),
            Error::InvalidUrl(url) => write!(
                f,
                "portainer url must include http:// or https://, got '{url}'"
            ),
            Error::Io(path, error) => write!(f, "{}: {error}", path.display()),
            Error::Json(error) => write!(f, "invalid json: {error}"),
            Error::MissingCredentials => write!(
                f,
                "provide either an api key or username/password for portainer"
            ),
            Error::MissingSetting(setting) => write!(
                f,
                "missing setting '{setting}': pass it as a flag or save it with `config save`"
            ),
            Error::UnexpectedStatus { url, status } => {
                write!(f, "unexpected HTTP {status} from {url}")
            }
            Error::UsernameWithoutPassword => write!(f, "--username also requires --password"),
            Error::Yaml(error) => write!(f, "invalid yaml: {error}"),
        }
    }
}

/*
 * ============================================================================
 * Result
 * ============================================================================
 */
pub type Result<T, E = Error> = std::result::Result<T, E>;
