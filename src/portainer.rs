//! Client for the Portainer API and the Docker API it proxies per endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Error, Result, docker::ContainerInspection};

const API_KEY_HEADER: &str = "X-API-Key";

const ENDPOINTS_LIMIT: u32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/*
 * ============================================================================
 * Types
 * ============================================================================
 */
pub enum Auth {
    ApiKey(String),
    Credentials { username: String, password: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::ApiKey(_) => f.write_str("ApiKey(..)"),
            Auth::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct Endpoint {
    pub id: u64,

    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,

    pub image: String,

    pub names: Vec<String>,

    pub state: String,

    pub status: String,
}

impl ContainerSummary {
    /// Container names without the leading `/` Docker reports.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(|name| name.strip_prefix('/').unwrap_or(name))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthenticateResponse {
    jwt: String,
}

enum Token {
    ApiKey(String),
    Bearer(String),
}

/*
 * ============================================================================
 * Client
 * ============================================================================
 */
pub struct Client {
    base_url: String,
    endpoint_id: Option<u64>,
    http: reqwest::Client,
    token: Token,
}

impl Client {
    /// Validates `url` and authenticates, exchanging credentials for a JWT
    /// when no API key is given.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the url has no http(s) scheme or authentication
    /// failed.
    #[tracing::instrument(skip(auth))]
    pub async fn connect(url: &str, endpoint_id: Option<u64>, auth: Auth) -> Result<Self> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidUrl(url.into()));
        }

        let base_url = url.trim_end_matches('/').to_string();

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Http)?;

        let token = match auth {
            Auth::ApiKey(api_key) => Token::ApiKey(api_key),
            Auth::Credentials { username, password } => {
                Token::Bearer(authenticate(&http, &base_url, &username, &password).await?)
            }
        };

        tracing::debug!("connected");

        Ok(Self {
            base_url,
            endpoint_id,
            http,
            token,
        })
    }

    /// Lists the endpoints visible to the user. Falls back to the
    /// `environments` route used by newer Portainer releases.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the request failed.
    #[tracing::instrument(skip(self))]
    pub async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        let response = self
            .get("/api/endpoints")
            .query(&[("limit", ENDPOINTS_LIMIT)])
            .send()
            .await
            .map_err(Error::Http)?;

        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return json(response).await;
        }

        tracing::debug!("endpoints route not found, falling back to environments");

        let response = self
            .get("/api/environments")
            .query(&[("limit", ENDPOINTS_LIMIT)])
            .send()
            .await
            .map_err(Error::Http)?;

        json(response).await
    }

    /// Lists every container on the endpoint, running or not.
    ///
    /// # Errors
    ///
    /// Will return `Err` if no endpoint is selected or the request failed.
    #[tracing::instrument(skip(self))]
    pub async fn containers(&self) -> Result<Vec<ContainerSummary>> {
        let endpoint_id = self.try_endpoint_id()?;

        let response = self
            .get(&format!("/api/endpoints/{endpoint_id}/docker/containers/json"))
            .query(&[("all", true)])
            .send()
            .await
            .map_err(Error::Http)?;

        json(response).await
    }

    /// Resolves a container id prefix or name to the full container id.
    ///
    /// # Errors
    ///
    /// Will return `Err` if no container or more than one container matches.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_container_id(&self, reference: &str) -> Result<String> {
        let endpoint_id = self.try_endpoint_id()?;
        let containers = self.containers().await?;

        let id = match_container(&containers, reference, endpoint_id)?;

        tracing::info!(id = %id, "resolved container");

        Ok(id)
    }

    /// # Errors
    ///
    /// Will return `Err` if no endpoint is selected or the request failed.
    #[tracing::instrument(skip(self))]
    pub async fn container_details(&self, container_id: &str) -> Result<ContainerInspection> {
        let endpoint_id = self.try_endpoint_id()?;

        let response = self
            .get(&format!(
                "/api/endpoints/{endpoint_id}/docker/containers/{container_id}/json"
            ))
            .send()
            .await
            .map_err(Error::Http)?;

        json(response).await
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(format!("{}{path}", self.base_url));

        match &self.token {
            Token::ApiKey(api_key) => request.header(API_KEY_HEADER, api_key),
            Token::Bearer(jwt) => request.bearer_auth(jwt),
        }
    }

    fn try_endpoint_id(&self) -> Result<u64> {
        self.endpoint_id.ok_or(Error::MissingSetting("endpoint"))
    }
}

async fn authenticate(
    http: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let response = http
        .post(format!("{base_url}/api/auth"))
        .json(&AuthenticateRequest { username, password })
        .send()
        .await
        .map_err(Error::Http)?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            status: status.as_u16(),
            body,
        });
    }

    let response: AuthenticateResponse = response.json().await.map_err(Error::Http)?;

    Ok(response.jwt)
}

async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::UnexpectedStatus {
            url: response.url().to_string(),
            status: status.as_u16(),
        });
    }

    response.json().await.map_err(Error::Http)
}

/// Matches containers whose id starts with `reference` or that are named
/// `reference`.
///
/// # Errors
///
/// Will return `Err` unless exactly one container matches.
pub fn match_container(
    containers: &[ContainerSummary],
    reference: &str,
    endpoint_id: u64,
) -> Result<String> {
    let mut matches = containers
        .iter()
        .filter(|container| {
            container.id.starts_with(reference) || container.names().any(|name| name == reference)
        })
        .map(|container| container.id.clone())
        .collect::<Vec<_>>();

    match matches.len() {
        0 => Err(Error::ContainerNotFound {
            reference: reference.into(),
            endpoint_id,
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(Error::AmbiguousContainer {
            reference: reference.into(),
            matches,
        }),
    }
}
