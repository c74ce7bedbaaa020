//! Container inspection document as returned by the Docker engine API
//! (`GET /containers/{id}/json`), proxied through Portainer.
//!
//! Only the fields the manifest builder consumes are declared. Missing keys
//! and `null` values fall back to their defaults.

use std::ops::Deref;

use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct ContainerInspection {
    #[serde(deserialize_with = "null_as_default")]
    pub config: ContainerConfig,

    #[serde(deserialize_with = "null_as_default")]
    pub mounts: Vec<MountDescriptor>,

    pub name: Option<String>,

    #[serde(deserialize_with = "null_as_default")]
    pub network_settings: NetworkSettings,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct ContainerConfig {
    pub cmd: Option<Vec<String>>,

    pub entrypoint: Option<Vec<String>>,

    #[serde(deserialize_with = "null_as_default")]
    pub env: Vec<String>,

    pub hostname: Option<String>,

    pub image: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct MountDescriptor {
    pub destination: Option<String>,

    pub name: Option<String>,

    pub propagation: Option<String>,

    pub read_only: Option<bool>,

    #[serde(rename = "RW")]
    pub rw: Option<bool>,

    pub source: Option<String>,

    #[serde(rename = "Type")]
    pub kind: Option<String>,
}

impl MountDescriptor {
    #[must_use]
    pub fn is_bind(&self) -> bool {
        self.kind.as_deref() == Some("bind")
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only == Some(true) || self.rw == Some(false)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct NetworkSettings {
    #[serde(deserialize_with = "null_as_default")]
    pub ports: ExposedPorts,
}

/// Exposed ports keyed by `<port>/<protocol>`, in the order they were
/// reported. Docker reports `null` bindings for ports that are exposed but not
/// published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExposedPorts(Vec<(String, Option<Vec<PortBinding>>)>);

impl Deref for ExposedPorts {
    type Target = [(String, Option<Vec<PortBinding>>)];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<(String, Option<Vec<PortBinding>>)>> for ExposedPorts {
    fn from(value: Vec<(String, Option<Vec<PortBinding>>)>) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for ExposedPorts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ExposedPortsVisitor;

        impl<'de> Visitor<'de> for ExposedPortsVisitor {
            type Value = ExposedPorts;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a map of exposed ports")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut ports = Vec::with_capacity(map.size_hint().unwrap_or_default());
                while let Some(entry) = map.next_entry()? {
                    ports.push(entry);
                }
                Ok(ExposedPorts(ports))
            }
        }

        deserializer.deserialize_map(ExposedPortsVisitor)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct PortBinding {
    pub host_ip: Option<String>,

    pub host_port: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts both a single inspection object and the array `docker inspect`
/// prints, in which case the first element is used.
///
/// # Errors
///
/// Will return `Err` if `input` is not a container inspection document.
pub fn from_json(input: &str) -> crate::Result<ContainerInspection> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Document {
        Many(Vec<ContainerInspection>),
        One(Box<ContainerInspection>),
    }

    match serde_json::from_str(input).map_err(crate::Error::Json)? {
        Document::Many(inspections) => Ok(inspections.into_iter().next().unwrap_or_default()),
        Document::One(inspection) => Ok(*inspection),
    }
}
