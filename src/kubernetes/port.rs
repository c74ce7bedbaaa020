use k8s_openapi::{
    api::core::v1::{ContainerPort, ServicePort},
    apimachinery::pkg::util::intstr::IntOrString,
};

use crate::docker::{ExposedPorts, PortBinding};

/// A container port and the port it is reachable on from outside the pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub name: String,

    /// Externally reachable port: the published host port when there is one.
    pub port: i32,

    /// Port the container listens on.
    pub target_port: i32,

    pub protocol: String,
}

impl PortMapping {
    #[must_use]
    pub fn to_container_port(&self) -> ContainerPort {
        ContainerPort {
            container_port: self.target_port,
            protocol: Some(self.protocol.clone()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn to_service_port(&self) -> ServicePort {
        ServicePort {
            name: Some(self.name.clone()),
            port: self.port,
            protocol: Some(self.protocol.clone()),
            target_port: Some(IntOrString::Int(self.target_port)),
            ..Default::default()
        }
    }
}

/// Derives port mappings from an exposure map keyed by `<port>/<protocol>`,
/// keeping its order. Malformed keys are skipped. Only the first host binding
/// of each port is consulted.
#[must_use]
pub fn ports(exposure: &ExposedPorts) -> Vec<PortMapping> {
    exposure
        .iter()
        .filter_map(|(exposed, bindings)| {
            let mapping = port(exposed, bindings.as_deref().unwrap_or_default());
            if mapping.is_none() {
                tracing::debug!(exposed = %exposed, "skipping malformed exposed port");
            }
            mapping
        })
        .collect()
}

fn port(exposed: &str, bindings: &[PortBinding]) -> Option<PortMapping> {
    let mut parts = exposed.split('/');
    let (Some(container_port), Some(protocol), None) = (parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let target_port: i32 = container_port.parse().ok()?;

    let port = bindings
        .first()
        .and_then(|binding| binding.host_port.as_deref())
        .filter(|host_port| !host_port.is_empty())
        .and_then(|host_port| host_port.parse().ok())
        .unwrap_or(target_port);

    Some(PortMapping {
        name: format!("port-{container_port}-{protocol}"),
        port,
        target_port,
        protocol: protocol.to_uppercase(),
    })
}
