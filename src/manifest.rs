use std::ops::Deref;

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{Container, PodSpec, PodTemplateSpec, Service, ServiceSpec, Volume},
    },
    apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta},
};
use serde::Serialize;
use serde_yaml::Value;

use crate::{
    Error, Result,
    docker::ContainerInspection,
    kubernetes::{
        CONTAINER_NAME_DEFAULT, CONTAINER_NAME_FALLBACK, DEPLOYMENT_REPLICAS, IMAGE_DEFAULT,
        PortMapping, ResourceName, SERVICE_NAME_SUFFIX, SERVICE_TYPE, SelectorLabels, Volumes,
        env_vars, ports, sanitize,
    },
};

/// Rendered key order, following the order each document is assembled in.
/// Keys not listed keep their relative order after the listed ones.
const KEY_ORDER: &[&str] = &[
    "apiVersion",
    "kind",
    "metadata",
    "spec",
    "name",
    "namespace",
    "labels",
    "replicas",
    "selector",
    "matchLabels",
    "template",
    "containers",
    "volumes",
    "image",
    "args",
    "command",
    "env",
    "value",
    "volumeMounts",
    "mountPath",
    "readOnly",
    "ports",
    "port",
    "targetPort",
    "containerPort",
    "protocol",
    "hostPath",
    "persistentVolumeClaim",
    "path",
    "type",
    "claimName",
];

/*
 * ============================================================================
 * Document
 * ============================================================================
 */
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Document {
    Deployment(Box<Deployment>),
    Service(Box<Service>),
}

/*
 * ============================================================================
 * Manifest
 * ============================================================================
 */
/// A Deployment, followed by a Service when the container exposes ports.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest(Vec<Document>);

impl Manifest {
    #[must_use]
    pub fn deployment(&self) -> Option<&Deployment> {
        self.0.iter().find_map(|document| match document {
            Document::Deployment(deployment) => Some(deployment.as_ref()),
            Document::Service(_) => None,
        })
    }

    #[must_use]
    pub fn service(&self) -> Option<&Service> {
        self.0.iter().find_map(|document| match document {
            Document::Deployment(_) => None,
            Document::Service(service) => Some(service.as_ref()),
        })
    }

    /// Renders every document as YAML, separated by `---` lines.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a document could not be serialized.
    pub fn to_yaml(&self) -> Result<String> {
        let documents = self
            .0
            .iter()
            .map(|document| {
                serde_yaml::to_value(document)
                    .and_then(|value| serde_yaml::to_string(&in_key_order(value)))
                    .map(|yaml| yaml.trim_end().to_string())
                    .map_err(Error::Yaml)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(format!("{}\n", documents.join("\n---\n")))
    }
}

impl Deref for Manifest {
    type Target = [Document];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn in_key_order(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => {
            let mut entries: Vec<(Value, Value)> = mapping
                .into_iter()
                .map(|(key, value)| (key, in_key_order(value)))
                .collect();

            entries.sort_by_key(|(key, _)| {
                key.as_str()
                    .and_then(|key| KEY_ORDER.iter().position(|known| *known == key))
                    .unwrap_or(KEY_ORDER.len())
            });

            Value::Mapping(entries.into_iter().collect())
        }
        Value::Sequence(sequence) => {
            Value::Sequence(sequence.into_iter().map(in_key_order).collect())
        }
        value => value,
    }
}

/*
 * ============================================================================
 * Builder
 * ============================================================================
 */
/// Converts a container inspection document into Kubernetes manifests in
/// `namespace`. Missing sections fall back to defaults; this never fails.
#[must_use]
pub fn build(inspection: &ContainerInspection, namespace: &str) -> Manifest {
    let config = &inspection.config;

    let name = container_name(inspection);
    let selector_labels = SelectorLabels::from(&name);
    let volumes = Volumes::from_mounts(&inspection.mounts);
    let ports = ports(&inspection.network_settings.ports);

    tracing::debug!(
        name = %name,
        volumes = volumes.volumes.len(),
        volume_mounts = volumes.volume_mounts.len(),
        ports = ports.len(),
        "building manifest"
    );

    let container = Container {
        args: non_empty(config.cmd.clone().unwrap_or_default()),
        command: non_empty(config.entrypoint.clone().unwrap_or_default()),
        env: non_empty(env_vars(&config.env)),
        image: Some(
            config
                .image
                .as_deref()
                .filter(|image| !image.is_empty())
                .unwrap_or(IMAGE_DEFAULT)
                .into(),
        ),
        name: name.to_string(),
        ports: non_empty(ports.iter().map(PortMapping::to_container_port).collect()),
        volume_mounts: non_empty(volumes.volume_mounts),
        ..Default::default()
    };

    let mut documents = vec![Document::Deployment(Box::new(generate_deployment(
        &name,
        namespace,
        &selector_labels,
        container,
        volumes.volumes,
    )))];

    if !ports.is_empty() {
        documents.push(Document::Service(Box::new(generate_service(
            &name,
            namespace,
            &selector_labels,
            &ports,
        ))));
    }

    Manifest(documents)
}

fn container_name(inspection: &ContainerInspection) -> ResourceName {
    let raw = [
        inspection.config.hostname.as_deref(),
        inspection.name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|raw| !raw.is_empty())
    .unwrap_or(CONTAINER_NAME_DEFAULT);

    sanitize(raw, CONTAINER_NAME_FALLBACK)
}

fn generate_deployment(
    name: &ResourceName,
    namespace: &str,
    selector_labels: &SelectorLabels,
    container: Container,
    volumes: Vec<Volume>,
) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.into()),
            namespace: Some(namespace.into()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(DEPLOYMENT_REPLICAS),
            selector: LabelSelector {
                match_labels: Some(selector_labels.into()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector_labels.into()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    volumes: non_empty(volumes),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn generate_service(
    name: &ResourceName,
    namespace: &str,
    selector_labels: &SelectorLabels,
    ports: &[PortMapping],
) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(format!("{name}{SERVICE_NAME_SUFFIX}")),
            namespace: Some(namespace.into()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(ports.iter().map(PortMapping::to_service_port).collect()),
            selector: Some(selector_labels.into()),
            type_: Some(SERVICE_TYPE.into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    use crate::docker::{
        ContainerConfig, ContainerInspection, ExposedPorts, MountDescriptor, NetworkSettings,
        PortBinding, from_json,
    };

    use super::{Document, build};

    fn is_valid_name(name: &str) -> bool {
        let bytes = name.as_bytes();
        !bytes.is_empty()
            && bytes[0] != b'-'
            && bytes[bytes.len() - 1] != b'-'
            && bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    }

    fn inspection() -> ContainerInspection {
        ContainerInspection {
            config: ContainerConfig {
                cmd: Some(vec!["--port".into(), "3000".into()]),
                entrypoint: Some(vec!["/usr/local/bin/server".into()]),
                env: vec!["NODE_ENV=production".into(), "DEBUG".into()],
                hostname: Some("Web_Server".into()),
                image: Some("ghcr.io/acme/web:1.2.3".into()),
            },
            mounts: vec![
                MountDescriptor {
                    destination: Some("/app/uploads".into()),
                    kind: Some("bind".into()),
                    source: Some("/srv/uploads".into()),
                    ..Default::default()
                },
                MountDescriptor {
                    destination: Some("/cache".into()),
                    kind: Some("volume".into()),
                    name: Some("cache".into()),
                    rw: Some(false),
                    ..Default::default()
                },
            ],
            name: Some("/web".into()),
            network_settings: NetworkSettings {
                ports: ExposedPorts::from(vec![(
                    "3000/tcp".to_string(),
                    Some(vec![PortBinding {
                        host_ip: Some("0.0.0.0".into()),
                        host_port: Some("80".into()),
                    }]),
                )]),
            },
        }
    }

    #[test]
    fn builds_deployment_and_service() {
        // act
        let manifest = build(&inspection(), "apps");

        // assert
        assert_eq!(manifest.len(), 2);
        assert!(matches!(manifest[0], Document::Deployment(_)));
        assert!(matches!(manifest[1], Document::Service(_)));

        let deployment = manifest.deployment().unwrap();
        assert_eq!(deployment.metadata.name.as_deref(), Some("web-server"));
        assert_eq!(deployment.metadata.namespace.as_deref(), Some("apps"));

        let spec = deployment.spec.as_ref().unwrap();
        assert_eq!(spec.replicas, Some(1));

        let pod = spec.template.spec.as_ref().unwrap();
        assert_eq!(pod.containers.len(), 1);
        let container = &pod.containers[0];
        assert_eq!(container.name, "web-server");
        assert_eq!(container.image.as_deref(), Some("ghcr.io/acme/web:1.2.3"));
        assert_eq!(
            container.args,
            Some(vec!["--port".to_string(), "3000".to_string()])
        );
        assert_eq!(
            container.command,
            Some(vec!["/usr/local/bin/server".to_string()])
        );
        assert_eq!(container.env.as_ref().unwrap().len(), 2);
        assert_eq!(container.volume_mounts.as_ref().unwrap().len(), 2);
        assert_eq!(
            container.ports.as_ref().unwrap()[0].container_port,
            3000
        );
        assert_eq!(pod.volumes.as_ref().unwrap().len(), 2);

        let service = manifest.service().unwrap();
        assert_eq!(service.metadata.name.as_deref(), Some("web-server-svc"));
        assert_eq!(service.metadata.namespace.as_deref(), Some("apps"));
        let service_spec = service.spec.as_ref().unwrap();
        assert_eq!(service_spec.type_.as_deref(), Some("ClusterIP"));
        let service_port = &service_spec.ports.as_ref().unwrap()[0];
        assert_eq!(service_port.name.as_deref(), Some("port-3000-tcp"));
        assert_eq!(service_port.port, 80);
        assert_eq!(service_port.target_port, Some(IntOrString::Int(3000)));
        assert_eq!(service_port.protocol.as_deref(), Some("TCP"));
    }

    #[test]
    fn service_selector_matches_pod_labels() {
        // act
        let manifest = build(&inspection(), "default");

        // assert
        let spec = manifest.deployment().unwrap().spec.as_ref().unwrap();
        let pod_labels = spec.template.metadata.as_ref().unwrap().labels.as_ref();
        let service_selector = manifest.service().unwrap().spec.as_ref().unwrap().selector.as_ref();

        assert_eq!(pod_labels, service_selector);
        assert_eq!(spec.selector.match_labels.as_ref(), pod_labels);
        assert_eq!(
            pod_labels.unwrap().get("app").map(String::as_str),
            Some("web-server")
        );
    }

    #[test]
    fn no_ports_yields_single_document() {
        // arrange
        let mut inspection = inspection();
        inspection.network_settings = NetworkSettings::default();

        // act
        let manifest = build(&inspection, "default");

        // assert
        assert_eq!(manifest.len(), 1);
        assert!(manifest.service().is_none());
        let spec = manifest.deployment().unwrap().spec.as_ref().unwrap();
        assert_eq!(spec.template.spec.as_ref().unwrap().containers[0].ports, None);
    }

    #[test]
    fn empty_inspection_uses_defaults() {
        // act
        let manifest = build(&ContainerInspection::default(), "default");

        // assert
        assert_eq!(manifest.len(), 1);
        let deployment = manifest.deployment().unwrap();
        assert_eq!(deployment.metadata.name.as_deref(), Some("app"));

        let pod = deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
        let container = &pod.containers[0];
        assert_eq!(container.image.as_deref(), Some("image:latest"));
        assert_eq!(container.args, None);
        assert_eq!(container.command, None);
        assert_eq!(container.env, None);
        assert_eq!(container.volume_mounts, None);
        assert_eq!(pod.volumes, None);
    }

    #[test]
    fn empty_command_sections_are_omitted() {
        // arrange
        let mut inspection = inspection();
        inspection.config.cmd = Some(vec![]);
        inspection.config.entrypoint = Some(vec![]);
        inspection.config.env = vec![];

        // act
        let manifest = build(&inspection, "default");

        // assert
        let spec = manifest.deployment().unwrap().spec.as_ref().unwrap();
        let container = &spec.template.spec.as_ref().unwrap().containers[0];
        assert_eq!(container.args, None);
        assert_eq!(container.command, None);
        assert_eq!(container.env, None);
    }

    #[test]
    fn name_falls_back_to_container_name() {
        // arrange
        let mut inspection = inspection();
        inspection.config.hostname = Some(String::new());

        // act
        let manifest = build(&inspection, "default");

        // assert
        assert_eq!(
            manifest.deployment().unwrap().metadata.name.as_deref(),
            Some("web")
        );
    }

    #[test]
    fn container_names_are_always_valid() {
        for (hostname, name) in [
            (None, None),
            (Some("___"), None),
            (Some(""), Some("/")),
            (None, Some("/My.Container_1")),
            (Some("-leading-and-trailing-"), None),
            (Some("4f66ad9a0b2e"), Some("/ignored")),
        ] {
            // arrange
            let inspection = ContainerInspection {
                config: ContainerConfig {
                    hostname: hostname.map(Into::into),
                    ..Default::default()
                },
                name: name.map(Into::into),
                ..Default::default()
            };

            // act
            let manifest = build(&inspection, "default");

            // assert
            let resource_name = manifest.deployment().unwrap().metadata.name.clone().unwrap();
            assert!(
                is_valid_name(&resource_name),
                "{hostname:?} {name:?} -> {resource_name}"
            );
        }
    }

    #[test]
    fn renders_yaml_documents() {
        // arrange
        let inspection = from_json(
            r#"{
                "Name": "/redis",
                "Config": { "Hostname": "redis", "Image": "redis:7", "Env": ["A=1"] },
                "NetworkSettings": { "Ports": { "6379/tcp": [{ "HostIp": "", "HostPort": "6380" }] } }
            }"#,
        )
        .unwrap();

        // act
        let yaml = build(&inspection, "cache").to_yaml().unwrap();

        // assert
        let documents: Vec<&str> = yaml.split("\n---\n").collect();
        assert_eq!(documents.len(), 2);
        assert!(yaml.ends_with('\n'));
        assert!(!yaml.ends_with("\n\n"));

        let deployment: serde_yaml::Value = serde_yaml::from_str(documents[0]).unwrap();
        assert_eq!(deployment["apiVersion"], "apps/v1");
        assert_eq!(deployment["kind"], "Deployment");
        assert_eq!(deployment["metadata"]["name"], "redis");
        assert_eq!(deployment["metadata"]["namespace"], "cache");
        assert_eq!(deployment["spec"]["replicas"], 1);
        assert_eq!(deployment["spec"]["selector"]["matchLabels"]["app"], "redis");
        let container = &deployment["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(container["env"][0]["name"], "A");
        assert_eq!(container["ports"][0]["containerPort"], 6379);
        assert!(container.get("volumeMounts").is_none());
        assert!(container.get("args").is_none());

        let service: serde_yaml::Value = serde_yaml::from_str(documents[1]).unwrap();
        assert_eq!(service["apiVersion"], "v1");
        assert_eq!(service["kind"], "Service");
        assert_eq!(service["metadata"]["name"], "redis-svc");
        assert_eq!(service["spec"]["type"], "ClusterIP");
        assert_eq!(service["spec"]["ports"][0]["port"], 6380);
        assert_eq!(service["spec"]["ports"][0]["targetPort"], 6379);
    }

    fn keys(value: &serde_yaml::Value) -> Vec<&str> {
        value
            .as_mapping()
            .unwrap()
            .keys()
            .map(|key| key.as_str().unwrap())
            .collect()
    }

    #[test]
    fn renders_keys_in_build_order() {
        // act
        let yaml = build(&inspection(), "apps").to_yaml().unwrap();

        // assert
        let documents: Vec<serde_yaml::Value> = yaml
            .split("\n---\n")
            .map(|document| serde_yaml::from_str(document).unwrap())
            .collect();

        let deployment = &documents[0];
        assert_eq!(keys(deployment), ["apiVersion", "kind", "metadata", "spec"]);
        assert_eq!(keys(&deployment["metadata"]), ["name", "namespace"]);
        assert_eq!(keys(&deployment["spec"]), ["replicas", "selector", "template"]);

        let pod = &deployment["spec"]["template"]["spec"];
        assert_eq!(keys(pod), ["containers", "volumes"]);
        assert_eq!(
            keys(&pod["containers"][0]),
            ["name", "image", "args", "command", "env", "volumeMounts", "ports"]
        );
        assert_eq!(keys(&pod["containers"][0]["env"][0]), ["name", "value"]);
        assert_eq!(
            keys(&pod["containers"][0]["volumeMounts"][1]),
            ["name", "mountPath", "readOnly"]
        );
        assert_eq!(
            keys(&pod["containers"][0]["ports"][0]),
            ["containerPort", "protocol"]
        );
        assert_eq!(keys(&pod["volumes"][0]), ["name", "hostPath"]);
        assert_eq!(keys(&pod["volumes"][0]["hostPath"]), ["path", "type"]);
        assert_eq!(keys(&pod["volumes"][1]), ["name", "persistentVolumeClaim"]);

        let service = &documents[1];
        assert_eq!(keys(service), ["apiVersion", "kind", "metadata", "spec"]);
        assert_eq!(keys(&service["spec"]), ["selector", "ports", "type"]);
        assert_eq!(
            keys(&service["spec"]["ports"][0]),
            ["name", "port", "targetPort", "protocol"]
        );
    }
}
