use k8s_openapi::api::core::v1::{
    HostPathVolumeSource, PersistentVolumeClaimVolumeSource, Volume, VolumeMount,
};

use crate::docker::MountDescriptor;

use super::{
    HOST_PATH_TYPE_DIRECTORY, HOST_PATH_TYPE_DIRECTORY_OR_CREATE, MOUNT_PATH_DEFAULT,
    resource_name::sanitize,
};

/// Pod volumes and the container mounts referencing them by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Volumes {
    pub volumes: Vec<Volume>,

    pub volume_mounts: Vec<VolumeMount>,
}

impl Volumes {
    /// Bind mounts become `hostPath` volumes, everything else a
    /// `persistentVolumeClaim` named after the mount. A bind mount without a
    /// source only yields the volume mount.
    #[must_use]
    pub fn from_mounts(mounts: &[MountDescriptor]) -> Self {
        let mut volumes = Volumes::default();

        for (index, mount) in mounts.iter().enumerate() {
            let fallback = format!("vol-{index}");
            let raw = non_empty(mount.name.as_deref())
                .or(non_empty(mount.source.as_deref()))
                .unwrap_or(&fallback);
            let name = String::from(sanitize(raw, &fallback));

            volumes.volume_mounts.push(VolumeMount {
                mount_path: non_empty(mount.destination.as_deref())
                    .unwrap_or(MOUNT_PATH_DEFAULT)
                    .into(),
                name: name.clone(),
                read_only: mount.is_read_only().then_some(true),
                ..Default::default()
            });

            if mount.is_bind() {
                let Some(source) = non_empty(mount.source.as_deref()) else {
                    tracing::debug!(name = %name, "bind mount without source, skipping volume");
                    continue;
                };

                let type_ = if non_empty(mount.propagation.as_deref()).is_some() {
                    HOST_PATH_TYPE_DIRECTORY_OR_CREATE
                } else {
                    HOST_PATH_TYPE_DIRECTORY
                };

                volumes.volumes.push(Volume {
                    name,
                    host_path: Some(HostPathVolumeSource {
                        path: source.into(),
                        type_: Some(type_.into()),
                    }),
                    ..Default::default()
                });
            } else {
                volumes.volumes.push(Volume {
                    name: name.clone(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name: name,
                        read_only: None,
                    }),
                    ..Default::default()
                });
            }
        }

        volumes
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
