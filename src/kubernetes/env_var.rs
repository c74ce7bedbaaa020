use k8s_openapi::api::core::v1::EnvVar;

/// Splits `KEY=VALUE` entries on the first `=`. Entries without one become a
/// variable with an empty value. Order and duplicates are kept.
#[must_use]
pub fn env_vars<S: AsRef<str>>(entries: &[S]) -> Vec<EnvVar> {
    entries
        .iter()
        .map(|entry| {
            let (name, value) = entry
                .as_ref()
                .split_once('=')
                .unwrap_or((entry.as_ref(), ""));

            EnvVar {
                name: name.into(),
                value: Some(value.into()),
                value_from: None,
            }
        })
        .collect()
}
