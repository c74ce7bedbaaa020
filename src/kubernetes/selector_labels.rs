use std::collections::BTreeMap;

use super::{APP_KEY, ResourceName};

/// `app: <name>`, shared by the Deployment selector, the pod template and the
/// Service selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorLabels(BTreeMap<String, String>);

impl From<&ResourceName> for SelectorLabels {
    fn from(value: &ResourceName) -> Self {
        Self(BTreeMap::from([(APP_KEY.into(), value.into())]))
    }
}

impl From<&SelectorLabels> for BTreeMap<String, String> {
    fn from(value: &SelectorLabels) -> Self {
        value.0.clone()
    }
}
