mod constants;
mod env_var;
mod port;
mod resource_name;
mod selector_labels;
mod volume;

pub use constants::*;
pub use env_var::env_vars;
pub use port::{PortMapping, ports};
pub use resource_name::{ResourceName, sanitize};
pub use selector_labels::SelectorLabels;
pub use volume::Volumes;
