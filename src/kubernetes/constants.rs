pub const APP_KEY: &str = "app";

pub const CONTAINER_NAME_DEFAULT: &str = "app";
pub const CONTAINER_NAME_FALLBACK: &str = "container";

pub const DEPLOYMENT_REPLICAS: i32 = 1;

pub const HOST_PATH_TYPE_DIRECTORY: &str = "Directory";
pub const HOST_PATH_TYPE_DIRECTORY_OR_CREATE: &str = "DirectoryOrCreate";

pub const IMAGE_DEFAULT: &str = "image:latest";

pub const MOUNT_PATH_DEFAULT: &str = "/data";

pub const SERVICE_NAME_SUFFIX: &str = "-svc";
pub const SERVICE_TYPE: &str = "ClusterIP";
