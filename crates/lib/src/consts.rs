/// Application name, used for config and registry file names.
pub const APP_NAME: &str = "unideps";

/// Project-level configuration file, looked up in the project root.
pub const CONFIG_FILENAME: &str = "unideps.toml";

/// Marker file recording the last successfully built revision of a dependency.
pub const MARKER_FILENAME: &str = "lastbuildsha";

/// Artifact registry written into the deps directory after a run.
pub const REGISTRY_FILENAME: &str = "unideps-registry.json";
