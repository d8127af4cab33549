//! System-wide constants and defaults.

/// Application name used in CLI output and artifact headers.
pub const APP_NAME: &str = "strata";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "strata";

/// Version of the synthesized artifact layout.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Default directory synthesized artifacts are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "strata.out";

/// File name of one environment's artifact inside its output directory.
pub const ARTIFACT_FILE_NAME: &str = "stack.json";

/// Bucket holding remote state when the settings do not name one.
pub const DEFAULT_STATE_BUCKET: &str = "cdktf-workshop-tfstate";

/// Separator between sanitized scope path segments in a logical id.
pub const LOGICAL_ID_SEPARATOR: char = '_';

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;

/// Function runtime used when the settings do not pin a node version.
pub const DEFAULT_FUNCTION_RUNTIME: &str = "nodejs16.x";
