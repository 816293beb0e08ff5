//! Defaults shared by the loader and by tests.

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

pub const DEFAULT_GITHUB_WORKFLOW: &str = "scan-cis.yml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_REGION: &str = "ap-northeast-2";
pub const DEFAULT_GIT_REF: &str = "main";
pub const DEFAULT_COMPLIANCE_MODE: &str = "cis_1.4_plus_isms_p";

pub const DEFAULT_PUBLISH_STATE_FILE: &str =
    "/tmp/prowler_pipeline_publish_state.json";
pub const DEFAULT_OUTPUT_ROOT: &str = "/tmp/prowler_api_output";

pub const CONFIG_PATH_VAR: &str = "SCANBRIDGE_CONFIG_PATH";
