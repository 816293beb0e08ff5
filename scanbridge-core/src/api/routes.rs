macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

pub const HEALTH: &str = "/health";

/// Versioned API route definitions shared by the server and pipeline clients
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod publish {
        pub const EVENT: &str = v1_path!("/publish/event");
        pub const SCAN_OUTPUT: &str = v1_path!("/publish/scan-output");
        pub const SUMMARY: &str = v1_path!("/publish/summary");
    }

    /// Paths the pipeline workflows were first written against.
    pub mod pipeline_publish {
        pub const EVENTS: &str = v1_path!("/pipeline-publish/events");
        pub const LATEST: &str = v1_path!("/pipeline-publish/latest");
        pub const SCAN_OUTPUT: &str = v1_path!("/pipeline-publish/scan-output");
        pub const SUMMARY: &str = v1_path!("/pipeline-publish/summary");
    }
}

pub mod utils {
    /// Strip the `/api/v1` prefix so a path can be mounted inside a nested
    /// router.
    pub fn relative(path: &str) -> &str {
        path.strip_prefix(super::v1::ROOT).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_strips_version_prefix() {
        assert_eq!(utils::relative(v1::publish::EVENT), "/publish/event");
        assert_eq!(utils::relative(HEALTH), "/health");
    }
}
