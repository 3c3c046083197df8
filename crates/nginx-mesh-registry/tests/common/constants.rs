//! Shared constants for test infrastructure

// Release tags (with 'v' prefix) and their normalized versions
pub const TAG_V2_5_0: &str = "v2.5.0";
pub const VERSION_2_5_0: &str = "2.5.0";
pub const TAG_V1_6_0: &str = "v1.6.0";
pub const VERSION_1_6_0: &str = "1.6.0";

// Chart versions
pub const CHART_2_5_0: &str = "2.5.0";
pub const CHART_0_7_1: &str = "0.7.1";

// Addressing
pub const MESHERY_SERVER: &str = "http://localhost:9081";
pub const SELF_ADDRESS: &str = "localhost:10010";

// Chart archive URL tails
pub const SOURCE_URL_TAIL_2_5_0: &str = "nginx-service-mesh-2.5.0.tgz?raw=true";
pub const SOURCE_URL_TAIL_UNRESOLVED: &str = "nginx-service-mesh-.tgz?raw=true";

/// Helm repository index listing two chart releases
pub const CHART_INDEX: &str = r#"
apiVersion: v1
entries:
  nginx-service-mesh:
    - name: nginx-service-mesh
      version: 2.5.0
      appVersion: 2.5.0
    - name: nginx-service-mesh
      version: 0.7.1
      appVersion: 1.6.0
    - name: nginx-service-mesh
      version: 0.7.0
      appVersion: 1.6.0
generated: "2024-01-01T00:00:00Z"
"#;
