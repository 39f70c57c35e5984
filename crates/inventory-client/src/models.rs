//! Wire types for the inventory REST API.

use serde::{Deserialize, Serialize};

/// One system record as stored by the inventory service.
///
/// The harness never persists these; they are only observed through the
/// client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemData {
    /// Identifier assigned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Hostname the record describes
    pub hostname: String,
    /// Operating system name
    pub os_name: String,
    /// Java version string
    pub java_version: String,
    /// Maximum heap size in megabytes
    pub heap_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_the_service_wire_format() {
        let json = r#"{
            "id": 7,
            "hostname": "localhost",
            "osName": "linux",
            "javaVersion": "11",
            "heapSize": 2048
        }"#;

        let system: SystemData = serde_json::from_str(json).unwrap();
        assert_eq!(system.id, Some(7));
        assert_eq!(system.hostname, "localhost");
        assert_eq!(system.os_name, "linux");
        assert_eq!(system.java_version, "11");
        assert_eq!(system.heap_size, 2048);
    }

    #[test]
    fn tolerates_records_without_an_id() {
        let json = r#"{
            "hostname": "localhost",
            "osName": "linux",
            "javaVersion": "8",
            "heapSize": 1024
        }"#;

        let system: SystemData = serde_json::from_str(json).unwrap();
        assert_eq!(system.id, None);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let system = SystemData {
            id: None,
            hostname: "localhost".to_string(),
            os_name: "linux".to_string(),
            java_version: "11".to_string(),
            heap_size: 2048,
        };

        let json = serde_json::to_value(&system).unwrap();
        assert_eq!(json["osName"], "linux");
        assert_eq!(json["javaVersion"], "11");
        assert!(json.get("id").is_none());
    }
}
