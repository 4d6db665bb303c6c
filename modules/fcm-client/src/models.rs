use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct FcmMessage {
    pub to: String,
    pub notification: Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Response for a topic send.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicResponse {
    pub message_id: Option<i64>,
    pub error: Option<String>,
}

/// Response for a single-device send.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceResponse {
    #[serde(default)]
    pub success: u32,
    #[serde(default)]
    pub failure: u32,
    #[serde(default)]
    pub results: Vec<DeviceResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceResult {
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_response_parses_success() {
        let raw = r#"{"message_id": 6177556471378767768}"#;
        let resp: TopicResponse = serde_json::from_str(raw).unwrap();
        assert!(resp.message_id.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn device_response_parses_not_registered() {
        let raw = r#"{"multicast_id": 1, "success": 0, "failure": 1,
                      "results": [{"error": "NotRegistered"}]}"#;
        let resp: DeviceResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.failure, 1);
        assert_eq!(resp.results[0].error.as_deref(), Some("NotRegistered"));
    }
}
