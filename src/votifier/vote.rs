use serde::{Deserialize, Serialize};

/// A single vote as delivered to the server's plugin.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub service_name: String,
    pub username: String,
    pub address: String,
    #[serde(default = "now_timestamp")]
    pub timestamp: String,
    #[serde(default = "random_uuid")]
    pub uuid: String,
}

fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn random_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl VoteRecord {
    /// A vote stamped with the current time and a fresh random id.
    pub fn new(
        service_name: impl Into<String>,
        username: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            username: username.into(),
            address: address.into(),
            timestamp: now_timestamp(),
            uuid: random_uuid(),
        }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    Ok,
    Error,
}

/// What the server said about a delivered vote.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VotifierOutcome {
    pub status: VoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VotifierOutcome {
    pub fn ok() -> Self {
        Self {
            status: VoteStatus::Ok,
            detail: None,
        }
    }

    /// The server answered, but not with `ok`; `reply` is its raw text.
    pub fn rejected(reply: impl Into<String>) -> Self {
        Self {
            status: VoteStatus::Error,
            detail: Some(reply.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == VoteStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_field_names() {
        let vote = VoteRecord {
            service_name: "TestList".into(),
            username: "Notch".into(),
            address: "93.184.216.34".into(),
            timestamp: "2024-01-01T00:00:00+00:00".into(),
            uuid: "00000000-0000-4000-8000-000000000000".into(),
        };
        let json: serde_json::Value = serde_json::from_slice(&vote.to_payload().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "serviceName": "TestList",
                "username": "Notch",
                "address": "93.184.216.34",
                "timestamp": "2024-01-01T00:00:00+00:00",
                "uuid": "00000000-0000-4000-8000-000000000000"
            })
        );
    }

    #[test]
    fn missing_uuid_and_timestamp_are_filled() {
        let vote: VoteRecord = serde_json::from_str(
            r#"{"serviceName":"TestList","username":"Notch","address":"1.2.3.4"}"#,
        )
        .unwrap();
        let uuid = uuid::Uuid::parse_str(&vote.uuid).unwrap();
        assert_eq!(uuid.get_version_num(), 4);
        assert!(chrono::DateTime::parse_from_rfc3339(&vote.timestamp).is_ok());
    }

    #[test]
    fn fresh_votes_get_distinct_ids() {
        let a = VoteRecord::new("TestList", "Notch", "1.2.3.4");
        let b = VoteRecord::new("TestList", "Notch", "1.2.3.4");
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn outcome_serialization() {
        assert_eq!(
            serde_json::to_value(VotifierOutcome::ok()).unwrap(),
            serde_json::json!({"status": "ok"})
        );
        let rejected = VotifierOutcome::rejected("bad key");
        assert!(!rejected.is_ok());
        assert_eq!(
            serde_json::to_value(rejected).unwrap(),
            serde_json::json!({"status": "error", "detail": "bad key"})
        );
    }
}
