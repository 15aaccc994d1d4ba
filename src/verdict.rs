use crate::error::WatchError;
use crate::validator::json_type_name;
use serde_json::{Map, Value};
use std::fmt;

pub const NAME_KEY: &str = "homework_name";
pub const STATUS_KEY: &str = "status";

/// Review states the API can report. Anything else is a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [
        ReviewStatus::Approved,
        ReviewStatus::Reviewing,
        ReviewStatus::Rejected,
    ];

    /// Wire code as sent by the API
    pub fn code(self) -> &'static str {
        match self {
            ReviewStatus::Approved => "approved",
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Human-readable verdict relayed to the chat
    pub fn verdict(self) -> &'static str {
        match self {
            ReviewStatus::Approved => {
                "The work has been reviewed: the reviewer liked everything. Hooray!"
            }
            ReviewStatus::Reviewing => "The work has been taken for review by the reviewer.",
            ReviewStatus::Rejected => "The work has been reviewed: the reviewer has comments.",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A record reduced to what the notification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub name: String,
    pub status: ReviewStatus,
}

impl Verdict {
    /// Read name and status out of one raw record.
    pub fn from_record(record: &Value) -> Result<Self, WatchError> {
        let map = record.as_object().ok_or(WatchError::SchemaType {
            expected: "object",
            actual: json_type_name(record),
        })?;

        let name = string_field(map, NAME_KEY)?;
        let code = string_field(map, STATUS_KEY)?;
        let status = ReviewStatus::from_code(code).ok_or_else(|| WatchError::UnknownStatus {
            status: code.to_string(),
            valid: ReviewStatus::ALL.iter().map(|s| s.code()).collect(),
        })?;

        Ok(Self {
            name: name.to_string(),
            status,
        })
    }

    pub fn message(&self) -> String {
        format!(
            "Review status changed for \"{}\": {}",
            self.name,
            self.status.verdict()
        )
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, WatchError> {
    let value = map.get(key).ok_or_else(|| WatchError::SchemaKey {
        key,
        present: map.keys().cloned().collect(),
    })?;
    value.as_str().ok_or(WatchError::SchemaType {
        expected: "string",
        actual: json_type_name(value),
    })
}

/// Build the status-change message for one record.
pub fn parse_status(record: &Value) -> Result<String, WatchError> {
    Verdict::from_record(record).map(|v| v.message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;

    #[test]
    fn every_known_status_maps_to_its_verdict() {
        for status in ReviewStatus::ALL {
            let record = json!({"homework_name": "hw_bot", "status": status.code()});
            let message = parse_status(&record).unwrap();
            assert_eq!(
                message,
                format!("Review status changed for \"hw_bot\": {}", status.verdict())
            );
        }
    }

    #[test]
    fn approved_message_is_exact() {
        let record = json!({"homework_name": "X", "status": "approved", "id": 1});
        assert_eq!(
            parse_status(&record).unwrap(),
            "Review status changed for \"X\": The work has been reviewed: the reviewer liked everything. Hooray!"
        );
    }

    #[test]
    fn verdict_texts_are_distinct() {
        let texts: std::collections::HashSet<_> =
            ReviewStatus::ALL.iter().map(|s| s.verdict()).collect();
        assert_eq!(texts.len(), 3);
    }

    #[test]
    fn unknown_status_never_falls_back() {
        for code in ["", "Approved", "done", "reviewing "] {
            let record = json!({"homework_name": "X", "status": code});
            match parse_status(&record).unwrap_err() {
                WatchError::UnknownStatus { status, valid } => {
                    assert_eq!(status, code);
                    assert_eq!(valid, vec!["approved", "reviewing", "rejected"]);
                }
                other => panic!("expected UnknownStatus, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_fields_are_schema_key() {
        let err = parse_status(&json!({"status": "approved"})).unwrap_err();
        assert!(matches!(err, WatchError::SchemaKey { key: "homework_name", .. }));

        let err = parse_status(&json!({"homework_name": "X"})).unwrap_err();
        assert!(matches!(err, WatchError::SchemaKey { key: "status", .. }));
    }

    #[test]
    fn non_string_fields_are_schema_type() {
        let err = parse_status(&json!({"homework_name": "X", "status": 1})).unwrap_err();
        assert_eq!(err.kind(), FailureKind::SchemaType);

        let err = parse_status(&json!("approved")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::SchemaType);
    }
}
