use super::error::ValidationError;
use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured payload attached to a record.
pub type Payload = Map<String, Value>;

/// A validated log entry ready for delivery.
///
/// This is the canonical representation of a log call throughout the pipeline,
/// from the factory through the remote sender and the local fallback file.
/// Fields are private so a record cannot change after it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    severity: Severity,
    message: String,
    #[serde(default)]
    payload: Payload,
    source: String,
    created_at: DateTime<Utc>,
}

impl LogRecord {
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Builds records stamped with the source of the emitting service.
#[derive(Debug, Clone)]
pub struct RecordFactory {
    source: String,
}

impl RecordFactory {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn build(
        &self,
        severity: Severity,
        message: impl Into<String>,
        payload: Option<Payload>,
    ) -> Result<LogRecord, ValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        Ok(LogRecord {
            severity,
            message,
            payload: payload.unwrap_or_default(),
            source: self.source.clone(),
            created_at: Utc::now(),
        })
    }

    /// Same as [`build`](Self::build) for callers holding the severity as text.
    pub fn build_raw(
        &self,
        severity: &str,
        message: impl Into<String>,
        payload: Option<Payload>,
    ) -> Result<LogRecord, ValidationError> {
        let severity = severity.parse::<Severity>()?;
        self.build(severity, message, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn factory() -> RecordFactory {
        RecordFactory::new("billing-api-dev")
    }

    #[test]
    fn test_build_defaults_payload_and_sets_timestamp() {
        let before = Utc::now();
        let record = factory().build(Severity::Info, "started", None).unwrap();
        let after = Utc::now();

        assert_eq!(record.severity(), Severity::Info);
        assert_eq!(record.message(), "started");
        assert!(record.payload().is_empty());
        assert_eq!(record.source(), "billing-api-dev");
        assert!(record.created_at() >= before && record.created_at() <= after);
    }

    #[test]
    fn test_build_rejects_empty_message() {
        assert_eq!(
            factory().build(Severity::Error, "", None).unwrap_err(),
            ValidationError::EmptyMessage
        );
        assert_eq!(
            factory().build(Severity::Error, "   \n", None).unwrap_err(),
            ValidationError::EmptyMessage
        );
    }

    #[test]
    fn test_build_raw_rejects_unknown_severity() {
        let err = factory().build_raw("critical", "boom", None).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownSeverity(s) if s == "critical"));
    }

    #[test]
    fn test_serialized_field_layout() {
        let payload = json!({"code": 28}).as_object().cloned();
        let record = factory()
            .build(Severity::Error, "disk full", payload)
            .unwrap();

        let line = record.to_json().unwrap();
        assert!(line.starts_with(
            r#"{"severity":"ERROR","message":"disk full","payload":{"code":28},"source":"billing-api-dev","createdAt":""#
        ));

        let back: LogRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, record);
    }
}
