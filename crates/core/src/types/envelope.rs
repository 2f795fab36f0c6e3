//! The uniform `{success, message, data}` response envelope.
//!
//! Every API endpoint answers with an `Envelope<T>`, where `T` is the
//! endpoint's payload type. Failures carry `success: false` and a
//! user-facing `message`; callers branch on `success`, not on the HTTP
//! status.

use serde::{Deserialize, Serialize};

/// Response envelope shared by the server and the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable outcome, always present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Operation payload, present on success for endpoints that return data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Successful response carrying `data` and a message.
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    /// Failed response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Convert into a `Result`, yielding the message on failure.
    ///
    /// # Errors
    ///
    /// Returns the envelope message when `success` is false.
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .message
                .unwrap_or_else(|| "request failed".to_owned()))
        }
    }
}

impl Envelope<()> {
    /// Successful response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serialises_without_data() {
        let json = serde_json::to_value(Envelope::<u32>::failure("Out of stock")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "Out of stock"})
        );
    }

    #[test]
    fn test_decode_missing_optional_fields() {
        let env: Envelope<Vec<u32>> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), None);
    }

    #[test]
    fn test_failure_into_result() {
        let env: Envelope<u32> = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert_eq!(env.into_result().unwrap_err(), "request failed");
    }

    #[test]
    fn test_decode_rejects_wrong_payload_shape() {
        let result = serde_json::from_str::<Envelope<u32>>(r#"{"success":true,"data":"x"}"#);
        assert!(result.is_err());
    }
}
