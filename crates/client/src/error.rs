//! Client error types.

use thiserror::Error;

/// Shown when a request needs a session and there is none.
pub const SIGN_IN_MESSAGE: &str = "Not Authorized Login Again";

/// Errors from the persisted token slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Token storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure; the server was not reached or the body was cut off.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response was not a well-formed envelope for the expected payload.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The server answered `success: false` with this message.
    #[error("{0}")]
    Api(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The action needs a signed-in user.
    #[error("{SIGN_IN_MESSAGE}")]
    NotSignedIn,

    /// Rejected locally before calling the API.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Message safe to show in a notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(_) | Self::Validation(_) | Self::NotSignedIn => self.to_string(),
            Self::Http(_) => "Could not reach the store, please try again".to_owned(),
            Self::Decode(_) | Self::InvalidUrl(_) => {
                "Unexpected response from the store".to_owned()
            }
            Self::Storage(_) => "Could not save your session".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_internals() {
        let decode = ClientError::Decode("expected `,` at line 1 column 9".to_owned());
        assert_eq!(decode.user_message(), "Unexpected response from the store");

        let api = ClientError::Api("Invalid credentials".to_owned());
        assert_eq!(api.user_message(), "Invalid credentials");

        assert_eq!(ClientError::NotSignedIn.user_message(), SIGN_IN_MESSAGE);
    }
}
