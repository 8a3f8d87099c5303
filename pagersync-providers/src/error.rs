//! Error types for pagersync-providers.

use thiserror::Error;

/// Failures talking to Slack or PagerDuty.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API answered with a non-success HTTP status.
    #[error("{endpoint}: HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Connection, DNS, TLS or timeout failure.
    #[error("{endpoint}: transport error: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    /// The API answered 200 but reported an application error (Slack `ok: false`).
    #[error("{endpoint}: API error: {message}")]
    Api { endpoint: String, message: String },

    /// The response body could not be read or decoded.
    #[error("{endpoint}: failed to decode response: {reason}")]
    Decode { endpoint: String, reason: String },

    /// The request could not be built from its inputs.
    #[error("{endpoint}: invalid request: {reason}")]
    InvalidRequest { endpoint: String, reason: String },
}

impl ProviderError {
    pub(crate) fn from_ureq(endpoint: impl Into<String>, err: ureq::Error) -> Self {
        let endpoint = endpoint.into();
        match err {
            ureq::Error::Status(status, response) => ProviderError::Status {
                endpoint,
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => ProviderError::Transport {
                endpoint,
                source: Box::new(transport),
            },
        }
    }

    pub(crate) fn decode(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        ProviderError::Decode {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}
