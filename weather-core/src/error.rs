//! Failure values returned at the provider and store boundaries.

use thiserror::Error;

/// Why a weather fetch for one city failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout or an interrupted body.
    #[error("Transport error talking to {provider}: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with HTTP {code}: {body}")]
    UpstreamStatus {
        provider: &'static str,
        code: u16,
        body: String,
    },

    /// The body was not JSON, or lacked the fields the adapter expects.
    #[error("Could not parse {provider} response: {reason}")]
    Unparseable {
        provider: &'static str,
        reason: String,
    },
}

impl FetchError {
    /// HTTP status for `UpstreamStatus`, `None` otherwise.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::UpstreamStatus { .. } => "upstream-status",
            Self::Unparseable { .. } => "unparseable",
        }
    }
}

/// Why a bucket check or snapshot write failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Bucket '{bucket}' is unavailable: {reason}")]
    BucketUnavailable { bucket: String, reason: String },

    #[error("Write of '{key}' was denied: {reason}")]
    WriteDenied { key: String, reason: String },

    #[error("Write of '{key}' failed: {reason}")]
    WriteFailed { key: String, reason: String },
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BucketUnavailable { .. } => "bucket-unavailable",
            Self::WriteDenied { .. } => "write-denied",
            Self::WriteFailed { .. } => "write-failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_for_upstream_status() {
        let err = FetchError::UpstreamStatus {
            provider: "openweather",
            code: 404,
            body: "city not found".into(),
        };
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.kind(), "upstream-status");

        let err = FetchError::Unparseable { provider: "openweather", reason: "missing field".into() };
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn messages_name_the_failing_piece() {
        let err = FetchError::UpstreamStatus {
            provider: "weatherapi",
            code: 400,
            body: "No matching location found.".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("weatherapi"));
        assert!(msg.contains("400"));

        let err = StoreError::WriteDenied {
            key: "weather-data/Oslo-20240101-000000.json".into(),
            reason: "AccessDenied".into(),
        };
        assert!(err.to_string().contains("weather-data/Oslo"));
        assert_eq!(err.kind(), "write-denied");
    }
}
