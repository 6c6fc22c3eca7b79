use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a query entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    NotReady,
    Ready,
    Processing,
    Responded,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status value: {0:?}")]
pub struct InvalidStatus(pub String);

impl QueryStatus {
    pub const ALL: [QueryStatus; 6] = [
        QueryStatus::NotReady,
        QueryStatus::Ready,
        QueryStatus::Processing,
        QueryStatus::Responded,
        QueryStatus::Complete,
        QueryStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::NotReady => "not_ready",
            QueryStatus::Ready => "ready",
            QueryStatus::Processing => "processing",
            QueryStatus::Responded => "responded",
            QueryStatus::Complete => "complete",
            QueryStatus::Error => "error",
        }
    }

    /// True when the responder has written an answer the client should read out.
    pub fn is_answered(&self) -> bool {
        matches!(self, QueryStatus::Responded | QueryStatus::Complete)
    }

    /// True when no further status change is expected.
    pub fn is_terminal(&self) -> bool {
        self.is_answered() || *self == QueryStatus::Error
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

impl TryFrom<String> for QueryStatus {
    type Error = InvalidStatus;

    fn try_from(value: String) -> Result<Self, InvalidStatus> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_every_allowed_value() {
        for status in QueryStatus::ALL {
            assert_eq!(status.as_str().parse::<QueryStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_rejects_unknown_value() {
        assert_eq!(
            "bogus".parse::<QueryStatus>(),
            Err(InvalidStatus("bogus".to_string()))
        );
        assert!("Complete".parse::<QueryStatus>().is_err());
        assert!("".parse::<QueryStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(QueryStatus::Responded.is_answered());
        assert!(QueryStatus::Complete.is_answered());
        assert!(!QueryStatus::Error.is_answered());
        assert!(QueryStatus::Error.is_terminal());
        assert!(!QueryStatus::Ready.is_terminal());
        assert!(!QueryStatus::Processing.is_terminal());
        assert!(!QueryStatus::NotReady.is_terminal());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&QueryStatus::NotReady).unwrap();
        assert_eq!(json, "\"not_ready\"");
        let parsed: QueryStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(parsed, QueryStatus::Processing);
    }
}
