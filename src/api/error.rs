use std::fmt;

use reqwest::StatusCode;

/// Which request/response call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateGame,
    JoinGame,
    FetchGame,
    PlaceTrap,
    SelectSeat,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateGame => "create game",
            Operation::JoinGame => "join game",
            Operation::FetchGame => "fetch game",
            Operation::PlaceTrap => "place trap",
            Operation::SelectSeat => "select seat",
        };
        f.write_str(name)
    }
}

/// A request to the game service did not succeed.
///
/// Cloneable so the latest failure can be kept around for display while the
/// caller also gets its own copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("{operation} failed: {reason}")]
    Transport { operation: Operation, reason: String },
    #[error("{operation} failed: service responded with {status}: {body}")]
    Status {
        operation: Operation,
        status: StatusCode,
        body: String,
    },
    #[error("{operation} failed: invalid response payload: {reason}")]
    Decode { operation: Operation, reason: String },
    #[error("{operation} failed: cannot build request url: {reason}")]
    InvalidEndpoint { operation: Operation, reason: String },
}

impl RequestError {
    pub fn transport(operation: Operation, reason: impl fmt::Display) -> Self {
        Self::Transport {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            RequestError::Transport { operation, .. }
            | RequestError::Status { operation, .. }
            | RequestError::Decode { operation, .. }
            | RequestError::InvalidEndpoint { operation, .. } => *operation,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
