use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("variable write failed: {0}")]
    Write(String),

    #[error("notification push failed: {0}")]
    Notify(String),

    #[error("telemetry push failed: {0}")]
    Telemetry(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn fetch(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Fetch(format!("{context}: {err}"))
    }

    pub fn write(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Write(format!("{context}: {err}"))
    }

    /// Everything except an invariant violation is absorbed by the loop.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Invariant(_))
    }
}
