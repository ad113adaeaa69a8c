use thiserror::Error;

/// Any failure of a single upstream call. Callers only ever see one of these
/// per call; nothing is retried and no partial payload is returned.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Upstream response is not valid JSON: {0}")]
    Decode(String),
}

impl GatewayError {
    /// HTTP status reported by the upstream, if it answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Request(e) => e.status().map(|s| s.as_u16()),
            GatewayError::Decode(_) => None,
        }
    }
}
