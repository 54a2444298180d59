use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Host error: {0}")]
    Host(String),
    #[error("Host operation '{0}' is not supported")]
    OperationNotSupported(String),
    #[error("Sync endpoint error: {0}")]
    Endpoint(#[from] reqwest::Error),
    #[error("Invalid command payload: {0}")]
    InvalidPayload(String),
}

impl BridgeError {
    pub fn host(message: impl Into<String>) -> Self {
        BridgeError::Host(message.into())
    }

    pub fn operation_not_supported(operation: &str) -> Self {
        BridgeError::OperationNotSupported(operation.to_string())
    }
}
