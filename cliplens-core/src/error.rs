use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliplensError {
    #[error("malformed drag payload: {0}")]
    MalformedDragPayload(String),

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, CliplensError>;
