use thiserror::Error;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("envelope is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has the wrong type")]
    InvalidField(&'static str),

    #[error("unknown result tag `{0}`")]
    UnknownResultTag(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
