use crate::formats::ViolationCode;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("line is not valid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("line could not be read: {0}")]
    Unreadable(#[source] std::io::Error),

    #[error("record is not a json object")]
    NotAnObject,

    #[error("record has no payload (checked payload_json, payload, data, body)")]
    MissingPayload,

    #[error("embedded payload string is not valid json: {0}")]
    EmbeddedPayload(#[source] serde_json::Error),

    #[error("source access blocked: {reason}")]
    Blocked { reason: String },
}

impl RecordError {
    pub fn code(&self) -> ViolationCode {
        match self {
            Self::InvalidJson(_) | Self::Unreadable(_) | Self::NotAnObject => {
                ViolationCode::RecordParseFail
            }
            Self::MissingPayload | Self::EmbeddedPayload(_) => ViolationCode::NormalizeException,
            Self::Blocked { .. } => ViolationCode::SourceAccessBlocked,
        }
    }
}
