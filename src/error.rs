use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("Please login or register first")]
    NotAuthenticated,
    #[error("Item {0} not found")]
    ItemNotFound(String),
    #[error("Chat {0} not found")]
    ChatNotFound(String),
    #[error("User {user_id} is not a participant of chat {chat_id}")]
    NotParticipant { chat_id: String, user_id: String },
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn missing(field: &str) -> Self {
        Error::Validation(format!("Missing required field: {}", field))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
