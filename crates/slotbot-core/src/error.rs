use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotbotError {
    #[error("not initialized: run 'slotbot init'")]
    NotInitialized,

    #[error("invalid lesson: {0}")]
    InvalidLesson(String),

    #[error("adapter fault: {0}")]
    Adapter(String),

    #[error("bot detection tripped: {0}")]
    BotDetected(String),

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SlotbotError>;
