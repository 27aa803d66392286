#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Env(#[from] envy::Error),
    #[error("markdown parse failed: {0}")]
    Markdown(String),
    #[error("transcript has no segments")]
    EmptyTranscript,
    #[error("document has no matchable blocks")]
    EmptyDocument,
}

pub type Result<T> = std::result::Result<T, Error>;
