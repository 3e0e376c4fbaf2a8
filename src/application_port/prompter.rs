use crate::domain_model::Identifier;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("operator input closed")]
    Closed,
    #[error("prompt io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operator interaction. Implementations own validation and re-asking;
/// callers only ever see normalized answers.
#[async_trait::async_trait]
pub trait Prompter: Send {
    /// A non-empty identifier.
    async fn identifier(&mut self) -> Result<Identifier, PromptError>;

    /// The desired admin flag, with `current` offered as the default.
    async fn confirm_admin(&mut self, current: bool) -> Result<bool, PromptError>;
}
