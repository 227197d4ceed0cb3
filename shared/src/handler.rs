use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Arguments captured for one dispatch cycle: the free-form text exactly as
/// recognized, plus its whitespace-delimited tokens.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandArgs {
    pub raw: String,
    pub params: Vec<String>,
}

impl CommandArgs {
    pub fn from_text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let params = raw.split_whitespace().map(str::to_string).collect();
        Self { raw, params }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters joined back with single spaces.
    pub fn joined(&self) -> String {
        self.params.join(" ")
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// `Ok` carries the text to speak back; `Err` means the handler itself failed.
pub type HandlerResult = Result<String, HandlerError>;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, args: CommandArgs) -> HandlerResult;
}

/// Adapts a plain closure into a [`Handler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(CommandArgs) -> HandlerResult + Send + Sync,
{
    async fn handle(&self, args: CommandArgs) -> HandlerResult {
        (self.0)(args)
    }
}

pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(CommandArgs) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}
