use async_trait::async_trait;

/// Audible output shared by the dispatch loop and every plugin.
///
/// Implementations serialize calls: a second caller waits until the first
/// utterance has finished playing.
#[async_trait]
pub trait Speak: Send + Sync {
    async fn speak(&self, text: &str);
}
