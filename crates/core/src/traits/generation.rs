//! Text generation interface

use async_trait::async_trait;

use crate::Result;

/// A provider that turns a prompt into text.
///
/// The extraction and classification paths treat implementations as untrusted
/// oracles: any error, or any output that fails to parse, sends them to their
/// deterministic fallback.
///
/// # Example
///
/// ```ignore
/// let generator: Arc<dyn TextGenerator> = Arc::new(ProviderClient::from_settings(&settings)?);
/// let text = generator.generate_text("Extract tags from ...").await?;
/// ```
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}
