pub mod gemini;

pub use gemini::GeminiClient;

use crate::concept::Concept;
use crate::error::Result;

/// Generation backend seam between the controller and the external service.
#[async_trait::async_trait]
pub trait StoryModel: Send + Sync {
    /// Brainstorm a batch of story concepts from the user's reference story.
    async fn request_concepts(&self, reference_text: &str) -> Result<Vec<Concept>>;

    /// Expand one concept into the full narration text.
    async fn request_script(&self, concept: &Concept) -> Result<String>;
}
