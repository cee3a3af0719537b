//! The text generation capability and the recipe generator built on it

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::AiError;
use crate::ingredients::IngredientList;
use crate::prompt::build_prompt;

/// A model that turns a prompt into text.
///
/// `LlmClient` is the production implementation; tests substitute their own.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;

    /// Identifier of the model answering requests.
    fn model(&self) -> &str;

    /// Human-readable name of the service, e.g. "Google Gemini AI".
    fn provider_label(&self) -> &str;
}

/// Generates markdown recipes from ingredient lists.
///
/// Stateless apart from the shared generator handle, so one instance serves
/// every request.
#[derive(Clone)]
pub struct RecipeGenerator {
    backend: Arc<dyn TextGenerator>,
}

impl RecipeGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    /// Ask the model for a recipe. Failures are returned as-is; nothing is retried.
    pub async fn generate_recipe(&self, ingredients: &IngredientList) -> Result<String, AiError> {
        let prompt = build_prompt(ingredients);
        debug!(
            "Requesting recipe for {} ingredients ({} prompt bytes)",
            ingredients.len(),
            prompt.len()
        );

        match self.backend.generate(&prompt).await {
            Ok(recipe) => {
                info!(
                    "Generated recipe with {} ({} bytes)",
                    self.backend.model(),
                    recipe.len()
                );
                Ok(recipe)
            }
            Err(e) => {
                warn!(kind = e.kind(), "Recipe generation failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn provider_label(&self) -> &str {
        self.backend.provider_label()
    }
}

impl std::fmt::Debug for RecipeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeGenerator")
            .field("model", &self.backend.model())
            .finish()
    }
}
