//! Larder AI - LLM integration for ingredient-driven recipe generation
//!
//! This crate provides:
//! - Validated ingredient lists
//! - Prompt building for recipe generation
//! - LLM API client (Google Gemini / OpenAI-compatible)
//! - The recipe generator that ties the two together

pub mod client;
pub mod error;
pub mod generator;
pub mod ingredients;
pub mod prompt;

pub use client::{LlmClient, LlmProvider};
pub use error::AiError;
pub use generator::{RecipeGenerator, TextGenerator};
pub use ingredients::{IngredientError, IngredientList};
pub use prompt::build_prompt;
