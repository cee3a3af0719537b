//! Larder Document - turns generated markdown recipes into downloadable documents
//!
//! This crate provides:
//! - Markdown to plain text normalization
//! - A format-independent block model for the recipe document
//! - A PDF sink built on `lopdf`

pub mod document;
pub mod error;
pub mod markdown;
pub mod pdf;
mod winansi;

pub use document::{render, Block, DocumentSink, RecipeDocument, DOCUMENT_TITLE};
pub use error::RenderError;
pub use markdown::{to_plain_text, BULLET};
pub use pdf::PdfSink;
