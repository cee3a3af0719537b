//! The recipe document as an ordered sequence of layout blocks.

use std::fmt::Display;
use std::io::Write;

use chrono::{DateTime, TimeZone};
use tracing::debug;

use crate::error::RenderError;
use crate::pdf::PdfSink;

pub const DOCUMENT_TITLE: &str = "AI-Generated Recipe";
pub const INGREDIENTS_HEADING: &str = "Ingredients Used:";
pub const RECIPE_HEADING: &str = "Recipe:";

/// `3/5/2024, 2:07:09 PM`
const FOOTER_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// One fixed section of the document, independent of output format.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Ingredients { heading: String, items: Vec<String> },
    Body { heading: String, text: String },
    Footer(String),
}

/// Receives blocks in document order. `finish` marks the end of the stream;
/// no block may follow it.
pub trait DocumentSink {
    type Output;

    fn write_block(&mut self, block: &Block) -> Result<(), RenderError>;

    fn finish(self) -> Result<Self::Output, RenderError>;
}

/// Builder holding the four blocks of a recipe document.
#[derive(Debug, Clone)]
pub struct RecipeDocument {
    blocks: Vec<Block>,
}

impl RecipeDocument {
    pub fn new<Tz>(
        ingredients: &[String],
        plain_recipe: &str,
        generated_by: &str,
        generated_at: &DateTime<Tz>,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let footer = format!(
            "Generated using {} on: {}",
            generated_by,
            generated_at.format(FOOTER_TIME_FORMAT)
        );

        Self {
            blocks: vec![
                Block::Title(DOCUMENT_TITLE.to_string()),
                Block::Ingredients {
                    heading: INGREDIENTS_HEADING.to_string(),
                    items: ingredients.to_vec(),
                },
                Block::Body {
                    heading: RECIPE_HEADING.to_string(),
                    text: plain_recipe.to_string(),
                },
                Block::Footer(footer),
            ],
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Write every block to `sink` in order, then finish it.
    pub fn emit<S: DocumentSink>(&self, mut sink: S) -> Result<S::Output, RenderError> {
        for block in &self.blocks {
            sink.write_block(block)?;
        }
        debug!("Emitted {} document blocks", self.blocks.len());
        sink.finish()
    }
}

/// Render a recipe straight to a PDF writer, returning the writer once the
/// document is complete.
pub fn render<W, Tz>(
    ingredients: &[String],
    plain_recipe: &str,
    generated_by: &str,
    generated_at: &DateTime<Tz>,
    writer: W,
) -> Result<W, RenderError>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    RecipeDocument::new(ingredients, plain_recipe, generated_by, generated_at).emit(PdfSink::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[derive(Default)]
    struct Recording {
        blocks: Vec<Block>,
    }

    impl DocumentSink for Recording {
        type Output = Vec<Block>;

        fn write_block(&mut self, block: &Block) -> Result<(), RenderError> {
            self.blocks.push(block.clone());
            Ok(())
        }

        fn finish(self) -> Result<Vec<Block>, RenderError> {
            Ok(self.blocks)
        }
    }

    struct FailingSink;

    impl DocumentSink for FailingSink {
        type Output = ();

        fn write_block(&mut self, _block: &Block) -> Result<(), RenderError> {
            Err(RenderError::Sink(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "client went away",
            )))
        }

        fn finish(self) -> Result<(), RenderError> {
            panic!("finish must not run after a failed write");
        }
    }

    fn generated_at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
            .unwrap()
    }

    fn document() -> RecipeDocument {
        RecipeDocument::new(
            &["egg".to_string(), "rice".to_string()],
            "Fried Rice\n\u{2022} 2 eggs",
            "Google Gemini AI",
            &generated_at(),
        )
    }

    #[test]
    fn blocks_are_in_fixed_order() {
        let blocks = document().emit(Recording::default()).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0], Block::Title("AI-Generated Recipe".to_string()));
        assert_eq!(
            blocks[1],
            Block::Ingredients {
                heading: "Ingredients Used:".to_string(),
                items: vec!["egg".to_string(), "rice".to_string()],
            }
        );
        assert!(matches!(&blocks[2], Block::Body { heading, text } if heading == "Recipe:" && text.starts_with("Fried Rice")));
        assert!(matches!(blocks[3], Block::Footer(_)));
    }

    #[test]
    fn footer_names_source_and_time() {
        let doc = document();
        assert_eq!(
            doc.blocks()[3],
            Block::Footer("Generated using Google Gemini AI on: 3/5/2024, 2:07:09 PM".to_string())
        );
    }

    #[test]
    fn sink_failure_propagates() {
        let err = document().emit(FailingSink).unwrap_err();
        assert!(matches!(err, RenderError::Sink(_)));
    }

    #[test]
    fn render_writes_pdf() {
        let bytes = render(
            &["tofu".to_string()],
            "Press the tofu.",
            "Google Gemini AI",
            &generated_at(),
            Vec::new(),
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
