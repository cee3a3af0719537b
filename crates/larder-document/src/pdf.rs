//! PDF output for recipe documents, built with `lopdf`.
//!
//! Blocks are laid out as they arrive onto US Letter pages using the
//! built-in Helvetica font, so no font data is embedded. Page content is
//! append-only; the serialized file is written to the underlying writer when
//! the sink is finished.

use std::io::Write;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

use crate::document::{Block, DocumentSink, DOCUMENT_TITLE};
use crate::error::RenderError;
use crate::winansi::{encode, text_width};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const FONT_NAME: &str = "F1";
const LINE_HEIGHT: f32 = 1.2;
const BASELINE_OFFSET: f32 = 0.8;

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 14.0;
const INGREDIENTS_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    align: Align,
    underline: bool,
}

impl TextStyle {
    const fn plain(size: f32) -> Self {
        Self {
            size,
            align: Align::Left,
            underline: false,
        }
    }

    const fn centered(size: f32) -> Self {
        Self {
            size,
            align: Align::Center,
            underline: false,
        }
    }

    const fn heading() -> Self {
        Self {
            size: HEADING_SIZE,
            align: Align::Left,
            underline: true,
        }
    }
}

/// A `DocumentSink` producing a PDF file on `W`.
pub struct PdfSink<W: Write> {
    writer: W,
    /// Operations per page; the last entry is the page being filled.
    pages: Vec<Vec<Operation>>,
    /// Distance from the top edge of the current page to the next line.
    cursor: f32,
}

impl<W: Write> PdfSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pages: vec![Vec::new()],
            cursor: MARGIN,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn move_down(&mut self, size: f32) {
        self.cursor += size * LINE_HEIGHT;
    }

    fn ensure_room(&mut self, line_height: f32) {
        if self.cursor + line_height > PAGE_HEIGHT - MARGIN && self.cursor > MARGIN {
            self.pages.push(Vec::new());
            self.cursor = MARGIN;
        }
    }

    fn write_text(&mut self, text: &str, style: TextStyle) {
        for paragraph in text.split('\n') {
            let lines = wrap_text(paragraph, style.size, CONTENT_WIDTH);
            if lines.is_empty() {
                self.move_down(style.size);
                continue;
            }
            for line in lines {
                self.ensure_room(style.size * LINE_HEIGHT);
                self.draw_line(&line, style);
                self.move_down(style.size);
            }
        }
    }

    fn draw_line(&mut self, line: &str, style: TextStyle) {
        let width = text_width(line, style.size);
        let x = match style.align {
            Align::Left => MARGIN,
            Align::Center => MARGIN + (CONTENT_WIDTH - width).max(0.0) / 2.0,
        };
        let baseline = PAGE_HEIGHT - (self.cursor + style.size * BASELINE_OFFSET);

        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), style.size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode(line))]),
            Operation::new("ET", vec![]),
        ];
        if style.underline {
            let y = baseline - style.size * 0.1;
            ops.extend([
                Operation::new("w", vec![(style.size * 0.05).into()]),
                Operation::new("m", vec![x.into(), y.into()]),
                Operation::new("l", vec![(x + width).into(), y.into()]),
                Operation::new("S", vec![]),
            ]);
        }

        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }
    }
}

impl<W: Write> DocumentSink for PdfSink<W> {
    type Output = W;

    fn write_block(&mut self, block: &Block) -> Result<(), RenderError> {
        match block {
            Block::Title(title) => {
                self.write_text(title, TextStyle::centered(TITLE_SIZE));
                self.move_down(TITLE_SIZE);
            }
            Block::Ingredients { heading, items } => {
                self.write_text(heading, TextStyle::heading());
                self.write_text(&items.join(", "), TextStyle::plain(INGREDIENTS_SIZE));
                self.move_down(INGREDIENTS_SIZE);
            }
            Block::Body { heading, text } => {
                self.write_text(heading, TextStyle::heading());
                self.move_down(HEADING_SIZE);
                self.write_text(text, TextStyle::plain(BODY_SIZE));
                self.move_down(BODY_SIZE);
            }
            Block::Footer(text) => {
                self.write_text(text, TextStyle::centered(FOOTER_SIZE));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<W, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { FONT_NAME => font_id },
        });

        let page_total = self.pages.len();
        let mut kids: Vec<Object> = Vec::with_capacity(page_total);
        for operations in std::mem::take(&mut self.pages) {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let media_box: Vec<Object> = vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_total as i64,
                "Resources" => resources_id,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(DOCUMENT_TITLE),
            "Producer" => Object::string_literal("larder"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        doc.save_to(&mut self.writer)?;
        self.writer.flush()?;
        debug!("Wrote PDF with {} pages", page_total);
        Ok(self.writer)
    }
}

/// Break one paragraph into lines no wider than `max_width`.
///
/// Words are separated by single spaces; a word wider than the whole line is
/// split between characters. Returns no lines for a blank paragraph.
fn wrap_text(paragraph: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, size) <= max_width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            current.push(ch);
            if text_width(&current, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
