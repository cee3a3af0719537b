//! Markdown to plain text normalization.
//!
//! The conversion is an ordered pipeline of single-pass regex rewrites. Order
//! is part of the contract: the italic stage only sees single asterisks
//! because the bold stage already consumed the doubled ones, and the bullet
//! stage runs after emphasis so that `*` at the start of a line is still a
//! list marker rather than an unmatched emphasis delimiter.

use once_cell::sync::Lazy;
use regex::Regex;

/// Glyph that replaces every bulleted-list marker.
pub const BULLET: char = '\u{2022}';

/// One named rewrite in the pipeline.
pub struct Stage {
    pub name: &'static str,
    pattern: &'static Lazy<Regex>,
    replacement: &'static str,
}

impl Stage {
    /// Apply this stage once across the whole input.
    pub fn apply(&self, input: &str) -> String {
        self.pattern.replace_all(input, self.replacement).into_owned()
    }
}

static HEADERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").unwrap());
static BULLETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*+]\s+").unwrap());
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[0-9]+\.\s+").unwrap());

/// The normalization stages in application order.
pub static STAGES: [Stage; 6] = [
    Stage {
        name: "headers",
        pattern: &HEADERS,
        replacement: "",
    },
    Stage {
        name: "bold",
        pattern: &BOLD,
        replacement: "$1",
    },
    Stage {
        name: "italic",
        pattern: &ITALIC,
        replacement: "$1",
    },
    Stage {
        name: "inline_code",
        pattern: &INLINE_CODE,
        replacement: "$1",
    },
    Stage {
        name: "bullets",
        pattern: &BULLETS,
        replacement: "\u{2022} ",
    },
    Stage {
        name: "numbered",
        pattern: &NUMBERED,
        replacement: "",
    },
];

/// Strip markdown syntax from a recipe, leaving text fit for fixed layout.
///
/// Never fails; syntax it does not recognize passes through untouched.
/// Numbered-list markers are dropped entirely, so step numbers are lost.
pub fn to_plain_text(markdown: &str) -> String {
    STAGES
        .iter()
        .fold(markdown.to_string(), |text, stage| stage.apply(&text))
        .trim()
        .to_string()
}
