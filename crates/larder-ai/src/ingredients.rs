//! Ordered, validated ingredient lists

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngredientError {
    #[error("at least one ingredient is required")]
    Empty,

    #[error("ingredient at position {0} is blank")]
    BlankEntry(usize),
}

/// A non-empty list of ingredient names in the order the user entered them.
///
/// Duplicates are allowed and entries are stored exactly as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientList(Vec<String>);

impl IngredientList {
    pub fn new(items: Vec<String>) -> Result<Self, IngredientError> {
        if items.is_empty() {
            return Err(IngredientError::Empty);
        }
        if let Some(idx) = items.iter().position(|i| i.trim().is_empty()) {
            return Err(IngredientError::BlankEntry(idx));
        }
        Ok(Self(items))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Ingredients joined with `", "`.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl TryFrom<Vec<String>> for IngredientList {
    type Error = IngredientError;

    fn try_from(items: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl AsRef<[String]> for IngredientList {
    fn as_ref(&self) -> &[String] {
        self.as_slice()
    }
}
