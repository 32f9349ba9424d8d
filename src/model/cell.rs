//! Cell model.

use crate::color::Color;
use serde::{Deserialize, Serialize};

/// A single worksheet cell.
///
/// The writer emits `value` when it is non-empty and falls back to
/// `number` otherwise; `None` there means "no value", which is distinct
/// from `Some(0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Text value, with shared strings already substituted
    #[serde(default)]
    pub value: String,

    /// Integer value, when the source cell held one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,

    /// Resolved display color
    #[serde(default, skip_serializing_if = "Color::is_none")]
    pub color: Color,
}

impl Cell {
    /// Create a text cell with no color.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Create a cell holding only an integer.
    pub fn integer(number: i64) -> Self {
        Self {
            number: Some(number),
            ..Default::default()
        }
    }

    /// Set the color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// True when the value is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}
