//! Text curves laid out as glyph blocks
//!
//! Labels are short place codes, so each visible character is drawn as one
//! solid block cell on a single baseline. Whitespace advances the pen without
//! emitting a block.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Width of a glyph block, in font units
pub const GLYPH_WIDTH: f64 = 0.6;
/// Height of a glyph block above the baseline
pub const GLYPH_HEIGHT: f64 = 0.7;
/// Horizontal pen advance per character
pub const GLYPH_ADVANCE: f64 = 0.7;

/// A flat text primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCurve {
    pub name: String,
    pub body: String,
    /// Font size multiplier
    pub size: f64,
}

impl TextCurve {
    pub fn new(name: &str, body: &str) -> Self {
        Self {
            name: name.to_string(),
            body: body.to_string(),
            size: 1.0,
        }
    }

    /// Closed counter-clockwise outlines in the XY plane, one per glyph,
    /// starting at the origin and running along +X
    pub fn outlines(&self) -> Vec<Vec<DVec3>> {
        self.body
            .chars()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| {
                let x0 = i as f64 * GLYPH_ADVANCE * self.size;
                let x1 = x0 + GLYPH_WIDTH * self.size;
                let y1 = GLYPH_HEIGHT * self.size;
                vec![
                    DVec3::new(x0, 0.0, 0.0),
                    DVec3::new(x1, 0.0, 0.0),
                    DVec3::new(x1, y1, 0.0),
                    DVec3::new(x0, y1, 0.0),
                ]
            })
            .collect()
    }

    pub fn glyph_count(&self) -> usize {
        self.body.chars().filter(|c| !c.is_whitespace()).count()
    }
}
