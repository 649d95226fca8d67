//! Shared layout constants and greedy word wrapping for letter-size pages.

use super::metrics::{Font, text_width};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
/// Vertical band at the bottom reserved for the footer lines.
pub const FOOTER_HEIGHT: f32 = 72.0;
pub const LINE_HEIGHT: f32 = 14.0;

#[must_use]
pub const fn content_right() -> f32 {
    PAGE_WIDTH - MARGIN
}

/// Lowest baseline body text may occupy before a page break is forced.
#[must_use]
pub const fn min_body_y() -> f32 {
    FOOTER_HEIGHT + 20.0
}

/// True when `required_lines` more rows would intrude into the footer band,
/// looking ahead at `LINE_HEIGHT` per row.
#[must_use]
pub fn needs_break(y: f32, required_lines: u32) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let lookahead = required_lines as f32 * LINE_HEIGHT;
    y - lookahead < min_body_y()
}

/// Greedy word wrap by measured width. A word wider than `max_width` gets a
/// line of its own rather than being split mid-word.
#[must_use]
pub fn wrap_words(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, font, size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
