//! Glyph advance widths for the two base-14 fonts we emit. Values come from
//! the Adobe AFM files and are in thousandths of an em, indexed by ASCII code
//! starting at space (0x20).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    #[must_use]
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name inside page content streams.
    #[must_use]
    pub const fn resource_name(self) -> &'static [u8] {
        match self {
            Self::Helvetica => b"F1",
            Self::HelveticaBold => b"F2",
        }
    }

    const fn widths(self) -> &'static [u16; 95] {
        match self {
            Self::Helvetica => &HELVETICA_WIDTHS,
            Self::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, // space ! " # $ % & ' ( )
    389, 584, 278, 333, 278, 278,                     // * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015,               // : ; < = > ? @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, // A-J
    667, 556, 833, 722, 778, 667, 778, 722, 667, 611, // K-T
    722, 667, 944, 667, 667, 611,                     // U-Z
    278, 278, 278, 469, 556, 333,                     // [ \ ] ^ _ `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, // a-j
    500, 222, 833, 556, 556, 556, 556, 333, 500, 278, // k-t
    556, 500, 722, 500, 500, 500,                     // u-z
    334, 260, 334, 584,                               // { | } ~
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, // space ! " # $ % & ' ( )
    389, 584, 278, 333, 278, 278,                     // * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975,                // : ; < = > ? @
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, // A-J
    722, 611, 833, 722, 778, 667, 778, 722, 667, 611, // K-T
    722, 667, 944, 667, 667, 611,                     // U-Z
    333, 278, 333, 584, 556, 333,                     // [ \ ] ^ _ `
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, // a-j
    556, 278, 889, 611, 611, 611, 611, 389, 556, 333, // k-t
    611, 556, 778, 556, 556, 500,                     // u-z
    389, 280, 389, 584,                               // { | } ~
];

/// Advance width of `text` at `size` points. Characters outside printable
/// ASCII fall back to the space width; the renderers only emit ASCII.
#[must_use]
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let widths = font.widths();
    let total: u32 = text
        .chars()
        .map(|ch| {
            let code = ch as u32;
            if (0x20..=0x7e).contains(&code) {
                u32::from(widths[(code - 0x20) as usize])
            } else {
                u32::from(widths[0])
            }
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    {
        total as f32 * size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_width_is_uniform() {
        let narrow = text_width("1", Font::Helvetica, 10.0);
        let wide = text_width("8", Font::Helvetica, 10.0);
        assert!((narrow - wide).abs() < f32::EPSILON);
    }

    #[test]
    fn bold_is_at_least_as_wide() {
        let regular = text_width("Net Pay", Font::Helvetica, 12.0);
        let bold = text_width("Net Pay", Font::HelveticaBold, 12.0);
        assert!(bold >= regular);
    }

    #[test]
    fn scales_linearly_with_size() {
        let at_ten = text_width("Gross Pay", Font::Helvetica, 10.0);
        let at_twenty = text_width("Gross Pay", Font::Helvetica, 20.0);
        assert!((at_twenty - at_ten * 2.0).abs() < 0.001);
    }
}
