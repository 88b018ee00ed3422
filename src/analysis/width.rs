use crate::config::TitleWidthConfig;
use std::sync::Arc;

/// Estimates how wide a title renders in a search result snippet, in pixels
pub trait TitleWidth: Send + Sync {
    fn measure(&self, title: &str) -> f64;
}

/// Fixed width per character
#[derive(Debug, Clone, Copy)]
pub struct CharCountWidth {
    pub px_per_char: f64,
}

impl TitleWidth for CharCountWidth {
    fn measure(&self, title: &str) -> f64 {
        title.chars().count() as f64 * self.px_per_char
    }
}

/// Width from glyph classes of a proportional sans-serif face, in ems scaled to
/// `font_size_px`
#[derive(Debug, Clone, Copy)]
pub struct ProportionalWidth {
    pub font_size_px: f64,
}

impl ProportionalWidth {
    fn glyph_em(c: char) -> f64 {
        match c {
            'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.25,
            ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.33,
            'm' | 'w' | 'M' | 'W' | '@' | '—' => 0.86,
            c if c.is_uppercase() => 0.68,
            c if c.is_ascii_digit() => 0.56,
            _ => 0.53,
        }
    }
}

impl TitleWidth for ProportionalWidth {
    fn measure(&self, title: &str) -> f64 {
        title.chars().map(Self::glyph_em).sum::<f64>() * self.font_size_px
    }
}

/// Builds the strategy selected in the configuration
pub fn from_config(config: TitleWidthConfig) -> Arc<dyn TitleWidth> {
    match config {
        TitleWidthConfig::Chars { px_per_char } => Arc::new(CharCountWidth { px_per_char }),
        TitleWidthConfig::Proportional { font_size_px } => {
            Arc::new(ProportionalWidth { font_size_px })
        }
    }
}
