//! Color arguments for `fill` and `background_color`
//!
//! Accepts CSS color names or hex values (`rgb`, `rgba`, `rrggbb`,
//! `rrggbbaa`, optionally prefixed with `#`).

use serde_json::{json, Value};

/// RGB color with optional alpha in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: Option<f64>,
}

impl Rgba {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: None }
    }

    /// `{r, g, b}` plus `alpha` when not fully opaque
    pub fn to_value(&self) -> Value {
        match self.alpha {
            Some(alpha) if alpha < 1.0 => {
                json!({"r": self.r, "g": self.g, "b": self.b, "alpha": alpha})
            }
            _ => json!({"r": self.r, "g": self.g, "b": self.b}),
        }
    }
}

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("aqua", Rgba::rgb(0, 255, 255)),
    ("beige", Rgba::rgb(245, 245, 220)),
    ("black", Rgba::rgb(0, 0, 0)),
    ("blue", Rgba::rgb(0, 0, 255)),
    ("brown", Rgba::rgb(165, 42, 42)),
    ("coral", Rgba::rgb(255, 127, 80)),
    ("crimson", Rgba::rgb(220, 20, 60)),
    ("cyan", Rgba::rgb(0, 255, 255)),
    ("darkblue", Rgba::rgb(0, 0, 139)),
    ("darkgray", Rgba::rgb(169, 169, 169)),
    ("darkgreen", Rgba::rgb(0, 100, 0)),
    ("darkgrey", Rgba::rgb(169, 169, 169)),
    ("darkred", Rgba::rgb(139, 0, 0)),
    ("fuchsia", Rgba::rgb(255, 0, 255)),
    ("gold", Rgba::rgb(255, 215, 0)),
    ("gray", Rgba::rgb(128, 128, 128)),
    ("green", Rgba::rgb(0, 128, 0)),
    ("grey", Rgba::rgb(128, 128, 128)),
    ("indigo", Rgba::rgb(75, 0, 130)),
    ("ivory", Rgba::rgb(255, 255, 240)),
    ("khaki", Rgba::rgb(240, 230, 140)),
    ("lightblue", Rgba::rgb(173, 216, 230)),
    ("lightgray", Rgba::rgb(211, 211, 211)),
    ("lightgreen", Rgba::rgb(144, 238, 144)),
    ("lightgrey", Rgba::rgb(211, 211, 211)),
    ("lime", Rgba::rgb(0, 255, 0)),
    ("magenta", Rgba::rgb(255, 0, 255)),
    ("maroon", Rgba::rgb(128, 0, 0)),
    ("navy", Rgba::rgb(0, 0, 128)),
    ("olive", Rgba::rgb(128, 128, 0)),
    ("orange", Rgba::rgb(255, 165, 0)),
    ("pink", Rgba::rgb(255, 192, 203)),
    ("purple", Rgba::rgb(128, 0, 128)),
    ("red", Rgba::rgb(255, 0, 0)),
    ("salmon", Rgba::rgb(250, 128, 114)),
    ("silver", Rgba::rgb(192, 192, 192)),
    ("skyblue", Rgba::rgb(135, 206, 235)),
    ("tan", Rgba::rgb(210, 180, 140)),
    ("teal", Rgba::rgb(0, 128, 128)),
    ("turquoise", Rgba::rgb(64, 224, 208)),
    ("violet", Rgba::rgb(238, 130, 238)),
    ("white", Rgba::rgb(255, 255, 255)),
    ("yellow", Rgba::rgb(255, 255, 0)),
];

/// Parse a color name or hex value
pub fn parse(value: &str) -> Option<Rgba> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();

    if let Some((_, color)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
        return Some(*color);
    }

    parse_hex(lower.strip_prefix('#').unwrap_or(&lower))
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    let alpha = if expanded.len() == 8 {
        Some(f64::from(channel(6)?) / 255.0)
    } else {
        None
    };

    Some(Rgba {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
        alpha,
    })
}
