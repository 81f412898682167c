//! Color parsing for placeholder fills and editor chrome.
//!
//! Placeholder fills are normalized to `#RRGGBB`, which Canvas 2D accepts
//! directly and the CPU rasterizer converts with [`Rgb::from_hex`].

/// A CSS color string (e.g., "#FF0000")
pub type CssColor = String;

/// RGB color with u8 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse from a hex string (with or without #).
    /// Returns None if the format is invalid.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
                let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
                let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
                Some(Self { r, g, b })
            }
            3 => {
                // #RGB shorthand: each digit doubled
                let mut digits = hex.chars().map(|c| c.to_digit(16));
                let mut next = || -> Option<u8> {
                    let d = u8::try_from(digits.next()??).ok()?;
                    Some(d * 17)
                };
                Some(Self {
                    r: next()?,
                    g: next()?,
                    b: next()?,
                })
            }
            _ => None,
        }
    }

    /// Convert to CSS hex string (#RRGGBB).
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parse a color string and normalize it to `#RRGGBB`.
///
/// Supports formats:
/// - "#RRGGBB" and "#RGB"
/// - "RRGGBB" (hex without # prefix)
/// - "rgb(r, g, b)" (CSS-style)
pub fn parse_color(s: &str) -> Option<CssColor> {
    let s = s.trim();

    if s.starts_with("rgb(") {
        parse_rgb_string(s).map(Rgb::to_hex)
    } else {
        Rgb::from_hex(s).map(Rgb::to_hex)
    }
}

fn parse_rgb_string(s: &str) -> Option<Rgb> {
    let inner = s.strip_prefix("rgb(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(|p| p.trim());
    let r: u8 = parts.next()?.parse().ok()?;
    let g: u8 = parts.next()?.parse().ok()?;
    let b: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb::new(r, g, b))
}

/// Colors used for editor chrome (never part of exported images).
pub mod palette {
    /// Grid guide stroke; drawn at [`GUIDE_ALPHA`].
    pub const GUIDE: &str = "#000000";
    pub const GUIDE_ALPHA: f32 = 0.2;

    /// Template midline guide.
    pub const CENTER_GUIDE: &str = "#E91E63";
    pub const CENTER_GUIDE_ALPHA: f32 = 0.6;

    /// Selection outline around the active placeholder.
    pub const SELECTION: &str = "#007BFF";

    /// Canvas background around the template.
    pub const BACKDROP: &str = "#F0F0F0";
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        assert_eq!(parse_color("#ff0000").unwrap(), "#FF0000");
        assert_eq!(parse_color("00ff7f").unwrap(), "#00FF7F");
    }

    #[test]
    fn test_parse_hex_3() {
        assert_eq!(parse_color("#0f8").unwrap(), "#00FF88");
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_color("rgb(255, 128, 64)").unwrap(), "#FF8040");
        assert!(parse_color("rgb(255, 128)").is_none());
        assert!(parse_color("rgb(300, 0, 0)").is_none());
    }

    #[test]
    fn test_invalid_colors() {
        assert!(parse_color("").is_none());
        assert!(parse_color("#12345").is_none());
        assert!(parse_color("red-ish").is_none());
    }

    #[test]
    fn test_rgb_roundtrip() {
        let c = Rgb::from_hex("#1A2B3C").unwrap();
        assert_eq!(c, Rgb::new(0x1A, 0x2B, 0x3C));
        assert_eq!(c.to_hex(), "#1A2B3C");
    }
}
