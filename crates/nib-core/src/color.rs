//! Color types, parsing, and terminal capability probing.

use std::env;

/// A terminal color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Color {
    /// True color RGB.
    Rgb {
        /// Red component.
        r: u8,
        /// Green component.
        g: u8,
        /// Blue component.
        b: u8,
    },
    /// 256-color palette index.
    Indexed(u8),
    /// Named ANSI color.
    Named(NamedColor),
}

/// The 16 standard ANSI colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NamedColor {
    /// Black (0).
    Black,
    /// Red (1).
    Red,
    /// Green (2).
    Green,
    /// Yellow (3).
    Yellow,
    /// Blue (4).
    Blue,
    /// Magenta (5).
    Magenta,
    /// Cyan (6).
    Cyan,
    /// White (7).
    White,
    /// Bright black / dark gray (8).
    BrightBlack,
    /// Bright red (9).
    BrightRed,
    /// Bright green (10).
    BrightGreen,
    /// Bright yellow (11).
    BrightYellow,
    /// Bright blue (12).
    BrightBlue,
    /// Bright magenta (13).
    BrightMagenta,
    /// Bright cyan (14).
    BrightCyan,
    /// Bright white (15).
    BrightWhite,
}

impl NamedColor {
    /// SGR foreground code for this color.
    pub const fn fg_code(self) -> u8 {
        match self {
            Self::Black => 30,
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::Cyan => 36,
            Self::White => 37,
            Self::BrightBlack => 90,
            Self::BrightRed => 91,
            Self::BrightGreen => 92,
            Self::BrightYellow => 93,
            Self::BrightBlue => 94,
            Self::BrightMagenta => 95,
            Self::BrightCyan => 96,
            Self::BrightWhite => 97,
        }
    }

    /// SGR background code for this color.
    pub const fn bg_code(self) -> u8 {
        self.fg_code() + 10
    }
}

impl Color {
    /// Parse a color from a user-supplied string.
    ///
    /// Accepts named ANSI colors (`"green"`, `"brightRed"`, `"red-bright"`),
    /// hex (`"#rrggbb"` or `"#rgb"`), `"rgb(r, g, b)"`, and
    /// `"hsl(h, s%, l%)"`. Returns `None` for anything unrecognised; bad
    /// style values are tolerated, not errors.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        if s.starts_with('#') {
            return Self::from_hex(s);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(body) = lower.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            return Self::from_rgb_args(body);
        }
        if let Some(body) = lower.strip_prefix("hsl(").and_then(|r| r.strip_suffix(')')) {
            return Self::from_hsl_args(body);
        }
        Self::from_name(&lower)
    }

    /// Parse a hex color string like `"#rrggbb"` or `"#rgb"`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::Rgb { r, g, b })
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self::Rgb {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            _ => None,
        }
    }

    /// Look up a color by name, including bright variants.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let compact: String = lower.chars().filter(|c| *c != '-' && *c != '_').collect();
        let named = match compact.as_str() {
            "black" => NamedColor::Black,
            "red" => NamedColor::Red,
            "green" => NamedColor::Green,
            "yellow" => NamedColor::Yellow,
            "blue" => NamedColor::Blue,
            "magenta" => NamedColor::Magenta,
            "cyan" => NamedColor::Cyan,
            "white" => NamedColor::White,
            "gray" | "grey" | "blackbright" | "brightblack" => NamedColor::BrightBlack,
            "redbright" | "brightred" => NamedColor::BrightRed,
            "greenbright" | "brightgreen" => NamedColor::BrightGreen,
            "yellowbright" | "brightyellow" => NamedColor::BrightYellow,
            "bluebright" | "brightblue" => NamedColor::BrightBlue,
            "magentabright" | "brightmagenta" => NamedColor::BrightMagenta,
            "cyanbright" | "brightcyan" => NamedColor::BrightCyan,
            "whitebright" | "brightwhite" => NamedColor::BrightWhite,
            _ => return None,
        };
        Some(Self::Named(named))
    }

    /// Parse the argument list of an `rgb(...)` expression.
    fn from_rgb_args(body: &str) -> Option<Self> {
        let mut parts = body.split(',').map(str::trim);
        let r = parts.next()?.parse::<u8>().ok()?;
        let g = parts.next()?.parse::<u8>().ok()?;
        let b = parts.next()?.parse::<u8>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::Rgb { r, g, b })
    }

    /// Parse the argument list of an `hsl(...)` expression.
    fn from_hsl_args(body: &str) -> Option<Self> {
        let mut parts = body.split(',').map(str::trim);
        let h = parts.next()?.parse::<f32>().ok()?;
        let s = parts.next()?.strip_suffix('%')?.trim().parse::<f32>().ok()?;
        let l = parts.next()?.strip_suffix('%')?.trim().parse::<f32>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let (r, g, b) = hsl_to_rgb(h, s / 100.0, l / 100.0);
        Some(Self::Rgb { r, g, b })
    }
}

/// Convert HSL (h in degrees, s and l in 0..=1) to RGB.
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r1), to_byte(g1), to_byte(b1))
}

/// Level of color support available on the attached terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorSupport {
    /// No color output at all.
    NoColor,
    /// 8-bit palette; RGB values are mapped to the nearest palette entry.
    Extended256,
    /// 24-bit true color.
    TrueColor,
}

impl ColorSupport {
    /// Detect color support from the process environment.
    ///
    /// 24-bit emission requires a truecolor marker in `COLORTERM` or a
    /// `TERM` identifier containing `256color` or `24bit`; otherwise RGB
    /// values are downgraded to the nearest 8-bit palette entry.
    pub fn detect() -> Self {
        let colorterm = env::var("COLORTERM").ok();
        let term = env::var("TERM").ok();
        Self::from_vars(colorterm.as_deref(), term.as_deref())
    }

    /// Internal probe over explicit variable values, for testing without
    /// touching the global environment.
    fn from_vars(colorterm: Option<&str>, term: Option<&str>) -> Self {
        if let Some(ct) = colorterm
            && (ct == "truecolor" || ct == "24bit")
        {
            return Self::TrueColor;
        }
        if let Some(t) = term {
            if t == "dumb" {
                return Self::NoColor;
            }
            if t.contains("256color") || t.contains("24bit") {
                return Self::TrueColor;
            }
        }
        Self::Extended256
    }
}

/// Convert RGB to the nearest 256-color palette index.
///
/// The palette is: 0-15 standard/bright, 16-231 a 6x6x6 color cube,
/// 232-255 a grayscale ramp.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return (((u16::from(r) - 8) * 24 / 240) as u8) + 232;
    }

    let ri = color_cube_index(r);
    let gi = color_cube_index(g);
    let bi = color_cube_index(b);
    16 + 36 * ri + 6 * gi + bi
}

/// Map an 8-bit color channel to a 6-level color cube index.
fn color_cube_index(val: u8) -> u8 {
    if val < 48 {
        0
    } else if val < 115 {
        1
    } else {
        ((u16::from(val) - 35) / 40) as u8
    }
}
