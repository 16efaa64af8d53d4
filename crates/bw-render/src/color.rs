//! Background colour values.

/// Opaque 8-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Accepts `rgb(r,g,b)`, `rgba(r,g,b,a)` (alpha dropped), `#rgb` and
    /// `#rrggbb`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = value.to_ascii_lowercase();
        let (args, arity) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, 4)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, 3)
        } else {
            return None;
        };

        let parts: Vec<&str> = args.strip_suffix(')')?.split(',').map(str::trim).collect();
        if parts.len() != arity {
            return None;
        }

        Some(Self::rgb(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
        ))
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

fn channel(text: &str) -> Option<u8> {
    let number = text.parse::<f32>().ok()?;
    Some(number.clamp(0.0, 255.0) as u8)
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    let digit = |idx: usize| u8::from_str_radix(&hex[idx..idx + 1], 16).ok();
    let pair = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();

    match hex.len() {
        3 => Some(Color::rgb(
            digit(0)? * 17,
            digit(1)? * 17,
            digit(2)? * 17,
        )),
        6 => Some(Color::rgb(pair(0)?, pair(2)?, pair(4)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn parses_functional_notation() {
        assert_eq!(Color::parse("rgb(123,104,238)"), Some(Color::rgb(123, 104, 238)));
        assert_eq!(Color::parse("RGB( 0 , 205, 205 )"), Some(Color::rgb(0, 205, 205)));
        assert_eq!(Color::parse("rgba(1,2,3,0.5)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(Color::parse("rgb(300,-4,7)"), Some(Color::rgb(255, 0, 7)));
    }

    #[test]
    fn parses_hex_notation() {
        assert_eq!(Color::parse("#ff5000"), Some(Color::rgb(255, 80, 0)));
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(Color::parse("red"), None);
        assert_eq!(Color::parse("rgb(1,2)"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#ggg"), None);
    }
}
