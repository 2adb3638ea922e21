//! # Markup Normalization
//!
//! Translation of operator-friendly color markup into the wire form the
//! renderer expects. The engine only depends on the trait; hosts may plug
//! in their own translator.

/// Marker the wire format uses for formatting codes.
pub const SECTION_SIGN: char = '\u{00A7}';

const LEGACY_CODES: &str = "0123456789AaBbCcDdEeFfKkLlMmNnOoRrXx";

/// Normalizes color/format markup in a line of text.
pub trait MarkupNormalizer: Send + Sync {
    /// Returns `text` in wire form.
    fn normalize(&self, text: &str) -> String;

    /// Normalizes every line, preserving order.
    fn normalize_all(&self, lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| self.normalize(line)).collect()
    }
}

/// `&`-prefixed legacy codes (`&a`, `&l`, `&x` ...) to section-sign codes.
///
/// An `&` not followed by a known code is left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyAmpersand;

impl MarkupNormalizer for LegacyAmpersand {
    fn normalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match chars.peek() {
                Some(&code) if c == '&' && LEGACY_CODES.contains(code) => {
                    out.push(SECTION_SIGN);
                    out.push(code.to_ascii_lowercase());
                    chars.next();
                }
                _ => out.push(c),
            }
        }

        out
    }
}

/// Leaves text unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl MarkupNormalizer for Passthrough {
    fn normalize(&self, text: &str) -> String {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_codes_translated() {
        assert_eq!(LegacyAmpersand.normalize("&b&lSide"), "\u{a7}b\u{a7}lSide");
        assert_eq!(LegacyAmpersand.normalize("&AUpper"), "\u{a7}aUpper");
    }

    #[test]
    fn test_plain_ampersand_kept() {
        assert_eq!(LegacyAmpersand.normalize("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(LegacyAmpersand.normalize("end&"), "end&");
        assert_eq!(LegacyAmpersand.normalize("&&a"), "&\u{a7}a");
    }

    #[test]
    fn test_normalize_all_keeps_order() {
        let lines = vec!["&1one".to_owned(), "two".to_owned()];
        assert_eq!(Passthrough.normalize_all(&lines), lines);
        assert_eq!(LegacyAmpersand.normalize_all(&lines)[0], "\u{a7}1one");
    }
}
