//! ASCII transliteration.
//!
//! Corpus files and live text arrive in mixed encodings. Everything is folded
//! to plain ASCII before tokenization: compatibility decomposition (NFKD)
//! splits accented letters into a base letter plus combining marks, the marks
//! are dropped, a few typographic characters are mapped to their ASCII
//! spelling and whatever is left outside ASCII is removed.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold text to plain ASCII.
///
/// ```
/// use sentivote::analysis::transliterate::transliterate;
///
/// assert_eq!(transliterate("café “déjà vu”"), "cafe \"deja vu\"");
/// ```
pub fn transliterate(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let mut folded = String::with_capacity(text.len());
    for c in text.nfkd() {
        if c.is_ascii() {
            folded.push(c);
        } else if is_combining_mark(c) {
            continue;
        } else if let Some(replacement) = typographic(c) {
            folded.push_str(replacement);
        }
    }
    folded
}

/// Decode raw bytes as UTF-8, falling back to Latin-1 when the bytes are not
/// valid UTF-8.
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn typographic(c: char) -> Option<&'static str> {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => Some("'"),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' | '\u{00AB}' | '\u{00BB}' => Some("\""),
        '\u{2010}'..='\u{2015}' | '\u{2212}' => Some("-"),
        '\u{2026}' => Some("..."),
        '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' => Some(" "),
        '\u{00DF}' => Some("ss"),
        '\u{00E6}' => Some("ae"),
        '\u{00C6}' => Some("AE"),
        '\u{0153}' => Some("oe"),
        '\u{0152}' => Some("OE"),
        '\u{00F8}' => Some("o"),
        '\u{00D8}' => Some("O"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(transliterate("plain text"), "plain text");
    }

    #[test]
    fn test_accents_are_stripped() {
        assert_eq!(transliterate("Amélie naïve résumé"), "Amelie naive resume");
    }

    #[test]
    fn test_typographic_marks() {
        assert_eq!(transliterate("it’s great — really…"), "it's great - really...");
    }

    #[test]
    fn test_unmappable_characters_removed() {
        assert_eq!(transliterate("good 👍"), "good ");
    }

    #[test]
    fn test_latin1_fallback() {
        // "café" encoded as Latin-1
        let bytes = [0x63, 0x61, 0x66, 0xE9];
        assert_eq!(decode_bytes(&bytes), "café");
        assert_eq!(decode_bytes("café".as_bytes()), "café");
    }
}
