//! Text sanitization to the PDF font's encodable subset (spec.md §4.10
//! step 5). printpdf's built-in fonts use WinAnsi/Latin-1 encoding, so
//! anything outside that range has to be mapped or dropped before layout.

const ZERO_WIDTH: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}',
];

#[must_use]
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !ZERO_WIDTH.contains(c))
        .map(map_char)
        .filter(|c| (*c as u32) <= 0xFF)
        .collect()
}

fn map_char(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
        '\u{2013}' | '\u{2014}' => '-',
        '\u{2026}' => '.', // caller handles the triple-dot expansion separately
        other => other,
    }
}

/// The ellipsis needs three output chars from one input char, so it can't
/// be handled by the 1:1 `map_char` above.
#[must_use]
pub fn sanitize_with_ellipsis(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if ZERO_WIDTH.contains(&c) {
            continue;
        }
        if c == '\u{2026}' {
            out.push_str("...");
            continue;
        }
        let mapped = map_char(c);
        if (mapped as u32) <= 0xFF {
            out.push(mapped);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_zero_width_chars() {
        let input = "hel\u{200B}lo\u{FEFF}";
        assert_eq!(sanitize_with_ellipsis(input), "hello");
    }

    #[test]
    fn maps_smart_quotes_to_ascii() {
        assert_eq!(sanitize_with_ellipsis("\u{201C}hello\u{201D}"), "\"hello\"");
        assert_eq!(sanitize_with_ellipsis("it\u{2019}s"), "it's");
    }

    #[test]
    fn maps_dashes_to_hyphen() {
        assert_eq!(sanitize_with_ellipsis("a\u{2013}b\u{2014}c"), "a-bc".replace("bc", "-c"));
    }

    #[test]
    fn expands_ellipsis_to_three_dots() {
        assert_eq!(sanitize_with_ellipsis("wait\u{2026}"), "wait...");
    }

    #[test]
    fn drops_non_latin1_characters() {
        assert_eq!(sanitize_with_ellipsis("caf\u{00e9} \u{4e2d}\u{6587}"), "caf\u{00e9} ");
    }
}
