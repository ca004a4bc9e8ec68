//! Offset helpers.
//!
//! Engines report character offsets; spans carry UTF-8 byte offsets.

/// Convert a `[start, end)` character range into a byte range of `source`,
/// trimmed of surrounding whitespace.
///
/// Returns `None` when the range is empty, out of bounds, or covers only
/// whitespace.
pub fn char_span_to_bytes(source: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    if start >= end {
        return None;
    }

    let mut boundaries = source
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(source.len()));

    let byte_start = boundaries.nth(start)?;
    let byte_end = boundaries.nth(end - start - 1)?;

    trim_range(source, byte_start, byte_end)
}

/// Shrink a byte range so it excludes leading and trailing whitespace
pub fn trim_range(source: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = source.get(start..end)?;
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();

    if leading + trailing >= slice.len() {
        return None;
    }

    Some((start + leading, end - trailing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        let text = "Emmanuel Macron s'est rendu";
        assert_eq!(char_span_to_bytes(text, 0, 15), Some((0, 15)));
    }

    #[test]
    fn test_multibyte() {
        let text = "Réunion à Genève.";
        // "Genève" is chars 10..16
        let (start, end) = char_span_to_bytes(text, 10, 16).unwrap();
        assert_eq!(&text[start..end], "Genève");
    }

    #[test]
    fn test_range_to_end_of_text() {
        let text = "à Bruxelles";
        let (start, end) = char_span_to_bytes(text, 2, 11).unwrap();
        assert_eq!(&text[start..end], "Bruxelles");
    }

    #[test]
    fn test_trims_whitespace() {
        let text = "à  Bruxelles ";
        let (start, end) = char_span_to_bytes(text, 1, 13).unwrap();
        assert_eq!(&text[start..end], "Bruxelles");
    }

    #[test]
    fn test_invalid_ranges() {
        let text = "Paris";
        assert_eq!(char_span_to_bytes(text, 3, 3), None);
        assert_eq!(char_span_to_bytes(text, 4, 2), None);
        assert_eq!(char_span_to_bytes(text, 0, 6), None);
        assert_eq!(char_span_to_bytes("a   b", 1, 4), None);
    }
}
