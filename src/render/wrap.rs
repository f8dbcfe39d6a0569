/// Word-wrap `text` into lines no wider than `max_px` under `measure`.
///
/// Words stay whole; only a word that is wider than the full line width on
/// its own is split at character boundaries. Explicit newlines are kept and
/// blank source lines survive as empty strings so vertical spacing matches
/// the input. Measuring is a closure so the same algorithm serves both the
/// outline and the bitmap face.
pub fn wrap_text<F>(text: &str, max_px: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if measure(word) > max_px {
                // Over-long word: flush the current line, then split the
                // word greedily at character boundaries
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = split_long_word(word, max_px, &measure, &mut lines);
                continue;
            }

            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if !current.is_empty() && measure(&candidate) > max_px {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Break a single over-long word into full lines, returning the remainder
/// that still fits (which continues the current line).
fn split_long_word<F>(word: &str, max_px: u32, measure: &F, lines: &mut Vec<String>) -> String
where
    F: Fn(&str) -> u32,
{
    let mut piece = String::new();
    for ch in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(ch);
        if !piece.is_empty() && measure(&candidate) > max_px {
            lines.push(std::mem::take(&mut piece));
            piece.push(ch);
        } else {
            piece = candidate;
        }
    }
    piece
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10 px per char keeps the arithmetic readable
    fn by_char(s: &str) -> u32 {
        s.chars().count() as u32 * 10
    }

    #[test]
    fn test_short_text_single_line() {
        let lines = wrap_text("hello world", 200, by_char);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn test_wraps_at_word_boundary() {
        // "aaaa bbbb cccc" at 90px: "aaaa bbbb" is 90, adding " cccc" overflows
        let lines = wrap_text("aaaa bbbb cccc", 90, by_char);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_never_splits_fitting_word() {
        let lines = wrap_text("one two three four five", 50, by_char);
        assert_eq!(lines, vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn test_long_word_splits_at_chars() {
        let lines = wrap_text("abcdefghij", 30, by_char);
        assert_eq!(lines, vec!["abc", "def", "ghi", "j"]);
    }

    #[test]
    fn test_long_word_remainder_continues_line() {
        // The tail of the split word shares its line with the next word
        let lines = wrap_text("abcdefg hi", 60, by_char);
        assert_eq!(lines, vec!["abcdef", "g hi"]);
    }

    #[test]
    fn test_blank_lines_preserved() {
        let lines = wrap_text("first\n\nsecond", 200, by_char);
        assert_eq!(lines, vec!["first", "", "second"]);
    }

    #[test]
    fn test_no_line_exceeds_budget() {
        let text = "the quick brown fox jumps over the lazy dog again and again";
        for max in [30, 60, 90, 150] {
            for line in wrap_text(text, max, by_char) {
                assert!(by_char(&line) <= max, "{:?} exceeds {}", line, max);
            }
        }
    }

    #[test]
    fn test_wide_chars_count_double() {
        // Simulates CJK cells: non-ascii chars measure twice as wide
        let wide = |s: &str| -> u32 {
            s.chars()
                .map(|c| if c.is_ascii() { 10 } else { 20 })
                .sum()
        };
        let lines = wrap_text("日本語のテキスト", 60, wide);
        for line in &lines {
            assert!(wide(line) <= 60);
        }
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_text_yields_no_lines() {
        assert!(wrap_text("", 100, by_char).is_empty());
    }
}
