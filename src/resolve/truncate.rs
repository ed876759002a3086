//! Depth truncation of extracted text.
//!
//! A single left-to-right scan tracks brace nesting. Blocks opening past the
//! requested depth are collapsed to one indented `...` marker; nested
//! over-limit opens inside a skipped block are tracked by a separate skip
//! counter so only the first excess boundary produces output. Braces that
//! close back to the limit are kept, so the emitted braces stay balanced.

use std::borrow::Cow;

const INDENT_UNIT: &str = "    ";

/// Collapses brace blocks nested deeper than `max_depth`. `None` disables
/// truncation. When nothing was collapsed the original text is returned
/// borrowed, so callers can use `Cow::Borrowed` as a "was untouched" signal.
pub fn truncate_by_depth(text: &str, max_depth: Option<u32>) -> Cow<'_, str> {
    let Some(limit) = max_depth else {
        return Cow::Borrowed(text);
    };
    let mut truncated = String::with_capacity(text.len());
    let mut current_depth: u32 = 0;
    let mut skip_depth: u32 = 0;
    let mut collapsed = false;
    for ch in text.chars() {
        match ch {
            '{' => {
                if skip_depth == 0 {
                    truncated.push(ch);
                }
                current_depth += 1;
                if current_depth > limit {
                    skip_depth += 1;
                    if skip_depth == 1 {
                        collapsed = true;
                        append_ellipsis(&mut truncated, current_depth);
                    }
                }
            }
            '}' => {
                if current_depth > limit && skip_depth > 0 {
                    skip_depth -= 1;
                }
                current_depth = current_depth.saturating_sub(1);
                if skip_depth == 0 {
                    truncated.push(ch);
                }
            }
            _ => {
                if skip_depth == 0 {
                    truncated.push(ch);
                }
            }
        }
    }
    if collapsed {
        Cow::Owned(truncated)
    } else {
        Cow::Borrowed(text)
    }
}

fn append_ellipsis(buffer: &mut String, depth: u32) {
    if !buffer.ends_with('\n') {
        buffer.push('\n');
    }
    for _ in 0..depth {
        buffer.push_str(INDENT_UNIT);
    }
    buffer.push_str("...");
    buffer.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = "class A { void m() { if (x) { y(); } } }";

    #[test]
    fn test_no_limit_passes_through() {
        assert!(matches!(
            truncate_by_depth(NESTED, None),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_untruncated_when_limit_covers_nesting() {
        // Depth equal to the actual maximum nesting leaves the text alone.
        let result = truncate_by_depth(NESTED, Some(3));
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, NESTED);
    }

    #[test]
    fn test_depth_one_collapses_inner_blocks() {
        let result = truncate_by_depth(NESTED, Some(1));
        assert_eq!(result, "class A { void m() {\n        ...\n} }");
    }

    #[test]
    fn test_depth_zero_collapses_everything() {
        let result = truncate_by_depth(NESTED, Some(0));
        assert_eq!(result, "class A {\n    ...\n}");
    }

    #[test]
    fn test_nested_over_limit_open_adds_no_extra_marker() {
        let text = "a { b { c { d } } e { f } }";
        let result = truncate_by_depth(text, Some(1));
        // `c { d }` is swallowed by the marker of its enclosing block; the
        // sibling block `e { f }` gets its own.
        assert_eq!(result.matches("...").count(), 2);
        assert_eq!(result, "a { b {\n        ...\n} e {\n        ...\n} }");
    }

    #[test]
    fn test_braces_stay_balanced() {
        for depth in 0..4 {
            let result = truncate_by_depth(NESTED, Some(depth));
            let opens = result.matches('{').count();
            let closes = result.matches('}').count();
            assert_eq!(opens, closes, "depth {}", depth);
        }
    }

    #[test]
    fn test_collapse_of_block_on_own_line() {
        let text = "a {\n{ x }\n}";
        let result = truncate_by_depth(text, Some(1));
        assert_eq!(result, "a {\n{\n        ...\n}\n}");
    }

    #[test]
    fn test_collapse_at_text_start() {
        let result = truncate_by_depth("{ x }", Some(0));
        assert_eq!(result, "{\n    ...\n}");
    }
}
