//! Escaping for the two HTML contexts the embed writes into.

/// Escape for a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    escape_with(text, |c| match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        // ends a double-quoted value
        '"' => Some("&quot;"),
        // ends a single-quoted value, in case a caller re-quotes the output
        '\'' => Some("&#39;"),
        // starts an entity reference
        '&' => Some("&amp;"),
        '\0' => Some("&#65533;"),
        _ => None,
    })
}

/// Escape for a text node. Quotes are encoded too, so the result survives
/// being moved into a quoted attribute later.
pub fn escape_text(text: &str) -> String {
    escape_with(text, |c| match c {
        // starts a tag
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '&' => Some("&amp;"),
        '\0' => Some("&#65533;"),
        _ => None,
    })
}

fn escape_with(text: &str, replace: impl Fn(char) -> Option<&'static str>) -> String {
    let mut out = String::with_capacity(usize::max(4, text.len()));
    for c in text.chars() {
        match replace(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_escapes_quotes() {
        assert_eq!(escape_attr(r#"100%" onload="x"#), "100%&quot; onload=&quot;x");
        assert_eq!(escape_attr("it's"), "it&#39;s");
        assert_eq!(escape_attr("<a&b>"), "&lt;a&amp;b&gt;");
    }

    #[test]
    fn text_escapes_markup() {
        assert_eq!(escape_text("<script>alert(1)</script>"), "&lt;script&gt;alert(1)&lt;/script&gt;");
        assert_eq!(escape_text("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
        assert_eq!(escape_text("it's"), "it's");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape_text("Arc Crusade AI 🏰"), "Arc Crusade AI 🏰");
        assert_eq!(escape_attr("100%"), "100%");
    }

    #[test]
    fn nul_is_replaced() {
        assert_eq!(escape_text("a\0b"), "a&#65533;b");
        assert_eq!(escape_attr("a\0b"), "a&#65533;b");
    }
}
