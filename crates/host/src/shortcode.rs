//! Shortcode markers in page content: `[tag name="value" ...]`.
//!
//! Attribute syntax follows the host platform: double-quoted, single-quoted or
//! bare values, and case-insensitive names. Bare positional words are skipped.
//! `[[tag]]` is an escape for the literal text `[tag]`. Only self-closing
//! shortcodes are recognised; a `[/tag]` closer is left in the text.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_embed::escape::escape_text;
use arc_embed::{EmbedError, PageStyles};
use runtime::utils::parse::{take_char, take_while};

pub type ShortcodeHandler = Arc<dyn Fn(&Attributes, &mut PageStyles) -> Result<String, EmbedError> + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    named: Vec<(String, String)>,
}

impl Attributes {
    /// Later duplicates win
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.named.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

pub fn parse_attributes(text: &str) -> Attributes {
    let mut attrs = Attributes::default();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let (name, after_name) = take_while(rest, is_name_char);
        if !name.is_empty() {
            if let (Some('='), value_text) = take_char(after_name.trim_start()) {
                let (value, after_value) = take_value(value_text.trim_start());
                attrs.named.push((name.to_lowercase(), value.to_owned()));
                rest = after_value.trim_start();
                continue;
            }
        }
        // Bare positional values carry nothing the embed uses
        let (_, after_value) = take_value(rest);
        rest = after_value.trim_start();
    }
    attrs
}

/// A quoted value up to its closing quote (or the end), otherwise a bare word
fn take_value(input: &str) -> (&str, &str) {
    match take_char(input) {
        (Some(quote @ ('"' | '\'')), inner) => match inner.find(quote) {
            Some(end) => (&inner[..end], &inner[end + 1..]),
            None => (inner, ""),
        },
        _ => take_while(input, |c| !c.is_whitespace()),
    }
}

/// Escaped diagnostic shown in place of an embed that failed to render
pub fn diagnostic(tag: &str, error: &dyn std::error::Error) -> String {
    format!(
        "<div class=\"shortcode-error\" role=\"alert\">[{}] could not be displayed: {}</div>\n",
        escape_text(tag),
        escape_text(&error.to_string()),
    )
}

struct Found<'a> {
    tag: &'a str,
    attrs: &'a str,
    /// Length of the marker including both brackets
    len: usize,
}

/// Registered shortcode handlers, keyed by tag.
#[derive(Clone, Default)]
pub struct Shortcodes {
    handlers: BTreeMap<&'static str, ShortcodeHandler>,
}

impl Shortcodes {
    /// Returns the handler previously registered under `tag`, if any
    pub fn add(&mut self, tag: &'static str, handler: ShortcodeHandler) -> Option<ShortcodeHandler> {
        self.handlers.insert(tag, handler)
    }
    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Match a registered shortcode starting right after an opening `[`
    fn find_at<'a>(&self, input: &'a str) -> Option<Found<'a>> {
        let (tag, after_tag) = take_while(input, is_name_char);
        if !self.contains(tag) {
            return None;
        }
        match take_char(after_tag).0 {
            Some(c) if c.is_whitespace() || c == '/' || c == ']' => (),
            _ => return None,
        }
        let close = after_tag.find(']')?;
        let attrs = after_tag[..close].trim_end();
        let attrs = attrs.strip_suffix('/').unwrap_or(attrs);
        Some(Found {
            tag,
            attrs,
            len: 1 + tag.len() + close + 1,
        })
    }

    /// Replace every registered shortcode in `content` with its rendered markup.
    /// Shared page resources (the embed stylesheet) are written at most once.
    pub fn expand(&self, content: &str) -> String {
        let mut page = PageStyles::new();
        let mut out = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find('[') {
            out.push_str(&rest[..start]);
            rest = &rest[start..];

            // [[tag]] is written out as [tag]
            if let Some(found) = rest.strip_prefix("[[").and_then(|r| self.find_at(r)) {
                let inner_end = 1 + found.len;
                if rest[inner_end..].starts_with(']') {
                    out.push_str(&rest[1..inner_end]);
                    rest = &rest[inner_end + 1..];
                    continue;
                }
            }

            match self.find_at(&rest[1..]) {
                Some(found) => {
                    let attrs = parse_attributes(found.attrs);
                    let handler = &self.handlers[found.tag];
                    match handler(&attrs, &mut page) {
                        Ok(html) => out.push_str(&html),
                        Err(e) => {
                            warn!("shortcode [{}] failed: {}", found.tag, e);
                            out.push_str(&diagnostic(found.tag, &e));
                        },
                    }
                    rest = &rest[found.len..];
                },
                None => {
                    out.push('[');
                    rest = &rest[1..];
                },
            }
        }
        out.push_str(rest);
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect()
    }

    #[test]
    fn attribute_forms() {
        let parsed = parse_attributes(r#" height="900" width='80%' title=Plain SUBTITLE = "Spaced out" "#);
        assert_eq!(parsed.named, attrs(&[
            ("height", "900"),
            ("width", "80%"),
            ("title", "Plain"),
            ("subtitle", "Spaced out"),
        ]));
    }

    #[test]
    fn positional_values_are_skipped() {
        let parsed = parse_attributes(r#"fullscreen "quoted word" height="1""#);
        assert_eq!(parsed.named, attrs(&[("height", "1")]));
    }

    #[test]
    fn unterminated_quote_takes_the_rest() {
        let parsed = parse_attributes(r#"title="never closed"#);
        assert_eq!(parsed.get("title"), Some("never closed"));
    }

    #[test]
    fn duplicate_names_last_wins() {
        let parsed = parse_attributes("height=1 height=2");
        assert_eq!(parsed.get("height"), Some("2"));
    }

    fn echo_codes() -> Shortcodes {
        let mut codes = Shortcodes::default();
        codes.add("echo", Arc::new(|attrs: &Attributes, page: &mut PageStyles| {
            if attrs.get("fail").is_some() {
                return Err(arc_embed::EmbedParams::default().height("x").resolve().unwrap_err());
            }
            let style = if page.take().is_some() { "S" } else { "" };
            Ok(format!("<{}{}>", style, attrs.get("v").unwrap_or("-")))
        }));
        codes
    }

    #[test]
    fn expands_registered_tags_only() {
        let codes = echo_codes();
        assert_eq!(codes.expand("a [echo v=1] b [other v=2] c"), "a <S1> b [other v=2] c");
        assert_eq!(codes.expand("[echo][echo v=3/][echo /]"), "<S-><3><->");
    }

    #[test]
    fn tag_must_end_at_a_boundary() {
        let codes = echo_codes();
        assert_eq!(codes.expand("[echoes] [echo"), "[echoes] [echo");
    }

    #[test]
    fn double_brackets_escape() {
        let codes = echo_codes();
        assert_eq!(codes.expand("show [[echo v=1]] then [echo]"), "show [echo v=1] then <S->");
        assert_eq!(codes.expand("[[echo]"), "[<S->");
    }

    #[test]
    fn closing_tag_is_left_alone() {
        let codes = echo_codes();
        assert_eq!(codes.expand("[echo]inner[/echo]"), "<S->inner[/echo]");
    }

    #[test]
    fn failures_become_diagnostics() {
        let codes = echo_codes();
        let out = codes.expand("x [echo fail=1] y");
        assert!(out.starts_with("x <div class=\"shortcode-error\""));
        assert!(out.contains("[echo] could not be displayed"));
        assert!(out.ends_with("</div>\n y"));
    }
}
