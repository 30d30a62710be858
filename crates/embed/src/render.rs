
use std::fmt::Write;

use crate::config::{EmbedConfig, EmbedParams};
use crate::error::EmbedError;
use crate::escape::{escape_attr, escape_text};

pub const DEFAULT_TARGET_URL: &str = "https://arc-crusade.streamlit.app/";

pub const ICON: &str = "🏰";
pub const NOTICE: &str = "🔒 Private Access - Authorized Users Only";
pub const FOOTER: &str = "© 2025 Arc Crusade AI - Professional Manuscript Analysis";

/// Element id of the shared style block, so a page can tell whether it is present
pub const STYLE_ID: &str = "arc-crusade-embed-styles";

/// Every rule is scoped under `.arc-crusade-embed`. Identical for every embed.
pub const STYLESHEET: &str = "\
.arc-crusade-embed {
    margin: 20px auto;
    max-width: 1200px;
    border-radius: 15px;
    overflow: hidden;
    box-shadow: 0 8px 25px rgba(0,0,0,0.15);
    font-family: -apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, sans-serif;
}
.arc-crusade-embed .arc-crusade-header {
    background: linear-gradient(135deg, #2E86AB 0%, #A23B72 100%);
    color: white;
    padding: 25px 20px;
    text-align: center;
}
.arc-crusade-embed .arc-crusade-title {
    margin: 0 0 8px 0;
    font-size: 2.2em;
    font-weight: 700;
    text-shadow: 2px 2px 4px rgba(0,0,0,0.3);
}
.arc-crusade-embed .arc-crusade-subtitle {
    margin: 0 0 5px 0;
    font-size: 1.1em;
    opacity: 0.95;
}
.arc-crusade-embed .arc-crusade-notice {
    opacity: 0.8;
    font-size: 0.9em;
}
.arc-crusade-embed iframe {
    border: none;
    display: block;
    background: #f8f9fa;
}
.arc-crusade-embed .arc-crusade-footer {
    background: #f8f9fa;
    padding: 12px 20px;
    text-align: center;
    color: #666;
    font-size: 0.85em;
    border-top: 1px solid #dee2e6;
}
.arc-crusade-embed .arc-crusade-footer p {
    margin: 0;
}
@media (max-width: 768px) {
    .arc-crusade-embed {
        height: 700px !important;
        margin: 10px auto !important;
        border-radius: 10px !important;
    }
    .arc-crusade-embed iframe {
        height: 580px !important;
    }
    .arc-crusade-embed .arc-crusade-title {
        font-size: 1.8em !important;
    }
}
@media (max-width: 480px) {
    .arc-crusade-embed {
        height: 600px !important;
    }
    .arc-crusade-embed iframe {
        height: 480px !important;
    }
    .arc-crusade-embed .arc-crusade-title {
        font-size: 1.5em !important;
    }
}
";

/// Tracks whether the shared style block has been written on the current page.
///
/// Create one per page response and pass it to every [`Renderer::render_in_page`] call.
#[derive(Debug, Default)]
pub struct PageStyles {
    emitted: bool,
}

impl PageStyles {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn emitted(&self) -> bool {
        self.emitted
    }
    /// Returns the style block the first time, nothing afterwards
    pub fn take(&mut self) -> Option<String> {
        if std::mem::replace(&mut self.emitted, true) {
            None
        } else {
            Some(style_block())
        }
    }
}

pub fn style_block() -> String {
    format!("<style id=\"{STYLE_ID}\">{STYLESHEET}</style>\n")
}

/// Renders embed blocks pointing at one fixed deployment target.
#[derive(Debug, Clone)]
pub struct Renderer {
    target: url::Url,
}

impl Default for Renderer {
    fn default() -> Self {
        let target = url::Url::parse(DEFAULT_TARGET_URL).expect("default target url is valid");
        Renderer { target }
    }
}

impl Renderer {
    pub fn new(target: url::Url) -> Result<Self, EmbedError> {
        match target.scheme() {
            "http" | "https" => Ok(Renderer { target }),
            _ => Err(EmbedError::InvalidTarget(target.into())),
        }
    }

    pub fn target(&self) -> &url::Url {
        &self.target
    }

    /// Render one self-contained embed block, style block included.
    pub fn render(&self, params: &EmbedParams) -> Result<String, EmbedError> {
        let config = params.resolve()?;
        let mut out = style_block();
        out.push_str(&self.render_config(&config));
        Ok(out)
    }

    /// Render for a page that may hold several embeds; the style block is only
    /// written for the first one. Nothing is recorded if the params are invalid.
    pub fn render_in_page(&self, params: &EmbedParams, page: &mut PageStyles) -> Result<String, EmbedError> {
        let config = params.resolve()?;
        let mut out = page.take().unwrap_or_default();
        out.push_str(&self.render_config(&config));
        Ok(out)
    }

    /// Markup for an already-resolved configuration, without the style block.
    pub fn render_config(&self, config: &EmbedConfig) -> String {
        let width = escape_attr(&config.width);
        let title_text = escape_text(&config.title);
        let title_attr = escape_attr(&config.title);
        let subtitle = escape_text(&config.subtitle);
        let src = escape_attr(self.target.as_str());

        let mut out = String::with_capacity(1024);
        // String as fmt::Write cannot fail
        let _ = write!(out,
"<div class=\"arc-crusade-embed\" style=\"width: {width}; height: {height}px;\">
<div class=\"arc-crusade-header\">
<h2 class=\"arc-crusade-title\">{ICON} {title_text}</h2>
<p class=\"arc-crusade-subtitle\">{subtitle}</p>
<small class=\"arc-crusade-notice\">{NOTICE}</small>
</div>
<iframe src=\"{src}\" width=\"100%\" height=\"{iframe_height}\" title=\"{title_attr} - Manuscript Analyzer\" loading=\"lazy\" frameborder=\"0\" scrolling=\"yes\" allow=\"fullscreen\" allowfullscreen></iframe>
<div class=\"arc-crusade-footer\">
<p>{FOOTER}</p>
</div>
</div>
",
            height = config.height,
            iframe_height = config.iframe_height(),
        );
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_styles_emit_once() {
        let mut page = PageStyles::new();
        assert!(!page.emitted());
        assert!(page.take().is_some());
        assert!(page.emitted());
        assert!(page.take().is_none());
    }

    #[test]
    fn invalid_params_do_not_consume_styles() {
        let renderer = Renderer::default();
        let mut page = PageStyles::new();
        let bad = EmbedParams::default().height("abc");
        assert!(renderer.render_in_page(&bad, &mut page).is_err());
        assert!(!page.emitted());
        let good = renderer.render_in_page(&EmbedParams::default(), &mut page).unwrap();
        assert!(good.contains(STYLE_ID));
    }

    #[test]
    fn rejects_non_http_target() {
        let target = url::Url::parse("javascript:alert(1)").unwrap();
        assert!(matches!(Renderer::new(target), Err(EmbedError::InvalidTarget(_))));
        let target = url::Url::parse("http://localhost:8501/").unwrap();
        assert_eq!(Renderer::new(target).unwrap().target().as_str(), "http://localhost:8501/");
    }

    #[test]
    fn stylesheet_has_no_markup() {
        assert!(!STYLESHEET.contains('<'));
        assert!(!STYLESHEET.contains('>'));
    }
}
