//! The settings page: shortcode usage, a copyable HTML snippet, and where the
//! embed and forwarding point.

use std::fmt::Write;

use arc_embed::config::{DEFAULT_HEIGHT, DEFAULT_SUBTITLE, DEFAULT_TITLE, DEFAULT_WIDTH};
use arc_embed::escape::{escape_attr, escape_text};
use arc_embed::render::{style_block, ICON};
use arc_embed::EmbedConfig;

use crate::hooks::SHORTCODE_TAG;
use crate::plugin::Plugin;

const ADMIN_STYLES: &str = "\
.arc-crusade-wrapper code {
    background: #f1f1f1;
    padding: 4px 8px;
    border-radius: 4px;
    font-family: monospace;
    color: #d63384;
}
.arc-crusade-wrapper textarea {
    width: 100%;
    font-family: monospace;
}
";

fn usage_examples() -> [(&'static str, String); 4] {
    [
        ("Basic shortcode", format!("[{SHORTCODE_TAG}]")),
        ("Custom height", format!("[{SHORTCODE_TAG} height=\"900\"]")),
        ("Custom title", format!("[{SHORTCODE_TAG} title=\"My AI Tool\" subtitle=\"Custom Subtitle\"]")),
        ("All options", format!(
            "[{SHORTCODE_TAG} height=\"{DEFAULT_HEIGHT}\" width=\"{DEFAULT_WIDTH}\" title=\"{DEFAULT_TITLE}\" subtitle=\"{DEFAULT_SUBTITLE}\"]"
        )),
    ]
}

/// Body of the settings page; the host supplies the surrounding document.
pub fn settings_page(plugin: &Plugin) -> String {
    let target = plugin.renderer().target().as_str();
    // Self-contained, so it can be pasted into a page without the shortcode
    let mut snippet = style_block();
    snippet.push_str(&plugin.renderer().render_config(&EmbedConfig::default()));

    let mut out = String::with_capacity(8192);
    // String as fmt::Write cannot fail
    let _ = write!(out, "<style>{ADMIN_STYLES}</style>
<div class=\"wrap arc-crusade-wrapper\">
<h1>{ICON} Arc Crusade AI Settings</h1>
<div class=\"card\">
<h2>Shortcode usage</h2>
<p>Add Arc Crusade AI to a page with one of these shortcodes:</p>
");
    for (label, example) in usage_examples() {
        let _ = write!(out, "<h3>{}:</h3>\n<code>{}</code>\n", label, escape_text(&example));
    }

    let _ = write!(out, "</div>
<div class=\"card\">
<h2>Direct HTML (for custom HTML blocks)</h2>
<textarea rows=\"10\" cols=\"80\" readonly onclick=\"this.select()\">{}</textarea>
</div>
<div class=\"card\">
<h2>App status</h2>
<p><strong>App URL:</strong> <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></p>
",
        escape_text(&snippet),
        escape_attr(target),
        escape_text(target),
    );

    match plugin.forwarder() {
        Some(forwarder) => {
            let _ = write!(out, "<p><strong>Forwarding:</strong> enabled, to {}</p>\n", escape_text(forwarder.url().as_str()));
        },
        None => out.push_str("<p><strong>Forwarding:</strong> disabled</p>\n"),
    }
    out.push_str("</div>\n</div>\n");
    out
}
