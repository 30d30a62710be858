
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

use crate::error::EmbedError;

pub const DEFAULT_HEIGHT: u32 = 850;
pub const DEFAULT_WIDTH: &str = "100%";
pub const DEFAULT_TITLE: &str = "Arc Crusade AI";
pub const DEFAULT_SUBTITLE: &str = "Professional Manuscript Analysis Tool";

/// Vertical space taken by the header and footer around the iframe
pub const CHROME_HEIGHT: u32 = 100;

/// Embed parameters as they arrive from a call site; every field is optional text.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedParams {
    pub height: Option<String>,
    pub width: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

impl EmbedParams {
    /// Collect known keys from `name=value` pairs, ignoring anything else.
    /// Later duplicates win.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
        where I: IntoIterator<Item = (&'a str, &'a str)>
    {
        let mut params = EmbedParams::default();
        for (name, value) in pairs {
            let slot = match name {
                "height" => &mut params.height,
                "width" => &mut params.width,
                "title" => &mut params.title,
                "subtitle" => &mut params.subtitle,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    pub fn height(mut self, value: impl Into<String>) -> Self {
        self.height = Some(value.into());
        self
    }
    pub fn width(mut self, value: impl Into<String>) -> Self {
        self.width = Some(value.into());
        self
    }
    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }
    pub fn subtitle(mut self, value: impl Into<String>) -> Self {
        self.subtitle = Some(value.into());
        self
    }

    /// Merge over the defaults and coerce `height`.
    pub fn resolve(&self) -> Result<EmbedConfig, EmbedError> {
        let height = match non_empty(&self.height) {
            Some(text) => parse_height(text)?,
            None => DEFAULT_HEIGHT,
        };
        Ok(EmbedConfig {
            height,
            width: non_empty(&self.width).unwrap_or(DEFAULT_WIDTH).into(),
            title: non_empty(&self.title).unwrap_or(DEFAULT_TITLE).into(),
            subtitle: non_empty(&self.subtitle).unwrap_or(DEFAULT_SUBTITLE).into(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Accepts `900`, ` 900 ` and `900px`; negatives, fractions and overflow are rejected.
pub fn parse_height(text: &str) -> Result<u32, EmbedError> {
    let trimmed = text.trim();
    let digits = trimmed.strip_suffix("px").unwrap_or(trimmed);
    digits.parse::<u32>().map_err(|source| EmbedError::InvalidConfig {
        field: "height",
        value: text.into(),
        source,
    })
}

/// A fully resolved embed configuration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedConfig {
    pub height: u32,
    pub width: String,
    pub title: String,
    pub subtitle: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        EmbedConfig {
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH.into(),
            title: DEFAULT_TITLE.into(),
            subtitle: DEFAULT_SUBTITLE.into(),
        }
    }
}

impl EmbedConfig {
    pub fn iframe_height(&self) -> u32 {
        self.height.saturating_sub(CHROME_HEIGHT)
    }
}
