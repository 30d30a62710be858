//! Renders the Arc Crusade embed block: a branded header, an iframe pointing at the
//! hosted analysis app, a footer, and a scoped responsive stylesheet.
//!
//! Rendering is pure. It never logs and never touches the network.

pub mod config;
pub mod error;
pub mod escape;
pub mod render;

pub use config::{EmbedConfig, EmbedParams};
pub use error::EmbedError;
pub use render::{PageStyles, Renderer};

/// Render with the default deployment target.
pub fn render(params: &EmbedParams) -> Result<String, EmbedError> {
    Renderer::default().render(params)
}
