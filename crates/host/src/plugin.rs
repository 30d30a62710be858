use std::sync::Arc;

use arc_embed::{EmbedError, EmbedParams, PageStyles, Renderer};

use crate::config::{Config, ConfigError};
use crate::forward::{ForwardError, Forwarder};
use crate::shortcode::Attributes;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Invalid embed target")]
    Target(#[source] EmbedError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to set up forwarding")]
    Forward(#[source] ForwardError),
}

/// The plugin's behaviour, independent of any host.
#[derive(Debug)]
pub struct Plugin {
    renderer: Renderer,
    forwarder: Option<Arc<Forwarder>>,
}

impl Plugin {
    pub fn new(renderer: Renderer, forwarder: Option<Arc<Forwarder>>) -> Self {
        Plugin { renderer, forwarder }
    }

    pub fn from_config(config: &Config) -> Result<Self, PluginError> {
        let renderer = Renderer::new(config.target_url.clone()).map_err(PluginError::Target)?;
        let forwarder = match config.forward_url()? {
            Some(url) => {
                info!("forwarding submissions to {}", url);
                let forwarder = Forwarder::new(url, config.forward_timeout()).map_err(PluginError::Forward)?;
                Some(Arc::new(forwarder))
            },
            None => {
                info!("forwarding disabled");
                None
            },
        };
        Ok(Plugin::new(renderer, forwarder))
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
    pub fn forwarder(&self) -> Option<&Arc<Forwarder>> {
        self.forwarder.as_ref()
    }

    pub fn render_shortcode(&self, attrs: &Attributes, page: &mut PageStyles) -> Result<String, EmbedError> {
        let params = EmbedParams::from_pairs(attrs.iter());
        self.renderer.render_in_page(&params, page)
    }

    pub fn settings_page(&self) -> String {
        crate::admin::settings_page(self)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcode::parse_attributes;

    #[test]
    fn shortcode_attributes_reach_the_renderer() {
        let plugin = Plugin::new(Renderer::default(), None);
        let mut page = PageStyles::new();
        let html = plugin.render_shortcode(&parse_attributes(r#"height="900" TITLE="Mine" colour=crimson"#), &mut page).unwrap();
        assert!(html.contains("height=\"800\""));
        assert!(html.contains("Mine"));
        assert!(!html.contains("crimson"));
    }

    #[test]
    fn from_config() {
        let mut config = Config::default();
        config.target_url = "http://localhost:8501/".parse().unwrap();
        let plugin = Plugin::from_config(&config).unwrap();
        assert_eq!(plugin.renderer().target().as_str(), "http://localhost:8501/");
        assert_eq!(plugin.forwarder().unwrap().url().as_str(), "http://localhost:8501/api/process");

        config.forward = false;
        assert!(Plugin::from_config(&config).unwrap().forwarder().is_none());

        config.target_url = "ftp://files.example/".parse().unwrap();
        assert!(matches!(Plugin::from_config(&config), Err(PluginError::Target(_))));
    }
}
