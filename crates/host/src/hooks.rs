//! Composition root: everything the plugin contributes to a host, registered in
//! one place and in a fixed order.

use std::sync::Arc;

use crate::auth::Capability;
use crate::forward::Forwarder;
use crate::plugin::Plugin;
use crate::shortcode::{Attributes, ShortcodeHandler};
use arc_embed::PageStyles;

pub const SHORTCODE_TAG: &str = "arc_crusade";
pub const SETTINGS_SLUG: &str = "arc-crusade-settings";
pub const REST_NAMESPACE: &str = "arc-crusade/v1";
pub const REST_ROUTE: &str = "/submit-manuscript";

pub type PageRenderer = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct OptionsPage {
    pub slug: &'static str,
    /// Document title of the page
    pub page_title: &'static str,
    pub capability: Capability,
    pub render: PageRenderer,
}

#[derive(Clone)]
pub struct RestRoute {
    pub namespace: &'static str,
    pub route: &'static str,
    pub capability: Capability,
    pub forwarder: Arc<Forwarder>,
}

impl RestRoute {
    /// Full request path, e.g. `/wp-json/arc-crusade/v1/submit-manuscript`
    pub fn path(&self) -> String {
        format!("/wp-json/{}{}", self.namespace, self.route)
    }
}

/// A host the plugin can attach to.
pub trait Registrar {
    fn add_shortcode(&mut self, tag: &'static str, handler: ShortcodeHandler);
    fn add_options_page(&mut self, page: OptionsPage);
    fn add_rest_route(&mut self, route: RestRoute);
}

/// Register the shortcode, then the settings page, then the forwarding route
/// when forwarding is configured.
pub fn register(host: &mut impl Registrar, plugin: &Arc<Plugin>) {
    let shortcode_plugin = Arc::clone(plugin);
    host.add_shortcode(SHORTCODE_TAG, Arc::new(move |attrs: &Attributes, page: &mut PageStyles| shortcode_plugin.render_shortcode(attrs, page)));

    let page_plugin = Arc::clone(plugin);
    host.add_options_page(OptionsPage {
        slug: SETTINGS_SLUG,
        page_title: "Arc Crusade Settings",
        capability: Capability::ManageOptions,
        render: Arc::new(move || page_plugin.settings_page()),
    });

    if let Some(forwarder) = plugin.forwarder() {
        host.add_rest_route(RestRoute {
            namespace: REST_NAMESPACE,
            route: REST_ROUTE,
            capability: Capability::EditPosts,
            forwarder: Arc::clone(forwarder),
        });
    }
    debug!("registered [{}] and settings page {}", SHORTCODE_TAG, SETTINGS_SLUG);
}


#[cfg(test)]
mod tests {
    use super::*;
    use arc_embed::Renderer;

    #[derive(Default)]
    struct RecordingRegistrar {
        calls: Vec<String>,
        shortcode: Option<ShortcodeHandler>,
        page: Option<OptionsPage>,
    }

    impl Registrar for RecordingRegistrar {
        fn add_shortcode(&mut self, tag: &'static str, handler: ShortcodeHandler) {
            self.calls.push(format!("shortcode {tag}"));
            self.shortcode = Some(handler);
        }
        fn add_options_page(&mut self, page: OptionsPage) {
            self.calls.push(format!("options {} {} {:?}", page.slug, page.capability, page.page_title));
            self.page = Some(page);
        }
        fn add_rest_route(&mut self, route: RestRoute) {
            self.calls.push(format!("rest {} {}", route.path(), route.capability));
        }
    }

    fn forwarder() -> Arc<Forwarder> {
        let url = url::Url::parse("http://127.0.0.1:9/api/process").unwrap();
        Arc::new(Forwarder::new(url, std::time::Duration::from_secs(1)).unwrap())
    }

    #[test]
    fn registration_order() {
        let plugin = Arc::new(Plugin::new(Renderer::default(), Some(forwarder())));
        let mut host = RecordingRegistrar::default();
        register(&mut host, &plugin);
        assert_eq!(host.calls, vec![
            "shortcode arc_crusade",
            "options arc-crusade-settings manage_options \"Arc Crusade Settings\"",
            "rest /wp-json/arc-crusade/v1/submit-manuscript edit_posts",
        ]);
    }

    #[test]
    fn no_route_without_forwarder() {
        let plugin = Arc::new(Plugin::new(Renderer::default(), None));
        let mut host = RecordingRegistrar::default();
        register(&mut host, &plugin);
        assert_eq!(host.calls.len(), 2);
    }

    #[test]
    fn registered_callbacks_render() {
        let plugin = Arc::new(Plugin::new(Renderer::default(), None));
        let mut host = RecordingRegistrar::default();
        register(&mut host, &plugin);

        let handler = host.shortcode.unwrap();
        let mut page = PageStyles::new();
        let html = handler(&Attributes::default(), &mut page).unwrap();
        assert!(html.contains("height=\"750\""));
        assert!(page.emitted());

        let settings = (host.page.unwrap().render)();
        assert!(settings.contains("[arc_crusade]"));
    }
}
