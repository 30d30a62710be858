//! The HTTP host: plugin registrations become axum routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{routing, Json, Router};

use arc_embed::config::DEFAULT_TITLE;
use arc_embed::escape::escape_text;
use arc_embed::EmbedParams;
use runtime::utils::format_error_disp;
use runtime_axum::{layers, ExtractBearer, ServerState};

use crate::auth::{AuthResult, Capability, Credentials};
use crate::config::Config;
use crate::forward::error_body;
use crate::hooks::{self, OptionsPage, Registrar, RestRoute, SHORTCODE_TAG};
use crate::plugin::Plugin;
use crate::shortcode::{diagnostic, ShortcodeHandler, Shortcodes};

pub struct HostState {
    pub plugin: Arc<Plugin>,
    pub shortcodes: Shortcodes,
    pub credentials: Credentials,
}

type AppState = ServerState<HostState>;

/// Collects registrations, then turns them into a [`Router`].
#[derive(Default)]
pub struct AxumRegistrar {
    shortcodes: Shortcodes,
    pages: Vec<OptionsPage>,
    routes: Vec<RestRoute>,
}

impl Registrar for AxumRegistrar {
    fn add_shortcode(&mut self, tag: &'static str, handler: ShortcodeHandler) {
        if self.shortcodes.add(tag, handler).is_some() {
            warn!("shortcode [{}] registered twice, keeping the last", tag);
        }
    }
    fn add_options_page(&mut self, page: OptionsPage) {
        self.pages.push(page);
    }
    fn add_rest_route(&mut self, route: RestRoute) {
        self.routes.push(route);
    }
}

impl AxumRegistrar {
    pub fn into_router(self, plugin: Arc<Plugin>, credentials: Credentials) -> Router {
        let mut router: Router<AppState> = Router::new()
            .route("/render", routing::post(render_content))
            .route("/embed", routing::get(embed));

        for page in self.pages {
            let path = format!("/admin/{}", page.slug);
            debug!("settings page at {}", path);
            let page = Arc::new(page);
            router = router.route(&path, routing::get(move |state: State<AppState>, bearer: ExtractBearer| {
                options_page(state, bearer, Arc::clone(&page))
            }));
        }

        for route in self.routes {
            let path = route.path();
            debug!("rest route at {}", path);
            let route = Arc::new(route);
            router = router.route(&path, routing::post(move |state: State<AppState>, bearer: ExtractBearer, body: Bytes| {
                submit(state, bearer, Arc::clone(&route), body)
            }));
        }

        let state = HostState {
            plugin,
            shortcodes: self.shortcodes,
            credentials,
        };
        router.with_state(ServerState::new(Arc::new(state)))
    }
}

/// Register the plugin and wrap its routes in the request middleware.
pub fn build_app(config: &Config) -> anyhow::Result<Router> {
    let plugin = Arc::new(Plugin::from_config(config)?);
    let credentials = Credentials::new(config.admin_token.clone());
    if !credentials.is_configured() {
        warn!("no admin token configured, privileged routes will answer 403");
    }

    let mut registrar = AxumRegistrar::default();
    hooks::register(&mut registrar, &plugin);

    let origin = config.target_url.origin().ascii_serialization();
    let frame_src = layers::frame_src_policy([origin.as_str()])?;

    Ok(registrar.into_router(plugin, credentials)
        .layer(layers::frame_policy_layer(frame_src))
        .layer(tower_http::catch_panic::CatchPanicLayer::new())
        .layer(layers::make_trace_layer()))
}

fn document(title: &str, body: &str) -> String {
    format!("<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<title>{}</title>
</head>
<body>
{}</body>
</html>
", escape_text(title), body)
}

fn check(state: &AppState, bearer: Option<&str>, capability: Capability, path: &str) -> Result<(), AuthResult> {
    match state.credentials.check(bearer, capability) {
        AuthResult::Ok => Ok(()),
        denied => {
            warn!("denied {} on {}: {:?}", capability, path, denied);
            Err(denied)
        },
    }
}

/// Rendered content is caller-supplied and may not run scripts of its own.
/// Sent alongside the frame policy; both apply.
pub const RENDER_POLICY: &str = "script-src 'none'; object-src 'none'; base-uri 'none'; form-action 'none'";

async fn render_content(State(state): State<AppState>, content: String) -> impl IntoResponse {
    ([(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(RENDER_POLICY))], Html(state.shortcodes.expand(&content)))
}

async fn embed(State(state): State<AppState>, Query(params): Query<EmbedParams>) -> Response {
    match state.plugin.renderer().render(&params) {
        Ok(html) => Html(document(DEFAULT_TITLE, &html)).into_response(),
        Err(e) => {
            warn!("embed failed: {}", format_error_disp(&e));
            (StatusCode::BAD_REQUEST, Html(document(DEFAULT_TITLE, &diagnostic(SHORTCODE_TAG, &e)))).into_response()
        },
    }
}

async fn options_page(State(state): State<AppState>, ExtractBearer(bearer): ExtractBearer, page: Arc<OptionsPage>) -> Response {
    let path = format!("/admin/{}", page.slug);
    if check(&state, bearer.as_deref(), page.capability, &path).is_err() {
        return (StatusCode::FORBIDDEN, Html(document(page.page_title, "<p>Sorry, you are not allowed to access this page.</p>\n"))).into_response();
    }
    Html(document(page.page_title, &(page.render)())).into_response()
}

async fn submit(State(state): State<AppState>, ExtractBearer(bearer): ExtractBearer, route: Arc<RestRoute>, body: Bytes) -> Response {
    if check(&state, bearer.as_deref(), route.capability, &route.path()).is_err() {
        let status = StatusCode::FORBIDDEN;
        let body = error_body("rest_forbidden", "Sorry, you are not allowed to do that.", status);
        return (status, Json(body)).into_response();
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            let status = StatusCode::BAD_REQUEST;
            let body = error_body("rest_invalid_json", &format!("Invalid JSON body: {e}"), status);
            return (status, Json(body)).into_response();
        },
    };

    match route.forwarder.forward(&payload).await {
        Ok(forwarded) => forwarded.into_response(),
        Err(e) => {
            warn!("forwarding failed: {}", format_error_disp(&e));
            e.into_response()
        },
    }
}
