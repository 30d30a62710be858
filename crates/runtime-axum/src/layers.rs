use axum::{routing, extract, middleware};
use axum::http::{header, HeaderValue};
use tower_http::trace as tower_trace;
use std::net::SocketAddr;


/// Security headers for pages that carry third-party iframes: only `frame_src`
/// sources may be framed, and content types are not sniffed. Any policy the
/// handler set is kept alongside.
///
/// `frame_src` is a complete policy value, as built by [`frame_src_policy`].
pub fn frame_policy_layer(frame_src: HeaderValue)
-> impl tower::Layer<
        routing::Route,
        Service = impl tower::Service<
            axum::http::Request<axum::body::Body>,
            Response = impl axum::response::IntoResponse,
            Error = impl Into<std::convert::Infallible>,
            Future = impl Send,
        > + Clone
    > + Clone
{
    middleware::from_fn(move |req: extract::Request, next: middleware::Next| {
        let frame_src = frame_src.clone();
        async move {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            // Appended so a handler's own policy is kept as well
            headers.append(header::CONTENT_SECURITY_POLICY, frame_src);
            headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("strict-origin-when-cross-origin"));
            response
        }
    })
}

/// Build the CSP value for [`frame_policy_layer`] from a list of allowed origins.
pub fn frame_src_policy<'a>(origins: impl IntoIterator<Item = &'a str>) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut policy = String::from("frame-src 'self'");
    for origin in origins {
        policy.push(' ');
        policy.push_str(origin);
    }
    HeaderValue::from_str(&policy)
}


// Well, I guess it is supposed to be a tower...
pub fn make_trace_layer()
 -> impl tower::Layer<
        routing::Route,
        Service = impl tower::Service<
            axum::http::Request<axum::body::Body>,
            Response = impl axum::response::IntoResponse,
            Error = impl Into<std::convert::Infallible>,
            Future = impl Send,
        > + Clone
    > + Clone
{
    tower_trace::TraceLayer::new(
        tower_http::classify::SharedClassifier::new(tower_http::classify::ServerErrorsAsFailures::default())
    )
        .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
            // Can't use extractors since this isn't async
            let connect_info = request.extensions().get::<extract::ConnectInfo<SocketAddr>>()
                .map(|c| c.0);
            let agent = request.headers().get(header::USER_AGENT);

            let span = tracing::debug_span!(
                "request", method = %request.method(), uri = %request.uri(), version = ?request.version(),
                ip = tracing::field::Empty, useragent = tracing::field::Empty,
            );
            if let Some(ip) = connect_info {
                span.record("ip", tracing::field::display(ip));
            }
            if let Some(agent) = agent {
                span.record("useragent", tracing::field::debug(agent));
            }
            span
        })
        .on_request(
            tower_trace::DefaultOnRequest::new()
        )
        .on_response(
            tower_trace::DefaultOnResponse::new()
                .latency_unit(tower_http::LatencyUnit::Micros)
        )
}
