//! Host integration for the Arc Crusade embed: the `[arc_crusade]` shortcode,
//! the settings page, and the manuscript forwarding route, served over HTTP.

#[allow(unused)]
#[macro_use]
extern crate tracing;

pub mod admin;
pub mod auth;
pub mod config;
pub mod forward;
pub mod hooks;
pub mod host;
pub mod plugin;
pub mod shortcode;

pub use config::Config;
pub use host::build_app;
pub use plugin::Plugin;
