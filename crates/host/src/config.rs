use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use runtime::args::{self, ArgError};
use url::Url;

use crate::forward;

pub const ADMIN_TOKEN_ENV: &str = "ARC_CRUSADE_ADMIN_TOKEN";

pub const USAGE: &str = "\
Usage: arc-crusade [flags]

Serves the Arc Crusade embed, its settings page and the manuscript forwarding endpoint.

Flags:
  -config=PATH           JSON config file, applied before the flags below
  -bind=ADDR             listen address (default 127.0.0.1:8080)
  -target=URL            hosted app address the iframe points at
  -forward[=BOOL]        enable the forwarding endpoint (default true)
  -forward-url=URL       forwarding destination (default TARGET/api/process)
  -forward-timeout=SECS  forwarding request timeout (default 30)
  -admin-token=TOKEN     bearer token for the settings page and forwarding
                         (also read from ARC_CRUSADE_ADMIN_TOKEN)
  -help                  show this message

Logging is controlled with RUST_LOG.
";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file")]
    Read(#[source] std::io::Error),
    #[error("Failed to parse config file {}", .path.display())]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error(transparent)]
    Args(#[from] ArgError),
    #[error("Cannot derive forwarding URL from {}", .0)]
    ForwardUrl(Url, #[source] url::ParseError),
}

/// Deployment configuration for the host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind: SocketAddr,
    /// Address the embed iframe points at; never taken from page content
    pub target_url: Url,
    pub forward: bool,
    pub forward_url: Option<Url>,
    pub forward_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            target_url: Url::parse(arc_embed::render::DEFAULT_TARGET_URL).expect("default target url is valid"),
            forward: true,
            forward_url: None,
            forward_timeout_secs: forward::DEFAULT_TIMEOUT_SECS,
            shutdown_timeout_secs: 8,
            admin_token: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs_err::read_to_string(path).map_err(ConfigError::Read)?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.into(), source })
    }

    /// Where forwarded payloads go, or `None` when forwarding is off.
    pub fn forward_url(&self) -> Result<Option<Url>, ConfigError> {
        if !self.forward {
            return Ok(None);
        }
        match &self.forward_url {
            Some(url) => Ok(Some(url.clone())),
            None => self.target_url.join(forward::API_PATH)
                .map(Some)
                .map_err(|e| ConfigError::ForwardUrl(self.target_url.clone(), e)),
        }
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Default)]
struct Overrides {
    config: Option<PathBuf>,
    bind: Option<SocketAddr>,
    target_url: Option<Url>,
    forward: Option<bool>,
    forward_url: Option<Url>,
    forward_timeout_secs: Option<u64>,
    admin_token: Option<String>,
}

/// Build the config from defaults, then `-config`, then `env_token`, then flags.
/// Returns `Ok(None)` when `-help` was given.
pub fn from_args(args: impl Iterator<Item = String>, env_token: Option<String>) -> Result<Option<Config>, ConfigError> {
    let mut o = Overrides::default();
    let res = args::parse_args(
        args,
        |flag, inline, args, _arg0| {
            match flag {
                "h" | "help" => return Ok(None),
                "config" => o.config = Some(args::parse_param(flag, args, inline)?.into()),
                "bind" => o.bind = Some(args::parse_param_as(flag, args, inline)?),
                "target" => o.target_url = Some(args::parse_param_as(flag, args, inline)?),
                "forward" => o.forward = Some(args::parse_flag_optional_bool(inline)?),
                "forward-url" => o.forward_url = Some(args::parse_param_as(flag, args, inline)?),
                "forward-timeout" => {
                    let secs: u64 = args::parse_param_as(flag, args, inline)?;
                    if secs == 0 {
                        return Err(ArgError::InvalidValue {
                            flag: flag.into(),
                            value: secs.to_string(),
                            reason: "timeout must be at least one second".into(),
                        });
                    }
                    o.forward_timeout_secs = Some(secs);
                },
                "admin-token" => o.admin_token = Some(args::parse_param(flag, args, inline)?),
                other => return Err(ArgError::UnknownFlag(other.into())),
            }
            Ok(Some(()))
        },
        |_, arg| Err(ArgError::UnexpectedArg(arg)),
    )?;
    if res.is_none() {
        return Ok(None);
    }

    let mut config = match &o.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(token) = env_token.filter(|t| !t.is_empty()) {
        config.admin_token = Some(token);
    }
    if let Some(bind) = o.bind { config.bind = bind; }
    if let Some(target) = o.target_url { config.target_url = target; }
    if let Some(forward) = o.forward { config.forward = forward; }
    if let Some(url) = o.forward_url { config.forward_url = Some(url); }
    if let Some(secs) = o.forward_timeout_secs { config.forward_timeout_secs = secs; }
    if let Some(token) = o.admin_token { config.admin_token = Some(token); }
    Ok(Some(config))
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn argv(args: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("arc-crusade".to_owned())
            .chain(args.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn defaults() {
        let config = from_args(argv(&[]), None).unwrap().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.forward_url().unwrap().unwrap().as_str(),
            "https://arc-crusade.streamlit.app/api/process",
        );
        assert_eq!(config.admin_token, None);
    }

    #[test]
    fn flags_override() {
        let config = from_args(argv(&[
            "-bind=0.0.0.0:9000",
            "-target", "http://localhost:8501/",
            "-forward-timeout=5",
            "-admin-token=flag",
        ]), Some("env".into())).unwrap().unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.target_url.as_str(), "http://localhost:8501/");
        assert_eq!(config.forward_timeout(), Duration::from_secs(5));
        assert_eq!(config.admin_token.as_deref(), Some("flag"));
        assert_eq!(config.forward_url().unwrap().unwrap().as_str(), "http://localhost:8501/api/process");
    }

    #[test]
    fn env_token_applies_without_flag() {
        let config = from_args(argv(&[]), Some("env".into())).unwrap().unwrap();
        assert_eq!(config.admin_token.as_deref(), Some("env"));
        let config = from_args(argv(&[]), Some(String::new())).unwrap().unwrap();
        assert_eq!(config.admin_token, None);
    }

    #[test]
    fn forwarding_can_be_disabled() {
        let config = from_args(argv(&["-forward=false"]), None).unwrap().unwrap();
        assert_eq!(config.forward_url().unwrap(), None);
    }

    #[test]
    fn help_and_bad_flags() {
        assert!(from_args(argv(&["-help"]), None).unwrap().is_none());
        assert!(matches!(from_args(argv(&["-nope"]), None), Err(ConfigError::Args(ArgError::UnknownFlag(_)))));
        assert!(matches!(from_args(argv(&["stray"]), None), Err(ConfigError::Args(ArgError::UnexpectedArg(_)))));
        assert!(matches!(
            from_args(argv(&["-bind=nowhere"]), None),
            Err(ConfigError::Args(ArgError::InvalidValue { .. })),
        ));
    }

    #[test]
    fn zero_forward_timeout_is_rejected() {
        match from_args(argv(&["-forward-timeout=0"]), None) {
            Err(ConfigError::Args(ArgError::InvalidValue { flag, value, .. })) => {
                assert_eq!(flag, "forward-timeout");
                assert_eq!(value, "0");
            },
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        let config = from_args(argv(&["-forward-timeout", "1"]), None).unwrap().unwrap();
        assert_eq!(config.forward_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{
            "bind": "127.0.0.1:7000",
            "forward_url": "https://relay.example/in",
            "admin_token": "from-file"
        }}"#).unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let config = from_args(argv(&["-config", &path, "-bind=127.0.0.1:7001"]), None).unwrap().unwrap();
        assert_eq!(config.bind.port(), 7001);
        assert_eq!(config.admin_token.as_deref(), Some("from-file"));
        assert_eq!(config.forward_url().unwrap().unwrap().as_str(), "https://relay.example/in");
        assert_eq!(config.forward_timeout_secs, forward::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bnid": "127.0.0.1:7000" }}"#).unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file() {
        let path = Path::new("/nonexistent/arc-crusade.json");
        assert!(matches!(Config::load(path), Err(ConfigError::Read(_))));
    }
}
