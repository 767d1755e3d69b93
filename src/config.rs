// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! immutable [`HubAuthConfig`] built from them once at startup. Every
//! component receives the config explicitly; nothing reads the environment
//! after [`HubAuthConfig::from_env`] returns.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `127.0.0.1` |
//! | `PORT` | Server bind port | `5000` |
//! | `HUBAUTH_GRADERS` | Comma-separated grader user names | empty |
//! | `HUBAUTH_HUB_ADDRESS` | Hub address | `HOST` |
//! | `HUBAUTH_HUB_PORT` | Hub port | `8000` |
//! | `HUBAUTH_HUB_BASE_URL` | Public hub URL | `http://{hub address}:{hub port}` |
//! | `HUBAUTH_HUBAPI_ADDRESS` | Hub API address | `HOST` |
//! | `HUBAUTH_HUBAPI_PORT` | Hub API port | `8081` |
//! | `HUBAUTH_PROXY_ADDRESS` | Proxy API address | `HOST` |
//! | `HUBAUTH_PROXY_PORT` | Proxy API port | `8001` |
//! | `HUBAUTH_HUBAPI_COOKIE` | Hub session cookie name | `jupyter-hub-token` |
//! | `HUBAUTH_HUBAPI_TOKEN` | Hub API token | `JPY_API_TOKEN` |
//! | `HUBAUTH_GENERATE_HUBAPI_TOKEN` | Derive the token with `jupyterhub token` | `false` |
//! | `HUBAUTH_HUB_DB` | Hub database (for token generation) | Required if generating |
//! | `HUBAUTH_HUBAPI_TOKEN_USER` | User to generate the token for | Optional |
//! | `HUBAUTH_PROXY_TOKEN` | Proxy API token | `CONFIGPROXY_AUTH_TOKEN` |
//! | `COURSE_ID` | Course identifier | `default_course` |
//! | `HUBAUTH_REMAP_URL` | Public path prefix behind the proxy | `/hub/nbgrader/{COURSE_ID}` |
//! | `HUBAUTH_NOTEBOOK_URL_PREFIX` | Notebook path under the user's server | Optional |
//! | `HUBAUTH_NOTEBOOK_SERVER_USER` | User hosting the autograded notebooks | Optional |
//! | `HUBAUTH_CONNECT_IP` | Address the proxy should connect to | `HOST` |
//! | `HUBAUTH_HTTP_TIMEOUT_SECS` | Outbound request timeout | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::process::Command;
use std::time::Duration;

use url::Url;

use crate::auth::GraderAllowList;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const GRADERS_ENV: &str = "HUBAUTH_GRADERS";
pub const HUB_ADDRESS_ENV: &str = "HUBAUTH_HUB_ADDRESS";
pub const HUB_PORT_ENV: &str = "HUBAUTH_HUB_PORT";
pub const HUB_BASE_URL_ENV: &str = "HUBAUTH_HUB_BASE_URL";
pub const HUBAPI_ADDRESS_ENV: &str = "HUBAUTH_HUBAPI_ADDRESS";
pub const HUBAPI_PORT_ENV: &str = "HUBAUTH_HUBAPI_PORT";
pub const PROXY_ADDRESS_ENV: &str = "HUBAUTH_PROXY_ADDRESS";
pub const PROXY_PORT_ENV: &str = "HUBAUTH_PROXY_PORT";
pub const HUBAPI_COOKIE_ENV: &str = "HUBAUTH_HUBAPI_COOKIE";
pub const HUBAPI_TOKEN_ENV: &str = "HUBAUTH_HUBAPI_TOKEN";
pub const GENERATE_HUBAPI_TOKEN_ENV: &str = "HUBAUTH_GENERATE_HUBAPI_TOKEN";
pub const HUB_DB_ENV: &str = "HUBAUTH_HUB_DB";
pub const HUBAPI_TOKEN_USER_ENV: &str = "HUBAUTH_HUBAPI_TOKEN_USER";
pub const PROXY_TOKEN_ENV: &str = "HUBAUTH_PROXY_TOKEN";
pub const COURSE_ID_ENV: &str = "COURSE_ID";
pub const REMAP_URL_ENV: &str = "HUBAUTH_REMAP_URL";
pub const NOTEBOOK_URL_PREFIX_ENV: &str = "HUBAUTH_NOTEBOOK_URL_PREFIX";
pub const NOTEBOOK_SERVER_USER_ENV: &str = "HUBAUTH_NOTEBOOK_SERVER_USER";
pub const CONNECT_IP_ENV: &str = "HUBAUTH_CONNECT_IP";
pub const HTTP_TIMEOUT_ENV: &str = "HUBAUTH_HTTP_TIMEOUT_SECS";

/// Token the hub hands to services it launches.
pub const JPY_API_TOKEN_ENV: &str = "JPY_API_TOKEN";
/// Token shared between the hub and the configurable HTTP proxy.
pub const CONFIGPROXY_AUTH_TOKEN_ENV: &str = "CONFIGPROXY_AUTH_TOKEN";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_HUB_PORT: u16 = 8000;
const DEFAULT_HUBAPI_PORT: u16 = 8081;
const DEFAULT_PROXY_PORT: u16 = 8001;
const DEFAULT_COURSE_ID: &str = "default_course";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default name of the JupyterHub session cookie.
pub const DEFAULT_HUBAPI_COOKIE: &str = "jupyter-hub-token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("remap path must start with '/' and name a sub-path: {0:?}")]
    InvalidRemapPath(String),

    #[error("HUBAUTH_HUB_DB is required when HUBAUTH_GENERATE_HUBAPI_TOKEN is enabled")]
    MissingHubDb,

    #[error("failed to generate hub API token: {0}")]
    TokenGeneration(String),
}

/// Immutable service configuration.
///
/// Base URLs never carry a trailing slash; the remap path always starts with
/// one and never ends with one.
#[derive(Clone)]
pub struct HubAuthConfig {
    /// Address this service listens on
    pub bind_host: String,
    /// Port this service listens on
    pub bind_port: u16,
    /// Address the proxy should use to reach this service, when it differs
    /// from the bind address (containers, NAT)
    pub connect_ip: Option<String>,
    /// Hub users allowed to grade
    pub graders: GraderAllowList,
    /// Public hub URL, used for login redirects and notebook links
    pub hub_base_url: String,
    /// Hub REST API base URL
    pub hubapi_base_url: String,
    /// Configurable HTTP proxy API base URL
    pub proxy_base_url: String,
    /// Name of the hub session cookie
    pub hubapi_cookie: String,
    /// Token for the hub API
    pub hubapi_token: String,
    /// Token for the proxy API
    pub proxy_token: String,
    /// Public path prefix for this service
    pub remap_url: String,
    /// Notebook directory relative to the user's server root
    pub notebook_url_prefix: Option<String>,
    /// User whose notebook server hosts the autograded notebooks
    pub notebook_server_user: Option<String>,
    /// Timeout applied to every outbound request
    pub http_timeout: Duration,
}

impl HubAuthConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset, except for tokens where an empty
    /// string is passed through to the hub unchanged.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let bind_port = parse_port(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?;

        let hub_address = get(HUB_ADDRESS_ENV).unwrap_or_else(|| bind_host.clone());
        let hub_port = parse_port(HUB_PORT_ENV, get(HUB_PORT_ENV), DEFAULT_HUB_PORT)?;
        let hub_base_url = match get(HUB_BASE_URL_ENV) {
            Some(raw) => normalize_base_url(HUB_BASE_URL_ENV, &raw)?,
            None => format!("http://{hub_address}:{hub_port}"),
        };

        let hubapi_address = get(HUBAPI_ADDRESS_ENV).unwrap_or_else(|| bind_host.clone());
        let hubapi_port = parse_port(HUBAPI_PORT_ENV, get(HUBAPI_PORT_ENV), DEFAULT_HUBAPI_PORT)?;
        let proxy_address = get(PROXY_ADDRESS_ENV).unwrap_or_else(|| bind_host.clone());
        let proxy_port = parse_port(PROXY_PORT_ENV, get(PROXY_PORT_ENV), DEFAULT_PROXY_PORT)?;

        let hubapi_token = if parse_bool(
            GENERATE_HUBAPI_TOKEN_ENV,
            get(GENERATE_HUBAPI_TOKEN_ENV),
        )? {
            let hub_db = get(HUB_DB_ENV).ok_or(ConfigError::MissingHubDb)?;
            generate_hubapi_token(&hub_db, get(HUBAPI_TOKEN_USER_ENV).as_deref())?
        } else {
            lookup(HUBAPI_TOKEN_ENV)
                .or_else(|| lookup(JPY_API_TOKEN_ENV))
                .unwrap_or_default()
        };
        let proxy_token = lookup(PROXY_TOKEN_ENV)
            .or_else(|| lookup(CONFIGPROXY_AUTH_TOKEN_ENV))
            .unwrap_or_default();

        let course_id = get(COURSE_ID_ENV).unwrap_or_else(|| DEFAULT_COURSE_ID.to_string());
        let remap_url = normalize_remap_url(
            &get(REMAP_URL_ENV).unwrap_or_else(|| format!("/hub/nbgrader/{course_id}")),
        )?;

        let notebook_url_prefix = get(NOTEBOOK_URL_PREFIX_ENV)
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());

        let timeout_secs = match get(HTTP_TIMEOUT_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidValue {
                        name: HTTP_TIMEOUT_ENV,
                        value: raw,
                        reason: "timeout must be at least one second".to_string(),
                    })
                }
                Ok(secs) => secs,
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        name: HTTP_TIMEOUT_ENV,
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_host,
            bind_port,
            connect_ip: get(CONNECT_IP_ENV),
            graders: GraderAllowList::parse(&get(GRADERS_ENV).unwrap_or_default()),
            hub_base_url,
            hubapi_base_url: format!("http://{hubapi_address}:{hubapi_port}"),
            proxy_base_url: format!("http://{proxy_address}:{proxy_port}"),
            hubapi_cookie: get(HUBAPI_COOKIE_ENV)
                .unwrap_or_else(|| DEFAULT_HUBAPI_COOKIE.to_string()),
            hubapi_token,
            proxy_token,
            remap_url,
            notebook_url_prefix,
            notebook_server_user: get(NOTEBOOK_SERVER_USER_ENV),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// `host:port` this service binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }

    /// URL the proxy forwards the remap path to.
    pub fn proxy_target(&self) -> String {
        let ip = self.connect_ip.as_deref().unwrap_or(&self.bind_host);
        format!("http://{ip}:{}", self.bind_port)
    }

    /// Public URL of this service as seen through the hub.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.hub_base_url, self.remap_url)
    }

    /// Hub login page that sends the user back to the remap path afterwards.
    pub fn login_url(&self) -> String {
        format!(
            "{}/hub/login?next={}",
            self.hub_base_url,
            urlencoding::encode(&self.remap_url)
        )
    }
}

impl std::fmt::Debug for HubAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubAuthConfig")
            .field("bind_host", &self.bind_host)
            .field("bind_port", &self.bind_port)
            .field("connect_ip", &self.connect_ip)
            .field("graders", &self.graders.sorted())
            .field("hub_base_url", &self.hub_base_url)
            .field("hubapi_base_url", &self.hubapi_base_url)
            .field("proxy_base_url", &self.proxy_base_url)
            .field("hubapi_cookie", &self.hubapi_cookie)
            .field("hubapi_token", &redacted(&self.hubapi_token))
            .field("proxy_token", &redacted(&self.proxy_token))
            .field("remap_url", &self.remap_url)
            .field("notebook_url_prefix", &self.notebook_url_prefix)
            .field("notebook_server_user", &self.notebook_server_user)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

fn redacted(token: &str) -> &'static str {
    if token.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

fn parse_port(name: &'static str, raw: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::InvalidValue {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }
        }),
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw,
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn normalize_base_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}

fn normalize_remap_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') || trimmed.is_empty() {
        return Err(ConfigError::InvalidRemapPath(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Ask the hub CLI for an API token (`jupyterhub token --db=<db> [user]`).
fn generate_hubapi_token(hub_db: &str, user: Option<&str>) -> Result<String, ConfigError> {
    let mut cmd = Command::new("jupyterhub");
    cmd.arg("token").arg(format!("--db={hub_db}"));
    if let Some(user) = user {
        cmd.arg(user);
    }

    let output = cmd
        .output()
        .map_err(|e| ConfigError::TokenGeneration(format!("failed to run jupyterhub: {e}")))?;
    if !output.status.success() {
        return Err(ConfigError::TokenGeneration(format!(
            "jupyterhub token exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let token = String::from_utf8(output.stdout)
        .map_err(|e| ConfigError::TokenGeneration(format!("token is not UTF-8: {e}")))?;
    Ok(token.trim().to_string())
}
