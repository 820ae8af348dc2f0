//! Server configuration read from the environment

use std::net::SocketAddr;
use std::str::FromStr;

use todo_core::task::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use tracing::warn;

const DEFAULT_PREFIX: &str = "/api/v1";
const DEFAULT_PROJECT_NAME: &str = "Todo List API";

/// What the list endpoint does with a cursor the collection rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorFallback {
    /// Serve the first page and flag `cursor_reset`
    #[default]
    Restart,
    /// Answer 400 `INVALID_CURSOR`
    Reject,
}

impl FromStr for CursorFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(Self::Restart),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown cursor fallback '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub api_prefix: String,
    pub project_name: String,
    pub default_page_limit: i64,
    pub cursor_fallback: CursorFallback,
    pub cors_permissive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            api_prefix: DEFAULT_PREFIX.to_string(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            default_page_limit: DEFAULT_PAGE_LIMIT,
            cursor_fallback: CursorFallback::default(),
            cors_permissive: true,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn env_parsed<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Ignoring {}={:?}: {}", name, raw, e);
            default
        }),
        Err(_) => default,
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl Config {
    /// Build the configuration from `TODO_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = env_parsed("TODO_API_ADDR", defaults.addr);
        let api_prefix = std::env::var("TODO_API_PREFIX")
            .map(|raw| normalize_prefix(&raw))
            .unwrap_or(defaults.api_prefix);
        let project_name =
            std::env::var("TODO_PROJECT_NAME").unwrap_or(defaults.project_name);

        let mut default_page_limit =
            env_parsed("TODO_DEFAULT_PAGE_LIMIT", defaults.default_page_limit);
        if !(1..=MAX_PAGE_LIMIT).contains(&default_page_limit) {
            warn!(
                "TODO_DEFAULT_PAGE_LIMIT={} is outside 1..={}, using {}",
                default_page_limit, MAX_PAGE_LIMIT, DEFAULT_PAGE_LIMIT
            );
            default_page_limit = DEFAULT_PAGE_LIMIT;
        }

        Self {
            addr,
            api_prefix,
            project_name,
            default_page_limit,
            cursor_fallback: env_parsed("TODO_CURSOR_FALLBACK", defaults.cursor_fallback),
            cors_permissive: env_flag("TODO_CORS_PERMISSIVE", defaults.cors_permissive),
        }
    }
}
