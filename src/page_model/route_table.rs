use crate::error::{NavError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// First character of every command key.
pub const SENTINEL: char = ':';

/// Commands that try to close the browsing context before navigating.
pub const QUIT_COMMANDS: [&str; 2] = [":q", ":quit"];

/// Mapping from command key (`:home`) to destination path (`/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::fallback()
    }
}

impl RouteTable {
    /// Built-in table used whenever the page payload is unusable.
    pub fn fallback() -> Self {
        let routes = [(":home", "/"), (":help", "/help/"), (":q", "/")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { routes }
    }

    /// Build the table from the page-embedded payload.
    ///
    /// Never fails: anything unusable resolves to [`RouteTable::fallback`].
    pub fn load(payload: Option<&str>) -> Self {
        let Some(raw) = payload else {
            log::debug!("no route payload on page, using fallback routes");
            return Self::fallback();
        };
        match Self::parse(raw) {
            Ok(table) => table,
            Err(e) => {
                log::debug!("route payload rejected ({e}), using fallback routes");
                Self::fallback()
            }
        }
    }

    /// Strict parse of a JSON object payload.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(NavError::InvalidRoutes("empty payload".to_string()));
        }

        let parsed: RouteTable = serde_json::from_str(raw)?;
        let mut routes = BTreeMap::new();
        for (key, destination) in parsed.routes {
            if key.len() <= SENTINEL.len_utf8() || !key.starts_with(SENTINEL) {
                log::warn!("dropping route {key:?}: command keys must start with '{SENTINEL}'");
            } else if destination.trim().is_empty() {
                log::warn!("dropping route {key:?}: empty destination");
            } else {
                routes.insert(key, destination);
            }
        }

        if routes.is_empty() {
            return Err(NavError::InvalidRoutes("no usable command keys".to_string()));
        }
        Ok(Self { routes })
    }

    /// Exact-match lookup of an already normalized command key.
    pub fn lookup(&self, command: &str) -> Option<&str> {
        self.routes.get(command).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Prefix the sentinel when the user left it off.
pub fn normalize_command(command: &str) -> String {
    if command.starts_with(SENTINEL) {
        command.to_string()
    } else {
        format!("{SENTINEL}{command}")
    }
}

pub fn is_quit_command(normalized: &str) -> bool {
    QUIT_COMMANDS.contains(&normalized)
}
