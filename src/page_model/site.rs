use crate::error::{NavError, Result};
use std::path::{Path, PathBuf};

/// Extension of page files inside a site directory.
pub const PAGE_EXTENSION: &str = "page";

/// A destination split into the parts the terminal host cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `#id` on the current page.
    Fragment(String),
    /// A page file in the site, its normalized site path and an optional fragment.
    Page {
        path: PathBuf,
        site_path: String,
        fragment: Option<String>,
    },
    /// Anything with a scheme (`https:`, `mailto:`).
    External(String),
}

/// A static site rooted at a directory of `.page` files.
#[derive(Debug, Clone)]
pub struct Site {
    root: PathBuf,
}

impl Site {
    pub fn new(root: PathBuf) -> Result<Self> {
        if !root.is_dir() {
            return Err(NavError::PageNotFound(format!(
                "site root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `destination` as seen from the page at `current`.
    pub fn resolve(&self, destination: &str, current: &str) -> Result<Location> {
        let destination = destination.trim();
        if let Some(fragment) = destination.strip_prefix('#') {
            return Ok(Location::Fragment(fragment.to_string()));
        }
        if is_external(destination) {
            return Ok(Location::External(destination.to_string()));
        }

        let (path_part, fragment) = match destination.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment.to_string())),
            None => (destination, None),
        };
        let path_part = path_part.split('?').next().unwrap_or_default();
        let site_path = join_site_path(current, path_part);

        let file = self
            .page_file(&site_path)
            .ok_or_else(|| NavError::PageNotFound(site_path.clone()))?;
        Ok(Location::Page {
            path: file,
            site_path,
            fragment,
        })
    }

    /// Map a normalized site path (`/help/`) to an existing page file.
    fn page_file(&self, site_path: &str) -> Option<PathBuf> {
        let relative = site_path.trim_start_matches('/');
        let base = self.root.join(relative);

        let mut candidates = Vec::new();
        if relative.is_empty() || site_path.ends_with('/') {
            candidates.push(base.join(format!("index.{PAGE_EXTENSION}")));
        } else {
            candidates.push(base.with_extension(PAGE_EXTENSION));
            candidates.push(base.join(format!("index.{PAGE_EXTENSION}")));
        }
        candidates.into_iter().find(|p| p.is_file())
    }
}

fn is_external(destination: &str) -> bool {
    match destination.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && !scheme.contains('/')
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Join a possibly relative path onto the current site path and fold `.`/`..`.
pub fn join_site_path(current: &str, path: &str) -> String {
    if path.is_empty() {
        return current.to_string();
    }
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        let dir = match current.rfind('/') {
            Some(i) => &current[..=i],
            None => "/",
        };
        format!("{dir}{path}")
    };

    let trailing = joined.ends_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    let mut normalized = format!("/{}", parts.join("/"));
    if trailing && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
