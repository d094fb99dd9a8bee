//! Keyboard-driven navigation overlay for static sites.
//!
//! The controllers are written against the host traits in [`page_model`];
//! [`controller::Session`] plugs them into a crossterm terminal host.

pub mod config;
pub mod controller;
pub mod error;
pub mod page_model;
pub mod view;

pub use config::{NavConfig, RcLoader};
pub use controller::{NavOverlay, Session};
pub use error::{NavError, Result};
pub use page_model::{RouteTable, Site};
