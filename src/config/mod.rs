/// Configuration subsystem - Overlay settings and preferences
///
/// This module handles loading and applying configuration from .tgnavrc files,
/// providing centralized settings for the overlay and the terminal host.

pub mod rc;

// Re-export public interface
pub use rc::{NavConfig, RcLoader};
