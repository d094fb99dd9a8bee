//! Keep a selected link inside the part of the viewport the footer leaves free.

use crate::config::NavConfig;
use crate::page_model::{BoundingBox, ScrollBehavior, Viewport};

/// Footer height: rendered box, then the reserved value, then the default.
pub fn footer_height<V: Viewport + ?Sized>(viewport: &V, config: &NavConfig) -> i32 {
    if let Some(height) = viewport.footer_box_height().filter(|h| *h > 0) {
        return height;
    }
    if let Some(height) = viewport.reserved_footer_height().filter(|h| *h > 0) {
        return height;
    }
    config.default_footer_height
}

/// Scroll needed to bring `rect` into `[0, viewport_height - footer)`.
///
/// Positive scrolls down. `None` when the box is already inside.
pub fn scroll_delta(rect: BoundingBox, viewport_height: i32, footer: i32, config: &NavConfig) -> Option<i32> {
    let top_visible = 0;
    let bottom_visible = viewport_height - footer;

    if rect.bottom > bottom_visible {
        Some(rect.bottom - bottom_visible + config.scroll_margin_bottom)
    } else if rect.top < top_visible {
        Some(rect.top - top_visible - config.scroll_margin_top)
    } else {
        None
    }
}

pub fn ensure_visible<V: Viewport + ?Sized>(viewport: &mut V, rect: BoundingBox, config: &NavConfig) {
    let footer = footer_height(viewport, config);
    let Some(dy) = scroll_delta(rect, viewport.viewport_height(), footer, config) else {
        return;
    };

    let behavior = if config.reduced_motion || viewport.prefers_reduced_motion() {
        ScrollBehavior::Instant
    } else {
        ScrollBehavior::Smooth
    };
    log::debug!("scrolling {dy} ({behavior:?}) to reveal selection");
    viewport.scroll_by(dy, behavior);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::test_host::FakeHost;

    #[test]
    fn test_footer_height_fallbacks() {
        let config = NavConfig::default();
        let mut host = FakeHost::new();

        host.footer_box = Some(40);
        assert_eq!(footer_height(&host, &config), 40);

        host.footer_box = Some(0);
        host.reserved_footer = Some(52);
        assert_eq!(footer_height(&host, &config), 52);

        host.footer_box = None;
        host.reserved_footer = None;
        assert_eq!(footer_height(&host, &config), 64);
    }

    #[test]
    fn test_scroll_delta_below_footer() {
        let config = NavConfig::default();
        // Visible window is [0, 560)
        let rect = BoundingBox::new(570, 0, 16, 10);
        assert_eq!(scroll_delta(rect, 600, 40, &config), Some(586 - 560 + 4));
    }

    #[test]
    fn test_scroll_delta_above_top() {
        let config = NavConfig::default();
        let rect = BoundingBox::new(-30, 0, 16, 10);
        assert_eq!(scroll_delta(rect, 600, 40, &config), Some(-30 - 8));
    }

    #[test]
    fn test_scroll_delta_inside() {
        let config = NavConfig::default();
        assert_eq!(scroll_delta(BoundingBox::new(0, 0, 16, 10), 600, 40, &config), None);
        assert_eq!(scroll_delta(BoundingBox::new(544, 0, 16, 10), 600, 40, &config), None);
    }

    #[test]
    fn test_ensure_visible_respects_reduced_motion() {
        let config = NavConfig::default();
        let mut host = FakeHost::new();
        let rect = BoundingBox::new(700, 0, 16, 10);

        ensure_visible(&mut host, rect, &config);
        host.reduced_motion = true;
        ensure_visible(&mut host, rect, &config);

        assert_eq!(host.scrolls.len(), 2);
        assert_eq!(host.scrolls[0].1, ScrollBehavior::Smooth);
        assert_eq!(host.scrolls[1].1, ScrollBehavior::Instant);
    }

    #[test]
    fn test_ensure_visible_no_scroll_when_visible() {
        let config = NavConfig::default();
        let mut host = FakeHost::new();
        ensure_visible(&mut host, BoundingBox::new(100, 0, 16, 10), &config);
        assert!(host.scrolls.is_empty());
    }
}
