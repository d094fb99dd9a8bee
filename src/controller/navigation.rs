//! Delayed navigation: show a loading indicator, then change location.

use crate::controller::shared_state::SharedNavState;
use crate::page_model::{BrowsingContext, NavigationContext};
use std::time::{Duration, Instant};

/// A same-context navigation waiting for its delay to pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNavigation {
    pub destination: String,
    pub due: Instant,
}

/// What `navigate` did with a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Empty destination.
    Ignored,
    /// Opened in a new context right away.
    OpenedNewContext,
    /// Same-page fragment, assigned right away.
    AssignedImmediately,
    /// Loading indicator shown, navigation queued.
    Scheduled,
}

/// Queue of delayed navigations.
///
/// A second navigation while one is pending is not guarded against: both
/// fire in schedule order and the last assignment wins.
#[derive(Debug, Clone)]
pub struct DelayedNavigator {
    delay: Duration,
    pending: Vec<PendingNavigation>,
}

impl DelayedNavigator {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            pending: Vec::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn pending(&self) -> &[PendingNavigation] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn schedule(&mut self, destination: &str, now: Instant) {
        self.pending.push(PendingNavigation {
            destination: destination.to_string(),
            due: now + self.delay,
        });
    }

    /// Drop every queued navigation.
    pub fn cancel_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Fire every navigation due at `now`. Returns how many fired.
    pub fn poll<B: BrowsingContext + ?Sized>(&mut self, now: Instant, browsing: &mut B) -> usize {
        let (due, waiting): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;

        for navigation in &due {
            log::info!("navigating to {}", navigation.destination);
            if let Err(e) = browsing.assign(&navigation.destination) {
                log::warn!("navigation to {} failed: {e}", navigation.destination);
            }
        }
        due.len()
    }
}

/// Same-page fragment reference (`#section`).
pub fn is_fragment_only(destination: &str) -> bool {
    destination.trim().starts_with('#')
}

/// Route a navigation decision through the loading transition when needed.
pub fn navigate<B: BrowsingContext + ?Sized>(
    shared: &mut SharedNavState,
    browsing: &mut B,
    destination: &str,
    context: NavigationContext,
    now: Instant,
) -> NavigationOutcome {
    let destination = destination.trim();
    if destination.is_empty() {
        return NavigationOutcome::Ignored;
    }

    if context == NavigationContext::NewContext {
        log::info!("opening {destination} in a new context");
        if let Err(e) = browsing.open_new_context(destination) {
            log::warn!("opening {destination} in a new context failed: {e}");
        }
        return NavigationOutcome::OpenedNewContext;
    }

    // Nothing to transition to on the same page
    if is_fragment_only(destination) {
        log::info!("jumping to {destination}");
        if let Err(e) = browsing.assign(destination) {
            log::warn!("fragment jump to {destination} failed: {e}");
        }
        return NavigationOutcome::AssignedImmediately;
    }

    // The footer is hidden behind the command line while it is open
    shared.mode.set_command_active(false);
    shared.status.show_loading();
    shared.navigator.schedule(destination, now);
    log::debug!("navigation to {destination} scheduled in {:?}", shared.navigator.delay());
    NavigationOutcome::Scheduled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::controller::shared_state::LinkPreview;
    use crate::controller::test_host::FakeHost;

    fn create_test_shared_state() -> SharedNavState {
        SharedNavState::new(NavConfig::default())
    }

    #[test]
    fn test_same_context_is_delayed() {
        let mut shared = create_test_shared_state();
        let mut host = FakeHost::new();
        let now = Instant::now();

        let outcome = navigate(&mut shared, &mut host, "/help/", NavigationContext::SameContext, now);
        assert_eq!(outcome, NavigationOutcome::Scheduled);
        assert_eq!(shared.status.preview, LinkPreview::Loading);
        assert!(host.assigned.is_empty());

        // Not yet due
        assert_eq!(shared.navigator.poll(now + Duration::from_millis(499), &mut host), 0);
        assert!(host.assigned.is_empty());

        assert_eq!(shared.navigator.poll(now + Duration::from_millis(500), &mut host), 1);
        assert_eq!(host.assigned, vec!["/help/".to_string()]);
        assert!(!shared.navigator.has_pending());
    }

    #[test]
    fn test_new_context_opens_immediately() {
        let mut shared = create_test_shared_state();
        let mut host = FakeHost::new();

        let outcome = navigate(
            &mut shared,
            &mut host,
            "https://example.com",
            NavigationContext::NewContext,
            Instant::now(),
        );
        assert_eq!(outcome, NavigationOutcome::OpenedNewContext);
        assert_eq!(host.opened, vec!["https://example.com".to_string()]);
        assert_eq!(shared.status.preview, LinkPreview::Hidden);
        assert!(!shared.navigator.has_pending());
    }

    #[test]
    fn test_fragment_skips_delay() {
        let mut shared = create_test_shared_state();
        shared.mode.set_command_active(true);
        let mut host = FakeHost::new();

        let outcome = navigate(&mut shared, &mut host, " #top", NavigationContext::SameContext, Instant::now());
        assert_eq!(outcome, NavigationOutcome::AssignedImmediately);
        assert_eq!(host.assigned, vec!["#top".to_string()]);
        assert_eq!(shared.status.preview, LinkPreview::Hidden);
    }

    #[test]
    fn test_scheduling_exits_command_mode() {
        let mut shared = create_test_shared_state();
        shared.mode.set_command_active(true);
        let mut host = FakeHost::new();

        navigate(&mut shared, &mut host, "/", NavigationContext::SameContext, Instant::now());
        assert!(!shared.mode.is_command_active());
    }

    #[test]
    fn test_empty_destination_ignored() {
        let mut shared = create_test_shared_state();
        let mut host = FakeHost::new();
        let outcome = navigate(&mut shared, &mut host, "  ", NavigationContext::SameContext, Instant::now());
        assert_eq!(outcome, NavigationOutcome::Ignored);
        assert_eq!(shared.status.preview, LinkPreview::Hidden);
    }

    #[test]
    fn test_second_navigation_last_wins() {
        let mut shared = create_test_shared_state();
        let mut host = FakeHost::new();
        let now = Instant::now();

        navigate(&mut shared, &mut host, "/a/", NavigationContext::SameContext, now);
        navigate(&mut shared, &mut host, "/b/", NavigationContext::SameContext, now + Duration::from_millis(10));
        assert_eq!(shared.navigator.poll(now + Duration::from_secs(1), &mut host), 2);
        assert_eq!(host.assigned.last().map(String::as_str), Some("/b/"));
    }

    #[test]
    fn test_cancel_pending() {
        let mut shared = create_test_shared_state();
        let mut host = FakeHost::new();
        let now = Instant::now();
        navigate(&mut shared, &mut host, "/a/", NavigationContext::SameContext, now);
        assert_eq!(shared.navigator.cancel_pending(), 1);
        assert_eq!(shared.navigator.poll(now + Duration::from_secs(1), &mut host), 0);
        assert!(host.assigned.is_empty());
    }

    #[test]
    fn test_host_failure_is_swallowed() {
        let mut shared = create_test_shared_state();
        let mut host = FakeHost::new();
        host.refuse_open = true;
        let outcome = navigate(&mut shared, &mut host, "https://x", NavigationContext::NewContext, Instant::now());
        assert_eq!(outcome, NavigationOutcome::OpenedNewContext);
        assert!(host.opened.is_empty());
    }
}
