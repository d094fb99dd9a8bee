use crate::controller::navigation::{self, NavigationOutcome, is_fragment_only};
use crate::controller::scroll;
use crate::controller::shared_state::{KeyController, KeyDisposition, NavContext, SharedNavState};
use crate::page_model::{BrowsingContext, Handle, HandleId, LinkSource, NavigationContext, Region, Viewport};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

/// Selection cursor over the page's links, driven by j/k/Enter/Escape.
pub struct LinkNavigator {
    links: Vec<Handle>,
    /// `None` until the user presses j or k.
    cursor: Option<usize>,
}

impl Default for LinkNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkNavigator {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            cursor: None,
        }
    }

    pub fn links(&self) -> &[Handle] {
        &self.links
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Handle> {
        self.cursor.and_then(|idx| self.links.get(idx))
    }

    /// Rebuild the link set. A selection survives only if its link does.
    pub fn discover<H: LinkSource + Viewport + ?Sized>(&mut self, host: &mut H, shared: &mut SharedNavState) {
        let previous = self.selected().map(|link| link.id());
        let links = collect_links(host);

        // Stale handles may already be detached; unhighlight tolerates that
        self.clear_highlight();
        self.links = links;
        self.cursor = previous.and_then(|id| self.links.iter().position(|link| link.id() == id));

        log::debug!(
            "discovered {} links, selection {:?}",
            self.links.len(),
            self.cursor.map(|idx| idx + 1)
        );

        if self.cursor.is_some() {
            self.highlight(host, shared);
        } else {
            shared.status.clear_link_target();
            shared.status.set_position(0, self.links.len());
        }
    }

    /// Move the cursor by `delta`, wrapping at both ends.
    ///
    /// From no selection, forward lands on the first link and backward on the last.
    pub fn move_by<V: Viewport + ?Sized>(&mut self, delta: isize, viewport: &mut V, shared: &mut SharedNavState) {
        if self.links.is_empty() || delta == 0 {
            return;
        }
        let len = self.links.len() as isize;
        let next = match self.cursor {
            None if delta > 0 => 0,
            None => len - 1,
            Some(idx) => (idx as isize + delta).rem_euclid(len),
        };
        self.cursor = Some(next as usize);
        self.highlight(viewport, shared);
    }

    /// Open the selected link: new contexts right away, same context after the delay.
    pub fn open_active<B: BrowsingContext + ?Sized>(
        &self,
        browsing: &mut B,
        shared: &mut SharedNavState,
        now: Instant,
    ) -> NavigationOutcome {
        let Some(link) = self.selected() else {
            return NavigationOutcome::Ignored;
        };
        let Some(destination) = link.destination() else {
            return NavigationOutcome::Ignored;
        };
        navigation::navigate(shared, browsing, &destination, link.navigation_context(), now)
    }

    pub fn clear_selection(&mut self, shared: &mut SharedNavState) {
        self.cursor = None;
        self.clear_highlight();
        shared.status.set_position(0, self.links.len());
        shared.status.clear_link_target();
    }

    fn clear_highlight(&self) {
        for link in &self.links {
            link.unhighlight();
        }
    }

    fn highlight<V: Viewport + ?Sized>(&self, viewport: &mut V, shared: &mut SharedNavState) {
        self.clear_highlight();
        let Some(idx) = self.cursor else {
            return;
        };
        let Some(link) = self.links.get(idx).map(Rc::clone) else {
            return;
        };

        link.highlight();
        link.focus();
        // Preview first: it can change the footer height the scroll measures
        shared
            .status
            .set_link_target(&link.destination().unwrap_or_default(), link.navigation_context());
        scroll::ensure_visible(viewport, link.bounding_box(), &shared.config);
        shared.status.set_position(idx + 1, self.links.len());
    }
}

/// Links in priority order, deduplicated, attached and visible only.
pub fn collect_links<S: LinkSource + ?Sized>(source: &S) -> Vec<Handle> {
    let mut seen: HashSet<HandleId> = HashSet::new();
    Region::PRIORITY
        .iter()
        .flat_map(|region| source.links_in(*region))
        .filter(|link| seen.insert(link.id()))
        .filter(|link| link.is_attached() && link.is_visible())
        .collect()
}

/// Whether a pointer activation of `link` should go through the delayed navigator.
///
/// Modified clicks, new-context links and fragment jumps keep their default behavior.
pub fn intercepts_click(link: &Handle, modified: bool) -> bool {
    if modified || link.navigation_context() == NavigationContext::NewContext {
        return false;
    }
    match link.destination() {
        Some(destination) => !destination.trim().is_empty() && !is_fragment_only(&destination),
        None => false,
    }
}

impl KeyController for LinkNavigator {
    fn handle_key(&mut self, key_event: KeyEvent, ctx: &mut NavContext<'_>) -> KeyDisposition {
        // Escape clears in every mode and never blocks other Escape handling
        if key_event.code == KeyCode::Esc {
            self.clear_selection(ctx.shared);
            return KeyDisposition::Passed;
        }

        if ctx.shared.mode.is_command_active() || ctx.shared.editable_focused {
            return KeyDisposition::Passed;
        }
        if key_event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return KeyDisposition::Passed;
        }

        match key_event.code {
            KeyCode::Char('j') => {
                self.move_by(1, &mut *ctx.host, ctx.shared);
                KeyDisposition::Consumed
            }
            KeyCode::Char('k') => {
                self.move_by(-1, &mut *ctx.host, ctx.shared);
                KeyDisposition::Consumed
            }
            KeyCode::Enter => {
                // Only act if a link is highlighted
                if self.selected().is_some_and(|link| link.is_highlighted()) {
                    self.open_active(&mut *ctx.host, ctx.shared, ctx.now);
                    KeyDisposition::Consumed
                } else {
                    KeyDisposition::Passed
                }
            }
            _ => KeyDisposition::Passed,
        }
    }
}
