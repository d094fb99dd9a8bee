//! In-memory host doubles for controller tests.

use crate::error::{NavError, Result};
use crate::page_model::{
    BoundingBox, BrowsingContext, ChangeObserver, ContentSignal, Handle, HandleId, LinkSource,
    NavigableHandle, NavigationContext, Region, ScrollBehavior, Viewport,
};
use std::cell::Cell;
use std::rc::Rc;

pub struct FakeLink {
    pub id: HandleId,
    pub destination: Option<String>,
    pub context: NavigationContext,
    pub highlighted: Cell<bool>,
    pub focused: Cell<bool>,
    pub rect: Cell<BoundingBox>,
    pub attached: Cell<bool>,
    pub hidden: Cell<bool>,
}

impl FakeLink {
    fn build(id: u64, destination: &str, context: NavigationContext) -> Rc<Self> {
        Rc::new(Self {
            id: HandleId(id),
            destination: Some(destination.to_string()),
            context,
            highlighted: Cell::new(false),
            focused: Cell::new(false),
            rect: Cell::new(BoundingBox::new(id as i32 * 20, 0, 16, 80)),
            attached: Cell::new(true),
            hidden: Cell::new(false),
        })
    }

    pub fn new(id: u64, destination: &str) -> Rc<Self> {
        Self::build(id, destination, NavigationContext::SameContext)
    }

    pub fn new_tab(id: u64, destination: &str) -> Rc<Self> {
        Self::build(id, destination, NavigationContext::NewContext)
    }

    pub fn at(self: Rc<Self>, top: i32, height: i32) -> Rc<Self> {
        self.rect.set(BoundingBox::new(top, 0, height, 80));
        self
    }
}

impl NavigableHandle for FakeLink {
    fn id(&self) -> HandleId {
        self.id
    }

    fn destination(&self) -> Option<String> {
        self.destination.clone()
    }

    fn navigation_context(&self) -> NavigationContext {
        self.context
    }

    fn highlight(&self) {
        self.highlighted.set(true);
    }

    fn unhighlight(&self) {
        self.highlighted.set(false);
    }

    fn is_highlighted(&self) -> bool {
        self.highlighted.get()
    }

    fn focus(&self) {
        self.focused.set(true);
    }

    fn bounding_box(&self) -> BoundingBox {
        self.rect.get()
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn is_visible(&self) -> bool {
        self.attached.get() && !self.hidden.get() && !self.rect.get().is_empty()
    }
}

pub struct FakeHost {
    pub nav: Vec<Rc<FakeLink>>,
    pub main: Vec<Rc<FakeLink>>,
    pub root: Vec<Rc<FakeLink>>,
    pub viewport_height: i32,
    pub footer_box: Option<i32>,
    pub reserved_footer: Option<i32>,
    pub reduced_motion: bool,
    pub scrolls: Vec<(i32, ScrollBehavior)>,
    pub assigned: Vec<String>,
    pub opened: Vec<String>,
    pub close_attempts: usize,
    pub refuse_open: bool,
    pub refuse_close: bool,
    pub unsupported: Vec<ContentSignal>,
    pub watched: Vec<ContentSignal>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            nav: Vec::new(),
            main: Vec::new(),
            root: Vec::new(),
            viewport_height: 600,
            footer_box: Some(40),
            reserved_footer: None,
            reduced_motion: false,
            scrolls: Vec::new(),
            assigned: Vec::new(),
            opened: Vec::new(),
            close_attempts: 0,
            refuse_open: false,
            refuse_close: false,
            unsupported: Vec::new(),
            watched: Vec::new(),
        }
    }

    /// Host with `nav` links in the navbar and `main` links in the content.
    pub fn with_links(nav: Vec<Rc<FakeLink>>, main: Vec<Rc<FakeLink>>) -> Self {
        let mut host = Self::new();
        host.root = main.iter().map(Rc::clone).collect();
        host.nav = nav;
        host.main = main;
        host
    }
}

fn as_handles(links: &[Rc<FakeLink>]) -> Vec<Handle> {
    links.iter().map(|l| Rc::clone(l) as Handle).collect()
}

impl LinkSource for FakeHost {
    fn links_in(&self, region: Region) -> Vec<Handle> {
        match region {
            Region::PrimaryNav => as_handles(&self.nav),
            Region::MainContent => as_handles(&self.main),
            Region::ContentRoot => as_handles(&self.root),
        }
    }
}

impl Viewport for FakeHost {
    fn viewport_height(&self) -> i32 {
        self.viewport_height
    }

    fn footer_box_height(&self) -> Option<i32> {
        self.footer_box
    }

    fn reserved_footer_height(&self) -> Option<i32> {
        self.reserved_footer
    }

    fn set_reserved_footer_height(&mut self, height: i32) {
        self.reserved_footer = Some(height);
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn scroll_by(&mut self, dy: i32, behavior: ScrollBehavior) {
        self.scrolls.push((dy, behavior));
    }
}

impl BrowsingContext for FakeHost {
    fn assign(&mut self, destination: &str) -> Result<()> {
        self.assigned.push(destination.to_string());
        Ok(())
    }

    fn open_new_context(&mut self, destination: &str) -> Result<()> {
        if self.refuse_open {
            return Err(NavError::Refused("popup blocked".to_string()));
        }
        self.opened.push(destination.to_string());
        Ok(())
    }

    fn close_context(&mut self) -> Result<()> {
        self.close_attempts += 1;
        if self.refuse_close {
            return Err(NavError::Refused("scripts may not close this window".to_string()));
        }
        Ok(())
    }
}

impl ChangeObserver for FakeHost {
    fn watch(&mut self, signal: ContentSignal) -> Result<()> {
        if self.unsupported.contains(&signal) {
            return Err(NavError::Unsupported(format!("{signal:?}")));
        }
        self.watched.push(signal);
        Ok(())
    }
}
