use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use scraper::{ElementRef, Html};
use url::Url;

use crate::latch::{settle_channel, SettleLatch};
use crate::{Document, ElementId, LinkElement, SessionMarker, SettleEvent, SettleWatch};

/// How newly inserted stylesheets of a [`MemoryDocument`] signal completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettleMode {
    /// Nothing fires until [`MemoryDocument::settle`] is called.
    #[default]
    Manual,
    /// Every insertion loads immediately.
    Load,
    /// Every insertion fails immediately.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryElement {
    pub id: ElementId,
    /// Lower-case tag name.
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub classes: BTreeSet<String>,
}

impl MemoryElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn href(&self) -> Option<&str> {
        self.attr("href")
    }
}

#[derive(Debug, Default)]
struct DocState {
    next_id: u64,
    elements: Vec<MemoryElement>,
    pending: HashMap<ElementId, SettleLatch>,
}

impl DocState {
    fn mint_id(&mut self) -> ElementId {
        self.next_id += 1;
        ElementId(self.next_id)
    }

    /// Drops latches nobody waits on any more, e.g. after a swap timed out.
    fn prune_abandoned(&mut self) {
        self.pending.retain(|_, latch| !latch.is_resolved());
    }

    fn position(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|element| element.id == id)
    }
}

/// Flat in-memory document: the elements of a page in document order.
///
/// Used to run the swap protocol headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    state: Mutex<DocState>,
    mode: SettleMode,
}

impl MemoryDocument {
    pub fn new(mode: SettleMode) -> Self {
        Self {
            state: Mutex::new(DocState::default()),
            mode,
        }
    }

    /// Parses `html`, resolving relative `href`s against `base_url` when given.
    pub fn from_html(html: &str, base_url: Option<&str>, mode: SettleMode) -> Self {
        let doc = Self::new(mode);
        let base = base_url.and_then(|base| Url::parse(base).ok());
        let parsed = Html::parse_document(html);

        {
            let mut state = doc.state();
            for node in parsed.root_element().descendants() {
                let Some(element) = ElementRef::wrap(node) else {
                    continue;
                };
                let id = state.mint_id();
                let memory_element = to_memory_element(id, element, base.as_ref());
                state.elements.push(memory_element);
            }
        }
        doc
    }

    /// Appends a `<link>` element and returns its id.
    pub fn push_link(&self, rel: &str, link_type: Option<&str>, href: &str) -> ElementId {
        let mut state = self.state();
        let id = state.mint_id();
        let mut attributes = BTreeMap::new();
        attributes.insert("rel".to_string(), rel.to_string());
        attributes.insert("href".to_string(), href.to_string());
        if let Some(link_type) = link_type {
            attributes.insert("type".to_string(), link_type.to_string());
        }
        state.elements.push(MemoryElement {
            id,
            name: "link".to_string(),
            attributes,
            classes: BTreeSet::new(),
        });
        id
    }

    pub fn elements(&self) -> Vec<MemoryElement> {
        self.state().elements.clone()
    }

    pub fn element(&self, id: ElementId) -> Option<MemoryElement> {
        let state = self.state();
        state.position(id).map(|index| state.elements[index].clone())
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.state().position(id).is_some()
    }

    /// `href`s of all link elements, in document order.
    pub fn link_hrefs(&self) -> Vec<String> {
        self.state()
            .elements
            .iter()
            .filter(|element| element.name == "link")
            .filter_map(|element| element.href().map(str::to_string))
            .collect()
    }

    /// Link elements whose href contains `needle`.
    pub fn find_by_href(&self, needle: &str) -> Vec<ElementId> {
        self.state()
            .elements
            .iter()
            .filter(|element| element.href().is_some_and(|href| href.contains(needle)))
            .map(|element| element.id)
            .collect()
    }

    /// Inserted elements still waiting for a load or error signal.
    ///
    /// An element whose swap already gave up on a timeout is no longer pending.
    pub fn pending(&self) -> Vec<ElementId> {
        let mut state = self.state();
        state.prune_abandoned();
        state
            .elements
            .iter()
            .filter(|element| state.pending.contains_key(&element.id))
            .map(|element| element.id)
            .collect()
    }

    /// Fires a load or error signal for an inserted element.
    ///
    /// Returns `false` if the element already settled or is not pending.
    pub fn settle(&self, id: ElementId, event: SettleEvent) -> bool {
        let latch = self.state().pending.remove(&id);
        latch.is_some_and(|latch| latch.resolve(event))
    }

    fn state(&self) -> MutexGuard<'_, DocState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Document for MemoryDocument {
    fn link_elements(&self) -> Vec<LinkElement> {
        self.state()
            .elements
            .iter()
            .filter(|element| element.name == "link")
            .map(|element| LinkElement {
                id: element.id,
                rel: element.attr("rel").map(str::to_string),
                link_type: element.attr("type").map(str::to_string),
                href: element.href().map(str::to_string),
            })
            .collect()
    }

    fn insert_clone_after(&self, original: ElementId, href: &str) -> Option<(ElementId, SettleWatch)> {
        let mut state = self.state();
        state.prune_abandoned();
        let index = state.position(original)?;
        let id = state.mint_id();
        let mut clone = state.elements[index].clone();
        clone.id = id;
        clone.attributes.insert("href".to_string(), href.to_string());
        state.elements.insert(index + 1, clone);

        let (latch, watch) = settle_channel();
        match self.mode {
            SettleMode::Manual => {
                state.pending.insert(id, latch);
            }
            SettleMode::Load => {
                latch.resolve(SettleEvent::Load);
            }
            SettleMode::Error => {
                latch.resolve(SettleEvent::Error);
            }
        }
        Some((id, watch))
    }

    fn tag(&self, element: ElementId, marker: &SessionMarker) {
        let mut state = self.state();
        if let Some(index) = state.position(element) {
            state.elements[index]
                .classes
                .insert(marker.as_str().to_string());
        }
    }

    fn tagged(&self, marker: &SessionMarker) -> Vec<ElementId> {
        self.state()
            .elements
            .iter()
            .filter(|element| element.classes.contains(marker.as_str()))
            .map(|element| element.id)
            .collect()
    }

    fn remove(&self, element: ElementId) -> bool {
        let mut state = self.state();
        state.pending.remove(&element);
        match state.position(element) {
            Some(index) => {
                state.elements.remove(index);
                true
            }
            None => false,
        }
    }
}

fn to_memory_element(id: ElementId, element: ElementRef<'_>, base: Option<&Url>) -> MemoryElement {
    let value = element.value();
    let mut attributes: BTreeMap<String, String> = value
        .attrs()
        .map(|(name, raw)| (name.to_ascii_lowercase(), raw.to_string()))
        .collect();
    if let Some(href) = attributes.get_mut("href") {
        if let Some(resolved) = resolve_href(href, base) {
            *href = resolved;
        }
    }
    MemoryElement {
        id,
        name: value.name().to_ascii_lowercase(),
        attributes,
        classes: value.classes().map(str::to_string).collect(),
    }
}

fn resolve_href(reference: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(trimmed).ok()).map(Into::into)
}
