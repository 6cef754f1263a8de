use crate::{ElementId, LinkElement, SessionMarker, SettleWatch};

/// DOM mutation capability injected by the host integration layer.
///
/// All methods are synchronous; the only suspension point of a swap is the
/// [`SettleWatch`] returned on insertion.
pub trait Document: Send + Sync {
    /// Every `<link>` element, in document order.
    fn link_elements(&self) -> Vec<LinkElement>;

    /// Clones `original` with `href` replaced and inserts the clone directly after it.
    ///
    /// Returns `None` if `original` is no longer attached.
    fn insert_clone_after(&self, original: ElementId, href: &str) -> Option<(ElementId, SettleWatch)>;

    /// Adds `marker` to the element's class list.
    fn tag(&self, element: ElementId, marker: &SessionMarker);

    /// Elements currently carrying `marker`, in document order.
    fn tagged(&self, marker: &SessionMarker) -> Vec<ElementId>;

    /// Detaches an element. Returns `false` if it was already gone.
    fn remove(&self, element: ElementId) -> bool;
}
