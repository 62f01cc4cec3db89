use std::sync::Arc;

/// Intrinsic size of a piece of content, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const ZERO: Self = Self { w: 0.0, h: 0.0 };

    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

/// Minimal capability the engine requires of host visual content.
///
/// Content is otherwise opaque: the engine never decodes, composites, or
/// displays it, it only routes references to it.
pub trait Content {
    /// Intrinsic size, used to answer placement queries.
    fn size(&self) -> Size;

    /// Enumerate the content backing this value so the host can prefetch
    /// assets ahead of traversal. Composite content forwards the callback to
    /// each piece; plain content reports itself, which is the default.
    fn predict(&self, callback: &mut dyn FnMut(&Self))
    where
        Self: Sized,
    {
        callback(self);
    }
}

/// A post-processing step applied to a state's content, in list order.
pub type TransformFn<C> = Box<dyn Fn(Arc<C>) -> Arc<C>>;

/// Composes (content-before, content-after) when an edge is entered.
///
/// Must be pure; the engine caches the result and calls it at most once per
/// edge entry.
pub type TransitionFn<C> = Box<dyn Fn(Arc<C>, Arc<C>) -> Arc<C>>;
