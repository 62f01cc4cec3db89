use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc};

use crate::{
    content::{Content, TransformFn, TransitionFn},
    error::{FlickerError, FlickerResult},
    rng::Chooser,
};

/// A named visual configuration the machine can occupy: shared content plus
/// an ordered list of post-processing transforms.
pub struct State<N, C> {
    name: N,
    content: Arc<C>,
    transforms: Vec<TransformFn<C>>,
}

impl<N, C> State<N, C> {
    pub fn new(name: N, content: impl Into<Arc<C>>) -> Self {
        Self {
            name,
            content: content.into(),
            transforms: Vec::new(),
        }
    }

    /// Appends a transform; transforms apply left-to-right on resolution.
    pub fn with_transform(mut self, transform: impl Fn(Arc<C>) -> Arc<C> + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn name(&self) -> &N {
        &self.name
    }

    /// The base content, before any transforms. Prefetch enumerates this.
    pub fn content(&self) -> &Arc<C> {
        &self.content
    }

    /// The displayed content: base content with every transform applied.
    pub fn resolve(&self) -> Arc<C> {
        self.transforms
            .iter()
            .fold(self.content.clone(), |c, f| f(c))
    }
}

/// A timed, weighted, optionally-transitioned connection between two states.
///
/// The target state does not need to be registered when the edge is built;
/// it is looked up lazily on first resolution. Durations are seconds. A
/// zero-duration edge is legal, but a cycle made entirely of zero-duration
/// edges can never catch up to a later query time.
pub struct Edge<N, C> {
    from: N,
    to: N,
    duration: f64,
    transition: Option<TransitionFn<C>>,
    weight: u32,
}

impl<N, C> Edge<N, C> {
    pub fn new(from: N, duration: f64, to: N) -> FlickerResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(FlickerError::invalid_edge(
                "duration must be a finite, non-negative number of seconds",
            ));
        }
        Ok(Self {
            from,
            to,
            duration,
            transition: None,
            weight: 1,
        })
    }

    /// Replication count among the alternatives out of `from`; an edge with
    /// weight W is W times as likely to be chosen as a weight-1 sibling.
    pub fn with_weight(mut self, weight: u32) -> FlickerResult<Self> {
        if weight == 0 {
            return Err(FlickerError::invalid_edge("weight must be at least 1"));
        }
        self.weight = weight;
        Ok(self)
    }

    /// Composes the outgoing and incoming states' content while this edge is
    /// active. Without one, the target state's content shows unblended.
    pub fn with_transition(
        mut self,
        transition: impl Fn(Arc<C>, Arc<C>) -> Arc<C> + 'static,
    ) -> Self {
        self.transition = Some(Box::new(transition));
        self
    }

    pub fn from(&self) -> &N {
        &self.from
    }

    pub fn to(&self) -> &N {
        &self.to
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn transition(&self) -> Option<&TransitionFn<C>> {
        self.transition.as_ref()
    }
}

/// Name-keyed store of states. Resolution is pure; callers cache results.
pub struct StateRegistry<N, C> {
    states: HashMap<N, State<N, C>>,
}

impl<N, C> Default for StateRegistry<N, C> {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
        }
    }
}

impl<N, C> StateRegistry<N, C>
where
    N: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry keyed by the state's name.
    pub fn add(&mut self, state: State<N, C>) {
        self.states.insert(state.name.clone(), state);
    }

    pub fn contains(&self, name: &N) -> bool {
        self.states.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Resolved content for `name`: base content with transforms applied in
    /// order.
    pub fn resolve(&self, name: &N) -> FlickerResult<Arc<C>> {
        let state = self
            .states
            .get(name)
            .ok_or_else(|| FlickerError::unknown_state(name))?;
        Ok(state.resolve())
    }

    /// Forwards `callback` to every state's base content so the host can
    /// prefetch all assets up front, independent of traversal order.
    pub fn predict(&self, callback: &mut dyn FnMut(&C))
    where
        C: Content,
    {
        for state in self.states.values() {
            state.content.predict(callback);
        }
    }
}

/// Per-source-state lists of weight-replicated edge references.
///
/// All replicas of an edge are clones of one `Arc`, so replication costs a
/// pointer per unit of weight and a pick over the list is already weighted.
pub struct EdgeTable<N, C> {
    edges: HashMap<N, Vec<Arc<Edge<N, C>>>>,
}

impl<N, C> Default for EdgeTable<N, C> {
    fn default() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }
}

impl<N, C> EdgeTable<N, C>
where
    N: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, edge: Edge<N, C>) {
        let count = edge.weight as usize;
        let edge = Arc::new(edge);
        self.edges
            .entry(edge.from.clone())
            .or_default()
            .extend(std::iter::repeat_n(edge, count));
    }

    /// Whether any edges leave `name`. A state with none is terminal.
    pub fn has_outgoing(&self, name: &N) -> bool {
        self.edges.contains_key(name)
    }

    /// Uniform choice over the replicated list for `name`, or `None` if the
    /// state is terminal.
    pub fn pick(&self, name: &N, chooser: &mut dyn Chooser) -> Option<Arc<Edge<N, C>>> {
        let list = self.edges.get(name)?;
        Some(list[chooser.choose(list.len())].clone())
    }

    /// Number of replicated slots out of `name`; the sum of the weights of
    /// its edges.
    pub fn fanout(&self, name: &N) -> usize {
        self.edges.get(name).map_or(0, Vec::len)
    }
}
