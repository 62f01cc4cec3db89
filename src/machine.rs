use std::{fmt, fmt::Debug, hash::Hash, sync::Arc};

use crate::{
    content::{Content, Size},
    error::{FlickerError, FlickerResult},
    graph::{Edge, EdgeTable, State, StateRegistry},
    rng::{self, Chooser},
};

/// What the host should show right now, and the minimum time (seconds) to
/// wait before querying again to observe a change.
#[derive(Debug)]
pub struct Sample<C> {
    pub content: Arc<C>,
    pub wake: f64,
}

/// A state or edge, for building a machine from one mixed sequence.
pub enum Part<N, C> {
    State(State<N, C>),
    Edge(Edge<N, C>),
}

impl<N, C> From<State<N, C>> for Part<N, C> {
    fn from(state: State<N, C>) -> Self {
        Self::State(state)
    }
}

impl<N, C> From<Edge<N, C>> for Part<N, C> {
    fn from(edge: Edge<N, C>) -> Self {
        Self::Edge(edge)
    }
}

/// Where the traversal currently stands. `started: None` means no query has
/// arrived yet; `edge: None` after a start means a terminal state.
struct Cursor<N, C> {
    started: Option<f64>,
    edge: Option<Arc<Edge<N, C>>>,
    state: Option<N>,
    cache: Option<Arc<C>>,
}

impl<N, C> Cursor<N, C> {
    fn fresh() -> Self {
        Self {
            started: None,
            edge: None,
            state: None,
            cache: None,
        }
    }
}

/// A state-machine animation: weighted random traversal of timed edges
/// between named states, queried with an external clock.
///
/// One instance drives one playing animation; it is single-threaded and
/// driven entirely by the host polling [`Machine::advance`].
pub struct Machine<N, C> {
    initial: N,
    states: StateRegistry<N, C>,
    edges: EdgeTable<N, C>,
    chooser: Box<dyn Chooser>,
    cursor: Cursor<N, C>,
}

impl<N: Debug, C> fmt::Debug for Machine<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("initial", &self.initial)
            .field("current", &self.cursor.state)
            .field("edge_started", &self.cursor.started)
            .finish_non_exhaustive()
    }
}

impl<N, C> Machine<N, C>
where
    N: Clone + Eq + Hash + Debug,
    C: Content,
{
    /// Machine with an OS-seeded chooser, starting from `initial`.
    pub fn new(initial: N) -> Self {
        Self::with_chooser(initial, Box::new(rng::system()))
    }

    /// Deterministic machine; the same seed replays the same traversal.
    pub fn seeded(initial: N, seed: u64) -> Self {
        Self::with_chooser(initial, Box::new(rng::seeded(seed)))
    }

    pub fn with_chooser(initial: N, chooser: Box<dyn Chooser>) -> Self {
        Self {
            initial,
            states: StateRegistry::new(),
            edges: EdgeTable::new(),
            chooser,
            cursor: Cursor::fresh(),
        }
    }

    /// Builds a machine from one mixed sequence of states and edges.
    pub fn assemble(initial: N, parts: impl IntoIterator<Item = Part<N, C>>) -> Self {
        let mut machine = Self::new(initial);
        for part in parts {
            match part {
                Part::State(state) => machine.add_state(state),
                Part::Edge(edge) => machine.add_edge(edge),
            }
        }
        machine
    }

    pub fn add_state(&mut self, state: State<N, C>) {
        self.states.add(state);
    }

    /// Registers an edge under its source state. The target may be added to
    /// the registry later; it is only looked up on first resolution.
    pub fn add_edge(&mut self, edge: Edge<N, C>) {
        self.edges.add(edge);
    }

    /// Forwards `callback` to every state's base content for prefetching.
    pub fn predict(&self, callback: &mut dyn FnMut(&C)) {
        self.states.predict(callback);
    }

    /// The state the traversal has entered, if any query has arrived.
    pub fn current(&self) -> Option<&N> {
        self.cursor.state.as_ref()
    }

    /// Whether the traversal has stopped on a state with no outgoing edges.
    /// The content can never change again; the host may stop polling.
    pub fn is_terminal(&self) -> bool {
        self.cursor.started.is_some() && self.cursor.edge.is_none()
    }

    /// Forgets the traversal position; the next query begins a fresh walk
    /// from the initial state. Hosts looping playback call this between
    /// loops instead of rewinding the clock.
    pub fn restart(&mut self) {
        self.cursor = Cursor::fresh();
    }

    /// Advances the traversal to `t` and resolves the content to show.
    ///
    /// `t` is the host's monotonically-increasing clock, in seconds. Each
    /// fully elapsed edge moves the edge start forward by exactly its
    /// duration and rolls an independent weighted pick, so a large jump in
    /// `t` walks through every intermediate edge rather than skipping.
    ///
    /// This mutates the traversal position and the per-edge content cache.
    /// Passing a `t` smaller than the previous edge start restarts the walk
    /// from the initial state, the same as [`Machine::restart`]; that is a
    /// policy for looped playback, so hosts wanting any other handling of a
    /// rewound clock must restart explicitly. A non-finite `t` is rejected
    /// without touching the traversal: the catch-up loop can never cover NaN
    /// or infinity with finite edge durations.
    #[tracing::instrument(skip(self))]
    pub fn advance(&mut self, t: f64) -> FlickerResult<Sample<C>> {
        if !t.is_finite() {
            return Err(FlickerError::InvalidTime(t));
        }
        if self.cursor.started.is_none_or(|started| t < started) {
            tracing::debug!(t, "starting traversal from the initial state");
            self.cursor = Cursor::fresh();
            self.cursor.started = Some(t);
            self.enter(self.initial.clone());
        }
        self.catch_up(t);
        self.resolve(t)
    }

    /// Placement query: the intrinsic size of the cached content if present,
    /// else of the current state's resolved content, else `default`. Never
    /// advances the traversal.
    pub fn size(&self, default: Size) -> Size {
        if let Some(cached) = &self.cursor.cache {
            return cached.size();
        }
        if let Some(name) = &self.cursor.state {
            if let Ok(content) = self.states.resolve(name) {
                return content.size();
            }
        }
        default
    }

    /// Picks an edge out of `from`, entering either its target state or, if
    /// `from` has no outgoing edges, `from` itself as a terminal state.
    fn enter(&mut self, from: N) {
        self.cursor.cache = None;
        match self.edges.pick(&from, self.chooser.as_mut()) {
            Some(edge) => {
                self.cursor.state = Some(edge.to().clone());
                self.cursor.edge = Some(edge);
            }
            None => {
                self.cursor.state = Some(from);
                self.cursor.edge = None;
            }
        }
    }

    /// Repeats the advance step until the current edge covers `t` or a
    /// terminal state is reached. Each step shifts the edge start by exactly
    /// the elapsed edge's duration, preserving phase across rapid edges.
    fn catch_up(&mut self, t: f64) {
        while let (Some(started), Some(edge)) = (self.cursor.started, self.cursor.edge.clone()) {
            if t <= started + edge.duration() {
                break;
            }
            self.cursor.started = Some(started + edge.duration());
            tracing::trace!(to = ?edge.to(), "edge elapsed");
            self.enter(edge.to().clone());
        }
    }

    fn resolve(&mut self, t: f64) -> FlickerResult<Sample<C>> {
        let Some(edge) = self.cursor.edge.clone() else {
            // Terminal: fixed content forever, so the host need never wake.
            let name = match &self.cursor.state {
                Some(name) => name,
                None => &self.initial,
            };
            let content = self.states.resolve(name)?;
            return Ok(Sample {
                content,
                wake: f64::INFINITY,
            });
        };

        let content = match &self.cursor.cache {
            Some(cached) => cached.clone(),
            None => {
                let mut shown = self.states.resolve(edge.to())?;
                if let Some(transition) = edge.transition() {
                    shown = transition(self.states.resolve(edge.from())?, shown);
                }
                self.cursor.cache = Some(shown.clone());
                shown
            }
        };

        let started = self.cursor.started.unwrap_or(t);
        Ok(Sample {
            content,
            wake: (edge.duration() - (t - started)).max(0.0),
        })
    }
}
