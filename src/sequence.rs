use std::sync::Arc;

use crate::{
    content::Content,
    error::{FlickerError, FlickerResult},
    graph::{Edge, State},
    machine::Machine,
};

/// Delay used to hold the final frame of a non-looping sequence: one year.
/// The machine keeps traversing, so after a year the sequence starts over.
pub const FOREVER: f64 = 365.25 * 24.0 * 3600.0;

/// One item of a linear animation: a frame to show, or a delay in seconds.
pub enum Step<C> {
    Show(Arc<C>),
    Wait(f64),
}

impl<C> Step<C> {
    pub fn show(content: impl Into<Arc<C>>) -> Self {
        Self::Show(content.into())
    }

    pub fn wait(seconds: f64) -> Self {
        Self::Wait(seconds)
    }
}

/// Builds a machine from an alternating show/wait sequence.
///
/// Each frame is shown for the delay that follows it, as a weight-1 edge
/// with no transition; states are named by their position in the sequence.
/// A sequence ending in a delay loops back to the first frame indefinitely;
/// one ending in a frame holds that frame for [`FOREVER`] instead of
/// stopping, so every state keeps exactly one outgoing edge.
pub fn sequence<C>(steps: impl IntoIterator<Item = Step<C>>) -> FlickerResult<Machine<usize, C>>
where
    C: Content,
{
    let mut frames: Vec<(usize, Arc<C>)> = Vec::new();
    let mut delays: Vec<f64> = Vec::new();

    for (position, step) in steps.into_iter().enumerate() {
        match step {
            Step::Show(content) => {
                if position % 2 != 0 {
                    return Err(FlickerError::invalid_sequence(format!(
                        "expected a delay at position {position}, found content"
                    )));
                }
                frames.push((position, content));
            }
            Step::Wait(seconds) => {
                if position % 2 == 0 {
                    return Err(FlickerError::invalid_sequence(format!(
                        "expected content at position {position}, found a delay"
                    )));
                }
                delays.push(seconds);
            }
        }
    }

    let count = frames.len();
    if count == 0 {
        return Err(FlickerError::invalid_sequence(
            "sequence needs at least one content item",
        ));
    }

    // The engine shows an edge's target while the edge is active, so the
    // edge into each frame carries that frame's display time. Starting from
    // the last frame's state makes the first pick enter the first frame.
    let mut machine = Machine::new(frames[count - 1].0);
    for (name, content) in &frames {
        machine.add_state(State::new(*name, content.clone()));
    }
    for i in 0..count {
        let from = frames[(i + count - 1) % count].0;
        let to = frames[i].0;
        let duration = delays.get(i).copied().unwrap_or(FOREVER);
        machine.add_edge(Edge::new(from, duration, to)?);
    }

    Ok(machine)
}
