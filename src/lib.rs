#![forbid(unsafe_code)]

pub mod content;
pub mod error;
pub mod graph;
pub mod machine;
pub mod rng;
pub mod sequence;

pub use content::{Content, Size, TransformFn, TransitionFn};
pub use error::{FlickerError, FlickerResult};
pub use graph::{Edge, EdgeTable, State, StateRegistry};
pub use machine::{Machine, Part, Sample};
pub use rng::{Chooser, RngChooser};
pub use sequence::{FOREVER, Step, sequence};
