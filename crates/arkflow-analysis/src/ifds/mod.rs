//! IFDS dataflow framework
//!
//! - [`Icfg`]: the supergraph over a scene's method bodies
//! - [`DataflowProblem`]: zero fact, entry method and the four flow function families
//! - [`IfdsSolver`]: worklist tabulation with a bounded iteration count

mod icfg;
mod problem;
mod solver;

pub use icfg::{Icfg, MethodId, Node};
pub use problem::{BoxedFlow, DataflowProblem, FlowFunction, Identity, KillAll};
pub use solver::{IfdsResult, IfdsSolver};
