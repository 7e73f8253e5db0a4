//! IR printers
//!
//! - [`JsonPrinter`]: the scene as a `_`-tagged JSON tree
//! - [`DotPrinter`]: method CFGs in Graphviz format

mod dot;
mod json;

pub use dot::DotPrinter;
pub use json::{print_type, print_value, JsonPrinter};
