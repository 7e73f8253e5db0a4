//! Program model: the scene and its files, namespaces, classes, methods and bodies

mod body;
mod class;
mod dummy_main;
mod field;
mod file;
mod method;
mod namespace;
mod scene;

pub use body::{ArkBody, Trap};
pub use class::{ArkClass, ClassCategory};
pub use dummy_main::DummyMainCreator;
pub use field::ArkField;
pub use file::{ArkFile, ExportInfo, ExportSymbol, ImportInfo};
pub use method::ArkMethod;
pub use namespace::ArkNamespace;
pub use scene::Scene;
