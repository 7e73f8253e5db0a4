use crate::ifds::{Icfg, Node};
use arkflow_core::ir::Value;
use serde::Serialize;

/// A problem a checker found at one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    #[serde(skip)]
    pub node: Node,
    pub method: String,
    pub stmt: String,
    pub value: String,
    pub message: String,
    pub line: i32,
    pub col: i32,
}

impl Finding {
    pub fn new(icfg: &Icfg<'_>, node: Node, value: &Value, message: impl Into<String>) -> Self {
        let stmt = icfg.stmt(node);
        let position = stmt.map(|s| s.position).unwrap_or_default();
        Self {
            node,
            method: icfg.signature(node.method).map(|s| s.to_string()).unwrap_or_default(),
            stmt: stmt.map(|s| s.to_string()).unwrap_or_default(),
            value: value.to_string(),
            message: message.into(),
            line: position.line,
            col: position.col,
        }
    }
}
