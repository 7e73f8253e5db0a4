//! Graphviz rendering of control flow graphs

use crate::error::{PrintError, PrintResult};
use arkflow_core::graph::{BlockId, Cfg};
use arkflow_core::ir::StmtKind;
use arkflow_core::model::{ArkMethod, Scene};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

/// One node per basic block, labelled with its statements. Branch edges are
/// labelled `true`/`false` for `if` and with the case value for `switch`.
#[derive(Debug, Clone, Default)]
pub struct DotPrinter {
    block_ids: bool,
}

impl DotPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every node label with its block id
    pub fn with_block_ids(mut self) -> Self {
        self.block_ids = true;
        self
    }

    pub fn to_graph(&self, cfg: &Cfg) -> PrintResult<DiGraph<String, String>> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<BlockId, NodeIndex> = HashMap::new();

        for block in cfg.blocks() {
            let mut lines = Vec::with_capacity(block.len() + 1);
            if self.block_ids {
                lines.push(format!("#{}", block.id.0));
            }
            for &id in block.stmts() {
                let stmt = cfg.stmt(id).ok_or(PrintError::DanglingStmt(id))?;
                lines.push(stmt.to_string());
            }
            nodes.insert(block.id, graph.add_node(lines.join("\n")));
        }

        for block in cfg.blocks() {
            let tail = block.tail().and_then(|id| cfg.stmt(id)).map(|s| &s.kind);
            for (i, succ) in block.successors().iter().enumerate() {
                let (Some(&from), Some(&to)) = (nodes.get(&block.id), nodes.get(succ)) else {
                    continue;
                };
                let label = match tail {
                    Some(StmtKind::If(_)) => (if i == 0 { "true" } else { "false" }).to_string(),
                    Some(StmtKind::Switch { cases, .. }) => match cases.get(i) {
                        Some(case) => format!("case {case}"),
                        None => "default".to_string(),
                    },
                    _ => String::new(),
                };
                graph.add_edge(from, to, label);
            }
        }
        Ok(graph)
    }

    pub fn render_cfg(&self, cfg: &Cfg) -> PrintResult<String> {
        let graph = self.to_graph(cfg)?;
        let has_labels = graph.edge_weights().any(|w| !w.is_empty());
        let rendered = if has_labels {
            format!("{}", Dot::new(&graph))
        } else {
            format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
        };
        Ok(rendered)
    }

    /// `None` for methods without a body
    pub fn render_method(&self, method: &ArkMethod) -> PrintResult<Option<String>> {
        method.body().map(|body| self.render_cfg(body.cfg())).transpose()
    }

    /// One `digraph` per method body, each preceded by a comment naming the method
    pub fn dump(&self, scene: &Scene, out: &mut impl Write) -> PrintResult<()> {
        let mut count = 0usize;
        for class in scene.classes() {
            for method in class.methods() {
                if let Some(dot) = self.render_method(method)? {
                    writeln!(out, "// {}", method.signature())?;
                    out.write_all(dot.as_bytes())?;
                    count += 1;
                }
            }
        }
        debug!(methods = count, "cfgs exported as dot");
        Ok(())
    }
}
