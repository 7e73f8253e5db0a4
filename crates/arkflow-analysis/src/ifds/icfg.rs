//! Interprocedural control flow graph
//!
//! A read-only view over a [`Scene`]: every method with a body gets a
//! [`MethodId`], and statements are addressed as [`Node`]s (method plus
//! statement id). Call sites are statements whose invocation resolves to a
//! method with a body; calls into bodiless or unknown methods stay ordinary
//! statements.

use arkflow_core::ir::{ClassSignature, InvokeExpr, Local, LocalTable, MethodSignature, Stmt, StmtId};
use arkflow_core::model::{ArkBody, ArkMethod, Scene};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub usize);

/// A statement of one method in the supergraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    pub method: MethodId,
    pub stmt: StmtId,
}

impl Node {
    pub fn new(method: MethodId, stmt: StmtId) -> Self {
        Self { method, stmt }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}:s{}", self.method.0, self.stmt.0)
    }
}

pub struct Icfg<'a> {
    scene: &'a Scene,
    methods: Vec<&'a ArkMethod>,
    index: HashMap<(ClassSignature, String), MethodId>,
}

impl<'a> Icfg<'a> {
    /// Index every method of the scene that has a body
    pub fn new(scene: &'a Scene) -> Self {
        let mut methods = Vec::new();
        let mut index = HashMap::new();
        for class in scene.classes() {
            for method in class.methods().filter(|m| m.body().is_some()) {
                let id = MethodId(methods.len());
                index.insert(
                    (method.signature().declaring_class.clone(), method.name().to_string()),
                    id,
                );
                methods.push(method);
            }
        }
        trace!(methods = methods.len(), "icfg indexed");
        Self { scene, methods, index }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn method_id(&self, signature: &MethodSignature) -> Option<MethodId> {
        self.index
            .get(&(signature.declaring_class.clone(), signature.name().to_string()))
            .copied()
    }

    pub fn method(&self, id: MethodId) -> Option<&'a ArkMethod> {
        self.methods.get(id.0).copied()
    }

    pub fn signature(&self, id: MethodId) -> Option<&'a MethodSignature> {
        self.method(id).map(ArkMethod::signature)
    }

    pub fn body(&self, id: MethodId) -> Option<&'a ArkBody> {
        self.method(id).and_then(ArkMethod::body)
    }

    pub fn locals(&self, id: MethodId) -> Option<&'a LocalTable> {
        self.body(id).map(ArkBody::locals)
    }

    /// Node of `stmt` in the method named by `signature`
    pub fn node(&self, signature: &MethodSignature, stmt: StmtId) -> Option<Node> {
        self.method_id(signature).map(|m| Node::new(m, stmt))
    }

    pub fn stmt(&self, node: Node) -> Option<&'a Stmt> {
        self.body(node.method).and_then(|b| b.cfg().stmt(node.stmt))
    }

    /// Where execution of a method begins: the starting statement, or the
    /// head of the first non-empty block when none was set
    pub fn start_points(&self, method: MethodId) -> Vec<Node> {
        let Some(cfg) = self.body(method).map(ArkBody::cfg) else {
            return Vec::new();
        };
        let start = cfg
            .starting_stmt()
            .filter(|s| cfg.block_of(*s).is_some())
            .or_else(|| cfg.blocks().find_map(|b| b.head()));
        start.map(|s| vec![Node::new(method, s)]).unwrap_or_default()
    }

    pub fn successors(&self, node: Node) -> Vec<Node> {
        self.body(node.method)
            .map(|b| {
                b.cfg()
                    .stmt_successors(node.stmt)
                    .into_iter()
                    .map(|s| Node::new(node.method, s))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Statements a call returns to
    pub fn return_sites(&self, call_site: Node) -> Vec<Node> {
        self.successors(call_site)
    }

    pub fn is_exit(&self, node: Node) -> bool {
        self.successors(node).is_empty()
    }

    pub fn exit_points(&self, method: MethodId) -> Vec<Node> {
        self.body(method)
            .map(|b| {
                b.cfg()
                    .exit_stmts()
                    .into_iter()
                    .map(|s| Node::new(method, s))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn invoke_at(&self, node: Node) -> Option<&'a InvokeExpr> {
        self.stmt(node).and_then(Stmt::get_invoke_expr)
    }

    /// Methods with bodies a call site may enter
    pub fn callees(&self, call_site: Node) -> Vec<MethodId> {
        let Some(invoke) = self.invoke_at(call_site) else {
            return Vec::new();
        };
        let signature = &invoke.method_signature;
        if let Some(id) = self.method_id(signature) {
            return vec![id];
        }
        self.scene
            .find_method_in_hierarchy(&signature.declaring_class, signature.name())
            .and_then(|m| self.method_id(m.signature()))
            .into_iter()
            .collect()
    }

    pub fn is_call(&self, node: Node) -> bool {
        !self.callees(node).is_empty()
    }

    /// Local bound to the `index`-th formal parameter of a method
    pub fn parameter_local(&self, method: MethodId, index: usize) -> Option<Local> {
        self.body(method)?
            .parameter_locals()
            .into_iter()
            .find(|(i, _)| *i == index)
            .map(|(_, local)| local)
    }

    pub fn this_local(&self, method: MethodId) -> Option<Local> {
        self.body(method).and_then(ArkBody::this_local)
    }

    /// Statements binding formal parameters and `this` carry no dataflow of their own
    pub fn is_parameter_assign(&self, node: Node) -> bool {
        self.body(node.method)
            .is_some_and(|b| b.is_parameter_assign(node.stmt))
    }

    pub fn all_nodes(&self, method: MethodId) -> Vec<Node> {
        self.body(method)
            .map(|b| {
                b.cfg()
                    .stmt_ids()
                    .into_iter()
                    .map(|s| Node::new(method, s))
                    .collect()
            })
            .unwrap_or_default()
    }
}
