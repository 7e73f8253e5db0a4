use crate::graph::{BlockId, Cfg};
use crate::ir::{Local, LocalTable, Ref, StmtId, StmtKind, Type, Value};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Try region and the handlers covering it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trap {
    pub try_blocks: Vec<BlockId>,
    pub catch_blocks: Vec<BlockId>,
}

/// Body of a method: its graph, locals and bookkeeping for diagnostics
#[derive(Debug, Clone)]
pub struct ArkBody {
    cfg: Cfg,
    original_cfg: Cfg,
    locals: LocalTable,
    local_names: IndexMap<String, Local>,
    stmt_to_original: HashMap<StmtId, StmtId>,
    alias_types: IndexMap<String, Type>,
    traps: Vec<Trap>,
}

impl ArkBody {
    /// Wrap a finished graph. The graph is copied as the original, every
    /// placed statement maps to its copy, and locals are indexed by name
    /// with the last one winning on collisions.
    pub fn new(cfg: Cfg, locals: LocalTable) -> Self {
        let original_cfg = cfg.deep_copy();
        let stmt_to_original = cfg.stmt_ids().into_iter().map(|id| (id, id)).collect();
        let local_names = locals.iter().map(|(local, _)| (local.name.clone(), local)).collect();
        Self {
            cfg,
            original_cfg,
            locals,
            local_names,
            stmt_to_original,
            alias_types: IndexMap::new(),
            traps: Vec::new(),
        }
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    pub fn cfg_mut(&mut self) -> &mut Cfg {
        &mut self.cfg
    }

    pub fn original_cfg(&self) -> &Cfg {
        &self.original_cfg
    }

    pub fn locals(&self) -> &LocalTable {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut LocalTable {
        &mut self.locals
    }

    /// Borrow graph and locals mutably at the same time
    pub fn split_mut(&mut self) -> (&mut Cfg, &mut LocalTable) {
        (&mut self.cfg, &mut self.locals)
    }

    pub fn get_local(&self, name: &str) -> Option<&Local> {
        self.local_names.get(name)
    }

    pub fn local_names(&self) -> impl Iterator<Item = (&String, &Local)> {
        self.local_names.iter()
    }

    /// Create a local and index it by name
    pub fn add_local(&mut self, name: impl Into<String>, ty: Type) -> Local {
        let local = self.locals.new_local(name, ty);
        self.local_names.insert(local.name.clone(), local.clone());
        local
    }

    pub fn local_type(&self, name: &str) -> Option<Type> {
        self.get_local(name).map(|l| self.locals.type_of(l))
    }

    /// Statement of the original graph a statement came from
    pub fn original_stmt(&self, stmt: StmtId) -> Option<StmtId> {
        self.stmt_to_original.get(&stmt).copied()
    }

    pub fn set_original_stmt(&mut self, stmt: StmtId, original: StmtId) {
        self.stmt_to_original.insert(stmt, original);
    }

    pub fn alias_type(&self, name: &str) -> Option<&Type> {
        self.alias_types.get(name)
    }

    pub fn alias_types(&self) -> &IndexMap<String, Type> {
        &self.alias_types
    }

    pub fn add_alias_type(&mut self, name: impl Into<String>, ty: Type) {
        self.alias_types.insert(name.into(), ty);
    }

    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }

    pub fn add_trap(&mut self, trap: Trap) {
        self.traps.push(trap);
    }

    /// Locals bound to formal parameters by `x = parameterN` statements, by position
    pub fn parameter_locals(&self) -> Vec<(usize, Local)> {
        let mut params: Vec<(usize, Local)> = self
            .cfg
            .stmts()
            .filter_map(|(_, stmt)| match &stmt.kind {
                StmtKind::Assign {
                    left: Value::Local(local),
                    right: Value::Ref(r),
                } => match &**r {
                    Ref::Parameter { index, .. } => Some((*index, local.clone())),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        params.sort_by_key(|(index, _)| *index);
        params
    }

    /// Statements binding formal parameters and `this`
    pub fn is_parameter_assign(&self, stmt: StmtId) -> bool {
        self.cfg.stmt(stmt).is_some_and(|s| {
            matches!(
                s.right_op().and_then(Value::as_reference),
                Some(Ref::Parameter { .. } | Ref::This { .. })
            )
        })
    }

    pub fn this_local(&self) -> Option<Local> {
        self.cfg.stmts().find_map(|(_, stmt)| match &stmt.kind {
            StmtKind::Assign {
                left: Value::Local(local),
                right: Value::Ref(r),
            } if matches!(**r, Ref::This { .. }) => Some(local.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Constant, Stmt};

    fn body_with_params() -> ArkBody {
        let mut locals = LocalTable::new();
        let this = locals.new_local("this", Type::Unknown);
        let b = locals.new_local("b", Type::Unknown);
        let a = locals.new_local("a", Type::Unknown);
        let mut cfg = Cfg::new();
        let block = cfg.new_block();
        let first = cfg
            .push_stmt(block, Stmt::assign(this, Ref::This { ty: Type::Unknown }))
            .unwrap();
        cfg.push_stmt(
            block,
            Stmt::assign(
                b,
                Ref::Parameter {
                    index: 1,
                    param_type: Type::String,
                },
            ),
        )
        .unwrap();
        cfg.push_stmt(
            block,
            Stmt::assign(
                a,
                Ref::Parameter {
                    index: 0,
                    param_type: Type::Number,
                },
            ),
        )
        .unwrap();
        cfg.push_stmt(block, Stmt::return_void()).unwrap();
        cfg.set_starting_stmt(first);
        ArkBody::new(cfg, locals)
    }

    #[test]
    fn test_parameter_locals_sorted_by_index() {
        let body = body_with_params();
        let names: Vec<_> = body.parameter_locals().into_iter().map(|(i, l)| (i, l.name)).collect();
        assert_eq!(names, vec![(0, "a".to_string()), (1, "b".to_string())]);
        assert_eq!(body.this_local().map(|l| l.name), Some("this".to_string()));
        assert!(body.is_parameter_assign(StmtId(0)));
        assert!(!body.is_parameter_assign(StmtId(3)));
    }

    #[test]
    fn test_local_names_last_write_wins() {
        let mut locals = LocalTable::new();
        locals.new_local("x", Type::Number);
        let second = locals.new_local("x", Type::String);
        let body = ArkBody::new(Cfg::new(), locals);
        assert_eq!(body.get_local("x"), Some(&second));
        assert_eq!(body.local_type("x"), Some(Type::String));
    }

    #[test]
    fn test_original_cfg_survives_mutation() {
        let mut body = body_with_params();
        let ret = StmtId(3);
        let (cfg, locals) = body.split_mut();
        let z = locals.new_local("z", Type::Number);
        let inserted = cfg.insert_before(Stmt::assign(z, Constant::number("0")), ret).unwrap();
        assert_eq!(body.cfg().stmt_ids().len(), 5);
        assert_eq!(body.original_cfg().stmt_ids().len(), 4);
        assert_eq!(body.original_stmt(ret), Some(ret));
        assert_eq!(body.original_stmt(inserted), None);
    }
}
