//! Synthesized entry point
//!
//! Whole-program analyses need a single entry. The dummy main calls every
//! entry method from a dispatch loop, so each may run any number of times in
//! any order:
//!
//! ```text
//! init:      count = 0; %cls0 = new C; ...
//! header:    if true != false          -> dispatch0 | return
//! dispatchI: if count == I             -> invokeI   | dispatchI+1 (last: header)
//! invokeI:   instanceinvoke %clsI.<m>(...) or staticinvoke <m>(...) -> header
//! return:    return
//! ```

use super::body::ArkBody;
use super::class::{ArkClass, ClassCategory};
use super::file::ArkFile;
use super::method::ArkMethod;
use super::scene::Scene;
use crate::error::IrResult;
use crate::graph::{BlockId, Cfg};
use crate::ir::consts::dummy;
use crate::ir::{
    ClassSignature, ConditionExpr, Constant, Expr, FileSignature, InvokeExpr, Local, LocalTable, MethodSignature,
    MethodSubSignature, RelationalBinaryOperator, Stmt, Type, Value,
};
use tracing::debug;

pub struct DummyMainCreator<'a> {
    scene: &'a mut Scene,
    entry_methods: Vec<MethodSignature>,
}

impl<'a> DummyMainCreator<'a> {
    /// Entries default to the top-level code of every project file
    pub fn new(scene: &'a mut Scene) -> Self {
        let entry_methods = scene
            .files()
            .filter(|f| !f.is_sdk())
            .filter_map(|f| f.default_class())
            .flat_map(|c| c.methods())
            .filter(|m| m.body().is_some() && m.signature().declaring_class.is_default())
            .map(|m| m.signature().clone())
            .collect();
        Self { scene, entry_methods }
    }

    pub fn with_entry_methods(mut self, entry_methods: Vec<MethodSignature>) -> Self {
        self.entry_methods = entry_methods;
        self
    }

    pub fn entry_methods(&self) -> &[MethodSignature] {
        &self.entry_methods
    }

    /// Build the dummy main, add it to the scene and return its signature
    pub fn create_dummy_main(self) -> IrResult<MethodSignature> {
        let file_sig = FileSignature::new(self.scene.project_name(), dummy::FILE_NAME);
        let class_sig = ClassSignature::new(dummy::CLASS_NAME, file_sig.clone(), None);
        let signature = MethodSignature::new(
            class_sig.clone(),
            MethodSubSignature::new(dummy::METHOD_NAME, Vec::new(), Type::Void).with_static(true),
        );

        let mut locals = LocalTable::new();
        let mut cfg = Cfg::new();
        cfg.set_declaring_method(signature.clone());

        let count = locals.new_local(dummy::COUNT_LOCAL, Type::Number);
        let init = cfg.new_block();
        let first = cfg.push_stmt(init, Stmt::assign(count.clone(), Constant::number("0")))?;
        cfg.set_starting_stmt(first);

        let receivers = self.create_receivers(&mut cfg, &mut locals, init)?;

        let ret = cfg.new_block();
        if self.entry_methods.is_empty() {
            cfg.link(init, ret)?;
        } else {
            let header = cfg.new_block();
            cfg.link(init, header)?;
            cfg.push_stmt(
                header,
                Stmt::if_stmt(ConditionExpr::new(
                    Constant::boolean(true).into(),
                    Constant::boolean(false).into(),
                    RelationalBinaryOperator::InEquality,
                )),
            )?;

            let dispatches: Vec<BlockId> = self.entry_methods.iter().map(|_| cfg.new_block()).collect();
            cfg.link(header, dispatches[0])?;
            cfg.link(header, ret)?;

            for (i, (entry, receiver)) in self.entry_methods.iter().zip(&receivers).enumerate() {
                let dispatch = dispatches[i];
                cfg.push_stmt(
                    dispatch,
                    Stmt::if_stmt(ConditionExpr::new(
                        count.clone().into(),
                        Constant::number(i.to_string()).into(),
                        RelationalBinaryOperator::Equality,
                    )),
                )?;

                let invoke_block = cfg.new_block();
                let args: Vec<Value> = entry
                    .sub
                    .parameters
                    .iter()
                    .enumerate()
                    .map(|(j, param)| locals.new_local(format!("%param{i}_{j}"), param.ty.clone()).into())
                    .collect();
                let invoke = match receiver {
                    Some(base) => InvokeExpr::instance(base.clone(), entry.clone(), args),
                    None => InvokeExpr::static_call(entry.clone(), args),
                };
                cfg.push_stmt(invoke_block, Stmt::invoke(invoke))?;

                cfg.link(dispatch, invoke_block)?;
                cfg.link(dispatch, dispatches.get(i + 1).copied().unwrap_or(header))?;
                cfg.link(invoke_block, header)?;
            }
        }
        cfg.push_stmt(ret, Stmt::return_void())?;
        cfg.validate()?;
        cfg.build_def_use_stmt(&mut locals);
        cfg.build_def_use_chain();

        debug!(entries = self.entry_methods.len(), blocks = cfg.block_count(), "created dummy main");

        let mut class = ArkClass::new(class_sig, ClassCategory::Class);
        class.add_method(ArkMethod::new(signature.clone()).with_body(ArkBody::new(cfg, locals)));
        let mut file = ArkFile::new(file_sig);
        file.add_class(class);
        self.scene.add_file(file);
        Ok(signature)
    }

    /// Allocate one receiver per instance entry in the init block
    fn create_receivers(&self, cfg: &mut Cfg, locals: &mut LocalTable, init: BlockId) -> IrResult<Vec<Option<Local>>> {
        let mut receivers = Vec::with_capacity(self.entry_methods.len());
        for (i, entry) in self.entry_methods.iter().enumerate() {
            if entry.is_static() || entry.declaring_class.is_default() {
                receivers.push(None);
                continue;
            }
            let class_type = Type::class(entry.declaring_class.clone());
            let receiver = locals.new_local(format!("%cls{i}"), class_type.clone());
            cfg.push_stmt(init, Stmt::assign(receiver.clone(), Expr::New { class_type }))?;
            receivers.push(Some(receiver));
        }
        Ok(receivers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::consts;
    use crate::ir::{MethodParameter, StmtKind};

    fn scene_with_entries() -> (Scene, Vec<MethodSignature>) {
        let file_sig = FileSignature::new("demo", "index.ets");
        let dflt_sig = ClassSignature::new(consts::DEFAULT_CLASS_NAME, file_sig.clone(), None);
        let page_sig = ClassSignature::new("Page", file_sig.clone(), None);

        let top = MethodSignature::new(
            dflt_sig.clone(),
            MethodSubSignature::new(consts::DEFAULT_METHOD_NAME, vec![], Type::Void),
        );
        let build = MethodSignature::new(
            page_sig.clone(),
            MethodSubSignature::new("build", vec![MethodParameter::new("n", Type::Number)], Type::Void),
        );

        let mut body_cfg = Cfg::new();
        let block = body_cfg.new_block();
        let ret = body_cfg.push_stmt(block, Stmt::return_void()).unwrap();
        body_cfg.set_starting_stmt(ret);

        let mut dflt = ArkClass::new(dflt_sig, ClassCategory::Class);
        dflt.add_method(ArkMethod::new(top.clone()).with_body(ArkBody::new(body_cfg, LocalTable::new())));
        let mut page = ArkClass::new(page_sig, ClassCategory::Struct);
        page.add_method(ArkMethod::new(build.clone()));

        let mut file = ArkFile::new(file_sig);
        file.add_class(dflt);
        file.add_class(page);
        let mut scene = Scene::new("demo");
        scene.add_file(file);
        (scene, vec![top, build])
    }

    #[test]
    fn test_default_entries_are_top_level_methods() {
        let (mut scene, entries) = scene_with_entries();
        let creator = DummyMainCreator::new(&mut scene);
        assert_eq!(creator.entry_methods(), &entries[..1]);
    }

    #[test]
    fn test_dispatch_loop_shape() {
        let (mut scene, entries) = scene_with_entries();
        let sig = DummyMainCreator::new(&mut scene)
            .with_entry_methods(entries.clone())
            .create_dummy_main()
            .unwrap();
        let main = scene.get_method(&sig).unwrap();
        let cfg = main.body().unwrap().cfg();
        // init, return, header, two dispatch blocks, two invoke blocks
        assert_eq!(cfg.block_count(), 7);
        assert!(cfg.validate().is_ok());

        let invokes: Vec<_> = cfg
            .stmts()
            .filter_map(|(_, s)| match &s.kind {
                StmtKind::Invoke(invoke) => Some(invoke.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(invokes.len(), 2);
        assert!(invokes[0].is_static());
        assert_eq!(invokes[1].base().map(|b| b.name.as_str()), Some("%cls1"));
        assert_eq!(invokes[1].args.len(), 1);

        let start = cfg.starting_stmt().unwrap();
        assert_eq!(cfg.stmt(start).unwrap().to_string(), "count = 0");
    }

    #[test]
    fn test_no_entries_links_init_to_return() {
        let mut scene = Scene::new("empty");
        let sig = DummyMainCreator::new(&mut scene).create_dummy_main().unwrap();
        let cfg = scene.get_method(&sig).unwrap().body().unwrap().cfg();
        assert_eq!(cfg.block_count(), 2);
        assert_eq!(cfg.return_stmts().len(), 1);
    }
}
