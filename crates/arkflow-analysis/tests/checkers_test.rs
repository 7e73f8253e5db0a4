use arkflow_analysis::prelude::*;
use arkflow_core::ir::consts;
use arkflow_core::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

struct Program {
    class: ArkClass,
    others: Vec<ArkClass>,
    file: FileSignature,
}

impl Program {
    fn new() -> Self {
        let file = FileSignature::new("demo", "src/main.ts");
        let class = ArkClass::new(
            ClassSignature::new(consts::DEFAULT_CLASS_NAME, file.clone(), None),
            ClassCategory::Class,
        );
        Self {
            class,
            others: Vec::new(),
            file,
        }
    }

    fn add_class(&mut self, class: ArkClass) {
        self.others.push(class);
    }

    fn signature(&self, name: &str, params: Vec<MethodParameter>) -> MethodSignature {
        MethodSignature::new(
            self.class.signature().clone(),
            MethodSubSignature::new(name, params, Type::Unknown).with_static(true),
        )
    }

    fn add(&mut self, sig: &MethodSignature, locals: LocalTable, stmts: Vec<Stmt>) {
        self.class
            .add_method(ArkMethod::new(sig.clone()).with_body(body_of(locals, stmts)));
    }

    fn into_scene(self) -> Scene {
        let mut file = ArkFile::new(self.file);
        file.add_class(self.class);
        for class in self.others {
            file.add_class(class);
        }
        let mut scene = Scene::new("demo");
        scene.add_file(file);
        scene
    }
}

fn param(index: usize) -> Value {
    Ref::Parameter {
        index,
        param_type: Type::Unknown,
    }
    .into()
}

fn body_of(locals: LocalTable, stmts: Vec<Stmt>) -> ArkBody {
    let structured: Vec<StructuredStmt> = stmts.into_iter().map(StructuredStmt::Simple).collect();
    ArkBody::new(CfgBuilder::new().build(&structured).unwrap(), locals)
}

fn div(op1: impl Into<Value>, op2: impl Into<Value>) -> Expr {
    Expr::Binop {
        op1: op1.into(),
        op2: op2.into(),
        operator: BinaryOperator::Normal(NormalBinaryOperator::Div),
        ty: Type::Number,
    }
}

#[test]
fn test_division_by_local_holding_zero() {
    init_tracing();
    let mut program = Program::new();
    let main = program.signature(consts::DEFAULT_METHOD_NAME, vec![]);
    let mut locals = LocalTable::new();
    let x = locals.new_local("x", Type::Number);
    let y = locals.new_local("y", Type::Number);
    program.add(
        &main,
        locals,
        vec![
            Stmt::assign(x.clone(), Constant::number("0")),
            Stmt::assign(y, div(Constant::number("1"), x)),
        ],
    );
    let mut scene = program.into_scene();

    let report = Analyzer::default().run(&mut scene, Some(main)).unwrap();
    assert_eq!(report.div_by_zero.len(), 1);
    let finding = &report.div_by_zero[0];
    assert_eq!(finding.value, "1 / x");
    assert_eq!(finding.stmt, "y = 1 / x");
    assert!(report.undefined.is_empty());
}

#[test]
fn test_zero_argument_reaches_callee_division() {
    init_tracing();
    let mut program = Program::new();
    let scale = program.signature("scale", vec![MethodParameter::new("d", Type::Number)]);
    let main = program.signature(consts::DEFAULT_METHOD_NAME, vec![]);

    let mut callee_locals = LocalTable::new();
    let d = callee_locals.new_local("d", Type::Number);
    let r = callee_locals.new_local("r", Type::Number);
    program.add(
        &scale,
        callee_locals,
        vec![
            Stmt::assign(d.clone(), param(0)),
            Stmt::assign(r.clone(), div(Constant::number("10"), d)),
            Stmt::return_value(r),
        ],
    );

    let mut locals = LocalTable::new();
    let out = locals.new_local("out", Type::Number);
    program.add(
        &main,
        locals,
        vec![Stmt::assign(
            out,
            Expr::Invoke(InvokeExpr::static_call(scale.clone(), vec![Constant::number("0").into()])),
        )],
    );
    let scene = program.into_scene();

    let icfg = Icfg::new(&scene);
    let findings = DivByZeroChecker::new(main)
        .check(&icfg, SolverConfig::default())
        .unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].method, scale.to_string());
}

#[test]
fn test_undefined_flows_through_identity_function() {
    init_tracing();
    let mut program = Program::new();
    let f = program.signature("f", vec![MethodParameter::new("a", Type::Unknown)]);
    let main = program.signature(consts::DEFAULT_METHOD_NAME, vec![]);

    let mut callee_locals = LocalTable::new();
    let a = callee_locals.new_local("a", Type::Unknown);
    program.add(
        &f,
        callee_locals,
        vec![Stmt::assign(a.clone(), param(0)), Stmt::return_value(a)],
    );

    let mut locals = LocalTable::new();
    let b = locals.new_local("b", Type::Unknown);
    let c = locals.new_local("c", Type::Unknown);
    program.add(
        &main,
        locals,
        vec![
            Stmt::assign(
                b.clone(),
                Expr::Invoke(InvokeExpr::static_call(f.clone(), vec![Constant::undefined().into()])),
            ),
            Stmt::assign(c, b.clone()),
        ],
    );
    let scene = program.into_scene();

    let icfg = Icfg::new(&scene);
    let checker = UndefinedVariableChecker::new(main.clone());
    let result = IfdsSolver::new(&checker, &icfg).solve().unwrap();

    let return_site = icfg.node(&main, StmtId(1)).unwrap();
    assert!(result.holds_at(return_site, &UndefinedFact::Local(b)));

    let findings = checker.collect_findings(&icfg, &result);
    assert!(findings
        .iter()
        .any(|finding| finding.value == "b" && finding.method == main.to_string()));
    assert!(findings.iter().any(|finding| finding.value == "a" && finding.method == f.to_string()));
}

#[test]
fn test_iteration_guard_surfaces_through_pipeline() {
    let mut program = Program::new();
    let main = program.signature(consts::DEFAULT_METHOD_NAME, vec![]);
    let mut locals = LocalTable::new();
    let x = locals.new_local("x", Type::Number);
    program.add(&main, locals, vec![Stmt::assign(x, Constant::number("1"))]);
    let mut scene = program.into_scene();

    let mut config = AnalysisConfig::default();
    config.solver = SolverConfig::default().with_max_iterations(1);
    let err = Analyzer::new(config).run(&mut scene, Some(main)).unwrap_err();
    let root = err.root_cause().to_string();
    assert_eq!(root, "solver did not converge after 1 iterations");
}

fn counter_class(file: &FileSignature) -> (ClassSignature, FieldSignature) {
    let class_sig = ClassSignature::new("Counter", file.clone(), None);
    let field = FieldSignature::new("total", class_sig.clone(), Type::Number, false);
    (class_sig, field)
}

#[test]
fn test_field_of_argument_reaches_callee_parameter() {
    init_tracing();
    let mut program = Program::new();
    let (class_sig, total) = counter_class(&program.file);
    let mut counter = ArkClass::new(class_sig.clone(), ClassCategory::Class);
    counter.add_field(ArkField::new(total.clone()));
    program.add_class(counter);

    let read = program.signature("read", vec![MethodParameter::new("p", Type::class(class_sig.clone()))]);
    let main = program.signature(consts::DEFAULT_METHOD_NAME, vec![]);

    let mut callee_locals = LocalTable::new();
    let p = callee_locals.new_local("p", Type::class(class_sig.clone()));
    let v = callee_locals.new_local("v", Type::Number);
    program.add(
        &read,
        callee_locals,
        vec![
            Stmt::assign(p.clone(), param(0)),
            Stmt::assign(v.clone(), Ref::instance_field(p.clone(), total.clone())),
            Stmt::return_value(v),
        ],
    );

    let mut locals = LocalTable::new();
    let o = locals.new_local("o", Type::class(class_sig.clone()));
    let r = locals.new_local("r", Type::Number);
    program.add(
        &main,
        locals,
        vec![
            Stmt::assign(o.clone(), Expr::New { class_type: Type::class(class_sig) }),
            Stmt::assign(Ref::instance_field(o.clone(), total), Constant::undefined()),
            Stmt::assign(r, Expr::Invoke(InvokeExpr::static_call(read.clone(), vec![o.into()]))),
        ],
    );
    let scene = program.into_scene();

    let icfg = Icfg::new(&scene);
    let checker = UndefinedVariableChecker::new(main);
    let result = IfdsSolver::new(&checker, &icfg).solve().unwrap();

    let field_read = icfg.node(&read, StmtId(1)).unwrap();
    let on_param = UndefinedFact::InstanceField {
        base: p,
        field: "total".to_string(),
    };
    assert!(result.holds_at(field_read, &on_param));

    let findings = checker.collect_findings(&icfg, &result);
    let in_read: Vec<&Finding> = findings.iter().filter(|f| f.method == read.to_string()).collect();
    assert!(
        in_read.iter().any(|f| f.value.starts_with("p.<") && f.value.ends_with(".total>")),
        "{findings:?}"
    );
}

#[test]
fn test_field_set_through_this_returns_to_receiver() {
    init_tracing();
    let mut program = Program::new();
    let (class_sig, total) = counter_class(&program.file);
    let reset = MethodSignature::new(class_sig.clone(), MethodSubSignature::new("reset", vec![], Type::Void));

    let mut callee_locals = LocalTable::new();
    let this = callee_locals.new_local("this", Type::class(class_sig.clone()));
    let reset_body = body_of(
        callee_locals,
        vec![
            Stmt::assign(
                this.clone(),
                Ref::This {
                    ty: Type::class(class_sig.clone()),
                },
            ),
            Stmt::assign(Ref::instance_field(this, total.clone()), Constant::undefined()),
        ],
    );
    let mut counter = ArkClass::new(class_sig.clone(), ClassCategory::Class);
    counter.add_field(ArkField::new(total.clone()));
    counter.add_method(ArkMethod::new(reset.clone()).with_body(reset_body));
    program.add_class(counter);

    let main = program.signature(consts::DEFAULT_METHOD_NAME, vec![]);
    let mut locals = LocalTable::new();
    let o = locals.new_local("o", Type::class(class_sig.clone()));
    let v = locals.new_local("v", Type::Number);
    program.add(
        &main,
        locals,
        vec![
            Stmt::assign(o.clone(), Expr::New { class_type: Type::class(class_sig) }),
            Stmt::invoke(InvokeExpr::instance(o.clone(), reset, vec![])),
            Stmt::assign(v, Ref::instance_field(o.clone(), total)),
        ],
    );
    let scene = program.into_scene();

    let icfg = Icfg::new(&scene);
    let checker = UndefinedVariableChecker::new(main.clone());
    let result = IfdsSolver::new(&checker, &icfg).solve().unwrap();

    let after_call = icfg.node(&main, StmtId(2)).unwrap();
    let on_receiver = UndefinedFact::InstanceField {
        base: o,
        field: "total".to_string(),
    };
    assert!(result.holds_at(after_call, &on_receiver));

    let findings = checker.collect_findings(&icfg, &result);
    assert!(findings
        .iter()
        .any(|f| f.method == main.to_string() && f.value.starts_with("o.<") && f.value.ends_with(".total>")));
}
