//! Possibly-undefined variable checker
//!
//! Tracks locals, static fields and instance fields that may hold
//! `undefined`. Static fields declared without an initializer start out
//! undefined; everything else becomes undefined by assignment or by flowing
//! through calls.

use super::finding::Finding;
use crate::error::SolverResult;
use crate::ifds::{BoxedFlow, DataflowProblem, Icfg, Identity, IfdsResult, IfdsSolver, KillAll, MethodId, Node};
use arkflow_core::config::SolverConfig;
use arkflow_core::ir::{ClassSignature, Local, LocalTable, MethodSignature, Ref, Stmt, StmtKind, Type, Value};
use std::iter;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UndefinedFact {
    Zero,
    Local(Local),
    StaticField { class: ClassSignature, field: String },
    InstanceField { base: Local, field: String },
}

impl UndefinedFact {
    /// Fact for `value` when it names a trackable place
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Local(local) => Some(Self::Local(local.clone())),
            Value::Ref(r) => match &**r {
                Ref::StaticField { field } => Some(Self::StaticField {
                    class: field.declaring_class.clone(),
                    field: field.name.clone(),
                }),
                Ref::InstanceField { base, field } => Some(Self::InstanceField {
                    base: base.clone(),
                    field: field.name.clone(),
                }),
                _ => None,
            },
            Value::Constant(_) | Value::Expr(_) => None,
        }
    }

    fn is_based_on(&self, local: &Local) -> bool {
        matches!(self, Self::InstanceField { base, .. } if base == local)
    }

    fn with_base(&self, base: &Local) -> Option<Self> {
        match self {
            Self::InstanceField { field, .. } => Some(Self::InstanceField {
                base: base.clone(),
                field: field.clone(),
            }),
            _ => None,
        }
    }
}

fn is_undefined(value: &Value, locals: &LocalTable) -> bool {
    match value {
        Value::Constant(c) => c.is_undefined(),
        other => matches!(other.get_type(locals), Type::Undefined),
    }
}

/// Whether `stmt` overwrites `fact`: its def, or a field of a redefined local
fn kills(stmt: &Stmt, fact: &UndefinedFact) -> bool {
    let Some(def) = stmt.get_def() else {
        return false;
    };
    UndefinedFact::of(def).as_ref() == Some(fact) || def.as_local().is_some_and(|l| fact.is_based_on(l))
}

pub struct UndefinedVariableChecker {
    entry: MethodSignature,
}

impl UndefinedVariableChecker {
    pub fn new(entry: MethodSignature) -> Self {
        Self { entry }
    }

    /// Solve from the entry method and report every read of a possibly undefined value
    pub fn check(&self, icfg: &Icfg<'_>, config: SolverConfig) -> SolverResult<Vec<Finding>> {
        let result = IfdsSolver::new(self, icfg).with_config(config).solve()?;
        Ok(self.collect_findings(icfg, &result))
    }

    pub fn collect_findings(&self, icfg: &Icfg<'_>, result: &IfdsResult<UndefinedFact>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in result.nodes() {
            let (Some(stmt), Some(facts)) = (icfg.stmt(node), result.facts_at(node)) else {
                continue;
            };
            if icfg.is_parameter_assign(node) {
                continue;
            }
            let mut reported: Vec<Value> = Vec::new();
            for value in stmt.get_uses() {
                let Some(fact) = UndefinedFact::of(&value) else {
                    continue;
                };
                if facts.contains(&fact) && !reported.contains(&value) {
                    findings.push(Finding::new(icfg, node, &value, format!("`{value}` may be undefined")));
                    reported.push(value);
                }
            }
        }
        debug!(entry = %self.entry, findings = findings.len(), "undefined variable check done");
        findings
    }

    fn uninitialized_statics(icfg: &Icfg<'_>, method: MethodId) -> Vec<UndefinedFact> {
        let Some(signature) = icfg.signature(method) else {
            return Vec::new();
        };
        let Some(class) = icfg.scene().get_class(&signature.declaring_class) else {
            return Vec::new();
        };
        class
            .static_fields()
            .filter(|f| !f.has_initializer())
            .map(|f| UndefinedFact::StaticField {
                class: signature.declaring_class.clone(),
                field: f.name().to_string(),
            })
            .collect()
    }
}

impl DataflowProblem for UndefinedVariableChecker {
    type Fact = UndefinedFact;

    fn zero_value(&self) -> UndefinedFact {
        UndefinedFact::Zero
    }

    fn entry_method(&self) -> &MethodSignature {
        &self.entry
    }

    fn initial_seeds(&self, icfg: &Icfg<'_>, entry: MethodId) -> Vec<UndefinedFact> {
        let mut seeds = vec![UndefinedFact::Zero];
        seeds.extend(Self::uninitialized_statics(icfg, entry));
        seeds
    }

    fn normal_flow<'a>(&'a self, icfg: &'a Icfg<'a>, src: Node, _tgt: Node) -> BoxedFlow<'a, UndefinedFact> {
        let (Some(stmt), Some(locals)) = (icfg.stmt(src), icfg.locals(src.method)) else {
            return Box::new(KillAll);
        };
        let StmtKind::Assign { left, right } = &stmt.kind else {
            return Box::new(Identity);
        };
        // `x = parameterN` only binds what the call flow already put on `x`
        if icfg.is_parameter_assign(src) {
            return Box::new(Identity);
        }
        let def = UndefinedFact::of(left);
        let generates = is_undefined(right, locals);
        let read: Vec<UndefinedFact> = iter::once(right.clone())
            .chain(right.get_uses())
            .filter_map(|v| UndefinedFact::of(&v))
            .collect();

        Box::new(move |fact: &UndefinedFact| -> Vec<UndefinedFact> {
            let mut out = Vec::new();
            if *fact == UndefinedFact::Zero {
                out.push(UndefinedFact::Zero);
                if generates {
                    out.extend(def.clone());
                }
                return out;
            }
            if read.contains(fact) {
                out.extend(def.clone());
            }
            if !kills(stmt, fact) {
                out.push(fact.clone());
            }
            out
        })
    }

    fn call_flow<'a>(&'a self, icfg: &'a Icfg<'a>, call_site: Node, callee: MethodId) -> BoxedFlow<'a, UndefinedFact> {
        let (Some(invoke), Some(locals)) = (icfg.invoke_at(call_site), icfg.locals(call_site.method)) else {
            return Box::new(KillAll);
        };
        let params: Vec<Option<Local>> = (0..invoke.args.len())
            .map(|i| icfg.parameter_local(callee, i))
            .collect();
        let undefined_args: Vec<bool> = invoke.args.iter().map(|a| is_undefined(a, locals)).collect();
        let callee_this = icfg.this_local(callee);
        let receiver = invoke.base();
        let ambient = Self::uninitialized_statics(icfg, callee);
        let args = &invoke.args;

        Box::new(move |fact: &UndefinedFact| -> Vec<UndefinedFact> {
            let mut out = Vec::new();
            match fact {
                UndefinedFact::Zero => {
                    out.push(UndefinedFact::Zero);
                    out.extend(ambient.iter().cloned());
                    for (param, undefined) in params.iter().zip(&undefined_args) {
                        if let Some(param) = param.as_ref().filter(|_| *undefined) {
                            out.push(UndefinedFact::Local(param.clone()));
                        }
                    }
                }
                UndefinedFact::StaticField { .. } => out.push(fact.clone()),
                UndefinedFact::Local(local) => {
                    for (arg, param) in args.iter().zip(&params) {
                        if let Some(param) = param.as_ref().filter(|_| arg.as_local() == Some(local)) {
                            out.push(UndefinedFact::Local(param.clone()));
                        }
                    }
                }
                UndefinedFact::InstanceField { base, .. } => {
                    for (arg, param) in args.iter().zip(&params) {
                        if let Some(param) = param.as_ref().filter(|_| arg.as_local() == Some(base)) {
                            out.extend(fact.with_base(param));
                        }
                    }
                    if let Some(this) = callee_this.as_ref().filter(|_| receiver == Some(base)) {
                        out.extend(fact.with_base(this));
                    }
                }
            }
            out
        })
    }

    fn exit_to_return_flow<'a>(
        &'a self,
        icfg: &'a Icfg<'a>,
        call_site: Node,
        callee: MethodId,
        exit: Node,
        _return_site: Node,
    ) -> BoxedFlow<'a, UndefinedFact> {
        let (Some(call), Some(invoke), Some(exit_stmt), Some(callee_locals)) = (
            icfg.stmt(call_site),
            icfg.invoke_at(call_site),
            icfg.stmt(exit),
            icfg.locals(callee),
        ) else {
            return Box::new(KillAll);
        };
        let returned = match &exit_stmt.kind {
            StmtKind::Return(value) => Some(value),
            _ => None,
        };
        let returns_undefined = returned.is_some_and(|v| is_undefined(v, callee_locals));
        let returned_fact = returned.and_then(UndefinedFact::of);
        let def = call.get_def().and_then(UndefinedFact::of);
        let callee_this = icfg.this_local(callee);
        let receiver = invoke.base();
        // formal parameter -> actual argument local
        let bindings: Vec<(Local, Local)> = invoke
            .args
            .iter()
            .enumerate()
            .filter_map(|(i, arg)| Some((icfg.parameter_local(callee, i)?, arg.as_local()?.clone())))
            .collect();

        Box::new(move |fact: &UndefinedFact| -> Vec<UndefinedFact> {
            let mut out = Vec::new();
            match fact {
                UndefinedFact::Zero => {
                    out.push(UndefinedFact::Zero);
                    if returns_undefined {
                        out.extend(def.clone());
                    }
                }
                UndefinedFact::StaticField { .. } => out.push(fact.clone()),
                UndefinedFact::Local(_) => {
                    if returned_fact.as_ref() == Some(fact) {
                        out.extend(def.clone());
                    }
                }
                UndefinedFact::InstanceField { base, .. } => {
                    if returned_fact.as_ref() == Some(fact) {
                        out.extend(def.clone());
                    }
                    if let Some(receiver) = receiver.filter(|_| callee_this.as_ref() == Some(base)) {
                        out.extend(fact.with_base(receiver));
                    }
                    for (param, arg) in &bindings {
                        if param == base {
                            out.extend(fact.with_base(arg));
                        }
                    }
                }
            }
            out
        })
    }

    fn call_to_return_flow<'a>(
        &'a self,
        icfg: &'a Icfg<'a>,
        call_site: Node,
        _return_site: Node,
    ) -> BoxedFlow<'a, UndefinedFact> {
        let Some(stmt) = icfg.stmt(call_site) else {
            return Box::new(KillAll);
        };
        Box::new(move |fact: &UndefinedFact| -> Vec<UndefinedFact> {
            if *fact != UndefinedFact::Zero && kills(stmt, fact) {
                Vec::new()
            } else {
                vec![fact.clone()]
            }
        })
    }
}
