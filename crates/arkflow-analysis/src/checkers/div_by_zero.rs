//! Possible division-by-zero checker
//!
//! A fact is a local that may hold a literal zero. Zero enters through
//! numeric literals and is carried by copies, casts, negation, arguments and
//! return values. Any `/` or `%` whose divisor is such a local, or a zero
//! literal itself, is reported.

use super::finding::Finding;
use crate::error::SolverResult;
use crate::ifds::{BoxedFlow, DataflowProblem, Icfg, Identity, IfdsResult, IfdsSolver, KillAll, MethodId, Node};
use arkflow_core::config::SolverConfig;
use arkflow_core::ir::{Expr, Local, MethodSignature, Stmt, StmtKind, UnaryOperator, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZeroFact {
    Zero,
    Local(Local),
}

/// Literal zero, possibly behind a cast or a minus sign
fn is_zero_literal(value: &Value) -> bool {
    match value {
        Value::Constant(c) => c.is_zero(),
        Value::Expr(expr) => match &**expr {
            Expr::Cast { op, .. }
            | Expr::Unop {
                op,
                operator: UnaryOperator::Neg,
            } => is_zero_literal(op),
            _ => false,
        },
        _ => false,
    }
}

/// Local whose value `value` carries over unchanged (up to sign)
fn carried_local(value: &Value) -> Option<&Local> {
    match value {
        Value::Local(local) => Some(local),
        Value::Expr(expr) => match &**expr {
            Expr::Cast { op, .. }
            | Expr::Unop {
                op,
                operator: UnaryOperator::Neg,
            } => carried_local(op),
            _ => None,
        },
        _ => None,
    }
}

fn def_local(stmt: &Stmt) -> Option<&Local> {
    stmt.get_def_local()
}

pub struct DivByZeroChecker {
    entry: MethodSignature,
}

impl DivByZeroChecker {
    pub fn new(entry: MethodSignature) -> Self {
        Self { entry }
    }

    pub fn check(&self, icfg: &Icfg<'_>, config: SolverConfig) -> SolverResult<Vec<Finding>> {
        let result = IfdsSolver::new(self, icfg).with_config(config).solve()?;
        Ok(self.collect_findings(icfg, &result))
    }

    /// Divisions whose divisor may be zero
    pub fn collect_findings(&self, icfg: &Icfg<'_>, result: &IfdsResult<ZeroFact>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in result.nodes() {
            let (Some(stmt), Some(facts)) = (icfg.stmt(node), result.facts_at(node)) else {
                continue;
            };
            for value in stmt.get_uses() {
                let Value::Expr(expr) = &value else {
                    continue;
                };
                let Expr::Binop { op2, operator, .. } = &**expr else {
                    continue;
                };
                if !operator.is_division() {
                    continue;
                }
                let zero_divisor = is_zero_literal(op2)
                    || carried_local(op2).is_some_and(|l| facts.contains(&ZeroFact::Local(l.clone())));
                if zero_divisor {
                    findings.push(Finding::new(
                        icfg,
                        node,
                        &value,
                        format!("divisor `{op2}` may be zero"),
                    ));
                }
            }
        }
        debug!(entry = %self.entry, findings = findings.len(), "division by zero check done");
        findings
    }
}

impl DataflowProblem for DivByZeroChecker {
    type Fact = ZeroFact;

    fn zero_value(&self) -> ZeroFact {
        ZeroFact::Zero
    }

    fn entry_method(&self) -> &MethodSignature {
        &self.entry
    }

    fn normal_flow<'a>(&'a self, icfg: &'a Icfg<'a>, src: Node, _tgt: Node) -> BoxedFlow<'a, ZeroFact> {
        let Some(stmt) = icfg.stmt(src) else {
            return Box::new(KillAll);
        };
        if icfg.is_parameter_assign(src) {
            return Box::new(Identity);
        }
        let StmtKind::Assign {
            left: Value::Local(def),
            right,
        } = &stmt.kind
        else {
            return Box::new(Identity);
        };
        let generates = is_zero_literal(right);
        let source = carried_local(right);

        Box::new(move |fact: &ZeroFact| -> Vec<ZeroFact> {
            match fact {
                ZeroFact::Zero if generates => vec![ZeroFact::Zero, ZeroFact::Local(def.clone())],
                ZeroFact::Zero => vec![ZeroFact::Zero],
                ZeroFact::Local(local) => {
                    let mut out = Vec::new();
                    if source == Some(local) {
                        out.push(ZeroFact::Local(def.clone()));
                    }
                    if local != def {
                        out.push(fact.clone());
                    }
                    out
                }
            }
        })
    }

    fn call_flow<'a>(&'a self, icfg: &'a Icfg<'a>, call_site: Node, callee: MethodId) -> BoxedFlow<'a, ZeroFact> {
        let Some(invoke) = icfg.invoke_at(call_site) else {
            return Box::new(KillAll);
        };
        let bindings: Vec<(&'a Value, Local)> = invoke
            .args
            .iter()
            .enumerate()
            .filter_map(|(i, arg)| Some((arg, icfg.parameter_local(callee, i)?)))
            .collect();

        Box::new(move |fact: &ZeroFact| -> Vec<ZeroFact> {
            let mut out = Vec::new();
            match fact {
                ZeroFact::Zero => {
                    out.push(ZeroFact::Zero);
                    for (arg, param) in &bindings {
                        if is_zero_literal(arg) {
                            out.push(ZeroFact::Local(param.clone()));
                        }
                    }
                }
                ZeroFact::Local(local) => {
                    for (arg, param) in &bindings {
                        if carried_local(arg) == Some(local) {
                            out.push(ZeroFact::Local(param.clone()));
                        }
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
        _callee: MethodId,
        exit: Node,
        _return_site: Node,
    ) -> BoxedFlow<'a, ZeroFact> {
        let (Some(call), Some(exit_stmt)) = (icfg.stmt(call_site), icfg.stmt(exit)) else {
            return Box::new(KillAll);
        };
        let Some(target) = def_local(call) else {
            return Box::new(move |fact: &ZeroFact| -> Vec<ZeroFact> {
                match fact {
                    ZeroFact::Zero => vec![ZeroFact::Zero],
                    ZeroFact::Local(_) => Vec::new(),
                }
            });
        };
        let returned = match &exit_stmt.kind {
            StmtKind::Return(value) => Some(value),
            _ => None,
        };
        let returns_zero = returned.is_some_and(is_zero_literal);
        let returned_local = returned.and_then(carried_local);

        Box::new(move |fact: &ZeroFact| -> Vec<ZeroFact> {
            match fact {
                ZeroFact::Zero if returns_zero => vec![ZeroFact::Zero, ZeroFact::Local(target.clone())],
                ZeroFact::Zero => vec![ZeroFact::Zero],
                ZeroFact::Local(local) if returned_local == Some(local) => vec![ZeroFact::Local(target.clone())],
                ZeroFact::Local(_) => Vec::new(),
            }
        })
    }

    fn call_to_return_flow<'a>(&'a self, icfg: &'a Icfg<'a>, call_site: Node, _return_site: Node) -> BoxedFlow<'a, ZeroFact> {
        let def = icfg.stmt(call_site).and_then(def_local);
        Box::new(move |fact: &ZeroFact| -> Vec<ZeroFact> {
            match fact {
                ZeroFact::Local(local) if def == Some(local) => Vec::new(),
                _ => vec![fact.clone()],
            }
        })
    }
}
