//! Tabulation solver for IFDS problems
//!
//! A path edge `(d1, n, d2)` records that `d2` holds before `n` whenever
//! `d1` held at the start of `n`'s method. Callee effects are summarized per
//! entry fact and replayed at every call site reaching that fact, so each
//! method is analyzed once per entry fact rather than once per call.

use super::icfg::{Icfg, MethodId, Node};
use super::problem::DataflowProblem;
use crate::error::{SolverError, SolverResult};
use arkflow_core::config::SolverConfig;
use indexmap::IndexSet;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use tracing::{debug, trace, warn};

/// Facts holding before each reached statement
#[derive(Debug, Clone)]
pub struct IfdsResult<D> {
    facts: HashMap<Node, IndexSet<D>>,
    iterations: usize,
    path_edges: usize,
}

impl<D: Eq + Hash> IfdsResult<D> {
    pub fn facts_at(&self, node: Node) -> Option<&IndexSet<D>> {
        self.facts.get(&node)
    }

    pub fn holds_at(&self, node: Node, fact: &D) -> bool {
        self.facts.get(&node).is_some_and(|f| f.contains(fact))
    }

    /// Whether any path from the entry reaches `node`
    pub fn reached(&self, node: Node) -> bool {
        self.facts.contains_key(&node)
    }

    /// Reached statements in method then statement order
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.facts.keys().copied().collect();
        nodes.sort();
        nodes
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn path_edge_count(&self) -> usize {
        self.path_edges
    }
}

type PathEdge<D> = (D, Node, D);

struct SolverState<D> {
    path_edges: IndexSet<PathEdge<D>>,
    worklist: VecDeque<PathEdge<D>>,
    /// (callee, entry fact) -> (call site, caller's entry fact)
    incoming: HashMap<(MethodId, D), IndexSet<(Node, D)>>,
    /// (method, entry fact) -> (exit statement, exit fact)
    end_summary: HashMap<(MethodId, D), IndexSet<(Node, D)>>,
}

impl<D: Clone + Eq + Hash> SolverState<D> {
    fn new() -> Self {
        Self {
            path_edges: IndexSet::new(),
            worklist: VecDeque::new(),
            incoming: HashMap::new(),
            end_summary: HashMap::new(),
        }
    }

    fn propagate(&mut self, d1: D, node: Node, d2: D) {
        let edge = (d1, node, d2);
        if !self.path_edges.contains(&edge) {
            self.path_edges.insert(edge.clone());
            self.worklist.push_back(edge);
        }
    }
}

pub struct IfdsSolver<'a, P: DataflowProblem> {
    problem: &'a P,
    icfg: &'a Icfg<'a>,
    config: SolverConfig,
}

impl<'a, P: DataflowProblem> IfdsSolver<'a, P> {
    pub fn new(problem: &'a P, icfg: &'a Icfg<'a>) -> Self {
        Self {
            problem,
            icfg,
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Propagate facts from the entry method until no new path edge appears
    pub fn solve(&self) -> SolverResult<IfdsResult<P::Fact>> {
        let entry_sig = self.problem.entry_method();
        let entry = self.icfg.method_id(entry_sig).ok_or_else(|| SolverError::MissingEntry {
            method: entry_sig.to_string(),
        })?;
        let starts = self.icfg.start_points(entry);
        if starts.is_empty() {
            return Err(SolverError::MissingEntry {
                method: entry_sig.to_string(),
            });
        }

        let mut state = SolverState::new();
        for seed in self.problem.initial_seeds(self.icfg, entry) {
            for &start in &starts {
                state.propagate(seed.clone(), start, seed.clone());
            }
        }

        let mut iterations = 0;
        while let Some((d1, node, d2)) = state.worklist.pop_front() {
            iterations += 1;
            if iterations > self.config.max_iterations {
                warn!(
                    entry = %entry_sig,
                    iterations = self.config.max_iterations,
                    pending = state.worklist.len(),
                    "ifds solver did not converge"
                );
                return Err(SolverError::DidNotConverge {
                    iterations: self.config.max_iterations,
                });
            }

            let callees = self.icfg.callees(node);
            let is_exit = self.icfg.is_exit(node);
            if !callees.is_empty() {
                self.process_call(&mut state, &d1, node, &d2, &callees);
            } else if !is_exit {
                self.process_normal(&mut state, &d1, node, &d2);
            }
            if is_exit {
                self.process_exit(&mut state, &d1, node, &d2);
            }
        }

        let mut facts: HashMap<Node, IndexSet<P::Fact>> = HashMap::new();
        for (_, node, d2) in &state.path_edges {
            facts.entry(*node).or_default().insert(d2.clone());
        }
        debug!(
            entry = %entry_sig,
            iterations,
            path_edges = state.path_edges.len(),
            "ifds solver converged"
        );
        Ok(IfdsResult {
            facts,
            iterations,
            path_edges: state.path_edges.len(),
        })
    }

    fn process_normal(&self, state: &mut SolverState<P::Fact>, d1: &P::Fact, node: Node, d2: &P::Fact) {
        for succ in self.icfg.successors(node) {
            let flow = self.problem.normal_flow(self.icfg, node, succ);
            for d3 in flow.compute_targets(d2) {
                state.propagate(d1.clone(), succ, d3);
            }
        }
    }

    fn process_call(
        &self,
        state: &mut SolverState<P::Fact>,
        d1: &P::Fact,
        call_site: Node,
        d2: &P::Fact,
        callees: &[MethodId],
    ) {
        let return_sites = self.icfg.return_sites(call_site);
        for &callee in callees {
            let flow = self.problem.call_flow(self.icfg, call_site, callee);
            for d3 in flow.compute_targets(d2) {
                for start in self.icfg.start_points(callee) {
                    state.propagate(d3.clone(), start, d3.clone());
                }
                let key = (callee, d3);
                state
                    .incoming
                    .entry(key.clone())
                    .or_default()
                    .insert((call_site, d1.clone()));

                let summaries: Vec<(Node, P::Fact)> = state
                    .end_summary
                    .get(&key)
                    .map(|s| s.iter().cloned().collect())
                    .unwrap_or_default();
                for (exit, d4) in summaries {
                    self.apply_return(state, call_site, callee, exit, &d4, d1, &return_sites);
                }
            }
        }

        for &return_site in &return_sites {
            let flow = self.problem.call_to_return_flow(self.icfg, call_site, return_site);
            for d3 in flow.compute_targets(d2) {
                state.propagate(d1.clone(), return_site, d3);
            }
        }
    }

    fn process_exit(&self, state: &mut SolverState<P::Fact>, d1: &P::Fact, exit: Node, d2: &P::Fact) {
        let key = (exit.method, d1.clone());
        let inserted = state
            .end_summary
            .entry(key.clone())
            .or_default()
            .insert((exit, d2.clone()));
        if !inserted {
            return;
        }
        let callers: Vec<(Node, P::Fact)> = state
            .incoming
            .get(&key)
            .map(|c| c.iter().cloned().collect())
            .unwrap_or_default();
        for (call_site, caller_d1) in callers {
            trace!(exit = %exit, call_site = %call_site, "returning summary to caller");
            let return_sites = self.icfg.return_sites(call_site);
            self.apply_return(state, call_site, exit.method, exit, d2, &caller_d1, &return_sites);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_return(
        &self,
        state: &mut SolverState<P::Fact>,
        call_site: Node,
        callee: MethodId,
        exit: Node,
        exit_fact: &P::Fact,
        caller_d1: &P::Fact,
        return_sites: &[Node],
    ) {
        for &return_site in return_sites {
            let flow = self
                .problem
                .exit_to_return_flow(self.icfg, call_site, callee, exit, return_site);
            for d5 in flow.compute_targets(exit_fact) {
                state.propagate(caller_d1.clone(), return_site, d5);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ifds::problem::{BoxedFlow, Identity};
    use arkflow_core::prelude::*;

    /// Counts loop iterations up to `cap`; `None` never stops counting
    struct LoopCounter {
        entry: MethodSignature,
        cap: Option<u32>,
    }

    impl DataflowProblem for LoopCounter {
        type Fact = u32;

        fn zero_value(&self) -> u32 {
            0
        }

        fn entry_method(&self) -> &MethodSignature {
            &self.entry
        }

        fn normal_flow<'a>(&'a self, _icfg: &'a Icfg<'a>, _src: Node, _tgt: Node) -> BoxedFlow<'a, u32> {
            let cap = self.cap;
            Box::new(move |d: &u32| -> Vec<u32> {
                let next = d + 1;
                match cap {
                    Some(cap) if next > cap => vec![*d],
                    _ => vec![*d, next],
                }
            })
        }

        fn call_flow<'a>(&'a self, _icfg: &'a Icfg<'a>, _call: Node, _callee: MethodId) -> BoxedFlow<'a, u32> {
            Box::new(Identity)
        }

        fn exit_to_return_flow<'a>(
            &'a self,
            _icfg: &'a Icfg<'a>,
            _call: Node,
            _callee: MethodId,
            _exit: Node,
            _ret: Node,
        ) -> BoxedFlow<'a, u32> {
            Box::new(Identity)
        }

        fn call_to_return_flow<'a>(&'a self, _icfg: &'a Icfg<'a>, _call: Node, _ret: Node) -> BoxedFlow<'a, u32> {
            Box::new(Identity)
        }
    }

    fn loop_scene() -> (Scene, MethodSignature) {
        let file = FileSignature::new("demo", "loop.ts");
        let class_sig = ClassSignature::new("%dflt", file.clone(), None);
        let sig = MethodSignature::new(class_sig.clone(), MethodSubSignature::new("spin", vec![], Type::Void));
        let mut locals = LocalTable::new();
        let i = locals.new_local("i", Type::Number);
        let body = vec![
            StructuredStmt::Simple(Stmt::assign(i.clone(), Constant::number("0"))),
            StructuredStmt::While {
                condition: ConditionExpr::new(
                    i.clone().into(),
                    Constant::number("10").into(),
                    RelationalBinaryOperator::LessThan,
                ),
                body: vec![StructuredStmt::Simple(Stmt::assign(
                    i.clone(),
                    Expr::Binop {
                        op1: i.into(),
                        op2: Constant::number("1").into(),
                        operator: BinaryOperator::Normal(NormalBinaryOperator::Add),
                        ty: Type::Number,
                    },
                ))],
            },
        ];
        let cfg = CfgBuilder::new().build(&body).unwrap();
        let mut class = ArkClass::new(class_sig, ClassCategory::Class);
        class.add_method(ArkMethod::new(sig.clone()).with_body(ArkBody::new(cfg, locals)));
        let mut ark_file = ArkFile::new(file);
        ark_file.add_class(class);
        let mut scene = Scene::new("demo");
        scene.add_file(ark_file);
        (scene, sig)
    }

    #[test]
    fn test_bounded_domain_converges() {
        let (scene, entry) = loop_scene();
        let icfg = Icfg::new(&scene);
        let problem = LoopCounter { entry, cap: Some(3) };
        let result = IfdsSolver::new(&problem, &icfg).solve().unwrap();

        let method = icfg.method_id(problem.entry_method()).unwrap();
        let exit = icfg.exit_points(method)[0];
        let at_exit = result.facts_at(exit).unwrap();
        for fact in 0..=3 {
            assert!(at_exit.contains(&fact), "fact {fact} should reach the exit");
        }
        assert!(!at_exit.contains(&4));
        assert!(result.iterations() >= result.path_edge_count());
    }

    #[test]
    fn test_unbounded_domain_hits_iteration_guard() {
        let (scene, entry) = loop_scene();
        let icfg = Icfg::new(&scene);
        let problem = LoopCounter { entry, cap: None };
        let err = IfdsSolver::new(&problem, &icfg)
            .with_config(SolverConfig::default().with_max_iterations(200))
            .solve()
            .unwrap_err();
        assert_eq!(err, SolverError::DidNotConverge { iterations: 200 });
    }

    #[test]
    fn test_missing_entry() {
        let (scene, _) = loop_scene();
        let icfg = Icfg::new(&scene);
        let problem = LoopCounter {
            entry: MethodSignature::from_name("absent"),
            cap: Some(1),
        };
        let err = IfdsSolver::new(&problem, &icfg).solve().unwrap_err();
        assert!(matches!(err, SolverError::MissingEntry { .. }));
    }

    proptest::proptest! {
        #[test]
        fn test_exit_facts_are_exactly_the_capped_range(cap in 0u32..12) {
            let (scene, entry) = loop_scene();
            let icfg = Icfg::new(&scene);
            let problem = LoopCounter { entry, cap: Some(cap) };
            let result = IfdsSolver::new(&problem, &icfg).solve().unwrap();

            let method = icfg.method_id(problem.entry_method()).unwrap();
            let exit = icfg.exit_points(method)[0];
            let mut at_exit: Vec<u32> = result.facts_at(exit).unwrap().iter().copied().collect();
            at_exit.sort_unstable();
            proptest::prop_assert_eq!(at_exit, (0..=cap).collect::<Vec<_>>());
        }
    }
}
