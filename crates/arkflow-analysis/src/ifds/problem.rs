//! Dataflow problem definition

use super::icfg::{Icfg, MethodId, Node};
use arkflow_core::ir::MethodSignature;
use std::fmt::Debug;
use std::hash::Hash;

/// Maps a fact holding before an edge to the facts holding after it
pub trait FlowFunction<D> {
    fn compute_targets(&self, fact: &D) -> Vec<D>;
}

impl<D, F> FlowFunction<D> for F
where
    F: Fn(&D) -> Vec<D>,
{
    fn compute_targets(&self, fact: &D) -> Vec<D> {
        self(fact)
    }
}

/// Passes every fact through unchanged
pub struct Identity;

impl<D: Clone> FlowFunction<D> for Identity {
    fn compute_targets(&self, fact: &D) -> Vec<D> {
        vec![fact.clone()]
    }
}

/// Drops every fact
pub struct KillAll;

impl<D> FlowFunction<D> for KillAll {
    fn compute_targets(&self, _fact: &D) -> Vec<D> {
        Vec::new()
    }
}

pub type BoxedFlow<'a, D> = Box<dyn FlowFunction<D> + 'a>;

/// An IFDS problem over facts of type [`DataflowProblem::Fact`]
///
/// Flow functions must be distributive and must not depend on anything but
/// the IR they read: the solver evaluates them many times per edge.
pub trait DataflowProblem {
    type Fact: Clone + Eq + Hash + Debug;

    /// The "no information" fact, live at every reachable statement
    fn zero_value(&self) -> Self::Fact;

    fn entry_method(&self) -> &MethodSignature;

    /// Facts holding at the entry points. Must include the zero fact.
    fn initial_seeds(&self, _icfg: &Icfg<'_>, _entry: MethodId) -> Vec<Self::Fact> {
        vec![self.zero_value()]
    }

    /// Intraprocedural edge `src -> tgt`
    fn normal_flow<'a>(&'a self, icfg: &'a Icfg<'a>, src: Node, tgt: Node) -> BoxedFlow<'a, Self::Fact>;

    /// Call site into the start of `callee`
    fn call_flow<'a>(&'a self, icfg: &'a Icfg<'a>, call_site: Node, callee: MethodId) -> BoxedFlow<'a, Self::Fact>;

    /// Exit statement of `callee` back to a return site of the call
    fn exit_to_return_flow<'a>(
        &'a self,
        icfg: &'a Icfg<'a>,
        call_site: Node,
        callee: MethodId,
        exit: Node,
        return_site: Node,
    ) -> BoxedFlow<'a, Self::Fact>;

    /// Call site straight to its return site, for facts the call does not touch
    fn call_to_return_flow<'a>(
        &'a self,
        icfg: &'a Icfg<'a>,
        call_site: Node,
        return_site: Node,
    ) -> BoxedFlow<'a, Self::Fact>;
}
