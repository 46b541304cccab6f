use crate::explain::Justification;
use crate::{Id, TheoryId, TheoryVar};

/// An edge of the proof forest: the partner this node was directly merged
/// with, and why.
#[derive(Debug, Clone)]
pub(crate) struct ProofEdge<J> {
    pub target: Id,
    pub justification: Justification<J>,
}

/// One occurrence of a term inside the e-graph.
///
/// `root` and `next` implement the union-find: `root` points at the class
/// representative, `next` closes the class into a circular list.
/// `class_size` and `parents` are only meaningful on roots.
#[derive(Debug, Clone)]
pub(crate) struct ENode<T, J> {
    pub expr: T,
    pub args: Vec<Id>,
    pub root: Id,
    pub next: Id,
    pub class_size: u32,
    pub parents: Vec<Id>,
    pub proof: Option<ProofEdge<J>>,
    pub th_vars: Vec<(TheoryId, TheoryVar)>,
    pub merge_enabled: bool,
    /// Set when this node was registered in its argument roots' parent
    /// lists, so undoing the node knows to pop those entries.
    pub children_registered: bool,
    pub interpreted: bool,
    // transient bits: worklist dedup and LCA search
    pub mark1: bool,
    pub mark2: bool,
}

impl<T, J> ENode<T, J> {
    pub fn new(expr: T, args: Vec<Id>, id: Id) -> Self {
        ENode {
            expr,
            args,
            root: id,
            next: id,
            class_size: 1,
            parents: Vec::new(),
            proof: None,
            th_vars: Vec::new(),
            merge_enabled: true,
            children_registered: false,
            interpreted: false,
            mark1: false,
            mark2: false,
        }
    }

    pub fn target(&self) -> Option<Id> {
        self.proof.as_ref().map(|e| e.target)
    }

    pub fn th_var(&self, theory: TheoryId) -> Option<TheoryVar> {
        self.th_vars
            .iter()
            .find(|(t, _)| *t == theory)
            .map(|&(_, v)| v)
    }

    pub fn add_th_var(&mut self, theory: TheoryId, v: TheoryVar) {
        debug_assert!(self.th_var(theory).is_none());
        self.th_vars.push((theory, v));
    }

    pub fn replace_th_var(&mut self, theory: TheoryId, v: TheoryVar) {
        let slot = self
            .th_vars
            .iter_mut()
            .find(|(t, _)| *t == theory)
            .expect("no attachment to replace");
        slot.1 = v;
    }

    pub fn del_th_var(&mut self, theory: TheoryId) {
        let pos = self
            .th_vars
            .iter()
            .position(|(t, _)| *t == theory)
            .expect("no attachment to remove");
        self.th_vars.remove(pos);
    }
}
