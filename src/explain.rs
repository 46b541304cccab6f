//! Proof-forest maintenance and explanation extraction.
//!
//! Every non-root node carries an edge to the partner it was directly
//! merged with, tagged with the justification of that merge. Following the
//! edges from any node reaches its class root. A congruence edge recurses
//! into the argument pairs; each such pair shares a root and therefore a
//! least common ancestor in the forest, and only the edges up to the LCA
//! are needed.

use crate::egraph::EGraph;
use crate::node::ProofEdge;
use crate::{Id, Term};

/// Why two nodes were directly merged.
///
/// `J` is the caller's opaque token type; [`EGraph::explain`] and
/// [`EGraph::explain_eq`] collect the tokens of the external merges a
/// derived equality rests on. Axioms justify themselves and contribute no
/// token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Justification<J> {
    /// Self-justifying (definitional) merge.
    Axiom,
    /// The two nodes are congruent: same declaration, argument classes
    /// pairwise equal (up to swapping for a commutative declaration).
    Congruence {
        /// Whether the declaration is commutative, which permits the
        /// crosswise argument pairing.
        commutative: bool,
    },
    /// A merge asserted from outside, carrying the caller's token.
    External(J),
}

impl<J> Justification<J> {
    /// Is this a congruence edge?
    pub fn is_congruence(&self) -> bool {
        matches!(self, Justification::Congruence { .. })
    }

    /// Translate the external token, if any, through `f`.
    pub fn map<K>(&self, f: impl FnOnce(&J) -> K) -> Justification<K> {
        match self {
            Justification::Axiom => Justification::Axiom,
            Justification::Congruence { commutative } => Justification::Congruence {
                commutative: *commutative,
            },
            Justification::External(j) => Justification::External(f(j)),
        }
    }
}

impl<T: Term, J> EGraph<T, J> {
    /// Record the proof edge for a merge of `n1` (absorbed side) into
    /// `n2`: reverse the edges along `n1`'s path to its root so the forest
    /// stays rooted, then point `n1` at `n2`.
    pub(crate) fn merge_justification(&mut self, n1: Id, n2: Id, j: Justification<J>) {
        debug_assert!(self.node(self.node(n1).root).proof.is_none());
        debug_assert!(self.node(self.node(n2).root).proof.is_none());
        self.reverse_proof_path(n1);
        self.node_mut(n1).proof = Some(ProofEdge {
            target: n2,
            justification: j,
        });
    }

    /// Undo [`merge_justification`](EGraph::merge_justification): cut the
    /// edge out of `n1` and re-reverse the path so `n1`'s old root is the
    /// terminus again.
    pub(crate) fn unmerge_justification(&mut self, n1: Id) {
        debug_assert!(self.node(n1).proof.is_some());
        self.node_mut(n1).proof = None;
        let r1 = self.node(n1).root;
        self.reverse_proof_path(r1);
    }

    /// Flip the direction of every edge on the path from `n` to its
    /// terminus, carrying the justifications along.
    fn reverse_proof_path(&mut self, mut n: Id) {
        let mut carried: Option<ProofEdge<J>> = None;
        loop {
            let outgoing = self.node_mut(n).proof.take();
            self.node_mut(n).proof = carried;
            match outgoing {
                Some(edge) => {
                    carried = Some(ProofEdge {
                        target: n,
                        justification: edge.justification,
                    });
                    n = edge.target;
                }
                None => break,
            }
        }
    }
}

impl<T: Term, J: Clone> EGraph<T, J> {
    /// Collect the tokens justifying the current conflict into `out`.
    ///
    /// Only meaningful while [`inconsistent`](EGraph::inconsistent) is
    /// true. The conflict's two nodes are explained up to their respective
    /// roots, plus the offending merge itself.
    pub fn explain(&mut self, out: &mut Vec<J>) {
        debug_assert!(self.inconsistent);
        let (n1, n2, j) = self
            .conflict
            .clone()
            .expect("explain without a recorded conflict");
        self.begin_explain();
        self.push_todo_path(n1);
        self.push_todo_path(n2);
        self.explain_step(out, n1, n2, &j);
        self.explain_todo(out);
        self.end_explain();
    }

    /// Collect the tokens justifying `a == b` into `out`.
    ///
    /// `a` and `b` must be in the same class.
    pub fn explain_eq(&mut self, out: &mut Vec<J>, a: Id, b: Id) {
        debug_assert_eq!(self.node(a).root, self.node(b).root);
        self.begin_explain();
        let lca = self.find_lca(a, b);
        self.push_to_lca(a, lca);
        self.push_to_lca(b, lca);
        self.explain_todo(out);
        self.end_explain();
    }

    fn begin_explain(&mut self) {
        debug_assert!(self.todo.is_empty());
    }

    fn end_explain(&mut self) {
        for i in 0..self.todo.len() {
            let n = self.todo[i];
            self.node_mut(n).mark1 = false;
        }
        self.todo.clear();
    }

    /// Drain the queue, expanding each enqueued node's outgoing edge once.
    fn explain_todo(&mut self, out: &mut Vec<J>) {
        let mut i = 0;
        while i < self.todo.len() {
            let n = self.todo[i];
            i += 1;
            if self.node(n).mark1 {
                continue;
            }
            let Some(edge) = self.node(n).proof.clone() else {
                continue;
            };
            self.node_mut(n).mark1 = true;
            self.explain_step(out, n, edge.target, &edge.justification);
        }
    }

    fn explain_step(&mut self, out: &mut Vec<J>, a: Id, b: Id, j: &Justification<J>) {
        match j {
            Justification::Axiom => {}
            Justification::External(token) => out.push(token.clone()),
            Justification::Congruence { commutative } => {
                self.push_congruence(a, b, *commutative)
            }
        }
    }

    /// A congruence `a == b` reduces to the equalities of the argument
    /// pairs; a commutative declaration pairs crosswise when that is how
    /// the roots line up.
    fn push_congruence(&mut self, a: Id, b: Id, commutative: bool) {
        debug_assert_eq!(self.node(a).expr.decl(), self.node(b).expr.decl());
        debug_assert_eq!(self.node(a).args.len(), self.node(b).args.len());
        if commutative {
            let (a0, a1) = (self.node(a).args[0], self.node(a).args[1]);
            let (b0, b1) = (self.node(b).args[0], self.node(b).args[1]);
            if self.node(a0).root == self.node(b1).root && self.node(a1).root == self.node(b0).root
            {
                self.push_lca(a0, b1);
                self.push_lca(a1, b0);
                return;
            }
        }
        for i in 0..self.node(a).args.len() {
            let ai = self.node(a).args[i];
            let bi = self.node(b).args[i];
            self.push_lca(ai, bi);
        }
    }

    fn push_lca(&mut self, a: Id, b: Id) {
        let lca = self.find_lca(a, b);
        self.push_to_lca(a, lca);
        self.push_to_lca(b, lca);
    }

    /// The least common ancestor of `a` and `b` in their class's proof
    /// forest: mark every ancestor of `a`, then walk up from `b` until a
    /// marked node appears.
    fn find_lca(&mut self, a: Id, b: Id) -> Id {
        debug_assert_eq!(self.node(a).root, self.node(b).root);
        let mut n = a;
        loop {
            self.node_mut(n).mark2 = true;
            match self.node(n).target() {
                Some(t) => n = t,
                None => break,
            }
        }
        let mut lca = b;
        while !self.node(lca).mark2 {
            lca = self
                .node(lca)
                .target()
                .expect("LCA search escaped the proof forest");
        }
        let mut n = a;
        loop {
            self.node_mut(n).mark2 = false;
            match self.node(n).target() {
                Some(t) => n = t,
                None => break,
            }
        }
        lca
    }

    fn push_to_lca(&mut self, mut n: Id, lca: Id) {
        while n != lca {
            self.todo.push(n);
            n = self
                .node(n)
                .target()
                .expect("node does not reach its LCA");
        }
    }

    /// Enqueue the whole path from `n` to its terminus.
    fn push_todo_path(&mut self, mut n: Id) {
        loop {
            self.todo.push(n);
            match self.node(n).target() {
                Some(t) => n = t,
                None => break,
            }
        }
    }
}
