//! The trail: push/pop scoping by logging every mutation and undoing the
//! log in reverse.

use std::mem;

use log::debug;

use crate::egraph::EGraph;
use crate::util::two_mut;
use crate::{Id, Term, TheoryId, TheoryVar};

/// One entry of the trail. Each mutating operation appends the records
/// needed to reverse it; [`EGraph::pop`] consumes them back to the scope
/// mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateRecord {
    /// The most recent e-node was created.
    AddNode,
    /// `merge_enabled` was flipped on this node.
    ToggleMerge(Id),
    /// Root `r1` was absorbed through node `n1`; the surviving root had
    /// `r2_parents` parents before the absorbed ones were appended.
    SetParent { r1: Id, n1: Id, r2_parents: usize },
    /// A theory attachment was added to `node` (and possibly propagated to
    /// its root).
    AddThVar { node: Id, theory: TheoryId },
    /// The attachment on `node` was overwritten; `old` restores it.
    ReplaceThVar {
        node: Id,
        theory: TheoryId,
        old: TheoryVar,
    },
    /// A literal propagation was queued.
    NewLit,
    /// A theory event was queued.
    NewThEq,
    /// Snapshot of the literal queue's read cursor.
    NewLitsQhead(usize),
    /// Snapshot of the theory queue's read cursor.
    NewThEqsQhead(usize),
    /// The graph became inconsistent.
    Inconsistent,
}

impl<T: Term, J> EGraph<T, J> {
    /// Open a backtracking scope.
    ///
    /// Scopes are cheap: no work happens until the next mutation
    /// materialises the pending scopes on the trail.
    pub fn push(&mut self) {
        self.pending_scopes += 1;
    }

    /// Materialise any pending scopes: record the trail mark for each and
    /// snapshot both event-queue cursors.
    pub(crate) fn force_push(&mut self) {
        if self.pending_scopes == 0 {
            return;
        }
        while self.pending_scopes > 0 {
            self.pending_scopes -= 1;
            self.scopes.push(self.updates.len());
        }
        self.updates
            .push(UpdateRecord::NewThEqsQhead(self.new_th_eqs_qhead));
        self.updates
            .push(UpdateRecord::NewLitsQhead(self.new_lits_qhead));
        debug_assert!(self.new_lits_qhead <= self.new_lits.len());
        debug_assert!(self.new_th_eqs_qhead <= self.new_th_eqs.len());
    }

    /// The number of open scopes.
    pub fn num_scopes(&self) -> usize {
        self.pending_scopes + self.scopes.len()
    }

    /// Undo everything done since the matching [`push`](EGraph::push),
    /// `num_scopes` levels up.
    ///
    /// Afterwards the graph is observably identical to its state just
    /// before that `push`: nodes, roots, class rings, table contents, both
    /// event queues and cursors, and the inconsistency flag.
    pub fn pop(&mut self, num_scopes: usize) {
        if num_scopes <= self.pending_scopes {
            self.pending_scopes -= num_scopes;
            return;
        }
        let num_scopes = num_scopes - self.pending_scopes;
        self.pending_scopes = 0;
        let old_lim = self
            .scopes
            .len()
            .checked_sub(num_scopes)
            .expect("pop beyond the outermost scope");
        let num_updates = self.scopes[old_lim];
        debug!(
            "pop {} scopes, {} updates",
            num_scopes,
            self.updates.len() - num_updates
        );
        for i in (num_updates..self.updates.len()).rev() {
            match self.updates[i] {
                UpdateRecord::AddNode => self.undo_node(),
                UpdateRecord::ToggleMerge(n) => {
                    let enabled = !self.node(n).merge_enabled;
                    self.node_mut(n).merge_enabled = enabled;
                    if enabled {
                        self.reindex(n);
                    } else {
                        self.deindex(n);
                    }
                }
                UpdateRecord::SetParent { r1, n1, r2_parents } => {
                    self.undo_eq(r1, n1, r2_parents)
                }
                UpdateRecord::AddThVar { node, theory } => self.undo_add_th_var(node, theory),
                UpdateRecord::ReplaceThVar { node, theory, old } => {
                    self.node_mut(node).replace_th_var(theory, old)
                }
                UpdateRecord::NewLit => {
                    self.new_lits.pop();
                }
                UpdateRecord::NewThEq => {
                    self.new_th_eqs.pop();
                }
                UpdateRecord::NewLitsQhead(q) => self.new_lits_qhead = q,
                UpdateRecord::NewThEqsQhead(q) => self.new_th_eqs_qhead = q,
                UpdateRecord::Inconsistent => {
                    self.inconsistent = false;
                    self.conflict = None;
                }
            }
        }
        self.updates.truncate(num_updates);
        self.scopes.truncate(old_lim);
        self.worklist.clear();
        debug_assert!(self.new_lits_qhead <= self.new_lits.len());
        debug_assert!(self.new_th_eqs_qhead <= self.new_th_eqs.len());
    }

    /// Destroy the most recently created e-node.
    fn undo_node(&mut self) {
        let id = Id::from(self.nodes.len() - 1);
        if !self.node(id).args.is_empty() && !self.node(id).expr.is_eq() {
            let sig = self.signature(id);
            self.table.erase(&sig, id);
        }
        // later appends to the parent lists have already been undone, so
        // this node's registrations sit at their tails
        if self.node(id).children_registered {
            for i in 0..self.node(id).args.len() {
                let a = self.node(id).args[i];
                let r = self.node(a).root;
                let popped = self.node_mut(r).parents.pop();
                debug_assert_eq!(popped, Some(id));
            }
        }
        let node = self.nodes.pop().expect("undo_node on an empty arena");
        self.expr2node.remove(&node.expr);
    }

    /// Reverse a merge: split the class rings, restore the absorbed root,
    /// and re-index the parents under their old signatures.
    fn undo_eq(&mut self, r1: Id, n1: Id, r2_parents: usize) {
        let r2 = self.node(r1).root;
        debug_assert_ne!(r1, r2);
        let (a, b) = two_mut(&mut self.nodes, usize::from(r1), usize::from(r2));
        b.class_size -= a.class_size;
        mem::swap(&mut a.next, &mut b.next);
        // the appended parents still carry merged-root signatures
        for i in r2_parents..self.node(r2).parents.len() {
            let p = self.node(r2).parents[i];
            self.deindex(p);
        }
        let mut c = r1;
        loop {
            self.node_mut(c).root = r1;
            c = self.node(c).next;
            if c == r1 {
                break;
            }
        }
        // some may be congruent again in the restored state; the occupant
        // wins, as it did originally
        for i in r2_parents..self.node(r2).parents.len() {
            let p = self.node(r2).parents[i];
            self.reindex(p);
        }
        self.node_mut(r2).parents.truncate(r2_parents);
        self.unmerge_justification(n1);
    }

    fn undo_add_th_var(&mut self, n: Id, theory: TheoryId) {
        let v = self.node(n).th_var(theory);
        debug_assert!(v.is_some());
        self.node_mut(n).del_th_var(theory);
        let root = self.node(n).root;
        // the same record covers the copy propagated onto the root
        if root != n && self.node(root).th_var(theory) == v {
            self.node_mut(root).del_th_var(theory);
        }
    }
}
