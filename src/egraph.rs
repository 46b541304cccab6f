use std::fmt::{self, Debug};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::trace;

use crate::node::ENode;
use crate::table::{CongruenceTable, Signature};
use crate::undo::UpdateRecord;
use crate::util::{two_mut, HashMap};
use crate::{Id, Justification, Term, TheoryEvent, TheoryId, TheoryVar};

/// A cloneable cancellation flag shared between the driver and the e-graph.
///
/// [`EGraph::propagate`] consults the flag once per worklist wave and bails
/// out when it is set. Partial propagation is safe: completed merges are
/// already reflected in the congruence table, and the remaining worklist is
/// regenerated by later merges.
#[derive(Debug, Clone, Default)]
pub struct Limit(Arc<AtomicBool>);

impl Limit {
    /// Ask running propagation loops to stop at the next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Has [`cancel`](Limit::cancel) been called?
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// A literal propagation queued for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Literal {
    /// The boolean node to assert.
    pub node: Id,
    /// True when `node` is an equality atom whose two sides merged, false
    /// when `node` was dragged into the `true`/`false` class by congruence.
    pub is_equality: bool,
}

/// Running counters exported to the driver's statistics display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// Merges performed (including congruence-discovered ones).
    pub merges: u64,
    /// Conflicts between distinct interpreted values.
    pub conflicts: u64,
    /// Literal propagations from boolean-class merges.
    pub literals: u64,
    /// Equality atoms propagated true.
    pub equalities: u64,
    /// Theory equality events.
    pub theory_eqs: u64,
    /// Theory disequality events.
    pub theory_diseqs: u64,
}

/// An e-graph whose equivalence classes are closed under congruence, with
/// trail-based backtracking and proof production.
///
/// `T` is the caller's term type (see [`Term`]); `J` is the caller's opaque
/// justification-token type, echoed back by [`explain`](EGraph::explain)
/// and [`explain_eq`](EGraph::explain_eq).
pub struct EGraph<T: Term, J> {
    pub(crate) nodes: Vec<ENode<T, J>>,
    pub(crate) expr2node: HashMap<T, Id>,
    pub(crate) table: CongruenceTable<T::Decl, T::Sort>,
    /// The trail: every mutation since the outermost materialised scope.
    pub(crate) updates: Vec<UpdateRecord>,
    /// Trail lengths at each materialised scope.
    pub(crate) scopes: Vec<usize>,
    /// Scopes pushed but not yet materialised by a mutation.
    pub(crate) pending_scopes: usize,
    pub(crate) worklist: Vec<Id>,
    pub(crate) new_lits: Vec<Literal>,
    pub(crate) new_lits_qhead: usize,
    pub(crate) new_th_eqs: Vec<TheoryEvent<T>>,
    pub(crate) new_th_eqs_qhead: usize,
    diseq_theories: Vec<bool>,
    pub(crate) inconsistent: bool,
    pub(crate) conflict: Option<(Id, Id, Justification<J>)>,
    /// Scratch queue for explanation extraction.
    pub(crate) todo: Vec<Id>,
    limit: Limit,
    stats: Stats,
}

impl<T: Term, J> Default for EGraph<T, J> {
    fn default() -> Self {
        EGraph {
            nodes: Vec::new(),
            expr2node: HashMap::default(),
            table: CongruenceTable::default(),
            updates: Vec::new(),
            scopes: Vec::new(),
            pending_scopes: 0,
            worklist: Vec::new(),
            new_lits: Vec::new(),
            new_lits_qhead: 0,
            new_th_eqs: Vec::new(),
            new_th_eqs_qhead: 0,
            diseq_theories: Vec::new(),
            inconsistent: false,
            conflict: None,
            todo: Vec::new(),
            limit: Limit::default(),
            stats: Stats::default(),
        }
    }
}

impl<T: Term, J> EGraph<T, J> {
    /// An empty e-graph.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn node(&self, id: Id) -> &ENode<T, J> {
        &self.nodes[usize::from(id)]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: Id) -> &mut ENode<T, J> {
        &mut self.nodes[usize::from(id)]
    }

    /// The number of live e-nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is the e-graph empty?
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The class representative of `id`.
    pub fn find(&self, id: Id) -> Id {
        self.node(id).root
    }

    /// The node previously created for `expr`, if any.
    pub fn lookup(&self, expr: &T) -> Option<Id> {
        self.expr2node.get(expr).copied()
    }

    /// The term a node was created for.
    pub fn term(&self, id: Id) -> &T {
        &self.node(id).expr
    }

    /// The argument nodes of `id`.
    pub fn args(&self, id: Id) -> &[Id] {
        &self.node(id).args
    }

    /// The number of nodes in `id`'s class.
    pub fn class_size(&self, id: Id) -> usize {
        self.node(self.find(id)).class_size as usize
    }

    /// Iterate over the members of `id`'s class, starting at `id`.
    pub fn class_members(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        let mut cur = Some(id);
        std::iter::from_fn(move || {
            let n = cur?;
            let next = self.node(n).next;
            cur = if next == id { None } else { Some(next) };
            Some(n)
        })
    }

    /// Does `id` denote a unique interpreted value?
    pub fn is_interpreted(&self, id: Id) -> bool {
        self.node(id).interpreted
    }

    /// The theory variable attached to `id` under `theory`, if any.
    pub fn th_var(&self, id: Id, theory: TheoryId) -> Option<TheoryVar> {
        self.node(id).th_var(theory)
    }

    /// Has a conflict been detected in the current scope?
    pub fn inconsistent(&self) -> bool {
        self.inconsistent
    }

    /// The counters accumulated so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// A handle to the cancellation flag consulted by
    /// [`propagate`](EGraph::propagate).
    pub fn limit(&self) -> Limit {
        self.limit.clone()
    }

    pub(crate) fn is_equality(&self, id: Id) -> bool {
        self.node(id).expr.is_eq()
    }

    /// The current boolean value of `id`'s class: `Some(true)` when its
    /// root is the `true` node, `Some(false)` for `false`, `None` otherwise.
    pub fn value(&self, id: Id) -> Option<bool> {
        let root = self.node(id).root;
        let e = &self.node(root).expr;
        if e.is_true() {
            Some(true)
        } else if e.is_false() {
            Some(false)
        } else {
            None
        }
    }

    pub(crate) fn signature(&self, id: Id) -> Signature<T::Decl, T::Sort> {
        let node = self.node(id);
        let mut args: Vec<Id> = node.args.iter().map(|&a| self.node(a).root).collect();
        if node.expr.is_commutative() && args.len() == 2 && args[0] > args[1] {
            args.swap(0, 1);
        }
        Signature {
            decl: node.expr.decl(),
            sort: node.expr.sort(),
            args,
        }
    }

    /// Remove `id` from the congruence table, by identity.
    pub(crate) fn deindex(&mut self, id: Id) {
        let node = self.node(id);
        if node.args.is_empty() || node.expr.is_eq() {
            return;
        }
        let sig = self.signature(id);
        self.table.erase(&sig, id);
    }

    /// Put `id` back in the congruence table if it is eligible, keeping any
    /// congruent occupant.
    pub(crate) fn reindex(&mut self, id: Id) {
        let node = self.node(id);
        if node.args.is_empty() || node.expr.is_eq() || !node.merge_enabled {
            return;
        }
        let sig = self.signature(id);
        self.table.insert(sig, id);
    }

    /// Create the e-node for `expr` with argument nodes `args`.
    ///
    /// `expr` must not already have a node, and `args.len()` must match its
    /// arity. If a congruent node already exists the fresh node is merged
    /// with it immediately; equality atoms are instead watched so that the
    /// driver learns when their two sides coincide.
    pub fn mk(&mut self, expr: T, args: &[Id]) -> Id {
        debug_assert!(
            self.lookup(&expr).is_none(),
            "mk of a term that already has a node: {:?}",
            expr
        );
        self.force_push();
        let n = self.mk_enode(expr, args);
        debug_assert_eq!(self.node(n).class_size, 1);
        if self.node(n).args.is_empty() {
            if self.node(n).expr.is_unique_value() {
                self.node_mut(n).interpreted = true;
            }
            return n;
        }
        if self.is_equality(n) {
            debug_assert_eq!(self.node(n).args.len(), 2);
            self.update_children(n);
            self.reinsert_equality(n);
            return n;
        }
        let sig = self.signature(n);
        let existing = self.table.insert(sig, n);
        if existing == n {
            self.update_children(n);
        } else {
            let commutative = self.node(n).expr.is_commutative();
            self.merge(n, existing, Justification::Congruence { commutative });
        }
        n
    }

    fn mk_enode(&mut self, expr: T, args: &[Id]) -> Id {
        let id = Id::from(self.nodes.len());
        trace!("node {}: {:?}{:?}", id, expr, args);
        self.expr2node.insert(expr.clone(), id);
        self.nodes.push(ENode::new(expr, args.to_vec(), id));
        self.updates.push(UpdateRecord::AddNode);
        for &a in args {
            self.set_merge_enabled(a, true);
        }
        id
    }

    /// Register `n` in the parent list of each of its arguments' roots,
    /// once per argument occurrence.
    fn update_children(&mut self, n: Id) {
        for i in 0..self.node(n).args.len() {
            let c = self.node(n).args[i];
            let root = self.node(c).root;
            self.node_mut(root).parents.push(n);
        }
        self.node_mut(n).children_registered = true;
    }

    /// Enable or disable congruence propagation through `n`.
    ///
    /// A disabled application is kept out of the congruence table, so no
    /// congruences are discovered through it until it is re-enabled. Nodes
    /// used as subterms are force-enabled by [`mk`](EGraph::mk).
    pub fn set_merge_enabled(&mut self, n: Id, enabled: bool) {
        if enabled == self.node(n).merge_enabled {
            return;
        }
        self.updates.push(UpdateRecord::ToggleMerge(n));
        self.node_mut(n).merge_enabled = enabled;
        if enabled {
            self.reindex(n);
        } else {
            self.deindex(n);
        }
    }

    /// Assert that `n1` and `n2` denote the same value, justified by `j`.
    ///
    /// Merging two distinct interpreted values records a conflict instead;
    /// see [`inconsistent`](EGraph::inconsistent) and
    /// [`explain`](EGraph::explain). Parents are re-examined for new
    /// congruences on the next [`propagate`](EGraph::propagate).
    pub fn merge(&mut self, n1: Id, n2: Id, j: Justification<J>) {
        debug_assert_eq!(
            self.node(n1).expr.sort(),
            self.node(n2).expr.sort(),
            "merging nodes of different sorts"
        );
        let mut n1 = n1;
        let mut n2 = n2;
        let mut r1 = self.node(n1).root;
        let mut r2 = self.node(n2).root;
        if r1 == r2 {
            return;
        }
        trace!(
            "merge: {:?} == {:?}",
            self.node(n1).expr,
            self.node(n2).expr
        );
        self.force_push();
        debug_assert_eq!(self.pending_scopes, 0);
        self.stats.merges += 1;
        if self.node(r1).interpreted && self.node(r2).interpreted {
            self.set_conflict(n1, n2, j);
            return;
        }
        // keep the interpreted or larger class as the surviving root
        let r1_larger = self.node(r1).class_size > self.node(r2).class_size;
        if (r1_larger && !self.node(r2).interpreted) || self.node(r1).interpreted {
            mem::swap(&mut r1, &mut r2);
            mem::swap(&mut n1, &mut n2);
        }
        let root_true = self.node(r2).expr.is_true();
        let root_false = self.node(r2).expr.is_false();
        if (root_true || root_false) && j.is_congruence() {
            self.add_literal(n1, false);
        }
        if root_false && self.is_equality(n1) {
            self.new_diseq(n1);
        }
        // stale signatures: both classes' parents leave the table until the
        // roots have been swung
        for i in 0..self.node(r1).parents.len() {
            let p = self.node(r1).parents[i];
            self.deindex(p);
        }
        for i in 0..self.node(r2).parents.len() {
            let p = self.node(r2).parents[i];
            self.deindex(p);
        }
        self.updates.push(UpdateRecord::SetParent {
            r1,
            n1,
            r2_parents: self.node(r2).parents.len(),
        });
        self.merge_justification(n1, n2, j);
        let mut c = n1;
        loop {
            self.node_mut(c).root = r2;
            c = self.node(c).next;
            if c == n1 {
                break;
            }
        }
        let (a, b) = two_mut(&mut self.nodes, usize::from(r1), usize::from(r2));
        mem::swap(&mut a.next, &mut b.next);
        b.class_size += a.class_size;
        // r1 keeps its own list so pop can truncate r2's by count
        let r1_parents = mem::take(&mut a.parents);
        b.parents.extend_from_slice(&r1_parents);
        self.node_mut(r1).parents = r1_parents;
        self.merge_th_eq(r1, r2);
        self.worklist.push(r2);
    }

    fn set_conflict(&mut self, n1: Id, n2: Id, j: Justification<J>) {
        self.stats.conflicts += 1;
        if self.inconsistent {
            return;
        }
        log::debug!("conflict: {} == {}", n1, n2);
        self.inconsistent = true;
        self.updates.push(UpdateRecord::Inconsistent);
        self.conflict = Some((n1, n2, j));
    }

    fn add_literal(&mut self, n: Id, is_equality: bool) {
        trace!("literal: {} (eq: {})", n, is_equality);
        self.new_lits.push(Literal {
            node: n,
            is_equality,
        });
        self.updates.push(UpdateRecord::NewLit);
        if is_equality {
            self.stats.equalities += 1;
        } else {
            self.stats.literals += 1;
        }
    }

    fn add_th_eq(&mut self, theory: TheoryId, v1: TheoryVar, v2: TheoryVar, node: Id, root: Id) {
        trace!("theory eq: {}:{} == {}", theory, v1, v2);
        self.new_th_eqs.push(TheoryEvent::Eq {
            theory,
            v1,
            v2,
            node,
            root,
        });
        self.updates.push(UpdateRecord::NewThEq);
        self.stats.theory_eqs += 1;
    }

    fn add_th_diseq(&mut self, theory: TheoryId, v1: TheoryVar, v2: TheoryVar, eq: T) {
        if !self.th_propagates_diseqs(theory) {
            return;
        }
        trace!("theory diseq: {}:{} != {}", theory, v1, v2);
        self.new_th_eqs.push(TheoryEvent::Diseq { theory, v1, v2, eq });
        self.updates.push(UpdateRecord::NewThEq);
        self.stats.theory_diseqs += 1;
    }

    /// The equality atom `n1` was merged with `false`: derive disequality
    /// events between its two argument classes.
    fn new_diseq(&mut self, n1: Id) {
        debug_assert!(self.is_equality(n1));
        let arg1 = self.node(n1).args[0];
        let arg2 = self.node(n1).args[1];
        let r1 = self.node(arg1).root;
        let r2 = self.node(arg2).root;
        if r1 == r2 {
            return;
        }
        if self.node(r1).th_vars.is_empty() || self.node(r2).th_vars.is_empty() {
            return;
        }
        let single = self.node(r1).th_vars.len() == 1
            && self.node(r2).th_vars.len() == 1
            && self.node(r1).th_vars[0].0 == self.node(r2).th_vars[0].0;
        if single {
            let theory = self.node(r1).th_vars[0].0;
            if !self.th_propagates_diseqs(theory) {
                return;
            }
            // the closest attachments identify which occurrences disagree
            if let (Some(v1), Some(v2)) = (
                self.closest_th_var(arg1, theory),
                self.closest_th_var(arg2, theory),
            ) {
                let eq = self.node(n1).expr.clone();
                self.add_th_diseq(theory, v1, v2, eq);
            }
            return;
        }
        for i in 0..self.node(r1).th_vars.len() {
            let (t, v1) = self.node(r1).th_vars[i];
            if !self.th_propagates_diseqs(t) {
                continue;
            }
            for k in 0..self.node(r2).th_vars.len() {
                let (t2, v2) = self.node(r2).th_vars[k];
                if t == t2 {
                    let eq = self.node(n1).expr.clone();
                    self.add_th_diseq(t, v1, v2, eq);
                }
            }
        }
    }

    /// A variable `v1` was freshly attached to root `r`: scan `r`'s parents
    /// for equality atoms already assigned false and derive disequalities.
    fn add_th_diseqs(&mut self, theory: TheoryId, v1: TheoryVar, r: Id) {
        debug_assert_eq!(self.node(r).root, r);
        if !self.th_propagates_diseqs(theory) {
            return;
        }
        for i in 0..self.node(r).parents.len() {
            let p = self.node(r).parents[i];
            if !self.is_equality(p) || self.value(p) != Some(false) {
                continue;
            }
            let a0 = self.node(p).args[0];
            let a1 = self.node(p).args[1];
            let other = if self.node(a0).root == r { a1 } else { a0 };
            let other_root = self.node(other).root;
            if let Some(v2) = self.closest_th_var(other_root, theory) {
                let eq = self.node(p).expr.clone();
                self.add_th_diseq(theory, v1, v2, eq);
            }
        }
    }

    /// The nearest `theory` attachment on the proof-forest path from `n` to
    /// its class root.
    fn closest_th_var(&self, n: Id, theory: TheoryId) -> Option<TheoryVar> {
        let mut cur = n;
        loop {
            if let Some(v) = self.node(cur).th_var(theory) {
                return Some(v);
            }
            cur = self.node(cur).target()?;
        }
    }

    /// Attach theory variable `v` to `n` under `theory`.
    ///
    /// The attachment is propagated to `n`'s root; if the root already
    /// carries a variable of the same theory, a [`TheoryEvent::Eq`] is
    /// queued instead.
    pub fn add_th_var(&mut self, n: Id, v: TheoryVar, theory: TheoryId) {
        self.force_push();
        let old = self.node(n).th_var(theory);
        let r = self.node(n).root;
        match old {
            None => {
                self.node_mut(n).add_th_var(theory, v);
                self.updates.push(UpdateRecord::AddThVar { node: n, theory });
                if r != n {
                    match self.node(r).th_var(theory) {
                        None => {
                            self.node_mut(r).add_th_var(theory, v);
                            self.add_th_diseqs(theory, v, r);
                        }
                        Some(u) => self.add_th_eq(theory, u, v, n, r),
                    }
                }
            }
            Some(w) => {
                let u = self
                    .node(r)
                    .th_var(theory)
                    .expect("attached node has an unattached root");
                debug_assert_ne!(u, v);
                self.node_mut(n).replace_th_var(theory, v);
                self.updates.push(UpdateRecord::ReplaceThVar {
                    node: n,
                    theory,
                    old: w,
                });
                self.add_th_eq(theory, u, v, n, r);
            }
        }
    }

    /// Promote the absorbed root's attachments onto the surviving root.
    fn merge_th_eq(&mut self, n: Id, root: Id) {
        debug_assert_ne!(n, root);
        for i in 0..self.node(n).th_vars.len() {
            let (theory, v) = self.node(n).th_vars[i];
            match self.node(root).th_var(theory) {
                None => {
                    self.node_mut(root).add_th_var(theory, v);
                    self.updates.push(UpdateRecord::AddThVar { node: root, theory });
                    self.add_th_diseqs(theory, v, root);
                }
                Some(u) => {
                    debug_assert_ne!(u, v);
                    self.add_th_eq(theory, u, v, n, root);
                }
            }
        }
    }

    /// Let `theory` receive [`TheoryEvent::Diseq`] events.
    pub fn set_th_propagates_diseqs(&mut self, theory: TheoryId) {
        let i = theory.index();
        if self.diseq_theories.len() <= i {
            self.diseq_theories.resize(i + 1, false);
        }
        self.diseq_theories[i] = true;
    }

    fn th_propagates_diseqs(&self, theory: TheoryId) -> bool {
        self.diseq_theories.get(theory.index()).copied().unwrap_or(false)
    }

    /// Close the graph under congruence, processing the worklist in waves.
    ///
    /// Returns true iff new events are pending for the driver or the graph
    /// became inconsistent.
    pub fn propagate(&mut self) -> bool {
        debug_assert!(self.new_lits_qhead <= self.new_lits.len());
        debug_assert!(self.pending_scopes == 0 || self.worklist.is_empty());
        let mut head = 0;
        let mut tail = self.worklist.len();
        while head < tail && !self.limit.is_canceled() && !self.inconsistent {
            for i in head..tail {
                if self.inconsistent {
                    break;
                }
                let n = self.find(self.worklist[i]);
                if !self.node(n).mark1 {
                    self.node_mut(n).mark1 = true;
                    self.worklist[i] = n;
                    self.reinsert(n);
                }
            }
            for i in head..tail {
                let n = self.worklist[i];
                self.node_mut(n).mark1 = false;
            }
            head = tail;
            tail = self.worklist.len();
        }
        self.worklist.clear();
        self.force_push();
        self.new_lits_qhead < self.new_lits.len()
            || self.new_th_eqs_qhead < self.new_th_eqs.len()
            || self.inconsistent
    }

    /// Put every parent of root `n` back in the congruence table; a
    /// collision is a new congruence to merge.
    ///
    /// The parent list may grow underneath us through a triggered merge;
    /// the length snapshot leaves any appended parents to the next wave.
    fn reinsert(&mut self, n: Id) {
        let num_parents = self.node(n).parents.len();
        for i in 0..num_parents {
            let p = self.node(n).parents[i];
            if self.is_equality(p) {
                self.reinsert_equality(p);
                continue;
            }
            if !self.node(p).merge_enabled {
                continue;
            }
            let sig = self.signature(p);
            let existing = self.table.insert(sig, p);
            if existing != p {
                let commutative = self.node(p).expr.is_commutative();
                self.merge(existing, p, Justification::Congruence { commutative });
            }
            if self.inconsistent {
                break;
            }
        }
    }

    /// If the two sides of equality atom `p` coincide and `p` is not
    /// already true, tell the driver to assert it.
    fn reinsert_equality(&mut self, p: Id) {
        debug_assert!(self.is_equality(p));
        let a = self.node(p).args[0];
        let b = self.node(p).args[1];
        if self.node(a).root == self.node(b).root && self.value(p) != Some(true) {
            self.add_literal(p, true);
        }
    }

    /// Are `a` and `b` known to be unequal?
    ///
    /// True when their classes hold distinct interpreted values, have
    /// different sorts, or are the two sides of an equality atom currently
    /// assigned false.
    pub fn are_diseq(&self, a: Id, b: Id) -> bool {
        let ra = self.node(a).root;
        let rb = self.node(b).root;
        if ra == rb {
            return false;
        }
        if self.node(ra).interpreted && self.node(rb).interpreted {
            return true;
        }
        if self.node(ra).expr.sort() != self.node(rb).expr.sort() {
            return true;
        }
        for &p in &self.node(ra).parents {
            if !self.is_equality(p) || self.value(p) != Some(false) {
                continue;
            }
            let x = self.node(self.node(p).args[0]).root;
            let y = self.node(self.node(p).args[1]).root;
            if (x, y) == (ra, rb) || (x, y) == (rb, ra) {
                return true;
            }
        }
        false
    }

    /// Read the next queued literal propagation, advancing the cursor.
    ///
    /// The cursor is restored by [`pop`](EGraph::pop) to where it stood
    /// when the popped scope was pushed.
    pub fn next_literal(&mut self) -> Option<Literal> {
        if self.new_lits_qhead < self.new_lits.len() {
            let lit = self.new_lits[self.new_lits_qhead];
            self.new_lits_qhead += 1;
            Some(lit)
        } else {
            None
        }
    }

    /// Read the next queued theory event, advancing the cursor.
    pub fn next_theory_event(&mut self) -> Option<TheoryEvent<T>> {
        if self.new_th_eqs_qhead < self.new_th_eqs.len() {
            let ev = self.new_th_eqs[self.new_th_eqs_qhead].clone();
            self.new_th_eqs_qhead += 1;
            Some(ev)
        } else {
            None
        }
    }

    /// Literal propagations queued but not yet read.
    pub fn pending_literals(&self) -> usize {
        self.new_lits.len() - self.new_lits_qhead
    }

    /// Theory events queued but not yet read.
    pub fn pending_theory_events(&self) -> usize {
        self.new_th_eqs.len() - self.new_th_eqs_qhead
    }

    /// Rebuild `self` as a copy of `src` against a translated term
    /// universe.
    ///
    /// Replays each node's creation in original order (so ids carry over
    /// positionally) and then each proof-forest edge via
    /// [`merge`](EGraph::merge), translating justification tokens through
    /// `copy_justification`, and finally propagates.
    ///
    /// Both graphs must be scope-free, `self` empty, and `src` free of
    /// theory attachments.
    pub fn copy_from(
        &mut self,
        src: &EGraph<T, J>,
        mut translate: impl FnMut(&T) -> T,
        mut copy_justification: impl FnMut(&J) -> J,
    ) {
        assert!(self.is_empty() && self.scopes.is_empty());
        assert!(src.scopes.is_empty());
        for (i, n) in src.nodes.iter().enumerate() {
            debug_assert!(n.th_vars.is_empty());
            let id = self.mk(translate(&n.expr), &n.args);
            debug_assert_eq!(id, Id::from(i));
        }
        for (i, n) in src.nodes.iter().enumerate() {
            if let Some(edge) = &n.proof {
                let j = edge.justification.map(&mut copy_justification);
                let (a, b) = (Id::from(i), edge.target);
                if self.find(a) != self.find(b) {
                    self.merge(a, b, j);
                }
            }
        }
        self.propagate();
    }

    /// A listing of every node with its root, parents, attachments, and
    /// proof edge, for debugging.
    pub fn dump(&self) -> impl Debug + '_
    where
        J: Debug,
    {
        EGraphDump(self)
    }

    /// Check the structural invariants, panicking on any violation.
    ///
    /// Intended for tests; cost is linear in the size of the graph.
    pub fn assert_invariants(&self) {
        for i in 0..self.nodes.len() {
            let id = Id::from(i);
            let root = self.node(id).root;
            assert_eq!(self.node(root).root, root, "root of {} is not canonical", id);
            // the next-ring through any member visits its whole class
            let mut count: u32 = 0;
            let mut c = id;
            loop {
                assert_eq!(self.node(c).root, root, "ring member {} left class", c);
                count += 1;
                assert!(count as usize <= self.nodes.len(), "unclosed ring at {}", id);
                c = self.node(c).next;
                if c == id {
                    break;
                }
            }
            assert_eq!(count, self.node(root).class_size, "class size at {}", id);
            if self.node(id).children_registered {
                for &a in &self.node(id).args {
                    let ar = self.node(a).root;
                    assert!(
                        self.node(ar).parents.contains(&id),
                        "{} missing from parents of {}",
                        id,
                        ar
                    );
                }
            }
            let mut steps: u32 = 0;
            let mut c = id;
            while let Some(t) = self.node(c).target() {
                steps += 1;
                assert!(
                    steps < self.node(root).class_size,
                    "proof path from {} does not terminate",
                    id
                );
                c = t;
            }
            assert_eq!(self.node(c).root, root, "proof path from {} escapes class", id);
        }
        for (sig, id) in self.table.iter() {
            assert_eq!(sig, &self.signature(id), "stale table entry for {}", id);
        }
    }
}

impl<T: Term, J: Debug> Debug for EGraph<T, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EGraph")
            .field("nodes", &self.nodes.len())
            .field("table", &self.table.len())
            .field("updates", &self.updates.len())
            .field("scopes", &self.scopes.len())
            .field("inconsistent", &self.inconsistent)
            .finish()
    }
}

struct EGraphDump<'a, T: Term, J>(&'a EGraph<T, J>);

impl<'a, T: Term, J: Debug> Debug for EGraphDump<'a, T, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eg = self.0;
        writeln!(
            f,
            "updates: {} lits: {} (qhead {}) th_eqs: {} (qhead {})",
            eg.updates.len(),
            eg.new_lits.len(),
            eg.new_lits_qhead,
            eg.new_th_eqs.len(),
            eg.new_th_eqs_qhead
        )?;
        for i in 0..eg.nodes.len() {
            let id = Id::from(i);
            let n = eg.node(id);
            write!(f, "{}: {:?}{:?}", id, n.expr, n.args)?;
            if n.root != id {
                write!(f, " [r {}]", n.root)?;
            }
            if !n.parents.is_empty() {
                write!(f, " [p {:?}]", n.parents)?;
            }
            if !n.th_vars.is_empty() {
                write!(f, " [t {:?}]", n.th_vars)?;
            }
            if let Some(edge) = &n.proof {
                write!(f, " [-> {} {:?}]", edge.target, edge.justification)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
