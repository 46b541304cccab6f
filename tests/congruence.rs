use euf::{EGraph, Justification, Literal, SymbolTerm, TermBank, TheoryEvent, TheoryId, TheoryVar};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type EG = EGraph<SymbolTerm, u32>;

const AX: Justification<u32> = Justification::Axiom;

#[test]
fn congruence_propagation() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let fa = eg.mk(tb.app("f", "U", &[ta]), &[a]);
    let fb = eg.mk(tb.app("f", "U", &[tbb]), &[b]);
    assert_ne!(eg.find(fa), eg.find(fb));

    eg.merge(a, b, AX);
    eg.propagate();
    assert_eq!(eg.find(fa), eg.find(fb));
    eg.assert_invariants();
}

#[test]
fn transitive_merge() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let a = eg.mk(tb.leaf("a", "U"), &[]);
    let b = eg.mk(tb.leaf("b", "U"), &[]);
    let c = eg.mk(tb.leaf("c", "U"), &[]);
    eg.merge(a, b, AX);
    eg.merge(b, c, AX);
    eg.propagate();
    assert_eq!(eg.find(a), eg.find(c));
    assert_eq!(eg.class_size(a), 3);
    assert_eq!(eg.class_members(a).count(), 3);
    eg.assert_invariants();
}

#[test]
fn undo_restores_congruence() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let fa = eg.mk(tb.app("f", "U", &[ta]), &[a]);
    let fb = eg.mk(tb.app("f", "U", &[tbb]), &[b]);

    eg.push();
    eg.merge(a, b, AX);
    eg.propagate();
    assert_eq!(eg.find(fa), eg.find(fb));

    eg.pop(1);
    assert_ne!(eg.find(fa), eg.find(fb));
    assert_eq!(eg.pending_literals(), 0);
    assert_eq!(eg.pending_theory_events(), 0);
    eg.assert_invariants();
}

#[test]
fn conflict_on_interpreted_values() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let zero = eg.mk(tb.value("0", "Int"), &[]);
    let one = eg.mk(tb.value("1", "Int"), &[]);
    eg.merge(zero, one, AX);
    assert!(eg.inconsistent());
    assert!(eg.propagate());

    // axiom tokens are suppressed
    let mut out = Vec::new();
    eg.explain(&mut out);
    assert!(out.is_empty());
}

#[test]
fn conflict_carries_external_token() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let zero = eg.mk(tb.value("0", "Int"), &[]);
    let one = eg.mk(tb.value("1", "Int"), &[]);
    eg.merge(zero, one, Justification::External(42));
    assert!(eg.inconsistent());
    let mut out = Vec::new();
    eg.explain(&mut out);
    assert_eq!(out, vec![42]);
}

#[test]
fn conflict_through_congruence() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let fa = eg.mk(tb.app("f", "Int", &[ta]), &[a]);
    let fb = eg.mk(tb.app("f", "Int", &[tbb]), &[b]);
    let zero = eg.mk(tb.value("0", "Int"), &[]);
    let one = eg.mk(tb.value("1", "Int"), &[]);
    eg.merge(fa, zero, Justification::External(1));
    eg.merge(fb, one, Justification::External(2));
    eg.merge(a, b, Justification::External(3));
    eg.propagate();
    assert!(eg.inconsistent());

    // f(a) = 0, f(b) = 1, and a = b derive the clash between 0 and 1
    let mut out = Vec::new();
    eg.explain(&mut out);
    out.sort_unstable();
    assert_eq!(out, vec![1, 2, 3]);
}

#[test]
fn explanation_lca() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let a = eg.mk(tb.leaf("a", "U"), &[]);
    let b = eg.mk(tb.leaf("b", "U"), &[]);
    let c = eg.mk(tb.leaf("c", "U"), &[]);
    let d = eg.mk(tb.leaf("d", "U"), &[]);
    eg.merge(a, b, Justification::External(1));
    eg.merge(c, d, Justification::External(2));
    eg.merge(b, c, Justification::External(3));
    eg.propagate();

    let mut out = Vec::new();
    eg.explain_eq(&mut out, a, d);
    out.sort_unstable();
    assert_eq!(out, vec![1, 2, 3]);
}

#[test]
fn theory_equality_event() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let t = TheoryId::from(0);
    let v1 = TheoryVar::from(10);
    let v2 = TheoryVar::from(20);
    let a = eg.mk(tb.leaf("a", "U"), &[]);
    let b = eg.mk(tb.leaf("b", "U"), &[]);
    eg.add_th_var(a, v1, t);
    eg.add_th_var(b, v2, t);
    assert_eq!(eg.pending_theory_events(), 0);

    eg.merge(a, b, AX);
    eg.propagate();
    match eg.next_theory_event() {
        Some(TheoryEvent::Eq {
            theory,
            v1: u1,
            v2: u2,
            ..
        }) => {
            assert_eq!(theory, t);
            assert!((u1, u2) == (v1, v2) || (u1, u2) == (v2, v1));
        }
        other => panic!("expected a theory equality, got {:?}", other),
    }
    assert_eq!(eg.next_theory_event(), None);
}

#[test]
fn theory_disequality_from_false_equality() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let t = TheoryId::from(3);
    let va = TheoryVar::from(1);
    let vb = TheoryVar::from(2);
    eg.set_th_propagates_diseqs(t);

    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    eg.add_th_var(a, va, t);
    eg.add_th_var(b, vb, t);

    let teq = tb.eq(&ta, &tbb);
    let e = eg.mk(teq.clone(), &[a, b]);
    let f = eg.mk(tb.mk_false(), &[]);
    eg.merge(e, f, AX);
    eg.propagate();

    match eg.next_theory_event() {
        Some(TheoryEvent::Diseq {
            theory,
            v1,
            v2,
            eq,
        }) => {
            assert_eq!(theory, t);
            assert!((v1, v2) == (va, vb) || (v1, v2) == (vb, va));
            assert_eq!(eq, teq);
        }
        other => panic!("expected a theory disequality, got {:?}", other),
    }
    assert!(eg.are_diseq(a, b));
    assert!(eg.are_diseq(b, a));
}

#[test]
fn unregistered_theory_gets_no_disequalities() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let t = TheoryId::from(0);
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    eg.add_th_var(a, TheoryVar::from(1), t);
    eg.add_th_var(b, TheoryVar::from(2), t);
    let e = {
        let teq = tb.eq(&ta, &tbb);
        eg.mk(teq, &[a, b])
    };
    let f = eg.mk(tb.mk_false(), &[]);
    eg.merge(e, f, AX);
    eg.propagate();
    assert_eq!(eg.pending_theory_events(), 0);
}

#[test]
fn late_attachment_scans_false_equalities() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let t = TheoryId::from(1);
    eg.set_th_propagates_diseqs(t);

    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let vb = TheoryVar::from(7);
    eg.add_th_var(b, vb, t);

    // a's side carries no variable yet, so falsifying the equality is quiet
    let teq = tb.eq(&ta, &tbb);
    let e = eg.mk(teq.clone(), &[a, b]);
    let f = eg.mk(tb.mk_false(), &[]);
    eg.merge(e, f, AX);
    eg.propagate();
    assert_eq!(eg.pending_theory_events(), 0);

    // merging an attached node into a's class promotes the variable onto
    // the root and rescans its falsified equality parents
    let c = eg.mk(tb.leaf("c", "U"), &[]);
    let vc = TheoryVar::from(8);
    eg.add_th_var(c, vc, t);
    eg.merge(c, a, AX);
    eg.propagate();

    match eg.next_theory_event() {
        Some(TheoryEvent::Diseq { theory, v1, v2, eq }) => {
            assert_eq!(theory, t);
            assert!((v1, v2) == (vc, vb) || (v1, v2) == (vb, vc));
            assert_eq!(eq, teq);
        }
        other => panic!("expected a theory disequality, got {:?}", other),
    }
}

#[test]
fn attachment_on_non_root_reaches_root() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let t = TheoryId::from(0);
    let a = eg.mk(tb.leaf("a", "U"), &[]);
    let b = eg.mk(tb.leaf("b", "U"), &[]);
    eg.merge(a, b, AX);
    eg.propagate();
    let root = eg.find(a);
    let non_root = if root == a { b } else { a };

    let v = TheoryVar::from(5);
    eg.add_th_var(non_root, v, t);
    assert_eq!(eg.th_var(non_root, t), Some(v));
    assert_eq!(eg.th_var(root, t), Some(v));
    assert_eq!(eg.pending_theory_events(), 0);

    // a second variable on the root's class reports an equality
    let u = TheoryVar::from(6);
    eg.add_th_var(root, u, t);
    match eg.next_theory_event() {
        Some(TheoryEvent::Eq { theory, .. }) => assert_eq!(theory, t),
        other => panic!("expected a theory equality, got {:?}", other),
    }
}

#[test]
fn equality_atom_propagates_true() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let e = eg.mk(tb.eq(&ta, &tbb), &[a, b]);

    eg.merge(a, b, AX);
    assert!(eg.propagate());
    // the atom sits in both argument roots' parent lists, so it may be
    // reported once per occurrence
    let mut lits = Vec::new();
    while let Some(lit) = eg.next_literal() {
        lits.push(lit);
    }
    assert!(!lits.is_empty());
    assert!(lits.iter().all(|l| *l
        == Literal {
            node: e,
            is_equality: true
        }));
}

#[test]
fn equality_atom_true_at_creation() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let a = eg.mk(ta.clone(), &[]);
    // both sides are the same node, so the atom is true on arrival
    let e = eg.mk(tb.eq(&ta, &ta), &[a, a]);
    assert_eq!(
        eg.next_literal(),
        Some(Literal {
            node: e,
            is_equality: true
        })
    );
}

#[test]
fn boolean_congruence_propagates_literal() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let pa = eg.mk(tb.app("p", "Bool", &[ta]), &[a]);
    let pb = eg.mk(tb.app("p", "Bool", &[tbb]), &[b]);
    let tt = eg.mk(tb.mk_true(), &[]);

    eg.merge(pb, tt, AX);
    eg.propagate();
    assert_eq!(eg.next_literal(), None);

    // congruence drags p(a) into the true class
    eg.merge(a, b, AX);
    assert!(eg.propagate());
    assert_eq!(eg.value(pa), Some(true));
    assert_eq!(
        eg.next_literal(),
        Some(Literal {
            node: pa,
            is_equality: false
        })
    );
}

#[test]
fn are_diseq_is_symmetric_and_reflexively_false() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let a = eg.mk(tb.leaf("a", "U"), &[]);
    let b = eg.mk(tb.leaf("b", "U"), &[]);
    assert!(!eg.are_diseq(a, b));
    assert!(!eg.are_diseq(b, a));
    eg.merge(a, b, AX);
    eg.propagate();
    assert!(!eg.are_diseq(a, b));
}

#[test]
fn copy_from_replays_the_graph() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let fa = eg.mk(tb.app("f", "U", &[ta]), &[a]);
    let fb = eg.mk(tb.app("f", "U", &[tbb]), &[b]);
    eg.merge(a, b, Justification::External(5));
    eg.propagate();

    let mut copy = EG::default();
    copy.copy_from(&eg, |t| t.clone(), |&j| j + 100);
    assert_eq!(copy.len(), eg.len());
    assert_eq!(copy.find(fa), copy.find(fb));
    let mut out = Vec::new();
    copy.explain_eq(&mut out, fa, fb);
    assert_eq!(out, vec![105]);
    copy.assert_invariants();
}

#[test]
fn disabled_nodes_do_not_propagate() {
    init();
    let mut tb = TermBank::default();
    let mut eg = EG::default();
    let ta = tb.leaf("a", "U");
    let tbb = tb.leaf("b", "U");
    let a = eg.mk(ta.clone(), &[]);
    let b = eg.mk(tbb.clone(), &[]);
    let fa = eg.mk(tb.app("f", "U", &[ta]), &[a]);
    let fb = eg.mk(tb.app("f", "U", &[tbb]), &[b]);
    eg.set_merge_enabled(fa, false);

    eg.merge(a, b, AX);
    eg.propagate();
    assert_ne!(eg.find(fa), eg.find(fb));

    // re-enabling puts f(a) back in the table; the congruence is found
    // when its class is next touched
    eg.set_merge_enabled(fa, true);
    let c = eg.mk(tb.leaf("c", "U"), &[]);
    eg.merge(c, b, AX);
    eg.propagate();
    assert_eq!(eg.find(fa), eg.find(fb));
    eg.assert_invariants();
}
