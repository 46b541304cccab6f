#![warn(missing_docs)]
/*!

`euf` is a **backtracking e-graph**: the congruence-closure layer of a
decision procedure for quantifier-free first-order logic modulo theories.

Unlike an equality-saturation e-graph, which only ever grows, this e-graph
is built for a SAT-driven search loop. The driver inserts terms with
[`EGraph::mk`], asserts equalities with [`EGraph::merge`], and runs
[`EGraph::propagate`] to close the graph under congruence. All of that
happens inside [`EGraph::push`]/[`EGraph::pop`] scopes: every mutation is
recorded on a trail, and popping a scope undoes the records in reverse,
restoring the graph exactly.

Each merge also records an edge in a *proof forest*, so any derived
equality (or the current conflict) can be explained as a set of
caller-supplied justification tokens; see [`EGraph::explain`] and
[`EGraph::explain_eq`].

The e-graph signals the driver through two event queues with read cursors:
literal propagations ([`Literal`]) and theory equality/disequality events
([`TheoryEvent`]). Theory solvers attach their variables to classes with
[`EGraph::add_th_var`].

The term universe is abstracted by the [`Term`] trait; [`SymbolTerm`] and
[`TermBank`] provide a small built-in instantiation for tests and
experiments.

## Example

```
use euf::{EGraph, Justification, TermBank};

let mut bank = TermBank::default();
let mut eg: EGraph<_, u32> = EGraph::default();

let ta = bank.leaf("a", "U");
let tb = bank.leaf("b", "U");
let a = eg.mk(ta.clone(), &[]);
let b = eg.mk(tb.clone(), &[]);
let fa = eg.mk(bank.app("f", "U", &[ta]), &[a]);
let fb = eg.mk(bank.app("f", "U", &[tb]), &[b]);

eg.push();
eg.merge(a, b, Justification::External(1));
eg.propagate();
assert_eq!(eg.find(fa), eg.find(fb));

let mut why = Vec::new();
eg.explain_eq(&mut why, fa, fb);
assert_eq!(why, vec![1]);

eg.pop(1);
assert_ne!(eg.find(fa), eg.find(fb));
```

## Logging

Many parts of `euf` dump useful logging info using the
[`log`](https://docs.rs/log/) crate. The easiest way to see this info is to
use the [`env_logger`](https://docs.rs/env_logger/) crate in your binary or
test, and set the environment variable `RUST_LOG=euf=trace`.

*/

mod egraph;
mod explain;
mod node;
mod table;
mod term;
mod theory;
mod undo;
mod util;

/// A key identifying an e-node within an [`EGraph`].
///
/// `Id`s are handed out by [`EGraph::mk`] in creation order and stay valid
/// until the scope that created them is popped.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct Id(u32);

impl From<usize> for Id {
    fn from(n: usize) -> Id {
        Id(n as u32)
    }
}

impl From<Id> for usize {
    fn from(id: Id) -> usize {
        id.0 as usize
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub use {
    egraph::{EGraph, Limit, Literal, Stats},
    explain::Justification,
    term::{SymbolTerm, Term, TermBank},
    theory::{TheoryEvent, TheoryId, TheoryVar},
    util::Symbol,
};

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
