use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::util::HashMap;
use crate::Symbol;

/// A handle into the caller's term universe.
///
/// The e-graph never creates or destroys terms; it stores the handles given
/// to [`EGraph::mk`](crate::EGraph::mk) and asks them the questions below.
/// Handles are expected to be hash-consed by the caller: two handles compare
/// equal iff they denote the same term.
pub trait Term: Clone + Eq + Hash + Debug {
    /// Identifies the function symbol at the head of the term.
    type Decl: Clone + Eq + Hash + Debug;
    /// Identifies the sort of the term.
    type Sort: Clone + Eq + Hash + Debug;

    /// The head function symbol. Applications of the same declaration to
    /// pairwise-merged arguments are congruent.
    fn decl(&self) -> Self::Decl;

    /// The sort of the term. Only nodes of the same sort may merge.
    fn sort(&self) -> Self::Sort;

    /// Is this term an equality atom `a = b`?
    fn is_eq(&self) -> bool;

    /// Does this term denote a unique value (a numeral, a boolean literal,
    /// ...)? Two distinct unique values in one class is a conflict.
    fn is_unique_value(&self) -> bool;

    /// Is this the boolean constant `true`?
    fn is_true(&self) -> bool;

    /// Is this the boolean constant `false`?
    fn is_false(&self) -> bool;

    /// Is the head declaration a commutative binary function? Commutative
    /// applications are congruent up to swapping their two arguments.
    fn is_commutative(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TermKind {
    App,
    Eq,
    True,
    False,
    Value,
}

#[derive(Debug)]
struct TermData {
    id: u32,
    op: Symbol,
    sort: Symbol,
    kind: TermKind,
    commutative: bool,
}

/// A term of the built-in demo language, hash-consed by a [`TermBank`].
///
/// This plays the role [`SymbolLang`] plays in equality-saturation
/// libraries: the quick-and-dirty language used by the tests and by anyone
/// who wants to try the e-graph without writing their own [`Term`] type.
///
/// [`SymbolLang`]: https://docs.rs/egg/latest/egg/struct.SymbolLang.html
#[derive(Clone)]
pub struct SymbolTerm(Rc<TermData>);

impl PartialEq for SymbolTerm {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for SymbolTerm {}

impl Hash for SymbolTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state)
    }
}

impl Debug for SymbolTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.op)
    }
}

impl Display for SymbolTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.op)
    }
}

impl Term for SymbolTerm {
    type Decl = Symbol;
    type Sort = Symbol;

    fn decl(&self) -> Symbol {
        self.0.op
    }

    fn sort(&self) -> Symbol {
        self.0.sort
    }

    fn is_eq(&self) -> bool {
        self.0.kind == TermKind::Eq
    }

    fn is_unique_value(&self) -> bool {
        matches!(
            self.0.kind,
            TermKind::Value | TermKind::True | TermKind::False
        )
    }

    fn is_true(&self) -> bool {
        self.0.kind == TermKind::True
    }

    fn is_false(&self) -> bool {
        self.0.kind == TermKind::False
    }

    fn is_commutative(&self) -> bool {
        self.0.commutative
    }
}

type TermKey = (Symbol, Symbol, TermKind, bool, Vec<u32>);

/// A tiny hash-consing factory for [`SymbolTerm`]s.
///
/// Calling the same constructor with the same arguments returns the same
/// term, so terms can be compared and hashed by identity, as [`Term`]
/// requires.
#[derive(Debug, Default)]
pub struct TermBank {
    memo: HashMap<TermKey, SymbolTerm>,
    next_id: u32,
}

impl TermBank {
    fn intern(
        &mut self,
        op: Symbol,
        sort: Symbol,
        kind: TermKind,
        commutative: bool,
        args: &[SymbolTerm],
    ) -> SymbolTerm {
        let key = (
            op,
            sort,
            kind,
            commutative,
            args.iter().map(|t| t.0.id).collect(),
        );
        if let Some(t) = self.memo.get(&key) {
            return t.clone();
        }
        let id = self.next_id;
        self.next_id += 1;
        let t = SymbolTerm(Rc::new(TermData {
            id,
            op,
            sort,
            kind,
            commutative,
        }));
        self.memo.insert(key, t.clone());
        t
    }

    /// An uninterpreted constant named `op` of sort `sort`.
    pub fn leaf(&mut self, op: &str, sort: &str) -> SymbolTerm {
        self.intern(op.into(), sort.into(), TermKind::App, false, &[])
    }

    /// An application of `op` to `args`, of sort `sort`.
    pub fn app(&mut self, op: &str, sort: &str, args: &[SymbolTerm]) -> SymbolTerm {
        self.intern(op.into(), sort.into(), TermKind::App, false, args)
    }

    /// Like [`app`](TermBank::app), but the declaration is a commutative
    /// binary function.
    pub fn app_commutative(&mut self, op: &str, sort: &str, args: &[SymbolTerm]) -> SymbolTerm {
        assert_eq!(args.len(), 2, "commutative declarations are binary");
        self.intern(op.into(), sort.into(), TermKind::App, true, args)
    }

    /// A unique-value constant (numeral-like): distinct values never share
    /// a class.
    pub fn value(&mut self, op: &str, sort: &str) -> SymbolTerm {
        self.intern(op.into(), sort.into(), TermKind::Value, false, &[])
    }

    /// The boolean constant `true`.
    pub fn mk_true(&mut self) -> SymbolTerm {
        self.intern("true".into(), "Bool".into(), TermKind::True, false, &[])
    }

    /// The boolean constant `false`.
    pub fn mk_false(&mut self) -> SymbolTerm {
        self.intern("false".into(), "Bool".into(), TermKind::False, false, &[])
    }

    /// The equality atom `a = b`.
    pub fn eq(&mut self, a: &SymbolTerm, b: &SymbolTerm) -> SymbolTerm {
        self.intern(
            "=".into(),
            "Bool".into(),
            TermKind::Eq,
            false,
            &[a.clone(), b.clone()],
        )
    }
}
