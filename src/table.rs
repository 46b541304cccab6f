use std::fmt::Debug;
use std::hash::Hash;

use crate::util::HashMap;
use crate::Id;

/// The congruence signature of an application node: its declaration, its
/// sort, and the class representatives of its arguments.
///
/// For a commutative binary declaration the two argument roots are stored
/// in a canonical order, so swapped applications share a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Signature<D, S> {
    pub decl: D,
    pub sort: S,
    pub args: Vec<Id>,
}

/// The congruence table: maps signatures to the node that owns them.
///
/// Only enabled, non-equality application nodes live here. Since arguments
/// appear by their *roots*, entries go stale when classes merge; the merge
/// protocol erases affected parents before swinging roots and re-inserts
/// them afterwards, treating any collision as a discovered congruence.
#[derive(Debug, Clone)]
pub(crate) struct CongruenceTable<D, S> {
    map: HashMap<Signature<D, S>, Id>,
}

impl<D, S> Default for CongruenceTable<D, S> {
    fn default() -> Self {
        CongruenceTable {
            map: HashMap::default(),
        }
    }
}

impl<D: Eq + Hash, S: Eq + Hash> CongruenceTable<D, S> {
    /// Insert `n` under `sig`, keeping any node already present.
    ///
    /// Returns the owner of the signature afterwards: `n` itself on a
    /// miss, the congruent occupant on a hit.
    pub fn insert(&mut self, sig: Signature<D, S>, n: Id) -> Id {
        *self.map.entry(sig).or_insert(n)
    }

    /// Remove `n`'s entry, by identity: a signature owned by a different
    /// (congruent) node is left alone.
    pub fn erase(&mut self, sig: &Signature<D, S>, n: Id) {
        if self.map.get(sig) == Some(&n) {
            self.map.remove(sig);
        }
    }

    pub fn find(&self, sig: &Signature<D, S>) -> Option<Id> {
        self.map.get(sig).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Signature<D, S>, Id)> {
        self.map.iter().map(|(sig, &id)| (sig, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(decl: &'static str, args: &[usize]) -> Signature<&'static str, ()> {
        Signature {
            decl,
            sort: (),
            args: args.iter().copied().map(Id::from).collect(),
        }
    }

    #[test]
    fn insert_keeps_first_owner() {
        let mut table = CongruenceTable::default();
        let a = Id::from(0);
        let b = Id::from(1);
        assert_eq!(table.insert(sig("f", &[2]), a), a);
        assert_eq!(table.insert(sig("f", &[2]), b), a);
        assert_eq!(table.len(), 1);

        // erase is by identity: b does not own the entry
        table.erase(&sig("f", &[2]), b);
        assert_eq!(table.find(&sig("f", &[2])), Some(a));
        table.erase(&sig("f", &[2]), a);
        assert_eq!(table.find(&sig("f", &[2])), None);
    }
}
