/// An interned string, provided by the
/// [`symbol_table`](https://crates.io/crates/symbol_table) crate.
///
/// The built-in [`SymbolTerm`](crate::SymbolTerm) language uses [`Symbol`]s
/// for operators and sorts so that comparisons and hashing stay cheap. A
/// [`Symbol`] is a wrapper around an integer index into a global table; the
/// table leaks its strings, which is fine for operator names and sorts.
pub use symbol_table::GlobalSymbol as Symbol;

pub(crate) type BuildHasher = fxhash::FxBuildHasher;

pub(crate) use hashmap::*;

#[cfg(feature = "deterministic")]
mod hashmap {
    pub(crate) type HashMap<K, V> = super::IndexMap<K, V>;
}
#[cfg(not(feature = "deterministic"))]
mod hashmap {
    use super::BuildHasher;
    pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;
}

#[allow(dead_code)]
pub(crate) type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

/// Mutably borrow two distinct elements at once.
pub(crate) fn two_mut<T>(xs: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = xs.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = xs.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
