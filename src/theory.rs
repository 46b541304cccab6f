use crate::Id;

/// Identifies a theory solver registered with the driver.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct TheoryId(u32);

/// A theory solver's handle for a class it is watching.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct TheoryVar(u32);

impl From<u32> for TheoryId {
    fn from(n: u32) -> TheoryId {
        TheoryId(n)
    }
}

impl From<u32> for TheoryVar {
    fn from(n: u32) -> TheoryVar {
        TheoryVar(n)
    }
}

impl std::fmt::Debug for TheoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TheoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for TheoryVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TheoryVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TheoryId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// An event destined for a theory solver, queued by the e-graph in
/// discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TheoryEvent<T> {
    /// Two variables of `theory` ended up attached to the same class:
    /// `node` (carrying `v2`) now has root `root` (carrying `v1`).
    Eq {
        /// The theory both variables belong to.
        theory: TheoryId,
        /// The root's variable.
        v1: TheoryVar,
        /// The newly co-located variable.
        v2: TheoryVar,
        /// The node that brought `v2` into the class.
        node: Id,
        /// The class root.
        root: Id,
    },
    /// An equality atom `eq` over two `theory`-attached classes was merged
    /// with `false`, so the attached variables are disequal.
    Diseq {
        /// The theory both variables belong to.
        theory: TheoryId,
        /// The variable attached to one side of the equality.
        v1: TheoryVar,
        /// The variable attached to the other side.
        v2: TheoryVar,
        /// The falsified equality atom.
        eq: T,
    },
}

impl<T> TheoryEvent<T> {
    /// The theory this event is destined for.
    pub fn theory(&self) -> TheoryId {
        match self {
            TheoryEvent::Eq { theory, .. } | TheoryEvent::Diseq { theory, .. } => *theory,
        }
    }
}
