//! String Interner for declaration and type parameter names.
//!
//! Names are interned into a shared pool and passed around as u32 indices
//! (Atoms). Comparisons become integer comparisons (atom_a == atom_b)
//! instead of string comparisons.
//!
//! The interner is shared by reference between the type store and every
//! inference request, so interning goes through `&self` behind a `RwLock`.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use `Interner::resolve(atom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Default)]
struct InternerState {
    /// Map from string to atom index
    map: FxHashMap<Arc<str>, Atom>,
    /// Vector of all interned strings (index 0 is empty string)
    strings: Vec<Arc<str>>,
}

/// String interner that deduplicates strings and returns Atom handles.
///
/// # Example
/// ```
/// use polyinfer_common::interner::Interner;
/// let interner = Interner::new();
/// let a1 = interner.intern("List");
/// let a2 = interner.intern("List");
/// assert_eq!(a1, a2);
/// assert_eq!(&*interner.resolve(a1), "List");
/// ```
pub struct Interner {
    state: RwLock<InternerState>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut state = InternerState {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        // Index 0 is reserved for empty/none
        let empty: Arc<str> = Arc::from("");
        state.strings.push(empty.clone());
        state.map.insert(empty, Atom::NONE);
        Interner {
            state: RwLock::new(state),
        }
    }

    /// Intern a string, returning its Atom handle.
    /// If the string was already interned, returns the existing Atom.
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }
        if let Ok(state) = self.state.read()
            && let Some(&atom) = state.map.get(s)
        {
            return atom;
        }
        let Ok(mut state) = self.state.write() else {
            // Poisoned lock: keep going with the sentinel rather than panic
            return Atom::NONE;
        };
        // Another writer may have won the race between the two locks.
        if let Some(&atom) = state.map.get(s) {
            return atom;
        }
        let atom = Atom(state.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        state.strings.push(owned.clone());
        state.map.insert(owned, atom);
        atom
    }

    /// Resolve an Atom back to its string value.
    /// Returns empty string if atom is out of bounds.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    /// Try to resolve an Atom, returning None if invalid.
    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let state = self.state.read().ok()?;
        state.strings.get(atom.0 as usize).cloned()
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.strings.len()).unwrap_or(0)
    }

    /// Check if the interner is empty (only has the empty string).
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let interner = Interner::new();
        let a = interner.intern("Comparator");
        let b = interner.intern("Comparator");
        let c = interner.intern("Function");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(&*interner.resolve(c), "Function");
    }

    #[test]
    fn test_empty_string_is_none_atom() {
        let interner = Interner::new();
        assert_eq!(interner.intern(""), Atom::NONE);
        assert!(interner.is_empty());
        interner.intern("T");
        assert!(!interner.is_empty());
    }

    #[test]
    fn test_resolve_out_of_range() {
        let interner = Interner::new();
        assert!(interner.try_resolve(Atom(99)).is_none());
        assert_eq!(&*interner.resolve(Atom(99)), "");
    }
}
