//! Visiting-set guard for recursive walks over declarations.
//!
//! F-bounded parameters (`T extends Comparable<T>`) and user-declared
//! hierarchies can ask the same subtype question again before the first
//! answer is known. A guard remembers the keys currently on the stack and
//! caps both the depth and the total number of entries, so the walk answers
//! instead of looping.
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::SubtypeCheck);
//! match guard.enter(key) {
//!     RecursionResult::Entered => {
//!         let answer = walk();
//!         guard.leave(key);
//!         answer
//!     }
//!     RecursionResult::Cycle => true,
//!     RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => false,
//! }
//! ```

use polyinfer_common::limits;
use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Limit presets, one per kind of walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Subtype checks in the nominal oracle.
    SubtypeCheck,
    /// `as_super` and the supertype closure used by lub.
    SupertypeWalk,
    /// Nested lub over type arguments. Past this depth arguments become `?`.
    LeastUpperBound,
    #[cfg(test)]
    Custom { max_depth: u32, max_entries: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => limits::MAX_TYPE_WALK_DEPTH,
            Self::SupertypeWalk => limits::MAX_SUPERTYPE_DEPTH,
            Self::LeastUpperBound => 2,
            #[cfg(test)]
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    const fn max_entries(self) -> u32 {
        match self {
            Self::SubtypeCheck | Self::SupertypeWalk => 100_000,
            Self::LeastUpperBound => 10_000,
            #[cfg(test)]
            Self::Custom { max_entries, .. } => max_entries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already on the stack.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }
}

pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    entries: u32,
    profile: RecursionProfile,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            entries: 0,
            profile,
        }
    }

    /// Every `Entered` must be paired with a [`leave`](Self::leave) of the
    /// same key.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.entries = self.entries.saturating_add(1);
        if self.entries > self.profile.max_entries() {
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.profile.max_depth() {
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let removed = self.visiting.remove(&key);
        debug_assert!(removed, "leave() without a matching enter()");
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!("RecursionGuard dropped with {} keys still entered", self.visiting.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revisit_is_a_cycle() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::SubtypeCheck);
        assert!(guard.enter(1u32).is_entered());
        assert_eq!(guard.enter(1u32), RecursionResult::Cycle);
        assert!(guard.enter(2u32).is_entered());
        guard.leave(2u32);
        guard.leave(1u32);
        assert!(guard.enter(1u32).is_entered());
        guard.leave(1u32);
    }

    #[test]
    fn test_limits() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Custom {
            max_depth: 1,
            max_entries: 3,
        });
        assert!(guard.enter(1u32).is_entered());
        assert_eq!(guard.enter(2u32), RecursionResult::DepthExceeded);
        guard.leave(1u32);
        assert!(guard.enter(3u32).is_entered());
        guard.leave(3u32);
        assert_eq!(guard.enter(4u32), RecursionResult::IterationExceeded);
    }
}
