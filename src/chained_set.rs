//! ChainedSet: separate-chaining table with a fixed growth schedule and an
//! explicit allocator.

use crate::array_alloc::try_boxed_slice;
use allocator_api2::alloc::{AllocError, Allocator, Global};
use allocator_api2::boxed::Box;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use std::collections::hash_map::RandomState;

/// A chain link: `None` is an empty slot or the end of a chain.
type Link<K, A> = Option<Box<Node<K, A>, A>>;

/// One stored entry. The key lives inside the node allocation, and the hash
/// computed at insertion time is cached so resizing never rehashes.
struct Node<K, A: Allocator> {
    key: K,
    hash: u64,
    next: Link<K, A>,
}

/// A hash set with separate chaining, a caller-fixed growth schedule, and a
/// pluggable allocator.
///
/// The bucket array grows through the schedule given at construction and
/// only ever forward: once the last schedule entry is reached the table
/// keeps accepting insertions and simply exceeds its nominal load factor.
/// Nothing is ever removed; the surface is construction, [`get`] and
/// [`set`] plus size observers.
///
/// # Update semantics
///
/// `set` replaces in place when it finds an equal key while walking a
/// chain, but the walk never compares against the chain's current tail.
/// Inserting a key equal to a chain's tail therefore appends a second node
/// behind it instead of updating, and `get` keeps returning the older,
/// head-ward entry. See [`ChainedSet::set`] for the full contract. The
/// behavior is part of the crate's compatibility contract and is locked
/// in by regression tests.
///
/// [`get`]: ChainedSet::get
/// [`set`]: ChainedSet::set
pub struct ChainedSet<K, S = RandomState, A: Allocator = Global> {
    buckets: Box<[Link<K, A>], A>,
    sizes: Box<[usize], A>,
    size_index: usize,
    len: usize,
    /// `len` value at which the next `set` resizes; truncated product of the
    /// current bucket count and the load factor.
    grow_at: usize,
    load_factor: f64,
    hash_builder: S,
    alloc: A,
}

impl<K> ChainedSet<K, RandomState, Global>
where
    K: Eq + Hash,
{
    /// Creates a table over the given growth schedule with the default
    /// hasher and the global allocator. See [`ChainedSet::with_hasher_in`]
    /// for the schedule and load-factor requirements.
    pub fn new(sizes: &[usize], load_factor: f64) -> Result<Self, AllocError> {
        Self::with_hasher_in(sizes, load_factor, RandomState::default(), Global)
    }
}

impl<K, S> ChainedSet<K, S, Global>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates a table with a caller-supplied hasher and the global
    /// allocator.
    pub fn with_hasher(sizes: &[usize], load_factor: f64, hasher: S) -> Result<Self, AllocError> {
        Self::with_hasher_in(sizes, load_factor, hasher, Global)
    }
}

impl<K, S, A> ChainedSet<K, S, A>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: Allocator + Clone,
{
    /// Creates a table with a caller-supplied hasher and allocator.
    ///
    /// `sizes` is the growth schedule: a non-empty, strictly increasing
    /// sequence of candidate bucket counts. `sizes[0]` is the initial
    /// bucket count and the last entry is the largest the table will ever
    /// use. `load_factor` must be positive. The requirements are checked
    /// with `debug_assert!`; a malformed schedule in release builds gives
    /// unspecified growth behavior, never memory unsafety.
    ///
    /// The table copies `sizes` and allocates the initial bucket array
    /// through `alloc`. If either allocation fails the one made first is
    /// released and `Err` is returned: no partial table is ever visible.
    pub fn with_hasher_in(
        sizes: &[usize],
        load_factor: f64,
        hasher: S,
        alloc: A,
    ) -> Result<Self, AllocError> {
        debug_assert!(!sizes.is_empty(), "growth schedule must not be empty");
        debug_assert!(sizes[0] > 0, "bucket counts must be positive");
        debug_assert!(
            sizes.windows(2).all(|w| w[0] < w[1]),
            "growth schedule must be strictly increasing"
        );
        debug_assert!(load_factor > 0.0, "load factor must be positive");

        let sizes_copy = try_boxed_slice(&alloc, sizes.len(), |i| sizes[i])?;
        let buckets = try_boxed_slice(&alloc, sizes[0], |_| None)?;
        Ok(Self {
            buckets,
            grow_at: (sizes[0] as f64 * load_factor) as usize,
            sizes: sizes_copy,
            size_index: 0,
            len: 0,
            load_factor,
            hash_builder: hasher,
            alloc,
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current length of the bucket array. Always one of the schedule
    /// entries, and monotone over the table's lifetime.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Looks up `key` and returns a reference to the key stored in the
    /// table, or `None`.
    ///
    /// The chain is scanned front-to-back and the first equal entry wins,
    /// so when a chain carries tail-duplicated entries (see [`set`]) the
    /// oldest one shadows the rest. Never allocates, never mutates.
    ///
    /// [`set`]: ChainedSet::set
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        let mut cur = self.buckets[self.bucket_index(hash)].as_deref();
        while let Some(node) = cur {
            if node.key.borrow() == key {
                return Some(&node.key);
            }
            cur = node.next.as_deref();
        }
        None
    }

    /// Inserts `key`, or replaces an equal stored key in place.
    ///
    /// Returns `Ok(Some(old))` when an existing entry's key was replaced;
    /// the displaced key is handed back to the caller exactly once, which
    /// is where a caller that manages external resources per key disposes
    /// of them. Returns `Ok(None)` when a new node was appended.
    ///
    /// Growth happens first: when `len` has reached the current trigger
    /// and the schedule has a next entry, the bucket array is resized
    /// before the chain walk. A committed resize is retained even if the
    /// subsequent node allocation fails.
    ///
    /// The chain walk compares every node *except the current tail*. A key
    /// equal to the tail's is appended as a second node rather than
    /// replacing it, `len` grows, and lookups keep resolving to the older
    /// entry. This tail-duplication is part of the crate's compatibility
    /// contract; callers that never re-insert a key that may sit at a
    /// chain tail never observe it.
    ///
    /// # Errors
    ///
    /// `Err(AllocError)` when the allocator refuses the resize or the new
    /// node. Aside from a resize that had already committed, the table is
    /// left exactly as it was, and stays fully usable.
    pub fn set(&mut self, key: K) -> Result<Option<K>, AllocError> {
        if self.len == self.grow_at {
            self.grow()?;
        }
        let hash = self.hash_builder.hash_one(&key);
        let index = self.bucket_index(hash);
        let alloc = self.alloc.clone();

        let mut link = &mut self.buckets[index];
        while let Some(node) = link {
            // The tail is never compared; an equal key lands behind it as
            // a duplicate node instead of replacing in place.
            if node.next.is_some() && node.key == key {
                return Ok(Some(mem::replace(&mut node.key, key)));
            }
            link = &mut node.next;
        }
        *link = Some(Box::try_new_in(
            Node {
                key,
                hash,
                next: None,
            },
            alloc,
        )?);
        self.len += 1;
        Ok(None)
    }

    /// Advances the growth schedule by one step, or does nothing when the
    /// last entry has been reached. On allocation failure the table is
    /// left entirely unchanged; once the new bucket array is installed the
    /// resize is committed and is never rolled back.
    fn grow(&mut self) -> Result<(), AllocError> {
        if self.size_index == self.sizes.len() - 1 {
            return Ok(());
        }
        let new_count = self.sizes[self.size_index + 1];
        let new_buckets = try_boxed_slice(&self.alloc, new_count, |_| None)?;
        self.size_index += 1;
        self.grow_at = (new_count as f64 * self.load_factor) as usize;
        let old_buckets = mem::replace(&mut self.buckets, new_buckets);
        self.relink(old_buckets);
        Ok(())
    }

    /// Moves every node of `old` onto the chain its cached hash selects in
    /// the current bucket array. Nodes are moved as-is: no reallocation, no
    /// rehashing. Appending at the tail keeps colliding keys in source
    /// order per target chain.
    fn relink(&mut self, mut old: Box<[Link<K, A>], A>) {
        for slot in old.iter_mut() {
            let mut head = slot.take();
            while let Some(mut node) = head {
                head = node.next.take();
                let index = self.bucket_index(node.hash);
                let mut link = &mut self.buckets[index];
                while let Some(next) = link {
                    link = &mut next.next;
                }
                *link = Some(node);
            }
        }
        // `old` is released here; its chains are already empty.
    }

    /// Test-only walk of every chain, counting nodes and checking that each
    /// sits in the bucket its cached hash selects.
    #[cfg(test)]
    pub(crate) fn check_chains(&self) -> usize {
        assert_eq!(self.buckets.len(), self.sizes[self.size_index]);
        let mut count = 0;
        for (i, slot) in self.buckets.iter().enumerate() {
            let mut cur = slot.as_deref();
            while let Some(node) = cur {
                assert_eq!(self.bucket_index(node.hash), i, "node in wrong bucket");
                count += 1;
                cur = node.next.as_deref();
            }
        }
        assert_eq!(count, self.len, "len out of sync with reachable nodes");
        count
    }
}

impl<K, S, A: Allocator> Drop for ChainedSet<K, S, A> {
    fn drop(&mut self) {
        // Unlink iteratively so chain length never becomes drop recursion
        // depth; the bucket array itself is released by its own drop.
        for slot in self.buckets.iter_mut() {
            let mut cur = slot.take();
            while let Some(mut node) = cur {
                cur = node.next.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::{BuildHasherDefault, Hasher};

    /// Hasher that sends every key to bucket 0, forcing one long chain.
    #[derive(Default)]
    struct ConstHasher;
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }
    type ConstBuildHasher = BuildHasherDefault<ConstHasher>;

    /// Key whose identity is `id` alone; `tag` tells apart values that
    /// compare (and hash) equal.
    #[derive(Debug, Clone, Copy)]
    struct Tagged {
        id: u32,
        tag: u32,
    }
    impl PartialEq for Tagged {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for Tagged {}
    impl Hash for Tagged {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    /// Invariant: a freshly constructed table is empty, sized to the first
    /// schedule entry, and resolves no lookups.
    #[test]
    fn construction_initial_state() {
        let set: ChainedSet<u32> = ChainedSet::new(&[4, 8, 16], 0.75).unwrap();
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
        assert_eq!(set.bucket_count(), 4);
        assert!(set.get(&1).is_none());
        set.check_chains();
    }

    /// Invariant: an inserted key is retrievable and the returned
    /// reference is the stored key, not the query.
    #[test]
    fn set_then_get_round_trip() {
        let mut set = ChainedSet::new(&[4, 8], 0.75).unwrap();
        for k in [3u32, 11, 42] {
            assert_eq!(set.set(k).unwrap(), None);
        }
        for k in [3u32, 11, 42] {
            assert_eq!(set.get(&k), Some(&k));
        }
        assert!(set.get(&7).is_none());
        assert_eq!(set.len(), 3);
        set.check_chains();
    }

    /// The documented scenario for `sizes = [4, 8, 16]`, `load_factor =
    /// 0.75`: the third insert leaves the table at 4 buckets (trigger is
    /// `len == 3` *entering* a call), the fourth resizes to 8 before the
    /// key lands, and every earlier key stays retrievable.
    #[test]
    fn growth_trigger_concrete_scenario() {
        let mut set = ChainedSet::new(&[4, 8, 16], 0.75).unwrap();
        for k in [1u32, 2, 3] {
            set.set(k).unwrap();
            assert_eq!(set.bucket_count(), 4);
        }
        set.set(4).unwrap();
        assert_eq!(set.bucket_count(), 8);
        assert_eq!(set.size_index, 1);
        for k in 1u32..=4 {
            assert_eq!(set.get(&k), Some(&k));
        }
        set.check_chains();
    }

    /// Invariant: growth stops at the last schedule entry; the table then
    /// exceeds its nominal load factor indefinitely and keeps working.
    #[test]
    fn growth_saturates_at_schedule_end() {
        let mut set = ChainedSet::new(&[2, 4], 1.0).unwrap();
        for k in 0u32..32 {
            set.set(k).unwrap();
            assert!(set.bucket_count() <= 4);
        }
        assert_eq!(set.bucket_count(), 4);
        assert_eq!(set.size_index, 1);
        assert_eq!(set.len(), 32);
        for k in 0u32..32 {
            assert_eq!(set.get(&k), Some(&k));
        }
        set.check_chains();
    }

    /// A schedule whose first trigger truncates to zero resizes on the
    /// very first `set`, before anything is inserted.
    #[test]
    fn zero_trigger_grows_immediately() {
        let mut set = ChainedSet::new(&[4, 8], 0.1).unwrap();
        assert_eq!(set.grow_at, 0);
        set.set(1u32).unwrap();
        assert_eq!(set.bucket_count(), 8);
        assert_eq!(set.len(), 1);
        set.check_chains();
    }

    /// Resize relinks every node by its cached hash: after growing under a
    /// constant hasher all entries still live on one chain scanned in
    /// insertion order, and none are lost.
    #[test]
    fn resize_preserves_reachability_under_collisions() {
        let mut set: ChainedSet<u32, ConstBuildHasher> =
            ChainedSet::with_hasher(&[2, 8], 1.0, ConstBuildHasher::default()).unwrap();
        for k in 0u32..8 {
            set.set(k).unwrap();
        }
        assert_eq!(set.bucket_count(), 8);
        for k in 0u32..8 {
            assert_eq!(set.get(&k), Some(&k));
        }
        assert_eq!(set.check_chains(), 8);
    }

    /// Regression: the chain walk never compares the tail, so re-setting a
    /// key that sits at the tail appends a duplicate instead of updating,
    /// and lookups keep resolving to the older entry.
    #[test]
    fn tail_collision_appends_duplicate() {
        let mut set = ChainedSet::new(&[4, 8], 0.75).unwrap();
        assert_eq!(set.set(Tagged { id: 1, tag: 10 }).unwrap(), None);
        // Equal key, single-entry chain: the match would be the tail, so a
        // second node appears instead of a replacement.
        assert_eq!(set.set(Tagged { id: 1, tag: 20 }).unwrap(), None);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(&Tagged { id: 1, tag: 99 }).unwrap().tag, 10);
        set.check_chains();
    }

    /// Once a duplicate shadows the tail, a third equal `set` matches the
    /// head (now a non-tail node) and replaces in place, returning the
    /// displaced key exactly once.
    #[test]
    fn non_tail_match_replaces_in_place() {
        let mut set = ChainedSet::new(&[4, 8], 0.75).unwrap();
        set.set(Tagged { id: 1, tag: 10 }).unwrap();
        set.set(Tagged { id: 1, tag: 20 }).unwrap();
        let displaced = set.set(Tagged { id: 1, tag: 30 }).unwrap();
        assert_eq!(displaced.unwrap().tag, 10);
        assert_eq!(set.len(), 2, "replacement must not grow the table");
        assert_eq!(set.get(&Tagged { id: 1, tag: 99 }).unwrap().tag, 30);
        set.check_chains();
    }

    /// Replacing in place keeps the node's cached hash, so the entry stays
    /// reachable across a later resize.
    #[test]
    fn replaced_entry_survives_resize() {
        let mut set: ChainedSet<Tagged, ConstBuildHasher> =
            ChainedSet::with_hasher(&[4, 8], 1.0, ConstBuildHasher::default()).unwrap();
        set.set(Tagged { id: 1, tag: 1 }).unwrap();
        set.set(Tagged { id: 1, tag: 2 }).unwrap();
        set.set(Tagged { id: 1, tag: 3 }).unwrap();
        // Push len to the trigger and across a resize.
        for id in 2u32..=4 {
            set.set(Tagged { id, tag: 0 }).unwrap();
        }
        assert_eq!(set.bucket_count(), 8);
        assert_eq!(set.get(&Tagged { id: 1, tag: 99 }).unwrap().tag, 3);
        set.check_chains();
    }

    /// Borrowed lookup: store `String`, query with `&str`, in the same way
    /// the standard map surface allows.
    #[test]
    fn borrowed_lookup_with_str() {
        let mut set: ChainedSet<String> = ChainedSet::new(&[4, 8], 0.75).unwrap();
        set.set("hello".to_string()).unwrap();
        assert_eq!(set.get("hello"), Some(&"hello".to_string()));
        assert!(set.get("world").is_none());
    }

    /// Distinct keys that collide into one bucket stay individually
    /// retrievable; the chain resolves by equality, not by hash.
    #[test]
    fn collision_chain_resolves_by_equality() {
        let mut set: ChainedSet<u32, ConstBuildHasher> =
            ChainedSet::with_hasher(&[4, 64], 16.0, ConstBuildHasher::default()).unwrap();
        for k in 0u32..16 {
            set.set(k).unwrap();
        }
        for k in 0u32..16 {
            assert_eq!(set.get(&k), Some(&k));
        }
        assert!(set.get(&16).is_none());
        assert_eq!(set.check_chains(), 16);
    }
}
