//! chained-set: a separately chained hash set with a caller-fixed growth
//! schedule and a pluggable allocator.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, embeddable table whose policy knobs (memory, hashing,
//!   growth) are all supplied by the caller, with the table itself written
//!   in safe, verifiable layers.
//! - Layers:
//!   - array_alloc: the one contained-unsafe helper, a fallible boxed-slice
//!     allocation through an explicit allocator. Everything above it is
//!     safe Rust.
//!   - ChainedSet<K, S, A>: bucket array + owned-box chain links, growth
//!     scheduling, and the insert/lookup protocol.
//!
//! Capability bundle (all generic parameters, no runtime polymorphism)
//! - `A: Allocator + Clone` (allocator-api2): every internal allocation
//!   (the growth-schedule copy, each bucket array, each chain node) goes
//!   through it; nothing assumes the global allocator. Allocation failure
//!   surfaces as `Err(AllocError)` from whichever operation hit it.
//! - `S: BuildHasher` + `K: Eq + Hash`: keys are opaque to the table; it
//!   never interprets their contents.
//! - Displaced keys: an in-place update returns the old key from `set`
//!   instead of invoking a stored destructor callback, so disposal happens
//!   exactly once and is enforced by ownership rather than by wiring.
//!
//! Growth model
//! - The bucket array only ever grows, stepping one entry at a time
//!   through the schedule fixed at construction; at the last entry the
//!   table keeps accepting insertions past its nominal load factor.
//! - Every node caches its 64-bit hash. Resizing moves node boxes onto
//!   their new chains by cached hash alone: no rehash, no reallocation, no
//!   calls into key code.
//!
//! Constraints
//! - Single logical owner: `get` is `&self`, `set` is `&mut self`, which
//!   is exactly the safe-concurrency contract (shared lookups, exclusive
//!   mutation). There is no internal synchronization.
//! - No removal, no iteration, no clear/drain: the surface is
//!   construction, `get`, `set`, and size observers. These gaps are
//!   deliberate scope boundaries, not oversights. `Drop` still releases
//!   every allocation back through `A`.
//!
//! Known quirk (preserved deliberately)
//! - The insert walk never compares the chain's current tail, so `set`
//!   with a key equal to a tail entry appends a duplicate node instead of
//!   updating, and `get` keeps returning the older entry. This crate
//!   reproduces that behavior exactly, pins it down with regression tests,
//!   and documents it on [`ChainedSet::set`].

mod array_alloc;
pub mod chained_set;
mod chained_set_proptest;

// Public surface
pub use allocator_api2::alloc::{AllocError, Allocator, Global};
pub use chained_set::ChainedSet;
