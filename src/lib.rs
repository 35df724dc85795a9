//! window-hashmap: a single-threaded chained hash map whose collision
//! chains are contiguous windows of one shared entry list.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: average O(1) keyed access plus single-pass traversal of all
//!   entries without maintaining a second per-entry structure.
//! - Layers:
//!   - EntryList<K, V>: insertion-ordered entry storage. Entries live in
//!     a SlotMap arena and are threaded onto an intrusive doubly linked
//!     list, so a position stays valid while its entry lives and cannot
//!     alias a later entry after removal (generational keys).
//!   - WindowHashMap<K, V, S>: the public map. A bucket table of
//!     `Option<Window>` slots where each occupied bucket records the
//!     `[head, tail]` boundary of the contiguous run of list positions
//!     holding its entries. Lookups hash to a bucket and scan only that
//!     bucket's window; traversal walks the one shared list.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design (no atomics).
//! - Unique keys: inserting a key that is already present keeps the
//!   stored value and returns the existing position.
//! - Bucket windows are maximal contiguous runs: a new collision is
//!   always spliced directly after its bucket's tail, and erase only
//!   ever shrinks a window at its ends or unlinks a strict interior
//!   node, so window boundaries never point at foreign or freed entries.
//! - Load factor is capped at 0.5: the table doubles (from an initial 16
//!   buckets) before any insert that would push `2 * len` past the
//!   bucket count. A rebuild re-places every entry and invalidates every
//!   previously obtained position.
//!
//! Reentrancy policy
//! - Public entry points only invoke user code via `K: Eq/Hash` while
//!   probing. A debug-only guard at each entry point panics on nested
//!   entry, so internal state that is transiently inconsistent during a
//!   mutation can never be observed; release builds compile the guard
//!   to a no-op.
//!
//! Hasher and rebuild invariants
//! - Each entry stores its precomputed `u64` digest and bucket selection
//!   always uses the stored digest modulo the bucket count; `K: Hash` is
//!   never invoked again after insertion. Rebuild and `Clone` therefore
//!   redistribute entries without calling back into user code.
//!
//! Notes and non-goals
//! - The bucket table never shrinks; `clear` keeps the current capacity.
//! - Positions (`Pos`) obtained from `insert`/`find` must be re-resolved
//!   after any mutating call: erase of that entry or any rebuild makes
//!   them resolve to `None` rather than to a different entry.
//! - Mutable traversal visits entries in arena storage order; shared
//!   traversal follows list order. Neither order is contractual.
//! - Public API surface is `WindowHashMap`, `Pos` and `AccessError`; the
//!   entry list is an implementation detail.

mod entry_list;
mod guard;
pub mod window_hash_map;
mod window_hash_map_proptest;

// Public surface
pub use window_hash_map::{AccessError, Pos, WindowHashMap};
