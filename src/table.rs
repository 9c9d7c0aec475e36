//! An identifier-keyed associative table for runtime metadata.
//!
//! This module provides the unmanaged core table: a specialized key-value
//! container mapping interned [`Ident`] tokens to arbitrary values. It is
//! tuned for the access patterns of interpreter metadata — method tables,
//! instance-variable tables, constant tables — which means many small tables,
//! frequent lookup, and occasional full-table iteration that deletes or
//! replaces entries in place.
//!
//! # Features
//!
//! - Dual representation: a flat linearly-scanned array for small tables,
//!   an open-addressed hash table once the entry count crosses a threshold
//! - One-way conversion: a table never falls back to the compact form under
//!   delete churn (only [`IdTable::clear`] resets it)
//! - Callback-driven iteration that supports deletion and in-place value
//!   replacement during the pass, without skipping or revisiting entries
//! - Best-effort memory accounting for memory-pressure reporting
//!
//! # Example
//!
//! ```rust
//! use idtable::{ForeachResult, IdTable, Ident};
//!
//! let mut table = IdTable::new();
//! table.insert(Ident::new(1), "first");
//! table.insert(Ident::new(2), "second");
//!
//! assert_eq!(table.lookup(Ident::new(1)), Some(&"first"));
//! assert_eq!(table.len(), 2);
//!
//! // Drop every entry whose identifier is odd.
//! table.foreach(|id, _value| {
//!     if id.value() % 2 == 1 {
//!         ForeachResult::Delete
//!     } else {
//!         ForeachResult::Continue
//!     }
//! });
//! assert_eq!(table.len(), 1);
//! ```
//!
//! # Thread Safety
//!
//! The table is not internally synchronized. It assumes a single execution
//! context at a time, consistent with interpreter-internal metadata owned by
//! one thread or guarded by a coarser external lock.

use std::fmt;
use std::mem;

use crate::ident::Ident;

/// Maximum entry count for the compact (linear scan) representation.
///
/// Below this, an unordered flat array beats hashing overhead: typical
/// runtime tables hold a handful of names and fit in one or two cache lines.
const MAX_COMPACT_LEN: usize = 8;

/// Smallest bucket count for the hashed representation (power of two).
const MIN_HASHED_CAPACITY: usize = 16;

/// Multiplier for Fibonacci hashing of the dense identifier value.
const HASH_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Directive returned by a `foreach` callback after visiting an entry.
///
/// The callback drives the iteration: it decides per entry whether the pass
/// proceeds, ends, removes the entry just visited, or rewrites its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForeachResult {
    /// Proceed to the next entry.
    Continue,
    /// Terminate the pass immediately; no further entries are visited.
    Stop,
    /// Remove the entry just visited, then continue. No other entry is
    /// skipped or revisited, regardless of internal storage shuffling.
    Delete,
    /// Replace the entry's value in place, then continue. Only meaningful
    /// from [`IdTable::foreach_values_with_replace`]; returning it from a
    /// non-replacing pass is a protocol violation (debug assertion, treated
    /// as [`ForeachResult::Continue`] in release builds).
    Replace,
}

/// One slot of the hashed representation.
enum Bucket<V> {
    /// Never occupied; terminates probe sequences.
    Empty,
    /// Held an entry that was deleted; probe sequences continue past it.
    Tombstone,
    /// A live entry.
    Occupied(Ident, V),
}

/// Open-addressed storage: power-of-two capacity, linear probing, tombstone
/// deletion. Rebuilt (dropping tombstones) or doubled at 3/4 occupancy.
struct Hashed<V> {
    buckets: Vec<Bucket<V>>,
    /// Live entries.
    live: usize,
    /// Live entries plus tombstones; governs growth.
    used: usize,
}

impl<V> Hashed<V> {
    /// `capacity` must be a power of two.
    fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, || Bucket::Empty);
        Self {
            buckets,
            live: 0,
            used: 0,
        }
    }

    /// Home slot for `id` under the given power-of-two mask.
    fn home(id: Ident, mask: usize) -> usize {
        let mixed = u64::from(id.value()).wrapping_mul(HASH_MULTIPLIER);
        (mixed >> 32) as usize & mask
    }

    /// Probes for `id`, returning its bucket index if present.
    fn find(&self, id: Ident) -> Option<usize> {
        let mask = self.buckets.len() - 1;
        let mut idx = Self::home(id, mask);
        loop {
            match &self.buckets[idx] {
                Bucket::Occupied(key, _) if *key == id => return Some(idx),
                Bucket::Empty => return None,
                _ => {}
            }
            idx = (idx + 1) & mask;
        }
    }

    /// Inserts or overwrites, returning the previous value if the key existed.
    fn insert(&mut self, id: Ident, value: V) -> Option<V> {
        if (self.used + 1) * 4 > self.buckets.len() * 3 {
            self.grow();
        }
        let mask = self.buckets.len() - 1;
        let mut idx = Self::home(id, mask);
        let mut reuse: Option<usize> = None;
        // Ok(existing index) or Err((target slot, consumed a fresh Empty)).
        let probe = loop {
            match &self.buckets[idx] {
                Bucket::Occupied(key, _) if *key == id => break Ok(idx),
                Bucket::Occupied(..) => {}
                Bucket::Tombstone => {
                    if reuse.is_none() {
                        reuse = Some(idx);
                    }
                }
                Bucket::Empty => break Err((reuse.unwrap_or(idx), reuse.is_none())),
            }
            idx = (idx + 1) & mask;
        };
        match probe {
            Ok(existing) => {
                if let Bucket::Occupied(_, old) = &mut self.buckets[existing] {
                    Some(mem::replace(old, value))
                } else {
                    unreachable!("probe returned a non-occupied bucket")
                }
            }
            Err((slot, fresh)) => {
                if fresh {
                    self.used += 1;
                }
                self.buckets[slot] = Bucket::Occupied(id, value);
                self.live += 1;
                None
            }
        }
    }

    /// Removes `id`, leaving a tombstone so probe chains stay intact.
    fn remove(&mut self, id: Ident) -> Option<V> {
        let idx = self.find(id)?;
        match mem::replace(&mut self.buckets[idx], Bucket::Tombstone) {
            Bucket::Occupied(_, value) => {
                self.live -= 1;
                Some(value)
            }
            _ => unreachable!("find returned a non-occupied bucket"),
        }
    }

    /// Rebuilds the bucket array, dropping tombstones. Doubles the capacity
    /// when the live count alone justifies it; otherwise rebuilds in place to
    /// reclaim tombstoned slots.
    fn grow(&mut self) {
        let capacity = if self.live * 2 >= self.buckets.len() {
            self.buckets.len() * 2
        } else {
            self.buckets.len()
        };
        let mut fresh = Vec::with_capacity(capacity);
        fresh.resize_with(capacity, || Bucket::Empty);
        let old = mem::replace(&mut self.buckets, fresh);
        self.live = 0;
        self.used = 0;
        for bucket in old {
            if let Bucket::Occupied(id, value) = bucket {
                self.reinsert(id, value);
            }
        }
    }

    /// Insertion into a table known to contain no tombstones and no
    /// duplicate of `id`; only used while rebuilding.
    fn reinsert(&mut self, id: Ident, value: V) {
        let mask = self.buckets.len() - 1;
        let mut idx = Self::home(id, mask);
        while !matches!(self.buckets[idx], Bucket::Empty) {
            idx = (idx + 1) & mask;
        }
        self.buckets[idx] = Bucket::Occupied(id, value);
        self.live += 1;
        self.used += 1;
    }
}

/// Active representation of a table's backing storage.
///
/// At most one variant is live at a time; which one is determined solely by
/// the peak entry count since the table was created or last cleared.
enum Storage<V> {
    /// Unordered flat array, appended on insert, scanned on lookup.
    Compact(Vec<(Ident, V)>),
    /// Open-addressed hash table; entered once and never left (deletes do
    /// not convert back, avoiding representation thrash under churn).
    Hashed(Hashed<V>),
}

/// An identifier-keyed table mapping [`Ident`] tokens to values.
///
/// The table owns its backing storage exclusively and stores values by move;
/// it never inspects them. Keys are unique; no entry ordering is guaranteed
/// or preserved across insert, delete, or internal conversion.
///
/// Small tables use a compact linear-scan array. Once more than a fixed
/// threshold of entries has been held at once, storage converts one-way to an
/// open-addressed hash table. All operations behave identically in either
/// representation.
///
/// # Panics
///
/// Like the standard collections, running out of memory aborts the process.
/// No operation reports allocation failure as a recoverable error.
pub struct IdTable<V> {
    storage: Storage<V>,
}

impl<V> IdTable<V> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Storage::Compact(Vec::new()),
        }
    }

    /// Creates an empty table sized to hold at least `capacity` entries
    /// without converting or resizing.
    ///
    /// A hint within the compact threshold starts in compact form; a larger
    /// hint starts hashed immediately.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let storage = if capacity <= MAX_COMPACT_LEN {
            Storage::Compact(Vec::with_capacity(capacity))
        } else {
            Storage::Hashed(Hashed::with_capacity(hashed_capacity_for(capacity)))
        };
        Self { storage }
    }

    /// Inserts `value` under `id`, overwriting any previous value.
    ///
    /// Returns `true` if the identifier was already present. The previous
    /// value is dropped; a caller that manages value lifetimes out of band
    /// must release it before overwriting.
    pub fn insert(&mut self, id: Ident, value: V) -> bool {
        if let Storage::Compact(entries) = &mut self.storage {
            if let Some(entry) = entries.iter_mut().find(|entry| entry.0 == id) {
                entry.1 = value;
                return true;
            }
            if entries.len() < MAX_COMPACT_LEN {
                entries.push((id, value));
                return false;
            }
            self.convert_to_hashed();
        }
        match &mut self.storage {
            Storage::Hashed(hashed) => hashed.insert(id, value).is_some(),
            Storage::Compact(_) => unreachable!("compact inserts handled above"),
        }
    }

    /// Returns the value stored under `id`, if any. Does not mutate the table.
    #[must_use]
    pub fn lookup(&self, id: Ident) -> Option<&V> {
        match &self.storage {
            Storage::Compact(entries) => {
                entries.iter().find(|entry| entry.0 == id).map(|entry| &entry.1)
            }
            Storage::Hashed(hashed) => hashed.find(id).map(|idx| {
                match &hashed.buckets[idx] {
                    Bucket::Occupied(_, value) => value,
                    _ => unreachable!("find returned a non-occupied bucket"),
                }
            }),
        }
    }

    /// Removes the entry under `id`, returning whether it was present.
    ///
    /// Deletion never shrinks or converts the representation.
    pub fn delete(&mut self, id: Ident) -> bool {
        match &mut self.storage {
            Storage::Compact(entries) => {
                match entries.iter().position(|entry| entry.0 == id) {
                    Some(idx) => {
                        entries.swap_remove(idx);
                        true
                    }
                    None => false,
                }
            }
            Storage::Hashed(hashed) => hashed.remove(id).is_some(),
        }
    }

    /// Removes all entries and resets to the compact representation,
    /// reclaiming cache locality for tables that are commonly reused.
    pub fn clear(&mut self) {
        self.storage = Storage::Compact(Vec::new());
    }

    /// Removes all entries, handing each to `release` before resetting.
    ///
    /// For tables whose values require explicit teardown (reference counts,
    /// out-of-band resources), an owner discarding the table calls this on
    /// every exit path instead of relying on `Drop` side effects.
    pub fn clear_with<F>(&mut self, mut release: F)
    where
        F: FnMut(Ident, V),
    {
        match mem::replace(&mut self.storage, Storage::Compact(Vec::new())) {
            Storage::Compact(entries) => {
                for (id, value) in entries {
                    release(id, value);
                }
            }
            Storage::Hashed(hashed) => {
                for bucket in hashed.buckets {
                    if let Bucket::Occupied(id, value) = bucket {
                        release(id, value);
                    }
                }
            }
        }
    }

    /// Returns the current live entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Compact(entries) => entries.len(),
            Storage::Hashed(hashed) => hashed.live,
        }
    }

    /// Returns `true` if the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best-effort bytes consumed by the table and its backing storage.
    ///
    /// Intended for diagnostics and memory-pressure reporting; not part of
    /// any correctness contract.
    #[must_use]
    pub fn memsize(&self) -> usize {
        let backing = match &self.storage {
            Storage::Compact(entries) => entries.capacity() * mem::size_of::<(Ident, V)>(),
            Storage::Hashed(hashed) => hashed.buckets.capacity() * mem::size_of::<Bucket<V>>(),
        };
        mem::size_of::<Self>() + backing
    }

    /// Returns a read-only iterator over `(identifier, value)` pairs.
    ///
    /// Order is implementation-defined and stable only between mutations of
    /// a given table; callers must not depend on insertion order.
    pub fn iter(&self) -> Iter<'_, V> {
        let inner = match &self.storage {
            Storage::Compact(entries) => IterInner::Compact(entries.iter()),
            Storage::Hashed(hashed) => IterInner::Hashed(hashed.buckets.iter()),
        };
        Iter { inner }
    }

    /// Invokes `f` for every live entry.
    ///
    /// Entries are visited at most once each, in an implementation-defined
    /// but fixed order for a given table. The directive returned by `f`
    /// drives the pass; see [`ForeachResult`]. Structural edits during the
    /// pass happen only through directives — the borrow rules make any other
    /// mutation of the table from inside `f` unrepresentable.
    pub fn foreach<F>(&mut self, f: F)
    where
        F: FnMut(Ident, &V) -> ForeachResult,
    {
        self.foreach_impl(f, None);
    }

    /// Like [`IdTable::foreach`], but `f` observes only values.
    ///
    /// Used where the caller already knows the keying context, such as
    /// scanning an owner's table for a particular value shape.
    pub fn foreach_values<F>(&mut self, mut f: F)
    where
        F: FnMut(&V) -> ForeachResult,
    {
        self.foreach_impl(|_, value| f(value), None);
    }

    /// Like [`IdTable::foreach_values`], with lazy in-place replacement.
    ///
    /// When `f` returns [`ForeachResult::Replace`], `replace` is invoked
    /// with a mutable reference to that entry's slot and the pass continues.
    /// The replacement is computed only for entries that ask for it, which
    /// suits bulk rewrite passes that leave most entries unchanged (for
    /// example, relocating references after a compacting collection cycle).
    pub fn foreach_values_with_replace<F, R>(&mut self, mut f: F, mut replace: R)
    where
        F: FnMut(&V) -> ForeachResult,
        R: FnMut(&mut V),
    {
        self.foreach_impl(|_, value| f(value), Some(&mut replace));
    }

    /// Single iteration engine behind the `foreach` family.
    ///
    /// Compact-form deletion swaps the removed entry with the last one and
    /// re-examines the slot, so the swapped-in entry is not skipped. Hashed
    /// deletion tombstones in place; nothing moves.
    fn foreach_impl<F>(&mut self, mut f: F, mut replace: Option<&mut dyn FnMut(&mut V)>)
    where
        F: FnMut(Ident, &V) -> ForeachResult,
    {
        match &mut self.storage {
            Storage::Compact(entries) => {
                let mut idx = 0;
                while idx < entries.len() {
                    let result = {
                        let (id, value) = &entries[idx];
                        f(*id, value)
                    };
                    match result {
                        ForeachResult::Continue => idx += 1,
                        ForeachResult::Stop => break,
                        ForeachResult::Delete => {
                            entries.swap_remove(idx);
                            // Re-examine this slot: it now holds the entry
                            // swapped in from the end.
                        }
                        ForeachResult::Replace => {
                            if let Some(replace) = replace.as_mut() {
                                replace(&mut entries[idx].1);
                            } else {
                                debug_assert!(
                                    false,
                                    "Replace returned from a non-replacing foreach"
                                );
                            }
                            idx += 1;
                        }
                    }
                }
            }
            Storage::Hashed(hashed) => {
                let mut idx = 0;
                while idx < hashed.buckets.len() {
                    let result = match &hashed.buckets[idx] {
                        Bucket::Occupied(id, value) => f(*id, value),
                        _ => {
                            idx += 1;
                            continue;
                        }
                    };
                    match result {
                        ForeachResult::Continue => idx += 1,
                        ForeachResult::Stop => break,
                        ForeachResult::Delete => {
                            hashed.buckets[idx] = Bucket::Tombstone;
                            hashed.live -= 1;
                            idx += 1;
                        }
                        ForeachResult::Replace => {
                            if let Some(replace) = replace.as_mut() {
                                if let Bucket::Occupied(_, value) = &mut hashed.buckets[idx] {
                                    replace(value);
                                }
                            } else {
                                debug_assert!(
                                    false,
                                    "Replace returned from a non-replacing foreach"
                                );
                            }
                            idx += 1;
                        }
                    }
                }
            }
        }
    }

    /// One-shot migration from compact to hashed storage. Idempotent on an
    /// already-hashed table; never reversed except by [`IdTable::clear`].
    fn convert_to_hashed(&mut self) {
        if matches!(self.storage, Storage::Hashed(_)) {
            return;
        }
        let capacity = hashed_capacity_for(MAX_COMPACT_LEN + 1);
        let replacement = Storage::Hashed(Hashed::with_capacity(capacity));
        if let Storage::Compact(entries) = mem::replace(&mut self.storage, replacement) {
            if let Storage::Hashed(hashed) = &mut self.storage {
                for (id, value) in entries {
                    hashed.reinsert(id, value);
                }
            }
        }
    }
}

/// Smallest power-of-two bucket count that holds `entries` live entries
/// below the 3/4 growth watermark.
fn hashed_capacity_for(entries: usize) -> usize {
    (entries * 4 / 3 + 1)
        .next_power_of_two()
        .max(MIN_HASHED_CAPACITY)
}

impl<V> Default for IdTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for IdTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a IdTable<V> {
    type Item = (Ident, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read-only iterator over a table's entries. See [`IdTable::iter`].
pub struct Iter<'a, V> {
    inner: IterInner<'a, V>,
}

enum IterInner<'a, V> {
    Compact(std::slice::Iter<'a, (Ident, V)>),
    Hashed(std::slice::Iter<'a, Bucket<V>>),
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Ident, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Compact(entries) => entries.next().map(|(id, value)| (*id, value)),
            IterInner::Hashed(buckets) => loop {
                match buckets.next()? {
                    Bucket::Occupied(id, value) => return Some((*id, value)),
                    _ => continue,
                }
            },
        }
    }
}
