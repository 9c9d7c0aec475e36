//! Collector-managed identifier tables.
//!
//! This module wraps an [`IdTable`] as a single heap object owned by a
//! tracing garbage collector. The collector itself lives outside this crate
//! and is consumed through three narrow seams:
//!
//! - a [`TypeDescriptor`] the collector uses to recognize the object,
//! - a [`WriteBarrier`] injected at construction and notified on every
//!   insertion, so generational or incremental tracing invariants hold when
//!   stored values reference heap objects,
//! - a [`Tracer`] visitor the table feeds during marking so the collector
//!   can discover the references it stores.
//!
//! Beyond collector integration, the managed layer adds duplication
//! ([`ManagedIdTable::dup`], an independent structural copy) and size
//! accounting for memory-pressure reporting. Lookup, deletion, and the
//! iteration protocol delegate to the wrapped core table with identical
//! contracts.
//!
//! # Example
//!
//! ```rust
//! use idtable::{Ident, ManagedIdTable, NullBarrier};
//!
//! let mut table = ManagedIdTable::new(NullBarrier, 0);
//! table.insert(Ident::new(1), 0x4000_0008u64);
//!
//! let copy = table.dup();
//! table.delete(Ident::new(1));
//! assert_eq!(copy.lookup(Ident::new(1)), Some(&0x4000_0008));
//! ```

use std::any::Any;
use std::fmt;
use std::mem;
use std::ptr;

use crate::error::Error;
use crate::ident::Ident;
use crate::table::{ForeachResult, IdTable};
use crate::Result;

/// Collector-visible type identity for a managed object.
///
/// Descriptors are compared by address, so each object kind declares exactly
/// one `static` descriptor; the name exists for diagnostics and error
/// messages only.
pub struct TypeDescriptor {
    name: &'static str,
}

impl TypeDescriptor {
    /// Declares a descriptor with the given diagnostic name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Returns the diagnostic name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self.name)
    }
}

/// The descriptor managed identifier tables carry unless the host runtime
/// supplies its own.
pub static ID_TABLE_TYPE: TypeDescriptor = TypeDescriptor::new("IdTable");

/// Collector write-barrier hook, notified before a value is stored.
///
/// Injected at [`ManagedIdTable::create`] rather than reached through a
/// global, so tests and embedders can observe or stub it. Implementations
/// for value types that cannot reference the heap may do nothing — see
/// [`NullBarrier`].
pub trait WriteBarrier<V> {
    /// Records that `value` is about to be stored into the managed object.
    fn record(&self, value: &V);
}

/// A write barrier that does nothing.
///
/// For tables of immediate (non-reference) values, and for tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBarrier;

impl<V> WriteBarrier<V> for NullBarrier {
    fn record(&self, _value: &V) {}
}

/// Collector-side visitor fed by [`ManagedIdTable::trace`] during marking.
pub trait Tracer<V> {
    /// Called once per stored value.
    fn visit(&mut self, value: &V);
}

impl<V, F: FnMut(&V)> Tracer<V> for F {
    fn visit(&mut self, value: &V) {
        self(value);
    }
}

/// The surface a collector heap sees on any object it owns.
///
/// A heap holding `dyn ManagedObject` values recovers concrete tables
/// through [`ManagedIdTable::from_object`].
pub trait ManagedObject {
    /// The object's type descriptor.
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Downcast access to the concrete object.
    fn as_any(&self) -> &dyn Any;

    /// Best-effort bytes consumed by the object, for heap accounting.
    fn memsize(&self) -> usize;
}

/// An [`IdTable`] exposed as a single collector-managed heap object.
///
/// The wrapped table's lifetime is exactly the managed object's lifetime;
/// the collector's tracing rules decide when that ends. All table contracts
/// (dual representation, the foreach directive protocol, no internal
/// synchronization) carry over unchanged.
pub struct ManagedIdTable<V, B: WriteBarrier<V>> {
    descriptor: &'static TypeDescriptor,
    barrier: B,
    table: IdTable<V>,
}

impl<V, B: WriteBarrier<V>> ManagedIdTable<V, B> {
    /// Creates a managed table with an explicit type descriptor.
    ///
    /// `capacity` is a sizing hint for the wrapped table, as in
    /// [`IdTable::with_capacity`].
    #[must_use]
    pub fn create(descriptor: &'static TypeDescriptor, barrier: B, capacity: usize) -> Self {
        Self {
            descriptor,
            barrier,
            table: IdTable::with_capacity(capacity),
        }
    }

    /// Creates a managed table carrying the default [`ID_TABLE_TYPE`]
    /// descriptor.
    #[must_use]
    pub fn new(barrier: B, capacity: usize) -> Self {
        Self::create(&ID_TABLE_TYPE, barrier, capacity)
    }

    /// Recovers a managed table from a collector-heap object.
    ///
    /// The object must carry `descriptor` (compared by address) and be a
    /// table of exactly these value and barrier types.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] otherwise — a programming error in
    /// the host runtime, surfaced rather than tolerated.
    pub fn from_object_with<'a>(
        object: &'a dyn ManagedObject,
        descriptor: &'static TypeDescriptor,
    ) -> Result<&'a Self>
    where
        V: 'static,
        B: 'static,
    {
        let mismatch = Error::TypeMismatch {
            expected: descriptor.name(),
            found: object.descriptor().name(),
        };
        if !ptr::eq(object.descriptor(), descriptor) {
            return Err(mismatch);
        }
        object.as_any().downcast_ref::<Self>().ok_or(mismatch)
    }

    /// [`ManagedIdTable::from_object_with`] against the default
    /// [`ID_TABLE_TYPE`] descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the object is not a default-typed
    /// managed table of these value and barrier types.
    pub fn from_object(object: &dyn ManagedObject) -> Result<&Self>
    where
        V: 'static,
        B: 'static,
    {
        Self::from_object_with(object, &ID_TABLE_TYPE)
    }

    /// Inserts `value` under `id` after notifying the write barrier.
    ///
    /// Returns `true` if the identifier was already present (previous value
    /// dropped). The barrier fires on every insertion, including overwrites.
    pub fn insert(&mut self, id: Ident, value: V) -> bool {
        self.barrier.record(&value);
        self.table.insert(id, value)
    }

    /// Returns the value stored under `id`, if any.
    #[must_use]
    pub fn lookup(&self, id: Ident) -> Option<&V> {
        self.table.lookup(id)
    }

    /// Removes the entry under `id`, returning whether it was present.
    pub fn delete(&mut self, id: Ident) -> bool {
        self.table.delete(id)
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns the current live entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// See [`IdTable::foreach`].
    pub fn foreach<F>(&mut self, f: F)
    where
        F: FnMut(Ident, &V) -> ForeachResult,
    {
        self.table.foreach(f);
    }

    /// See [`IdTable::foreach_values`].
    pub fn foreach_values<F>(&mut self, f: F)
    where
        F: FnMut(&V) -> ForeachResult,
    {
        self.table.foreach_values(f);
    }

    /// See [`IdTable::foreach_values_with_replace`].
    pub fn foreach_values_with_replace<F, R>(&mut self, f: F, replace: R)
    where
        F: FnMut(&V) -> ForeachResult,
        R: FnMut(&mut V),
    {
        self.table.foreach_values_with_replace(f, replace);
    }

    /// Feeds every stored value to the collector's marking visitor.
    pub fn trace(&self, tracer: &mut dyn Tracer<V>) {
        for (_, value) in self.table.iter() {
            tracer.visit(value);
        }
    }

    /// Best-effort bytes consumed by this object and its backing storage.
    #[must_use]
    pub fn memsize(&self) -> usize {
        mem::size_of::<Self>() - mem::size_of::<IdTable<V>>() + self.table.memsize()
    }
}

impl<V: Clone, B: WriteBarrier<V> + Clone> ManagedIdTable<V, B> {
    /// Returns an independent structural copy of this table.
    ///
    /// Every entry is copied into a fresh core table owned by a new managed
    /// object; the two share no mutable state afterwards. The copy is built
    /// through the insert path, so the new object's barrier observes each
    /// stored value and incremental-collector invariants need no special
    /// case for duplication.
    #[must_use]
    pub fn dup(&self) -> Self {
        let mut copy = Self::create(self.descriptor, self.barrier.clone(), self.table.len());
        for (id, value) in self.table.iter() {
            copy.insert(id, value.clone());
        }
        copy
    }
}

impl<V: 'static, B: WriteBarrier<V> + 'static> ManagedObject for ManagedIdTable<V, B> {
    fn descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn memsize(&self) -> usize {
        ManagedIdTable::memsize(self)
    }
}

impl<V: fmt::Debug, B: WriteBarrier<V>> fmt::Debug for ManagedIdTable<V, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedIdTable")
            .field("type", &self.descriptor.name())
            .field("entries", &self.table)
            .finish()
    }
}
