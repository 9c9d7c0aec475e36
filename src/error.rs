use thiserror::Error;

use crate::ident::Ident;

/// The generic Error type, which provides coverage for all errors this library
/// can potentially return.
///
/// The taxonomy is deliberately narrow. A missing key on lookup or delete is
/// not an error — those operations report presence through `Option`/`bool`.
/// Allocation failure is fatal (the Rust allocator aborts), consistent with an
/// embedded runtime data structure that assumes memory is available or the
/// whole process goes down. What remains are programming errors surfaced
/// loudly instead of being tolerated.
///
/// # Examples
///
/// ```rust
/// use idtable::{Error, ManagedIdTable, ManagedObject, NullBarrier, TypeDescriptor};
///
/// static OTHER_TYPE: TypeDescriptor = TypeDescriptor::new("Other");
///
/// let table = ManagedIdTable::<u64, _>::create(&OTHER_TYPE, NullBarrier, 0);
/// let object: &dyn ManagedObject = &table;
///
/// match ManagedIdTable::<u64, NullBarrier>::from_object(object) {
///     Ok(t) => println!("an id table with {} entries", t.len()),
///     Err(Error::TypeMismatch { expected, found }) => {
///         eprintln!("expected {expected}, found {found}");
///     }
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A managed object was not of the expected type.
    ///
    /// Returned when downcasting a collector-heap object to a managed table
    /// and its type descriptor (or concrete value/barrier types) does not
    /// match. This indicates a programming error in the host runtime, never a
    /// recoverable condition of the table itself.
    #[error("wrong managed object type - expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the type descriptor the caller expected
        expected: &'static str,
        /// Name of the type descriptor the object actually carries
        found: &'static str,
    },

    /// An identifier could not be resolved back to a name.
    ///
    /// Returned by [`Interner::resolve`](crate::Interner::resolve) when the
    /// identifier was never interned by that interner.
    #[error("identifier {0} is not interned")]
    UnknownIdent(Ident),
}
