//! # idtable Prelude
//!
//! Convenient re-exports of the types most code touches.
//!
//! Import everything commonly needed with:
//!
//! ```rust
//! use idtable::prelude::*;
//!
//! let mut table = IdTable::new();
//! table.insert(Ident::new(1), "value");
//! assert_eq!(table.len(), 1);
//! ```

// ================================================================================================
// Core Types
// ================================================================================================

/// Error handling
pub use crate::{Error, Result};

/// Identifier token and interning collaborator
pub use crate::ident::{Ident, Interner};

// ================================================================================================
// Tables
// ================================================================================================

/// Core table and iteration protocol
pub use crate::table::{ForeachResult, IdTable};

/// Collector-managed tables
pub use crate::managed::{
    ManagedIdTable, ManagedObject, NullBarrier, Tracer, TypeDescriptor, WriteBarrier,
    ID_TABLE_TYPE,
};
