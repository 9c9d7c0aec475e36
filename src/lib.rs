// Copyright 2026 The idtable Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # idtable
//!
//! GC-aware identifier tables for language runtime metadata.
//!
//! A language runtime keeps a lot of small maps from interned names to
//! tagged values: method tables, instance-variable tables, constant tables.
//! `idtable` implements that container — keyed by dense integer [`Ident`]
//! tokens, tuned for frequent lookup on many small tables, and supporting
//! full-table iteration with in-place deletion and replacement. A managed
//! variant exposes a table as a first-class, garbage-collected, copyable
//! heap object.
//!
//! ## Features
//!
//! - **Dual representation** - Small tables stay in a compact linear-scan
//!   array; crossing a fixed threshold converts one-way to an open-addressed
//!   hash table, so tables never oscillate under add/remove churn
//! - **Mutation-safe iteration** - A four-directive callback protocol
//!   (continue, stop, delete, replace) lets a single pass delete or rewrite
//!   entries without skipping or revisiting any other entry
//! - **Collector integration** - The managed layer takes a write barrier
//!   injected at construction, carries a collector-visible type descriptor,
//!   and feeds a tracing visitor during marking
//! - **Narrow error surface** - Missing keys are `Option`/`bool`, not
//!   errors; allocation failure is fatal, as for an embedded runtime
//!   structure
//!
//! ## Quick Start
//!
//! ```rust
//! use idtable::{ForeachResult, IdTable, Ident};
//!
//! let mut constants = IdTable::new();
//! constants.insert(Ident::new(1), 0x07u64);
//! constants.insert(Ident::new(2), 0x0Bu64);
//!
//! assert_eq!(constants.lookup(Ident::new(2)), Some(&0x0B));
//!
//! // Rewrite values in place during a single pass.
//! constants.foreach_values_with_replace(
//!     |_| ForeachResult::Replace,
//!     |value| *value <<= 1,
//! );
//! assert_eq!(constants.lookup(Ident::new(1)), Some(&0x0E));
//! ```
//!
//! ## Architecture
//!
//! Two layers, lowest first:
//!
//! - [`table`] - the unmanaged core: [`IdTable`] with dual representation
//!   and the [`ForeachResult`] iteration protocol
//! - [`managed`] - [`ManagedIdTable`], wrapping one core table with a
//!   [`TypeDescriptor`], an injected [`WriteBarrier`], duplication, and
//!   [`Tracer`]-driven marking
//!
//! The collaborators a runtime brings — the identifier [`Interner`], the
//! allocator, the collector — are consumed through traits, never
//! implemented here.
//!
//! ## Thread Safety
//!
//! Tables are not internally synchronized; see the [`table`] module
//! documentation.

pub(crate) mod error;
pub mod ident;
pub mod managed;
pub mod prelude;
pub mod table;

/// Convenience `Result` type alias for this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type, covering a deliberately short list of conditions:
/// missing keys are `Option`/`bool` by contract, and allocation failure is
/// fatal, so only programming errors remain.
pub use error::Error;

/// Dense identifier token and the interning collaborator trait.
pub use ident::{Ident, Interner};

/// The unmanaged core table and its iteration directives.
pub use table::{ForeachResult, IdTable};

/// The collector-managed layer.
pub use managed::{
    ManagedIdTable, ManagedObject, NullBarrier, Tracer, TypeDescriptor, WriteBarrier,
    ID_TABLE_TYPE,
};
