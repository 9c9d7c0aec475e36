//! Identifier tokens and the interning collaborator.
//!
//! Interned names are represented as dense small integers. The interning
//! service that produces them lives outside this crate and is consumed
//! through the [`Interner`] trait; tables treat identifiers purely as
//! equality-comparable, hashable keys.

use std::fmt;

use crate::Result;

/// A dense integer token standing for an interned name.
///
/// Identifiers are produced by an [`Interner`] and are opaque to the table
/// layer: the table only compares them for equality and hashes their raw
/// value. A given identifier is stable for the lifetime of the interner that
/// produced it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident(pub u32);

impl Ident {
    /// Creates an identifier from a raw token value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Ident(value)
    }

    /// Returns the raw token value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Ident {
    fn from(value: u32) -> Self {
        Ident(value)
    }
}

impl From<Ident> for u32 {
    fn from(id: Ident) -> Self {
        id.0
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ident({})", self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The identifier interning collaborator.
///
/// Interning — mapping a name string to a stable, dense [`Ident`] and back —
/// lives outside this crate. Runtime components that need it receive an
/// implementation of this trait as an injected dependency; the table layer
/// itself never consults it and trusts that the identifiers it is handed are
/// already interned.
pub trait Interner {
    /// Returns the identifier for `name`, interning it on first use.
    ///
    /// Interning the same name twice must yield the same identifier.
    fn intern(&mut self, name: &str) -> Ident;

    /// Resolves an identifier back to the name it was interned from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIdent`](crate::Error::UnknownIdent) if `id`
    /// was not produced by this interner.
    fn resolve(&self, id: Ident) -> Result<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct VecInterner(Vec<String>);

    impl Interner for VecInterner {
        fn intern(&mut self, name: &str) -> Ident {
            if let Some(pos) = self.0.iter().position(|n| n == name) {
                return Ident(u32::try_from(pos).unwrap());
            }
            self.0.push(name.to_string());
            Ident(u32::try_from(self.0.len() - 1).unwrap())
        }

        fn resolve(&self, id: Ident) -> Result<&str> {
            self.0
                .get(id.value() as usize)
                .map(String::as_str)
                .ok_or(Error::UnknownIdent(id))
        }
    }

    #[test]
    fn test_ident_new() {
        let id = Ident::new(42);
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_ident_from_conversion() {
        let id: Ident = 7u32.into();
        assert_eq!(id.value(), 7);

        let back: u32 = id.into();
        assert_eq!(back, 7);
    }

    #[test]
    fn test_ident_display() {
        assert_eq!(format!("{}", Ident(3)), "#3");
        assert_eq!(format!("{:?}", Ident(3)), "Ident(3)");
    }

    #[test]
    fn test_interner_round_trip() {
        let mut interner = VecInterner(Vec::new());
        let a = interner.intern("method_missing");
        let b = interner.intern("to_s");
        let a2 = interner.intern("method_missing");

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a).unwrap(), "method_missing");
        assert_eq!(interner.resolve(b).unwrap(), "to_s");
    }

    #[test]
    fn test_interner_unknown_ident() {
        let interner = VecInterner(Vec::new());
        let err = interner.resolve(Ident(99)).unwrap_err();
        assert!(matches!(err, Error::UnknownIdent(id) if id.value() == 99));
    }
}
