#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::types::{KhopsError, Result, TypeId};

/// Dictionary interning relationship type names to dense [`TypeId`] codes.
#[derive(Default)]
pub struct TypeDict {
    by_name: FxHashMap<String, TypeId>,
    next: u32,
}

impl TypeDict {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the code for `name`, allocating the next one on first use.
    pub fn intern(&mut self, name: &str) -> Result<TypeId> {
        if let Some(ty) = self.by_name.get(name) {
            return Ok(*ty);
        }
        if self.next == TypeId::UNMAPPED.0 {
            return Err(KhopsError::Invalid("relationship type dictionary is full"));
        }
        let ty = TypeId(self.next);
        self.next += 1;
        self.by_name.insert(name.to_owned(), ty);
        trace!(name, code = ty.0, "catalog.type.interned");
        Ok(ty)
    }

    /// Looks up an existing code without allocating.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True before the first [`TypeDict::intern`].
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() -> Result<()> {
        let mut dict = TypeDict::new();
        let knows = dict.intern("KNOWS")?;
        let friends = dict.intern("FRIENDS")?;
        assert_ne!(knows, friends);
        assert_eq!(dict.intern("KNOWS")?, knows);
        assert_eq!(dict.lookup("FRIENDS"), Some(friends));
        assert_eq!(dict.len(), 2);
        Ok(())
    }

    #[test]
    fn lookup_does_not_allocate() {
        let dict = TypeDict::new();
        assert_eq!(dict.lookup("MISSING"), None);
        assert!(dict.is_empty());
    }

    #[test]
    fn never_hands_out_the_unmapped_code() {
        let mut dict = TypeDict {
            by_name: FxHashMap::default(),
            next: TypeId::UNMAPPED.0,
        };
        assert!(matches!(dict.intern("LAST"), Err(KhopsError::Invalid(_))));
        assert_eq!(dict.lookup("LAST"), None);
    }
}
