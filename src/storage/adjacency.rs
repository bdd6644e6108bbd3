use crate::types::{NodeId, TypeId};

/// One stored adjacency record: the node at the far end and the edge type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Neighbor {
    /// Far end of the edge.
    pub neighbor: NodeId,
    /// Relationship type code of the edge.
    pub ty: TypeId,
}

/// Resolved relationship-type codes restricting an expansion.
///
/// An empty filter matches every type. Codes are kept sorted and unique so
/// membership checks are a binary search.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TypeFilter {
    codes: Vec<TypeId>,
}

impl TypeFilter {
    /// Filter that accepts every relationship type.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter accepting exactly `codes`.
    pub fn of<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = TypeId>,
    {
        let mut codes: Vec<TypeId> = codes.into_iter().collect();
        codes.sort_unstable();
        codes.dedup();
        Self { codes }
    }

    /// True for the filter built by [`TypeFilter::all`].
    pub fn is_unrestricted(&self) -> bool {
        self.codes.is_empty()
    }

    /// True when the filter names types but none of them exist in the store.
    pub fn matches_nothing(&self) -> bool {
        !self.codes.is_empty() && self.codes.iter().all(|ty| *ty == TypeId::UNMAPPED)
    }

    /// Whether an edge of type `ty` passes the filter.
    pub fn matches(&self, ty: TypeId) -> bool {
        self.codes.is_empty() || self.codes.binary_search(&ty).is_ok()
    }

    /// Sorted, deduplicated codes; empty when unrestricted.
    pub fn codes(&self) -> &[TypeId] {
        &self.codes
    }
}
