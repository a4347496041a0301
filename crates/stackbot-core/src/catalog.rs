//! Immutable catalog of unit definitions available to a session.
//!
//! The catalog is seeded once from the store at session construction and
//! never changes afterwards. A unit upgraded in the store mid-session only
//! shows up in the next session.

use std::collections::BTreeSet;

use stackbot_types::{Unit, UnitId};

/// Errors raised while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The store returned no units.
    #[error("unit catalog is empty")]
    Empty,

    /// Two entries share the same id.
    #[error("duplicate unit id in catalog: {unit_id}")]
    DuplicateId {
        /// The repeated id.
        unit_id: UnitId,
    },

    /// Fewer units than the starting window needs.
    #[error("unit catalog too small: need {needed}, have {available}")]
    TooSmall {
        /// Units the starting window needs.
        needed: usize,
        /// Units in the catalog.
        available: usize,
    },
}

/// The set of unit definitions a session may draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCatalog {
    units: Vec<Unit>,
}

impl UnitCatalog {
    /// Build a catalog, preserving the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] for an empty list and
    /// [`CatalogError::DuplicateId`] if an id appears twice.
    pub fn new(units: Vec<Unit>) -> Result<Self, CatalogError> {
        if units.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = BTreeSet::new();
        for unit in &units {
            if !seen.insert(unit.id) {
                return Err(CatalogError::DuplicateId { unit_id: unit.id });
            }
        }
        Ok(Self { units })
    }

    /// Number of unit definitions.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always false; construction rejects empty catalogs.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit at `index` in catalog order.
    pub fn get(&self, index: usize) -> Option<&Unit> {
        self.units.get(index)
    }

    /// Fail unless the catalog holds at least `needed` units.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TooSmall`] when it does not.
    pub fn require(&self, needed: usize) -> Result<(), CatalogError> {
        let available = self.units.len();
        if available < needed {
            return Err(CatalogError::TooSmall { needed, available });
        }
        Ok(())
    }
}
