//! Semantic Atom Catalog (C1).
//!
//! A static registry of per-organ atoms plus meta-atoms bridging named
//! organ sets, loaded once at process start (grounded on
//! `tools/builtin/mod.rs`'s fixed-registry-at-startup shape). Loading
//! failures are fatal: see `crate::error::CatalogError`.

mod catalog;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::organs::OrganKind;

pub const EMBEDDING_DIM: usize = 384;

/// A named point in semantic space. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub name: &'static str,
    /// `None` for a single-organ atom; `Some` for a meta-atom, naming the
    /// organs it bridges.
    pub bridges: Option<Vec<OrganKind>>,
    /// Owning organ, if this is not a meta-atom.
    pub organ: Option<OrganKind>,
    /// Unit-length prototype embedding, used by the embedding-based lure
    /// path (spec.md §4.2).
    pub prototype: Vec<f32>,
}

impl Atom {
    pub fn is_meta(&self) -> bool {
        self.bridges.is_some()
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The loaded catalog: every organ's atoms, plus meta-atoms.
#[derive(Debug, Clone)]
pub struct Catalog {
    by_organ: HashMap<OrganKind, Vec<Atom>>,
    meta_atoms: Vec<Atom>,
}

impl Catalog {
    /// Load the static catalog. The only fallible entry point in this
    /// module; everything else assumes a validated catalog.
    pub fn load() -> Result<Self, CatalogError> {
        catalog::build()
    }

    pub fn atoms_for(&self, organ: OrganKind) -> &[Atom] {
        self.by_organ.get(&organ).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn meta_atoms(&self) -> &[Atom] {
        &self.meta_atoms
    }

    /// All atoms that name `organ` either as owner or as a bridge
    /// participant.
    pub fn atoms_touching(&self, organ: OrganKind) -> impl Iterator<Item = &Atom> {
        self.atoms_for(organ).iter().chain(
            self.meta_atoms
                .iter()
                .filter(move |a| a.bridges.as_deref().is_some_and(|b| b.contains(&organ))),
        )
    }

    pub fn organ_count(&self) -> usize {
        self.by_organ.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_loads_with_all_twelve_organs() {
        let catalog = Catalog::load().expect("catalog must load");
        assert_eq!(catalog.organ_count(), OrganKind::ALL.len());
        for organ in OrganKind::ALL {
            assert!(
                !catalog.atoms_for(organ).is_empty(),
                "organ {organ:?} has no atoms"
            );
        }
    }

    #[test]
    fn catalog_has_ten_meta_atoms() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(catalog.meta_atoms().len(), 10);
        for meta in catalog.meta_atoms() {
            assert!(meta.is_meta());
            assert!(!meta.bridges.as_ref().unwrap().is_empty());
        }
    }

    #[test]
    fn nexus_organ_has_seven_atoms() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(catalog.atoms_for(OrganKind::Nexus).len(), 7);
    }

    #[test]
    fn prototypes_are_unit_length_and_correct_dimension() {
        let catalog = Catalog::load().unwrap();
        for organ in OrganKind::ALL {
            for atom in catalog.atoms_for(organ) {
                assert_eq!(atom.prototype.len(), EMBEDDING_DIM);
                let norm: f32 = atom.prototype.iter().map(|x| x * x).sum::<f32>().sqrt();
                assert!((norm - 1.0).abs() < 1e-4, "atom {} norm = {norm}", atom.name);
            }
        }
    }
}
