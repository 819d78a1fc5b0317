use std::collections::HashMap;

use once_cell::sync::Lazy;
use precontrack_core_types::text;

use crate::model::{OwnershipEntry, PhaseOwners, ResponsibleGroup};

/// Compiled-in reference table. Changing it means redeploying the
/// engine; there is no runtime versioning.
static DEFAULT_TABLE: Lazy<Vec<OwnershipEntry>> = Lazy::new(|| {
    vec![
        OwnershipEntry::new("Planeación", 10, "OAPI"),
        OwnershipEntry::new("Planeación", 20, "OAPI / Ordenador del Gasto"),
        OwnershipEntry::new("Planeación", 30, "Secretaría General y Contratación"),
        OwnershipEntry::new("Revisión", 10, "OAPI"),
        OwnershipEntry::new(
            "Revisión",
            20,
            "Secretaría General y Contratación / Contratista",
        ),
        OwnershipEntry::new("Revisión", 30, "Oficina Jurídica"),
        OwnershipEntry::new("Aprobación", 10, "Ordenador del Gasto"),
        OwnershipEntry::new("Aprobación", 20, "Secretaría General y Contratación"),
        OwnershipEntry::new("Contratación", 10, "Secretaría General y Contratación"),
        OwnershipEntry::new("Contratación", 20, "Contratista"),
        OwnershipEntry::new("Contratación", 30, "Gestión de Talento Humano"),
    ]
});

/// Immutable lookup from (stage, phase number) to the units responsible
/// for that phase. Built once, injected into the processors; no global
/// mutable state.
#[derive(Clone, Debug)]
pub struct ResponsibilityRegistry {
    lookup: HashMap<String, PhaseOwners>,
}

impl ResponsibilityRegistry {
    pub fn from_entries(entries: &[OwnershipEntry]) -> Self {
        let mut lookup = HashMap::with_capacity(entries.len());
        for entry in entries {
            lookup.insert(
                Self::key(&entry.stage, entry.phase_number),
                PhaseOwners::from_entry(entry),
            );
        }
        Self { lookup }
    }

    fn key(stage: &str, phase_number: u32) -> String {
        format!("{}#{}", text::normalize(stage), phase_number)
    }

    /// Resolves a phase label by its leading order number. Labels without
    /// a number and pairs absent from the table both degrade to the
    /// Unassigned sentinel; this never fails.
    pub fn resolve(&self, stage: &str, phase_label: &str) -> PhaseOwners {
        match text::leading_phase_number(phase_label) {
            Some(number) => self.resolve_number(stage, number),
            None => PhaseOwners::unassigned(),
        }
    }

    pub fn resolve_number(&self, stage: &str, phase_number: u32) -> PhaseOwners {
        self.lookup
            .get(&Self::key(stage, phase_number))
            .cloned()
            .unwrap_or_else(PhaseOwners::unassigned)
    }

    pub fn color_of(group: ResponsibleGroup) -> &'static str {
        group.color()
    }
}

impl Default for ResponsibilityRegistry {
    fn default() -> Self {
        Self::from_entries(&DEFAULT_TABLE)
    }
}
