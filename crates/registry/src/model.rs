use std::fmt;

use precontrack_core_types::text;
use serde::{Deserialize, Serialize};

/// Separator between jointly responsible units in an ownership entry.
/// A bare "y" would collide with unit names that contain the
/// conjunction ("Secretaría General y Contratación").
pub const JOINT_SEPARATOR: char = '/';

/// Closed set of organizational groups accountable for phases.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsibleGroup {
    Oapi,
    SecretariaGeneral,
    Juridica,
    TalentoHumano,
    OrdenadorDelGasto,
    Contratista,
    Unassigned,
}

impl ResponsibleGroup {
    pub fn all() -> [ResponsibleGroup; 7] {
        [
            ResponsibleGroup::Oapi,
            ResponsibleGroup::SecretariaGeneral,
            ResponsibleGroup::Juridica,
            ResponsibleGroup::TalentoHumano,
            ResponsibleGroup::OrdenadorDelGasto,
            ResponsibleGroup::Contratista,
            ResponsibleGroup::Unassigned,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            ResponsibleGroup::Oapi => "OAPI",
            ResponsibleGroup::SecretariaGeneral => "Secretaría General y Contratación",
            ResponsibleGroup::Juridica => "Oficina Jurídica",
            ResponsibleGroup::TalentoHumano => "Gestión de Talento Humano",
            ResponsibleGroup::OrdenadorDelGasto => "Ordenador del Gasto",
            ResponsibleGroup::Contratista => "Contratista",
            ResponsibleGroup::Unassigned => "Sin asignar",
        }
    }

    /// Fixed display color so chart consumers can key series by group
    /// identity across runs.
    pub fn color(self) -> &'static str {
        match self {
            ResponsibleGroup::Oapi => "#1565c0",
            ResponsibleGroup::SecretariaGeneral => "#6a1b9a",
            ResponsibleGroup::Juridica => "#2e7d32",
            ResponsibleGroup::TalentoHumano => "#ef6c00",
            ResponsibleGroup::OrdenadorDelGasto => "#c62828",
            ResponsibleGroup::Contratista => "#00838f",
            ResponsibleGroup::Unassigned => "#9e9e9e",
        }
    }

    /// Closed dictionary from a responsible-unit name to its group.
    /// Unknown names degrade to [`ResponsibleGroup::Unassigned`].
    pub fn from_responsible(name: &str) -> ResponsibleGroup {
        match text::normalize(name).as_str() {
            "oapi" | "oficina asesora de planeacion e informacion" => ResponsibleGroup::Oapi,
            "secretaria general y contratacion" | "secretaria general" => {
                ResponsibleGroup::SecretariaGeneral
            }
            "oficina juridica" | "juridica" => ResponsibleGroup::Juridica,
            "gestion de talento humano" | "talento humano" => ResponsibleGroup::TalentoHumano,
            "ordenador del gasto" => ResponsibleGroup::OrdenadorDelGasto,
            "contratista" | "candidato" => ResponsibleGroup::Contratista,
            _ => ResponsibleGroup::Unassigned,
        }
    }
}

impl fmt::Display for ResponsibleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the static (stage, phase) → responsibles reference table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnershipEntry {
    pub stage: String,
    pub phase_number: u32,
    /// One or more responsible units, joined with [`JOINT_SEPARATOR`].
    pub responsibles: String,
}

impl OwnershipEntry {
    pub fn new(stage: &str, phase_number: u32, responsibles: &str) -> Self {
        Self {
            stage: stage.to_string(),
            phase_number,
            responsibles: responsibles.to_string(),
        }
    }
}

/// Resolved ownership view for one (stage, phase number) pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseOwners {
    pub primary_responsible: String,
    pub primary_group: ResponsibleGroup,
    pub responsibles: Vec<String>,
    pub groups: Vec<ResponsibleGroup>,
}

impl PhaseOwners {
    /// Sentinel returned whenever reference data is missing. Keeps the
    /// breakdown complete instead of failing.
    pub fn unassigned() -> Self {
        let label = ResponsibleGroup::Unassigned.label().to_string();
        Self {
            primary_responsible: label.clone(),
            primary_group: ResponsibleGroup::Unassigned,
            responsibles: vec![label],
            groups: vec![ResponsibleGroup::Unassigned],
        }
    }

    pub fn from_entry(entry: &OwnershipEntry) -> Self {
        let responsibles: Vec<String> = entry
            .responsibles
            .split(JOINT_SEPARATOR)
            .map(|side| side.trim().to_string())
            .filter(|side| !side.is_empty())
            .collect();
        if responsibles.is_empty() {
            return Self::unassigned();
        }
        let groups: Vec<ResponsibleGroup> = responsibles
            .iter()
            .map(|name| ResponsibleGroup::from_responsible(name))
            .collect();
        Self {
            primary_responsible: responsibles[0].clone(),
            primary_group: groups[0],
            responsibles,
            groups,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.groups.len() > 1
    }
}
