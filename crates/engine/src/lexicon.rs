//! Event-name classification: special variants and finalizing keywords.

use std::collections::HashMap;
use std::fmt;

use precontrack_core_types::text;
use serde::{Deserialize, Serialize};

/// Special sub-classifications an event can carry inside a phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Correccion,
    Subsanacion,
    Ajuste,
}

impl VariantKind {
    pub fn all() -> [VariantKind; 3] {
        [
            VariantKind::Correccion,
            VariantKind::Subsanacion,
            VariantKind::Ajuste,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            VariantKind::Correccion => "correccion",
            VariantKind::Subsanacion => "subsanacion",
            VariantKind::Ajuste => "ajuste",
        }
    }

    /// Canonical label appended to the owning phase's title.
    pub fn label(self) -> &'static str {
        match self {
            VariantKind::Correccion => "Corrección solicitada",
            VariantKind::Subsanacion => "Subsanación requerida",
            VariantKind::Ajuste => "Ajuste solicitado",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            VariantKind::Correccion => "COR",
            VariantKind::Subsanacion => "SUB",
            VariantKind::Ajuste => "AJU",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Known event-name spellings per variant, already normalized.
static DEFAULT_ALIASES: &[(&str, VariantKind)] = &[
    ("solicitud de correccion", VariantKind::Correccion),
    ("correccion solicitada", VariantKind::Correccion),
    ("correccion de documentos", VariantKind::Correccion),
    ("solicitud de subsanacion", VariantKind::Subsanacion),
    ("subsanacion requerida", VariantKind::Subsanacion),
    ("subsanacion de requisitos", VariantKind::Subsanacion),
    ("solicitud de ajuste", VariantKind::Ajuste),
    ("ajuste solicitado", VariantKind::Ajuste),
    ("ajuste de documentos", VariantKind::Ajuste),
];

/// Substrings that mark an event as closing its stage. Broader than the
/// variant aliases on purpose: completion phrasing varies more.
static DEFAULT_FINALIZING: &[&str] = &[
    "finaliz",
    "aprobacion definitiva",
    "suscrito",
    "suscripcion del contrato",
    "legalizad",
    "completad",
    "cerrad",
];

/// Alias tables driving event classification. Compiled-in defaults;
/// injectable so tests can substitute their own vocabulary.
#[derive(Clone, Debug)]
pub struct VariantLexicon {
    aliases: HashMap<String, VariantKind>,
    finalizing: Vec<String>,
}

impl VariantLexicon {
    pub fn new(aliases: &[(&str, VariantKind)], finalizing: &[&str]) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|(name, kind)| (text::normalize(name), *kind))
                .collect(),
            finalizing: finalizing.iter().map(|kw| text::normalize(kw)).collect(),
        }
    }

    /// Exact match after normalization. Substring matching here would
    /// misclassify names that merely mention a variant word.
    pub fn classify_variant(&self, event_name: &str) -> Option<VariantKind> {
        self.aliases.get(text::normalize(event_name).as_str()).copied()
    }

    /// Substring match over the normalized name.
    pub fn is_finalizing(&self, event_name: &str) -> bool {
        let key = text::normalize(event_name);
        self.finalizing.iter().any(|kw| key.contains(kw.as_str()))
    }
}

impl Default for VariantLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_ALIASES, DEFAULT_FINALIZING)
    }
}
