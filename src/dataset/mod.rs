//! Unified census table - the in-memory dataset the engine queries
//!
//! One `PersonRecord` per physical person, keyed by (id_hogar, id_persona),
//! produced once by the loader and read-only afterwards. Every analytical
//! operation works on filtered views (slices of references); nothing mutates
//! the shared table in place.

pub mod loader;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Carencia, Programa, NUM_PROGRAMAS};

/// Household attributes merged into each member by left join. A person
/// survives the join even when no household row matched, in which case
/// these stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HogarAttrs {
    pub total_integrantes: Option<u32>,
    pub tipo_vivienda: Option<String>,
}

/// One row of the unified table: a person plus their household attributes,
/// deprivation flags, and per-program eligibility flags.
///
/// Flag semantics are uniform: the literal value "yes" is positive, anything
/// else (including a missing source value) is negative. Eligibility flags are
/// therefore stored as booleans; the three deprivation flags keep their raw
/// categorical value because they are cross-tabulable dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id_hogar: String,
    pub id_persona: String,
    /// Clamped to [0,120] at load time; out-of-range rows never reach here.
    pub edad: u8,
    pub sexo: String,
    pub parentesco: String,
    pub colonia: String,
    pub ageb: String,
    pub carencia_salud: String,
    pub rezago_educativo: String,
    pub carencia_seguridad_social: String,
    /// Support-received status; `None` when the source value was missing.
    pub recibe_apoyos_sociales: Option<String>,
    /// Eligibility per program, indexed by `Programa::index()`.
    pub elegibilidades: [bool; NUM_PROGRAMAS],
    pub hogar: Option<HogarAttrs>,
}

impl PersonRecord {
    /// Raw categorical value of a deprivation flag.
    pub fn carencia(&self, c: Carencia) -> &str {
        match c {
            Carencia::Salud => &self.carencia_salud,
            Carencia::Educacion => &self.rezago_educativo,
            Carencia::SeguridadSocial => &self.carencia_seguridad_social,
        }
    }

    /// Whether the person is flagged with a given deprivation.
    pub fn tiene_carencia(&self, c: Carencia) -> bool {
        self.carencia(c) == "yes"
    }

    /// Whether the person is flagged eligible for a program.
    pub fn es_elegible(&self, p: Programa) -> bool {
        self.elegibilidades[p.index()]
    }

    /// Number of simultaneous deprivations (0..=3), the vulnerability
    /// intensity of this person.
    pub fn intensidad(&self) -> u8 {
        Carencia::ALL.iter().filter(|c| self.tiene_carencia(**c)).count() as u8
    }

    /// Whether the person reports not receiving any support. A missing
    /// status counts as not receiving, same as the literal "No tiene".
    pub fn sin_apoyo(&self) -> bool {
        match &self.recibe_apoyos_sociales {
            None => true,
            Some(v) => v == "No tiene",
        }
    }
}

/// The unified in-memory table. Built once per process (or per cached
/// session) and shared read-only behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<PersonRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<PersonRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_shared(self) -> Arc<Dataset> {
        Arc::new(self)
    }
}
