//! Mapping Catalog - Static lookups from human-facing keys to dataset fields
//!
//! Every key a caller (or the LLM) can supply resolves here: welfare program
//! names, deprivation types, relationship roles, and cross-tabulation
//! variables. Lookups return `Option` so unknown keys become reported errors
//! at the boundary, never panics inside the engine. Column access itself is
//! typed: a resolved key is an enum with an accessor into `PersonRecord`, so
//! there is no stringly-typed indexing anywhere downstream.

use serde::{Deserialize, Serialize};

use crate::dataset::PersonRecord;

/// The 13 welfare programs with an eligibility flag in the unified table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Programa {
    BecaBenitoJuarez,
    BecaRitaCetina,
    PensionAdultosMayores,
    PensionMujeresBienestar,
    JovenesConstruyendoFuturo,
    JovenesEscribiendoElFuturo,
    MiBecaParaEmpezar,
    ImssBienestar,
    DesdeLaCuna,
    SeguroDesempleoCdmx,
    IngresoCiudadanoUniversal,
    Inea,
    LecheBienestar,
}

pub const NUM_PROGRAMAS: usize = 13;

impl Programa {
    pub const ALL: [Programa; NUM_PROGRAMAS] = [
        Programa::BecaBenitoJuarez,
        Programa::BecaRitaCetina,
        Programa::PensionAdultosMayores,
        Programa::PensionMujeresBienestar,
        Programa::JovenesConstruyendoFuturo,
        Programa::JovenesEscribiendoElFuturo,
        Programa::MiBecaParaEmpezar,
        Programa::ImssBienestar,
        Programa::DesdeLaCuna,
        Programa::SeguroDesempleoCdmx,
        Programa::IngresoCiudadanoUniversal,
        Programa::Inea,
        Programa::LecheBienestar,
    ];

    /// Catalog key, as the LLM and API callers supply it.
    pub fn key(&self) -> &'static str {
        match self {
            Programa::BecaBenitoJuarez => "beca_benito_juarez",
            Programa::BecaRitaCetina => "beca_rita_cetina",
            Programa::PensionAdultosMayores => "pension_adultos_mayores",
            Programa::PensionMujeresBienestar => "pension_mujeres_bienestar",
            Programa::JovenesConstruyendoFuturo => "jovenes_construyendo_futuro",
            Programa::JovenesEscribiendoElFuturo => "jovenes_escribiendo_el_futuro",
            Programa::MiBecaParaEmpezar => "mi_beca_para_empezar",
            Programa::ImssBienestar => "imss_bienestar",
            Programa::DesdeLaCuna => "desde_la_cuna",
            Programa::SeguroDesempleoCdmx => "seguro_desempleo_cdmx",
            Programa::IngresoCiudadanoUniversal => "ingreso_ciudadano_universal",
            Programa::Inea => "inea",
            Programa::LecheBienestar => "leche_bienestar",
        }
    }

    /// Source-table column carrying the eligibility flag for this program.
    pub fn column_name(&self) -> String {
        format!("es_elegible_{}", self.key())
    }

    /// Index into `PersonRecord::elegibilidades`.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// The three deprivation dimensions tracked per person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Carencia {
    Salud,
    Educacion,
    SeguridadSocial,
}

impl Carencia {
    pub const ALL: [Carencia; 3] = [Carencia::Salud, Carencia::Educacion, Carencia::SeguridadSocial];

    pub fn key(&self) -> &'static str {
        match self {
            Carencia::Salud => "salud",
            Carencia::Educacion => "educacion",
            Carencia::SeguridadSocial => "seguridad_social",
        }
    }

    /// Source-table column carrying the flag for this deprivation.
    pub fn column_name(&self) -> &'static str {
        match self {
            Carencia::Salud => "presencia_carencia_salud_persona",
            Carencia::Educacion => "presencia_rezago_educativo_persona",
            Carencia::SeguridadSocial => "presencia_carencia_seguridad_social_persona",
        }
    }
}

/// Variables callers may cross-tabulate. Each resolves to a typed accessor
/// on `PersonRecord`; age additionally goes through fixed bins before
/// counting (see `engine::crosstab`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossVar {
    Sexo,
    Edad,
    Parentesco,
    Colonia,
    CarenciaSalud,
    CarenciaEducacion,
    CarenciaSeguridad,
}

impl CrossVar {
    /// Internal column name, kept in the numeric result structure.
    /// Age reports as `edad_cat` because cross-tabs always bin it.
    pub fn internal_name(&self) -> &'static str {
        match self {
            CrossVar::Sexo => "sexo_persona",
            CrossVar::Edad => "edad_cat",
            CrossVar::Parentesco => "parentesco_persona",
            CrossVar::Colonia => "colonia",
            CrossVar::CarenciaSalud => Carencia::Salud.column_name(),
            CrossVar::CarenciaEducacion => Carencia::Educacion.column_name(),
            CrossVar::CarenciaSeguridad => Carencia::SeguridadSocial.column_name(),
        }
    }

    /// Human-facing label, used only in the rendered grid.
    pub fn display_label(&self) -> &'static str {
        match self {
            CrossVar::Sexo => "Sexo",
            CrossVar::Edad => "Rango Edad",
            CrossVar::Parentesco => "Parentesco",
            CrossVar::Colonia => "Colonia",
            CrossVar::CarenciaSalud => "Salud",
            CrossVar::CarenciaEducacion => "Educación",
            CrossVar::CarenciaSeguridad => "Seg. Social",
        }
    }

    /// Categorical value of this variable for one record. Age is handled by
    /// the cross-tab binning and never reaches this accessor.
    pub fn value<'a>(&self, record: &'a PersonRecord) -> &'a str {
        match self {
            CrossVar::Sexo => &record.sexo,
            CrossVar::Edad => "",
            CrossVar::Parentesco => &record.parentesco,
            CrossVar::Colonia => &record.colonia,
            CrossVar::CarenciaSalud => record.carencia(Carencia::Salud),
            CrossVar::CarenciaEducacion => record.carencia(Carencia::Educacion),
            CrossVar::CarenciaSeguridad => record.carencia(Carencia::SeguridadSocial),
        }
    }
}

/// Resolve a program key. Unknown keys are the caller's problem to report.
pub fn programa(key: &str) -> Option<Programa> {
    Programa::ALL.iter().copied().find(|p| p.key() == key)
}

/// Resolve a deprivation-type key.
pub fn carencia(key: &str) -> Option<Carencia> {
    Carencia::ALL.iter().copied().find(|c| c.key() == key)
}

/// Resolve a relationship-role key (case-insensitive) to its display label.
/// Callers fall back to the verbatim input when the key is unknown, because
/// the input may already be a correct display label.
pub fn parentesco_label(key: &str) -> Option<&'static str> {
    match key.to_lowercase().as_str() {
        "jefe" => Some("Jefa o jefe"),
        "esposa" => Some("Esposa(o) o pareja"),
        "hijo" => Some("Hija(o)"),
        "nieto" => Some("Nieta(o)"),
        "padre" => Some("Madre o padre"),
        _ => None,
    }
}

/// Resolve a cross-tabulation variable key.
pub fn variable_cruce(key: &str) -> Option<CrossVar> {
    match key {
        "sexo" => Some(CrossVar::Sexo),
        "edad" => Some(CrossVar::Edad),
        "parentesco" => Some(CrossVar::Parentesco),
        "colonia" => Some(CrossVar::Colonia),
        "carencia_salud" => Some(CrossVar::CarenciaSalud),
        "carencia_educacion" => Some(CrossVar::CarenciaEducacion),
        "carencia_seguridad" => Some(CrossVar::CarenciaSeguridad),
        _ => None,
    }
}

/// All program keys, for prompt construction.
pub fn program_keys() -> Vec<&'static str> {
    Programa::ALL.iter().map(|p| p.key()).collect()
}

/// All cross-tab variable keys, for prompt construction.
pub fn cross_var_keys() -> Vec<&'static str> {
    vec![
        "sexo",
        "edad",
        "parentesco",
        "colonia",
        "carencia_salud",
        "carencia_educacion",
        "carencia_seguridad",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_program_keys() {
        assert_eq!(programa("beca_benito_juarez"), Some(Programa::BecaBenitoJuarez));
        assert_eq!(programa("leche_bienestar"), Some(Programa::LecheBienestar));
        assert_eq!(
            Programa::BecaRitaCetina.column_name(),
            "es_elegible_beca_rita_cetina"
        );
    }

    #[test]
    fn unknown_keys_resolve_to_none() {
        assert_eq!(programa("beca_inexistente"), None);
        assert_eq!(carencia("vivienda"), None);
        assert_eq!(variable_cruce("ageb"), None);
        assert_eq!(parentesco_label("sobrino"), None);
    }

    #[test]
    fn parentesco_lookup_is_case_insensitive() {
        assert_eq!(parentesco_label("JEFE"), Some("Jefa o jefe"));
        assert_eq!(parentesco_label("Esposa"), Some("Esposa(o) o pareja"));
    }

    #[test]
    fn program_indices_are_stable() {
        for (i, p) in Programa::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn cross_var_labels_and_names() {
        assert_eq!(CrossVar::Edad.internal_name(), "edad_cat");
        assert_eq!(CrossVar::Edad.display_label(), "Rango Edad");
        assert_eq!(
            CrossVar::CarenciaSalud.internal_name(),
            "presencia_carencia_salud_persona"
        );
        assert_eq!(CrossVar::CarenciaSeguridad.display_label(), "Seg. Social");
    }
}
