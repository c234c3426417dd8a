//! Intent routing - The defensive boundary between the LLM and the engine
//!
//! The extractor collaborator produces a `{intencion, filtros}` payload; this
//! module validates it, expands high-level filter shortcuts into primitive
//! filters, and dispatches to one analytical operation. Nothing the payload
//! contains can make a panic or an `Err` cross this boundary: unknown
//! intentions and unresolvable keys come back as structured error results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog;
use crate::engine::{AnalysisResult, Analyzer, FilterSet};

/// The five recognized intentions, as the extractor emits them.
pub const INTENTIONS: [&str; 5] = [
    "conteo_general",
    "elegibilidad",
    "brechas",
    "vulnerabilidad",
    "tabla_cruzada",
];

/// Structured payload from the intent extractor. `intencion` stays a string
/// so an unrecognized value reaches `route` and is reported there, instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentPayload {
    pub intencion: String,
    pub filtros: FilterSet,
}

impl IntentPayload {
    /// Lenient extraction from arbitrary JSON. Returns `None` only when there
    /// is no usable `intencion` at all — any malformed filter field is simply
    /// dropped by `FilterSet::from_value`.
    pub fn from_value(value: &Value) -> Option<IntentPayload> {
        let obj = value.as_object()?;
        let intencion = obj.get("intencion")?.as_str()?.trim().to_string();
        if intencion.is_empty() {
            return None;
        }
        let filtros = obj
            .get("filtros")
            .map(FilterSet::from_value)
            .unwrap_or_default();
        Some(IntentPayload { intencion, filtros })
    }
}

/// Expand high-level group shortcuts into primitive filters. The pipeline
/// itself only ever sees sex/relationship predicates.
pub fn expand_special_group(filtros: &mut FilterSet) {
    if filtros.grupo_especial.as_deref() == Some("jefas_familia") {
        filtros.sexo = Some("Mujer".to_string());
        filtros.parentesco = Some("jefe".to_string());
    }
    filtros.grupo_especial = None;
}

/// Validate the payload and dispatch to the matching operation.
pub fn route(analyzer: &Analyzer, payload: &IntentPayload) -> AnalysisResult {
    if !INTENTIONS.contains(&payload.intencion.as_str()) {
        return AnalysisResult::error("Intención no reconocida");
    }

    let mut filtros = payload.filtros.clone();
    expand_special_group(&mut filtros);

    // An unresolvable deprivation key is a validation error, not a silently
    // skipped filter.
    if let Some(key) = filtros.carencia_tipo.as_deref() {
        if catalog::carencia(key).is_none() {
            return AnalysisResult::error(format!("Carencia no reconocida: {}", key));
        }
    }

    match payload.intencion.as_str() {
        "conteo_general" => analyzer.general_profile(&filtros),
        "elegibilidad" => analyzer.eligibility(&filtros),
        "brechas" => analyzer.coverage_gaps(&filtros),
        "vulnerabilidad" => analyzer.vulnerability_intensity(&filtros),
        "tabla_cruzada" => analyzer.cross_tabulation(&filtros),
        _ => unreachable!("intention membership checked above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NUM_PROGRAMAS;
    use crate::dataset::{Dataset, PersonRecord};
    use std::sync::Arc;

    fn persona(sexo: &str, parentesco: &str) -> PersonRecord {
        PersonRecord {
            id_hogar: "H".into(),
            id_persona: format!("{}-{}", sexo, parentesco),
            edad: 35,
            sexo: sexo.into(),
            parentesco: parentesco.into(),
            colonia: "Centro".into(),
            ageb: "0001".into(),
            carencia_salud: "no".into(),
            rezago_educativo: "no".into(),
            carencia_seguridad_social: "no".into(),
            recibe_apoyos_sociales: None,
            elegibilidades: [false; NUM_PROGRAMAS],
            hogar: None,
        }
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(Arc::new(Dataset::from_records(vec![
            persona("Mujer", "Jefa o jefe"),
            persona("Mujer", "Hija(o)"),
            persona("Hombre", "Jefa o jefe"),
        ])))
    }

    #[test]
    fn unknown_intention_is_reported_not_raised() {
        let payload = IntentPayload {
            intencion: "resumen_total".into(),
            filtros: FilterSet::default(),
        };
        assert_eq!(
            route(&analyzer(), &payload),
            AnalysisResult::error("Intención no reconocida")
        );
    }

    #[test]
    fn special_group_expands_to_sex_and_relationship() {
        let mut filtros = FilterSet {
            grupo_especial: Some("jefas_familia".into()),
            ..Default::default()
        };
        expand_special_group(&mut filtros);
        assert_eq!(filtros.sexo.as_deref(), Some("Mujer"));
        assert_eq!(filtros.parentesco.as_deref(), Some("jefe"));
        assert_eq!(filtros.grupo_especial, None);

        // "ninguno" expands to nothing.
        let mut filtros = FilterSet {
            grupo_especial: Some("ninguno".into()),
            ..Default::default()
        };
        expand_special_group(&mut filtros);
        assert_eq!(filtros.sexo, None);
    }

    #[test]
    fn routing_applies_the_expansion() {
        let payload = IntentPayload {
            intencion: "conteo_general".into(),
            filtros: FilterSet {
                grupo_especial: Some("jefas_familia".into()),
                ..Default::default()
            },
        };
        match route(&analyzer(), &payload) {
            AnalysisResult::General(p) => assert_eq!(p.total_personas, 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unknown_deprivation_key_is_a_validation_error() {
        let payload = IntentPayload {
            intencion: "conteo_general".into(),
            filtros: FilterSet {
                carencia_tipo: Some("vivienda".into()),
                ..Default::default()
            },
        };
        match route(&analyzer(), &payload) {
            AnalysisResult::Error { error } => assert!(error.contains("vivienda")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn payload_extraction_fails_soft() {
        assert_eq!(IntentPayload::from_value(&serde_json::json!("texto")), None);
        assert_eq!(
            IntentPayload::from_value(&serde_json::json!({ "filtros": {} })),
            None
        );

        let payload = IntentPayload::from_value(&serde_json::json!({
            "intencion": "vulnerabilidad",
            "filtros": { "rango_edad": [0, 17], "sexo": 3 }
        }))
        .unwrap();
        assert_eq!(payload.intencion, "vulnerabilidad");
        assert_eq!(payload.filtros.rango_edad, Some(vec![0, 17]));
        assert_eq!(payload.filtros.sexo, None);
    }
}
