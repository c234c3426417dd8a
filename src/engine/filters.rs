//! Filter Pipeline - Conjunctive row predicates over the unified table
//!
//! All filter fields are optional and independent; the pipeline applies every
//! one that is present, in any order (they commute). Domain shortcuts like
//! the heads-of-household-women group do NOT live here — the routing boundary
//! expands them into these primitive filters first.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog;
use crate::dataset::{Dataset, PersonRecord};

/// Generic location-type words stripped from a location query term before
/// matching, so "Colonia Centro" matches colonia values containing "centro".
const GENERIC_LOCATION_WORDS: [&str; 4] = ["colonia", "pueblo", "barrio", "ageb"];

/// The filter parameters an intent payload may carry. Everything optional;
/// the per-operation keys (programa_social, variable_fila/columna) ride along
/// here because the LLM emits them in the same `filtros` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    pub ubicacion: Option<String>,
    /// Inclusive [min,max]; only applied when exactly two values are present.
    pub rango_edad: Option<Vec<i64>>,
    pub sexo: Option<String>,
    pub parentesco: Option<String>,
    pub carencia_tipo: Option<String>,
    pub grupo_especial: Option<String>,
    pub programa_social: Option<String>,
    pub variable_fila: Option<String>,
    pub variable_columna: Option<String>,
}

impl FilterSet {
    /// Lenient extraction from arbitrary JSON. Anything that is not the
    /// expected shape for a field is treated as absent — the LLM payload is
    /// never trusted to be well-formed.
    pub fn from_value(value: &Value) -> FilterSet {
        let obj = match value.as_object() {
            Some(o) => o,
            None => return FilterSet::default(),
        };
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let rango_edad = obj.get("rango_edad").and_then(Value::as_array).map(|a| {
            a.iter()
                .filter_map(Value::as_i64)
                .collect::<Vec<i64>>()
        });
        FilterSet {
            ubicacion: text("ubicacion"),
            rango_edad,
            sexo: text("sexo"),
            parentesco: text("parentesco"),
            carencia_tipo: text("carencia_tipo"),
            grupo_especial: text("grupo_especial"),
            programa_social: text("programa_social"),
            variable_fila: text("variable_fila"),
            variable_columna: text("variable_columna"),
        }
    }

    /// Apply every present filter to the table, returning the matching
    /// subset as borrowed rows. The shared table is never mutated.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a PersonRecord> {
        let ubicacion = self.ubicacion.as_deref().map(clean_location_term);
        let rango = match self.rango_edad.as_deref() {
            Some([min, max]) => Some((*min, *max)),
            _ => None,
        };
        let parentesco = self.parentesco.as_deref().map(|p| {
            catalog::parentesco_label(p)
                .map(String::from)
                .unwrap_or_else(|| p.to_string())
        });
        let carencia = self
            .carencia_tipo
            .as_deref()
            .and_then(catalog::carencia);

        dataset
            .records()
            .iter()
            .filter(|r| {
                if let Some(term) = &ubicacion {
                    if !matches_location(r, term) {
                        return false;
                    }
                }
                if let Some((min, max)) = rango {
                    let edad = r.edad as i64;
                    if edad < min || edad > max {
                        return false;
                    }
                }
                if let Some(sexo) = &self.sexo {
                    if &r.sexo != sexo {
                        return false;
                    }
                }
                if let Some(label) = &parentesco {
                    if &r.parentesco != label {
                        return false;
                    }
                }
                if let Some(c) = carencia {
                    if !r.tiene_carencia(c) {
                        return false;
                    }
                }
                true
            })
            .collect()
    }
}

/// Strip generic location-type words and whitespace from the query term.
/// Falls back to the original term when stripping leaves nothing, guarding
/// against a query that consists only of a generic word.
fn clean_location_term(term: &str) -> String {
    let mut cleaned = term.to_lowercase();
    for word in GENERIC_LOCATION_WORDS {
        cleaned = cleaned.replace(word, "");
    }
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        term.trim().to_lowercase()
    } else {
        cleaned.to_string()
    }
}

/// Case-insensitive substring match against the colonia OR ageb field.
fn matches_location(record: &PersonRecord, term: &str) -> bool {
    record.colonia.to_lowercase().contains(term) || record.ageb.to_lowercase().contains(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NUM_PROGRAMAS;
    use crate::dataset::Dataset;

    fn persona(edad: u8, sexo: &str, parentesco: &str, colonia: &str, ageb: &str) -> PersonRecord {
        PersonRecord {
            id_hogar: "H".into(),
            id_persona: format!("{}-{}", colonia, edad),
            edad,
            sexo: sexo.into(),
            parentesco: parentesco.into(),
            colonia: colonia.into(),
            ageb: ageb.into(),
            carencia_salud: "no".into(),
            rezago_educativo: "no".into(),
            carencia_seguridad_social: "no".into(),
            recibe_apoyos_sociales: None,
            elegibilidades: [false; NUM_PROGRAMAS],
            hogar: None,
        }
    }

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            persona(10, "Mujer", "Hija(o)", "Centro", "0100"),
            persona(40, "Mujer", "Jefa o jefe", "San Ángel", "0200"),
            persona(70, "Hombre", "Jefa o jefe", "Olivar", "0300"),
        ])
    }

    #[test]
    fn location_term_is_stripped_of_generic_words() {
        assert_eq!(clean_location_term("Colonia Centro"), "centro");
        assert_eq!(clean_location_term("  BARRIO olivar "), "olivar");
        // A term that is only a generic word falls back to itself.
        assert_eq!(clean_location_term("ageb"), "ageb");
    }

    #[test]
    fn location_matches_colonia_or_ageb() {
        let ds = sample();
        let f = FilterSet {
            ubicacion: Some("Colonia Centro".into()),
            ..Default::default()
        };
        assert_eq!(f.apply(&ds).len(), 1);

        // ageb substring match
        let f = FilterSet {
            ubicacion: Some("0300".into()),
            ..Default::default()
        };
        let subset = f.apply(&ds);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].colonia, "Olivar");
    }

    #[test]
    fn age_range_applies_only_with_two_bounds() {
        let ds = sample();
        let f = FilterSet {
            rango_edad: Some(vec![0, 18]),
            ..Default::default()
        };
        assert_eq!(f.apply(&ds).len(), 1);

        // One bound: ignored, everything passes.
        let f = FilterSet {
            rango_edad: Some(vec![18]),
            ..Default::default()
        };
        assert_eq!(f.apply(&ds).len(), 3);
    }

    #[test]
    fn age_range_bounds_are_inclusive() {
        let ds = sample();
        let f = FilterSet {
            rango_edad: Some(vec![10, 40]),
            ..Default::default()
        };
        assert_eq!(f.apply(&ds).len(), 2);
    }

    #[test]
    fn parentesco_accepts_key_or_display_label() {
        let ds = sample();
        for input in ["jefe", "JEFE", "Jefa o jefe"] {
            let f = FilterSet {
                parentesco: Some(input.into()),
                ..Default::default()
            };
            assert_eq!(f.apply(&ds).len(), 2, "input {:?}", input);
        }
    }

    #[test]
    fn filters_combine_conjunctively() {
        let ds = sample();
        let f = FilterSet {
            sexo: Some("Mujer".into()),
            parentesco: Some("jefe".into()),
            ..Default::default()
        };
        let subset = f.apply(&ds);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].colonia, "San Ángel");
    }

    #[test]
    fn lenient_parse_tolerates_malformed_fields() {
        let v = serde_json::json!({
            "ubicacion": 42,
            "rango_edad": "0-18",
            "sexo": "Mujer",
            "extra_field": true
        });
        let f = FilterSet::from_value(&v);
        assert_eq!(f.ubicacion, None);
        assert_eq!(f.rango_edad, None);
        assert_eq!(f.sexo.as_deref(), Some("Mujer"));

        // Non-object payloads collapse to the empty filter set.
        assert_eq!(FilterSet::from_value(&Value::Null), FilterSet::default());
    }
}
