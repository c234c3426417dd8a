//! Analytical operations - The five deterministic aggregates
//!
//! Each operation is a pure function of (dataset, filters): it applies the
//! filter pipeline, computes its aggregate over the resulting subset, and
//! returns a structured `AnalysisResult`. Empty working sets come back as an
//! explicit notice or zero-safe figures, validation problems as structured
//! error fields — nothing here panics or raises past the engine boundary.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog;
use crate::dataset::{Dataset, PersonRecord};
use crate::engine::crosstab;
use crate::engine::filters::FilterSet;

pub const AVISO_SIN_DATOS: &str = "Sin datos para estos filtros.";

/// Structured result of any analytical operation. Serializes untagged so the
/// JSON the narration layer sees carries only the operation's own fields,
/// matching the wire contract the downstream prompts were written against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    /// Empty working set: a distinguishable "no data" marker, not an error.
    Aviso { aviso: String },
    /// Validation error (unknown program/variable/deprivation key).
    Error { error: String },
    /// Unexpected internal failure, reported instead of propagated.
    ErrorInterno { error_interno: String },
    General(GeneralProfile),
    Elegibilidad(EligibilityReport),
    Brechas(CoverageGapReport),
    Vulnerabilidad(VulnerabilityReport),
    TablaCruzada(CrossTabReport),
}

impl AnalysisResult {
    pub fn sin_datos() -> Self {
        AnalysisResult::Aviso {
            aviso: AVISO_SIN_DATOS.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AnalysisResult::Error {
            error: message.into(),
        }
    }

    pub fn error_interno(message: impl Into<String>) -> Self {
        AnalysisResult::ErrorInterno {
            error_interno: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "error_interno": format!("Serialización fallida: {}", e) })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralProfile {
    pub total_personas: u64,
    pub hogares_unicos: u64,
    pub edad_promedio: f64,
    pub distribucion_sexo: BTreeMap<String, u64>,
    pub top_5_colonias: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicProfile {
    pub edad_promedio: f64,
    pub mujeres: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityReport {
    pub programa: String,
    pub poblacion_objetivo: u64,
    pub tasa_elegibilidad: f64,
    pub perfil_demografico: DemographicProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageGapReport {
    pub analisis: String,
    pub programa: String,
    pub total_elegibles: u64,
    pub personas_sin_apoyo: u64,
    pub porcentaje_brecha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VulnerabilityReport {
    pub analisis: String,
    /// Frequency of each intensity value (0..=3), ascending by intensity.
    pub distribucion_carencias: BTreeMap<u8, u64>,
    pub total_personas: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTabReport {
    pub analisis: String,
    /// Pipe-delimited rendered grid for direct display. Downstream consumers
    /// treat this as opaque text and exclude it from semantic analysis.
    pub tabla_visual: String,
    pub datos_json: crosstab::CrossTabData,
}

/// The query engine proper: holds the read-only unified table and exposes
/// the five analytical operations.
pub struct Analyzer {
    dataset: std::sync::Arc<Dataset>,
}

impl Analyzer {
    pub fn new(dataset: std::sync::Arc<Dataset>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// General demographic profile of the filtered population.
    pub fn general_profile(&self, filtros: &FilterSet) -> AnalysisResult {
        let subset = filtros.apply(&self.dataset);
        if subset.is_empty() {
            return AnalysisResult::sin_datos();
        }

        let mut hogares: std::collections::HashSet<&str> = std::collections::HashSet::new();
        let mut sexo_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut colonia_counts: BTreeMap<String, u64> = BTreeMap::new();
        for r in &subset {
            hogares.insert(r.id_hogar.as_str());
            *sexo_counts.entry(r.sexo.clone()).or_insert(0) += 1;
            *colonia_counts.entry(r.colonia.clone()).or_insert(0) += 1;
        }

        AnalysisResult::General(GeneralProfile {
            total_personas: subset.len() as u64,
            hogares_unicos: hogares.len() as u64,
            edad_promedio: mean_age(&subset),
            distribucion_sexo: sexo_counts,
            top_5_colonias: top_n(colonia_counts, 5),
        })
    }

    /// Eligibility count and rate for one program within the filtered set.
    pub fn eligibility(&self, filtros: &FilterSet) -> AnalysisResult {
        let prog_key = filtros.programa_social.as_deref().unwrap_or("");
        let programa = match catalog::programa(prog_key) {
            Some(p) => p,
            None => return AnalysisResult::error(format!("Programa no encontrado: {}", prog_key)),
        };

        let base = filtros.apply(&self.dataset);
        let elegibles: Vec<&&PersonRecord> =
            base.iter().filter(|r| r.es_elegible(programa)).collect();

        let tasa = if base.is_empty() {
            0.0
        } else {
            round1(elegibles.len() as f64 / base.len() as f64 * 100.0)
        };
        let edad_promedio = if elegibles.is_empty() {
            0.0
        } else {
            round1(elegibles.iter().map(|r| r.edad as f64).sum::<f64>() / elegibles.len() as f64)
        };
        let mujeres = elegibles.iter().filter(|r| r.sexo == "Mujer").count() as u64;

        AnalysisResult::Elegibilidad(EligibilityReport {
            programa: prog_key.to_string(),
            poblacion_objetivo: elegibles.len() as u64,
            tasa_elegibilidad: tasa,
            perfil_demografico: DemographicProfile {
                edad_promedio,
                mujeres,
            },
        })
    }

    /// Coverage gap: the eligible people who report receiving no support.
    pub fn coverage_gaps(&self, filtros: &FilterSet) -> AnalysisResult {
        let prog_key = filtros.programa_social.as_deref().unwrap_or("");
        let programa = match catalog::programa(prog_key) {
            Some(p) => p,
            None => return AnalysisResult::error(format!("Programa no encontrado: {}", prog_key)),
        };

        let base = filtros.apply(&self.dataset);
        let elegibles: Vec<&&PersonRecord> =
            base.iter().filter(|r| r.es_elegible(programa)).collect();
        let sin_apoyo = elegibles.iter().filter(|r| r.sin_apoyo()).count() as u64;

        let porcentaje = if elegibles.is_empty() {
            0.0
        } else {
            round1(sin_apoyo as f64 / elegibles.len() as f64 * 100.0)
        };

        AnalysisResult::Brechas(CoverageGapReport {
            analisis: "Brechas de Cobertura".to_string(),
            programa: prog_key.to_string(),
            total_elegibles: elegibles.len() as u64,
            personas_sin_apoyo: sin_apoyo,
            porcentaje_brecha: porcentaje,
        })
    }

    /// Distribution of vulnerability intensity (simultaneous deprivations,
    /// 0..=3) across the filtered population. The derived intensity value is
    /// computed per call and never persisted on the table.
    pub fn vulnerability_intensity(&self, filtros: &FilterSet) -> AnalysisResult {
        let subset = filtros.apply(&self.dataset);

        let mut distribucion: BTreeMap<u8, u64> = BTreeMap::new();
        for r in &subset {
            *distribucion.entry(r.intensidad()).or_insert(0) += 1;
        }

        AnalysisResult::Vulnerabilidad(VulnerabilityReport {
            analisis: "Intensidad de Vulnerabilidad".to_string(),
            distribucion_carencias: distribucion,
            total_personas: subset.len() as u64,
        })
    }

    /// Contingency table between two catalog variables, with TOTAL margins
    /// and a rendered pipe grid.
    pub fn cross_tabulation(&self, filtros: &FilterSet) -> AnalysisResult {
        let var_fila = filtros.variable_fila.as_deref().unwrap_or("");
        let var_col = filtros.variable_columna.as_deref().unwrap_or("");
        let (fila, columna) = match (
            catalog::variable_cruce(var_fila),
            catalog::variable_cruce(var_col),
        ) {
            (Some(f), Some(c)) => (f, c),
            _ => return AnalysisResult::error("Variables inválidas para cruce."),
        };

        let subset = filtros.apply(&self.dataset);
        if subset.is_empty() {
            return AnalysisResult::sin_datos();
        }

        match crosstab::build(&subset, fila, columna) {
            Ok(tabla) => AnalysisResult::TablaCruzada(CrossTabReport {
                analisis: format!("Cruce {} vs {}", var_fila, var_col),
                tabla_visual: tabla.render(),
                datos_json: tabla.into_data(),
            }),
            Err(e) => AnalysisResult::error_interno(format!("Error generando tabla: {}", e)),
        }
    }
}

fn mean_age(subset: &[&PersonRecord]) -> f64 {
    if subset.is_empty() {
        return 0.0;
    }
    round1(subset.iter().map(|r| r.edad as f64).sum::<f64>() / subset.len() as f64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Top-n entries by (count desc, name asc), returned as a plain mapping.
fn top_n(counts: BTreeMap<String, u64>, n: usize) -> BTreeMap<String, u64> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.into_iter().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Programa, NUM_PROGRAMAS};
    use std::sync::Arc;

    fn persona(
        id_hogar: &str,
        edad: u8,
        sexo: &str,
        colonia: &str,
        elegible: Option<Programa>,
        apoyo: Option<&str>,
    ) -> PersonRecord {
        let mut elegibilidades = [false; NUM_PROGRAMAS];
        if let Some(p) = elegible {
            elegibilidades[p.index()] = true;
        }
        PersonRecord {
            id_hogar: id_hogar.into(),
            id_persona: format!("{}-{}-{}", id_hogar, edad, colonia),
            edad,
            sexo: sexo.into(),
            parentesco: "Hija(o)".into(),
            colonia: colonia.into(),
            ageb: "0001".into(),
            carencia_salud: "no".into(),
            rezago_educativo: "no".into(),
            carencia_seguridad_social: "no".into(),
            recibe_apoyos_sociales: apoyo.map(String::from),
            elegibilidades,
            hogar: None,
        }
    }

    fn analyzer(records: Vec<PersonRecord>) -> Analyzer {
        Analyzer::new(Arc::new(Dataset::from_records(records)))
    }

    #[test]
    fn general_profile_reports_counts_and_mean() {
        let a = analyzer(vec![
            persona("H1", 10, "Mujer", "Centro", None, None),
            persona("H1", 40, "Hombre", "Centro", None, None),
            persona("H2", 25, "Mujer", "Olivar", None, None),
        ]);
        match a.general_profile(&FilterSet::default()) {
            AnalysisResult::General(p) => {
                assert_eq!(p.total_personas, 3);
                assert_eq!(p.hogares_unicos, 2);
                assert_eq!(p.edad_promedio, 25.0);
                assert_eq!(p.distribucion_sexo["Mujer"], 2);
                assert_eq!(p.top_5_colonias["Centro"], 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn general_profile_empty_set_returns_aviso() {
        let a = analyzer(vec![persona("H1", 10, "Mujer", "Centro", None, None)]);
        let f = FilterSet {
            sexo: Some("Hombre".into()),
            ..Default::default()
        };
        assert_eq!(a.general_profile(&f), AnalysisResult::sin_datos());
    }

    #[test]
    fn eligibility_unknown_program_is_an_error_result() {
        let a = analyzer(vec![persona("H1", 10, "Mujer", "Centro", None, None)]);
        let f = FilterSet {
            programa_social: Some("beca_inexistente".into()),
            ..Default::default()
        };
        match a.eligibility(&f) {
            AnalysisResult::Error { error } => assert!(error.contains("beca_inexistente")),
            other => panic!("unexpected result: {:?}", other),
        }
        // Missing key entirely also errors, never panics.
        match a.eligibility(&FilterSet::default()) {
            AnalysisResult::Error { .. } => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn eligibility_rate_is_zero_safe_on_empty_base() {
        let a = analyzer(vec![persona("H1", 10, "Mujer", "Centro", None, None)]);
        let f = FilterSet {
            programa_social: Some("inea".into()),
            sexo: Some("Hombre".into()),
            ..Default::default()
        };
        match a.eligibility(&f) {
            AnalysisResult::Elegibilidad(r) => {
                assert_eq!(r.poblacion_objetivo, 0);
                assert_eq!(r.tasa_elegibilidad, 0.0);
                assert_eq!(r.perfil_demografico.edad_promedio, 0.0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn eligibility_counts_women_among_eligible() {
        let a = analyzer(vec![
            persona("H1", 20, "Mujer", "Centro", Some(Programa::Inea), None),
            persona("H1", 30, "Hombre", "Centro", Some(Programa::Inea), None),
            persona("H2", 40, "Mujer", "Centro", None, None),
        ]);
        let f = FilterSet {
            programa_social: Some("inea".into()),
            ..Default::default()
        };
        match a.eligibility(&f) {
            AnalysisResult::Elegibilidad(r) => {
                assert_eq!(r.poblacion_objetivo, 2);
                assert_eq!(r.tasa_elegibilidad, 66.7);
                assert_eq!(r.perfil_demografico.edad_promedio, 25.0);
                assert_eq!(r.perfil_demografico.mujeres, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn coverage_gap_scenario_40_eligible_10_without_support() {
        // 100 people, 40 eligible, 10 of those without support -> 25.0%.
        let mut records = Vec::new();
        for i in 0..100 {
            let elegible = if i < 40 { Some(Programa::ImssBienestar) } else { None };
            let apoyo = if i < 10 { Some("No tiene") } else { Some("Tiene") };
            records.push(persona("H1", 30, "Mujer", &format!("C{}", i), elegible, apoyo));
        }
        let a = analyzer(records);
        let f = FilterSet {
            programa_social: Some("imss_bienestar".into()),
            ..Default::default()
        };
        match a.coverage_gaps(&f) {
            AnalysisResult::Brechas(r) => {
                assert_eq!(r.total_elegibles, 40);
                assert_eq!(r.personas_sin_apoyo, 10);
                assert_eq!(r.porcentaje_brecha, 25.0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn coverage_gap_missing_status_counts_as_gap() {
        let a = analyzer(vec![
            persona("H1", 30, "Mujer", "Centro", Some(Programa::Inea), None),
            persona("H1", 31, "Mujer", "Centro", Some(Programa::Inea), Some("Tiene")),
        ]);
        let f = FilterSet {
            programa_social: Some("inea".into()),
            ..Default::default()
        };
        match a.coverage_gaps(&f) {
            AnalysisResult::Brechas(r) => {
                assert_eq!(r.personas_sin_apoyo, 1);
                assert_eq!(r.porcentaje_brecha, 50.0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn coverage_gap_requires_valid_program() {
        let a = analyzer(vec![persona("H1", 30, "Mujer", "Centro", None, None)]);
        match a.coverage_gaps(&FilterSet::default()) {
            AnalysisResult::Error { .. } => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn vulnerability_counts_sum_to_population() {
        let mut r1 = persona("H1", 30, "Mujer", "Centro", None, None);
        r1.carencia_salud = "yes".into();
        r1.rezago_educativo = "yes".into();
        let mut r2 = persona("H2", 40, "Hombre", "Centro", None, None);
        r2.carencia_seguridad_social = "yes".into();
        let r3 = persona("H3", 50, "Mujer", "Centro", None, None);

        let a = analyzer(vec![r1, r2, r3]);
        match a.vulnerability_intensity(&FilterSet::default()) {
            AnalysisResult::Vulnerabilidad(v) => {
                assert_eq!(v.total_personas, 3);
                assert_eq!(v.distribucion_carencias[&0], 1);
                assert_eq!(v.distribucion_carencias[&1], 1);
                assert_eq!(v.distribucion_carencias[&2], 1);
                let suma: u64 = v.distribucion_carencias.values().sum();
                assert_eq!(suma, v.total_personas);
                // Intensity keys stay inside {0,1,2,3}.
                assert!(v.distribucion_carencias.keys().all(|k| *k <= 3));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn vulnerability_empty_set_is_zero_safe() {
        let a = analyzer(vec![persona("H1", 30, "Mujer", "Centro", None, None)]);
        let f = FilterSet {
            sexo: Some("Hombre".into()),
            ..Default::default()
        };
        match a.vulnerability_intensity(&f) {
            AnalysisResult::Vulnerabilidad(v) => {
                assert_eq!(v.total_personas, 0);
                assert!(v.distribucion_carencias.is_empty());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn operations_are_idempotent() {
        let a = analyzer(vec![
            persona("H1", 10, "Mujer", "Centro", Some(Programa::Inea), None),
            persona("H2", 20, "Hombre", "Olivar", None, Some("Tiene")),
        ]);
        let f = FilterSet {
            programa_social: Some("inea".into()),
            ..Default::default()
        };
        assert_eq!(a.general_profile(&f), a.general_profile(&f));
        assert_eq!(a.eligibility(&f), a.eligibility(&f));
        assert_eq!(a.coverage_gaps(&f), a.coverage_gaps(&f));
        assert_eq!(a.vulnerability_intensity(&f), a.vulnerability_intensity(&f));
    }
}
