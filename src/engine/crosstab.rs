//! Cross-tabulation - Contingency tables with TOTAL margins
//!
//! Counts co-occurrences of two catalog variables over the filtered subset.
//! Age never enters a table raw: it is bucketed into five fixed ranges first.
//! The numeric structure keeps internal column keys; display labels are used
//! only in the rendered pipe grid.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::CrossVar;
use crate::dataset::PersonRecord;

pub const MARGIN_LABEL: &str = "TOTAL";

/// Fixed age buckets. Right-closed ranges over integer ages, with age 0
/// belonging to the first bucket.
pub fn categoria_edad(edad: u8) -> &'static str {
    match edad {
        0..=12 => "0-12",
        13..=18 => "13-18",
        19..=30 => "19-30",
        31..=60 => "31-60",
        _ => "60+",
    }
}

/// The nested numeric structure of a cross-tab result: row value → column
/// value → count, margins included under "TOTAL". `fila`/`columna` carry the
/// internal column names, not display labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTabData {
    pub fila: String,
    pub columna: String,
    pub celdas: BTreeMap<String, BTreeMap<String, u64>>,
}

/// A computed contingency table, pre-rendering.
pub struct CrossTab {
    fila: CrossVar,
    columna: CrossVar,
    /// Ordered observed categories per axis, margins excluded.
    row_cats: Vec<String>,
    col_cats: Vec<String>,
    /// Interior cells over the full cross product, zero-filled.
    counts: BTreeMap<(String, String), u64>,
}

/// Count the contingency table of two variables over a subset. Fails only on
/// an empty subset; callers report that as a "no data" result upstream.
pub fn build(
    subset: &[&PersonRecord],
    fila: CrossVar,
    columna: CrossVar,
) -> Result<CrossTab, String> {
    if subset.is_empty() {
        return Err("sin registros para tabular".to_string());
    }

    let mut row_cats: BTreeSet<String> = BTreeSet::new();
    let mut col_cats: BTreeSet<String> = BTreeSet::new();
    let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();

    for r in subset {
        let fila_val = value_of(fila, r);
        let col_val = value_of(columna, r);
        row_cats.insert(fila_val.clone());
        col_cats.insert(col_val.clone());
        *counts.entry((fila_val, col_val)).or_insert(0) += 1;
    }

    // Zero-fill the full cross product so unobserved combinations render as
    // explicit zeros.
    for rc in &row_cats {
        for cc in &col_cats {
            counts.entry((rc.clone(), cc.clone())).or_insert(0);
        }
    }

    Ok(CrossTab {
        fila,
        columna,
        row_cats: row_cats.into_iter().collect(),
        col_cats: col_cats.into_iter().collect(),
        counts,
    })
}

fn value_of(var: CrossVar, r: &PersonRecord) -> String {
    match var {
        CrossVar::Edad => categoria_edad(r.edad).to_string(),
        other => other.value(r).to_string(),
    }
}

impl CrossTab {
    fn cell(&self, row: &str, col: &str) -> u64 {
        self.counts
            .get(&(row.to_string(), col.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn row_total(&self, row: &str) -> u64 {
        self.col_cats.iter().map(|c| self.cell(row, c)).sum()
    }

    fn col_total(&self, col: &str) -> u64 {
        self.row_cats.iter().map(|r| self.cell(r, col)).sum()
    }

    fn grand_total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Render the pipe-delimited grid with display labels and TOTAL margins.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        let mut header = vec![self.fila.display_label().to_string()];
        header.extend(self.col_cats.iter().cloned());
        header.push(MARGIN_LABEL.to_string());
        lines.push(format!("| {} |", header.join(" | ")));
        lines.push(format!("|{}|", vec!["---"; header.len()].join("|")));

        for row in &self.row_cats {
            let mut cells = vec![row.clone()];
            cells.extend(self.col_cats.iter().map(|c| self.cell(row, c).to_string()));
            cells.push(self.row_total(row).to_string());
            lines.push(format!("| {} |", cells.join(" | ")));
        }

        let mut totals = vec![MARGIN_LABEL.to_string()];
        totals.extend(self.col_cats.iter().map(|c| self.col_total(c).to_string()));
        totals.push(self.grand_total().to_string());
        lines.push(format!("| {} |", totals.join(" | ")));

        lines.join("\n")
    }

    /// Flatten into the nested numeric structure, margins included.
    pub fn into_data(self) -> CrossTabData {
        let mut celdas: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

        for row in &self.row_cats {
            let mut fila_map: BTreeMap<String, u64> = BTreeMap::new();
            for col in &self.col_cats {
                fila_map.insert(col.clone(), self.cell(row, col));
            }
            fila_map.insert(MARGIN_LABEL.to_string(), self.row_total(row));
            celdas.insert(row.clone(), fila_map);
        }

        let mut total_row: BTreeMap<String, u64> = BTreeMap::new();
        for col in &self.col_cats {
            total_row.insert(col.clone(), self.col_total(col));
        }
        total_row.insert(MARGIN_LABEL.to_string(), self.grand_total());
        celdas.insert(MARGIN_LABEL.to_string(), total_row);

        CrossTabData {
            fila: self.fila.internal_name().to_string(),
            columna: self.columna.internal_name().to_string(),
            celdas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NUM_PROGRAMAS;

    fn persona(edad: u8, sexo: &str, salud: &str) -> PersonRecord {
        PersonRecord {
            id_hogar: "H".into(),
            id_persona: format!("{}-{}", sexo, edad),
            edad,
            sexo: sexo.into(),
            parentesco: "Hija(o)".into(),
            colonia: "Centro".into(),
            ageb: "0001".into(),
            carencia_salud: salud.into(),
            rezago_educativo: "no".into(),
            carencia_seguridad_social: "no".into(),
            recibe_apoyos_sociales: None,
            elegibilidades: [false; NUM_PROGRAMAS],
            hogar: None,
        }
    }

    #[test]
    fn age_buckets_cover_the_whole_domain() {
        assert_eq!(categoria_edad(0), "0-12");
        assert_eq!(categoria_edad(12), "0-12");
        assert_eq!(categoria_edad(13), "13-18");
        assert_eq!(categoria_edad(18), "13-18");
        assert_eq!(categoria_edad(19), "19-30");
        assert_eq!(categoria_edad(30), "19-30");
        assert_eq!(categoria_edad(31), "31-60");
        assert_eq!(categoria_edad(60), "31-60");
        assert_eq!(categoria_edad(61), "60+");
        assert_eq!(categoria_edad(120), "60+");
    }

    #[test]
    fn sexo_by_edad_scenario_with_margins() {
        // 3 Mujer age 10, 3 Hombre age 65.
        let records: Vec<PersonRecord> = (0..3)
            .map(|_| persona(10, "Mujer", "no"))
            .chain((0..3).map(|_| persona(65, "Hombre", "no")))
            .collect();
        let subset: Vec<&PersonRecord> = records.iter().collect();

        let tabla = build(&subset, CrossVar::Sexo, CrossVar::Edad).unwrap();
        let data = tabla.into_data();

        assert_eq!(data.fila, "sexo_persona");
        assert_eq!(data.columna, "edad_cat");
        assert_eq!(data.celdas["Mujer"]["0-12"], 3);
        assert_eq!(data.celdas["Hombre"]["60+"], 3);
        assert_eq!(data.celdas["Mujer"]["60+"], 0);
        assert_eq!(data.celdas["Hombre"]["0-12"], 0);
        assert_eq!(data.celdas["Mujer"][MARGIN_LABEL], 3);
        assert_eq!(data.celdas["Hombre"][MARGIN_LABEL], 3);
        assert_eq!(data.celdas[MARGIN_LABEL]["0-12"], 3);
        assert_eq!(data.celdas[MARGIN_LABEL]["60+"], 3);
        assert_eq!(data.celdas[MARGIN_LABEL][MARGIN_LABEL], 6);
    }

    #[test]
    fn margins_equal_sums_of_their_cells() {
        let records = vec![
            persona(5, "Mujer", "yes"),
            persona(15, "Mujer", "no"),
            persona(25, "Hombre", "yes"),
            persona(70, "Hombre", "yes"),
        ];
        let subset: Vec<&PersonRecord> = records.iter().collect();
        let data = build(&subset, CrossVar::Edad, CrossVar::CarenciaSalud)
            .unwrap()
            .into_data();

        for (row, cells) in &data.celdas {
            if row == MARGIN_LABEL {
                continue;
            }
            let suma: u64 = cells
                .iter()
                .filter(|(c, _)| c.as_str() != MARGIN_LABEL)
                .map(|(_, n)| n)
                .sum();
            assert_eq!(suma, cells[MARGIN_LABEL], "row {}", row);
        }
        assert_eq!(data.celdas[MARGIN_LABEL][MARGIN_LABEL], 4);
    }

    #[test]
    fn rendered_grid_uses_display_labels() {
        let records = vec![persona(40, "Mujer", "yes")];
        let subset: Vec<&PersonRecord> = records.iter().collect();
        let tabla = build(&subset, CrossVar::CarenciaSalud, CrossVar::Sexo).unwrap();
        let grid = tabla.render();

        // Header carries the UI label, not the internal column name.
        assert!(grid.starts_with("| Salud |"));
        assert!(!grid.contains("presencia_carencia_salud_persona"));
        assert!(grid.lines().last().unwrap().starts_with("| TOTAL |"));
    }

    #[test]
    fn empty_subset_is_rejected() {
        assert!(build(&[], CrossVar::Sexo, CrossVar::Edad).is_err());
    }
}
