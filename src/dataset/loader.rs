//! Dataset Loader - Builds the unified table from the four source CSVs
//!
//! Load order mirrors the deployment reality: try the local data directories
//! first, fall back to the published release URLs. The four tables are joined
//! on (id_hogar, id_persona) — persona ⋈ carencias ⋈ intervenciones inner,
//! hogar left — and rows with an age outside [0,120] are dropped so the
//! engine never sees them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::Reader;
use tracing::{info, warn};

use crate::catalog::Programa;
use crate::dataset::{Dataset, HogarAttrs, PersonRecord};

const FILE_HOGAR: &str = "CaracteristicasHogar.csv";
const FILE_PERSONA: &str = "CaracteristicasPersona.csv";
const FILE_CARENCIAS: &str = "CarenciasPersona.csv";
const FILE_INTERVENCIONES: &str = "IntervencionesPotencialesPAPEPersona.csv";

const LOCAL_CANDIDATES: [&str; 3] = ["data/01_data", "./data/01_data", "../data/01_data"];

/// A parsed CSV as header-keyed rows. The source files are wide and their
/// column sets have drifted between releases, so rows stay dynamic until the
/// join narrows them into typed `PersonRecord`s.
type Rows = Vec<HashMap<String, String>>;

pub struct DatasetLoader {
    base_url: String,
    data_dir: Option<PathBuf>,
    client: reqwest::Client,
}

impl DatasetLoader {
    pub fn new(base_url: impl Into<String>, data_dir: Option<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            data_dir,
            client: reqwest::Client::new(),
        }
    }

    /// Load and join the four source tables into the unified dataset.
    pub async fn load(&self) -> Result<Dataset> {
        let (hogar, persona, carencias, intervenciones) = match self.local_dir() {
            Some(dir) => {
                info!(dir = %dir.display(), "loading census tables from local directory");
                match self.load_local(&dir) {
                    Ok(tables) => tables,
                    Err(e) => {
                        warn!(error = %e, "local load failed, falling back to remote");
                        self.load_remote().await?
                    }
                }
            }
            None => {
                info!(base_url = %self.base_url, "loading census tables from release URLs");
                self.load_remote().await?
            }
        };

        let dataset = join_tables(hogar, persona, carencias, intervenciones);
        info!(personas = dataset.len(), "unified census table ready");
        Ok(dataset)
    }

    /// First configured or conventional directory that actually holds the
    /// person table.
    fn local_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.data_dir {
            if dir.join(FILE_PERSONA).exists() {
                return Some(dir.clone());
            }
        }
        LOCAL_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|d| d.join(FILE_PERSONA).exists())
    }

    fn load_local(&self, dir: &Path) -> Result<(Rows, Rows, Rows, Rows)> {
        Ok((
            read_csv_file(&dir.join(FILE_HOGAR))?,
            read_csv_file(&dir.join(FILE_PERSONA))?,
            read_csv_file(&dir.join(FILE_CARENCIAS))?,
            read_csv_file(&dir.join(FILE_INTERVENCIONES))?,
        ))
    }

    async fn load_remote(&self) -> Result<(Rows, Rows, Rows, Rows)> {
        Ok((
            self.fetch_csv(FILE_HOGAR).await?,
            self.fetch_csv(FILE_PERSONA).await?,
            self.fetch_csv(FILE_CARENCIAS).await?,
            self.fetch_csv(FILE_INTERVENCIONES).await?,
        ))
    }

    async fn fetch_csv(&self, file: &str) -> Result<Rows> {
        let url = format!("{}{}", self.base_url, file);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad status fetching {}", url))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;
        read_csv_rows(Reader::from_reader(bytes.as_ref()))
            .with_context(|| format!("Failed to parse CSV from {}", url))
    }
}

fn read_csv_file(path: &Path) -> Result<Rows> {
    let reader =
        Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv_rows(reader).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_csv_rows<R: std::io::Read>(mut reader: Reader<R>) -> Result<Rows> {
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = HashMap::new();
        for (i, field) in record.iter().enumerate() {
            if let Some(header) = headers.get(i) {
                row.insert(header.to_string(), field.to_string());
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// persona ⋈ carencias ⋈ intervenciones (inner, on id_hogar+id_persona),
/// then hogar (left, on id_hogar), then the age sanity cut.
fn join_tables(hogar: Rows, persona: Rows, carencias: Rows, intervenciones: Rows) -> Dataset {
    let carencias_by_id = index_by_person(carencias);
    let intervenciones_by_id = index_by_person(intervenciones);
    let hogar_by_id: HashMap<String, HashMap<String, String>> = hogar
        .into_iter()
        .filter_map(|row| row.get("id_hogar").cloned().map(|id| (id, row)))
        .collect();

    let mut seen: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
    let mut records = Vec::new();
    let mut dropped_age = 0usize;

    for row in persona {
        let id_hogar = match row.get("id_hogar") {
            Some(v) if !v.is_empty() => v.clone(),
            _ => continue,
        };
        let id_persona = match row.get("id_persona") {
            Some(v) if !v.is_empty() => v.clone(),
            _ => continue,
        };
        let key = (id_hogar.clone(), id_persona.clone());

        // Inner-join semantics: a person without deprivation or intervention
        // rows does not enter the unified table.
        let car = match carencias_by_id.get(&key) {
            Some(r) => r,
            None => continue,
        };
        let int = match intervenciones_by_id.get(&key) {
            Some(r) => r,
            None => continue,
        };

        // Age sanitization: unparseable or out-of-range ages drop the row.
        let edad = match get(&row, "edad_persona").parse::<f64>() {
            Ok(v) if (0.0..=120.0).contains(&v) => v as u8,
            _ => {
                dropped_age += 1;
                continue;
            }
        };

        if !seen.insert(key.clone()) {
            warn!(id_hogar = %id_hogar, id_persona = %id_persona, "duplicate person id, keeping first row");
            continue;
        }

        let mut elegibilidades = [false; crate::catalog::NUM_PROGRAMAS];
        for p in Programa::ALL {
            elegibilidades[p.index()] = int.get(&p.column_name()).map(String::as_str) == Some("yes");
        }

        let recibe = match int.get("recibe_apoyos_sociales") {
            Some(v) if !v.is_empty() => Some(v.clone()),
            _ => None,
        };

        let hogar_attrs = hogar_by_id.get(&id_hogar).map(|h| HogarAttrs {
            total_integrantes: h.get("total_integrantes").and_then(|v| v.parse().ok()),
            tipo_vivienda: h
                .get("tipo_vivienda")
                .filter(|v| !v.is_empty())
                .cloned(),
        });

        records.push(PersonRecord {
            id_hogar,
            id_persona,
            edad,
            sexo: get(&row, "sexo_persona"),
            parentesco: get(&row, "parentesco_persona"),
            colonia: get(&row, "colonia"),
            ageb: get(&row, "ageb"),
            carencia_salud: get(car, "presencia_carencia_salud_persona"),
            rezago_educativo: get(car, "presencia_rezago_educativo_persona"),
            carencia_seguridad_social: get(car, "presencia_carencia_seguridad_social_persona"),
            recibe_apoyos_sociales: recibe,
            elegibilidades,
            hogar: hogar_attrs,
        });
    }

    if dropped_age > 0 {
        info!(dropped = dropped_age, "rows dropped by the age [0,120] cut");
    }
    Dataset::from_records(records)
}

fn index_by_person(rows: Rows) -> HashMap<(String, String), HashMap<String, String>> {
    rows.into_iter()
        .filter_map(|row| {
            let h = row.get("id_hogar")?.clone();
            let p = row.get("id_persona")?.clone();
            Some(((h, p), row))
        })
        .collect()
}

fn get(row: &HashMap<String, String>, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}
