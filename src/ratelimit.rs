//! Usage Store - Per-user daily query quota
//!
//! JSON file keyed email → ISO date → usage. Explicit read / record / prune
//! operations behind one store type; quota decisions stay out of the engine
//! entirely. Records the first 100 characters of each query for the usage
//! history the admin screen shows.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{Duration, Local, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

pub const DEFAULT_DAILY_LIMIT: u32 = 10;
pub const DEFAULT_RETENTION_DAYS: i64 = 30;
const HISTORY_SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayUsage {
    pub consultas: u32,
    pub primera_consulta: Option<String>,
    pub historial: Vec<HistEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistEntry {
    pub timestamp: String,
    pub consulta: String,
}

/// What the UI needs to render the quota widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageToday {
    pub consultas_hoy: u32,
    pub limite: u32,
    pub puede_consultar: bool,
    pub proxima_disponible: String,
    pub porcentaje_uso: f64,
}

type Limits = HashMap<String, HashMap<String, DayUsage>>;

pub struct UsageStore {
    path: PathBuf,
    limite: u32,
}

impl UsageStore {
    pub fn new(path: impl Into<PathBuf>, limite: u32) -> Self {
        Self {
            path: path.into(),
            limite,
        }
    }

    /// Create an empty backing file if none exists.
    pub fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, "{}")?;
        Ok(())
    }

    /// Today's usage for one user. Reading never mutates the file; a user
    /// with no record today simply reports zero.
    pub fn uso_de_hoy(&self, email: &str) -> Result<UsageToday> {
        let limites = self.read()?;
        let hoy = Local::now().date_naive().to_string();
        let consultas = limites
            .get(email)
            .and_then(|dias| dias.get(&hoy))
            .map(|d| d.consultas)
            .unwrap_or(0);

        // The quota resets at the next midnight.
        let manana = (Local::now().date_naive() + Duration::days(1))
            .and_time(NaiveTime::MIN);

        Ok(UsageToday {
            consultas_hoy: consultas,
            limite: self.limite,
            puede_consultar: consultas < self.limite,
            proxima_disponible: manana.format("%Y-%m-%dT%H:%M:%S").to_string(),
            porcentaje_uso: (consultas as f64 / self.limite as f64 * 1000.0).round() / 10.0,
        })
    }

    /// Record one successful query against today's quota.
    pub fn registrar_consulta(&self, email: &str, consulta: &str) -> Result<()> {
        let mut limites = self.read()?;
        let hoy = Local::now().date_naive().to_string();
        let ahora = Local::now().to_rfc3339();

        let dia = limites
            .entry(email.to_string())
            .or_default()
            .entry(hoy)
            .or_default();
        dia.consultas += 1;
        if dia.primera_consulta.is_none() {
            dia.primera_consulta = Some(ahora.clone());
        }
        dia.historial.push(HistEntry {
            timestamp: ahora,
            consulta: consulta.chars().take(HISTORY_SNIPPET_CHARS).collect(),
        });

        self.write(&limites)
    }

    /// Drop day records older than the retention window.
    pub fn limpiar_antiguos(&self, dias_retencion: i64) -> Result<()> {
        let mut limites = self.read()?;
        let fecha_limite = (Local::now().date_naive() - Duration::days(dias_retencion)).to_string();

        let mut eliminados = 0usize;
        for dias in limites.values_mut() {
            let antes = dias.len();
            dias.retain(|fecha, _| fecha.as_str() >= fecha_limite.as_str());
            eliminados += antes - dias.len();
        }
        if eliminados > 0 {
            info!(eliminados, "pruned old usage records");
        }
        self.write(&limites)
    }

    fn read(&self) -> Result<Limits> {
        let contenido = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contenido)?)
    }

    fn write(&self, limites: &Limits) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(limites)?)?;
        Ok(())
    }
}
