//! Acceso de sólo lectura a los periódicos almacenados.
//!
//! API pública:
//!   - `DocumentStore::fetch(&str)` → el registro completo o `NotFound`.
//!   - `DocumentStore::list()` → resumen de todos los periódicos.
//!
//! Implementaciones: `Neo4jStore` (nodos `:Newspaper`) y `MemoryStore`
//! (fichero JSON cargado al arrancar).

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    models::{NewspaperRecord, NewspaperSummary, Payload},
};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, id: &str) -> AppResult<NewspaperRecord>;

    /// Ordenado por fecha y, a igual fecha, por id.
    async fn list(&self) -> AppResult<Vec<NewspaperSummary>>;
}

// ---------------------------------------------------------------------
// NEO4J
// ---------------------------------------------------------------------

/// Periódicos guardados como nodos `(:Newspaper {id, newspaper_name, date,
/// full_json_data})`, con `full_json_data` serializado como texto JSON.
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl DocumentStore for Neo4jStore {
    async fn fetch(&self, id: &str) -> AppResult<NewspaperRecord> {
        let mut cursor = self
            .graph
            .execute(
                query(
                    "MATCH (n:Newspaper {id: $id})
                     RETURN n.newspaper_name AS newspaper_name,
                            n.newspaper_name IS NOT NULL AS has_newspaper_name,
                            n.date AS date,
                            n.date IS NOT NULL AS has_date,
                            n.full_json_data AS full_json_data,
                            n.full_json_data IS NOT NULL AS has_full_json_data",
                )
                .param("id", id.to_string()),
            )
            .await?;

        let row = cursor
            .next()
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        // `row.get` devuelve None tanto si falta la propiedad como si no es
        // texto; los flags `has_*` separan ambos casos.
        let text = |field: &str| {
            text_property(
                id,
                field,
                row.get(field),
                row.get(&format!("has_{field}")).unwrap_or(false),
            )
        };

        record_from_parts(
            id.to_string(),
            text("newspaper_name")?.unwrap_or_default(),
            text("date")?.unwrap_or_default(),
            text("full_json_data")?,
        )
    }

    async fn list(&self) -> AppResult<Vec<NewspaperSummary>> {
        let mut cursor = self
            .graph
            .execute(query(
                "MATCH (n:Newspaper)
                 RETURN n.id AS id, n.newspaper_name AS newspaper_name, n.date AS date
                 ORDER BY date, id",
            ))
            .await?;

        let mut summaries = Vec::new();
        while let Some(row) = cursor.next().await? {
            let Some(id) = row.get::<String>("id") else {
                continue;
            };
            summaries.push(NewspaperSummary {
                id,
                newspaper_name: row.get("newspaper_name").unwrap_or_default(),
                date: row.get("date").unwrap_or_default(),
            });
        }
        Ok(summaries)
    }
}

/// Una propiedad presente con un tipo distinto de texto es un registro corrupto.
fn text_property(
    id: &str,
    field: &str,
    value: Option<String>,
    present: bool,
) -> AppResult<Option<String>> {
    match (value, present) {
        (Some(value), _) => Ok(Some(value)),
        (None, false) => Ok(None),
        (None, true) => Err(AppError::StoreUnavailable(format!(
            "la propiedad '{field}' del periódico '{id}' no es texto"
        ))),
    }
}

/// Reconstruye el registro a partir de las propiedades del nodo. Un
/// `full_json_data` ausente equivale a un payload vacío; uno que no es un
/// objeto JSON es un registro corrupto.
fn record_from_parts(
    id: String,
    newspaper_name: String,
    date: String,
    raw_payload: Option<String>,
) -> AppResult<NewspaperRecord> {
    let full_json_data = match raw_payload {
        None => Payload::new(),
        Some(raw) if raw.trim().is_empty() => Payload::new(),
        Some(raw) => serde_json::from_str::<Payload>(&raw).map_err(|e| {
            AppError::StoreUnavailable(format!(
                "full_json_data del periódico '{id}' no es un objeto JSON válido: {e}"
            ))
        })?,
    };

    Ok(NewspaperRecord {
        id,
        newspaper_name,
        date,
        full_json_data,
    })
}

// ---------------------------------------------------------------------
// MEMORIA
// ---------------------------------------------------------------------

/// Almacén en memoria, inmutable tras construirse.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, NewspaperRecord>,
}

impl MemoryStore {
    pub fn new(records: impl IntoIterator<Item = NewspaperRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }

    /// Carga un array JSON de registros desde disco.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer {}", path.display()))?;
        let records: Vec<NewspaperRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("{} no contiene un array de periódicos", path.display()))?;
        info!("Cargados {} periódicos desde {}", records.len(), path.display());
        Ok(Self::new(records))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, id: &str) -> AppResult<NewspaperRecord> {
        debug!("Buscando periódico '{id}' en memoria");
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn list(&self) -> AppResult<Vec<NewspaperSummary>> {
        let mut summaries: Vec<NewspaperSummary> =
            self.records.values().map(NewspaperRecord::summary).collect();
        summaries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }
}
