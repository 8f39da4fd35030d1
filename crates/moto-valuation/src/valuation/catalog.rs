//! CSV catalog import for the in-memory vehicle catalog.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{VehicleId, VehicleRecord};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
    DuplicateId(String),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::InvalidRow { line, reason } => {
                write!(f, "catalog row {} rejected: {}", line, reason)
            }
            CatalogImportError::DuplicateId(id) => {
                write!(f, "catalog lists motorcycle '{}' more than once", id)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::InvalidRow { .. } | CatalogImportError::DuplicateId(_) => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<VehicleRecord>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<VehicleRecord>, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut seen = HashSet::new();
        let mut vehicles = Vec::new();

        for (index, row) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            // header is line 1
            let line = index as u64 + 2;
            let vehicle = row?.into_record(line)?;
            if !seen.insert(vehicle.id.clone()) {
                return Err(CatalogImportError::DuplicateId(vehicle.id.0));
            }
            vehicles.push(vehicle);
        }

        Ok(vehicles)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    brand: String,
    model: String,
    year: i32,
    engine_cc: u32,
    engine_power_hp: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    base_price: u64,
}

impl CatalogRow {
    fn into_record(self, line: u64) -> Result<VehicleRecord, CatalogImportError> {
        let invalid = |reason: &str| CatalogImportError::InvalidRow {
            line,
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("id is blank"));
        }
        if self.brand.is_empty() || self.model.is_empty() {
            return Err(invalid("brand and model are required"));
        }
        if self.base_price == 0 {
            return Err(invalid("base_price must be positive"));
        }

        Ok(VehicleRecord {
            id: VehicleId(self.id),
            brand: self.brand,
            model: self.model,
            year: self.year,
            engine_cc: self.engine_cc,
            engine_power_hp: self.engine_power_hp,
            category: self.category.unwrap_or_else(|| "other".to_string()),
            base_price: self.base_price,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
