//! Reference institute and address tables
//!
//! Both tables are loaded once per run from CSV files in the GRID release
//! layout (`institutes.csv` with `grid_id,name`, `addresses.csv` with
//! `grid_id,...,country,...`) and are read-only afterwards.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

const ID_COLUMNS: &[&str] = &["grid_id", "registry_id", "id"];
const NAME_COLUMNS: &[&str] = &["name"];
const COUNTRY_COLUMNS: &[&str] = &["country"];

/// An institute in the reference registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstituteRecord {
    pub registry_id: String,
    pub name: String,
}

impl InstituteRecord {
    pub fn new(registry_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            registry_id: registry_id.into(),
            name: name.into(),
        }
    }
}

/// Location of an institute; joins to [`InstituteRecord`] by registry ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRecord {
    pub registry_id: String,
    pub country: String,
}

impl AddressRecord {
    pub fn new(registry_id: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            registry_id: registry_id.into(),
            country: country.into(),
        }
    }
}

/// Institutes located in `country`, in table order
///
/// Without a country the full institute table is returned.
pub fn filter_by_country<'a>(
    institutes: &'a [InstituteRecord],
    addresses: &[AddressRecord],
    country: Option<&str>,
) -> Vec<&'a InstituteRecord> {
    match country {
        None => institutes.iter().collect(),
        Some(country) => {
            let ids: HashSet<&str> = addresses
                .iter()
                .filter(|address| address.country == country)
                .map(|address| address.registry_id.as_str())
                .collect();
            institutes
                .iter()
                .filter(|institute| ids.contains(institute.registry_id.as_str()))
                .collect()
        }
    }
}

/// The loaded reference dataset
///
/// Keeps a country → registry ID index so the geographic filter does not
/// rescan the address table for every affiliation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    institutes: Vec<InstituteRecord>,
    addresses: Vec<AddressRecord>,
    ids_by_country: HashMap<String, HashSet<String>>,
}

impl ReferenceData {
    pub fn new(institutes: Vec<InstituteRecord>, addresses: Vec<AddressRecord>) -> Self {
        let mut ids_by_country: HashMap<String, HashSet<String>> = HashMap::new();
        for address in &addresses {
            ids_by_country
                .entry(address.country.clone())
                .or_default()
                .insert(address.registry_id.clone());
        }

        Self {
            institutes,
            addresses,
            ids_by_country,
        }
    }

    /// Load both tables from CSV files
    pub fn load(
        institutes_path: impl AsRef<Path>,
        addresses_path: impl AsRef<Path>,
    ) -> Result<Self, ReferenceError> {
        let institutes = load_institutes(institutes_path)?;
        let addresses = load_addresses(addresses_path)?;
        let data = Self::new(institutes, addresses);
        tracing::info!(
            "Loaded reference data: {} institutes, {} addresses in {} countries",
            data.institutes.len(),
            data.addresses.len(),
            data.ids_by_country.len()
        );
        Ok(data)
    }

    pub fn institutes(&self) -> &[InstituteRecord] {
        &self.institutes
    }

    pub fn addresses(&self) -> &[AddressRecord] {
        &self.addresses
    }

    /// Candidate institutes for an affiliation, narrowed to `country` if known
    ///
    /// Same result as [`filter_by_country`], served from the country index.
    pub fn candidates(&self, country: Option<&str>) -> Vec<&InstituteRecord> {
        match country {
            None => self.institutes.iter().collect(),
            Some(country) => match self.ids_by_country.get(country) {
                Some(ids) => self
                    .institutes
                    .iter()
                    .filter(|institute| ids.contains(&institute.registry_id))
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.institutes.is_empty()
    }
}

/// Load the institute table (`grid_id`, `name`)
pub fn load_institutes(path: impl AsRef<Path>) -> Result<Vec<InstituteRecord>, ReferenceError> {
    let path = path.as_ref();
    let reader = open_table(path)?;
    read_institutes(reader, &path.display().to_string())
}

/// Load the address table (`grid_id`, `country`)
pub fn load_addresses(path: impl AsRef<Path>) -> Result<Vec<AddressRecord>, ReferenceError> {
    let path = path.as_ref();
    let reader = open_table(path)?;
    read_addresses(reader, &path.display().to_string())
}

/// Parse an institute table from any CSV source
pub fn read_institutes<R: Read>(
    reader: R,
    table: &str,
) -> Result<Vec<InstituteRecord>, ReferenceError> {
    read_pairs(reader, table, NAME_COLUMNS, InstituteRecord::new)
}

/// Parse an address table from any CSV source
pub fn read_addresses<R: Read>(
    reader: R,
    table: &str,
) -> Result<Vec<AddressRecord>, ReferenceError> {
    read_pairs(reader, table, COUNTRY_COLUMNS, AddressRecord::new)
}

fn open_table(path: &Path) -> Result<BufReader<File>, ReferenceError> {
    if !path.exists() {
        return Err(ReferenceError::FileNotFound(path.display().to_string()));
    }
    Ok(BufReader::new(File::open(path)?))
}

fn read_pairs<R, T, F>(
    reader: R,
    table: &str,
    value_columns: &[&str],
    build: F,
) -> Result<Vec<T>, ReferenceError>
where
    R: Read,
    F: Fn(String, String) -> T,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let id_index = column_index(&headers, ID_COLUMNS).ok_or_else(|| {
        ReferenceError::MissingColumn {
            table: table.to_string(),
            column: ID_COLUMNS[0].to_string(),
        }
    })?;
    let value_index = column_index(&headers, value_columns).ok_or_else(|| {
        ReferenceError::MissingColumn {
            table: table.to_string(),
            column: value_columns[0].to_string(),
        }
    })?;

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let id = record.get(id_index).map(str::trim).unwrap_or_default();
        let value = record.get(value_index).map(str::trim).unwrap_or_default();
        if id.is_empty() {
            tracing::warn!("Skipping row {} of {}: empty registry ID", line + 2, table);
            continue;
        }
        rows.push(build(id.to_string(), value.to_string()));
    }

    Ok(rows)
}

fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name)))
}
