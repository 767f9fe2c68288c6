use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::module::ModuleRecord;

/// Read-only lookup from coordinate to every known version record.
///
/// Implementations must return records in a stable order; the resolver does
/// not depend on that order for selection but reports follow it.
pub trait Catalog {
    /// All records published for `coordinate`. Empty when the coordinate is unknown.
    fn versions(&self, coordinate: &str) -> &[ModuleRecord];
}

impl Catalog for BTreeMap<String, Vec<ModuleRecord>> {
    fn versions(&self, coordinate: &str) -> &[ModuleRecord] {
        self.get(coordinate).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// In-memory module catalog, loadable from a TOML file of `[[module]]` entries.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, Vec<ModuleRecord>>,
}

/// On-disk shape of a catalog file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    module: Vec<ModuleRecord>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ModuleRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Add a record; records for one coordinate keep insertion order.
    pub fn insert(&mut self, record: ModuleRecord) {
        self.modules
            .entry(record.coordinate.clone())
            .or_default()
            .push(record);
    }

    /// Load and parse a catalog file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = integra_util::fs::read_text(path, "catalog")?;
        let catalog = Self::parse_toml(&content)?;
        tracing::debug!(
            "loaded {} module versions for {} coordinates from {}",
            catalog.len(),
            catalog.modules.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| {
            integra_util::errors::IntegraError::Catalog {
                message: format!("Failed to parse catalog: {e}"),
            }
        })?;
        Ok(Self::from_records(file.module))
    }

    /// Serialize the catalog to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        let file = CatalogFile {
            module: self.records().cloned().collect(),
        };
        toml::to_string_pretty(&file)
    }

    /// Known coordinates in sorted order.
    pub fn coordinates(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Every record, grouped by coordinate.
    pub fn records(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values().flatten()
    }

    pub fn contains(&self, coordinate: &str) -> bool {
        self.modules.contains_key(coordinate)
    }

    /// Total number of module version records.
    pub fn len(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Catalog for ModuleCatalog {
    fn versions(&self, coordinate: &str) -> &[ModuleRecord] {
        self.modules.versions(coordinate)
    }
}
