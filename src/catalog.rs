//! Convolution catalog loading.
//!
//! A catalog is a comma-separated table: the first token is a header naming
//! the fields, every following token is one convolution configuration. The
//! first column is a row label; all other columns are unsigned integers keyed
//! by the header name. Rows are whitespace-separated tokens, so blank lines
//! and surrounding whitespace are ignored.

use crate::errors::{CatalogError, CatalogResult};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// One catalog row: a complete convolution configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvSpec {
    label: String,
    values: HashMap<String, u64>,
}

impl ConvSpec {
    /// Row label taken from the first catalog column.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Value of `field`, failing when the catalog did not declare it.
    pub fn get(&self, field: &str) -> CatalogResult<u64> {
        self.values
            .get(field)
            .copied()
            .ok_or_else(|| CatalogError::MissingField {
                label: self.label.clone(),
                field: field.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered collection of convolution specs loaded from a catalog source.
#[derive(Debug, Clone, Default)]
pub struct ConvCatalog {
    fields: Vec<String>,
    specs: Vec<ConvSpec>,
}

impl ConvCatalog {
    /// Loads a catalog file.
    pub fn load<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog = Self::parse(&content)?;
        info!(
            "Loaded {} convolution specs from '{}'",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Loads a catalog from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> CatalogResult<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| CatalogError::Io {
                path: "<reader>".to_string(),
                source: e,
            })?;
        Self::parse(&content)
    }

    /// Parses catalog text.
    pub fn parse(content: &str) -> CatalogResult<Self> {
        let mut tokens = content.split_whitespace();
        let header: Vec<&str> = tokens
            .next()
            .ok_or(CatalogError::MissingHeader)?
            .split(',')
            .collect();

        let mut specs = Vec::new();
        for (index, line) in tokens.enumerate() {
            let row = index + 1;
            let columns: Vec<&str> = line.split(',').collect();
            if columns.len() != header.len() {
                return Err(CatalogError::ColumnCountMismatch {
                    row,
                    expected: header.len(),
                    found: columns.len(),
                    line: line.to_string(),
                });
            }

            let mut values = HashMap::with_capacity(header.len() - 1);
            for (field, raw) in header.iter().zip(columns.iter()).skip(1) {
                let value = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| CatalogError::InvalidValue {
                        row,
                        field: field.to_string(),
                        value: raw.to_string(),
                        source: e,
                    })?;
                values.insert(field.to_string(), value);
            }

            debug!("catalog row {}: '{}' with {} fields", row, columns[0], values.len());
            specs.push(ConvSpec {
                label: columns[0].to_string(),
                values,
            });
        }

        Ok(Self {
            fields: header.iter().skip(1).map(|f| f.to_string()).collect(),
            specs,
        })
    }

    /// Field names declared by the header, excluding the label column.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn specs(&self) -> &[ConvSpec] {
        &self.specs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConvSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Writes every spec as `field: value` pairs, one spec per line, in header order.
    pub fn describe<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for spec in &self.specs {
            write!(out, "{}  ", spec.label)?;
            for field in &self.fields {
                if let Some(value) = spec.values.get(field) {
                    write!(out, "{}: {}  ", field, value)?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ConvCatalog {
    type Item = &'a ConvSpec;
    type IntoIter = std::slice::Iter<'a, ConvSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}
