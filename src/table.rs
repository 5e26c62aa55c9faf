//! Ordered feature tables and their CSV form.

use std::io;
use std::path::Path;

use tracing::warn;

use crate::error::{FeatureError, Result};
use crate::features::{FeatureVector, FEATURE_COLUMNS};

/// Header plus one row per successfully extracted segment, in segment order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
    skipped: Vec<usize>,
}

impl FeatureTable {
    pub fn columns(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// Indices of segments whose extraction failed.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(FEATURE_COLUMNS)?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(FEATURE_COLUMNS.len());
            record.push(row.time.to_string());
            record.extend(row.entries().into_iter().skip(1).map(|(_, v)| format_value(v)));
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_to(io::BufWriter::new(file))
    }
}

/// Shortest round-trip form; scientific notation for very small or very large
/// magnitudes so they do not expand into long runs of zeros.
fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && magnitude.is_finite() && !(1e-4..1e16).contains(&magnitude) {
        format!("{:e}", value)
    } else {
        value.to_string()
    }
}

/// Orders per-segment results and checks them against the column schema.
pub struct TableAssembler;

impl TableAssembler {
    /// Build a table from `(segment index, result)` pairs in any order.
    ///
    /// Failed segments are left out and recorded as skipped. A schema
    /// violation, or any fatal error reported by a segment, fails the whole
    /// table.
    pub fn assemble(mut results: Vec<(usize, Result<FeatureVector>)>) -> Result<FeatureTable> {
        results.sort_by_key(|(index, _)| *index);

        let mut table = FeatureTable::default();
        for (index, result) in results {
            match result {
                Ok(vector) => {
                    check_schema(index, &vector)?;
                    table.rows.push(vector);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(segment = index, "dropping segment: {}", err);
                    table.skipped.push(index);
                }
            }
        }
        Ok(table)
    }
}

fn check_schema(segment: usize, vector: &FeatureVector) -> Result<()> {
    let entries = vector.entries();
    if entries.len() != FEATURE_COLUMNS.len() {
        let position = entries.len().min(FEATURE_COLUMNS.len());
        return Err(FeatureError::SchemaMismatch {
            segment,
            position,
            expected: FEATURE_COLUMNS.get(position).unwrap_or(&"<end>").to_string(),
            found: entries
                .get(position)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| "<end>".to_string()),
        });
    }
    for (position, ((name, _), expected)) in entries.iter().zip(FEATURE_COLUMNS).enumerate() {
        if name != expected {
            return Err(FeatureError::SchemaMismatch {
                segment,
                position,
                expected: expected.to_string(),
                found: name.clone(),
            });
        }
    }
    if vector.time != segment {
        return Err(FeatureError::SchemaMismatch {
            segment,
            position: 0,
            expected: format!("Time = {}", segment),
            found: format!("Time = {}", vector.time),
        });
    }
    Ok(())
}
