//! Range sample validation
//!
//! Snapshot rows arrive with every column nullable. Rows missing the sample
//! id, either endpoint, or the distance are dropped before aggregation; a NaN
//! distance counts as missing.

use thiserror::Error;

use crate::core::{RangeSample, RangeSampleRow};

/// Column that made a row unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingField {
    #[error("id")]
    Id,
    #[error("source_id")]
    SourceId,
    #[error("dest_id")]
    DestId,
    #[error("distance_cm")]
    Distance,
}

/// Result of validating a batch of sample rows
#[derive(Debug, Clone, Default)]
pub struct SampleValidation {
    pub valid_samples: Vec<RangeSample>,
    pub rejected_rows: Vec<(RangeSampleRow, MissingField)>,
}

impl SampleValidation {
    pub fn rejected_count(&self) -> usize {
        self.rejected_rows.len()
    }
}

/// Converts raw snapshot rows into complete range samples
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleValidator;

impl SampleValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check a single row, reporting the first missing column
    pub fn validate_row(&self, row: &RangeSampleRow) -> Result<RangeSample, MissingField> {
        let id = row.id.ok_or(MissingField::Id)?;
        let source_id = row.source_id.ok_or(MissingField::SourceId)?;
        let dest_id = row.dest_id.ok_or(MissingField::DestId)?;
        let distance_cm = row
            .distance_cm
            .filter(|d| !d.is_nan())
            .ok_or(MissingField::Distance)?;

        Ok(RangeSample {
            id,
            source_id,
            dest_id,
            distance_cm,
            rtt_ns: row.rtt_ns,
        })
    }

    pub fn validate_samples(&self, rows: Vec<RangeSampleRow>) -> SampleValidation {
        let mut result = SampleValidation::default();

        for row in rows {
            match self.validate_row(&row) {
                Ok(sample) => result.valid_samples.push(sample),
                Err(field) => result.rejected_rows.push((row, field)),
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_rows_pass() {
        let rows = vec![
            RangeSampleRow::new(1, 10, 1, 250.0).with_rtt(16.7),
            RangeSampleRow::new(2, 10, 2, 0.0),
        ];

        let result = SampleValidator::new().validate_samples(rows);
        assert_eq!(result.valid_samples.len(), 2);
        assert_eq!(result.rejected_count(), 0);
        assert_eq!(result.valid_samples[0].rtt_ns, Some(16.7));
        assert_eq!(result.valid_samples[1].distance_cm, 0.0);
    }

    #[test]
    fn test_rows_with_missing_columns_rejected() {
        let base = RangeSampleRow::new(1, 10, 1, 250.0);
        let rows = vec![
            RangeSampleRow { id: None, ..base.clone() },
            RangeSampleRow { source_id: None, ..base.clone() },
            RangeSampleRow { dest_id: None, ..base.clone() },
            RangeSampleRow { distance_cm: None, ..base.clone() },
            RangeSampleRow { distance_cm: Some(f64::NAN), ..base.clone() },
        ];

        let result = SampleValidator::new().validate_samples(rows);
        assert!(result.valid_samples.is_empty());

        let fields: Vec<MissingField> = result.rejected_rows.iter().map(|(_, f)| *f).collect();
        assert_eq!(
            fields,
            vec![
                MissingField::Id,
                MissingField::SourceId,
                MissingField::DestId,
                MissingField::Distance,
                MissingField::Distance,
            ]
        );
    }

    #[test]
    fn test_missing_field_names_column() {
        assert_eq!(MissingField::SourceId.to_string(), "source_id");
        assert_eq!(MissingField::Distance.to_string(), "distance_cm");
    }

    #[test]
    fn test_missing_rtt_is_not_a_rejection() {
        let row = RangeSampleRow::new(3, 11, 2, 120.0);
        assert!(SampleValidator::new().validate_row(&row).is_ok());
    }
}
