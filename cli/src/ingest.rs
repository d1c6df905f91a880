//! Row parsing and categorical/binary token interning (spec.md §6),
//! grounded in `point_from_line` in `examples/original_source/main.cpp`.

use std::collections::HashMap;

use dynatree_core::{FeatureKind, Point};
use thiserror::Error;

use crate::schema::Schema;

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("row has too many fields (expected {expected} features plus a label)")]
    TooManyFields { expected: usize },
    #[error("row has too few fields (expected {expected} features plus a label)")]
    TooFewFields { expected: usize },
    #[error("could not parse \"{0}\" as a real-valued feature")]
    InvalidReal(String),
    #[error("feature column {column} is declared binary but a third distinct value \"{value}\" was found")]
    TooManyBinaryValues { column: usize, value: String },
}

/// Interns categorical/binary string tokens to `f32` ids, one table per
/// feature column, in first-seen order — the Rust analogue of
/// `class_txt_to_index`/`next_classification_id` in `main.cpp`.
#[derive(Debug, Clone)]
pub struct Interner {
    tables: Vec<HashMap<String, f32>>,
}

impl Interner {
    pub fn new(dimension: usize) -> Self {
        Interner { tables: vec![HashMap::new(); dimension] }
    }

    fn intern(&mut self, column: usize, kind: FeatureKind, token: &str) -> Result<f32, IngestError> {
        let table = &mut self.tables[column];
        if let Some(&id) = table.get(token) {
            return Ok(id);
        }
        let id = table.len() as f32;
        if kind == FeatureKind::Binary && id > 1.0 {
            return Err(IngestError::TooManyBinaryValues { column, value: token.to_string() });
        }
        table.insert(token.to_string(), id);
        Ok(id)
    }
}

/// Parses one data row into a [`Point`], interning categorical/binary
/// tokens through `interner`. The label column is compared literally
/// against `true_value`.
pub fn point_from_row(
    row: &str,
    delimiter: char,
    schema: &Schema,
    true_value: &str,
    interner: &mut Interner,
) -> Result<Point, IngestError> {
    let dimension = schema.dimension();
    let mut features = vec![0.0f32; dimension];
    let mut label = false;

    let mut column = 0usize;
    for token in row.split(delimiter) {
        if column > dimension {
            return Err(IngestError::TooManyFields { expected: dimension });
        }
        if column == schema.label_position {
            label = token == true_value;
        } else {
            let feature_index = column - usize::from(schema.label_position < column);
            let kind = schema.feature_kinds[feature_index];
            let value = match kind {
                FeatureKind::Real => token
                    .parse::<f32>()
                    .map_err(|_| IngestError::InvalidReal(token.to_string()))?,
                FeatureKind::Binary | FeatureKind::Categorical => interner.intern(feature_index, kind, token)?,
            };
            features[feature_index] = value;
        }
        column += 1;
    }

    if column < dimension + 1 {
        return Err(IngestError::TooFewFields { expected: dimension });
    }

    Ok(Point::new(features, label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema { label_position: 1, feature_kinds: vec![FeatureKind::Real, FeatureKind::Binary] }
    }

    #[test]
    fn parses_real_and_interns_binary() {
        let mut interner = Interner::new(2);
        let a = point_from_row("1.5;1;yes", ';', &schema(), "1", &mut interner).unwrap();
        assert_eq!(a.feature(0), 1.5);
        assert_eq!(a.feature(1), 0.0);
        assert!(a.label());

        let b = point_from_row("2.5;0;no", ';', &schema(), "1", &mut interner).unwrap();
        assert_eq!(b.feature(1), 1.0);
        assert!(!b.label());
    }

    #[test]
    fn third_binary_value_is_rejected() {
        let mut interner = Interner::new(2);
        point_from_row("1.0;1;a", ';', &schema(), "1", &mut interner).unwrap();
        point_from_row("1.0;1;b", ';', &schema(), "1", &mut interner).unwrap();
        let err = point_from_row("1.0;1;c", ';', &schema(), "1", &mut interner).unwrap_err();
        assert_eq!(err, IngestError::TooManyBinaryValues { column: 1, value: "c".to_string() });
    }

    #[test]
    fn rejects_too_few_fields() {
        let mut interner = Interner::new(2);
        let err = point_from_row("1.0;1", ';', &schema(), "1", &mut interner).unwrap_err();
        assert_eq!(err, IngestError::TooFewFields { expected: 2 });
    }

    #[test]
    fn non_numeric_real_field_is_rejected() {
        let mut interner = Interner::new(2);
        let err = point_from_row("abc;1;x", ';', &schema(), "1", &mut interner).unwrap_err();
        assert_eq!(err, IngestError::InvalidReal("abc".to_string()));
    }
}
