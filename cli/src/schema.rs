//! Header-line schema parsing (spec.md §6), grounded in `read_header` in
//! `examples/original_source/main.cpp`.

use dynatree_core::FeatureKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("label identifier 'l' found twice in the header")]
    DuplicateLabel,
    #[error("no label identifier 'l' found in the header")]
    MissingLabel,
    #[error("unknown column identifier \"{0}\" in header (expected one of l, n, b, c)")]
    UnknownToken(String),
    #[error("the header line is empty")]
    EmptyHeader,
}

/// The parsed column layout of a data file: which column holds the label,
/// and the kind of every other column, in file order.
#[derive(Debug, Clone)]
pub struct Schema {
    pub label_position: usize,
    pub feature_kinds: Vec<FeatureKind>,
}

impl Schema {
    pub fn dimension(&self) -> usize {
        self.feature_kinds.len()
    }

    /// Parses a single header line into a [`Schema`].
    ///
    /// `l`→label column, `n`→`Real`, `b`→`Binary`, `c`→`Categorical`.
    pub fn parse(header_line: &str, delimiter: char) -> Result<Schema, SchemaError> {
        let mut label_position = None;
        let mut feature_kinds = Vec::new();

        let mut column = 0usize;
        for token in header_line.split(delimiter) {
            match token {
                "l" => {
                    if label_position.is_some() {
                        return Err(SchemaError::DuplicateLabel);
                    }
                    label_position = Some(column);
                }
                "n" => feature_kinds.push(FeatureKind::Real),
                "c" => feature_kinds.push(FeatureKind::Categorical),
                "b" => feature_kinds.push(FeatureKind::Binary),
                other => return Err(SchemaError::UnknownToken(other.to_string())),
            }
            column += 1;
        }

        if column == 0 {
            return Err(SchemaError::EmptyHeader);
        }
        let label_position = label_position.ok_or(SchemaError::MissingLabel)?;
        Ok(Schema { label_position, feature_kinds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_and_feature_kinds_in_order() {
        let schema = Schema::parse("n;l;b;c", ';').unwrap();
        assert_eq!(schema.label_position, 1);
        assert_eq!(schema.feature_kinds, vec![FeatureKind::Real, FeatureKind::Binary, FeatureKind::Categorical]);
        assert_eq!(schema.dimension(), 3);
    }

    #[test]
    fn rejects_duplicate_label() {
        assert_eq!(Schema::parse("l;l;n", ';'), Err(SchemaError::DuplicateLabel));
    }

    #[test]
    fn rejects_missing_label() {
        assert_eq!(Schema::parse("n;b;c", ';'), Err(SchemaError::MissingLabel));
    }

    #[test]
    fn rejects_unknown_token() {
        assert_eq!(Schema::parse("n;x;l", ';'), Err(SchemaError::UnknownToken("x".to_string())));
    }
}
