// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Whitespace-separated record formats.
//!
//! The training matrix has one user per line and one integer per item,
//! with 0 for an unknown rating. Query and prediction streams have one
//! `user item rating` triple per line, with 1-based ids; a query rating of
//! 0 requests a prediction.
use std::io::{BufRead, Write};

use log::*;
use thiserror::Error;

use crate::data::{Prediction, Query, RatingMatrix};
use crate::knn::weighting::RatingScale;
use crate::types::Rating;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("line {line}: found {found} fields, expected {expected}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: rating {value} is outside the rating scale")]
    RatingOutOfScale { line: usize, value: i64 },
    #[error("line {line}: ids are 1-based, found 0")]
    ZeroId { line: usize },
    #[error("no records found")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_field(line: usize, field: &str) -> Result<i64, RecordError> {
    field.parse().map_err(|e| RecordError::Malformed {
        line,
        reason: format!("invalid integer '{}': {}", field, e),
    })
}

fn check_rating(line: usize, value: i64, scale: &RatingScale) -> Result<Option<u8>, RecordError> {
    if value == 0 {
        return Ok(None);
    }
    match u8::try_from(value) {
        Ok(v) if scale.contains(v) => Ok(Some(v)),
        _ => Err(RecordError::RatingOutOfScale { line, value }),
    }
}

/// Read a training matrix.
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn read_matrix<R: BufRead>(reader: R, scale: &RatingScale) -> Result<RatingMatrix, RecordError> {
    let mut rows: Vec<Vec<Rating>> = Vec::new();
    let mut width = None;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let expected = *width.get_or_insert(fields.len());
        if fields.len() != expected {
            return Err(RecordError::FieldCount {
                line: line_no,
                expected,
                found: fields.len(),
            });
        }

        let row = fields
            .iter()
            .map(|f| {
                let v = parse_field(line_no, f)?;
                Ok(check_rating(line_no, v, scale)?.map(f64::from))
            })
            .collect::<Result<Vec<_>, RecordError>>()?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(RecordError::Empty);
    }

    let matrix = RatingMatrix::from_rows(rows).map_err(|e| RecordError::Malformed {
        line: 0,
        reason: e.to_string(),
    })?;
    debug!(
        "read {} users x {} items with {} ratings",
        matrix.n_users(),
        matrix.n_items(),
        matrix.nnz()
    );
    Ok(matrix)
}

/// Convert a 1-based `(user, item, rating)` triple into a query.
///
/// `line` is reported in errors; callers without line numbers pass the
/// triple's position in their input.
pub fn query_from_triple(
    line: usize,
    user: i64,
    item: i64,
    rating: i64,
    scale: &RatingScale,
) -> Result<Query, RecordError> {
    let user = to_index(line, user)?;
    let item = to_index(line, item)?;
    let rating = check_rating(line, rating, scale)?;
    Ok(Query { user, item, rating })
}

fn to_index(line: usize, id: i64) -> Result<usize, RecordError> {
    match id {
        0 => Err(RecordError::ZeroId { line }),
        id if id < 0 => Err(RecordError::Malformed {
            line,
            reason: format!("negative id {}", id),
        }),
        id => Ok(id as usize - 1),
    }
}

/// Read a query stream.
pub fn read_queries<R: BufRead>(reader: R, scale: &RatingScale) -> Result<Vec<Query>, RecordError> {
    let mut queries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [user, item, rating] => {
                let user = parse_field(line_no, user)?;
                let item = parse_field(line_no, item)?;
                let rating = parse_field(line_no, rating)?;
                queries.push(query_from_triple(line_no, user, item, rating, scale)?);
            }
            other => {
                return Err(RecordError::FieldCount {
                    line: line_no,
                    expected: 3,
                    found: other.len(),
                })
            }
        }
    }
    let n_requests = queries.iter().filter(|q| q.rating.is_none()).count();
    debug!("read {} queries, {} to predict", queries.len(), n_requests);
    Ok(queries)
}

/// Write predictions with 1-based ids, one per line.
pub fn write_predictions<W: Write>(mut writer: W, predictions: &[Prediction]) -> Result<(), RecordError> {
    for p in predictions {
        writeln!(writer, "{} {} {}", p.user + 1, p.item + 1, p.rating)?;
    }
    writer.flush()?;
    Ok(())
}
