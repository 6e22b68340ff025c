use crate::error::{Result, VectorStoreError};
use ndarray::Array2;
use pattern_protocol::Embedding;

/// Check an embedding against the expected dimensionality.
///
/// Mismatched vectors are rejected outright; they are never padded or
/// truncated.
pub fn validate_embedding(embedding: &Embedding, expected: usize) -> Result<()> {
    let values = embedding.as_slice();
    if values.is_empty() {
        return Err(VectorStoreError::EmptyEmbedding);
    }
    if values.len() != expected {
        return Err(VectorStoreError::InvalidDimension {
            expected,
            actual: values.len(),
        });
    }
    if let Some(position) = values.iter().position(|v| !v.is_finite()) {
        return Err(VectorStoreError::NonFinite { position });
    }
    Ok(())
}

/// Stack vectors into a matrix with L2-normalized rows.
///
/// Zero rows keep a norm of 1 and therefore stay zero.
pub(crate) fn normalized_matrix(rows: &[&[f32]], dimension: usize) -> Result<Array2<f32>> {
    let mut flat = Vec::with_capacity(rows.len() * dimension);
    for row in rows {
        if row.len() != dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: dimension,
                actual: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }

    let mut matrix = Array2::from_shape_vec((rows.len(), dimension), flat)?;
    for mut row in matrix.rows_mut() {
        let norm = row.dot(&row).sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        row.mapv_inplace(|v| v / norm);
    }
    Ok(matrix)
}
