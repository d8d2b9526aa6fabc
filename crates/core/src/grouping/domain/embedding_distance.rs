use crate::grouping::domain::grouping_error::GroupingError;

/// Euclidean distance between two embeddings.
///
/// Both operands must have the same length and contain only finite values.
/// The non-finite check reports `index: 0`; callers that know which descriptor
/// was at fault validate up front with [`check_finite`].
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64, GroupingError> {
    if a.len() != b.len() {
        return Err(GroupingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    check_finite(a, 0)?;
    check_finite(b, 0)?;

    let sum_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum();
    Ok(sum_sq.sqrt())
}

/// Fails with [`GroupingError::NonFiniteEmbedding`] on the first NaN or infinity.
pub fn check_finite(embedding: &[f64], index: usize) -> Result<(), GroupingError> {
    match embedding.iter().position(|v| !v.is_finite()) {
        Some(position) => Err(GroupingError::NonFiniteEmbedding { index, position }),
        None => Ok(()),
    }
}
