//! L2 normalization of embedding vectors.

use crate::error::{PipelineError, PipelineResult};

/// Scale a vector to unit L2 norm. A zero vector has no direction, so it is
/// returned unchanged rather than divided by zero.
pub fn l2_normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

/// Normalize each vector in a batch independently.
///
/// The batch must be rectangular; a provider returning mixed dimensions is
/// a server-side fault.
pub fn l2_normalize_batch(vectors: &[Vec<f32>]) -> PipelineResult<Vec<Vec<f32>>> {
    if let Some(first) = vectors.first() {
        let dimension = first.len();
        if vectors.iter().any(|v| v.len() != dimension) {
            return Err(PipelineError::Internal(
                "Embedding batch has rows of mixed dimensions".to_string(),
            ));
        }
    }
    Ok(vectors.iter().map(|v| l2_normalize(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(vector: &[f32]) -> f32 {
        vector.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    #[test]
    fn produces_unit_norm() {
        let normalized = l2_normalize(&[3.0, 4.0]);
        assert!((norm(&normalized) - 1.0).abs() < 1e-6);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_passes_through() {
        let normalized = l2_normalize(&[0.0, 0.0, 0.0]);
        assert_eq!(normalized, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn batch_normalizes_rows_independently() {
        let normalized = l2_normalize_batch(&[vec![2.0, 0.0], vec![0.0, 0.0]]).unwrap();
        assert_eq!(normalized[0], vec![1.0, 0.0]);
        assert_eq!(normalized[1], vec![0.0, 0.0]);
    }

    #[test]
    fn ragged_batch_is_rejected() {
        let err = l2_normalize_batch(&[vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, PipelineError::Internal(_)));
    }

    #[test]
    fn preserves_direction() {
        let normalized = l2_normalize(&[-1.0, 2.0, -2.0]);
        assert!(normalized[0] < 0.0 && normalized[1] > 0.0 && normalized[2] < 0.0);
        assert!((norm(&normalized) - 1.0).abs() < 1e-6);
    }
}
