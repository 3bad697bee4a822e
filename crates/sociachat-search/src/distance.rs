//! Distance functions for each [`DistanceSpace`].
//!
//! All functions return a dissimilarity: `0.0` for identical directions,
//! larger for less similar vectors. Vectors of different lengths are
//! infinitely far apart.

use sociachat_core::model::DistanceSpace;

/// Distance between two vectors in the given space.
#[must_use]
pub fn distance(space: DistanceSpace, a: &[f32], b: &[f32]) -> f32 {
    match space {
        DistanceSpace::L2 => squared_l2(a, b),
        DistanceSpace::Cosine => cosine_distance(a, b),
        DistanceSpace::Ip => inner_product_distance(a, b),
    }
}

/// Squared Euclidean distance.
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>() as f32
}

/// One minus cosine similarity. `1.0` when either vector has zero magnitude.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    let dot = dot(a, b);
    let mag_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 1.0;
    }

    (1.0 - dot / (mag_a * mag_b)) as f32
}

/// One minus the inner product.
#[must_use]
pub fn inner_product_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    (1.0 - dot(a, b)) as f32
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2() {
        assert!((squared_l2(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < 1e-6);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!(cosine_distance(&[1.0, 1.0], &[2.0, 2.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_inner_product() {
        assert!(inner_product_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((inner_product_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_length_mismatch_is_infinite() {
        assert_eq!(squared_l2(&[1.0], &[1.0, 2.0]), f32::INFINITY);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 2.0]), f32::INFINITY);
        assert_eq!(inner_product_distance(&[1.0], &[1.0, 2.0]), f32::INFINITY);
    }

    #[test]
    fn test_distance_dispatch() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((distance(DistanceSpace::L2, &a, &b) - 2.0).abs() < 1e-6);
        assert!((distance(DistanceSpace::Cosine, &a, &b) - 1.0).abs() < 1e-6);
        assert!((distance(DistanceSpace::Ip, &a, &b) - 1.0).abs() < 1e-6);
    }
}
