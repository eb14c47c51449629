/// Linear-algebra helpers over plain `f32` slices. The trait exists so the
/// methods can hang off `[f32]` directly.
///
/// # Contract
///
/// - Operations involving two vectors (dot product, L2) require that they have the same length.
pub trait VectorLike {
    fn dot(&self, othr: &Self) -> f32;
    fn l2_squared(&self, othr: &Self) -> f32;
    fn norm(&self) -> f32;
}

impl VectorLike for [f32] {
    /// # Panics
    ///
    /// Panics if the two vectors have different lengths
    #[inline]
    fn dot(&self, othr: &[f32]) -> f32 {
        assert_eq!(self.len(), othr.len());
        self.iter().zip(othr).map(|(a, b)| a * b).sum()
    }

    /// Computes the **SQUARED** L2 distance between two vectors:
    ///
    /// ```text
    /// L2^2(x, y) = Σ_i (x[i] - y[i]) ** 2
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the two vectors have different lengths
    #[inline]
    fn l2_squared(&self, othr: &[f32]) -> f32 {
        assert_eq!(self.len(), othr.len());
        self.iter()
            .zip(othr)
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum()
    }

    /// Standard euclidean norm, `sqrt(Σ_i x[i] ** 2)`. Zero for an empty slice.
    #[inline]
    fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_norm_basic() {
        let v = [3.0f32, 4.0];
        assert!(approx_eq(v.norm(), 5.0, EPS));
    }

    #[test]
    fn test_norm_empty_and_zero() {
        let empty: [f32; 0] = [];
        assert_eq!(empty.norm(), 0.0);
        assert_eq!([0.0f32; 8].norm(), 0.0);
    }

    #[test]
    fn test_norm_sign_invariant() {
        let v = [1.0f32, -2.0, 2.0];
        let w = [-1.0f32, 2.0, -2.0];
        assert!(approx_eq(v.norm(), 3.0, EPS));
        assert!(approx_eq(v.norm(), w.norm(), EPS));
    }

    #[test]
    fn test_dot_and_l2() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [4.0f32, 5.0, 6.0];
        assert!(approx_eq(a.dot(&b), 32.0, EPS));
        assert!(approx_eq(a.l2_squared(&b), 27.0, EPS));
        assert_eq!(a.l2_squared(&a), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_dot_length_mismatch() {
        let a = [1.0f32, 2.0];
        let b = [1.0f32];
        let _ = a.dot(&b);
    }
}
