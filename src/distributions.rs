/*!
Target densities with known closed forms.

Each target implements [`NegLogProb`] so it can be differentiated by [`BurnGradient`], and
also implements [`GradientOracle`] / [`Potential`] directly with a hand-coded gradient. The
two routes are interchangeable, which makes these targets handy for checking a gradient
backend against the exact answer.

# Examples

```rust
use burn::backend::{Autodiff, NdArray};
use leapfrog_hmc::distributions::Rosenbrock;
use leapfrog_hmc::oracle::{BurnGradient, GradientOracle};
use ndarray::array;

let target = Rosenbrock::new(1.0_f32, 100.0);
let exact = target.gradient(&array![0.5_f32, 0.5]).unwrap();

let autodiff = BurnGradient::<f32, Autodiff<NdArray>, _>::new(target);
let grad = autodiff.gradient(&array![0.5_f32, 0.5]).unwrap();
assert!((&grad - &exact).iter().all(|d| d.abs() < 1e-3));
```
*/

use crate::error::{HmcError, Result};
use crate::oracle::{
    check_dim, check_gradient, check_potential, GradientOracle, NegLogProb, Potential,
};
use burn::prelude::*;
use burn::tensor::Element;
use ndarray::{Array1, LinalgScalar, Zip};
use num_traits::Float;

/// The standard normal distribution in `dim` dimensions, i.e. the harmonic oscillator
/// `V(q) = ½ qᵀq` with gradient `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardGaussian {
    pub dim: usize,
}

impl StandardGaussian {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl<B: Backend> NegLogProb<B> for StandardGaussian {
    fn neg_log_prob(&self, position: Tensor<B, 1>) -> Tensor<B, 1> {
        position.powi_scalar(2).sum().mul_scalar(0.5)
    }

    fn dim(&self) -> Option<usize> {
        Some(self.dim)
    }
}

impl<T: Float + LinalgScalar> GradientOracle<Array1<T>> for StandardGaussian {
    fn gradient(&self, position: &Array1<T>) -> Result<Array1<T>> {
        check_dim(Some(self.dim), position)?;
        check_gradient(position, position.clone())
    }

    fn dim(&self) -> Option<usize> {
        Some(self.dim)
    }
}

impl<T: Float + LinalgScalar> Potential<Array1<T>> for StandardGaussian {
    fn potential(&self, position: &Array1<T>) -> Result<T> {
        check_dim(Some(self.dim), position)?;
        let half = T::one() / (T::one() + T::one());
        check_potential(position, position.dot(position) * half)
    }
}

/// A Gaussian with independent components,
/// `V(q) = ½ Σ_k (q_k − μ_k)² / σ_k²`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalGaussian<T> {
    pub mean: Array1<T>,
    precision: Array1<T>,
}

impl<T: Float + LinalgScalar> DiagonalGaussian<T> {
    /// Creates the distribution from per-component means and standard deviations.
    pub fn new(mean: Array1<T>, std: Array1<T>) -> Result<Self> {
        if mean.len() != std.len() {
            return Err(HmcError::Configuration(format!(
                "mean has length {} but std has length {}",
                mean.len(),
                std.len()
            )));
        }
        if mean.is_empty() {
            return Err(HmcError::Configuration("empty Gaussian".to_string()));
        }
        if !std.iter().all(|s| s.is_finite() && *s > T::zero()) {
            return Err(HmcError::Configuration(
                "standard deviations must be finite and > 0".to_string(),
            ));
        }
        let precision = std.mapv(|s| T::one() / (s * s));
        Ok(Self { mean, precision })
    }

    pub fn std(&self) -> Array1<T> {
        self.precision.mapv(|p| T::one() / p.sqrt())
    }
}

impl<T, B> NegLogProb<B> for DiagonalGaussian<T>
where
    T: Float + Element,
    B: Backend,
{
    fn neg_log_prob(&self, position: Tensor<B, 1>) -> Tensor<B, 1> {
        let device = position.device();
        let dim = self.mean.len();
        let mean = Tensor::<B, 1>::from_data(
            TensorData::new(self.mean.iter().copied().collect::<Vec<T>>(), [dim]),
            &device,
        );
        let precision = Tensor::<B, 1>::from_data(
            TensorData::new(self.precision.iter().copied().collect::<Vec<T>>(), [dim]),
            &device,
        );
        position
            .sub(mean)
            .powi_scalar(2)
            .mul(precision)
            .sum()
            .mul_scalar(0.5)
    }

    fn dim(&self) -> Option<usize> {
        Some(self.mean.len())
    }
}

impl<T: Float + LinalgScalar> GradientOracle<Array1<T>> for DiagonalGaussian<T> {
    fn gradient(&self, position: &Array1<T>) -> Result<Array1<T>> {
        check_dim(Some(self.mean.len()), position)?;
        let mut grad = Array1::<T>::zeros(position.len());
        Zip::from(&mut grad)
            .and(position)
            .and(&self.mean)
            .and(&self.precision)
            .for_each(|g, &q, &m, &prec| *g = prec * (q - m));
        check_gradient(position, grad)
    }

    fn dim(&self) -> Option<usize> {
        Some(self.mean.len())
    }
}

impl<T: Float + LinalgScalar> Potential<Array1<T>> for DiagonalGaussian<T> {
    fn potential(&self, position: &Array1<T>) -> Result<T> {
        check_dim(Some(self.mean.len()), position)?;
        let half = T::one() / (T::one() + T::one());
        let mut sum = T::zero();
        Zip::from(position)
            .and(&self.mean)
            .and(&self.precision)
            .for_each(|&q, &m, &prec| sum = sum + prec * (q - m) * (q - m));
        check_potential(position, sum * half)
    }
}

/// The two-dimensional Rosenbrock density,
/// `V(x, y) = (a − x)² + b (y − x²)²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rosenbrock<T> {
    pub a: T,
    pub b: T,
}

impl<T> Rosenbrock<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }
}

impl<T, B> NegLogProb<B> for Rosenbrock<T>
where
    T: Float + Element,
    B: Backend,
{
    fn neg_log_prob(&self, position: Tensor<B, 1>) -> Tensor<B, 1> {
        let x = position.clone().slice([0..1]);
        let y = position.slice([1..2]);

        let term_1 = x.clone().neg().add_scalar(self.a).powi_scalar(2);
        let term_2 = y.sub(x.powi_scalar(2)).powi_scalar(2).mul_scalar(self.b);
        term_1 + term_2
    }

    fn dim(&self) -> Option<usize> {
        Some(2)
    }
}

impl<T: Float + LinalgScalar> GradientOracle<Array1<T>> for Rosenbrock<T> {
    fn gradient(&self, position: &Array1<T>) -> Result<Array1<T>> {
        check_dim(Some(2), position)?;
        let (x, y) = (position[0], position[1]);
        let two = T::one() + T::one();
        let r = y - x * x;
        let grad = Array1::from(vec![
            -two * (self.a - x) - two * two * self.b * x * r,
            two * self.b * r,
        ]);
        check_gradient(position, grad)
    }

    fn dim(&self) -> Option<usize> {
        Some(2)
    }
}

impl<T: Float + LinalgScalar> Potential<Array1<T>> for Rosenbrock<T> {
    fn potential(&self, position: &Array1<T>) -> Result<T> {
        check_dim(Some(2), position)?;
        let (x, y) = (position[0], position[1]);
        check_potential(position, (self.a - x).powi(2) + self.b * (y - x * x).powi(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::BurnGradient;
    use approx::assert_abs_diff_eq;
    use burn::backend::{Autodiff, NdArray};
    use ndarray::array;

    type BackendType = Autodiff<NdArray>;

    #[test]
    fn test_standard_gaussian() {
        let target = StandardGaussian::new(3);
        let q = array![1.0_f32, -2.0, 0.5];
        assert_eq!(target.gradient(&q).unwrap(), q);
        assert_abs_diff_eq!(target.potential(&q).unwrap(), 2.625);

        let autodiff = BurnGradient::<f32, BackendType, _>::new(target);
        assert_abs_diff_eq!(autodiff.gradient(&q).unwrap(), q, epsilon = 1e-6);
        assert_abs_diff_eq!(autodiff.potential(&q).unwrap(), 2.625, epsilon = 1e-6);
    }

    #[test]
    fn test_diagonal_gaussian() {
        let target = DiagonalGaussian::new(array![1.0_f32, -1.0], array![2.0, 0.5]).unwrap();
        let q = array![3.0_f32, 0.0];
        // precisions are 0.25 and 4.
        let expected = array![0.5_f32, 4.0];
        assert_abs_diff_eq!(target.gradient(&q).unwrap(), expected, epsilon = 1e-6);
        assert_abs_diff_eq!(target.potential(&q).unwrap(), 0.5 * (1.0 + 4.0), epsilon = 1e-6);
        assert_abs_diff_eq!(target.std(), array![2.0, 0.5], epsilon = 1e-6);

        let autodiff = BurnGradient::<f32, BackendType, _>::new(target);
        assert_abs_diff_eq!(autodiff.gradient(&q).unwrap(), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_diagonal_gaussian_rejects_bad_std() {
        assert!(DiagonalGaussian::new(array![0.0_f64], array![0.0]).is_err());
        assert!(DiagonalGaussian::new(array![0.0_f64], array![-1.0]).is_err());
        assert!(DiagonalGaussian::new(array![0.0_f64, 1.0], array![1.0]).is_err());
        assert!(DiagonalGaussian::<f64>::new(array![], array![]).is_err());
    }

    #[test]
    fn test_rosenbrock_gradients_agree() {
        let target = Rosenbrock::new(1.0_f32, 100.0);
        let autodiff = BurnGradient::<f32, BackendType, _>::new(target);
        for q in [array![0.0_f32, 0.0], array![1.0, 1.0], array![-0.7, 0.3], array![0.2, 1.5]] {
            let exact = target.gradient(&q).unwrap();
            let grad = autodiff.gradient(&q).unwrap();
            assert_abs_diff_eq!(grad, exact, epsilon = 1e-2);
            assert_abs_diff_eq!(
                autodiff.potential(&q).unwrap(),
                target.potential(&q).unwrap(),
                epsilon = 1e-3
            );
        }
        // The minimum sits at (a, a²).
        assert_abs_diff_eq!(target.gradient(&array![1.0, 1.0]).unwrap(), array![0.0, 0.0]);
    }

    #[test]
    fn test_wrong_dimension() {
        let target = Rosenbrock::new(1.0_f64, 100.0);
        assert!(target
            .gradient(&array![1.0, 2.0, 3.0])
            .unwrap_err()
            .is_dimension_mismatch());
        let autodiff = BurnGradient::<f32, BackendType, _>::new(StandardGaussian::new(2));
        assert!(autodiff
            .gradient(&array![1.0_f32])
            .unwrap_err()
            .is_dimension_mismatch());
    }
}
