use ndarray::{Array1, LinalgScalar};
use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Abstraction over a Euclidean vector that supports the in-place
/// operations required by the leapfrog integrator.
///
/// Positions and momenta are always cloned before they are updated, so implementors
/// only need `Clone` to give the integrator a private working copy.
pub trait EuclideanVector: Clone {
    type Scalar: Float + Copy;

    /// Returns the dimensionality of the vector.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a zero-initialized vector with the same shape.
    fn zeros_like(&self) -> Self;

    /// In-place fused multiply-add: `self += alpha * other`.
    fn add_scaled_assign(&mut self, other: &Self, alpha: Self::Scalar);

    /// Scales the vector in-place.
    fn scale_assign(&mut self, alpha: Self::Scalar);

    /// Dot product between two vectors.
    fn dot(&self, other: &Self) -> Self::Scalar;

    /// True when no component is NaN or infinite.
    fn is_finite(&self) -> bool;

    /// Fills the vector with samples from N(0, 1) in-place.
    fn fill_standard_normal<R: Rng>(&mut self, rng: &mut R)
    where
        StandardNormal: Distribution<Self::Scalar>;

    /// Copies the components into a fresh `Vec`.
    fn to_vec(&self) -> Vec<Self::Scalar>;
}

impl<T> EuclideanVector for Array1<T>
where
    T: Float + LinalgScalar,
{
    type Scalar = T;

    fn len(&self) -> usize {
        self.len()
    }

    fn zeros_like(&self) -> Self {
        Array1::zeros(self.len())
    }

    fn add_scaled_assign(&mut self, other: &Self, alpha: T) {
        ndarray::Zip::from(self).and(other).for_each(|a, &b| {
            *a = *a + b * alpha;
        });
    }

    fn scale_assign(&mut self, alpha: T) {
        self.mapv_inplace(|x| x * alpha);
    }

    fn dot(&self, other: &Self) -> T {
        self.dot(other)
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }

    fn fill_standard_normal<R: Rng>(&mut self, rng: &mut R)
    where
        StandardNormal: Distribution<T>,
    {
        self.iter_mut().for_each(|x| *x = rng.sample(StandardNormal));
    }

    fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }
}

impl<T: Float> EuclideanVector for Vec<T> {
    type Scalar = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn zeros_like(&self) -> Self {
        vec![T::zero(); <[T]>::len(self)]
    }

    fn add_scaled_assign(&mut self, other: &Self, alpha: T) {
        assert_eq!(
            <[T]>::len(self),
            <[T]>::len(other),
            "add_scaled_assign called with mismatched lengths"
        );
        self.iter_mut()
            .zip(other.iter())
            .for_each(|(a, &b)| *a = *a + b * alpha);
    }

    fn scale_assign(&mut self, alpha: T) {
        self.iter_mut().for_each(|x| *x = *x * alpha);
    }

    fn dot(&self, other: &Self) -> T {
        self.iter()
            .zip(other.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }

    fn fill_standard_normal<R: Rng>(&mut self, rng: &mut R)
    where
        StandardNormal: Distribution<T>,
    {
        self.iter_mut().for_each(|x| *x = rng.sample(StandardNormal));
    }

    fn to_vec(&self) -> Vec<T> {
        self.clone()
    }
}
