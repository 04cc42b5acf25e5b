//! Properties every leapfrog proposal must satisfy, checked against several targets and
//! gradient backends.
//!
//! 1. Reversibility: proposing again from the output returns exactly to the start.
//! 2. Free-particle drift on a flat density.
//! 3. The harmonic-oscillator trajectory through the burn autodiff oracle.
//! 4. A shared proposer gives the same answers from several threads.

use approx::assert_abs_diff_eq;
use burn::backend::{Autodiff, NdArray};
use leapfrog_hmc::distributions::{Rosenbrock, StandardGaussian};
use leapfrog_hmc::energy::sample_momentum;
use leapfrog_hmc::leapfrog::{LeapfrogProposer, Proposer};
use leapfrog_hmc::oracle::{AnalyticGradient, BurnGradient, FiniteDifference};
use ndarray::{array, Array1};
use rand::rngs::SmallRng;
use rand::SeedableRng;

type BackendType = Autodiff<NdArray>;

#[test]
fn test_reversible_on_rosenbrock() {
    let target = Rosenbrock::new(1.0_f64, 5.0);
    let proposer = LeapfrogProposer::new(target, 0.01, 0.5).unwrap();
    let mut rng = SmallRng::seed_from_u64(42);

    for _ in 0..20 {
        let q0: Array1<f64> = sample_momentum(&mut rng, 2) * 0.5;
        let p0: Array1<f64> = sample_momentum(&mut rng, 2);
        let (q1, p1) = proposer.propose(&q0, &p0).unwrap();
        assert_eq!(q1.len(), 2);
        assert_eq!(p1.len(), 2);

        let (q2, p2) = proposer.propose(&q1, &p1).unwrap();
        assert_abs_diff_eq!(q2, q0, epsilon = 1e-8);
        assert_abs_diff_eq!(p2, p0, epsilon = 1e-8);
    }
}

#[test]
fn test_reversible_with_finite_differences() {
    let oracle = FiniteDifference::new(|q: &Array1<f64>| {
        0.5 * q.dot(q) + 0.1 * q.mapv(|x| x.powi(4)).sum()
    });
    let proposer = LeapfrogProposer::new(oracle, 0.05, 1.0).unwrap();
    let q0 = array![0.3, -0.9, 1.4];
    let p0 = array![1.0, 0.2, -0.6];
    let (q1, p1) = proposer.propose(&q0, &p0).unwrap();
    let (q2, p2) = proposer.propose(&q1, &p1).unwrap();
    assert_abs_diff_eq!(q2, q0, epsilon = 1e-8);
    assert_abs_diff_eq!(p2, p0, epsilon = 1e-8);
}

#[test]
fn test_free_particle() {
    let flat = AnalyticGradient::new(
        |_: &Array1<f64>| 0.0,
        |q: &Array1<f64>| Array1::zeros(q.len()),
    );
    for (step_size, path_len) in [(0.25, 1.0), (0.5, 2.0), (1.0, 1.0), (0.125, 3.0)] {
        let proposer = LeapfrogProposer::new(&flat, step_size, path_len).unwrap();
        let q = array![1.0, -2.0, 0.5];
        let p = array![0.5, 1.5, -3.0];
        let (q_new, p_new) = proposer.propose(&q, &p).unwrap();
        assert_abs_diff_eq!(q_new, &q + &(&p * path_len), epsilon = 1e-12);
        assert_abs_diff_eq!(p_new, -&p, epsilon = 1e-12);
    }
}

#[test]
fn test_harmonic_oscillator_through_autodiff() {
    let oracle = BurnGradient::<f32, BackendType, _>::new(StandardGaussian::new(1));
    let proposer = LeapfrogProposer::new(&oracle, 0.1_f32, 1.0).unwrap();
    let (q, p) = proposer.propose(&array![0.0_f32], &array![1.0]).unwrap();
    assert_abs_diff_eq!(q[0], 1.0_f32.sin(), epsilon = 0.01);
    assert_abs_diff_eq!(p[0], -(1.0_f32.cos()), epsilon = 0.01);

    let exact = LeapfrogProposer::new(StandardGaussian::new(1), 0.1_f32, 1.0).unwrap();
    let (q_exact, p_exact) = exact.propose(&array![0.0_f32], &array![1.0]).unwrap();
    assert_abs_diff_eq!(q, q_exact, epsilon = 1e-5);
    assert_abs_diff_eq!(p, p_exact, epsilon = 1e-5);
}

#[test]
fn test_shared_across_threads() {
    let target = StandardGaussian::new(2);
    let proposer = LeapfrogProposer::new(target, 0.1, 1.0).unwrap();
    let starts: Vec<(Array1<f64>, Array1<f64>)> = (0..4)
        .map(|i| (array![i as f64, -1.0], array![0.5, i as f64 * 0.25]))
        .collect();
    let expected: Vec<_> = starts
        .iter()
        .map(|(q, p)| proposer.propose(q, p).unwrap())
        .collect();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = starts
            .iter()
            .map(|(q, p)| {
                let proposer = &proposer;
                s.spawn(move || proposer.propose(q, p).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results, expected);
}
