//! Model evaluation helpers

use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Minimum rows held out for scoring
pub const MIN_TEST_ROWS: usize = 2;

/// Coefficient of determination (R²)
///
/// When `actual` has no variance the score is 1.0 for a perfect prediction
/// and 0.0 otherwise, so the result is always finite.
pub fn r2_score(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    let mean = actual.mean().unwrap_or(0.0);
    let ss_tot = actual.mapv(|a| (a - mean).powi(2)).sum();
    let ss_res = (actual - predicted).mapv(|r| r * r).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Shuffle `0..n` and split into `(train, test)` row indices
///
/// The test side holds `ceil(n * test_fraction)` rows but never fewer than
/// [`MIN_TEST_ROWS`], and the train side keeps at least one row.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    if n < 2 {
        return (indices, Vec::new());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let fraction = test_fraction.clamp(0.0, 1.0);
    let n_test = ((n as f64 * fraction - 1e-9).ceil().max(0.0) as usize)
        .max(MIN_TEST_ROWS)
        .min(n - 1);

    let test = indices.split_off(n - n_test);
    (indices, test)
}
