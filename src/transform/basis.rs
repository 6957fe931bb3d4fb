use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard};

use ndarray::Array2;
use tracing::debug;

use super::lifting;

type Matrices = HashMap<usize, Arc<Array2<f32>>>;

/// Lazily built transform matrices, one per band count.
///
/// Entries are never evicted. The lock is held while a missing matrix is
/// built, so concurrent first requests for the same size build it once.
#[derive(Debug, Default)]
pub struct BasisCache {
    wavelet: Mutex<Matrices>,
    dct: Mutex<Matrices>,
}

impl BasisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n x n` forward wavelet matrix; column `i` is the transform of the
    /// `i`-th unit impulse.
    pub fn wavelet(&self, n: usize) -> Arc<Array2<f32>> {
        get_or_build(&self.wavelet, n, wavelet_matrix)
    }

    /// `n x n` DCT-II matrix, `cos(pi k (2i+1) / 2n) / n`: scipy's type-II DCT
    /// divided by `2n`.
    pub fn dct(&self, n: usize) -> Arc<Array2<f32>> {
        get_or_build(&self.dct, n, dct_matrix)
    }

    /// Sizes currently cached as (wavelet, dct).
    pub fn cached_sizes(&self) -> (Vec<usize>, Vec<usize>) {
        let sizes = |map: &Mutex<Matrices>| {
            let mut keys: Vec<usize> = lock(map).keys().copied().collect();
            keys.sort_unstable();
            keys
        };
        (sizes(&self.wavelet), sizes(&self.dct))
    }
}

fn lock(map: &Mutex<Matrices>) -> MutexGuard<'_, Matrices> {
    // Matrices are inserted whole, so a poisoned map is still consistent.
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn get_or_build(
    map: &Mutex<Matrices>,
    n: usize,
    build: fn(usize) -> Array2<f32>,
) -> Arc<Array2<f32>> {
    let mut guard = lock(map);
    Arc::clone(guard.entry(n).or_insert_with(|| {
        debug!(size = n, "building transform matrix");
        Arc::new(build(n))
    }))
}

pub(crate) fn wavelet_matrix(n: usize) -> Array2<f32> {
    let mut matrix = Array2::zeros((n, n));
    let mut impulse = vec![0.0_f64; n];
    for column in 0..n {
        impulse.fill(0.0);
        impulse[column] = 1.0;
        lifting::forward(&mut impulse);
        for (row, &value) in impulse.iter().enumerate() {
            matrix[[row, column]] = value as f32;
        }
    }
    matrix
}

pub(crate) fn dct_matrix(n: usize) -> Array2<f32> {
    let scale = 1.0 / n.max(1) as f64;
    Array2::from_shape_fn((n, n), |(k, i)| {
        let angle = PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64;
        (angle.cos() * scale) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    #[test]
    fn wavelet_matrix_matches_direct_transform() {
        let input = [3.0, -1.0, 4.0, 1.0, -5.0];
        let mut direct = input.to_vec();
        lifting::forward(&mut direct);

        let matrix = wavelet_matrix(input.len());
        let x = Array1::from_iter(input.iter().map(|&v| v as f32));
        let product = matrix.dot(&x);
        for (a, b) in product.iter().zip(&direct) {
            assert_abs_diff_eq!(*a as f64, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn dct_first_row_is_mean() {
        let matrix = dct_matrix(4);
        let x = Array1::from(vec![1.0_f32, 2.0, 3.0, 6.0]);
        assert_abs_diff_eq!(matrix.dot(&x)[0], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn cache_hands_out_shared_matrices() {
        let cache = BasisCache::new();
        let first = cache.wavelet(6);
        let second = cache.wavelet(6);
        assert!(Arc::ptr_eq(&first, &second));
        cache.dct(3);
        assert_eq!(cache.cached_sizes(), (vec![6], vec![3]));
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        let cache = Arc::new(BasisCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.dct(26))
            })
            .collect();
        let matrices: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(matrices.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
