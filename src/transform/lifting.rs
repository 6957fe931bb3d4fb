//! Second-generation wavelet transform built from lifting steps.
//!
//! One decomposition level over the active prefix of length `n`:
//!
//! 1. **Predict**: every odd sample becomes its deviation from the mean of its
//!    two neighbours, `x[i] -= (x[i-1] + x[i+1]) / 2`.
//! 2. **Update**: every even sample absorbs a quarter of its two (already
//!    predicted) neighbours, `x[i] += (x[i-1] + x[i+1]) / 4`.
//! 3. **Deinterleave**: the even samples (approximation) are packed first,
//!    followed by the odd samples (detail), both in their original order.
//!
//! Neighbours outside `0..n` are reflected: `-i` below zero and
//! `2(n-1) - i` past the end, repeated until the index lands in range.
//! The forward transform recurses on the leading `ceil(n/2)` approximation
//! samples until a single sample remains; the backward transform undoes the
//! levels from the innermost outward.
//!
//! There is no normalisation step, so the coefficients depend directly on
//! the predict and update weights below.

const PREDICT_WEIGHT: f64 = 0.5;
const UPDATE_WEIGHT: f64 = 0.25;

/// Transform `values` in place into wavelet coefficients.
pub fn forward(values: &mut [f64]) {
    for n in level_lengths(values.len()) {
        forward_step(&mut values[..n]);
    }
}

/// Invert [`forward`] in place.
pub fn backward(values: &mut [f64]) {
    for n in level_lengths(values.len()).into_iter().rev() {
        backward_step(&mut values[..n]);
    }
}

/// Active prefix lengths of each decomposition level, outermost first.
fn level_lengths(len: usize) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut n = len;
    while n >= 2 {
        lengths.push(n);
        n = n.div_ceil(2);
    }
    lengths
}

/// Fold an out-of-range index back into `0..n` by symmetric reflection.
fn reflect(index: isize, n: usize) -> usize {
    debug_assert!(n >= 2);
    let last = n as isize - 1;
    let mut i = index;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

fn neighbour_sum(values: &[f64], i: usize) -> f64 {
    let n = values.len();
    let i = i as isize;
    values[reflect(i - 1, n)] + values[reflect(i + 1, n)]
}

fn forward_step(values: &mut [f64]) {
    let n = values.len();
    for i in (1..n).step_by(2) {
        values[i] -= PREDICT_WEIGHT * neighbour_sum(values, i);
    }
    for i in (0..n).step_by(2) {
        values[i] += UPDATE_WEIGHT * neighbour_sum(values, i);
    }

    let packed: Vec<f64> = values
        .iter()
        .step_by(2)
        .chain(values.iter().skip(1).step_by(2))
        .copied()
        .collect();
    values.copy_from_slice(&packed);
}

fn backward_step(values: &mut [f64]) {
    let n = values.len();
    let evens = n.div_ceil(2);
    let mut interleaved = vec![0.0; n];
    for (i, &value) in values[..evens].iter().enumerate() {
        interleaved[2 * i] = value;
    }
    for (i, &value) in values[evens..].iter().enumerate() {
        interleaved[2 * i + 1] = value;
    }
    values.copy_from_slice(&interleaved);

    for i in (0..n).step_by(2) {
        values[i] -= UPDATE_WEIGHT * neighbour_sum(values, i);
    }
    for i in (1..n).step_by(2) {
        values[i] += PREDICT_WEIGHT * neighbour_sum(values, i);
    }
}
