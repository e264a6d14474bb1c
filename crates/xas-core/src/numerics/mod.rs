//! Small deterministic numeric helpers shared by normalization and merging.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn stable_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(stable_sum(values) / values.len() as f64)
}

/// Ordinary least-squares line through `(x, y)`.
///
/// Returns `None` for fewer than two points or when every `x` is equal.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LineFit> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }

    let x_mean = stable_mean(x)?;
    let y_mean = stable_mean(y)?;
    let mut sxx = 0.0;
    let mut sxx_correction = 0.0;
    let mut sxy = 0.0;
    let mut sxy_correction = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        kahan_add(&mut sxx, &mut sxx_correction, dx * dx);
        kahan_add(&mut sxy, &mut sxy_correction, dx * (yi - y_mean));
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LineFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Finite-difference derivative dy/dx: central inside, one-sided at the ends.
pub fn gradient(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let slope = |lower: usize, upper: usize| {
        let dx = x[upper] - x[lower];
        if dx == 0.0 { 0.0 } else { (y[upper] - y[lower]) / dx }
    };

    (0..n)
        .map(|index| match index {
            0 => slope(0, 1),
            i if i == n - 1 => slope(n - 2, n - 1),
            i => slope(i - 1, i + 1),
        })
        .collect()
}

/// Index of the largest finite value; first one wins on ties.
pub fn argmax_finite(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .fold(None, |best: Option<(usize, f64)>, (index, &value)| match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}

/// Linear interpolation of `(x_grid, y_grid)` at `x`, holding the end values
/// outside the grid. `x_grid` must be non-decreasing.
pub fn interpolate_linear(x: f64, x_grid: &[f64], y_grid: &[f64]) -> Option<f64> {
    if x_grid.is_empty() || x_grid.len() != y_grid.len() {
        return None;
    }

    if x <= x_grid[0] {
        return Some(y_grid[0]);
    }

    let last_index = x_grid.len() - 1;
    if x >= x_grid[last_index] {
        return Some(y_grid[last_index]);
    }

    let upper = x_grid.partition_point(|&value| value < x);
    let lower = upper - 1;
    let x0 = x_grid[lower];
    let x1 = x_grid[upper];
    if x1 == x0 {
        return Some(y_grid[upper]);
    }

    let interpolation = (x - x0) / (x1 - x0);
    Some(y_grid[lower] + interpolation * (y_grid[upper] - y_grid[lower]))
}

pub fn is_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|window| window[0] <= window[1])
}

#[cfg(test)]
mod tests {
    use super::{
        argmax_finite, gradient, interpolate_linear, is_non_decreasing, linear_fit, stable_mean,
        stable_sum,
    };

    #[test]
    fn stable_sum_reduces_order_loss_for_large_and_small_values() {
        let input = [1.0e16, 1.0, -1.0e16];
        assert_eq!(stable_sum(&input), 0.0);
    }

    #[test]
    fn stable_mean_of_empty_slice_is_none() {
        assert_eq!(stable_mean(&[]), None);
        assert_eq!(stable_mean(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.5 * v - 1.0).collect();
        let fit = linear_fit(&x, &y).expect("fit");
        assert!((fit.slope - 2.5).abs() < 1.0e-12);
        assert!((fit.intercept + 1.0).abs() < 1.0e-12);
        assert!((fit.at(10.0) - 24.0).abs() < 1.0e-12);
    }

    #[test]
    fn linear_fit_rejects_degenerate_input() {
        assert!(linear_fit(&[1.0], &[1.0]).is_none());
        assert!(linear_fit(&[2.0, 2.0], &[1.0, 3.0]).is_none());
        assert!(linear_fit(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn gradient_uses_central_differences_inside() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 4.0, 9.0];
        assert_eq!(gradient(&x, &y), [1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn argmax_skips_non_finite_values() {
        assert_eq!(argmax_finite(&[1.0, f64::INFINITY, 3.0, 3.0, f64::NAN]), Some(2));
        assert_eq!(argmax_finite(&[f64::NAN]), None);
    }

    #[test]
    fn interpolation_holds_end_values() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 10.0, 20.0];
        assert_eq!(interpolate_linear(-1.0, &x, &y), Some(0.0));
        assert_eq!(interpolate_linear(0.25, &x, &y), Some(2.5));
        assert_eq!(interpolate_linear(1.5, &x, &y), Some(15.0));
        assert_eq!(interpolate_linear(5.0, &x, &y), Some(20.0));
        assert_eq!(interpolate_linear(1.0, &x, &[1.0]), None);
    }

    #[test]
    fn monotonic_check() {
        assert!(is_non_decreasing(&[1.0, 1.0, 2.0]));
        assert!(!is_non_decreasing(&[1.0, 0.5]));
    }
}
