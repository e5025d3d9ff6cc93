use ndarray::Array2;
use statrs::statistics::Statistics;

/// Population variance of every entry of `x`, taken as one flat sample.
///
/// This is the variance the `scale` gamma rule divides by. Returns NaN for an
/// empty matrix.
pub fn flattened_variance(x: &Array2<f32>) -> f64 {
    x.iter().map(|&v| v as f64).population_variance()
}
