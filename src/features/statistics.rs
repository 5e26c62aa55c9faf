use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

/// Rows whose standard deviation falls below this are centred but not scaled.
pub const MIN_STD_DEV: f64 = 1e-10;

/// Mean of every row across frames; zero when there are no frames.
pub fn frame_means(matrix: &Array2<f64>) -> Array1<f64> {
    matrix
        .mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::zeros(matrix.nrows()))
}

/// Mean of a per-frame series; zero when empty.
pub fn series_mean(series: &Array1<f64>) -> f64 {
    series.mean().unwrap_or(0.0)
}

/// Standardise every row in place: subtract its mean, then divide by its
/// population standard deviation.
///
/// Rows with (near) zero variance are only centred. Their indices are
/// returned so callers can flag them; the output never holds NaN or Inf.
pub fn normalize_rows(matrix: &mut Array2<f64>) -> Vec<usize> {
    let mut unscaled = Vec::new();
    if matrix.ncols() == 0 {
        return unscaled;
    }

    for (index, mut row) in matrix.axis_iter_mut(Axis(0)).enumerate() {
        let mean = row.mean().unwrap_or(0.0);
        row.mapv_inplace(|v| v - mean);
        let std_dev = (row.iter().map(|v| v * v).sum::<f64>() / row.len() as f64).sqrt();
        if std_dev.is_finite() && std_dev >= MIN_STD_DEV {
            row.mapv_inplace(|v| v / std_dev);
        } else {
            row.fill(0.0);
            unscaled.push(index);
        }
    }

    unscaled
}

/// Distribution of one coefficient row across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowSummary {
    pub index: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

pub fn summarize_rows(matrix: &Array2<f64>) -> Vec<RowSummary> {
    matrix
        .outer_iter()
        .enumerate()
        .map(|(index, row)| {
            let mean = row.mean().unwrap_or(0.0);
            let std_dev = if row.is_empty() {
                0.0
            } else {
                (row.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / row.len() as f64).sqrt()
            };
            let min = row.iter().copied().fold(f64::INFINITY, f64::min);
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            RowSummary {
                index,
                mean,
                std_dev,
                min: if row.is_empty() { 0.0 } else { min },
                max: if row.is_empty() { 0.0 } else { max },
            }
        })
        .collect()
}
