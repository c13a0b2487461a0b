//! Trailing-window means
//!
//! The one windowed-mean primitive behind both batch and live features. Batch
//! computation emits a shifted value per row; live resolution emits a single
//! unshifted value over the tail. Both go through `window_mean`.

/// Mean of the present values in `values[end - window .. end]`.
///
/// The window is clipped at the start of the series (minimum of one
/// observation). Absent values are skipped; if the window holds no present
/// value the result is absent, never zero.
pub fn window_mean(values: &[Option<f64>], end: usize, window: usize) -> Option<f64> {
    let end = end.min(values.len());
    let start = end.saturating_sub(window);

    let (sum, count) = values[start..end]
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// One value per row, each covering only the rows before it
pub fn shifted_means(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| window_mean(values, i, window))
        .collect()
}

/// Single value covering the last `window` rows
pub fn tail_mean(values: &[Option<f64>], window: usize) -> Option<f64> {
    window_mean(values, values.len(), window)
}
