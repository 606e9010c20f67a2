use super::error::WindowError;

/// Arithmetic mean of `samples[start..end]`.
///
/// The window is half-open and validated, never clamped: a negative start, an
/// end past the data or an empty window is an error rather than NaN.
pub fn windowed_mean(samples: &[f64], start: i64, end: i64) -> Result<f64, WindowError> {
    if start < 0 {
        return Err(WindowError::NegativeStart { start });
    }
    if end > samples.len() as i64 {
        return Err(WindowError::EndOutOfRange {
            end,
            len: samples.len(),
        });
    }
    if start >= end {
        return Err(WindowError::Empty { start, end });
    }

    let window = &samples[start as usize..end as usize];
    let sum: f64 = window.iter().sum();
    Ok(sum / window.len() as f64)
}
