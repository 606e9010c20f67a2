use super::error::AxisError;
use super::model::MetadataRecord;

/// Reconstruct the x-axis of a trace.
///
/// Produces `numpnts` evenly spaced values over the closed interval
/// `[x_0, x_0 + delta_x * numpnts]`. The stop value is one sample past the last
/// acquired point, so the effective spacing is `delta_x * numpnts / (numpnts - 1)`.
/// This matches the plots produced by the existing export scripts and is kept
/// as-is.
pub fn build_axis(record: &MetadataRecord) -> Result<Vec<f64>, AxisError> {
    if record.numpnts <= 0 {
        return Err(AxisError::NonPositivePoints(record.numpnts));
    }
    if !record.x_0.is_finite() || !record.delta_x.is_finite() {
        return Err(AxisError::NonFinite {
            x_0: record.x_0,
            delta_x: record.delta_x,
        });
    }

    let too_many = || AxisError::TooManyPoints(record.numpnts);
    let n = usize::try_from(record.numpnts).map_err(|_| too_many())?;
    let mut axis = Vec::new();
    axis.try_reserve_exact(n).map_err(|_| too_many())?;

    let start = record.x_0;
    let stop = record.x_0 + record.delta_x * record.numpnts as f64;
    linspace_into(&mut axis, start, stop, n);
    Ok(axis)
}

/// Append `n` points from `start` to `stop`, both included. The last point is
/// `stop` exactly; `n == 1` yields `[start]`.
fn linspace_into(out: &mut Vec<f64>, start: f64, stop: f64, n: usize) {
    if n == 1 {
        out.push(start);
        return;
    }
    let step = (stop - start) / (n - 1) as f64;
    out.extend((0..n).map(|i| if i == n - 1 { stop } else { start + i as f64 * step }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x_0: f64, delta_x: f64, numpnts: i64) -> MetadataRecord {
        MetadataRecord {
            unit_x: "s".into(),
            unit_y: "A".into(),
            x_0,
            delta_x,
            numpnts,
            params: serde_json::Value::Null,
        }
    }

    #[test]
    fn span_ends_one_sample_past_last_point() {
        let x = build_axis(&record(0.0, 1.0, 5)).unwrap();
        assert_eq!(x, vec![0.0, 1.25, 2.5, 3.75, 5.0]);
    }

    #[test]
    fn offset_origin() {
        let x = build_axis(&record(-1.0, 0.5, 3)).unwrap();
        assert_eq!(x.len(), 3);
        assert_eq!(x[0], -1.0);
        assert_eq!(x[2], 0.5);
        assert!((x[1] - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn single_point_is_origin() {
        assert_eq!(build_axis(&record(2.0, 1.0, 1)).unwrap(), vec![2.0]);
    }

    #[test]
    fn rejects_non_positive_point_count() {
        assert_eq!(
            build_axis(&record(0.0, 1.0, 0)),
            Err(AxisError::NonPositivePoints(0))
        );
        assert_eq!(
            build_axis(&record(0.0, 1.0, -3)),
            Err(AxisError::NonPositivePoints(-3))
        );
    }

    #[test]
    fn rejects_non_finite_parameters() {
        assert!(matches!(
            build_axis(&record(f64::NAN, 1.0, 4)),
            Err(AxisError::NonFinite { .. })
        ));
        assert!(matches!(
            build_axis(&record(0.0, f64::INFINITY, 4)),
            Err(AxisError::NonFinite { .. })
        ));
    }

    #[test]
    fn unallocatable_point_count_is_an_error() {
        assert_eq!(
            build_axis(&record(0.0, 1.0, 1 << 62)),
            Err(AxisError::TooManyPoints(1 << 62))
        );
    }
}
