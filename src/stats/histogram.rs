use super::HistogramBin;

/// Equal-width histogram over the finite values in `points`.
///
/// Every bin is half-open except the last, which also holds the maximum.
/// Returns `None` when there is no finite value, the range is zero, or the
/// range itself overflows.
#[must_use]
pub fn histogram(points: &[f64], bins: usize) -> Option<Vec<HistogramBin>> {
    if bins == 0 {
        return None;
    }
    let finite: Vec<f64> = points.iter().copied().filter(|p| p.is_finite()).collect();
    let min = finite.iter().copied().reduce(f64::min)?;
    let max = finite.iter().copied().reduce(f64::max)?;

    let range = max - min;
    if range == 0.0 || !range.is_finite() {
        return None;
    }
    let width = range / bins as f64;

    let mut counts = vec![0usize; bins];
    for point in finite {
        let slot = (((point - min) / width) as usize).min(bins - 1);
        counts[slot] += 1;
    }

    Some(
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                bin_start: min + width * i as f64,
                bin_end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
                count,
            })
            .collect(),
    )
}
