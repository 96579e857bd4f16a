// Summary statistics shared by the numeric operations and the chart builder

/// Finite values of `data`, sorted ascending. NaN and infinities are dropped.
pub fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolated percentile of already sorted data, `p` in `[0, 1]`.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Mean of the non-NaN values, NaN when there are none.
pub fn mean(data: &[f64]) -> f64 {
    let present: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return f64::NAN;
    }
    present.iter().sum::<f64>() / present.len() as f64
}

/// Population standard deviation (ddof = 0) of the non-NaN values.
pub fn population_std(data: &[f64]) -> f64 {
    let m = mean(data);
    let present: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return f64::NAN;
    }
    let variance = present.iter().map(|x| (x - m).powi(2)).sum::<f64>() / present.len() as f64;
    variance.sqrt()
}

/// `(min, max)` of the non-NaN values.
pub fn min_max(data: &[f64]) -> Option<(f64, f64)> {
    data.iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ============================================================================
// Box / violin
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Tukey box statistics (1.5 IQR fences). `None` for empty input.
pub fn box_stats(data: &[f64]) -> Option<BoxStats> {
    let ys = sorted_finite(data);
    if ys.is_empty() {
        return None;
    }

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let lower_whisker = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);
    let outliers = ys
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(BoxStats {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

/// Silverman's rule of thumb for bandwidth selection
pub fn silverman_bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    if n < 2.0 {
        return 1.0;
    }

    let m = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // IQR-based estimate for robustness
    let iqr = percentile(sorted, 0.75) - percentile(sorted, 0.25);

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 {
        return 1.0;
    }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE on a regular grid. Returns `(grid, density)` with the
/// density normalised to a peak of 1.
pub fn kde(sorted: &[f64], bandwidth: f64) -> (Vec<f64>, Vec<f64>) {
    const GRID_POINTS: usize = 128;

    let n = sorted.len() as f64;
    let (Some(&min_y), Some(&max_y)) = (sorted.first(), sorted.last()) else {
        return (vec![], vec![]);
    };

    let extend = 3.0 * bandwidth;
    let start = min_y - extend;
    let range = (max_y + extend) - start;
    if range <= 0.0 {
        return (vec![min_y], vec![1.0]);
    }

    let step = range / (GRID_POINTS - 1) as f64;
    let grid: Vec<f64> = (0..GRID_POINTS).map(|i| start + i as f64 * step).collect();
    let mut density: Vec<f64> = grid
        .iter()
        .map(|&y| {
            sorted
                .iter()
                .map(|&xi| gaussian_kernel((y - xi) / bandwidth))
                .sum::<f64>()
                / (n * bandwidth)
        })
        .collect();

    let peak = density.iter().fold(0.0f64, |a, &b| a.max(b));
    if peak > 0.0 {
        density.iter_mut().for_each(|d| *d /= peak);
    }
    (grid, density)
}

// ============================================================================
// Histogram
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `nbins + 1` ascending edges
    pub edges: Vec<f64>,
    pub counts: Vec<f64>,
}

/// Equal-width histogram over the finite values. Bins are half-open except
/// the last, which includes the maximum.
pub fn histogram(data: &[f64], nbins: usize) -> Histogram {
    let values = sorted_finite(data);
    let nbins = nbins.max(1);
    let (Some(&min), Some(&max)) = (values.first(), values.last()) else {
        return Histogram {
            edges: vec![],
            counts: vec![],
        };
    };

    let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (hi - lo) / nbins as f64;
    let edges: Vec<f64> = (0..=nbins).map(|i| lo + i as f64 * width).collect();
    let counts = bin_counts(&edges, &values);
    Histogram { edges, counts }
}

/// Count the finite values of `data` falling in each bin of `edges`. Values
/// outside the edges are ignored; the last bin includes its upper edge.
pub fn bin_counts(edges: &[f64], data: &[f64]) -> Vec<f64> {
    let nbins = edges.len().saturating_sub(1);
    let mut counts = vec![0.0; nbins];
    let (Some(&lo), Some(&hi)) = (edges.first(), edges.last()) else {
        return counts;
    };
    for &v in data.iter().filter(|v| v.is_finite()) {
        if v < lo || v > hi {
            continue;
        }
        // First edge strictly greater than v, minus one
        let idx = edges.partition_point(|&e| e <= v).saturating_sub(1).min(nbins - 1);
        counts[idx] += 1.0;
    }
    counts
}

// ============================================================================
// Regression and correlation
// ============================================================================

/// Ordinary least squares fit. Returns `(slope, intercept)`.
pub fn ols(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let sum_x: f64 = pairs.iter().map(|p| p.0).sum();
    let sum_y: f64 = pairs.iter().map(|p| p.1).sum();
    let sum_xx: f64 = pairs.iter().map(|p| p.0 * p.0).sum();
    let sum_xy: f64 = pairs.iter().map(|p| p.0 * p.1).sum();

    let denom = n * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

/// Locally weighted linear regression with a tricube kernel over the nearest
/// `frac` share of points. Returns the fitted curve at the sorted x values.
pub fn lowess(xs: &[f64], ys: &[f64], frac: f64) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = pairs.len();
    if n < 2 {
        return pairs;
    }
    let span = ((frac * n as f64).ceil() as usize).clamp(2, n);

    pairs
        .iter()
        .map(|&(x0, _)| {
            let mut dists: Vec<f64> = pairs.iter().map(|p| (p.0 - x0).abs()).collect();
            dists.sort_by(f64::total_cmp);
            let h = dists[span - 1].max(f64::EPSILON);

            let (mut sw, mut swx, mut swy, mut swxx, mut swxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for &(x, y) in &pairs {
                let u = (x - x0).abs() / h;
                if u >= 1.0 {
                    continue;
                }
                let w = (1.0 - u.powi(3)).powi(3);
                sw += w;
                swx += w * x;
                swy += w * y;
                swxx += w * x * x;
                swxy += w * x * y;
            }
            let denom = sw * swxx - swx * swx;
            let fitted = if denom.abs() > f64::EPSILON {
                let slope = (sw * swxy - swx * swy) / denom;
                (swy - slope * swx) / sw + slope * x0
            } else {
                swy / sw
            };
            (x0, fitted)
        })
        .collect()
}

/// Pearson correlation over pairwise-complete observations.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    sxy / (sxx * syy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 0.5), 2.5);
        assert_eq!(percentile(&data, 1.0), 4.0);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_population_std() {
        assert_eq!(population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(population_std(&[1.0, f64::NAN, 1.0]), 0.0);
    }

    #[test]
    fn test_box_stats_outlier() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 4.0);
        assert!(box_stats(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_histogram_counts_everything() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0, f64::NAN], 4);
        assert_eq!(h.edges.len(), 5);
        assert_eq!(h.counts.iter().sum::<f64>(), 5.0);
        assert_eq!(h.counts[3], 2.0);
    }

    #[test]
    fn test_ols_exact_line() {
        let (slope, intercept) = ols(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
        assert!(ols(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_lowess_follows_a_line() {
        let xs: Vec<f64> = (0..10).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x).collect();
        for (x, y) in lowess(&xs, &ys, 2.0 / 3.0) {
            assert!((y - 2.0 * x).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pearson() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
    }
}
