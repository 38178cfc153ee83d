//! Small descriptive statistics used for goodness-of-fit.

/// Sum of squared differences between two equally long series.
pub fn sum_squared_residuals(observed: &[f64], fitted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(fitted)
        .map(|(o, f)| (o - f) * (o - f))
        .sum()
}

/// Pearson correlation coefficient.
///
/// Returns `None` when either series has zero variance or the inputs are
/// too short to correlate.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let n = a.len() as f64;
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;

    let mut sab = 0.0;
    let mut saa = 0.0;
    let mut sbb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - ma;
        let db = y - mb;
        sab += da * db;
        saa += da * da;
        sbb += db * db;
    }

    if saa <= 0.0 || sbb <= 0.0 {
        return None;
    }
    let r = sab / (saa.sqrt() * sbb.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}
