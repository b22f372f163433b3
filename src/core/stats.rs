//! Descriptive statistics over `f64` columns.

use std::collections::BTreeMap;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let v = sorted(values);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

/// First and third quartiles as order statistics.
///
/// Q1 is the element at `floor((n - 1) * 0.25)` and Q3 the element at
/// `ceil((n - 1) * 0.75)` of the sorted column. Both are observed values, so
/// clipping to fences derived from them never moves Q1 or Q3.
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let v = sorted(values);
    let last = (v.len() - 1) as f64;
    let q1 = v[(last * 0.25).floor() as usize];
    let q3 = v[(last * 0.75).ceil() as usize];
    Some((q1, q3))
}

/// Slope of the ordinary least squares fit of `values` against `0..n`.
pub fn ols_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values)?;
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    Some(num / den)
}

/// Most frequent label. Ties go to the lexicographically smallest label.
pub fn mode<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    // BTreeMap iterates in ascending order; keep the first label with the max count.
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (label, count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
}
