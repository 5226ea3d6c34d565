//! kNN decoding of behaviour from embeddings.
//!
//! Brute-force k-nearest-neighbour regression (Euclidean distance, uniform
//! weights).  For each `k` in the sweep:
//!
//! * `n{k}_err` — median |ŷ₀ − y₀| over the test set (position error).
//! * `n{k}_r2`  — R² averaged uniformly over all label columns.
//!
//! Neighbours are ranked once per test row up to the largest `k`, so the
//! sweep costs one distance pass.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1, Axis};

use crate::config::DecodeConfig;
use crate::error::{DatasetError, DatasetResult};

/// Metric name → value, e.g. `"n4_err"`, `"n4_r2"`.
pub type DecodeMetrics = BTreeMap<String, f64>;

fn sq_dist(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

/// Fitted brute-force kNN regressor.
pub struct KnnRegressor<'a> {
    x: &'a Array2<f32>,
    y: &'a Array2<f32>,
}

impl<'a> KnnRegressor<'a> {
    pub fn fit(x: &'a Array2<f32>, y: &'a Array2<f32>) -> DatasetResult<Self> {
        if x.nrows() == 0 {
            return Err(DatasetError::Decode("empty training set".into()));
        }
        if x.nrows() != y.nrows() {
            return Err(DatasetError::Shape(format!(
                "x_train has {} rows but y_train has {}",
                x.nrows(),
                y.nrows()
            )));
        }
        Ok(Self { x, y })
    }

    /// Training rows sorted by distance to `q`, truncated to `k`.  Ties keep
    /// the lower training index first.
    pub fn neighbors(&self, q: ArrayView1<f32>, k: usize) -> Vec<usize> {
        let mut d: Vec<(f64, usize)> = self
            .x
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(i, row)| (sq_dist(row, q), i))
            .collect();
        let by_dist = |a: &(f64, usize), b: &(f64, usize)| {
            a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1))
        };
        let k = k.min(d.len());
        if k == 0 {
            return Vec::new();
        }
        if k < d.len() {
            d.select_nth_unstable_by(k - 1, by_dist);
            d.truncate(k);
        }
        d.sort_unstable_by(by_dist);
        d.into_iter().map(|(_, i)| i).collect()
    }

    fn check_query(&self, x: &Array2<f32>, k: usize) -> DatasetResult<()> {
        if k == 0 || k > self.x.nrows() {
            return Err(DatasetError::Decode(format!(
                "n_neighbors = {k} must be in 1..={}",
                self.x.nrows()
            )));
        }
        if x.ncols() != self.x.ncols() {
            return Err(DatasetError::Shape(format!(
                "query has {} features, model was fitted on {}",
                x.ncols(),
                self.x.ncols()
            )));
        }
        Ok(())
    }

    /// Mean label of the `k` nearest training rows, per query row.
    pub fn predict(&self, x: &Array2<f32>, k: usize) -> DatasetResult<Array2<f64>> {
        self.check_query(x, k)?;
        let ranked: Vec<Vec<usize>> = x.axis_iter(Axis(0)).map(|q| self.neighbors(q, k)).collect();
        Ok(self.average(&ranked, k))
    }

    fn average(&self, ranked: &[Vec<usize>], k: usize) -> Array2<f64> {
        let n_out = self.y.ncols();
        let mut pred = Array2::<f64>::zeros((ranked.len(), n_out));
        for (r, nn) in ranked.iter().enumerate() {
            for &i in &nn[..k] {
                for c in 0..n_out {
                    pred[[r, c]] += self.y[[i, c]] as f64;
                }
            }
        }
        pred /= k as f64;
        pred
    }
}

/// Median of `v` (mean of the two middle values for even lengths).
pub fn median(v: &mut [f64]) -> f64 {
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let m = v.len() / 2;
    if v.len() % 2 == 1 {
        v[m]
    } else {
        0.5 * (v[m - 1] + v[m])
    }
}

/// Coefficient of determination, averaged uniformly over columns.
///
/// A constant target column scores 1.0 when predicted exactly and 0.0
/// otherwise.
pub fn r2_score(y_true: &Array2<f32>, y_pred: &Array2<f64>) -> f64 {
    let n_out = y_true.ncols();
    if n_out == 0 || y_true.nrows() == 0 {
        return f64::NAN;
    }
    let mut total = 0.0;
    for c in 0..n_out {
        let col = y_true.column(c);
        let mean = col.iter().map(|&v| v as f64).sum::<f64>() / col.len() as f64;
        let (mut ss_res, mut ss_tot) = (0.0, 0.0);
        for (r, &t) in col.iter().enumerate() {
            let t = t as f64;
            ss_res += (t - y_pred[[r, c]]).powi(2);
            ss_tot += (t - mean).powi(2);
        }
        total += if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };
    }
    total / n_out as f64
}

/// Run the kNN sweep in `cfg` and collect `n{k}_err` / `n{k}_r2` metrics.
///
/// # Errors
///
/// * Row or column counts disagree between features and labels.
/// * The test set is empty, or a `k` exceeds the training set size.
pub fn decode(
    x_train: &Array2<f32>,
    y_train: &Array2<f32>,
    x_test: &Array2<f32>,
    y_test: &Array2<f32>,
    cfg: &DecodeConfig,
) -> DatasetResult<DecodeMetrics> {
    let knn = KnnRegressor::fit(x_train, y_train)?;
    if x_test.nrows() == 0 {
        return Err(DatasetError::Decode("empty test set".into()));
    }
    if x_test.nrows() != y_test.nrows() || y_test.ncols() != y_train.ncols() {
        return Err(DatasetError::Shape(format!(
            "test labels {:?} do not match test features {:?} / train labels {:?}",
            y_test.shape(),
            x_test.shape(),
            y_train.shape()
        )));
    }
    if y_test.ncols() == 0 {
        return Err(DatasetError::Shape("labels have no columns".into()));
    }

    let k_max = cfg.neighbors.iter().copied().max().unwrap_or(0);
    for &k in &cfg.neighbors {
        knn.check_query(x_test, k)?;
    }
    let ranked: Vec<Vec<usize>> = x_test.axis_iter(Axis(0)).map(|q| knn.neighbors(q, k_max)).collect();

    let mut metrics = DecodeMetrics::new();
    for &k in &cfg.neighbors {
        let pred = knn.average(&ranked, k);
        let mut abs_err: Vec<f64> = pred
            .column(0)
            .iter()
            .zip(y_test.column(0))
            .map(|(&p, &t)| (p - t as f64).abs())
            .collect();
        let err = median(&mut abs_err);
        let r2 = r2_score(y_test, &pred);
        tracing::debug!(k, err, r2, "knn decode");
        metrics.insert(format!("n{k}_err"), err);
        metrics.insert(format!("n{k}_r2"), r2);
    }
    Ok(metrics)
}
