//! Trial detection and the 3-fold nested trial split.
//!
//! A rat running on a linear track alternates direction at each end.  The
//! behaviour array is `[T, 2]` = (position, direction); a **trial** is one
//! there-and-back lap:
//!
//! ```text
//! direction   + + - - + + -
//! changes       ^   ^   ^          i where dir[i+1] != dir[i]  → {1, 3, 5}
//! boundaries  [0,   3,    7]       changes[1::2], framed by 0 and T
//! ```
//!
//! Trials are dealt into 3 contiguous **outer folds**.  Inside every outer
//! fold an unshuffled 3-fold cross-validation picks a train block for
//! `split_no`; the held-out block is halved into test (first half) and
//! valid (second half).  Lists are accumulated outer fold by outer fold, so
//! the `train`/`valid`/`test` trial order is *not* ascending.
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{DatasetError, DatasetResult};

/// Number of outer folds and of nested cross-validation splits.
pub const N_FOLDS: usize = 3;

/// Named subset of a trial split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Valid,
    Test,
    /// Every trial in temporal order.
    All,
    /// Train trials followed by valid trials.
    WoTest,
}

impl Split {
    pub const VARIANTS: [Split; 5] = [Split::Train, Split::Valid, Split::Test, Split::All, Split::WoTest];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
            Split::All => "all",
            Split::WoTest => "wo_test",
        }
    }

    /// Human-readable list of accepted names, used in error messages.
    pub fn allowed() -> &'static str {
        "'train', 'valid', 'test', 'all', 'wo_test'"
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Split::VARIANTS
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DatasetError::InvalidSplit(s.to_string()))
    }
}

// ── Trial boundaries ─────────────────────────────────────────────────────────

/// Indices `i` where `direction[i + 1] != direction[i]`.
pub fn direction_changes(direction: ArrayView1<f32>) -> Vec<usize> {
    direction
        .windows(2)
        .into_iter()
        .enumerate()
        .filter(|(_, w)| w[1] != w[0])
        .map(|(i, _)| i)
        .collect()
}

/// Trial boundary list `[0, …, T]` for a `[T, ≥2]` behaviour array.
///
/// Every second direction change (starting at the second) closes a trial;
/// the ones in between are the mid-trial turn-arounds.  The result has
/// `n_trials + 1` entries.
pub fn trial_boundaries(behavior: &Array2<f32>) -> DatasetResult<Vec<usize>> {
    if behavior.ncols() < 2 {
        return Err(DatasetError::Shape(format!(
            "behaviour needs (position, direction) columns, got {}",
            behavior.ncols()
        )));
    }
    let changes = direction_changes(behavior.column(1));

    let mut bounds = Vec::with_capacity(changes.len() / 2 + 2);
    bounds.push(0);
    bounds.extend(changes.iter().skip(1).step_by(2).copied());
    bounds.push(behavior.nrows());
    Ok(bounds)
}

// ── Index partitioning ───────────────────────────────────────────────────────

/// Split `0..n` into `sections` contiguous ranges whose lengths differ by at
/// most one; the first `n % sections` ranges are the longer ones.
pub fn array_split(n: usize, sections: usize) -> Vec<Range<usize>> {
    let each = n / sections;
    let extra = n % sections;
    let mut start = 0;
    (0..sections)
        .map(|i| {
            let len = each + usize::from(i < extra);
            let r = start..start + len;
            start += len;
            r
        })
        .collect()
}

/// Unshuffled k-fold split of `0..n`, returning `(train, held_out)` positions
/// for fold `fold`.  Held-out blocks are contiguous and sized as in
/// [`array_split`]; train is every other position in ascending order.
pub fn kfold(n: usize, n_splits: usize, fold: usize) -> DatasetResult<(Vec<usize>, Vec<usize>)> {
    if fold >= n_splits {
        return Err(DatasetError::FoldIndex(fold));
    }
    if n < n_splits {
        return Err(DatasetError::TooFewTrials { fold, trials: n });
    }
    let held_out = array_split(n, n_splits).swap_remove(fold);
    let train = (0..n).filter(|i| !held_out.contains(i)).collect();
    Ok((train, held_out.collect()))
}

/// Train / valid / test trial lists for one `split_no`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialFolds {
    pub n_trials: usize,
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrialFolds {
    /// Run the nested split over `n_trials` trials.
    ///
    /// # Errors
    ///
    /// * [`DatasetError::FoldIndex`] if `split_no >= 3`.
    /// * [`DatasetError::TooFewTrials`] if an outer fold holds fewer than 3
    ///   trials (fewer than 9 trials overall).
    pub fn new(n_trials: usize, split_no: usize) -> DatasetResult<Self> {
        if split_no >= N_FOLDS {
            return Err(DatasetError::FoldIndex(split_no));
        }

        let mut train = Vec::new();
        let mut valid = Vec::new();
        let mut test = Vec::new();

        for (outer, trials) in array_split(n_trials, N_FOLDS).into_iter().enumerate() {
            let trials: Vec<usize> = trials.collect();
            let (train_pos, rest_pos) = kfold(trials.len(), N_FOLDS, split_no).map_err(|e| match e {
                DatasetError::TooFewTrials { trials, .. } => DatasetError::TooFewTrials { fold: outer, trials },
                other => other,
            })?;
            let halves = array_split(rest_pos.len(), 2);

            train.extend(train_pos.iter().map(|&p| trials[p]));
            test.extend(rest_pos[halves[0].clone()].iter().map(|&p| trials[p]));
            valid.extend(rest_pos[halves[1].clone()].iter().map(|&p| trials[p]));
        }

        tracing::debug!(
            n_trials,
            split_no,
            train = train.len(),
            valid = valid.len(),
            test = test.len(),
            "nested trial split"
        );

        Ok(Self { n_trials, train, valid, test })
    }

    /// Trial list for `split`, in the order its rows are concatenated.
    pub fn select(&self, split: Split) -> Vec<usize> {
        match split {
            Split::Train => self.train.clone(),
            Split::Valid => self.valid.clone(),
            Split::Test => self.test.clone(),
            Split::All => (0..self.n_trials).collect(),
            Split::WoTest => self.train.iter().chain(&self.valid).copied().collect(),
        }
    }
}

/// Trials selected for `split`.  [`Split::All`] does not need the nested
/// folds and so works for any trial count.
pub fn select_trials(n_trials: usize, split_no: usize, split: Split) -> DatasetResult<Vec<usize>> {
    if split_no >= N_FOLDS {
        return Err(DatasetError::FoldIndex(split_no));
    }
    match split {
        Split::All => Ok((0..n_trials).collect()),
        other => Ok(TrialFolds::new(n_trials, split_no)?.select(other)),
    }
}

// ── Concatenation ────────────────────────────────────────────────────────────

/// Row offsets in the concatenated output where two trials that were not
/// adjacent in the recording meet.
pub fn concat_offsets(bounds: &[usize], trials: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut cum = 0;
    for pair in trials.windows(2) {
        cum += bounds[pair[0] + 1] - bounds[pair[0]];
        if pair[0] + 1 != pair[1] {
            out.push(cum);
        }
    }
    out
}

/// Result of splitting one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSelection {
    /// Selected trial indices in concatenation order.
    pub trials: Vec<usize>,
    /// Source row range of each selected trial.
    pub row_ranges: Vec<Range<usize>>,
    /// Discontinuity offsets in the concatenated rows.
    pub concat_idx: Vec<usize>,
}

impl TrialSelection {
    /// Total number of rows after concatenation.
    pub fn n_rows(&self) -> usize {
        self.row_ranges.iter().map(|r| r.len()).sum()
    }

    /// Source row indices in concatenation order.
    pub fn rows(&self) -> Vec<usize> {
        self.row_ranges.iter().flat_map(|r| r.clone()).collect()
    }

    /// Rows of `arr` in concatenation order.
    pub fn gather(&self, arr: &Array2<f32>) -> Array2<f32> {
        arr.select(Axis(0), &self.rows())
    }
}

/// Full trial split of a behaviour array: trial detection, fold assignment,
/// row ranges and discontinuity offsets.
pub fn split_trials(behavior: &Array2<f32>, split_no: usize, split: Split) -> DatasetResult<TrialSelection> {
    let bounds = trial_boundaries(behavior)?;
    let n_trials = bounds.len() - 1;
    let trials = select_trials(n_trials, split_no, split)?;

    let row_ranges = trials.iter().map(|&t| bounds[t]..bounds[t + 1]).collect();
    let concat_idx = concat_offsets(&bounds, &trials);

    Ok(TrialSelection { trials, row_ranges, concat_idx })
}
