//! Single-session rat recordings.
//!
//! [`SingleSession`] is the capability every recording exposes: neural rows,
//! behaviour labels, seams, and windowed samples.  [`RatDataset`] is the
//! plain recording; [`TrialSplitDataset`] restricts it to one subset of the
//! 3-fold nested trial split; [`corrupt_labels`] wraps a recording with
//! shuffled labels as a control.
use std::fmt;
use std::ops::Range;
use std::path::Path;

use anyhow::{bail, ensure, Result};
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{DatasetConfig, DecodeConfig};
use crate::decode::{decode, DecodeMetrics};
use crate::error::{DatasetError, DatasetResult};
use crate::io::{recording_path, RecordingArrays};
use crate::trial::{split_trials, Split, TrialSelection, N_FOLDS};
use crate::window::{self, Offset};

/// A single continuous recording session.
pub trait SingleSession {
    fn name(&self) -> &str;

    /// `[T, C]` neural activity.
    fn neural(&self) -> &Array2<f32>;

    /// `[T, 2]` (position, direction) labels.
    fn continuous_index(&self) -> &Array2<f32>;

    /// Row offsets where non-adjacent segments were joined.
    fn concat_idx(&self) -> &[usize] {
        &[]
    }

    fn input_dimension(&self) -> usize {
        self.neural().ncols()
    }

    fn len(&self) -> usize {
        self.neural().nrows()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices usable as sample centres for `offset`.
    fn valid_indices(&self, offset: Offset) -> Vec<usize> {
        window::valid_indices(self.len(), self.concat_idx(), offset)
    }

    /// `[N, C, window]` samples for `indices`.
    ///
    /// Fails if a window leaves the recording or straddles a seam.
    fn get(&self, indices: &[usize], offset: Offset) -> Result<Array3<f32>> {
        if let Some(&bad) = indices
            .iter()
            .find(|&&i| !window::window_fits(self.len(), self.concat_idx(), i, offset))
        {
            bail!(
                "{}: no {}-bin window around index {bad} within one contiguous segment",
                self.name(),
                offset.len()
            );
        }
        window::expand_index(self.neural(), indices, offset)
    }
}

// ── Plain recording ──────────────────────────────────────────────────────────

/// One rat's tetrode recording on the linear track.
///
/// Neural data are spike counts in 25 ms bins; labels are position and
/// running direction.
#[derive(Debug, Clone)]
pub struct RatDataset {
    name: String,
    neural: Array2<f32>,
    index: Array2<f32>,
}

impl RatDataset {
    pub fn new(name: impl Into<String>, neural: Array2<f32>, index: Array2<f32>) -> Result<Self> {
        ensure!(
            neural.nrows() == index.nrows(),
            "neural has {} rows but behaviour has {}",
            neural.nrows(),
            index.nrows()
        );
        Ok(Self { name: name.into(), neural, index })
    }

    /// Load `{root}/rat_hippocampus/{name}.safetensors`.
    pub fn load(name: &str, root: &Path) -> Result<Self> {
        let path = recording_path(root, name);
        let rec = RecordingArrays::load(&path)?;
        tracing::info!(
            rat = name,
            rows = rec.spikes.nrows(),
            neurons = rec.spikes.ncols(),
            "loaded recording"
        );
        Self::new(name, rec.spikes, rec.position)
    }

    /// kNN decoding with the default neighbour sweep.
    ///
    /// The recording itself is not used; this mirrors the dataset-level
    /// decoding hook so callers can score embeddings of this rat.
    pub fn decode(
        &self,
        x_train: &Array2<f32>,
        y_train: &Array2<f32>,
        x_test: &Array2<f32>,
        y_test: &Array2<f32>,
    ) -> DatasetResult<DecodeMetrics> {
        decode(x_train, y_train, x_test, y_test, &DecodeConfig::default())
    }
}

impl SingleSession for RatDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn neural(&self) -> &Array2<f32> {
        &self.neural
    }

    fn continuous_index(&self) -> &Array2<f32> {
        &self.index
    }
}

impl fmt::Display for RatDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RatDataset(name: {}, shape: {:?})", self.name, self.neural.shape())
    }
}

/// Return `dataset` with its behaviour rows permuted by a seeded RNG.
///
/// Neural rows keep their order, so any neural/behaviour relationship is
/// destroyed while label statistics are preserved.
pub fn corrupt_labels(dataset: RatDataset, seed: u64) -> RatDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut perm: Vec<usize> = (0..dataset.index.nrows()).collect();
    perm.shuffle(&mut rng);
    let index = dataset.index.select(Axis(0), &perm);
    RatDataset { index, ..dataset }
}

// ── Trial-split recording ────────────────────────────────────────────────────

/// A rat recording restricted to one subset of the 3-fold nested trial split.
#[derive(Debug, Clone)]
pub struct TrialSplitDataset {
    /// The unsplit recording every split is taken from.
    full: RatDataset,
    data: RatDataset,
    split_no: usize,
    split: Option<Split>,
    selection: Option<TrialSelection>,
}

impl TrialSplitDataset {
    /// Wrap `data`; when `split` is given the split is applied immediately.
    pub fn new(data: RatDataset, split_no: usize, split: Option<Split>) -> DatasetResult<Self> {
        if split_no >= N_FOLDS {
            return Err(DatasetError::FoldIndex(split_no));
        }
        let mut ds = Self { full: data.clone(), data, split_no, split: None, selection: None };
        if let Some(s) = split {
            ds.split(s)?;
        }
        Ok(ds)
    }

    pub fn load(cfg: &DatasetConfig) -> Result<Self> {
        let data = RatDataset::load(&cfg.name, &cfg.root)?;
        Ok(Self::new(data, cfg.split_no, cfg.split)?)
    }

    /// Restrict the recording to `split`.
    ///
    /// Trials are always taken from the unsplit recording, so calling this
    /// again switches subsets rather than splitting already-joined rows.  The
    /// selection is computed in full before any array is replaced, so an
    /// error leaves the dataset unchanged.
    pub fn split(&mut self, split: Split) -> DatasetResult<()> {
        let sel = split_trials(&self.full.index, self.split_no, split)?;
        let neural = sel.gather(&self.full.neural);
        let index = sel.gather(&self.full.index);

        tracing::debug!(
            rat = %self.data.name,
            split = %split,
            split_no = self.split_no,
            trials = sel.trials.len(),
            rows = sel.n_rows(),
            seams = sel.concat_idx.len(),
            "applied trial split"
        );

        self.data.neural = neural;
        self.data.index = index;
        self.split = Some(split);
        self.selection = Some(sel);
        Ok(())
    }

    /// [`TrialSplitDataset::split`] by name (`"train"`, `"valid"`, `"test"`,
    /// `"all"`, `"wo_test"`).
    pub fn split_by_name(&mut self, name: &str) -> DatasetResult<()> {
        let split: Split = name.parse()?;
        self.split(split)
    }

    pub fn split_no(&self) -> usize {
        self.split_no
    }

    pub fn split_name(&self) -> Option<Split> {
        self.split
    }

    /// Trial indices kept, in row order.
    pub fn trials(&self) -> &[usize] {
        self.selection.as_ref().map_or(&[], |s| s.trials.as_slice())
    }

    /// Source row range of every kept trial.
    pub fn selected_indices(&self) -> &[Range<usize>] {
        self.selection.as_ref().map_or(&[], |s| s.row_ranges.as_slice())
    }

    pub fn inner(&self) -> &RatDataset {
        &self.data
    }
}

impl SingleSession for TrialSplitDataset {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn neural(&self) -> &Array2<f32> {
        &self.data.neural
    }

    fn continuous_index(&self) -> &Array2<f32> {
        &self.data.index
    }

    fn concat_idx(&self) -> &[usize] {
        self.selection.as_ref().map_or(&[], |s| s.concat_idx.as_slice())
    }
}

impl fmt::Display for TrialSplitDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let split = self.split.map_or("none", Split::as_str);
        write!(
            f,
            "TrialSplitDataset(name: {}, split_no: {}, split: {split}, shape: {:?})",
            self.data.name,
            self.split_no,
            self.data.neural.shape()
        )
    }
}
