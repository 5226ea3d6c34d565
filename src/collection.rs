//! All four rats under one trial split.
use std::path::Path;

use anyhow::{bail, Result};

use crate::config::{DatasetConfig, RATS};
use crate::dataset::{SingleSession, TrialSplitDataset};
use crate::trial::Split;

/// The four linear-track rats, each restricted to the same fold and split.
#[derive(Debug, Clone)]
pub struct MultiRatDataset {
    datasets: Vec<TrialSplitDataset>,
    split_no: usize,
    split: Option<Split>,
}

impl MultiRatDataset {
    /// Load achilles, buddy, cicero and gatsby from `root`.
    pub fn load(root: &Path, split_no: usize, split: Option<Split>) -> Result<Self> {
        let datasets = RATS
            .iter()
            .map(|name| {
                TrialSplitDataset::load(&DatasetConfig {
                    name: name.to_string(),
                    root: root.to_path_buf(),
                    split_no,
                    split,
                    ..DatasetConfig::default()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_datasets(datasets, split_no, split)
    }

    /// Group already-built sessions; every one must share `split_no` and `split`.
    pub fn from_datasets(datasets: Vec<TrialSplitDataset>, split_no: usize, split: Option<Split>) -> Result<Self> {
        if let Some(d) = datasets
            .iter()
            .find(|d| d.split_no() != split_no || d.split_name() != split)
        {
            bail!("{} was built with a different fold or split than the collection", d.name());
        }
        Ok(Self { datasets, split_no, split })
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&TrialSplitDataset> {
        self.datasets.get(i)
    }

    pub fn datasets(&self) -> &[TrialSplitDataset] {
        &self.datasets
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name()).collect()
    }

    /// `(rows, neurons)` of each session.
    pub fn shapes(&self) -> Vec<(usize, usize)> {
        self.datasets.iter().map(|d| d.neural().dim()).collect()
    }

    pub fn split_no(&self) -> usize {
        self.split_no
    }

    /// The collection is fixed to one split; asking for another is an error.
    pub fn split(&self, split: Split) -> Result<()> {
        if self.split != Some(split) {
            let built = self.split.map_or("none", Split::as_str);
            bail!("collection was built for split '{built}', cannot switch to '{split}'");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RatDataset;
    use ndarray::Array2;

    fn session(name: &str, split: Split) -> TrialSplitDataset {
        let t = 9 * 8;
        let neural = Array2::from_elem((t, 3), 1.0_f32);
        let index = Array2::from_shape_fn((t, 2), |(r, c)| match c {
            0 => r as f32,
            _ if r % 8 < 4 => 1.0,
            _ => -1.0,
        });
        let rat = RatDataset::new(name, neural, index).unwrap();
        TrialSplitDataset::new(rat, 0, Some(split)).unwrap()
    }

    #[test]
    fn names_and_shapes() {
        let multi = MultiRatDataset::from_datasets(
            vec![session("a", Split::All), session("b", Split::All)],
            0,
            Some(Split::All),
        )
        .unwrap();
        assert_eq!(multi.names(), vec!["a", "b"]);
        assert_eq!(multi.shapes(), vec![(72, 3), (72, 3)]);
        assert!(multi.split(Split::All).is_ok());
        assert!(multi.split(Split::Train).is_err());
    }

    #[test]
    fn mixed_splits_rejected() {
        let res = MultiRatDataset::from_datasets(
            vec![session("a", Split::All), session("b", Split::Train)],
            0,
            Some(Split::All),
        );
        assert!(res.is_err());
    }
}
