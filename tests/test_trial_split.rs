mod common;
use common::{behavior, lap_lengths, spikes};
use hippodata::{
    array_split, split_trials, trial_boundaries, DatasetError, RatDataset, SingleSession, Split,
    TrialFolds, TrialSplitDataset, N_FOLDS,
};
use ndarray::Array2;
use std::collections::BTreeSet;

fn rat(n_trials: usize, base_lap: usize) -> RatDataset {
    let b = behavior(&lap_lengths(n_trials, base_lap));
    RatDataset::new("synthetic", spikes(b.nrows(), 6), b).unwrap()
}

#[test]
fn boundaries_are_strictly_increasing_and_framed() {
    for (n, lap) in [(1, 4), (9, 10), (31, 7), (100, 12)] {
        let b = behavior(&lap_lengths(n, lap));
        let bounds = trial_boundaries(&b).unwrap();
        assert_eq!(bounds.len(), n + 1, "n={n}");
        assert_eq!(bounds[0], 0);
        assert_eq!(*bounds.last().unwrap(), b.nrows());
        assert!(bounds.windows(2).all(|w| w[0] < w[1]), "bounds {bounds:?}");
    }
}

#[test]
fn reversal_scenario_from_direction_list() {
    let dirs = [1.0_f32, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0];
    let b = Array2::from_shape_fn((7, 2), |(t, c)| if c == 0 { t as f32 } else { dirs[t] });
    assert_eq!(trial_boundaries(&b).unwrap(), vec![0, 3, 7]);
    let sel = split_trials(&b, 0, Split::All).unwrap();
    let lens: Vec<usize> = sel.row_ranges.iter().map(|r| r.len()).collect();
    assert_eq!(lens, vec![3, 4]);
}

#[test]
fn train_valid_test_partition_all_trials() {
    for n in [9, 10, 11, 12, 29, 60] {
        for k in 0..N_FOLDS {
            let f = TrialFolds::new(n, k).unwrap();
            let mut seen = vec![0usize; n];
            for &t in f.train.iter().chain(&f.valid).chain(&f.test) {
                seen[t] += 1;
            }
            assert!(seen.iter().all(|&c| c == 1), "n={n} k={k} counts={seen:?}");
        }
    }
}

#[test]
fn outer_folds_are_balanced_and_stable_across_fold_index() {
    let n = 29;
    let outer = array_split(n, N_FOLDS);
    let sizes: Vec<usize> = outer.iter().map(|r| r.len()).collect();
    assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);

    for k in 0..N_FOLDS {
        let f = TrialFolds::new(n, k).unwrap();
        for r in &outer {
            let got: BTreeSet<usize> = f
                .train
                .iter()
                .chain(&f.valid)
                .chain(&f.test)
                .copied()
                .filter(|t| r.contains(t))
                .collect();
            assert_eq!(got, r.clone().collect::<BTreeSet<_>>(), "k={k}");
        }
    }
}

#[test]
fn fold_index_changes_assignment() {
    let a = TrialFolds::new(30, 0).unwrap();
    let b = TrialFolds::new(30, 1).unwrap();
    let c = TrialFolds::new(30, 2).unwrap();
    assert_ne!(a.test, b.test);
    assert_ne!(b.test, c.test);
    assert_eq!(a.train.len() + a.valid.len() + a.test.len(), 30);
}

#[test]
fn all_split_returns_recording_unchanged() {
    let original = rat(12, 10);
    let ds = TrialSplitDataset::new(original.clone(), 1, Some(Split::All)).unwrap();
    assert_eq!(ds.trials(), (0..12).collect::<Vec<_>>().as_slice());
    assert_eq!(ds.neural(), original.neural());
    assert_eq!(ds.continuous_index(), original.continuous_index());
    assert!(ds.concat_idx().is_empty());
}

#[test]
fn wo_test_excludes_exactly_the_test_trials() {
    let base = rat(27, 8);
    for k in 0..N_FOLDS {
        let wo = TrialSplitDataset::new(base.clone(), k, Some(Split::WoTest)).unwrap();
        let test = TrialSplitDataset::new(base.clone(), k, Some(Split::Test)).unwrap();
        let f = TrialFolds::new(27, k).unwrap();

        let wo_set: BTreeSet<usize> = wo.trials().iter().copied().collect();
        let expected: BTreeSet<usize> = f.train.iter().chain(&f.valid).copied().collect();
        assert_eq!(wo_set, expected);
        assert!(test.trials().iter().all(|t| !wo_set.contains(t)));
        assert_eq!(wo.len() + test.len(), base.len());
    }
}

#[test]
fn concatenated_rows_follow_trial_order() {
    let base = rat(18, 9);
    let bounds = trial_boundaries(base.continuous_index()).unwrap();
    let ds = TrialSplitDataset::new(base.clone(), 2, Some(Split::Train)).unwrap();

    let mut row = 0;
    for (&t, r) in ds.trials().iter().zip(ds.selected_indices()) {
        assert_eq!(*r, bounds[t]..bounds[t + 1]);
        for src in r.clone() {
            assert_eq!(ds.neural().row(row), base.neural().row(src));
            row += 1;
        }
    }
    assert_eq!(row, ds.len());
}

#[test]
fn seams_sit_between_non_consecutive_trials() {
    let base = rat(18, 9);
    let ds = TrialSplitDataset::new(base, 0, Some(Split::Train)).unwrap();
    let trials = ds.trials();
    let ranges = ds.selected_indices();

    let mut expected = Vec::new();
    let mut cum = 0;
    for j in 0..trials.len() - 1 {
        cum += ranges[j].len();
        if trials[j] + 1 != trials[j + 1] {
            expected.push(cum);
        }
    }
    assert_eq!(ds.concat_idx(), expected.as_slice());
    assert!(!expected.is_empty());
}

#[test]
fn invalid_split_name_leaves_dataset_untouched() {
    let base = rat(12, 8);
    let mut ds = TrialSplitDataset::new(base.clone(), 0, None).unwrap();
    let err = ds.split_by_name("bogus").unwrap_err();
    assert_eq!(err, DatasetError::InvalidSplit("bogus".into()));
    assert!(err.to_string().contains("'train'"));
    assert_eq!(ds.neural(), base.neural());
    assert_eq!(ds.continuous_index(), base.continuous_index());
    assert!(ds.split_name().is_none());
}

#[test]
fn failed_split_leaves_dataset_untouched() {
    // 4 trials cannot be nested-split, but "all" still works.
    let base = rat(4, 8);
    let mut ds = TrialSplitDataset::new(base.clone(), 0, None).unwrap();
    assert!(matches!(ds.split(Split::Train), Err(DatasetError::TooFewTrials { .. })));
    assert_eq!(ds.neural(), base.neural());
    ds.split(Split::All).unwrap();
    assert_eq!(ds.trials(), &[0, 1, 2, 3]);
}

#[test]
fn fold_index_out_of_range_is_rejected() {
    let err = TrialSplitDataset::new(rat(12, 8), 3, Some(Split::Train)).unwrap_err();
    assert_eq!(err, DatasetError::FoldIndex(3));
}

/// Row offsets where consecutive neural rows were not consecutive in the
/// recording (`spikes` rows increase by the channel count).
fn row_jumps(ds: &TrialSplitDataset) -> Vec<usize> {
    let n = ds.neural();
    let step = n.ncols() as f32;
    (1..n.nrows()).filter(|&r| n[[r, 0]] - n[[r - 1, 0]] != step).collect()
}

#[test]
fn switching_splits_keeps_every_seam() {
    let base = rat(18, 9);
    let mut ds = TrialSplitDataset::new(base.clone(), 0, Some(Split::Train)).unwrap();
    assert_eq!(ds.concat_idx(), row_jumps(&ds).as_slice());

    ds.split(Split::All).unwrap();
    assert_eq!(ds.concat_idx(), row_jumps(&ds).as_slice());
    assert_eq!(ds.neural(), base.neural());

    ds.split(Split::Valid).unwrap();
    assert_eq!(ds.concat_idx(), row_jumps(&ds).as_slice());
    assert_eq!(ds.trials(), TrialFolds::new(18, 0).unwrap().valid.as_slice());
}
