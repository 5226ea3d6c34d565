//! # hippodata — rat hippocampus recordings for representation learning
//!
//! Loads tetrode recordings of rats running on a linear track (spike counts
//! in 25 ms bins, labelled with position and running direction), carves them
//! into trial-based train / valid / test sets, serves fixed-width context
//! windows, and scores embeddings with a kNN decoder.
//!
//! ## Trial split overview
//!
//! ```text
//! position/direction [T, 2]
//!   │
//!   ├─ trial::trial_boundaries()   every 2nd direction change → [0, …, T]
//!   ├─ trial::array_split()        trials → 3 contiguous outer folds
//!   ├─ trial::kfold()              per outer fold: train / held-out (split_no)
//!   │                              held-out → test (1st half) + valid (2nd half)
//!   ├─ trial::TrialFolds::select() train | valid | test | all | wo_test
//!   └─ trial::concat_offsets()     seams where non-adjacent trials meet
//!        │
//!        └─→ TrialSplitDataset  (neural [T', C], index [T', 2], concat_idx)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use hippodata::{DatasetConfig, SingleSession, Split, TrialSplitDataset};
//!
//! let cfg = DatasetConfig {
//!     name:  "achilles".into(),
//!     split: Some(Split::Train),
//!     ..DatasetConfig::default()
//! };
//! let train = TrialSplitDataset::load(&cfg).unwrap();
//! println!("{train}");
//!
//! // Windows never straddle a trial seam.
//! let idx = train.valid_indices(cfg.offset);
//! let batch = train.get(&idx[..32], cfg.offset).unwrap();  // [32, C, 10]
//! ```
//!
//! ## Running the splitter alone
//!
//! ```
//! use hippodata::trial::{split_trials, Split};
//! use ndarray::Array2;
//!
//! // direction + + - - + + -   → boundaries [0, 3, 7]
//! let dirs = [1.0_f32, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0];
//! let behavior = Array2::from_shape_fn((7, 2), |(t, c)| if c == 0 { 0.0 } else { dirs[t] });
//!
//! let sel = split_trials(&behavior, 0, Split::All).unwrap();
//! assert_eq!(sel.row_ranges, vec![0..3, 3..7]);
//! assert!(sel.concat_idx.is_empty());
//! ```

pub mod collection;
pub mod config;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod io;
pub mod trial;
pub mod window;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{default_data_root, DatasetConfig, DecodeConfig, DATA_DIR_ENV, RATS};

// dataset
pub use collection::MultiRatDataset;
pub use dataset::{corrupt_labels, RatDataset, SingleSession, TrialSplitDataset};

// decode
pub use decode::{decode, r2_score, DecodeMetrics, KnnRegressor};

// error
pub use error::{DatasetError, DatasetResult};

// io
pub use io::{read_all_arr2, recording_path, RecordingArrays, StWriter};

// trial
pub use trial::{
    array_split, concat_offsets, direction_changes, kfold, select_trials, split_trials,
    trial_boundaries, Split, TrialFolds, TrialSelection, N_FOLDS,
};

// window
pub use window::{expand_index, valid_indices, window_fits, Offset};
