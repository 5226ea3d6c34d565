//! Dataset configuration.
//!
//! [`DatasetConfig`] names one rat, where its archive lives, and which trial
//! split to materialise.  [`DecodeConfig`] holds the kNN sweep.

use std::path::PathBuf;

use crate::trial::Split;
use crate::window::Offset;

/// Environment variable overriding the default data root.
pub const DATA_DIR_ENV: &str = "HIPPODATA_DIR";

/// The four rats of the linear-track recordings.
pub const RATS: [&str; 4] = ["achilles", "buddy", "cicero", "gatsby"];

/// Data root: `$HIPPODATA_DIR` if set, else `./data`.
pub fn default_data_root() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Configuration for loading one rat recording.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use hippodata::{DatasetConfig, Split};
///
/// let cfg = DatasetConfig {
///     name:     "cicero".into(),
///     split_no: 2,
///     split:    Some(Split::Valid),
///     ..DatasetConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Rat name; the archive is `{root}/rat_hippocampus/{name}.safetensors`.
    ///
    /// Default: `"achilles"`.
    pub name: String,

    /// Data root directory.
    ///
    /// Default: [`default_data_root()`].
    pub root: PathBuf,

    /// Nested cross-validation fold, `0`, `1` or `2`.
    ///
    /// Default: `0`.
    pub split_no: usize,

    /// Subset to keep.  `None` keeps the full recording untouched (no
    /// trial bookkeeping).
    ///
    /// Default: `None`.
    pub split: Option<Split>,

    /// Context window used by `SingleSession::get`.
    ///
    /// Default: 5 bins left, 5 bins right.
    pub offset: Offset,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: RATS[0].to_string(),
            root: default_data_root(),
            split_no: 0,
            split: None,
            offset: Offset::default(),
        }
    }
}

/// kNN decoding sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Neighbour counts to evaluate, in order.
    ///
    /// Default: squares of 1..=6 → `[1, 4, 9, 16, 25, 36]`.
    pub neighbors: Vec<usize>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self { neighbors: (1..=6).map(|k| k * k).collect() }
    }
}
