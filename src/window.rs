//! Fixed-width temporal context windows.
//!
//! Sample `i` is the block of rows `[i - left, i + right)` of the neural
//! array, returned transposed as `[C, left + right]` so a batch is
//! `[N, C, window]`.  After a trial split the rows are a concatenation of
//! non-adjacent trials; `concat_idx` marks those seams and no window may
//! straddle one.
use anyhow::{bail, Result};
use ndarray::{s, Array2, Array3};

/// Context around a sample index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    /// Rows taken before the index.
    pub left: usize,
    /// Rows taken from the index onwards (the index itself included).
    pub right: usize,
}

impl Offset {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    /// Window length `left + right`.
    pub fn len(&self) -> usize {
        self.left + self.right
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Offset {
    /// 10-bin window (250 ms at 25 ms bins) centred on the index.
    fn default() -> Self {
        Self { left: 5, right: 5 }
    }
}

/// Contiguous row segments `[start, end)` delimited by `concat_idx`.
pub fn segments(len: usize, concat_idx: &[usize]) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(concat_idx.len() + 2);
    edges.push(0);
    edges.extend(concat_idx.iter().copied().filter(|&c| c > 0 && c < len));
    edges.push(len);
    edges.windows(2).map(|w| (w[0], w[1])).filter(|(a, b)| b > a).collect()
}

/// Indices whose window lies entirely inside one segment.
pub fn valid_indices(len: usize, concat_idx: &[usize], offset: Offset) -> Vec<usize> {
    segments(len, concat_idx)
        .into_iter()
        .flat_map(|(start, end)| {
            let lo = start + offset.left;
            let hi = (end + 1).saturating_sub(offset.right.max(1));
            lo..hi.max(lo)
        })
        .collect()
}

/// Whether the window around `index` lies inside `0..len` without
/// straddling any seam in `concat_idx`.
pub fn window_fits(len: usize, concat_idx: &[usize], index: usize, offset: Offset) -> bool {
    if index < offset.left || index + offset.right > len {
        return false;
    }
    let (a, b) = (index - offset.left, index + offset.right);
    !concat_idx.iter().any(|&c| a < c && c < b)
}

/// Gather windows for `indices` from `neural` (`[T, C]`) into `[N, C, window]`.
///
/// # Errors
///
/// Returns an error if any window reaches outside `0..T`.  Use
/// [`valid_indices`] to restrict sampling to windows that also respect
/// trial seams.
pub fn expand_index(neural: &Array2<f32>, indices: &[usize], offset: Offset) -> Result<Array3<f32>> {
    let (n_t, n_ch) = neural.dim();
    let width = offset.len();

    let mut out = Array3::<f32>::zeros((indices.len(), n_ch, width));
    for (k, &i) in indices.iter().enumerate() {
        if i < offset.left || i + offset.right > n_t {
            bail!(
                "window for index {i} ({} before, {} after) leaves recording of length {n_t}",
                offset.left,
                offset.right
            );
        }
        let start = i - offset.left;
        out.slice_mut(s![k, .., ..])
            .assign(&neural.slice(s![start..start + width, ..]).t());
    }
    Ok(out)
}
