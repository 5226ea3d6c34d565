//! Safetensors I/O for recordings and split exports.
//!
//! Reader: parses a per-rat archive `rat_hippocampus/{name}.safetensors`
//! holding `spikes` `[T, C]` and `position` `[T, 2]`.
use anyhow::{bail, ensure, Context, Result};
use ndarray::Array2;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ── Low-level safetensors parser (raw bytes → ndarray, no tensor types). ─────

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, Value>, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len_bytes);
    let end = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_add(8))
        .filter(|&end| end <= bytes.len())
        .with_context(|| format!("safetensors header truncated ({n} bytes announced, file has {})", bytes.len()))?;
    let header: HashMap<String, Value> =
        serde_json::from_slice(&bytes[8..end]).context("failed to parse safetensors header")?;
    Ok((header, end))
}

fn shape_of(name: &str, entry: &Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .with_context(|| format!("'{name}': missing shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).with_context(|| format!("'{name}': bad shape entry")))
        .collect()
}

fn byte_range(name: &str, entry: &Value, data_start: usize, total: usize) -> Result<(usize, usize)> {
    let offsets = entry["data_offsets"]
        .as_array()
        .with_context(|| format!("'{name}': missing data_offsets"))?;
    ensure!(offsets.len() == 2, "'{name}': data_offsets must have 2 entries");
    let absolute = |v: &Value| {
        v.as_u64()
            .and_then(|o| usize::try_from(o).ok())
            .and_then(|o| o.checked_add(data_start))
            .with_context(|| format!("'{name}': data offset {v} out of range"))
    };
    let (s, e) = (absolute(&offsets[0])?, absolute(&offsets[1])?);
    ensure!(s <= e && e <= total, "'{name}': data range {s}..{e} outside file of {total} bytes");
    Ok((s, e))
}

/// Read tensor `name` as a 2-D `f32` array, converting from F32/F64/I32/I64/U8.
fn read_arr2(bytes: &[u8], data_start: usize, header: &HashMap<String, Value>, name: &str) -> Result<Array2<f32>> {
    let entry = header.get(name).with_context(|| format!("missing '{name}' key"))?;
    let shape = shape_of(name, entry)?;
    ensure!(shape.len() == 2, "'{name}': expected 2-D tensor, got shape {shape:?}");
    let (s, e) = byte_range(name, entry, data_start, bytes.len())?;
    let raw = &bytes[s..e];

    let dtype = entry["dtype"].as_str().with_context(|| format!("'{name}': missing dtype"))?;
    let vals: Vec<f32> = match dtype {
        "F32" => raw.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect(),
        "F64" => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
        "I32" => raw.chunks_exact(4).map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32).collect(),
        "I64" => raw
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
        "U8" => raw.iter().map(|&b| b as f32).collect(),
        other => bail!("'{name}': unsupported dtype {other}"),
    };
    Array2::from_shape_vec((shape[0], shape[1]), vals).with_context(|| format!("'{name}': data does not match shape"))
}

// ── Public structs ────────────────────────────────────────────────────────────

/// Path of the archive for rat `name` under data root `root`.
pub fn recording_path(root: &Path, name: &str) -> PathBuf {
    root.join("rat_hippocampus").join(format!("{name}.safetensors"))
}

/// Arrays of one recording session.
#[derive(Debug, Clone)]
pub struct RecordingArrays {
    /// [T, C] spike counts per 25 ms bin.
    pub spikes: Array2<f32>,
    /// [T, 2] (position in metres, running direction).
    pub position: Array2<f32>,
}

impl RecordingArrays {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (header, data_start) = parse_header(bytes)?;
        let spikes = read_arr2(bytes, data_start, &header, "spikes")?;
        let position = read_arr2(bytes, data_start, &header, "position")?;
        ensure!(
            spikes.nrows() == position.nrows(),
            "spikes has {} rows but position has {}",
            spikes.nrows(),
            position.nrows()
        );
        ensure!(position.ncols() >= 2, "position needs 2 columns, got {}", position.ncols());
        Ok(Self { spikes, position })
    }

    /// Write back in the layout [`RecordingArrays::load`] reads.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut w = StWriter::new();
        w.add_arr2("spikes", &self.spikes).add_arr2("position", &self.position);
        w.write(path)
    }
}

// ── Split export writer ───────────────────────────────────────────────────────

/// Safetensors writer for recordings and split bookkeeping.
///
/// Float arrays are stored as F32, integer arrays and index lists as I32.
///
/// ```rust,no_run
/// use hippodata::io::StWriter;
/// use ndarray::array;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_arr2("position", &array![[0.1_f32, 1.0], [0.2, 1.0]]);
/// w.add_indices("concat_idx", &[120, 480]).unwrap();
/// w.write(Path::new("/tmp/split.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    tensors: Vec<(String, &'static str, Vec<usize>, Vec<u8>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, dtype: &'static str, shape: Vec<usize>, bytes: Vec<u8>) -> &mut Self {
        self.tensors.push((name.to_string(), dtype, shape, bytes));
        self
    }

    /// `[R, C]` float array as F32.
    pub fn add_arr2(&mut self, name: &str, arr: &Array2<f32>) -> &mut Self {
        let bytes = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "F32", vec![arr.nrows(), arr.ncols()], bytes)
    }

    /// `[R, C]` count array as I32 (e.g. raw spike counts).
    pub fn add_counts(&mut self, name: &str, arr: &Array2<i32>) -> &mut Self {
        let bytes = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "I32", vec![arr.nrows(), arr.ncols()], bytes)
    }

    /// Index list (trials, seams) as a 1-D I32 tensor.
    pub fn add_indices(&mut self, name: &str, idx: &[usize]) -> Result<&mut Self> {
        let bytes = idx
            .iter()
            .map(|&i| {
                i32::try_from(i)
                    .map(i32::to_le_bytes)
                    .with_context(|| format!("'{name}': index {i} exceeds i32"))
            })
            .collect::<Result<Vec<_>>>()?
            .concat();
        Ok(self.push(name, "I32", vec![idx.len()], bytes))
    }

    /// Serialised file contents: length-prefixed JSON header, then tensor data.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = serde_json::Map::new();
        let mut offset = 0usize;
        for (name, dtype, shape, bytes) in &self.tensors {
            let entry = serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + bytes.len()],
            });
            header.insert(name.clone(), entry);
            offset += bytes.len();
        }
        let mut hdr = serde_json::to_vec(&header)?;
        // Data section starts on an 8-byte boundary.
        hdr.resize(hdr.len().next_multiple_of(8), b' ');

        let mut out = Vec::with_capacity(8 + hdr.len() + offset);
        out.extend_from_slice(&(hdr.len() as u64).to_le_bytes());
        out.extend_from_slice(&hdr);
        for (_, _, _, bytes) in &self.tensors {
            out.extend_from_slice(bytes);
        }
        Ok(out)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?).with_context(|| format!("writing {}", path.display()))
    }
}

/// Read every 2-D tensor of a safetensors file as `f32`, keyed by name.
///
/// Used for embedding / label files handed to the decoder.
pub fn read_all_arr2(path: &Path) -> Result<HashMap<String, Array2<f32>>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;
    let mut out = HashMap::new();
    for (name, entry) in &header {
        if name == "__metadata__" || shape_of(name, entry).map(|s| s.len() != 2).unwrap_or(true) {
            continue;
        }
        out.insert(name.clone(), read_arr2(&bytes, data_start, &header, name)?);
    }
    Ok(out)
}
