/// Shared helpers: synthetic linear-track recordings.
use hippodata::RecordingArrays;
use ndarray::Array2;
use std::path::Path;

#[allow(unused)]
/// Lap lengths `base, base + 1, base + 2, base, …` so trials differ in size.
pub fn lap_lengths(n_trials: usize, base: usize) -> Vec<usize> {
    (0..n_trials).map(|i| base + i % 3).collect()
}

#[allow(unused)]
/// `[T, 2]` behaviour: position sweeps 0 → 1 → 0 over each lap, direction is
/// +1 on the outbound half and −1 on the way back.
pub fn behavior(laps: &[usize]) -> Array2<f32> {
    let t: usize = laps.iter().sum();
    let mut out = Array2::<f32>::zeros((t, 2));
    let mut row = 0;
    for &lap in laps {
        let half = lap / 2;
        for k in 0..lap {
            let (pos, dir) = if k < half {
                (k as f32 / half as f32, 1.0)
            } else {
                (1.0 - (k - half) as f32 / (lap - half) as f32, -1.0)
            };
            out[[row, 0]] = pos;
            out[[row, 1]] = dir;
            row += 1;
        }
    }
    out
}

#[allow(unused)]
/// `[T, C]` fake spike counts; each row is unique so row order is checkable.
pub fn spikes(t: usize, n_neurons: usize) -> Array2<f32> {
    Array2::from_shape_fn((t, n_neurons), |(r, c)| (r * n_neurons + c) as f32)
}

#[allow(unused)]
/// Write `{root}/rat_hippocampus/{name}.safetensors` and return the arrays.
pub fn write_rat(root: &Path, name: &str, n_trials: usize, base_lap: usize, n_neurons: usize) -> RecordingArrays {
    let position = behavior(&lap_lengths(n_trials, base_lap));
    let rec = RecordingArrays { spikes: spikes(position.nrows(), n_neurons), position };
    let path = hippodata::recording_path(root, name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    rec.save(&path).unwrap();
    rec
}
