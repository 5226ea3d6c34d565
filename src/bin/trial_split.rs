/// trial_split: load one rat recording, apply a 3-fold nested trial split,
/// and optionally write the result to a safetensors file.
///
/// Output keys:
///   neural       [T', C]  f32  spike counts of the kept trials
///   index        [T', 2]  f32  (position, direction) of the kept trials
///   trials       [K]      i32  kept trial indices in row order
///   concat_idx   [S]      i32  row offsets of seams between non-adjacent trials
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use hippodata::{default_data_root, io::StWriter, DatasetConfig, SingleSession, Split, TrialSplitDataset};

#[derive(Parser, Debug)]
#[command(name = "trial_split", about = "Rat hippocampus 3-fold nested trial split")]
struct Args {
    /// Rat name (achilles, buddy, cicero, gatsby).
    #[arg(long, default_value = "achilles")]
    name: String,

    /// Data root holding rat_hippocampus/{name}.safetensors.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Nested cross-validation fold (0, 1 or 2).
    #[arg(long, default_value_t = 0)]
    split_no: usize,

    /// Subset: train, valid, test, all, wo_test.
    #[arg(long, default_value = "all")]
    split: String,

    /// Optional safetensors output path.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let split: Split = args.split.parse()?;

    let cfg = DatasetConfig {
        name: args.name,
        root: args.root.unwrap_or_else(default_data_root),
        split_no: args.split_no,
        split: Some(split),
        ..DatasetConfig::default()
    };

    let ds = TrialSplitDataset::load(&cfg)?;
    println!("{ds}");
    println!(
        "  {} trials  {} seams  {} windows of {} bins",
        ds.trials().len(),
        ds.concat_idx().len(),
        ds.valid_indices(cfg.offset).len(),
        cfg.offset.len()
    );

    if let Some(out) = args.output {
        let mut w = StWriter::new();
        w.add_arr2("neural", ds.neural());
        w.add_arr2("index", ds.continuous_index());
        w.add_indices("trials", ds.trials())?;
        w.add_indices("concat_idx", ds.concat_idx())?;
        w.write(&out)?;
        println!("Written → {}", out.display());
    }

    Ok(())
}
