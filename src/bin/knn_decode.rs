/// knn_decode: score embeddings against behaviour labels with the kNN sweep.
///
/// Input keys (2-D tensors, any of F32/F64/I32/I64):
///   x_train  [N, D]   y_train  [N, L]
///   x_test   [M, D]   y_test   [M, L]
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use hippodata::{decode, io::read_all_arr2, DecodeConfig};

#[derive(Parser, Debug)]
#[command(name = "knn_decode", about = "kNN decoding of position from embeddings")]
struct Args {
    /// safetensors file with x_train, y_train, x_test, y_test.
    #[arg(long)]
    input: PathBuf,

    /// Neighbour counts (comma-separated); default is 1,4,9,16,25,36.
    #[arg(long, value_delimiter = ',')]
    neighbors: Vec<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let arrays = read_all_arr2(&args.input)?;
    let get = |k: &str| arrays.get(k).with_context(|| format!("missing '{k}' in {}", args.input.display()));

    let cfg = if args.neighbors.is_empty() {
        DecodeConfig::default()
    } else {
        DecodeConfig { neighbors: args.neighbors.clone() }
    };

    let metrics = decode(get("x_train")?, get("y_train")?, get("x_test")?, get("y_test")?, &cfg)?;
    for &k in &cfg.neighbors {
        println!(
            "n={k:>3}  median |Δpos| = {:.4}  R² = {:.4}",
            metrics[&format!("n{k}_err")],
            metrics[&format!("n{k}_r2")]
        );
    }
    Ok(())
}
