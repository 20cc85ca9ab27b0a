//! Writes correlated multivariate normal demo data.
//!
//! `x = A z` with `A` and `z` standard normal, so the columns have
//! covariance `A Aᵀ` and a dense web of correlations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use correlnet::embed::random::gauss;
use parquet::arrow::ArrowWriter;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generate random data to demonstrate correlnet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of observations.
    #[arg(short = 'n', default_value_t = 200)]
    n: usize,

    /// Number of variables.
    #[arg(short = 'p', default_value_t = 50)]
    p: usize,

    /// Output path (.csv or .parquet).
    #[arg(short, long, default_value = "demo_data.csv")]
    output: PathBuf,

    #[arg(long, default_value_t = 19)]
    seed: u64,
}

fn generate(n: usize, p: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mixing: Vec<Vec<f64>> = (0..p)
        .map(|_| (0..p).map(|_| gauss(&mut rng)).collect())
        .collect();

    let mut columns = vec![Vec::with_capacity(n); p];
    for _ in 0..n {
        let z: Vec<f64> = (0..p).map(|_| gauss(&mut rng)).collect();
        for (col, row) in columns.iter_mut().zip(&mixing) {
            col.push(row.iter().zip(&z).map(|(a, b)| a * b).sum());
        }
    }
    columns
}

fn column_names(p: usize) -> Vec<String> {
    (1..=p).map(|i| format!("x_{i:02}")).collect()
}

fn write_csv(path: &Path, names: &[String], columns: &[Vec<f64>]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).context("creating CSV output")?;
    wtr.write_record(names)?;
    let n = columns.first().map_or(0, Vec::len);
    for row in 0..n {
        wtr.write_record(columns.iter().map(|c| c[row].to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, names: &[String], columns: Vec<Vec<f64>>) -> Result<()> {
    let schema = Arc::new(Schema::new(
        names
            .iter()
            .map(|name| Field::new(name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = columns
        .into_iter()
        .map(|c| Arc::new(Float64Array::from(c)) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing Parquet batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    if args.n < 2 || args.p == 0 {
        bail!("need at least 2 observations and 1 variable (got n={}, p={})", args.n, args.p);
    }
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    log::info!("generating normal data ({} x {})", args.n, args.p);
    let names = column_names(args.p);
    let columns = generate(args.n, args.p, args.seed);

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(&args.output, &names, columns)?,
        "csv" => write_csv(&args.output, &names, &columns)?,
        other => bail!("Unsupported output extension: .{other}"),
    }
    log::info!("wrote {}", args.output.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("Error: {e:#}");
        std::process::exit(1);
    }
}
