// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::*;

use cfknn::records::{read_matrix, read_queries, write_predictions};
use cfknn::{Algorithm, BatchRunner, PoolKind, PredictorConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "neighborhood collaborative filtering")]
struct Cli {
    /// Command
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
enum Command {
    /// Predict the requested ratings of a query file
    Predict {
        /// Training matrix, one user per line
        #[arg(long)]
        train: PathBuf,
        /// Query triples (user item rating), rating 0 to predict
        #[arg(long)]
        queries: PathBuf,
        /// Output file (defaults to standard output)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JSON predictor configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
        /// Write each finished user back before predicting the next
        #[arg(long)]
        progressive: bool,
        /// Candidate neighbors for user-based variants
        #[arg(long)]
        pool: Option<PoolKind>,
        #[arg(long)]
        max_neighbors: Option<usize>,
        /// Exponent for case amplification
        #[arg(long)]
        case_exponent: Option<f64>,
    },
    /// List the prediction algorithms
    Algorithms,
}

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let cli = Cli::parse();
    execute_command(cli.command)
}

fn execute_command(command: Command) -> Result<()> {
    match command {
        Command::Predict {
            train,
            queries,
            output,
            config,
            algorithm,
            progressive,
            pool,
            max_neighbors,
            case_exponent,
        } => {
            let mut cfg = match config {
                Some(path) => load_config(&path)?,
                None => PredictorConfig::default(),
            };
            if let Some(algorithm) = algorithm {
                cfg.algorithm = algorithm;
            }
            if progressive {
                cfg.progressive = true;
            }
            if let Some(pool) = pool {
                cfg.pool = pool;
            }
            if max_neighbors.is_some() {
                cfg.max_neighbors = max_neighbors;
            }
            if let Some(p) = case_exponent {
                cfg.case_exponent = p;
            }
            handle_predict(&train, &queries, output.as_deref(), cfg)
        }
        Command::Algorithms => handle_algorithms(),
    }
}

fn load_config(path: &Path) -> Result<PredictorConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    PredictorConfig::from_json(&text)
        .with_context(|| format!("invalid config file {}", path.display()))
}

fn handle_predict(
    train: &Path,
    queries: &Path,
    output: Option<&Path>,
    config: PredictorConfig,
) -> Result<()> {
    let file = File::open(train)
        .with_context(|| format!("cannot open training file {}", train.display()))?;
    let matrix = read_matrix(BufReader::new(file), &config.scale)
        .with_context(|| format!("cannot parse training file {}", train.display()))?;

    let file = File::open(queries)
        .with_context(|| format!("cannot open query file {}", queries.display()))?;
    let queries = read_queries(BufReader::new(file), &config.scale)
        .with_context(|| format!("cannot parse query file {}", queries.display()))?;

    let mut runner = BatchRunner::new(&matrix, config);
    let predictions = runner.run_queries(queries).context("prediction failed")?;
    info!("predicted {} ratings", predictions.len());

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            write_predictions(BufWriter::new(file), &predictions)
                .with_context(|| format!("cannot write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            write_predictions(stdout.lock(), &predictions).context("cannot write predictions")?;
        }
    }
    Ok(())
}

fn handle_algorithms() -> Result<()> {
    let mut out = io::stdout().lock();
    for algorithm in Algorithm::ALL {
        let marker = if algorithm == Algorithm::default() {
            " (default)"
        } else {
            ""
        };
        writeln!(out, "{}{}", algorithm, marker)?;
    }
    Ok(())
}
