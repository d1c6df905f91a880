//! Entry point: wires argument parsing, ingestion, event generation and
//! reporting together (spec.md §4.5), the Rust counterpart of `main()` in
//! `examples/original_source/main.cpp`.

mod cli;
mod events;
mod ingest;
mod report;
mod schema;

use std::fs;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use dynatree_core::{Tree, TreeConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cli::{Cli, Mode};
use events::{random_sampling_events, sliding_window_events};
use ingest::{point_from_row, Interner};
use schema::Schema;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse header: {0}")]
    Schema(#[from] schema::SchemaError),
    #[error("could not parse a data row: {0}")]
    Ingest(#[from] ingest::IngestError),
    #[error("the data file is empty or contains only the header")]
    EmptyFile,
    #[error(transparent)]
    Tree(#[from] dynatree_core::TreeError),
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let contents = fs::read_to_string(&cli.file_name)?;
    let mut lines = contents.lines();
    if cli.skip_first_line {
        lines.next();
    }
    let header_line = lines.next().ok_or(CliError::EmptyFile)?;
    let schema = Schema::parse(header_line, cli.delimiter)?;

    let mut interner = Interner::new(schema.dimension());
    let mut rows = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        rows.push(point_from_row(line, cli.delimiter, &schema, &cli.label_true_value, &mut interner)?);
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let min_split_points = cli.min_split_points;
    let min_split_gini = cli.min_split_gini;
    let epsilon = cli
        .epsilon
        .unwrap_or_else(|| (min_split_gini / 6.0).min(1.0 / (min_split_points as f64 + 2.0)) as f32);
    let epsilon_transmission = cli.epsilon_transmission.unwrap_or(epsilon);
    let epsilon_max = cli.epsilon_max.unwrap_or(epsilon);

    let (initial_points, raw_events) = match cli.test_type {
        Mode::Sliding => sliding_window_events(&rows, cli.dataset_size, cli.eval_proba, &mut rng),
        Mode::Random => random_sampling_events(
            rows,
            cli.dataset_size,
            cli.eval_proba,
            cli.nb_updates,
            cli.insert_proba,
            &mut rng,
        ),
    };

    let config = TreeConfig {
        dimension: schema.dimension(),
        feature_kinds: schema.feature_kinds.clone(),
        max_height: cli.max_height,
        epsilon,
        epsilon_transmission,
        min_split_points,
        min_split_gini,
    };

    let t1 = Instant::now();
    let reference_tree = Tree::new(config, initial_points)?;
    let init_time = t1.elapsed();

    if !cli.is_output_csv {
        println!("{}", reference_tree.render());
    }

    let mut current_epsilon = epsilon;
    while current_epsilon <= epsilon_max {
        let current_transmission = if cli.epsilon_transmission.is_none() { current_epsilon } else { epsilon_transmission };
        let mut current_tree = reference_tree.clone_with_epsilon(current_epsilon, current_transmission);

        let t3 = Instant::now();
        let result = report::run_events(&mut current_tree, &raw_events);
        let iter_time = t3.elapsed();
        let builds = current_tree.build_counter().get();

        if cli.is_output_csv {
            println!("{}", report::render_csv_row(seed, current_epsilon, &result, init_time, iter_time, builds));
        } else {
            print!("{}", report::render_human(&current_tree, &result, init_time, iter_time, builds));
        }

        current_epsilon += cli.epsilon_step;
    }

    Ok(())
}
