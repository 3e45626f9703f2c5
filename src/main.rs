//! tabstat: Naive Bayes and correlation CLI tool
//!
//! Learns Naive Bayes models, scores tables against them, and reduces
//! columns by pairwise correlation.

use anyhow::Result;
use clap::Parser;

use tabstat::cli::{run_correlate, run_filter, run_learn, run_predict, Cli, Commands};
use tabstat::utils::{init_tracing, print_banner};

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    print_banner(env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Learn(args) => run_learn(args, cli.infer_schema_length),
        Commands::Predict(args) => run_predict(args, cli.infer_schema_length),
        Commands::Correlate(args) => run_correlate(args, cli.infer_schema_length),
        Commands::Filter(args) => run_filter(args, cli.infer_schema_length),
    }
}
