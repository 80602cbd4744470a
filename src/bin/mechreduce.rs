//! Command-line front end, mainly for end-to-end testing.
//!
//! Usage: `mechreduce <METHOD>` with the graph on stdin, whitespace
//! separated:
//!
//! ```text
//! threshold sourcesCount src0 src1 ... size edgesCount (from to coef) * edgesCount
//! ```
//!
//! The kept species indices are printed to stdout, space separated, with a
//! trailing newline. Exit code 0 on success, 1 on a missing method
//! argument, non-zero on any out-of-range or malformed input.

use std::io::Read;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;

use mechreduce::{logging, ReductionMethod, SpeciesGraph};

#[derive(Parser)]
#[command(name = "mechreduce", about = "Reduce a species-coupling graph read from stdin")]
struct Cli {
    /// Reduction method: DRG, DRGEP or PFA.
    method: String,
}

fn main() -> ExitCode {
    logging::init();

    let Ok(cli) = Cli::try_parse() else {
        eprintln!("usage: mechreduce <DRG|DRGEP|PFA>");
        return ExitCode::from(1);
    };

    match run(&cli.method) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mechreduce: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(method: &str) -> anyhow::Result<()> {
    let method: ReductionMethod = method.parse()?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading stdin")?;
    let mut tokens = input.split_whitespace();

    let mut next = |what: &'static str| {
        tokens
            .next()
            .ok_or_else(|| anyhow!("unexpected end of input, expected {what}"))
    };

    let threshold: f64 = next("threshold")?.parse().context("parsing threshold")?;
    let sources_count: usize = next("sources count")?.parse().context("parsing sources count")?;
    let mut sources = Vec::with_capacity(sources_count);
    for _ in 0..sources_count {
        sources.push(next("source index")?.parse::<usize>().context("parsing source")?);
    }

    let size: usize = next("size")?.parse().context("parsing size")?;
    let edges_count: usize = next("edges count")?.parse().context("parsing edges count")?;

    let mut dense = vec![vec![0.0f64; size]; size];
    for _ in 0..edges_count {
        let from: usize = next("edge source")?.parse().context("parsing edge source")?;
        let to: usize = next("edge target")?.parse().context("parsing edge target")?;
        let coef: f64 = next("edge coefficient")?
            .parse()
            .context("parsing edge coefficient")?;
        if from >= size || to >= size {
            return Err(anyhow!("edge ({from}, {to}) is out of range for size {size}"));
        }
        if coef != 0.0 {
            dense[from][to] = coef;
        }
    }

    let mut graph = SpeciesGraph::new(size)?;
    for (idx, row) in dense.iter().enumerate() {
        graph.add_row(row, idx)?;
    }
    graph.finalize()?;

    let kept = graph.run_reducing(method, threshold, &sources)?;

    let rendered: Vec<String> = kept.iter().map(ToString::to_string).collect();
    println!("{}", rendered.join(" "));
    Ok(())
}
