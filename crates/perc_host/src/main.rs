use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use perc_common::gates::Gate;
use perc_core::config::{Lattice, Probabilities};
use perc_core::pipeline::{resolve_grid, run_sample};
use perc_core::rules::SpiderRules;
use perc_core::sampler::sample_gate_grid;
use perc_host::sweep::{FileCheckpoint, SweepConfig, run_sweep};
use perc_host::workers::{plan_workers, run_workers};
use perc_host::{check, stats};
use perc_io::grid_file::{load_grid_file, save_grid_file};
use perc_io::naming::reserve_data_name;
use perc_io::summary::{SUMMARY_FILE, load_dir, write_summary};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Measurement-induced percolation in random brickwork circuits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct LatticeArgs {
    /// Number of wires (even)
    #[arg(short = 'n', long = "size", default_value_t = 40)]
    n: usize,
    /// Depth multiplier; the circuit has floor(n * t_factor / 2) * 2 layers
    #[arg(long, default_value_t = 4.0)]
    t_factor: f64,
    /// Pair the last wire with the first in odd layers
    #[arg(long)]
    periodic: bool,
}

impl LatticeArgs {
    fn lattice(self) -> Result<Lattice> {
        Ok(Lattice::new(self.n, self.t_factor, self.periodic)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep the (p, q, r) grid and save a results table
    Run {
        #[command(flatten)]
        lattice: LatticeArgs,
        #[arg(short, num_args = 1.., value_delimiter = ',', default_values_t = [0.1])]
        p: Vec<f64>,
        #[arg(short, num_args = 1.., value_delimiter = ',', default_values_t = [0.5])]
        q: Vec<f64>,
        #[arg(short, num_args = 1.., value_delimiter = ',', default_values_t = [0.1])]
        r: Vec<f64>,
        #[arg(long, default_value_t = 50)]
        iterations: usize,
        #[arg(long)]
        quiet: bool,
        #[arg(long, default_value = "data/test")]
        save_path: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        /// Cells between two checkpoints
        #[arg(long, default_value_t = 1)]
        checkpoint_every: usize,
        #[arg(long, default_value_t = 1)]
        workers: usize,
    },
    /// Run one sample and print what happened to the diagram
    Sample {
        #[command(flatten)]
        lattice: LatticeArgs,
        #[arg(short)]
        p: Option<f64>,
        #[arg(short)]
        q: Option<f64>,
        #[arg(short)]
        r: Option<f64>,
        /// Gate grid file to use instead of sampling one
        #[arg(long)]
        grid: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Sample a gate grid and write it to a file
    Gen {
        #[command(flatten)]
        lattice: LatticeArgs,
        #[arg(short, default_value_t = 0.1)]
        p: f64,
        #[arg(short, default_value_t = 0.5)]
        q: f64,
        #[arg(short, default_value_t = 0.1)]
        r: f64,
        #[arg(short, long, default_value = "grid.txt")]
        output: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compare sampled gate frequencies with their weights
    Check {
        #[command(flatten)]
        lattice: LatticeArgs,
        #[arg(short, default_value_t = 0.1)]
        p: f64,
        #[arg(short, default_value_t = 0.5)]
        q: f64,
        #[arg(short, default_value_t = 0.1)]
        r: f64,
        #[arg(long, default_value_t = 1000)]
        samples: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Aggregate every results file of a directory into full_data.csv
    Summarize {
        #[arg(default_value = "data/test")]
        dir: PathBuf,
    },
}

fn rng_from(seed: Option<u64>) -> (u64, StdRng) {
    let seed = seed.unwrap_or_else(rand::random);
    (seed, StdRng::seed_from_u64(seed))
}

fn init_logging(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let quiet = matches!(cli.command, Commands::Run { quiet: true, .. });
    init_logging(quiet);

    match cli.command {
        Commands::Run {
            lattice,
            p,
            q,
            r,
            iterations,
            quiet,
            save_path,
            seed,
            checkpoint_every,
            workers,
        } => {
            let config = SweepConfig {
                lattice: lattice.lattice()?,
                ps: p,
                qs: q,
                rs: r,
                iterations,
                seed,
                checkpoint_every,
                quiet,
            }
            .normalized()?;
            let (seed, mut rng) = rng_from(config.seed);
            log::info!("base seed {}", seed);

            if workers <= 1 {
                let path = reserve_data_name(&save_path)?;
                let mut sink = FileCheckpoint { path };
                run_sweep(&config, &mut rng, &mut sink, |_| false)?;
            } else {
                let plans = plan_workers(&config, &save_path, workers, seed)?;
                let mut failed = 0;
                for report in run_workers(&config, plans) {
                    if let Err(e) = report.outcome {
                        log::error!("worker {} failed: {:#}", report.plan.worker, e);
                        failed += 1;
                    }
                }
                if failed > 0 {
                    bail!("{} of {} workers did not finish", failed, workers);
                }
            }
        }
        Commands::Sample {
            lattice,
            p,
            q,
            r,
            grid,
            seed,
        } => {
            let lattice = lattice.lattice()?;
            let (seed, mut rng) = rng_from(seed);
            let explicit = grid.map(load_grid_file).transpose()?;
            let grid = resolve_grid(&lattice, explicit, p, q, r, &mut rng)?;
            let report = run_sample(&lattice, &grid, &mut rng, &mut SpiderRules)?;

            println!("Seed: {}", seed);
            println!("Grid: {} layers x {} cells", grid.rows(), grid.cols());
            for gate in Gate::SAMPLED {
                println!("  {:<16} {}", gate.label(), grid.count(gate));
            }
            println!(
                "Diagram before: {} nodes, {} edges (Z {}, X {}, boundary {})",
                report.before.nodes, report.before.edges, report.before.z, report.before.x, report.before.boundary
            );
            println!(
                "Diagram after:  {} nodes, {} edges (Z {}, X {}, boundary {})",
                report.after.nodes, report.after.edges, report.after.z, report.after.x, report.after.boundary
            );
            println!(
                "Rewrites: {} placeholders, {} fusions, {} identities in {} passes",
                report.simplify.excess_removed,
                report.simplify.fusions,
                report.simplify.identities,
                report.simplify.passes
            );
            for (metric, value) in report.metrics.values() {
                println!("{:<12} {}", metric.name(), value);
            }
        }
        Commands::Gen {
            lattice,
            p,
            q,
            r,
            output,
            seed,
        } => {
            let lattice = lattice.lattice()?;
            let probs = Probabilities::new(p, q, r)?;
            let (seed, mut rng) = rng_from(seed);
            let sampled = sample_gate_grid(&lattice, &probs, &mut rng)?;
            let comment = format!(
                "n = {}, t_factor = {}, periodic = {}, p = {}, q = {}, r = {}, seed = {}",
                lattice.n, lattice.t_factor, lattice.periodic, p, q, r, seed
            );
            save_grid_file(&output, &sampled.grid, Some(&comment))?;
            println!("Wrote {} layers to {}", sampled.grid.rows(), output.display());
        }
        Commands::Check {
            lattice,
            p,
            q,
            r,
            samples,
            seed,
        } => {
            let lattice = lattice.lattice()?;
            let probs = Probabilities::new(p, q, r)?;
            let (_, mut rng) = rng_from(seed);
            let frequencies = check::check_frequencies(&lattice, &probs, samples, &mut rng)?;
            check::print_report(&frequencies);
        }
        Commands::Summarize { dir } => {
            let table = load_dir(&dir)?;
            let rows = stats::summarize(&table);
            let out = dir.join(SUMMARY_FILE);
            write_summary(&out, &rows).with_context(|| format!("Failed to summarize {}", dir.display()))?;
            stats::print_report(&rows);
            println!("Wrote {} rows to {}", rows.len(), out.display());
        }
    }
    Ok(())
}
