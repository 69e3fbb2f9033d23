#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, Parser, Subcommand};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use gwas_power::config::Scenario;
use gwas_power::report;
use gwas_power::sweep::{self, Grid, PowerCurve};
use gwas_power::{DEFAULT_SIGMA, PowerInputs};

#[derive(Parser)]
#[command(
    name = "gwas-power",
    version,
    about = "Closed-form power of a two-sided additive association test at a genome-wide threshold."
)]
struct Cli {
    /// Worker threads for curve evaluation (0 uses every core)
    #[arg(long, global = true, default_value_t = 0)]
    threads: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DesignArgs {
    /// Sample size
    #[arg(long)]
    n: f64,

    /// Two-sided significance threshold
    #[arg(long, default_value = "6e-8")]
    threshold: f64,

    /// Residual noise standard deviation
    #[arg(long, default_value_t = DEFAULT_SIGMA)]
    sigma: f64,
}

#[derive(Args)]
struct GridArgs {
    #[arg(long)]
    start: Option<f64>,

    #[arg(long)]
    end: Option<f64>,

    #[arg(long)]
    step: Option<f64>,

    /// Output TSV path (stdout if omitted)
    #[arg(long)]
    out: Option<PathBuf>,
}

impl GridArgs {
    fn resolve(&self, default: Grid) -> Grid {
        Grid {
            start: self.start.unwrap_or(default.start),
            end: self.end.unwrap_or(default.end),
            step: self.step.unwrap_or(default.step),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Power for a single design
    Power {
        #[command(flatten)]
        design: DesignArgs,

        /// Minor allele frequency in (0, 0.5]
        #[arg(long)]
        maf: f64,

        /// Per-allele effect size in residual SD units
        #[arg(long, allow_hyphen_values = true)]
        beta: f64,
    },
    /// Power as a function of effect size
    EffectCurve {
        #[command(flatten)]
        design: DesignArgs,

        #[arg(long)]
        maf: f64,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Power as a function of minor allele frequency
    MafCurve {
        #[command(flatten)]
        design: DesignArgs,

        #[arg(long, allow_hyphen_values = true)]
        beta: f64,

        #[command(flatten)]
        grid: GridArgs,
    },
    /// Run every sweep and published comparison in a scenario file
    Run {
        /// Scenario TOML file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Directory receiving effect_curve.tsv, maf_curve.tsv and published_comparison.tsv
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write the default scenario to a TOML file
    Init {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
    {
        eprintln!("Error: failed to initialize thread pool: {e}");
        process::exit(1);
    }

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Power { design, maf, beta } => run_power(&design, maf, beta),
        Commands::EffectCurve { design, maf, grid } => {
            let base = PowerInputs::new(design.n, maf, 0.0, design.threshold)
                .with_sigma(design.sigma);
            sweep::sweep_effect_size(base, &grid.resolve(Grid::EFFECT_DEFAULT))
                .map_err(Into::into)
                .and_then(|curve| emit_curve(&curve, grid.out.as_deref()))
        }
        Commands::MafCurve { design, beta, grid } => {
            let base = PowerInputs::new(design.n, 0.5, beta, design.threshold)
                .with_sigma(design.sigma);
            sweep::sweep_maf(base, &grid.resolve(Grid::MAF_DEFAULT))
                .map_err(Into::into)
                .and_then(|curve| emit_curve(&curve, grid.out.as_deref()))
        }
        Commands::Run { config, out_dir } => run_scenario_file(&config, &out_dir),
        Commands::Init { path } => Scenario::default().save(&path).map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_power(design: &DesignArgs, maf: f64, beta: f64) -> Result<(), Box<dyn std::error::Error>> {
    let power = PowerInputs::new(design.n, maf, beta, design.threshold)
        .with_sigma(design.sigma)
        .power()?;
    println!("{power}");
    Ok(())
}

fn emit_curve(curve: &PowerCurve, out: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match out {
        Some(path) => {
            report::write_curve_tsv(curve, BufWriter::new(File::create(path)?))?;
            log::info!("Wrote {} curve to {}", curve.parameter, path.display());
        }
        None => report::write_curve_tsv(curve, io::stdout().lock())?,
    }
    Ok(())
}

fn run_scenario_file(config: &Path, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(config)?;
    let outcome = report::run_scenario(&scenario)?;

    fs::create_dir_all(out_dir)?;
    if let Some(curve) = &outcome.effect_curve {
        emit_curve(curve, Some(out_dir.join("effect_curve.tsv").as_path()))?;
    }
    if let Some(curve) = &outcome.maf_curve {
        emit_curve(curve, Some(out_dir.join("maf_curve.tsv").as_path()))?;
    }

    let comparison_path = out_dir.join("published_comparison.tsv");
    report::write_comparison_tsv(
        &outcome.comparisons,
        BufWriter::new(File::create(&comparison_path)?),
    )?;
    for cmp in &outcome.comparisons {
        println!(
            "{}: {} = {} predicted {:.3} vs published {:.3} ({:+.3})",
            cmp.label, cmp.parameter, cmp.value, cmp.predicted, cmp.observed, cmp.difference
        );
    }
    log::info!("Scenario complete; tables written to {}", out_dir.display());
    Ok(())
}
