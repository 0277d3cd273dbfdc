mod config;
mod report;

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use longview_core::presets;
use longview_core::sim::DualIncomeSimulation;
use longview_core::solve::OptimizingSolver;
use longview_core::tax::{TAX_TABLE_YEAR, default_tax_fn};

use config::{ResolvedPreset, parse_scenario};
use report::{Presenter, format_currency, format_percentage};

#[derive(Parser, Debug)]
#[command(name = "longview")]
#[command(about = "Multi-decade household cash-flow forecasting")]
struct Args {
    /// Path to the YAML scenario file
    scenario: PathBuf,

    /// Search the auxiliary policy scalars instead of using their guesses
    #[arg(long)]
    optimize: bool,

    /// Years of detail to print in the tables
    #[arg(long, default_value_t = 5)]
    detail_years: usize,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) {
    let default_filter = format!("longview={level},longview_core={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level);

    let text = std::fs::read_to_string(&args.scenario)?;
    let scenario = parse_scenario(&text)?;

    if (scenario.params.initial_year - TAX_TABLE_YEAR).abs() > 5 {
        warn!(
            "tax table is from {TAX_TABLE_YEAR} but the simulation starts in {}; \
             brackets may be stale",
            scenario.params.initial_year
        );
    }

    let tax_fn = default_tax_fn();
    let mut optimizer = OptimizingSolver::new(true);

    let builder = match &scenario.preset {
        ResolvedPreset::Equalizing(config) => presets::couple_equalizing(config, &tax_fn),
        ResolvedPreset::Optimized(config) => {
            optimizer.set_disabled(!args.optimize);
            presets::couple_optimized(config, &mut optimizer, &tax_fn)
        }
    };

    let simulation = DualIncomeSimulation::new(scenario.params.clone(), builder)?;
    info!("solving scenario {}", args.scenario.display());
    let outcome = simulation.solve(&mut optimizer)?;

    if outcome.converged {
        println!("Solution found.");
    } else {
        println!("No solution was found for the given inputs! Showing the closest outcome.");
        if let Some(message) = &outcome.solution.message {
            println!("Message: {message}");
        }
    }
    println!();

    let (deferred_rate, exempt_rate) = match &scenario.preset {
        ResolvedPreset::Equalizing(config) => {
            (config.deferred_interest_rate, config.exempt_interest_rate)
        }
        ResolvedPreset::Optimized(config) => {
            (config.deferred_interest_rate, config.exempt_interest_rate)
        }
    };
    println!(
        "Interest rates: {} deferred, {} tax-free.",
        format_percentage(deferred_rate),
        format_percentage(exempt_rate),
    );
    println!();

    let presenter = Presenter::new(&outcome.solution.run, &scenario.params);
    println!("{}", presenter.summary());
    println!();
    println!("{}", presenter.savings_table(args.detail_years));
    println!("Monthly contributions by account:");
    println!("{}", presenter.contributions_table(args.detail_years));
    println!("Trajectory:");
    println!("{}", presenter.trajectory_table(5));

    if args.optimize && !outcome.parameters.is_empty() {
        println!("Optimized policy scalars:");
        for (name, value) in &outcome.parameters {
            println!("  {name}: {value:.4}");
        }
        if let Some(first) = &outcome.first_feasible {
            println!(
                "First-year spending improved from {} (naive) to {} (optimized).",
                format_currency(first.solved_input),
                format_currency(outcome.solution.input),
            );
        }
        println!();
    }

    println!(
        "Terminal savings: {} against a target of {}.",
        format_currency(outcome.solution.run.final_funds().total()),
        format_currency(scenario.params.target_final_savings),
    );

    Ok(())
}
