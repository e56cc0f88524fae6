use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{debug, warn};

use rent_app::render::ExportFormat;
use rent_app::{AppConfig, RentCalculator, logging};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Rent affordability calculator.
///
/// Restores the last session from the configured store, applies any inputs
/// given on the command line, and prints what rent fits the budget.
#[derive(Debug, Parser)]
struct Cli {
    /// TOML config file. Falls back to `$RENT_CALC_CONFIG`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monthly take-home income. Non-digits are ignored.
    #[arg(long)]
    income: Option<String>,

    /// Monthly expenses other than rent.
    #[arg(long)]
    expenses: Option<String>,

    /// Monthly debt payments.
    #[arg(long)]
    debt: Option<String>,

    /// Share of income for rent, 10 to 60.
    #[arg(long, allow_negative_numbers = true)]
    percentage: Option<i64>,

    /// Clear the saved form before applying inputs.
    #[arg(long)]
    reset: bool,

    /// Register this email to unlock the advice.
    #[arg(long, value_name = "EMAIL")]
    unlock: Option<String>,

    /// Write the report to this file.
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
    format: ExportFormat,

    /// Overrides the configured log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(path) = cli.log_file {
        config.log_file = Some(path);
    }

    logging::init_logging(&config.log_level);
    if let Some(path) = &config.log_file {
        logging::enable_file_logging(path)?;
    }
    debug!(?config, "configuration loaded");

    let mut calculator = RentCalculator::bootstrap(&config).await?;

    let session = calculator.session_mut();
    if cli.reset {
        session.reset().await;
    }
    if let Some(income) = &cli.income {
        session.set_monthly_income(income).await;
    }
    if let Some(expenses) = &cli.expenses {
        session.set_non_rent_expenses(expenses).await;
    }
    if let Some(debt) = &cli.debt {
        session.set_monthly_debt(debt).await;
    }
    if let Some(percentage) = cli.percentage {
        session.set_rent_percentage(percentage).await;
    }

    if let Some(email) = &cli.unlock {
        match calculator.unlock(email).await {
            Ok(response) => println!("{}\n", response.message),
            Err(e) => {
                warn!(error = %e, "unlock failed");
                println!("Could not unlock: {e}\n");
            }
        }
    }

    print!("{}", calculator.summary(Local::now().date_naive()));

    if let Some(path) = &cli.export {
        calculator.export(path, cli.format).await?;
        println!("\nReport saved to {}", path.display());
    }

    Ok(())
}
