// ==========================================
// 履约有效率系统 - 命令行入口
// ==========================================
// 子命令: preview / import / list / records / metrics / delete / config
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use delivery_effectiveness::api::{ApiError, EffectivenessApi};
use delivery_effectiveness::app::{get_default_db_path, AppState};
use delivery_effectiveness::domain::{Country, CountryFilter};
use delivery_effectiveness::{i18n, logging};
use serde::Serialize;
use std::path::PathBuf;

/// Delivery effectiveness: import order spreadsheets and report per-product effectiveness
#[derive(Parser, Debug)]
#[command(name = "delivery-effectiveness")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database path (default: $EFFECTIVENESS_DB_PATH or user data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Locale for operator guidance (zh-CN, en, pt-BR)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse and normalize a file without writing anything
    Preview {
        /// Spreadsheet or CSV file
        file: PathBuf,

        /// Assign this country to every record instead of detecting it
        #[arg(long, value_parser = parse_country)]
        country: Option<Country>,
    },

    /// Import a file as a new upload batch
    Import {
        /// Spreadsheet or CSV file
        file: PathBuf,

        /// Batch display name
        #[arg(short, long)]
        name: String,

        /// Assign this country to every record instead of detecting it
        #[arg(long, value_parser = parse_country)]
        country: Option<Country>,
    },

    /// List upload batches
    List {
        /// Only batches containing records of this country
        #[arg(long, value_parser = parse_country)]
        country: Option<Country>,
    },

    /// Show the records of a batch
    Records {
        batch_id: String,

        #[arg(long, value_parser = parse_country)]
        country: Option<Country>,
    },

    /// Per-product effectiveness for a batch
    Metrics {
        batch_id: String,

        #[arg(long, value_parser = parse_country)]
        country: Option<Country>,

        /// Export the report as CSV (directory or file path)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Delete a batch and all of its records
    Delete { batch_id: String },

    /// Read or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show one key, or every known key when omitted
    Get { key: Option<String> },
    /// Set a key
    Set { key: String, value: String },
}

fn parse_country(raw: &str) -> Result<Country, String> {
    raw.parse::<Country>()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

async fn run(cli: Cli, state: &AppState) -> Result<(), ApiError> {
    let api: &EffectivenessApi = &state.effectiveness_api;

    match cli.command {
        Commands::Preview { file, country } => {
            let preview = api.preview_upload(&file, country).await?;
            if cli.json {
                return print_json(&preview).map_err(ApiError::Other);
            }
            println!("records:              {}", preview.record_count);
            println!("rejected rows:        {}", preview.rejected_rows);
            match preview.country_override {
                Some(c) => println!("country (manual):     {}", c),
                None => {
                    let detected: Vec<String> = preview
                        .countries
                        .iter()
                        .map(|(c, n)| format!("{} ({})", c, n))
                        .collect();
                    println!("countries detected:   {}", detected.join(", "));
                }
            }
            println!("valid completed date: {}", preview.valid_completed_dates);
            if let Some((status, n)) = &preview.top_status {
                println!("top status:           {} ({})", status, n);
            }
            println!("distinct products:    {}", preview.unique_products);
            for r in &preview.sample_records {
                println!(
                    "  {:<14} {:<10} {:<24} {:<12} {}",
                    r.order_number, r.pais, r.product_name, r.order_status, r.shipping_number
                );
            }
        }

        Commands::Import {
            file,
            name,
            country,
        } => {
            let outcome = api.import_upload(&file, &name, country).await?;
            if cli.json {
                return print_json(&outcome).map_err(ApiError::Other);
            }
            println!(
                "{}",
                i18n::t_with_args(
                    "import.completed",
                    &[
                        ("count", outcome.record_count.to_string().as_str()),
                        ("batch_id", outcome.batch_id.as_str()),
                    ],
                )
            );
        }

        Commands::List { country } => {
            let summaries = api
                .list_batch_summaries(CountryFilter::from(country))
                .await?;
            if cli.json {
                return print_json(&summaries).map_err(ApiError::Other);
            }
            if summaries.is_empty() {
                println!("{}", i18n::t("batch.empty_list"));
            }
            for s in &summaries {
                println!("{}  {}", s.batch.batch_id, s.display_label());
            }
        }

        Commands::Records { batch_id, country } => {
            let records = api
                .load_records(&batch_id, CountryFilter::from(country))
                .await?;
            if cli.json {
                return print_json(&records).map_err(ApiError::Other);
            }
            for r in &records {
                println!(
                    "{:<14} {:<10} {:<19} {:<24} {:<12} {}",
                    r.order_number,
                    r.pais,
                    fmt_opt(r.completed_date),
                    r.product_name,
                    r.order_status,
                    r.shipping_number
                );
            }
        }

        Commands::Metrics {
            batch_id,
            country,
            csv,
        } => {
            let filter = CountryFilter::from(country);
            let report = api.batch_report(&batch_id, filter).await?;

            if let Some(target) = csv {
                let path = api.export_report(&batch_id, filter, &target).await?;
                eprintln!("{}", path.display());
            }

            if cli.json {
                return print_json(&report).map_err(ApiError::Other);
            }
            if report.rows.is_empty() {
                println!("{}", i18n::t("metrics.no_data"));
                return Ok(());
            }
            println!(
                "{:<32} {:>8} {:>8} {:>9} {:>8} {:>8}",
                "Product", "Total", "Shipped", "Delivered", "Returned", "Eff."
            );
            for row in &report.rows {
                println!(
                    "{:<32} {:>8} {:>8} {:>9} {:>8} {:>7.2}%",
                    row.product,
                    row.total_orders,
                    row.shipped,
                    row.delivered,
                    row.returned,
                    row.effectiveness
                );
            }
            let s = &report.summary;
            println!(
                "{:<32} {:>8} {:>8} {:>9} {:>8} {:>7.2}%",
                "TOTAL", s.total_orders, "", s.delivered, s.returned, s.overall_effectiveness
            );
        }

        Commands::Delete { batch_id } => {
            let key = if api.delete_batch(&batch_id).await? {
                "batch.deleted"
            } else {
                "batch.not_found"
            };
            println!("{}", i18n::t_with_args(key, &[("batch_id", batch_id.as_str())]));
        }

        Commands::Config { action } => match action {
            ConfigAction::Get { key: Some(key) } => match state.config_api.get_config(&key)? {
                Some(item) if cli.json => print_json(&item).map_err(ApiError::Other)?,
                Some(item) => println!("{} = {}", item.key, item.value),
                None => println!("{}", i18n::t("common.not_found")),
            },
            ConfigAction::Get { key: None } => {
                let items = state.config_api.list_configs()?;
                if cli.json {
                    return print_json(&items).map_err(ApiError::Other);
                }
                for item in &items {
                    let marker = if item.is_default { " (default)" } else { "" };
                    println!("{} = {}{}", item.key, item.value, marker);
                }
            }
            ConfigAction::Set { key, value } => {
                state.config_api.update_config(&key, &value)?;
                println!("{}", i18n::t("common.success"));
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    if let Some(locale) = &cli.locale {
        i18n::set_locale(locale);
    }

    let db_path = cli
        .db
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    tracing::debug!(db_path = %db_path, version = delivery_effectiveness::VERSION, "启动");

    let state = AppState::new(db_path)
        .map_err(anyhow::Error::msg)
        .context("无法初始化应用状态")?;

    if let Err(err) = run(cli, &state).await {
        eprintln!("{}", err);
        if let ApiError::StructuralContent {
            columns_found,
            sample_rejected,
            ..
        } = &err
        {
            eprintln!("  columns: {:?}", columns_found);
            eprintln!("  rejected order numbers: {:?}", sample_rejected);
        }
        eprintln!("{}", err.guidance());
        std::process::exit(1);
    }

    Ok(())
}
