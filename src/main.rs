use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use leadbook::config::{default_settings_path, load_settings, Settings};
use leadbook::infra::push::http::HttpPublisher;
use leadbook::usecase::ports::publisher::PushReceipt;
use leadbook::usecase::services::export_service::ExportService;
use leadbook::usecase::services::import_service::ImportService;
use leadbook::usecase::services::push_service::PushService;
use leadbook::{CellValue, MergeOutcome, TableStore};

#[derive(Parser)]
#[command(name = "leadbook", version, about = "Edit, merge and cross-reference paired contact sheets.")]
struct Cli {
    /// Settings file (defaults to the per-user config directory).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SheetArgs {
    /// Workbook to open (.xlsx, .xls, .ods or .csv).
    file: PathBuf,

    /// Index of the sheet to work on.
    #[arg(long, default_value_t = 0)]
    sheet: usize,
}

#[derive(Args)]
struct SaveArgs {
    /// Where to write the result. Defaults to a date-stamped file.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List the sheets of a workbook.
    Sheets { file: PathBuf },
    /// Print the records of a sheet.
    Show {
        #[command(flatten)]
        target: SheetArgs,
        /// Only rows containing this text.
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Change one field of one record.
    Edit {
        #[command(flatten)]
        target: SheetArgs,
        #[arg(long)]
        row: usize,
        #[arg(long)]
        column: String,
        #[arg(long)]
        value: String,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Append a record built from `column=value` pairs.
    AddRow {
        #[command(flatten)]
        target: SheetArgs,
        #[arg(long = "set", value_name = "COLUMN=VALUE")]
        fields: Vec<String>,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Delete a record here and its namesakes in the paired sheet.
    Delete {
        #[command(flatten)]
        target: SheetArgs,
        #[arg(long)]
        row: usize,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Merge one record into the matching row of another sheet.
    Merge {
        #[command(flatten)]
        target: SheetArgs,
        #[arg(long)]
        row: usize,
        /// Sheet receiving the record.
        #[arg(long)]
        into: usize,
        /// Target row number to use when no automatic match exists.
        #[arg(long)]
        pick: Option<usize>,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Merge every record that has a match in another sheet.
    MergeAll {
        #[command(flatten)]
        target: SheetArgs,
        #[arg(long)]
        into: usize,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Send records with an email and phone number to the push endpoint.
    Push {
        #[command(flatten)]
        target: SheetArgs,
        #[arg(long)]
        endpoint: Option<String>,
    },
}

fn main() {
    init_logging();
    if let Err(err) = run(Cli::parse()) {
        tracing::error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let settings_path = match cli.config {
        Some(path) => path,
        None => default_settings_path()?,
    };
    let settings = load_settings(&settings_path)?;
    let exporter = ExportService::new(settings.output_dir.clone());

    match cli.command {
        Command::Sheets { file } => {
            let workbook = ImportService::new().load(&file)?;
            for (index, name) in workbook.sheet_names().iter().enumerate() {
                println!("{index}\t{name}");
            }
        }
        Command::Show { target, search } => {
            let mut store = open_store(&target)?;
            store.set_search(search);
            print_rows(&store);
        }
        Command::Edit {
            target,
            row,
            column,
            value,
            save,
        } => {
            let mut store = open_store(&target)?;
            store.edit_field(row, &column, CellValue::from(value))?;
            save_store(&exporter, &store, &save)?;
        }
        Command::AddRow {
            target,
            fields,
            save,
        } => {
            let mut store = open_store(&target)?;
            for field in &fields {
                let (column, value) = parse_assignment(field)?;
                store.set_draft_field(column, CellValue::from(value));
            }
            let index = store.commit_new_row()?;
            println!("added row {index}");
            save_store(&exporter, &store, &save)?;
        }
        Command::Delete { target, row, save } => {
            let mut store = open_store(&target)?;
            let outcome = store.delete_row(row)?;
            match outcome.paired_sheet {
                Some(pair) if outcome.deleted_in_pair() => println!(
                    "deleted row {row} and {} row(s) in sheet {pair}",
                    outcome.paired_rows_deleted
                ),
                _ => println!("deleted row {row} from this sheet only"),
            }
            save_store(&exporter, &store, &save)?;
        }
        Command::Merge {
            target,
            row,
            into,
            pick,
            save,
        } => {
            let mut store = open_store(&target)?;
            match (store.merge_row(row, into)?, pick) {
                (MergeOutcome::Merged { target_row }, _) => {
                    println!("merged row {row} into row {target_row} of sheet {into}");
                }
                (MergeOutcome::NeedsSelection(candidates), Some(target_row)) => {
                    if !candidates.iter().any(|c| c.row_number == target_row) {
                        bail!("row {target_row} is not a candidate in sheet {into}");
                    }
                    store.merge_row_into(row, into, target_row)?;
                    println!("merged row {row} into picked row {target_row} of sheet {into}");
                }
                (MergeOutcome::NeedsSelection(candidates), None) => {
                    println!("no automatic match; rerun with --pick <ROW> using one of:");
                    for candidate in candidates {
                        println!("{}\t{}", candidate.row_number, candidate.label());
                    }
                    return Ok(());
                }
            }
            save_store(&exporter, &store, &save)?;
        }
        Command::MergeAll { target, into, save } => {
            let mut store = open_store(&target)?;
            let summary = store.merge_all(into)?;
            println!(
                "merged {} record(s), {} without a match",
                summary.merged, summary.unmatched
            );
            save_store(&exporter, &store, &save)?;
        }
        Command::Push { target, endpoint } => {
            let store = open_store(&target)?;
            let receipt = push(&settings, endpoint, &store)?;
            println!(
                "pushed {} record(s): HTTP {} {}",
                receipt.record_count, receipt.status, receipt.body
            );
        }
    }
    Ok(())
}

fn open_store(target: &SheetArgs) -> Result<TableStore> {
    let workbook = ImportService::new().load(&target.file)?;
    let mut store = TableStore::new(workbook);
    store.select_sheet(target.sheet)?;
    Ok(store)
}

fn save_store(exporter: &ExportService, store: &TableStore, save: &SaveArgs) -> Result<()> {
    let path = save
        .out
        .clone()
        .unwrap_or_else(|| exporter.default_output_path());
    exporter.save(store.workbook(), store.active_sheet(), &path)?;
    println!("saved {}", path.display());
    Ok(())
}

fn push(
    settings: &Settings,
    endpoint: Option<String>,
    store: &TableStore,
) -> Result<PushReceipt> {
    let endpoint = endpoint.unwrap_or_else(|| settings.push_endpoint.clone());
    let publisher = HttpPublisher::new(endpoint, settings.push_timeout())?;
    tracing::info!(endpoint = publisher.endpoint(), "pushing to endpoint");
    let service = PushService::new(Arc::new(publisher));
    service
        .push(&store.records())
        .context("failed to push records")
}

fn parse_assignment(field: &str) -> Result<(&str, &str)> {
    field
        .split_once('=')
        .filter(|(column, _)| !column.trim().is_empty())
        .map(|(column, value)| (column.trim(), value))
        .ok_or_else(|| anyhow!("expected COLUMN=VALUE, got `{field}`"))
}

fn print_rows(store: &TableStore) {
    let headers = store.headers();
    let visible = store.visible_rows();
    tracing::debug!(query = store.search_text(), shown = visible.len(), "filtered rows");
    println!("#\t{}", headers.join("\t"));
    for (index, record) in visible {
        let cells = headers
            .iter()
            .map(|header| {
                let value = record.get(header).cloned().unwrap_or_default();
                match value.link_url() {
                    Some(url) if url != value.to_string() => format!("{value} <{url}>"),
                    _ => value.to_string(),
                }
            })
            .collect::<Vec<_>>();
        println!("{index}\t{}", cells.join("\t"));
    }
}
