mod display;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use listwatch_core::PropertyId;
use listwatch_store::{DuckStore, ParquetSink, Sink, StoreError, load_snapshot_dir, persist};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "listwatch",
    version,
    about = "Track listing changes and liveness across crawl snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the state and change tables from every raw snapshot.
    Process {
        /// Root directory of raw snapshot JSON files.
        #[arg(long, env = "LISTWATCH_DATA_DIR", default_value = "results")]
        input: PathBuf,

        /// Directory for `properties.parquet` and `changes.parquet`.
        #[arg(long, env = "LISTWATCH_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// DuckDB file to publish the tables into.
        #[arg(long, env = "LISTWATCH_DB")]
        db: Option<PathBuf>,
    },
    /// Show one listing's current state and change history.
    Show {
        id: i64,

        #[arg(long, env = "LISTWATCH_DB")]
        db: PathBuf,
    },
    /// Row and liveness counts of the published tables.
    Stats {
        #[arg(long, env = "LISTWATCH_DB")]
        db: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Process { input, output, db } => process(input, output, db),
        Command::Show { id, db } => show(PropertyId(id), db),
        Command::Stats { db } => stats(db),
    }
}

fn process(input: PathBuf, output: Option<PathBuf>, db: Option<PathBuf>) -> anyhow::Result<()> {
    info!("listwatch v{}", env!("CARGO_PKG_VERSION"));

    let loaded = load_snapshot_dir(&input)
        .with_context(|| format!("loading snapshots from {}", input.display()))?;
    if loaded.snapshots.is_empty() {
        warn!(dir = %input.display(), "no snapshot files found");
    }

    let run = listwatch_core::run(&loaded.snapshots);
    run.summary.log();

    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
    if let Some(dir) = &output {
        sinks.push(Box::new(ParquetSink::new(dir).context("preparing output directory")?));
    }
    if let Some(path) = &db {
        let store = DuckStore::open_persistent(path)
            .with_context(|| format!("opening {}", path.display()))?;
        sinks.push(Box::new(store));
    }
    if sinks.is_empty() {
        warn!("no --output or --db given; results were not persisted");
    }
    for sink in &sinks {
        let persisted = persist(sink.as_ref(), &run).context("persisting run outputs")?;
        info!(
            properties = persisted.properties,
            changes = persisted.changes,
            "published"
        );
    }

    info!("processing completed");
    Ok(())
}

fn show(id: PropertyId, db: PathBuf) -> anyhow::Result<()> {
    let store = DuckStore::open_persistent(&db)
        .with_context(|| format!("opening {}", db.display()))?;
    let row = match store.get_property(id) {
        Ok(row) => row,
        Err(StoreError::NoResults) => anyhow::bail!("listing {id} not found"),
        Err(e) => return Err(e).context("querying properties"),
    };
    display::print_property_card(&row);

    let history = store.changes_for(id).context("querying changes")?;
    if history.iter().all(|b| b.num_rows() == 0) {
        println!("No recorded changes.");
    } else {
        println!("Changes");
        arrow::util::pretty::print_batches(&history)?;
    }
    Ok(())
}

fn stats(db: PathBuf) -> anyhow::Result<()> {
    let store = DuckStore::open_persistent(&db)
        .with_context(|| format!("opening {}", db.display()))?;
    if !store.has_tables() {
        anyhow::bail!(
            "{} has no published tables; run `listwatch process --db` first",
            db.display()
        );
    }
    let (active, inactive) = store.active_counts()?;
    println!("properties  {}", store.properties_count()?);
    println!("  active    {active}");
    println!("  inactive  {inactive}");
    println!("changes     {}", store.changes_count()?);
    Ok(())
}
