use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use itertools::Itertools;
use rootcause::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kantoki::catalog::{Catalog, Ship};
use kantoki::error::ErrorKind;
use kantoki::progress::{ProgressSnapshot, ShipProgress};
use kantoki::recognized::Recognized;
use kantoki::resources::{aggregate, needed_for, short_name};
use kantoki::status::{Status, classify};
use kantoki::store::{ProgressSink, ProgressStore};
use kantoki::taxonomy::Taxonomy;
use kantoki::view::{FilterCriteria, filter_and_sort_with};

/// Track ship acquisition and remodel progress against a ship catalog
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ship catalog (JSON list of ships)
    #[clap(short, long)]
    catalog: PathBuf,

    /// Progress file. Created on the first toggle if it does not exist.
    #[clap(short, long, default_value = "progress.json")]
    progress: PathBuf,

    /// Replacement type taxonomy (JSON list of categories)
    #[clap(short, long)]
    taxonomy: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG
    #[clap(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collection progress per type and remodel resources still needed
    Summary {
        /// Only list resources that are still needed
        #[clap(long)]
        outstanding: bool,
    },
    /// Filtered and sorted ship list
    List {
        /// Matched against names, kana, romaji, types and classes
        #[clap(short, long, default_value = "")]
        search: String,

        /// Raw ship type; may be repeated
        #[clap(long = "type")]
        types: Vec<String>,

        /// unacquired, remodeling or complete; may be repeated
        #[clap(long = "status")]
        statuses: Vec<String>,

        #[clap(long)]
        priority: bool,

        #[clap(long)]
        task: bool,
    },
    /// Flip one piece of progress for a ship and save the progress file
    Toggle {
        /// Ship name as it appears in the catalog
        ship: String,

        #[command(subcommand)]
        target: ToggleTarget,
    },
}

#[derive(Subcommand, Debug)]
enum ToggleTarget {
    /// Mark or unmark a remodel stage (0-based)
    Stage { index: usize },
    Acquired,
    Priority,
    Task,
}

/// Writes every new snapshot back to the progress file.
struct FileSink {
    path: PathBuf,
}

impl ProgressSink for FileSink {
    fn persist(&self, snapshot: &ProgressSnapshot) -> Result<(), ErrorKind> {
        let data = snapshot.to_json().map_err(|err| ErrorKind::Persist {
            detail: err.to_string(),
        })?;
        fs::write(&self.path, data).map_err(|err| ErrorKind::Persist {
            detail: format!("{}: {err}", self.path.display()),
        })?;
        debug!("wrote {} progress records to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

fn load_catalog(path: &Path) -> Result<Catalog, Report> {
    let data = fs::read_to_string(path)
        .context_with(|| format!("Failed to read catalog: {}", path.display()))?;
    let catalog = Catalog::from_json(&data)
        .context_with(|| format!("Failed to load catalog: {}", path.display()))?;
    Ok(catalog)
}

fn load_progress(path: &Path) -> Result<ProgressSnapshot, Report> {
    if !path.exists() {
        info!("{} does not exist, starting with empty progress", path.display());
        return Ok(ProgressSnapshot::default());
    }

    let data = fs::read_to_string(path)
        .context_with(|| format!("Failed to read progress: {}", path.display()))?;
    let snapshot = ProgressSnapshot::from_json(&data)
        .context_with(|| format!("Failed to load progress: {}", path.display()))?;
    Ok(snapshot)
}

fn load_taxonomy(path: Option<&Path>) -> Result<Taxonomy, Report> {
    let Some(path) = path else {
        return Ok(Taxonomy::default());
    };

    let data = fs::read_to_string(path)
        .context_with(|| format!("Failed to read taxonomy: {}", path.display()))?;
    let taxonomy = Taxonomy::from_json(&data)
        .context_with(|| format!("Failed to load taxonomy: {}", path.display()))?;
    Ok(taxonomy)
}

fn percent(ratio: f64) -> String {
    format!("{:5.1}%", ratio * 100.0)
}

fn print_summary(
    taxonomy: &Taxonomy,
    catalog: &Catalog,
    progress: &ProgressSnapshot,
    outstanding: bool,
) {
    let summary = aggregate(catalog.ships(), progress);

    let overall = summary.overall;
    println!(
        "{} ships: {} acquired ({}), {} complete ({})",
        overall.total,
        overall.acquired,
        percent(overall.acquired_ratio()),
        overall.completed,
        percent(overall.completed_ratio())
    );
    println!();

    for (raw, counts) in summary
        .by_type
        .iter()
        .sorted_by(|(a, _), (b, _)| taxonomy.compare_types(a, b))
    {
        println!(
            "{:<6} {:>4}/{:<4} acquired {}  complete {}  {raw}",
            taxonomy.alias_of(raw),
            counts.acquired,
            counts.total,
            percent(counts.acquired_ratio()),
            percent(counts.completed_ratio())
        );
    }
    println!();

    let resources: Vec<_> = if outstanding {
        summary.outstanding().collect()
    } else {
        summary
            .resources
            .iter()
            .map(|(name, tally)| (name.as_str(), tally))
            .collect()
    };
    for (name, tally) in resources {
        println!(
            "{:<4} {:>8} / {:<8} {name}",
            short_name(name),
            tally.needed,
            tally.total
        );
    }
}

fn current_stage_name<'a>(ship: &'a Ship, record: &ShipProgress) -> &'a str {
    record
        .current_stage()
        .and_then(|idx| ship.stage(idx))
        .map(|stage| stage.name())
        .unwrap_or("-")
}

fn print_ship(taxonomy: &Taxonomy, ship: &Ship, record: &ShipProgress) {
    let mut flags = String::new();
    if record.priority() {
        flags.push('!');
    }
    if record.task() {
        flags.push('T');
    }

    let needed = needed_for(ship, record)
        .into_iter()
        .map(|(name, count)| format!("{}{count}", short_name(&name)))
        .join(" ");

    println!(
        "{:<10} {:<2} {:<6} {:<24} {:<20} {:<20} {needed}",
        classify(ship, record).name(),
        flags,
        taxonomy.alias_of(ship.ship_type()),
        ship.class(),
        ship.name(),
        current_stage_name(ship, record),
    );
}

fn parse_statuses(names: &[String]) -> Result<HashSet<Status>, Report> {
    let mut selected = HashSet::new();
    for name in names {
        match Status::from_name(name) {
            Recognized::Known(status) => {
                selected.insert(status);
            }
            Recognized::Unknown(other) => bail!(
                "Unknown status '{other}', expected one of: {}",
                Status::ALL.iter().join(", ")
            ),
        }
    }
    Ok(selected)
}

fn toggle(
    catalog: &Catalog,
    progress: ProgressSnapshot,
    progress_path: &Path,
    ship: &str,
    target: ToggleTarget,
) -> Result<(), Report> {
    let ship = catalog.require(ship)?;
    let sink = FileSink {
        path: progress_path.to_path_buf(),
    };
    let mut store = ProgressStore::new(progress, sink);

    let record = match target {
        ToggleTarget::Stage { index } => store.toggle_stage(ship, index)?,
        ToggleTarget::Acquired => store.toggle_acquired(ship)?,
        ToggleTarget::Priority => store.toggle_priority(ship)?,
        ToggleTarget::Task => store.toggle_task(ship)?,
    };

    println!(
        "{}: {} (stage: {}, priority: {}, task: {})",
        ship.name(),
        classify(ship, record),
        current_stage_name(ship, record),
        record.priority(),
        record.task()
    );

    Ok(())
}

fn main() -> Result<(), Report> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let taxonomy = load_taxonomy(args.taxonomy.as_deref())?;
    let catalog = load_catalog(&args.catalog)?;
    let progress = load_progress(&args.progress)?;

    match args.command {
        Command::Summary { outstanding } => {
            print_summary(&taxonomy, &catalog, &progress, outstanding);
        }
        Command::List {
            search,
            types,
            statuses,
            priority,
            task,
        } => {
            let criteria = FilterCriteria::builder()
                .search_text(search)
                .selected_types(types.into_iter().collect())
                .selected_statuses(parse_statuses(&statuses)?)
                .priority_only(priority)
                .task_only(task)
                .build();

            let ships = filter_and_sort_with(&taxonomy, &catalog, &progress, &criteria);
            for ship in &ships {
                print_ship(&taxonomy, ship, progress.get(ship.name()));
            }
            info!("{} of {} ships shown", ships.len(), catalog.len());
        }
        Command::Toggle { ship, target } => {
            toggle(&catalog, progress, &args.progress, &ship, target)?;
        }
    }

    Ok(())
}
