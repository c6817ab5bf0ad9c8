// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod present;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use folio_app::{
    ClientId, FilterUpdate, ImportSource, InternalEvent, InvestmentId, InvestmentType, Modality,
    SortField, ViewCommand, ViewEvent, ViewModel,
};
use folio_db::{Store, StoreImporter, StoreRecordSource};
use runtime::{TerminalNotifier, ThreadTimer, wait_for_settle};
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type CliView<'a> = ViewModel<
    StoreRecordSource<'a>,
    StoreImporter<'a>,
    TerminalNotifier<io::Stderr>,
    ThreadTimer,
>;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `folio --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(options.log_level.as_deref().unwrap_or(config.log_level()))?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or FOLIO_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }
    if options.check_only {
        return Ok(());
    }

    let (internal_tx, internal_rx) = mpsc::channel();
    let mut view: CliView<'_> = ViewModel::new(
        StoreRecordSource::new(&store, OffsetDateTime::now_utc().date()),
        StoreImporter::new(&store),
        TerminalNotifier::new(io::stderr()),
        ThreadTimer::new(internal_tx),
    );
    let result = run_session(
        &mut view,
        &internal_rx,
        &options,
        config.compact(),
        &mut io::stdout().lock(),
    );
    view.unmount();
    result
}

fn run_session(
    view: &mut CliView<'_>,
    internal_rx: &Receiver<InternalEvent>,
    options: &CliOptions,
    config_compact: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut failed = false;

    let events = view.mount();
    settle(view, internal_rx, &events)?;
    failed |= events.contains(&ViewEvent::RefreshFailed);

    if let Some(path) = &options.import_path {
        let events = view.dispatch(ViewCommand::Import(ImportSource::Path(path.clone())));
        settle(view, internal_rx, &events)?;
        failed |= events.contains(&ViewEvent::ImportFailed);
    }

    if let Some(id) = options.delete {
        let events = view.dispatch(ViewCommand::Delete(id));
        failed |= events.contains(&ViewEvent::DeleteFailed(id));
    }

    view.dispatch(ViewCommand::SetCompact(options.compact || config_compact));
    for update in options.filters() {
        view.dispatch(ViewCommand::SetFilter(update));
    }
    for field in &options.sorts {
        view.dispatch(ViewCommand::SortBy(*field));
    }

    if let Some(id) = options.details
        && view.dispatch(ViewCommand::ShowDetails(id)).is_empty()
    {
        bail!("investment {id} is not in the current list -- check the id and retry");
    }

    let snapshot = view.present();
    out.write_all(present::render(&snapshot).as_bytes())
        .context("write listing")?;

    if let Some(path) = &options.export_path {
        let file = File::create(path)
            .with_context(|| format!("create export file {}", path.display()))?;
        let written = folio_db::export_json(
            &snapshot.visible_rows,
            snapshot.clients,
            BufWriter::new(file),
        )
        .with_context(|| format!("write export file {}", path.display()))?;
        info!(rows = written, path = %path.display(), "export written");
        eprintln!("exported {written} investment(s) to {}", path.display());
    }

    if failed {
        bail!("one or more operations failed; see messages above");
    }
    Ok(())
}

fn settle(
    view: &mut CliView<'_>,
    internal_rx: &Receiver<InternalEvent>,
    events: &[ViewEvent],
) -> Result<()> {
    let started = events
        .iter()
        .any(|event| matches!(event, ViewEvent::RefreshStarted { .. }));
    if !started {
        return Ok(());
    }
    wait_for_settle(internal_rx, |event| view.handle_internal(event))
}

fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter {filter:?}; use a level such as \"info\""))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init()
        .context("install log subscriber")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    client: Option<ClientId>,
    kind: Option<InvestmentType>,
    modality: Option<Modality>,
    sorts: Vec<SortField>,
    details: Option<InvestmentId>,
    delete: Option<InvestmentId>,
    import_path: Option<PathBuf>,
    export_path: Option<PathBuf>,
    compact: bool,
    log_level: Option<String>,
}

impl CliOptions {
    fn filters(&self) -> Vec<FilterUpdate> {
        let mut updates = Vec::new();
        if self.client.is_some() {
            updates.push(FilterUpdate::Client(self.client));
        }
        if self.kind.is_some() {
            updates.push(FilterUpdate::Type(self.kind));
        }
        if self.modality.is_some() {
            updates.push(FilterUpdate::Modality(self.modality));
        }
        updates
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        client: None,
        kind: None,
        modality: None,
        sorts: Vec::new(),
        details: None,
        delete: None,
        import_path: None,
        export_path: None,
        compact: false,
        log_level: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str, what: &str| required_value(&mut iter, flag, what);
        match arg.as_ref() {
            "--config" => {
                options.config_path = PathBuf::from(value_for("--config", "a file path")?);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--client" => {
                options.client = Some(ClientId::new(parse_id(
                    "--client",
                    &value_for("--client", "a client id")?,
                )?));
            }
            "--type" => {
                let raw = value_for("--type", "an investment type")?;
                options.kind = Some(InvestmentType::parse(&raw).ok_or_else(|| {
                    anyhow!(
                        "unknown investment type {raw:?}; use one of: {}",
                        InvestmentType::ALL.map(InvestmentType::as_str).join(", ")
                    )
                })?);
            }
            "--modality" => {
                let raw = value_for("--modality", "a modality")?;
                options.modality = Some(Modality::parse(&raw).ok_or_else(|| {
                    anyhow!(
                        "unknown modality {raw:?}; use one of: {}",
                        Modality::ALL.map(Modality::as_str).join(", ")
                    )
                })?);
            }
            "--sort" => {
                let raw = value_for("--sort", "a column")?;
                options.sorts.push(SortField::parse(&raw).ok_or_else(|| {
                    anyhow!(
                        "unknown sort column {raw:?}; use one of: {}",
                        SortField::ALL.map(SortField::as_str).join(", ")
                    )
                })?);
            }
            "--details" => {
                options.details = Some(InvestmentId::new(parse_id(
                    "--details",
                    &value_for("--details", "an investment id")?,
                )?));
            }
            "--delete" => {
                options.delete = Some(InvestmentId::new(parse_id(
                    "--delete",
                    &value_for("--delete", "an investment id")?,
                )?));
            }
            "--import" => {
                options.import_path = Some(PathBuf::from(value_for("--import", "a file path")?));
            }
            "--export" => {
                options.export_path = Some(PathBuf::from(value_for("--export", "a file path")?));
            }
            "--compact" => {
                options.compact = true;
            }
            "--log-level" => {
                options.log_level = Some(value_for("--log-level", "a filter")?);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn required_value<I, S>(iter: &mut I, flag: &str, what: &str) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    iter.next()
        .map(|value| value.as_ref().to_owned())
        .ok_or_else(|| anyhow!("{flag} requires {what}"))
}

fn parse_id(flag: &str, raw: &str) -> Result<i64> {
    let id: i64 = raw
        .parse()
        .with_context(|| format!("{flag} expects a numeric id, got {raw:?}"))?;
    if id <= 0 {
        bail!("{flag} expects a positive id, got {id}");
    }
    Ok(id)
}

fn print_help() {
    println!("folio");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --check                  Validate config + DB and exit");
    println!("  --client <id>            Show only this client's investments");
    println!("  --type <type>            Filter by investment type (cdb, lci, ...)");
    println!("  --modality <modality>    Filter by modality (prefixed, postfixed, ...)");
    println!("  --sort <column>          Sort by column; repeat to flip direction");
    println!("  --details <id>           Show the details panel for one investment");
    println!("  --delete <id>            Delete an investment before listing");
    println!("  --import <path>          Import investments from a JSON file");
    println!("  --export <path>          Write the listed investments as JSON");
    println!("  --compact                Use the compact column set");
    println!("  --log-level <filter>     Log filter, for example info or folio_app=debug");
    println!("  --help                   Show this help");
}
