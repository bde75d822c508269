//! `wardbook` - CLI and web server for staff clinic records
//!
//! This binary serves the records web application and exposes the listing,
//! statistics and export from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use wardbook::cli::{
    Cli, Command, ConfigCommand, ExportCommand, OutputFormat, SearchCommand, ServeCommand,
};
use wardbook::{export, init_logging, web, Config, StaffSummary, Storage};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd).await,
        Command::Export(export_cmd) => handle_export(&config, &export_cmd),
        Command::Stats(stats_cmd) => handle_stats(&config, stats_cmd.json),
        Command::Search(search_cmd) => handle_search(&config, &search_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open_with_timeout(&path, config.busy_timeout())
        .with_context(|| format!("opening database at {}", path.display()))
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let storage = open_storage(&config)?;
    info!("Uploads directory: {}", config.uploads_dir().display());
    web::serve(&config, storage).await?;
    Ok(())
}

fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;

    let rows = if let Some(path) = &cmd.output {
        let file = File::create(path)
            .with_context(|| format!("creating export file {}", path.display()))?;
        let mut out = BufWriter::new(file);
        let rows = export::write_staff_csv(&storage, &mut out)?;
        out.flush()?;
        eprintln!("Wrote {rows} staff records to {}", path.display());
        rows
    } else {
        let mut out = io::stdout().lock();
        export::write_staff_csv(&storage, &mut out)?
    };

    info!("Export finished with {} rows", rows);
    Ok(())
}

fn handle_stats(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.statistics()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("wardbook statistics");
        println!("-------------------");
        println!("Total staff:   {}", stats.total_staff);
        println!("Total visits:  {}", stats.total_visits);
        println!("Admissions:    {}", stats.admissions);
        println!("Deaths:        {}", stats.deaths);
        println!("Discharged:    {}", stats.discharged);
        println!("Referred:      {}", stats.referred);
    }
    Ok(())
}

fn handle_search(config: &Config, cmd: &SearchCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let results = storage.search_staff(&cmd.term)?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Plain => {
            for staff in &results {
                println!("{}\t{}", staff.hospital_number, staff.full_name);
            }
        }
        OutputFormat::Table => print_table(&results),
    }
    Ok(())
}

fn print_table(results: &[StaffSummary]) {
    let width = |values: Vec<&str>, header: &str| {
        values
            .iter()
            .map(|v| v.chars().count())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or_default()
    };
    let number_w = width(
        results.iter().map(|s| s.hospital_number.as_str()).collect(),
        "Hospital No",
    );
    let name_w = width(
        results.iter().map(|s| s.full_name.as_str()).collect(),
        "Name",
    );
    let station_w = width(results.iter().map(|s| s.station.as_str()).collect(), "Station");

    println!(
        "{:<6} {:<number_w$} {:<name_w$} {:<station_w$} Rank",
        "ID", "Hospital No", "Name", "Station"
    );
    for s in results {
        println!(
            "{:<6} {:<number_w$} {:<name_w$} {:<station_w$} {}",
            s.id, s.hospital_number, s.full_name, s.station, s.rank
        );
    }
    if results.is_empty() {
        println!("(no staff records)");
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_address);
                println!("  Port:               {}", config.server.port);
                println!(
                    "  Workers:            {}",
                    config
                        .server
                        .workers
                        .map_or_else(|| "auto".to_string(), |w| w.to_string())
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
                println!();
                println!("[Uploads]");
                println!("  Directory:          {}", config.uploads_dir().display());
                println!("  URL prefix:         /{}", config.uploads.url_prefix);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
