//! `docindex` - CLI for browsing generated documentation tables
//!
//! This binary provides the command-line interface for loading, checking,
//! indexing and searching the navigation and search scripts of a generated
//! documentation site.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};

use docindex::cli::{
    CheckCommand, Cli, Command, ConfigCommand, IndexCommand, LocateCommand, NavCommand,
    OutputFormat, SearchCommand, StatusCommand,
};
use docindex::search::{SearchMode, SearchQuery};
use docindex::{init_logging, Config, DocSet, ImportOutcome, Storage};

type CmdResult = Result<ExitCode, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CmdResult {
    let config_file = cli.config_file();
    let load = || Config::load_from(Some(config_file.clone()));

    match cli.command {
        Command::Index(cmd) => handle_index(&load()?, cmd),
        Command::Search(cmd) => handle_search(&load()?, cmd),
        Command::Nav(cmd) => handle_nav(&load()?, cmd),
        Command::Locate(cmd) => handle_locate(&load()?, cmd),
        Command::Check(cmd) => handle_check(&load()?, cmd),
        Command::Status(cmd) => handle_status(&load()?, &cmd),
        // Loads the file itself, so a broken file cannot block `validate`.
        Command::Config(cmd) => handle_config(config_file.clone(), cmd),
    }
}

fn handle_index(config: &Config, cmd: IndexCommand) -> CmdResult {
    let root = config.doc_root(cmd.root);
    let docset = DocSet::load(&root, &config.source)?;
    let mut storage = Storage::open(config.database_path())?;

    match storage.import(&docset, cmd.force)? {
        ImportOutcome::Unchanged => {
            println!("Index is up to date ({}).", root.display());
        }
        ImportOutcome::Imported {
            nav_nodes,
            search_entries,
        } => {
            println!(
                "Indexed {nav_nodes} navigation nodes and {search_entries} search entries from {}",
                root.display()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_search(config: &Config, cmd: SearchCommand) -> CmdResult {
    let limit = cmd.limit.unwrap_or(config.search.default_limit);

    // (name, category, link, source) rows for display
    let rows: Vec<(String, String, String, String)>;
    let json: serde_json::Value;

    if let Some(root) = cmd.root {
        let docset = DocSet::load(&root, &config.source)?;
        let query = SearchQuery {
            text: cmd.query,
            mode: cmd.mode.map_or(config.search.mode, Into::into),
            case_sensitive: cmd.case_sensitive || config.search.case_sensitive,
            category: cmd.category,
            source: cmd.file,
            limit,
        };
        let hits = docset.search.search(&query)?;
        json = serde_json::to_value(&hits)?;
        rows = hits
            .iter()
            .map(|hit| {
                let first = hit.entry.targets.first();
                (
                    hit.entry.name.clone(),
                    hit.category.to_string(),
                    first.map(|t| t.root_link().to_string()).unwrap_or_default(),
                    first.and_then(|t| t.source.clone()).unwrap_or_default(),
                )
            })
            .collect();
    } else {
        let unsupported = cmd.index_unsupported_options();
        if !unsupported.is_empty() {
            return Err(format!(
                "{} cannot be used without --root: the index only supports case-insensitive substring search",
                unsupported.join(" and ")
            )
            .into());
        }
        if config.search.mode != SearchMode::Substring || config.search.case_sensitive {
            warn!("configured search mode and case sensitivity do not apply to the index");
        }
        let storage = Storage::open(config.database_path())?;
        let hits = storage.search(
            &cmd.query,
            cmd.category.as_deref(),
            cmd.file.as_deref(),
            limit,
        )?;
        json = serde_json::to_value(&hits)?;
        rows = hits
            .iter()
            .map(|hit| {
                let first = hit.targets.first();
                (
                    hit.name.clone(),
                    hit.category.clone(),
                    first.map(|t| t.root_link().to_string()).unwrap_or_default(),
                    first.and_then(|t| t.source.clone()).unwrap_or_default(),
                )
            })
            .collect();
    }

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json)?),
        OutputFormat::Plain => {
            for (name, _, link, _) in &rows {
                println!("{name}\t{link}");
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No matches.");
            } else {
                let width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max(4);
                println!("{:<width$}  {:<12}  {:<20}  LINK", "NAME", "CATEGORY", "FILE");
                for (name, category, link, source) in &rows {
                    println!("{name:<width$}  {category:<12}  {source:<20}  {link}");
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_nav(config: &Config, cmd: NavCommand) -> CmdResult {
    let root = config.doc_root(cmd.root);
    let docset = DocSet::load(&root, &config.source)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&docset.nav)?);
    } else {
        print!("{}", docset.nav.outline(cmd.depth));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_locate(config: &Config, cmd: LocateCommand) -> CmdResult {
    let labels: Option<Vec<String>> = if let Some(root) = cmd.root {
        let docset = DocSet::load(&root, &config.source)?;
        docset
            .nav
            .locate(&cmd.link)
            .map(|path| path.iter().map(|n| n.label.clone()).collect())
    } else {
        let storage = Storage::open(config.database_path())?;
        storage
            .locate(&cmd.link)?
            .map(|path| path.into_iter().map(|n| n.label).collect())
    };

    match labels {
        Some(labels) => {
            println!("{}", labels.join(" > "));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No navigation entry links to {}", cmd.link);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn handle_check(config: &Config, cmd: CheckCommand) -> CmdResult {
    let root = config.doc_root(cmd.root);
    let docset = DocSet::load(&root, &config.source)?;
    let report = docset.check();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for finding in &report.findings {
            println!("{}: {}", finding.severity, finding.message);
        }
        println!(
            "{} navigation nodes, {} search entries, {} warning(s)",
            docset.nav.len(),
            docset.search.len(),
            report.warnings().count()
        );
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> CmdResult {
    let storage = Storage::open(config.database_path())?;
    let stats = storage.stats()?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("docindex status");
        println!("---------------");
        println!("Database:        {}", storage.path().display());
        println!("Source files:    {}", stats.sources);
        println!("Nav nodes:       {}", stats.nav_nodes);
        println!("Search entries:  {}", stats.search_entries);
        println!("Search targets:  {}", stats.search_targets);
        match stats.last_indexed {
            Some(at) => println!("Last indexed:    {}", at.to_rfc3339()),
            None => println!("Last indexed:    never"),
        }
        println!("Database size:   {} bytes", stats.db_size_bytes);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config_file: PathBuf, cmd: ConfigCommand) -> CmdResult {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(Some(config_file))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!();
                println!("[Source]");
                println!("  Doc root:        {}", config.doc_root(None).display());
                println!("  Navtree file:    {}", config.source.navtree_file);
                println!("  Search dir:      {}", config.source.search_dir);
                println!();
                println!("[Search]");
                println!("  Mode:            {}", config.search.mode);
                println!("  Case sensitive:  {}", config.search.case_sensitive);
                println!("  Default limit:   {}", config.search.default_limit);
            }
        }
        ConfigCommand::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or(config_file);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
