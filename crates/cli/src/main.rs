//! Team mention command-line tool.
//!
//! Runs the mention filter over HTML files, shows which tokens the matcher
//! sees in a piece of text, and manages the SQLite organization/team
//! directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing_subscriber::EnvFilter;

use team_mentions_core::config::AppConfig;
use team_mentions_core::db::Database;
use team_mentions_core::identity::DirectoryFile;
use team_mentions_core::{find_mentions, FilterResult, HtmlDocument, TeamMentionFilter};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Team mention command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "team-mentions",
    version,
    about = "Render @org/team mentions in HTML"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when absent.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the log level from the config file (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Filter an HTML file (or stdin) and print the result.
    Render {
        /// Input file. Reads stdin when omitted.
        input: Option<PathBuf>,

        /// Treat the input as a full document instead of a fragment.
        #[arg(long)]
        document: bool,

        /// Print a JSON object with the HTML and the mentioned teams.
        #[arg(long)]
        json: bool,
    },

    /// List the mention tokens found in plain text, without resolving them.
    Scan {
        /// Text to scan.
        text: String,
    },

    /// Manage the SQLite directory named in the configuration.
    Directory {
        #[command(subcommand)]
        action: DirectoryAction,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./team-mentions.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Subcommand, Debug)]
enum DirectoryAction {
    /// Import organizations and teams from a TOML directory file.
    Import {
        /// Directory file to import.
        file: PathBuf,
    },
    /// List all teams.
    List,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { output } = &cli.command {
        init_logging(cli.log_level.as_deref().unwrap_or("warn"));
        return cmd_init(output);
    }

    let config = load_config(cli.config.as_deref())?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    match cli.command {
        Commands::Render {
            input,
            document,
            json,
        } => cmd_render(&config, input.as_deref(), document, json),
        Commands::Scan { text } => cmd_scan(&text),
        Commands::Directory { action } => cmd_directory(&config, action),
        Commands::Validate => cmd_validate(&config, cli.config.as_deref()),
        Commands::Init { .. } => unreachable!(),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            AppConfig::load_and_validate(path).context("failed to load configuration file")
        }
        None => Ok(AppConfig::default()),
    }
}

fn open_database(config: &AppConfig) -> Result<Database> {
    let path = config
        .directory
        .database
        .as_ref()
        .context("no [directory] database configured")?;
    Database::open(path).context("failed to open directory database")
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_render(config: &AppConfig, input: Option<&Path>, document: bool, json: bool) -> Result<()> {
    let source = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let filter = TeamMentionFilter::from_config(config).context("failed to open directory")?;

    let mut doc = if document {
        HtmlDocument::parse(&source)
    } else {
        HtmlDocument::parse_fragment(&source)
    };
    let result = filter.call(&mut doc).context("mention filter failed")?;
    tracing::info!(teams = result.mentioned_teams.len(), "rendered input");
    let html = doc.to_html();

    if json {
        println!("{}", render_json(&html, &result)?);
    } else {
        println!("{}", html);
    }
    Ok(())
}

fn render_json(html: &str, result: &FilterResult) -> Result<String> {
    let value = serde_json::json!({
        "html": html,
        "mentioned_teams": result.mentioned_teams,
    });
    serde_json::to_string_pretty(&value).context("failed to serialize output")
}

fn cmd_scan(text: &str) -> Result<()> {
    let tokens: Vec<_> = find_mentions(text).collect();
    if tokens.is_empty() {
        println!("No mentions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Mention", "Organization", "Team", "Span"]);
    for token in &tokens {
        table.add_row(vec![
            Cell::new(token.full_match),
            Cell::new(token.org_name),
            Cell::new(token.team_name),
            Cell::new(format!("{}..{}", token.start, token.end)),
        ]);
    }

    println!("{}", table);
    println!("{} mention(s) found", tokens.len());
    Ok(())
}

fn cmd_directory(config: &AppConfig, action: DirectoryAction) -> Result<()> {
    let db = open_database(config)?;

    match action {
        DirectoryAction::Import { file } => {
            let data = DirectoryFile::load(&file).context("failed to load directory file")?;
            let summary = db
                .import_directory(&data)
                .context("failed to import directory")?;
            println!(
                "Imported {} organization(s) and {} team(s) from {}",
                summary.orgs_added,
                summary.teams_added,
                file.display()
            );
            Ok(())
        }

        DirectoryAction::List => {
            let teams = db.list_teams().context("failed to list teams")?;
            if teams.is_empty() {
                println!("No teams found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["ID", "Organization", "Team", "Mention"]);
            for team in &teams {
                table.add_row(vec![
                    Cell::new(team.id),
                    Cell::new(&team.organization.login),
                    Cell::new(&team.name),
                    Cell::new(team.to_string()),
                ]);
            }

            println!("{}", table);
            println!("{} team(s)", teams.len());
            Ok(())
        }
    }
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# Team mention filter configuration

[filter]
base_url = "/"
# "span" renders <span class='team-mention'>, "link" renders a team link.
render = "span"
ignored_ancestors = ["pre", "code", "a"]

[directory]
# Set one of these.
# file = "directory.toml"
# database = "directory.db"

[logging]
level = "warn"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Point [directory] at a directory file or database");
    println!(
        "  2. Validate with: team-mentions validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => println!("Configuration {} is valid.", path.display()),
        None => println!("No configuration file given; defaults are valid."),
    }
    println!();
    println!("  Render style     : {:?}", config.filter.render);
    println!("  Base URL         : {}", config.filter.base_url);
    println!(
        "  Ignored elements : {}",
        config.filter.ignored_ancestors.join(", ")
    );
    let source = match (&config.directory.file, &config.directory.database) {
        (Some(file), _) => format!("file {}", file.display()),
        (_, Some(db)) => format!("database {}", db.display()),
        _ => "none".to_string(),
    };
    println!("  Directory        : {}", source);
    println!("  Log level        : {}", config.logging.level);
    Ok(())
}
