use anyhow::Context;
use clap::{Parser, Subcommand};
use editorlog_parse::{LogParser, LogProgress, MemorySink, ParseSummary, ParserConfig};
use editorlog_store::SqliteStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "editorlog")]
#[command(about = "Editor log performance tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an Editor.log file into a SQLite database
    Parse {
        /// Path to the log file
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Database to append the session to
        #[arg(long, value_name = "PATH", default_value = "editor_log.db")]
        db: PathBuf,

        /// Print the session as JSON instead of storing it
        #[arg(long)]
        json: bool,

        /// JSON file with parser settings
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Only report warnings and errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            path,
            db,
            json,
            config,
            quiet,
        } => {
            let default_filter = if quiet { "warn" } else { "info" };
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
                .init();

            let config = match config {
                Some(config_path) => ParserConfig::load_from_path(&config_path)?,
                None => ParserConfig::default(),
            };
            let parser = if quiet || json {
                LogParser::with_config(config)
            } else {
                LogParser::with_config(config).with_progress(LogProgress)
            };

            if json {
                let mut sink = MemorySink::new();
                parser.parse_file(&path, &mut sink)?;
                println!("{}", serde_json::to_string_pretty(&sink.sessions)?);
                return Ok(());
            }

            let mut store = SqliteStore::open(&db)
                .with_context(|| format!("opening database {}", db.display()))?;
            let session = parser.parse_file(&path, &mut store)?;
            let summary: ParseSummary = store.summary(session)?;
            println!("{summary}");
            log::info!("Session {} stored in {}", session.0, db.display());
        }
    }
    Ok(())
}
