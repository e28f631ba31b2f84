use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use statelens::config::{save_setting, Config};
use statelens::tape::{select_events, Tape};
use statelens::trace::DependencyTrace;
use statelens::{util, Synthesizer};

/// Inspect recorded dispatch tapes and synthesize tests from them.
#[derive(Parser, Debug)]
#[command(name = "statelens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory (defaults to ~/.statelens)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a test reproducing a run of recorded events
    Synth {
        /// Tape to read (defaults to the configured tape path)
        #[arg(long)]
        tape: Option<PathBuf>,

        /// JSON array of dependency traces, one per selected event
        #[arg(long)]
        traces: Option<PathBuf>,

        /// Select events by id, in tape order (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,

        /// First event index to include
        #[arg(long)]
        from: Option<usize>,

        /// Last event index to include
        #[arg(long)]
        to: Option<usize>,

        /// Write the test to a file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// List the events recorded on a tape
    List {
        #[arg(long)]
        tape: Option<PathBuf>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Set a value, e.g. `synth.indent 2`
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());

    // Initialize logging to file (~/.statelens/logs/statelens.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load();

    match cli.command {
        Command::Synth {
            tape,
            traces,
            ids,
            from,
            to,
            out,
        } => {
            let tape_path = tape.unwrap_or_else(|| config.tape_path.clone());
            let events = select_events(read_tape(&tape_path)?.events(), &ids, from, to);
            if events.is_empty() {
                bail!("no events selected from {}", tape_path.display());
            }

            let traces = traces.as_deref().map(read_traces).transpose()?;
            let source = Synthesizer::new(config.synth).synthesize(&events, traces.as_deref())?;

            match out {
                Some(path) => fs::write(&path, format!("{source}\n"))
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{source}"),
            }
        }
        Command::List { tape } => {
            let tape_path = tape.unwrap_or_else(|| config.tape_path.clone());
            for (index, event) in read_tape(&tape_path)?.events().iter().enumerate() {
                let commands = match event.commands.len() {
                    0 => String::new(),
                    1 => " (1 command)".to_string(),
                    n => format!(" ({n} commands)"),
                };
                println!("{index:>4}  {}  {} {}{commands}", event.id, event.name, event.message);
            }
        }
        Command::Config { action: None } => {
            println!("[synth]");
            println!("indent = {}", config.synth.indent);
            println!("line_width = {}", config.synth.line_width);
            println!();
            println!("[tape]");
            println!("path = {:?}", config.tape_path.display().to_string());
        }
        Command::Config {
            action: Some(ConfigAction::Path),
        } => println!("{}", util::config_path().display()),
        Command::Config {
            action: Some(ConfigAction::Set { key, value }),
        } => {
            save_setting(&util::config_path(), &key, &value)?;
            println!("{key} = {value}");
        }
    }

    Ok(())
}

fn read_tape(path: &Path) -> Result<Tape> {
    Tape::read_jsonl_from_path(path).with_context(|| format!("failed to read tape {}", path.display()))
}

fn read_traces(path: &Path) -> Result<Vec<DependencyTrace>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid traces in {}", path.display()))
}
