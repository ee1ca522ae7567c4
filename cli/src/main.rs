mod format;
mod history;
mod logging;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use practice_core::time::parse_date_key;
use practice_core::{resolve_piece, Config, FileKeyValueRepository, Outcome, PracticeStore};
use tracing::debug;

#[derive(Parser)]
#[command(name = "practice")]
#[command(about = "Log daily practice minutes for up to ten pieces", long_about = None)]
struct Cli {
    /// Directory holding pieces.json and practiceLog.json (default: ~/.practice)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start tracking a new piece (usage: add Clair de Lune)
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        name: Vec<String>,
    },
    /// Stop tracking a piece and delete its history
    Remove {
        /// Piece id, id prefix, or name
        piece: String,
    },
    /// Add minutes to today's total for a piece
    Log {
        /// Piece id, id prefix, or name
        piece: String,
        minutes: String,
    },
    /// List pieces with today's and overall minutes
    List,
    /// Show the daily history of a piece, newest first
    History {
        /// Piece id, id prefix, or name
        piece: String,
        /// Only show days on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
    },
    /// Open the Terminal User Interface
    Tui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    let data_dir = config.resolve_data_dir()?;

    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    if interactive {
        logging::init_file(&data_dir)?;
    } else {
        logging::init_stderr();
    }
    let repo = FileKeyValueRepository::new(Some(data_dir))?;
    debug!(data_dir = %repo.base_dir().display(), "starting");
    let mut store = PracticeStore::load(repo);

    match cli.command {
        Some(Commands::Add { name }) => match store.add_piece(&name.join(" "))? {
            Outcome::Applied(piece) => {
                println!("Piece added: {} (ID: {})", piece.name, piece.id.short());
                println!("  Slots used: {}/{}", store.len(), practice_core::MAX_PIECES);
            }
            Outcome::Rejected(reason) => println!("Error: {}", reason),
        },
        Some(Commands::Remove { piece }) => {
            let id = resolve_piece(&piece, store.pieces())?.id.clone();
            match store.remove_piece(&id)? {
                Outcome::Applied(piece) => println!("Removed {} and its history", piece.name),
                Outcome::Rejected(reason) => println!("Error: {}", reason),
            }
        }
        Some(Commands::Log { piece, minutes }) => {
            let target = resolve_piece(&piece, store.pieces())?.clone();
            if let Ok(m) = practice_core::parse_minutes(&minutes) {
                if m > config.max_minutes_per_entry {
                    println!(
                        "Error: entries are limited to {} minutes",
                        config.max_minutes_per_entry
                    );
                    return Ok(());
                }
            }
            match store.log_practice(&target.id, &minutes)? {
                Outcome::Applied(total) => {
                    println!("Logged {} for {}", minutes.trim(), target.name);
                    println!("  Today: {}", format::minutes_label(u64::from(total)));
                }
                Outcome::Rejected(reason) => println!("Error: {}", reason),
            }
        }
        Some(Commands::List) => {
            println!("{}", history::render_pieces(&store.summaries()));
        }
        Some(Commands::History { piece, since }) => {
            let since = since.as_deref().map(parse_date_key).transpose()?;
            let id = resolve_piece(&piece, store.pieces())?.id.clone();
            if let Some(mut summary) = store.summaries().into_iter().find(|s| s.id == id) {
                if let Some(since) = since {
                    summary.history.retain(|entry| entry.date >= since);
                }
                println!("{}", history::render_history(&summary));
            }
        }
        Some(Commands::Tui) | None => {
            tui::run(store, config.max_minutes_per_entry)?;
        }
    }
    Ok(())
}
