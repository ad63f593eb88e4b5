//! `tablon` command-line board.
//!
//! # Responsibility
//! - Drive the board core against the SQLite storage at `TABLON_DB_PATH`.
//! - Print line-oriented output; `list` never changes the stored filter.

use clap::{Parser, Subcommand};
use log::info;
use std::env;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tablon_core::db::open_db;
use tablon_core::model::note::DATE_FORMAT;
use tablon_core::{
    core_version, format_display_date, init_logging_from_config, ping, today_local, visible_notes,
    BoardConfig, BoardService, FilterMode, KeyValueStorage, Note, SqliteKeyValueStorage,
};

type CliResult = Result<(), Box<dyn Error>>;

/// tablon - sticky-note board
#[derive(Parser, Debug)]
#[command(name = "tablon")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Create a note
    Add {
        /// Note text (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,

        /// Due date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Priority 1-3; out-of-range values are clamped
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Show visible notes, optionally through another filter
    #[command(alias = "ls")]
    List {
        /// hoy | semana | todas (or TODAY | WEEK | ALL)
        filter: Option<String>,
    },

    /// Mark a note completed
    Complete {
        /// Note id
        id: String,
    },

    /// Delete a note (asks for confirmation)
    Delete {
        /// Note id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Write the export file into a directory
    Export {
        /// Target directory (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Replace the board with an exported file
    Import {
        /// Export file to read
        file: PathBuf,
    },

    /// Set and store the active filter
    Filter {
        /// hoy | semana | todas (or TODAY | WEEK | ALL)
        filter: String,
    },

    /// Core health check
    Ping,

    /// Core crate version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> CliResult {
    match command {
        Command::Ping => {
            println!("tablon_core ping={}", ping());
            return Ok(());
        }
        Command::Version => {
            println!("tablon_core version={}", core_version());
            return Ok(());
        }
        _ => {}
    }

    let config = BoardConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: file logging disabled: {err}");
    }
    let conn = open_db(&config.db_path)?;
    let storage = SqliteKeyValueStorage::try_new(&conn)?;
    let mut board = BoardService::open(storage, &config);
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&command)
    );
    execute(&mut board, command)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Add { .. } => "add",
        Command::List { .. } => "list",
        Command::Complete { .. } => "complete",
        Command::Delete { .. } => "delete",
        Command::Export { .. } => "export",
        Command::Import { .. } => "import",
        Command::Filter { .. } => "filter",
        Command::Ping => "ping",
        Command::Version => "version",
    }
}

fn execute<S: KeyValueStorage>(board: &mut BoardService<S>, command: Command) -> CliResult {
    match command {
        Command::Add {
            text,
            date,
            priority,
        } => add_note(board, &text.join(" "), date, priority),
        Command::List { filter } => {
            list_notes(board, filter.as_deref());
            Ok(())
        }
        Command::Complete { id } => {
            complete_note(board, &id);
            Ok(())
        }
        Command::Delete { id, yes } => {
            delete_note(board, &id, yes);
            Ok(())
        }
        Command::Export { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => env::current_dir()?,
            };
            export_notes(board, &dir)
        }
        Command::Import { file } => import_notes(board, &file),
        Command::Filter { filter } => {
            set_filter(board, &filter);
            Ok(())
        }
        Command::Ping | Command::Version => Ok(()),
    }
}

fn add_note<S: KeyValueStorage>(
    board: &mut BoardService<S>,
    text: &str,
    date: Option<String>,
    priority: Option<String>,
) -> CliResult {
    let date = date.unwrap_or_else(|| today_local().format(DATE_FORMAT).to_string());
    let note = board.create_note(text, &date, priority)?;
    println!("Created {}", note.id);
    Ok(())
}

/// Notes to print for `list`. A `filter` token only shapes this output.
fn listed_notes<S: KeyValueStorage>(
    board: &BoardService<S>,
    filter: Option<&str>,
) -> (FilterMode, Vec<Note>) {
    match filter {
        Some(token) => {
            let mode = FilterMode::parse_lenient(token);
            (
                mode,
                visible_notes(board.store().notes(), mode, board.today()),
            )
        }
        None => (board.store().filter(), board.visible_notes()),
    }
}

fn list_notes<S: KeyValueStorage>(board: &BoardService<S>, filter: Option<&str>) {
    let (mode, visible) = listed_notes(board, filter);
    println!("filter: {mode}");
    if visible.is_empty() {
        println!("No notes.");
    }
    for note in &visible {
        println!("{}", render_line(note));
    }
}

fn render_line(note: &Note) -> String {
    let mark = if note.is_completed() { "x" } else { " " };
    format!(
        "[{mark}] {}  {}  P{}  {}",
        note.id,
        format_display_date(&note.date),
        note.priority,
        note.text
    )
}

fn complete_note<S: KeyValueStorage>(board: &mut BoardService<S>, id: &str) {
    if board.complete_note(id) {
        println!("Completed {id}");
    } else {
        println!("No note with id {id}");
    }
}

fn delete_note<S: KeyValueStorage>(board: &mut BoardService<S>, id: &str, assume_yes: bool) {
    if board.store().get(id).is_none() {
        println!("No note with id {id}");
        return;
    }
    let deleted = if assume_yes {
        board.delete_note(id)
    } else {
        board.delete_note_confirmed(id, |_| prompt_confirm("Delete the note? [y/N] "))
    };
    if deleted {
        println!("Deleted {id}");
    } else {
        println!("Kept {id}");
    }
}

fn prompt_confirm(question: &str) -> bool {
    print!("{question}");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_affirmative(&answer)
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "s" | "si"
    )
}

fn export_notes<S: KeyValueStorage>(board: &BoardService<S>, dir: &Path) -> CliResult {
    let path = board.export_to_dir(dir)?;
    println!("Exported {} note(s) to {}", board.store().len(), path.display());
    Ok(())
}

fn import_notes<S: KeyValueStorage>(board: &mut BoardService<S>, file: &Path) -> CliResult {
    let count = board.import_file(file)?;
    println!("Imported {count} note(s)");
    Ok(())
}

fn set_filter<S: KeyValueStorage>(board: &mut BoardService<S>, token: &str) {
    let filter = FilterMode::parse_lenient(token);
    board.set_filter(filter);
    println!("filter: {filter}");
}
