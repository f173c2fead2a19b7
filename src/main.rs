use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::Result;
use std::path::PathBuf;
use std::process;
use todostore::view::{error_message, render_html, render_lines};
use todostore::{Backend, Config, Storage, TaskFilter, TodoStore, ValidationError};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Manage a to-do list kept in local storage")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (default: <data-dir>/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the stored tasks
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Storage key the task list is kept under
    #[arg(short, long)]
    key: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task at the top of the list
    Add {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Mark a task complete, or incomplete again
    Toggle { id: i64 },

    /// Delete a task
    Delete { id: i64 },

    /// Replace the text of a task
    Edit {
        id: i64,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Delete every completed task
    ClearCompleted,

    /// Show tasks
    List {
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,

        /// Print the visible tasks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how many tasks are left
    Count,

    /// Render the task list as HTML
    Html {
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let message = error_message(&e);
        if e.downcast_ref::<ValidationError>().is_some() {
            eprintln!("{}", message.yellow());
        } else {
            eprintln!("{}", message.red());
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Setup tracing before anything logs; the level is settled once the
    // config is known
    let initial = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let (level_filter, level_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(level_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref(), cli.data_dir.as_deref())?.with_overrides(
        cli.data_dir,
        cli.backend,
        cli.key,
    );
    config.validate()?;

    if !cli.verbose {
        let level: tracing::Level = config.log_level.parse().unwrap_or(tracing::Level::WARN);
        level_handle.modify(|filter| *filter = LevelFilter::from_level(level))?;
    }

    let storage = config.open_storage()?;
    let mut store = TodoStore::open_with_key(storage, &config.storage_key)?;

    match cli.command {
        Commands::Add { text } => {
            let id = store.add(&text.join(" "))?;
            println!("Added task {}", id);
            print_list(&store);
        }
        Commands::Toggle { id } => {
            if store.toggle(id)? {
                print_list(&store);
            } else {
                report_missing(id);
            }
        }
        Commands::Delete { id } => {
            if store.delete(id)? {
                println!("Deleted task {}", id);
                print_list(&store);
            } else {
                report_missing(id);
            }
        }
        Commands::Edit { id, text } => {
            if store.edit(id, &text.join(" "))? {
                print_list(&store);
            } else {
                report_missing(id);
            }
        }
        Commands::ClearCompleted => {
            let removed = store.clear_completed()?;
            println!("Cleared {} completed {}", removed, if removed == 1 { "task" } else { "tasks" });
            print_list(&store);
        }
        Commands::List { filter, json } => {
            store.set_filter(filter);
            if json {
                let tasks: Vec<_> = store.visible_tasks().collect();
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print_list(&store);
            }
        }
        Commands::Count => {
            println!("{}", todostore::view::count_label(store.active_count()));
        }
        Commands::Html { filter } => {
            store.set_filter(filter);
            print!("{}", render_html(&store));
        }
    }

    Ok(())
}

fn print_list<S: Storage>(store: &TodoStore<S>) {
    for line in render_lines(store) {
        println!("{}", line);
    }
}

fn report_missing(id: i64) {
    println!("{}", format!("No task with id {}", id).dimmed());
}
