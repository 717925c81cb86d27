mod app;
mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stepwise",
    about = "Turn a task into an AI-generated checklist and work through it one step at a time",
    version,
    propagate_version = true,
    disable_help_subcommand = true
)]
struct Cli {
    /// Data root (default: auto-detect from .stepwise/, else the current directory)
    #[arg(long, global = true, env = "STEPWISE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a checklist from a description and/or a photo
    New {
        /// What you want to do
        description: Vec<String>,
        /// Photo of the thing you are working on
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Show a saved checklist
    Show {
        title: String,
    },

    /// Mark a step done or not done (unticking also unticks later steps)
    Toggle {
        title: String,
        id: u64,
        /// Toggle even if the previous step is incomplete
        #[arg(long)]
        force: bool,
    },

    /// Set or clear the note on a step
    Note {
        title: String,
        id: u64,
        /// Note text (omit to clear)
        text: Vec<String>,
    },

    /// Append a step of your own
    Add {
        title: String,
        text: Vec<String>,
    },

    /// Move a step from one position to another (1-based)
    Move {
        title: String,
        from: usize,
        to: usize,
    },

    /// Ask for help with whatever you are stuck on
    Help {
        title: String,
        issue: Vec<String>,
        /// Replace the current steps with the suggested plan
        #[arg(long)]
        apply: bool,
    },

    /// List saved tasks, newest first
    History,

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::New { description, image } => {
            cmd::new::run(&root, &description.join(" "), image.as_deref(), json)
        }
        Commands::Show { title } => cmd::step::show(&root, &title, json),
        Commands::Toggle { title, id, force } => cmd::step::toggle(&root, &title, id, force, json),
        Commands::Note { title, id, text } => {
            cmd::step::note(&root, &title, id, &text.join(" "), json)
        }
        Commands::Add { title, text } => cmd::step::add(&root, &title, &text.join(" "), json),
        Commands::Move { title, from, to } => cmd::step::move_to(&root, &title, from, to, json),
        Commands::Help {
            title,
            issue,
            apply,
        } => cmd::help::run(&root, &title, &issue.join(" "), apply, json),
        Commands::History => cmd::history::run(&root, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
