//! Blueprint CLI - create projects from local template directories

use anyhow::Result;
use blueprint_core::tui::CreateArgs;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter, e.g. `BLUEPRINT_LOG=blueprint_core=debug`
const LOG_ENV: &str = "BLUEPRINT_LOG";

#[derive(Parser, Debug)]
#[command(name = "blueprint")]
#[command(about = "CLI for creating projects from blueprint templates")]
#[command(version)]
pub struct Args {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project from a template
    New(CliCreateArgs),
    /// List the templates found in the template directories
    List(ListArgs),
}

#[derive(Parser, Debug, Default)]
pub struct CliCreateArgs {
    #[command(flatten)]
    pub dirs: TemplateDirs,

    /// Template to use, as category/name
    #[arg(short, long)]
    pub template: Option<String>,

    /// Project directory to create
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            template_dirs: args.dirs.resolve(),
            template: args.template,
            directory: args.directory,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub dirs: TemplateDirs,
}

#[derive(clap::Args, Debug, Default)]
pub struct TemplateDirs {
    /// Directory containing <category>/<name> templates; repeat to search several
    #[arg(
        long = "template-dir",
        env = "BLUEPRINT_TEMPLATE_DIR",
        value_delimiter = ','
    )]
    pub template_dirs: Vec<PathBuf>,
}

impl TemplateDirs {
    fn resolve(self) -> Vec<PathBuf> {
        if self.template_dirs.is_empty() {
            vec![PathBuf::from("templates")]
        } else {
            self.template_dirs
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Some(Command::List(list_args)) => {
            blueprint_core::templates::print_catalog(&list_args.dirs.resolve())
        }
        command => {
            // No subcommand provided, default to new (interactive mode)
            let create_args = match command {
                Some(Command::New(create_args)) => create_args,
                _ => CliCreateArgs::default(),
            };
            let result = blueprint_core::run(create_args.into(), CLI_VERSION).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
    }
}
