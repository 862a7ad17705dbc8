mod app;
mod command;
mod logger;
mod render;
mod search;

use annotate::addr_space::Location;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Annotated disassembly viewer
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the project file
    pub project: PathBuf,
    /// Path to the engine configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// View to show first
    #[arg(long, value_enum, default_value_t = app::ViewKind::Asm)]
    pub view: app::ViewKind,
    /// Source to disassemble, written REGION:ADDRESS
    #[arg(long)]
    pub source: Option<Location>,
    /// Print the first page and exit
    #[arg(long)]
    pub dump: bool,
    /// Log more, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Log errors only
    #[arg(short, long)]
    pub quiet: bool,
}

fn main_err() -> Result<(), String> {
    let args = Args::parse();
    logger::init(args.verbose, args.quiet);

    app::App::run(args).map_err(|err| err.to_string())
}

fn main() {
    if let Err(err) = main_err() {
        eprintln!("\x1b[1;31merror:\x1b[m {err}");
    }
}
