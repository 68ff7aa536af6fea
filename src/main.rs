use anyhow::Context;
use anyhow::Result;
use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use log::info;
use pi_relays::Config;
use pi_relays::NumberingMode;
use pi_relays::RelayBoard;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about = "Trigger GPIO relays declared in a configuration file")]
struct Args {
    /// Configuration file, searched in ./, /etc and /etc/pi-relays when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pin numbering scheme (BCM or BOARD), overrides the configuration
    #[arg(long, value_parser = parse_mode)]
    mode: Option<NumberingMode>,

    /// Warn about channels that are already in use
    #[arg(long)]
    warnings: bool,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the configured relays in declaration order
    List,
    /// Validate the configuration and detect the GPIO hardware
    Check,
    /// Pulse one or more relays, one after the other
    Trigger {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn parse_mode(mode: &str) -> Result<NumberingMode, String> {
    match mode.to_ascii_uppercase().as_str() {
        "BCM" => Ok(NumberingMode::Bcm),
        "BOARD" => Ok(NumberingMode::Board),
        unknown => Err(format!("Unknown numbering mode '{}'", unknown)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    stderrlog::new()
        .module(module_path!())
        .quiet(args.quiet)
        .verbosity(args.verbose as usize + 1)
        .init()?;

    let mut config = match &args.config {
        Some(path) => Config::load(path),
        None => Config::locate(),
    }
    .context("Failed to load configuration")?;

    if let Some(mode) = args.mode {
        config.gpio.mode = mode;
    }
    if args.warnings {
        config.gpio.warnings = true;
    }

    let board = config
        .build_board()
        .context("Invalid relay configuration")?;

    match args.command {
        Command::List => list(&config, &board),
        Command::Check => check(board),
        Command::Trigger { ids } => trigger(board, &ids),
    }
}

fn list(config: &Config, board: &RelayBoard) -> Result<()> {
    if let Some(title) = &config.title {
        println!("{}", title);
    }
    for relay in board.relays() {
        println!("{}\t{}", relay.id(), relay.name());
    }
    Ok(())
}

fn check(mut board: RelayBoard) -> Result<()> {
    let result = board.init().context("Failed to initialize relay board");
    board.cleanup();
    result?;

    println!(
        "{} relay(s) configured, GPIO hardware {}",
        board.len(),
        match board.is_active() {
            true => "active",
            false => "not available",
        }
    );
    Ok(())
}

fn trigger(mut board: RelayBoard, ids: &[String]) -> Result<()> {
    let result = trigger_all(&mut board, ids);
    board.cleanup();
    result
}

fn trigger_all(board: &mut RelayBoard, ids: &[String]) -> Result<()> {
    board.init().context("Failed to initialize relay board")?;
    for id in ids {
        board
            .trigger_relay(id)
            .with_context(|| format!("Failed to trigger relay '{}'", id))?;
        info!("Relay '{}' triggered", id);
    }
    Ok(())
}
