
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tabwright::Env;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tabwright")]
#[command(about = "Drive the tabwright tab orchestrator from the command line")]
#[command(version)]
#[command(styles = styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default), json, or ndjson
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Configuration environment (dev, prod, test); defaults to $TABWRIGHT_ENV
	#[arg(long, global = true, value_name = "ENV")]
	pub env: Option<Env>,

	/// Directory holding system.<env>.json and the store
	#[arg(long, global = true, value_name = "DIR")]
	pub config_dir: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Replay a command script against the headless engine
	Run(RunArgs),

	/// Inspect the system configuration
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},

	/// Read and write the persistent key/value store
	Store(StoreArgs),
}

impl Commands {
	/// Name used in result envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Run(_) => "run",
			Commands::Config { action } => match action {
				ConfigAction::Show => "config.show",
				ConfigAction::Path => "config.path",
			},
			Commands::Store(args) => match args.action {
				StoreAction::Get { .. } => "store.get",
				StoreAction::Set { .. } => "store.set",
				StoreAction::Remove { .. } => "store.remove",
				StoreAction::Clear => "store.clear",
			},
		}
	}
}

#[derive(Args, Debug)]
pub struct RunArgs {
	/// Script with one command per line (JSON), `#` comments allowed
	#[arg(value_name = "SCRIPT")]
	pub script: PathBuf,

	/// Treat the proxy entitlement as missing and redirect to this path
	#[arg(long, value_name = "PATH")]
	pub deny_proxy: Option<String>,

	/// Initial window size
	#[arg(long, value_name = "WxH", default_value = "1280x800")]
	pub window: WindowSize,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
	/// Print the resolved configuration with credentials masked
	Show,
	/// Print the configuration file path
	Path,
}

#[derive(Args, Debug)]
pub struct StoreArgs {
	/// Store file (defaults to store.json in the configuration directory)
	#[arg(long, value_name = "FILE")]
	pub file: Option<PathBuf>,

	#[command(subcommand)]
	pub action: StoreAction,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum StoreAction {
	/// Print the value stored under KEY
	Get { key: String },
	/// Store VALUE under KEY; VALUE is parsed as JSON, else kept as a string
	Set { key: String, value: String },
	/// Remove KEY
	Remove { key: String },
	/// Remove every key
	Clear,
}

/// Window dimensions, written `1280x800`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowSize {
	pub width: u32,
	pub height: u32,
}

impl Default for WindowSize {
	fn default() -> Self {
		Self {
			width: 1280,
			height: 800,
		}
	}
}

impl FromStr for WindowSize {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (width, height) = s
			.split_once(['x', 'X'])
			.ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
		let parse = |v: &str| {
			v.trim()
				.parse::<u32>()
				.ok()
				.filter(|n| *n > 0)
				.ok_or_else(|| format!("invalid dimension '{v}'"))
		};
		Ok(Self {
			width: parse(width)?,
			height: parse(height)?,
		})
	}
}

impl fmt::Display for WindowSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default().bold())
		.usage(AnsiColor::Yellow.on_default().bold())
		.literal(AnsiColor::Green.on_default())
		.placeholder(AnsiColor::Blue.on_default())
}
