use std::path::PathBuf;

use palc::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "smartserver", after_long_help = "Serves SmartScript pages over HTTP.")]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
	/// Start the server described by a JSON config file
	Serve { config: PathBuf },
	/// Run a script and print its output
	Run { path: PathBuf },
}
