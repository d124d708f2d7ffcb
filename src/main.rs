use std::{
	collections::HashMap,
	io::{BufRead, Write, stdin, stdout},
	process::ExitCode,
};

use palc::Parser;
use smartserver::{PersistentParameters, RequestContext, ScriptEngine, ServerConfig, SmartServer, cli::*};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let result = match Cli::parse().mode {
		Mode::Serve { config } => serve(&config),
		Mode::Run { path } => run(&path),
	};
	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{e:#}");
			ExitCode::FAILURE
		}
	}
}

fn serve(config: &std::path::Path) -> anyhow::Result<()> {
	let mut handle = SmartServer::new(ServerConfig::load(config)?).start()?;
	info!("Type 'stop' to shut the server down");

	for line in stdin().lock().lines() {
		if line?.trim().eq_ignore_ascii_case("stop") {
			handle.stop();
			return Ok(());
		}
	}
	// No console attached, serve until killed.
	handle.wait();
	Ok(())
}

fn run(path: &std::path::Path) -> anyhow::Result<()> {
	let mut buffer = Vec::new();
	{
		let mut context = RequestContext::new(&mut buffer, HashMap::new(), PersistentParameters::new());
		ScriptEngine.run_file(path, &mut context)?;
	}
	// Print the body only, the header is for HTTP clients.
	let body = match buffer.windows(4).position(|w| w == b"\r\n\r\n") {
		Some(end) => &buffer[end + 4..],
		None => &buffer[..],
	};
	let mut out = stdout().lock();
	out.write_all(body)?;
	out.flush()?;
	Ok(())
}
