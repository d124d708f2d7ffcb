use std::{fs::read_to_string, path::Path};

use anyhow::Context;

use crate::{context::RequestContext, error::ScriptError, interpreter::Interpreter, parser::parse};

/// ScriptEngine parses templates and runs them against a request context.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptEngine;

impl ScriptEngine {
	/// Parse and run the template stored at `path`.
	pub fn run_file<P: AsRef<Path>>(&self, path: P, context: &mut RequestContext<'_>) -> Result<(), ScriptError> {
		let path = path.as_ref();
		let source =
			read_to_string(path).with_context(|| format!("Failed open template file {}", path.display()))?;
		self.run(&source, context)
	}

	/// Parse and run template source.
	pub fn run(&self, source: &str, context: &mut RequestContext<'_>) -> Result<(), ScriptError> {
		let document = parse(source)?;
		Interpreter::new(context).execute(&document)?;
		Ok(())
	}
}
