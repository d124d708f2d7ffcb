//! Named request handlers, addressed through `/ext/<Name>` or the route table.

use std::{collections::HashMap, fmt::Write as _, sync::Arc};

use crate::{context::RequestContext, error::server::ServerError};

pub type Worker = Arc<dyn Fn(&mut RequestContext<'_>) -> Result<(), ServerError> + Send + Sync>;

/// Worker lookup by name, filled before the server starts.
#[derive(Clone, Default)]
pub struct WorkerRegistry {
	workers: HashMap<String, Worker>,
}

impl WorkerRegistry {
	pub fn new() -> Self { Self::default() }

	/// A registry holding the built-in workers.
	pub fn with_builtin() -> Self {
		let mut registry = Self::new();
		registry.register("HelloWorker", hello);
		registry.register("EchoParams", echo_params);
		registry.register("SumWorker", sum);
		registry.register("BgColorWorker", bg_color);
		registry.register("Home", home);
		registry
	}

	pub fn register<F>(&mut self, name: impl Into<String>, worker: F)
	where
		F: Fn(&mut RequestContext<'_>) -> Result<(), ServerError> + Send + Sync + 'static,
	{
		self.workers.insert(name.into(), Arc::new(worker));
	}

	pub fn get(&self, name: &str) -> Option<Worker> { self.workers.get(name).cloned() }

	pub fn contains(&self, name: &str) -> bool { self.workers.contains_key(name) }

	pub fn names(&self) -> impl Iterator<Item = &str> { self.workers.keys().map(String::as_str) }
}

/// Run another route with the same context.
fn forward(context: &mut RequestContext<'_>, path: &str) -> Result<(), ServerError> {
	let dispatcher =
		context.dispatcher().ok_or_else(|| ServerError::NotFound(format!("{path} (no dispatcher available)")))?;
	dispatcher.dispatch_request(path, context)
}

fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}
	escaped
}

fn hello(context: &mut RequestContext<'_>) -> Result<(), ServerError> {
	context.set_mime_type("text/html")?;
	let mut page = String::from("<html><body><h1>Hello!!!</h1>");
	match context.parameter("name").map(str::trim).filter(|name| !name.is_empty()) {
		Some(name) => {
			let _ = write!(page, "<p>Your name has {} letters.</p>", name.chars().count());
		}
		None => page.push_str("<p>You did not send me your name!</p>"),
	}
	page.push_str("</body></html>");
	Ok(context.write_str(&page)?)
}

fn echo_params(context: &mut RequestContext<'_>) -> Result<(), ServerError> {
	context.set_mime_type("text/html")?;
	let parameters: Vec<(String, String)> = context
		.parameter_names()
		.map(|name| (name.to_string(), context.parameter(name).unwrap_or_default().to_string()))
		.collect();
	let session: Vec<(String, String)> = context
		.persistent_parameter_names()
		.into_iter()
		.filter_map(|name| context.persistent_parameter(&name).map(|value| (name, value)))
		.collect();

	let mut page = String::from("<html><body>");
	write_table(&mut page, "Parameters", parameters);
	write_table(&mut page, "Session", session);
	page.push_str("</body></html>");
	Ok(context.write_str(&page)?)
}

/// Append a two column table of `rows` sorted by name.
fn write_table(page: &mut String, title: &str, mut rows: Vec<(String, String)>) {
	rows.sort_unstable();
	let _ = write!(page, "<h2>{title}</h2><table border=\"1\"><tr><th>Name</th><th>Value</th></tr>");
	for (name, value) in rows {
		let _ = write!(page, "<tr><td>{}</td><td>{}</td></tr>", escape_html(&name), escape_html(&value));
	}
	page.push_str("</table>");
}

fn sum(context: &mut RequestContext<'_>) -> Result<(), ServerError> {
	let a = context.parameter("a").and_then(|a| a.trim().parse::<i64>().ok()).unwrap_or(1);
	let b = context.parameter("b").and_then(|b| b.trim().parse::<i64>().ok()).unwrap_or(2);
	let total = a.wrapping_add(b);

	context.set_temporary_parameter("varA", a.to_string());
	context.set_temporary_parameter("varB", b.to_string());
	context.set_temporary_parameter("zbroj", total.to_string());
	let image = if total % 2 == 0 { "/images/even.svg" } else { "/images/odd.svg" };
	context.set_temporary_parameter("imgName", image);

	forward(context, "/private/pages/calc.smscr")
}

fn bg_color(context: &mut RequestContext<'_>) -> Result<(), ServerError> {
	let color = context.parameter("bgcolor").map(str::to_string);
	let updated = match color {
		Some(color) if color.len() == 6 && color.bytes().all(|b| b.is_ascii_hexdigit()) => {
			context.set_persistent_parameter("bgcolor", color.to_ascii_uppercase());
			true
		}
		_ => false,
	};

	context.set_mime_type("text/html")?;
	let message = if updated { "Color updated." } else { "Color not updated." };
	Ok(context.write_str(&format!(
		"<html><body><p>{message}</p><p><a href=\"/index2.html\">Back to index</a></p></body></html>"
	))?)
}

fn home(context: &mut RequestContext<'_>) -> Result<(), ServerError> {
	let background = context.persistent_parameter("bgcolor").unwrap_or_else(|| "7F7F7F".to_string());
	context.set_temporary_parameter("background", background);
	forward(context, "/private/pages/home.smscr")
}
