//! Per-request state shared by the server, workers and scripts.
//!
//! The response header is produced lazily: status, mime type, encoding and
//! cookies may be changed freely until the first body byte is written, at
//! which point the header goes out and the response metadata is gone. Any
//! later attempt to change it fails with [`ContextError::HeaderSent`].

mod cookie;

use std::{borrow::Cow, collections::HashMap, io::Write, sync::{Arc, Mutex, MutexGuard}};

pub use cookie::{Cookie, parse_cookie_header};

use crate::error::{context::ContextError, server::ServerError};

/// Runs another route with an existing context.
pub trait Dispatcher: Send + Sync {
	/// Resolve `path` as an internal request, which may reach private pages.
	fn dispatch_request(&self, path: &str, context: &mut RequestContext<'_>) -> Result<(), ServerError>;
}

/// Character sets a response body can be encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
	Utf8,
	Latin1,
	Ascii,
}

impl Charset {
	pub fn from_label(label: &str) -> Option<Self> {
		match label.trim().to_ascii_lowercase().as_str() {
			"utf-8" | "utf8" => Some(Charset::Utf8),
			"iso-8859-1" | "latin1" | "iso8859-1" => Some(Charset::Latin1),
			"us-ascii" | "ascii" => Some(Charset::Ascii),
			_ => None,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Charset::Utf8 => "UTF-8",
			Charset::Latin1 => "ISO-8859-1",
			Charset::Ascii => "US-ASCII",
		}
	}

	/// Encode `text`, characters outside the charset become `?`.
	pub fn encode<'t>(&self, text: &'t str) -> Cow<'t, [u8]> {
		let limit = match self {
			Charset::Utf8 => return Cow::Borrowed(text.as_bytes()),
			Charset::Latin1 => 0xFF,
			Charset::Ascii => 0x7F,
		};
		if text.is_ascii() {
			return Cow::Borrowed(text.as_bytes());
		}
		Cow::Owned(text.chars().map(|c| if c as u32 <= limit { c as u32 as u8 } else { b'?' }).collect())
	}
}

/// Session scoped parameters. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct PersistentParameters {
	inner: Arc<Mutex<HashMap<String, String>>>,
}

impl PersistentParameters {
	pub fn new() -> Self { Self::default() }

	pub fn get(&self, name: &str) -> Option<String> { self.lock().get(name).cloned() }

	pub fn set(&self, name: impl Into<String>, value: impl Into<String>) { self.lock().insert(name.into(), value.into()); }

	pub fn remove(&self, name: &str) -> Option<String> { self.lock().remove(name) }

	pub fn names(&self) -> Vec<String> { self.lock().keys().cloned().collect() }

	/// Whether both handles refer to the same map.
	pub fn same_as(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }

	/// A poisoned map is still consistent: every critical section is a single
	/// map operation.
	fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
		self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

/// Everything that ends up in the response header.
#[derive(Debug, Clone)]
struct ResponseHead {
	status_code:    u16,
	status_text:    String,
	mime_type:      String,
	charset:        Charset,
	content_length: Option<u64>,
	cookies:        Vec<Cookie>,
}

impl Default for ResponseHead {
	fn default() -> Self {
		Self {
			status_code:    200,
			status_text:    "OK".to_string(),
			mime_type:      "text/html".to_string(),
			charset:        Charset::Utf8,
			content_length: None,
			cookies:        Vec::new(),
		}
	}
}

impl ResponseHead {
	fn serialize(&self) -> String {
		let mut header = format!("HTTP/1.1 {} {}\r\n", self.status_code, self.status_text);
		header.push_str(&format!("Content-Type: {}", self.mime_type));
		if self.mime_type.starts_with("text/") {
			header.push_str(&format!("; charset={}", self.charset.label()));
		}
		header.push_str("\r\n");
		if let Some(length) = self.content_length {
			header.push_str(&format!("Content-Length: {length}\r\n"));
		}
		for cookie in &self.cookies {
			header.push_str(&format!("Set-Cookie: {cookie}\r\n"));
		}
		header.push_str("Connection: close\r\n\r\n");
		header
	}
}

/// Header emission state.
#[derive(Debug)]
enum ResponseState {
	Building(ResponseHead),
	Sent { charset: Charset },
}

/// Context of a single request
pub struct RequestContext<'a> {
	output:                &'a mut dyn Write,
	state:                 ResponseState,
	parameters:            HashMap<String, String>,
	persistent_parameters: PersistentParameters,
	temporary_parameters:  HashMap<String, String>,
	dispatcher:            Option<Arc<dyn Dispatcher>>,
}

impl<'a> RequestContext<'a> {
	pub fn new(
		output: &'a mut dyn Write,
		parameters: HashMap<String, String>,
		persistent_parameters: PersistentParameters,
	) -> Self {
		Self {
			output,
			state: ResponseState::Building(ResponseHead::default()),
			parameters,
			persistent_parameters,
			temporary_parameters: HashMap::new(),
			dispatcher: None,
		}
	}

	pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
		self.dispatcher = Some(dispatcher);
		self
	}

	/// Write body bytes, sending the header first if it hasn't been sent yet.
	pub fn write(&mut self, data: &[u8]) -> Result<(), ContextError> {
		self.send_header()?;
		self.output.write_all(data)?;
		Ok(())
	}

	/// Write text encoded with the current charset.
	pub fn write_str(&mut self, text: &str) -> Result<(), ContextError> {
		let charset = self.send_header()?;
		self.output.write_all(&charset.encode(text))?;
		Ok(())
	}

	pub fn flush(&mut self) -> Result<(), ContextError> { Ok(self.output.flush()?) }

	pub fn header_sent(&self) -> bool { matches!(self.state, ResponseState::Sent { .. }) }

	pub fn set_status_code(&mut self, code: u16) -> Result<(), ContextError> {
		self.head_mut()?.status_code = code;
		Ok(())
	}

	pub fn set_status_text(&mut self, text: impl Into<String>) -> Result<(), ContextError> {
		self.head_mut()?.status_text = text.into();
		Ok(())
	}

	pub fn set_mime_type(&mut self, mime_type: impl Into<String>) -> Result<(), ContextError> {
		self.head_mut()?.mime_type = mime_type.into();
		Ok(())
	}

	pub fn set_encoding(&mut self, label: &str) -> Result<(), ContextError> {
		let head = self.head_mut()?;
		head.charset = Charset::from_label(label).ok_or_else(|| ContextError::UnsupportedEncoding(label.to_string()))?;
		Ok(())
	}

	pub fn set_content_length(&mut self, length: u64) -> Result<(), ContextError> {
		self.head_mut()?.content_length = Some(length);
		Ok(())
	}

	pub fn add_cookie(&mut self, cookie: Cookie) -> Result<(), ContextError> {
		self.head_mut()?.cookies.push(cookie);
		Ok(())
	}

	pub fn parameter(&self, name: &str) -> Option<&str> { self.parameters.get(name).map(String::as_str) }

	pub fn parameter_names(&self) -> impl Iterator<Item = &str> { self.parameters.keys().map(String::as_str) }

	pub fn persistent_parameter(&self, name: &str) -> Option<String> { self.persistent_parameters.get(name) }

	pub fn set_persistent_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.persistent_parameters.set(name, value);
	}

	pub fn remove_persistent_parameter(&mut self, name: &str) -> Option<String> {
		self.persistent_parameters.remove(name)
	}

	pub fn persistent_parameter_names(&self) -> Vec<String> { self.persistent_parameters.names() }

	pub fn temporary_parameter(&self, name: &str) -> Option<&str> {
		self.temporary_parameters.get(name).map(String::as_str)
	}

	pub fn set_temporary_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.temporary_parameters.insert(name.into(), value.into());
	}

	pub fn remove_temporary_parameter(&mut self, name: &str) -> Option<String> {
		self.temporary_parameters.remove(name)
	}

	pub fn temporary_parameter_names(&self) -> impl Iterator<Item = &str> {
		self.temporary_parameters.keys().map(String::as_str)
	}

	pub fn dispatcher(&self) -> Option<Arc<dyn Dispatcher>> { self.dispatcher.clone() }

	fn head_mut(&mut self) -> Result<&mut ResponseHead, ContextError> {
		match &mut self.state {
			ResponseState::Building(head) => Ok(head),
			ResponseState::Sent { .. } => Err(ContextError::HeaderSent),
		}
	}

	/// Emit the header on first use and return the body charset.
	fn send_header(&mut self) -> Result<Charset, ContextError> {
		let head = match &self.state {
			ResponseState::Sent { charset } => return Ok(*charset),
			ResponseState::Building(head) => head,
		};
		let charset = head.charset;
		let header = head.serialize();
		self.output.write_all(&Charset::Latin1.encode(&header))?;
		self.state = ResponseState::Sent { charset };
		Ok(charset)
	}
}
