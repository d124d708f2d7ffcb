//! Reading and parsing of the request header.

use std::{collections::HashMap, io::{BufRead, Read}};

use crate::{context::parse_cookie_header, error::server::ServerError};

/// Upper bound for the whole request header.
pub const MAX_HEADER_SIZE: usize = 16 * 1024;

/// A parsed request line with its header fields
#[derive(Debug, Clone, PartialEq)]
pub struct RequestHeader {
	pub method:  String,
	/// Path without the query string
	pub path:    String,
	pub query:   Option<String>,
	pub version: String,
	/// Header fields in arrival order, names as sent
	pub headers: Vec<(String, String)>,
}

/// Read header lines up to the blank line that ends them.
///
/// Returns `None` if the client closed the connection without sending anything.
pub fn read_header_lines(reader: &mut impl BufRead) -> Result<Option<Vec<String>>, ServerError> {
	let mut lines = Vec::new();
	let mut size = 0;
	let mut line = Vec::new();
	loop {
		line.clear();
		// One byte past the budget is enough to tell the header is too long.
		let budget = (MAX_HEADER_SIZE - size + 1) as u64;
		let read = reader.by_ref().take(budget).read_until(b'\n', &mut line)?;
		if read == 0 {
			if size == 0 {
				return Ok(None);
			}
			return Err(ServerError::BadRequest("connection closed inside the header".to_string()));
		}
		size += read;
		if size > MAX_HEADER_SIZE {
			return Err(ServerError::BadRequest(format!("header exceeds {MAX_HEADER_SIZE} bytes")));
		}
		let text = String::from_utf8_lossy(&line);
		let text = text.trim_end_matches(['\r', '\n']);
		if text.is_empty() {
			if lines.is_empty() {
				// Stray line break before the request line.
				continue;
			}
			return Ok(Some(lines));
		}
		lines.push(text.to_string());
	}
}

/// Read and parse a request header.
pub fn read_request(reader: &mut impl BufRead) -> Result<Option<RequestHeader>, ServerError> {
	read_header_lines(reader)?.map(|lines| RequestHeader::parse(&lines)).transpose()
}

impl RequestHeader {
	pub fn parse(lines: &[String]) -> Result<Self, ServerError> {
		let request_line = lines.first().ok_or_else(|| ServerError::BadRequest("empty request".to_string()))?;
		let parts: Vec<&str> = request_line.split_whitespace().collect();
		let [method, target, version] = parts[..] else {
			return Err(ServerError::BadRequest(format!("malformed request line '{request_line}'")));
		};
		if method != "GET" {
			return Err(ServerError::BadRequest(format!("unsupported method '{method}'")));
		}
		if version != "HTTP/1.0" && version != "HTTP/1.1" {
			return Err(ServerError::BadRequest(format!("unsupported version '{version}'")));
		}
		if !target.starts_with('/') {
			return Err(ServerError::BadRequest(format!("malformed path '{target}'")));
		}
		let (path, query) = match target.split_once('?') {
			Some((path, query)) => (path.to_string(), Some(query.to_string())),
			None => (target.to_string(), None),
		};

		let mut headers: Vec<(String, String)> = Vec::new();
		for line in &lines[1..] {
			if line.starts_with([' ', '\t']) {
				// Folded continuation of the previous field.
				if let Some((_, value)) = headers.last_mut() {
					value.push(' ');
					value.push_str(line.trim());
				}
				continue;
			}
			if let Some((name, value)) = line.split_once(':') {
				headers.push((name.trim().to_string(), value.trim().to_string()));
			}
		}

		Ok(Self { method: method.to_string(), path, query, version: version.to_string(), headers })
	}

	/// First header field with the given name, compared case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(field, _)| field.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
	}

	/// Host name from the `Host` field, without the port.
	pub fn host(&self) -> Option<String> {
		let host = self.header("Host")?.trim();
		let host = if host.starts_with('[') {
			host.split_inclusive(']').next().unwrap_or(host)
		} else {
			host.split(':').next().unwrap_or(host)
		};
		(!host.is_empty()).then(|| host.to_string())
	}

	/// Value of a request cookie.
	pub fn cookie(&self, name: &str) -> Option<String> {
		self.headers
			.iter()
			.filter(|(field, _)| field.eq_ignore_ascii_case("Cookie"))
			.flat_map(|(_, value)| parse_cookie_header(value))
			.find(|(cookie, _)| cookie == name)
			.map(|(_, value)| value)
	}

	pub fn parameters(&self) -> HashMap<String, String> { self.query.as_deref().map(parse_query).unwrap_or_default() }
}

/// Split `name=value&name=value` pairs, a name without `=` gets an empty value.
pub fn parse_query(query: &str) -> HashMap<String, String> {
	query
		.split('&')
		.filter(|pair| !pair.is_empty())
		.map(|pair| pair.split_once('=').unwrap_or((pair, "")))
		.filter(|(name, _)| !name.is_empty())
		.map(|(name, value)| (name.to_string(), value.to_string()))
		.collect()
}

#[cfg(test)]
mod tests {
	use std::io::{BufReader, Cursor};

	use super::*;

	fn read(raw: &str) -> Result<Option<RequestHeader>, ServerError> { read_request(&mut Cursor::new(raw.as_bytes())) }

	#[test]
	fn parse_get_request() {
		let header = read(
			"GET /ext/EchoParams?name=Ivo&age=3&flag HTTP/1.1\r\nHost: localhost:5721\r\nCookie: sid=\"ABC\"; a=b\r\n\r\n",
		)
		.unwrap()
		.unwrap();
		assert_eq!(header.method, "GET");
		assert_eq!(header.path, "/ext/EchoParams");
		assert_eq!(header.version, "HTTP/1.1");
		assert_eq!(header.host(), Some("localhost".to_string()));
		assert_eq!(header.cookie("sid"), Some("ABC".to_string()));
		assert_eq!(header.cookie("missing"), None);

		let parameters = header.parameters();
		assert_eq!(parameters.get("name").map(String::as_str), Some("Ivo"));
		assert_eq!(parameters.get("age").map(String::as_str), Some("3"));
		assert_eq!(parameters.get("flag").map(String::as_str), Some(""));
	}

	#[test]
	fn accept_bare_newlines_and_folded_fields() {
		let header = read("GET / HTTP/1.0\nX-Long: first\n  second\nhost: [::1]:80\n\n").unwrap().unwrap();
		assert_eq!(header.header("x-long"), Some("first second"));
		assert_eq!(header.host(), Some("[::1]".to_string()));
		assert!(header.parameters().is_empty());
	}

	#[test]
	fn reject_malformed_requests() {
		for raw in [
			"POST / HTTP/1.1\r\n\r\n",
			"GET / HTTP/2.0\r\n\r\n",
			"GET /\r\n\r\n",
			"GET / HTTP/1.1 extra\r\n\r\n",
			"GET index.html HTTP/1.1\r\n\r\n",
			"GET / HTTP/1.1\r\nHost: x\r\n",
		] {
			assert!(matches!(read(raw), Err(ServerError::BadRequest(_))), "{raw:?}");
		}
	}

	/// Endless stream of one byte without any line break
	struct Endless {
		pulled: usize,
	}

	impl Read for Endless {
		fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
			buf.fill(b'a');
			self.pulled += buf.len();
			Ok(buf.len())
		}
	}

	#[test]
	fn endless_line_is_cut_at_header_limit() {
		let mut source = Endless { pulled: 0 };
		let mut reader = BufReader::new(&mut source);
		assert!(matches!(read_header_lines(&mut reader), Err(ServerError::BadRequest(_))));
		drop(reader);
		assert!(source.pulled <= MAX_HEADER_SIZE + 8 * 1024, "pulled {} bytes", source.pulled);
	}

	#[test]
	fn empty_connection_is_not_an_error() {
		assert_eq!(read("").unwrap(), None);
	}

	#[test]
	fn oversized_header_is_rejected() {
		let raw = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "a".repeat(MAX_HEADER_SIZE));
		assert!(matches!(read(&raw), Err(ServerError::BadRequest(_))));
	}
}
