use std::fmt::Display;

/// A cookie sent to the client with `Set-Cookie`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
	pub name:      String,
	pub value:     String,
	pub domain:    Option<String>,
	pub path:      Option<String>,
	/// Lifetime in seconds, a session cookie if absent
	pub max_age:   Option<u64>,
	pub http_only: bool,
}

impl Cookie {
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into(), domain: None, path: None, max_age: None, http_only: false }
	}

	pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());
		self
	}

	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	pub fn with_max_age(mut self, max_age: u64) -> Self {
		self.max_age = Some(max_age);
		self
	}

	pub fn http_only(mut self) -> Self {
		self.http_only = true;
		self
	}
}

/// The value of a `Set-Cookie` header line.
impl Display for Cookie {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}=\"{}\"", self.name, self.value)?;
		if let Some(domain) = &self.domain {
			write!(f, "; Domain={domain}")?;
		}
		if let Some(path) = &self.path {
			write!(f, "; Path={path}")?;
		}
		if let Some(max_age) = self.max_age {
			write!(f, "; Max-Age={max_age}")?;
		}
		if self.http_only {
			write!(f, "; HttpOnly")?;
		}
		Ok(())
	}
}

/// Split the value of a request `Cookie` header into name/value pairs, quotes
/// around values are dropped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
	header
		.split(';')
		.filter_map(|pair| pair.split_once('='))
		.map(|(name, value)| {
			let value = value.trim();
			let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
			(name.trim().to_string(), value.to_string())
		})
		.filter(|(name, _)| !name.is_empty())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_cookie_format() {
		assert_eq!(Cookie::new("sid", "ABC").to_string(), r#"sid="ABC""#);
		let cookie = Cookie::new("korisnik", "hrvoje").with_domain("127.0.0.1").with_path("/").with_max_age(3600);
		assert_eq!(cookie.to_string(), r#"korisnik="hrvoje"; Domain=127.0.0.1; Path=/; Max-Age=3600"#);
		assert_eq!(Cookie::new("sid", "X").with_path("/").http_only().to_string(), r#"sid="X"; Path=/; HttpOnly"#);
	}

	#[test]
	fn parse_request_cookies() {
		let cookies = parse_cookie_header(r#"sid="ABCDEF"; theme=dark ;broken; =novalue"#);
		assert_eq!(
			cookies,
			vec![("sid".to_string(), "ABCDEF".to_string()), ("theme".to_string(), "dark".to_string())]
		);
	}
}
