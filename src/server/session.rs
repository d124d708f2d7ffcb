//! Session store keyed by the `sid` cookie.
//!
//! All bookkeeping happens under one lock: lookup-or-create and the expiry
//! sweep are each a single critical section, so a session is never handed out
//! while the sweep drops it. Parameter values live behind their own lock in
//! [`PersistentParameters`] and are never touched while the store is locked.

use std::{collections::HashMap, sync::{Mutex, MutexGuard}, time::{Duration, Instant}};

use rand::Rng;

use crate::context::PersistentParameters;

/// Length of a generated session id.
pub const SESSION_ID_LENGTH: usize = 20;

#[derive(Debug)]
struct SessionEntry {
	host:        String,
	valid_until: Instant,
	parameters:  PersistentParameters,
}

#[derive(Debug)]
pub struct SessionStore {
	sessions: Mutex<HashMap<String, SessionEntry>>,
	timeout:  Duration,
}

impl SessionStore {
	pub fn new(timeout: Duration) -> Self { Self { sessions: Mutex::new(HashMap::new()), timeout } }

	fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
		self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Find the live session `sid` bound to `host`, or open a new one.
	///
	/// The returned session's expiry is pushed to now plus the timeout.
	pub fn resolve(&self, sid: Option<&str>, host: &str) -> (String, PersistentParameters) {
		let now = Instant::now();
		let mut sessions = self.lock();

		if let Some(sid) = sid {
			match sessions.get_mut(sid) {
				Some(entry) if entry.valid_until <= now => {
					sessions.remove(sid);
				}
				Some(entry) if entry.host == host => {
					entry.valid_until = now + self.timeout;
					return (sid.to_string(), entry.parameters.clone());
				}
				_ => {}
			}
		}

		let sid = loop {
			let candidate = generate_sid();
			if !sessions.contains_key(&candidate) {
				break candidate;
			}
		};
		let parameters = PersistentParameters::new();
		sessions.insert(sid.clone(), SessionEntry {
			host: host.to_string(),
			valid_until: now + self.timeout,
			parameters: parameters.clone(),
		});
		(sid, parameters)
	}

	/// Drop every expired session, returning how many were removed.
	pub fn sweep(&self) -> usize {
		let now = Instant::now();
		let mut sessions = self.lock();
		let before = sessions.len();
		sessions.retain(|_, entry| entry.valid_until > now);
		before - sessions.len()
	}

	pub fn len(&self) -> usize { self.lock().len() }

	pub fn is_empty(&self) -> bool { self.lock().is_empty() }
}

/// Random id of uppercase ASCII letters.
fn generate_sid() -> String {
	let mut rng = rand::thread_rng();
	(0..SESSION_ID_LENGTH).map(|_| char::from(rng.gen_range(b'A'..=b'Z'))).collect()
}
