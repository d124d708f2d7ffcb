#[cfg(test)]
mod tests {
	use std::{
		fs,
		io::{Read, Write},
		net::{SocketAddr, TcpStream},
		path::Path,
		thread,
	};

	use smartserver::{ServerConfig, ServerHandle, SmartServer};
	use tempfile::TempDir;

	fn webroot() -> TempDir {
		let root = tempfile::tempdir().unwrap();
		fs::create_dir_all(root.path().join("private/pages")).unwrap();
		fs::create_dir_all(root.path().join("scripts")).unwrap();
		fs::write(root.path().join("index.html"), "<h1>index</h1>").unwrap();
		fs::write(root.path().join("data.bin"), [0u8, 1, 2, 3]).unwrap();
		fs::write(root.path().join("scripts/loop.smscr"), "{$FOR i 1 3 1$}{$= i $} {$END$}").unwrap();
		fs::write(
			root.path().join("scripts/counter.smscr"),
			"{$= \"count\" \"0\" @pparamGet 1 + @dup \"count\" @pparamSet $}",
		)
		.unwrap();
		fs::write(root.path().join("scripts/broken.smscr"), "{$= 1 0 / $}").unwrap();
		fs::write(
			root.path().join("scripts/store.smscr"),
			"{$= \"value\" \"\" @paramGet \"key\" \"\" @paramGet @pparamSet \"key\" \"\" @paramGet \"?\" @pparamGet $}",
		)
		.unwrap();
		fs::write(root.path().join("private/pages/calc.smscr"), "{$= \"zbroj\" \"?\" @tparamGet $}").unwrap();
		fs::write(root.path().join("private/pages/home.smscr"), "#{$= \"background\" \"\" @tparamGet $}").unwrap();
		root
	}

	fn start(root: &Path) -> ServerHandle {
		let mut config = ServerConfig::new(root);
		config.port = 0;
		config.worker_threads = 2;
		config.mime_types.insert("html".to_string(), "text/html".to_string());
		config.workers.insert("/hello".to_string(), "HelloWorker".to_string());
		config.workers.insert("/calc".to_string(), "SumWorker".to_string());
		config.workers.insert("/cw".to_string(), "BgColorWorker".to_string());
		config.workers.insert("/home".to_string(), "Home".to_string());
		SmartServer::new(config).start().unwrap()
	}

	fn send(address: SocketAddr, raw: &str) -> String {
		let mut stream = TcpStream::connect(address).unwrap();
		stream.write_all(raw.as_bytes()).unwrap();
		let mut response = Vec::new();
		stream.read_to_end(&mut response).unwrap();
		String::from_utf8_lossy(&response).into_owned()
	}

	fn get(address: SocketAddr, path: &str, sid: Option<&str>) -> String {
		let cookie = sid.map(|sid| format!("Cookie: sid=\"{sid}\"\r\n")).unwrap_or_default();
		send(address, &format!("GET {path} HTTP/1.1\r\nHost: localhost:{}\r\n{cookie}\r\n", address.port()))
	}

	fn status(response: &str) -> &str { response.lines().next().unwrap_or_default() }

	fn body(response: &str) -> &str { response.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or_default() }

	fn sid(response: &str) -> String {
		let line = response.lines().find(|line| line.starts_with("Set-Cookie: sid=")).unwrap();
		line.trim_start_matches("Set-Cookie: sid=\"").split('"').next().unwrap().to_string()
	}

	#[test]
	fn test_static_files() {
		let root = webroot();
		let server = start(root.path());

		let response = get(server.local_addr(), "/index.html", None);
		assert_eq!(status(&response), "HTTP/1.1 200 OK");
		assert!(response.contains("Content-Type: text/html; charset=UTF-8\r\n"));
		assert!(response.contains("Content-Length: 14\r\n"));
		assert_eq!(body(&response), "<h1>index</h1>");

		let response = get(server.local_addr(), "/data.bin", None);
		assert!(response.contains("Content-Type: application/octet-stream\r\n"));
		assert!(response.contains("Content-Length: 4\r\n"));
	}

	#[test]
	fn test_error_statuses() {
		let root = webroot();
		let server = start(root.path());
		let address = server.local_addr();

		assert_eq!(status(&get(address, "/missing.html", None)), "HTTP/1.1 404 Not Found");
		assert_eq!(status(&get(address, "/ext/NoSuchWorker", None)), "HTTP/1.1 404 Not Found");
		assert_eq!(status(&get(address, "/../etc/passwd", None)), "HTTP/1.1 403 Forbidden");
		assert_eq!(status(&get(address, "/scripts/../../x.html", None)), "HTTP/1.1 403 Forbidden");
		assert_eq!(status(&send(address, "POST / HTTP/1.1\r\n\r\n")), "HTTP/1.1 400 Bad Request");
		assert_eq!(status(&send(address, "GET / HTTP/2.0\r\n\r\n")), "HTTP/1.1 400 Bad Request");
		assert_eq!(status(&send(address, "nonsense\r\n\r\n")), "HTTP/1.1 400 Bad Request");

		let response = get(address, "/scripts/broken.smscr", None);
		assert_eq!(status(&response), "HTTP/1.1 500 Internal Server Error");
		assert_eq!(body(&response), "");
	}

	#[test]
	fn test_script_page() {
		let root = webroot();
		let server = start(root.path());

		let response = get(server.local_addr(), "/scripts/loop.smscr", None);
		assert_eq!(status(&response), "HTTP/1.1 200 OK");
		assert_eq!(body(&response), "1 2 3 ");
		assert_eq!(response.matches("HTTP/1.1").count(), 1);
	}

	#[test]
	fn test_session_persistence() {
		let root = webroot();
		let server = start(root.path());
		let address = server.local_addr();

		let first = get(address, "/scripts/counter.smscr", None);
		assert_eq!(body(&first), "1");
		let session = sid(&first);
		assert_eq!(session.len(), 20);
		assert!(first.contains("; Domain=localhost; Path=/; HttpOnly\r\n"));

		let second = get(address, "/scripts/counter.smscr", Some(&session));
		assert_eq!(body(&second), "2");
		assert_eq!(sid(&second), session);

		let other = get(address, "/scripts/counter.smscr", None);
		assert_eq!(body(&other), "1");
		assert_ne!(sid(&other), session);

		let unknown = get(address, "/scripts/counter.smscr", Some("AAAAAAAAAAAAAAAAAAAA"));
		assert_eq!(body(&unknown), "1");
	}

	#[test]
	fn test_parallel_requests_share_session() {
		let root = webroot();
		let server = start(root.path());
		let address = server.local_addr();
		let session = sid(&get(address, "/index.html", None));

		let threads: Vec<_> = (0..8)
			.map(|t| {
				let session = session.clone();
				thread::spawn(move || {
					for round in 0..10 {
						let path = format!("/scripts/store.smscr?key=k{t}&value={t}-{round}");
						let response = get(address, &path, Some(&session));
						assert_eq!(status(&response), "HTTP/1.1 200 OK");
						assert_eq!(body(&response), format!("{t}-{round}"));
						assert_eq!(sid(&response), session);
					}
				})
			})
			.collect();
		for thread in threads {
			thread.join().unwrap();
		}

		let listing = get(address, "/ext/EchoParams", Some(&session));
		for t in 0..8 {
			assert!(body(&listing).contains(&format!("<td>k{t}</td><td>{t}-9</td>")), "k{t}");
		}
	}

	#[test]
	fn test_workers() {
		let root = webroot();
		let mut server = SmartServer::new({
			let mut config = ServerConfig::new(root.path());
			config.port = 0;
			config.worker_threads = 1;
			config.workers.insert("/shout".to_string(), "Shout".to_string());
			config
		});
		server.register_worker("Shout", |context| {
			let word = context.parameter("word").unwrap_or("nothing").to_uppercase();
			Ok(context.write_str(&word)?)
		});
		let server = server.start().unwrap();
		let address = server.local_addr();

		assert_eq!(body(&get(address, "/shout?word=hey", None)), "HEY");
		assert_eq!(body(&get(address, "/ext/Shout", None)), "NOTHING");
		assert!(body(&get(address, "/ext/HelloWorker?name=Ana", None)).contains("Your name has 3 letters."));
	}

	#[test]
	fn test_private_pages() {
		let root = webroot();
		let server = start(root.path());
		let address = server.local_addr();

		assert_eq!(status(&get(address, "/private/pages/calc.smscr", None)), "HTTP/1.1 404 Not Found");
		assert_eq!(body(&get(address, "/calc?a=20&b=22", None)), "42");
		assert!(body(&get(address, "/hello?name=Ivana", None)).contains("Your name has 5 letters."));

		let first = get(address, "/home", None);
		assert_eq!(body(&first), "#7F7F7F");
		let session = sid(&first);
		assert!(body(&get(address, "/cw?bgcolor=FF0000", Some(&session))).contains("Color updated."));
		assert_eq!(body(&get(address, "/home", Some(&session))), "#FF0000");
	}

	#[test]
	fn test_unknown_route_worker() {
		let root = webroot();
		let mut config = ServerConfig::new(root.path());
		config.port = 0;
		config.workers.insert("/x".to_string(), "Missing".to_string());
		assert!(SmartServer::new(config).start().is_err());
	}

	#[test]
	fn test_stop() {
		let root = webroot();
		let mut server = start(root.path());
		let address = server.local_addr();
		server.stop();
		server.stop();
		assert!(TcpStream::connect(address).is_err());
	}
}
