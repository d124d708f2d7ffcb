#[cfg(test)]
mod tests {
	use std::{collections::HashMap, path::PathBuf};

	use smartserver::{PersistentParameters, RequestContext, ScriptEngine, ScriptError};

	fn webroot() -> PathBuf { PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("webroot") }

	fn body(response: &[u8]) -> String {
		let response = String::from_utf8_lossy(response);
		response.split_once("\r\n\r\n").map(|(_, body)| body.to_string()).unwrap_or_default()
	}

	fn run_file(relative: &str, parameters: &[(&str, &str)], persistent: &PersistentParameters) -> String {
		let mut output = Vec::new();
		let parameters = parameters.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		let mut context = RequestContext::new(&mut output, parameters, persistent.clone());
		ScriptEngine.run_file(webroot().join(relative), &mut context).unwrap();
		drop(context);
		body(&output)
	}

	#[test]
	fn test_basic_script() {
		let body = run_file("scripts/osnovni.smscr", &[], &PersistentParameters::new());
		assert!(body.starts_with("This is sample text.\n"));
		assert!(body.contains("This is 1-th time this message is generated."));
		assert!(body.contains("This is 10-th time this message is generated."));
		assert!(!body.contains("11-th"));
		assert!(body.contains("sin(0^2) = 0.000"));
		assert!(body.contains("sin(2^2) = 0.070"));
	}

	#[test]
	fn test_call_counter() {
		let persistent = PersistentParameters::new();
		assert!(run_file("scripts/brojPoziva.smscr", &[], &persistent).ends_with("Calls in this session: 1\n"));
		assert!(run_file("scripts/brojPoziva.smscr", &[], &persistent).ends_with("Calls in this session: 2\n"));
		assert_eq!(persistent.get("brojPoziva").as_deref(), Some("2"));
	}

	#[test]
	fn test_fibonacci() {
		let body = run_file("scripts/fibonacci.smscr", &[], &PersistentParameters::new());
		let numbers: Vec<&str> = body.lines().skip(1).filter(|line| !line.is_empty()).collect();
		assert_eq!(numbers, ["0", "1", "1", "2", "3", "5", "8", "13", "21", "34"]);
	}

	#[test]
	fn test_addition_with_parameters() {
		let body = run_file("scripts/zbrajanje.smscr", &[("a", "7"), ("b", "5")], &PersistentParameters::new());
		assert_eq!(body.trim_end(), "7 + 5 = 12");
		let body = run_file("scripts/zbrajanje.smscr", &[], &PersistentParameters::new());
		assert_eq!(body.trim_end(), "1 + 2 = 3");
	}

	#[test]
	fn test_inline_source() {
		let mut output = Vec::new();
		let mut context = RequestContext::new(&mut output, HashMap::new(), PersistentParameters::new());
		ScriptEngine.run("Hello {$= \"x\" $}! {$FOR i 1 3 1$}{$= i $} {$END$}", &mut context).unwrap();
		drop(context);
		assert_eq!(body(&output), "Hello x! 1 2 3 ");
	}

	#[test]
	fn test_script_errors() {
		let mut output = Vec::new();
		let mut context = RequestContext::new(&mut output, HashMap::new(), PersistentParameters::new());
		let engine = ScriptEngine;

		assert!(matches!(engine.run("{$FOR i 1 3$}", &mut context), Err(ScriptError::ParserError(_))));
		assert!(matches!(engine.run("{$= 1 0 / $}", &mut context), Err(ScriptError::RuntimeError(_))));
		assert!(matches!(
			engine.run_file(webroot().join("missing.smscr"), &mut context),
			Err(ScriptError::InternalError(_))
		));
	}
}
