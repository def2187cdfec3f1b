use serde_json::json;

use super::*;

#[test]
fn success_envelope_omits_error() {
	let result = CommandResult::success("store.get", json!({ "key": "k", "value": 1 }));
	let value: serde_json::Value = serde_json::from_str(&render(&result, OutputFormat::Json)).unwrap();

	assert_eq!(value["ok"], json!(true));
	assert_eq!(value["command"], json!("store.get"));
	assert_eq!(value["data"]["value"], json!(1));
	assert!(value.get("error").is_none());
}

#[test]
fn failure_envelope_carries_code() {
	let result = CommandResult::<()>::failed(
		"run",
		CommandError {
			code: ErrorCode::ScriptError,
			message: "bad line".into(),
		},
	);
	let line = render(&result, OutputFormat::Ndjson);
	assert!(!line.contains('\n'));

	let value: serde_json::Value = serde_json::from_str(&line).unwrap();
	assert_eq!(value["ok"], json!(false));
	assert_eq!(value["error"]["code"], json!("SCRIPT_ERROR"));
	assert!(value.get("data").is_none());
}

#[test]
fn text_prints_strings_verbatim() {
	let result = CommandResult::success("config.path", "/etc/tabwright/system.prod.json");
	assert_eq!(render(&result, OutputFormat::Text), "/etc/tabwright/system.prod.json");

	let result = CommandResult::success("store.clear", ());
	assert_eq!(render(&result, OutputFormat::Text), "");
}

#[test]
fn text_prints_errors() {
	let result = CommandResult::<()>::failed(
		"store.get",
		CommandError {
			code: ErrorCode::StoreError,
			message: "corrupt".into(),
		},
	);
	assert_eq!(render(&result, OutputFormat::Text), "error[STORE_ERROR]: corrupt");
}
