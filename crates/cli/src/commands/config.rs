use serde_json::{Value, json};
use tabwright::SystemConfig;

use crate::cli::ConfigAction;
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{self, CommandResult, OutputFormat};

pub fn execute(action: ConfigAction, ctx: &CommandContext, format: OutputFormat) -> Result<()> {
	match action {
		ConfigAction::Path => {
			let path = ctx.config_path().display().to_string();
			output::print_result(&CommandResult::success("config.path", path), format);
		}
		ConfigAction::Show => {
			let config = ctx.load_config()?;
			let data = json!({
				"env": ctx.env(),
				"path": ctx.config_path(),
				"config": masked(&config)?,
			});
			output::print_result(&CommandResult::success("config.show", data), format);
		}
	}
	Ok(())
}

/// Serializes `config` with the proxy credentials masked.
pub fn masked(config: &SystemConfig) -> Result<Value> {
	let mut value = serde_json::to_value(config)?;
	if let Some(proxy) = value.get_mut("proxy").and_then(Value::as_object_mut) {
		proxy.insert("username".into(), json!(config.proxy.masked_username()));
		if !config.proxy.password.is_empty() {
			proxy.insert("password".into(), json!("****"));
		}
	}
	Ok(value)
}

#[cfg(test)]
mod tests {
	use tabwright::Env;
	use tabwright_protocol::ProxyConfig;

	use super::*;

	#[test]
	fn masked_hides_credentials() {
		let config = SystemConfig {
			proxy: ProxyConfig {
				enabled: true,
				username: "alice".into(),
				password: "hunter2".into(),
				..Default::default()
			},
			..Default::default()
		};
		let value = masked(&config).unwrap();

		assert_eq!(value["proxy"]["username"], json!("a***"));
		assert_eq!(value["proxy"]["password"], json!("****"));
		assert_eq!(value["proxy"]["port"], json!(7890));
		assert!(!value.to_string().contains("hunter2"));
	}

	#[test]
	fn show_writes_defaults_on_first_use() {
		let dir = tempfile::tempdir().unwrap();
		let ctx = CommandContext::new(dir.path().to_path_buf(), Env::Test);

		execute(ConfigAction::Show, &ctx, OutputFormat::Json).unwrap();
		assert!(dir.path().join("system.test.json").exists());
		assert_eq!(ctx.load_config().unwrap(), SystemConfig::default());
	}
}
