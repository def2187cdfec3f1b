//! `tabwright run`: replays a command script against the headless engine.
//!
//! A script holds one JSON value per line. Most lines are control-surface
//! commands in their wire form; a `{"resize": {"width": W, "height": H}}`
//! line resizes the window. Blank lines and lines starting with `#` are
//! skipped. A failing command is reported and the script continues.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tabwright::{
	Command, Envelope, Shell, ShellOptions, StaticSubscription, SystemConfig, TabState, WindowEvent,
};
use tabwright_protocol::{Payload, Rect};
use tabwright_runtime::headless::{HeadlessEngine, HeadlessHost};
use tracing::{debug, info};

use crate::cli::{RunArgs, WindowSize};
use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::{self, CommandResult, OutputFormat};

/// One line of a script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
	Command(Command),
	Resize { resize: WindowSize },
}

impl Step {
	fn name(&self) -> &'static str {
		match self {
			Step::Command(command) => command.channel(),
			Step::Resize { .. } => "resize",
		}
	}
}

/// Outcome of one script line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
	pub line: usize,
	pub step: &'static str,
	pub ok: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	pub notifications: Vec<Envelope>,
}

/// Parses a script into numbered steps.
pub fn parse_script(path: &Path, content: &str) -> Result<Vec<(usize, Step)>> {
	let mut steps = Vec::new();
	for (index, raw) in content.lines().enumerate() {
		let line = raw.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let step = serde_json::from_str(line).map_err(|e| CliError::Script {
			path: path.to_path_buf(),
			line: index + 1,
			message: e.to_string(),
		})?;
		steps.push((index + 1, step));
	}
	Ok(steps)
}

/// Replays `steps` on a fresh shell and returns one record per step plus the
/// final tab states.
pub async fn replay(
	steps: Vec<(usize, Step)>,
	config: SystemConfig,
	subscription: StaticSubscription,
	window: WindowSize,
	mut on_step: impl FnMut(&StepRecord),
) -> Result<(Vec<StepRecord>, Vec<TabState>)> {
	let host = Arc::new(HeadlessHost::new(Rect::new(0, 0, window.width, window.height)));
	let options = ShellOptions::new(Arc::new(HeadlessEngine::new()), host.clone(), config)
		.subscription(Arc::new(subscription));
	let mut shell = Shell::new(options)?;

	let published = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&published);
	let _subscription = shell.on_notification(move |envelope: &Envelope| {
		sink.lock().push(envelope.clone());
	});
	shell.run_until_idle().await;

	let mut records = Vec::with_capacity(steps.len());
	for (line, step) in steps {
		let name = step.name();
		debug!(line, step = name, "Replaying step");
		let outcome = match step {
			Step::Command(command) => {
				let result = shell.execute(command);
				shell.run_until_idle().await;
				result
			}
			Step::Resize { resize } => {
				host.set_bounds(Rect::new(0, 0, resize.width, resize.height));
				shell.post_window_event(WindowEvent::Resized);
				shell.run_until_idle().await;
				Ok(Value::Null)
			}
		};
		let notifications = std::mem::take(&mut *published.lock());
		let record = match outcome {
			Ok(value) => StepRecord {
				line,
				step: name,
				ok: true,
				result: Some(value),
				error: None,
				notifications,
			},
			Err(e) => StepRecord {
				line,
				step: name,
				ok: false,
				result: None,
				error: Some(e.to_string()),
				notifications,
			},
		};
		on_step(&record);
		records.push(record);
	}

	let tabs = shell.orchestrator().get_all_tab_info();
	shell.dispose();
	Ok((records, tabs))
}

pub async fn execute(args: RunArgs, ctx: &CommandContext, format: OutputFormat) -> Result<()> {
	let content = fs::read_to_string(&args.script)
		.with_context(|| format!("Failed to read script {}", args.script.display()))?;
	let steps = parse_script(&args.script, &content)?;
	let config = ctx.load_config()?;
	let subscription = match &args.deny_proxy {
		Some(path) => StaticSubscription::denied(path.clone()),
		None => StaticSubscription::entitled(),
	};
	info!(script = %args.script.display(), steps = steps.len(), "Running script");

	let (records, tabs) = replay(steps, config, subscription, args.window, |record| match format {
		OutputFormat::Ndjson => output::print_result(&CommandResult::success("run.step", record), format),
		OutputFormat::Text => print_step_text(record),
		OutputFormat::Json => {}
	})
	.await?;

	let failed = records.iter().filter(|r| !r.ok).count();
	match format {
		OutputFormat::Json => {
			let data = json!({ "steps": records, "tabs": tabs });
			output::print_result(&CommandResult::success("run", data), format);
		}
		OutputFormat::Ndjson => {
			let data = json!({ "tabs": tabs, "failed": failed });
			output::print_result(&CommandResult::success("run", data), format);
		}
		OutputFormat::Text => {
			output::print_line(&format!("{} steps, {failed} failed, {} tabs open", records.len(), tabs.len()));
		}
	}
	Ok(())
}

fn print_step_text(record: &StepRecord) {
	let outcome = match (&record.result, &record.error) {
		(_, Some(error)) => format!("error: {error}"),
		(Some(Value::Null), None) | (None, None) => "ok".to_string(),
		(Some(value), None) => value.to_string(),
	};
	output::print_line(&format!("{:>4}  {:<16} {outcome}", record.line, record.step));
	for envelope in &record.notifications {
		output::print_line(&format!("        {}", describe(envelope)));
	}
}

/// One-line summary of a notification.
pub fn describe(envelope: &Envelope) -> String {
	match &envelope.payload {
		Payload::Tab(state) => {
			let mut line = format!("{} {} loading={} url={}", envelope.kind, state.id, state.loading, state.url);
			if let Some(error) = &state.error {
				line.push_str(&format!(" error={}", error.kind));
			}
			line
		}
		Payload::Visibility(v) => format!("{} visible={}", envelope.kind, v.visible),
	}
}
