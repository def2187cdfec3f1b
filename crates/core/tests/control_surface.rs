// Integration tests for satellites, the command surface and notification
// delivery.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestShell;
use serde_json::json;
use tabwright::{
	Command, Error, JsonFileStore, MessageType, SatelliteKind, Shell, ShellOptions, SystemConfig,
	WindowEvent,
};
use tabwright_protocol::{
	COMMAND_CHANNEL, NOTIFY_CHANNEL, PanelOptions, Payload, Point, Rect, TAB_LIST_CHANNEL,
};
use tabwright_runtime::headless::{HeadlessEngine, HeadlessHost};
use tabwright_runtime::{EngineEvent, Host, Surface, WindowDisposition, WindowOpenAction};

fn show_menu(x: i32, y: i32) -> Command {
	Command::ShowTabsMenu {
		position: Point::new(x, y),
		menu_url: "http://localhost:59001/menu".into(),
		payload: serde_json::Value::Null,
	}
}

fn visibility(t: &TestShell, kind: MessageType) -> Vec<bool> {
	t.take_published()
		.into_iter()
		.filter(|e| e.kind == kind)
		.filter_map(|e| match e.payload {
			Payload::Visibility(v) => Some(v.visible),
			Payload::Tab(_) => None,
		})
		.collect()
}

#[tokio::test]
async fn test_tabs_menu_is_reused_and_repositioned() {
	let mut t = TestShell::new();
	let id = t.create("https://a.test").await;

	t.invoke(show_menu(10, 20)).await.unwrap();
	let first = t.shell.satellites().surface(SatelliteKind::Menu).unwrap();
	assert!(first.is_visible());
	assert_eq!(first.bounds(), Rect::new(10, 20, 320, 420));

	let menu = t.engine.surface(first.id()).unwrap();
	let (channel, payload) = menu.sent().last().cloned().unwrap();
	assert_eq!(channel, TAB_LIST_CHANNEL);
	assert_eq!(payload[0]["id"], json!(id));

	t.invoke(show_menu(200, 40)).await.unwrap();
	let second = t.shell.satellites().surface(SatelliteKind::Menu).unwrap();
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(second.bounds(), Rect::new(200, 40, 320, 420));
	assert_eq!(t.engine.popups().len(), 1);
	assert_eq!(menu.loads(), vec!["http://localhost:59001/menu".to_string()]);
	assert_eq!(visibility(&t, MessageType::TabMenuState), vec![true, true]);
}

#[tokio::test]
async fn test_tabs_menu_requires_url() {
	let mut t = TestShell::new();
	let result = t
		.invoke(Command::ShowTabsMenu {
			position: Point::new(0, 0),
			menu_url: String::new(),
			payload: json!([]),
		})
		.await;
	assert!(matches!(result, Err(Error::MissingMenuUrl)));
	assert!(t.shell.satellites().surface(SatelliteKind::Menu).is_none());
}

#[tokio::test]
async fn test_menu_focus_loss_hides_and_refocuses_tab() {
	let mut t = TestShell::new();
	let id = t.create("https://a.test").await;
	t.invoke(show_menu(0, 0)).await.unwrap();
	let tab = t.tab_surface(&id);
	let focused = tab.focus_count();
	t.take_published();

	let menu = t.shell.satellites().surface(SatelliteKind::Menu).unwrap();
	t.engine.surface(menu.id()).unwrap().emit(EngineEvent::FocusLost);
	t.shell.run_until_idle().await;

	assert!(!t.shell.satellites().is_visible(SatelliteKind::Menu));
	assert!(!menu.is_destroyed());
	assert_eq!(tab.focus_count(), focused + 1);
	assert_eq!(visibility(&t, MessageType::TabMenuState), vec![false]);

	t.invoke(Command::MenuClose).await.unwrap();
	assert!(t.take_published().is_empty());
}

#[tokio::test]
async fn test_side_panel_tracks_window() {
	let mut t = TestShell::new();
	t.invoke(Command::PopupShow {
		url: "http://localhost:59001/panel".into(),
		options: PanelOptions { width: Some(400) },
	})
	.await
	.unwrap();
	let panel = t.shell.satellites().surface(SatelliteKind::Panel).unwrap();
	assert_eq!(panel.bounds(), Rect::new(880, 72, 400, 728));

	t.host.set_bounds(Rect::new(100, 50, 1000, 700));
	t.shell.post_window_event(WindowEvent::Resized);
	t.shell.run_until_idle().await;
	assert_eq!(panel.bounds(), Rect::new(700, 122, 400, 628));

	t.invoke(Command::PopupResize { width: 250 }).await.unwrap();
	assert_eq!(panel.bounds(), Rect::new(850, 122, 250, 628));
	assert_eq!(t.shell.satellites().panel_width(), 250);

	t.take_published();
	t.invoke(Command::PopupClose).await.unwrap();
	assert!(!panel.is_visible());
	assert_eq!(visibility(&t, MessageType::SidebarState), vec![false]);

	assert!(t.invoke(Command::PopupResize { width: 0 }).await.is_err());
}

#[tokio::test]
async fn test_popup_show_requires_url() {
	let mut t = TestShell::new();
	let result = t
		.invoke(Command::PopupShow {
			url: String::new(),
			options: PanelOptions::default(),
		})
		.await;
	assert!(matches!(result, Err(Error::InvalidCommand { .. })));
}

#[tokio::test]
async fn test_notifications_reach_control_surface() {
	let mut t = TestShell::new();
	let id = t.create("https://a.test").await;

	let notices: Vec<_> = t
		.control()
		.sent()
		.into_iter()
		.filter(|(channel, _)| channel == NOTIFY_CHANNEL)
		.map(|(_, value)| value)
		.collect();
	assert_eq!(notices[0]["type"], json!("tab-created"));
	assert_eq!(notices[0]["payload"]["id"], json!(id));
	assert!(notices.iter().any(|n| n["type"] == json!("tab-loading-state")));
	assert_eq!(notices.len(), t.take_published().len());
}

#[tokio::test(start_paused = true)]
async fn test_metadata_for_closed_tab_is_dropped() {
	let mut t = TestShell::new();
	t.engine.delay_scripts(Duration::from_secs(1));
	let id = t.shell.execute(Command::create_tab("https://slow.test")).unwrap();
	let id = id.as_str().unwrap().to_string();

	// Apply the load events; extraction stays pending behind its delay.
	while tokio::time::timeout(Duration::from_millis(1), t.shell.step())
		.await
		.is_ok()
	{}
	assert_eq!(t.tab_surface(&id).scripts_run(), 1);

	t.invoke(Command::CloseTab { tab_id: id.clone() }).await.unwrap();
	t.take_published();
	tokio::time::sleep(Duration::from_secs(2)).await;
	t.shell.run_until_idle().await;

	assert!(t.published_for(&id).is_empty());
	assert!(t.shell.orchestrator().get_tab_info(&id).is_none());
}

#[tokio::test]
async fn test_foreground_window_open_becomes_create_tab_request() {
	let mut t = TestShell::new();
	let id = t.create("https://a.test").await;
	let tab = t.tab_surface(&id);

	let action = tab.request_window_open("https://b.test", WindowDisposition::ForegroundTab);
	assert_eq!(action, Some(WindowOpenAction::Deny));
	t.shell.run_until_idle().await;

	let requests: Vec<_> = t
		.control()
		.sent()
		.into_iter()
		.filter(|(channel, _)| channel == COMMAND_CHANNEL)
		.map(|(_, value)| value)
		.collect();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0]["channel"], json!("create-tab"));
	assert_eq!(requests[0]["args"]["url"], json!("https://b.test"));

	let popup = tab.request_window_open("about:blank", WindowDisposition::ForegroundTab);
	assert_eq!(popup, Some(WindowOpenAction::Allow));
}

#[tokio::test]
async fn test_store_commands() {
	let mut t = TestShell::new();
	assert_eq!(
		t.invoke(Command::StoreGet { key: "theme".into() }).await.unwrap(),
		json!(null)
	);
	t.invoke(Command::StoreSet {
		key: "theme".into(),
		value: json!({ "dark": true }),
	})
	.await
	.unwrap();
	assert_eq!(
		t.invoke(Command::StoreGet { key: "theme".into() }).await.unwrap(),
		json!({ "dark": true })
	);
	t.invoke(Command::StoreRemove { key: "theme".into() }).await.unwrap();
	assert_eq!(
		t.invoke(Command::StoreGet { key: "theme".into() }).await.unwrap(),
		json!(null)
	);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("store.json");

	let start = |path: &std::path::Path| {
		let store = JsonFileStore::open(path).unwrap();
		let options = ShellOptions::new(
			Arc::new(HeadlessEngine::new()),
			Arc::new(HeadlessHost::default()),
			SystemConfig::default(),
		)
		.store(Arc::new(store));
		Shell::new(options).unwrap()
	};

	let mut shell = start(path.as_path());
	shell
		.execute(Command::StoreSet {
			key: "pinned".into(),
			value: json!(["a", "b"]),
		})
		.unwrap();
	shell.dispose();

	let mut shell = start(path.as_path());
	let value = shell.execute(Command::StoreGet { key: "pinned".into() }).unwrap();
	assert_eq!(value, json!(["a", "b"]));
	shell.execute(Command::StoreClear).unwrap();
	assert_eq!(
		shell.execute(Command::StoreGet { key: "pinned".into() }).unwrap(),
		json!(null)
	);
}

#[tokio::test]
async fn test_control_handle_round_trip() {
	let mut t = TestShell::new();
	let handle = t.shell.handle();
	let mut request =
		tokio::spawn(async move { handle.invoke(Command::create_tab("example.com")).await });

	let id = loop {
		tokio::select! {
			answer = &mut request => break answer.unwrap().unwrap(),
			_ = t.shell.step() => {}
		}
	};
	let id = id.as_str().unwrap();
	t.shell.run_until_idle().await;
	assert_eq!(t.info(id).url, "https://example.com");
}

#[tokio::test]
async fn test_dispose_destroys_all_surfaces() {
	let mut t = TestShell::new();
	t.create("https://a.test").await;
	t.create("https://b.test").await;
	t.invoke(show_menu(0, 0)).await.unwrap();

	t.shell.dispose();
	assert!(t.engine.surfaces().iter().all(|s| s.is_destroyed()));
	assert!(t.engine.popups().iter().all(|s| s.is_destroyed()));
	assert!(t.shell.orchestrator().is_empty());
	assert!(t.host.attached().is_empty());
}
