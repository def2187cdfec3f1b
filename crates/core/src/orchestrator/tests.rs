use tabwright_protocol::{ProxyConfig, Rect};
use tabwright_runtime::headless::{HeadlessEngine, HeadlessHost};

use super::*;
use crate::bridge::monitor::SAMPLE_INTERVAL;
use crate::config::SystemConfig;
use crate::control::{self, ControlReceiver};
use crate::entitlement::StaticSubscription;

struct Fixture {
	engine: HeadlessEngine,
	host: Arc<HeadlessHost>,
	tabs: TabOrchestrator,
	receiver: ControlReceiver,
}

impl Fixture {
	fn new() -> Self {
		Self::with(SystemConfig::default(), PermissionGate::default())
	}

	fn with(config: SystemConfig, gate: PermissionGate) -> Self {
		let engine = HeadlessEngine::new();
		let host = Arc::new(HeadlessHost::new(Rect::new(0, 0, 1200, 800)));
		let (sender, receiver) = control::channel();
		let tabs = TabOrchestrator::new(
			Arc::new(engine.clone()),
			host.clone(),
			Arc::new(config),
			sender,
		)
		.with_gate(gate);
		Self {
			engine,
			host,
			tabs,
			receiver,
		}
	}

	/// Applies every queued tab event; async completions are not awaited.
	fn drain(&mut self) {
		while let Some(event) = self.receiver.try_recv() {
			if let ControlEvent::Tab {
				tab_id,
				instance,
				event,
			} = event
			{
				self.tabs.on_tab_event(&tab_id, instance, event);
			}
		}
	}

	fn attached(&self) -> Vec<Arc<dyn Surface>> {
		self.host
			.attached()
			.into_iter()
			.filter_map(|id| self.engine.surface(id))
			.map(|s| s as Arc<dyn Surface>)
			.collect()
	}

	fn assert_single_active(&self) {
		let active: Vec<_> = self.tabs.tabs().into_iter().filter(|t| t.is_active).collect();
		if self.tabs.is_empty() {
			assert!(active.is_empty());
			assert!(self.tabs.active_tab_id().is_none());
		} else {
			assert_eq!(active.len(), 1);
			assert_eq!(self.tabs.active_tab_id(), Some(active[0].id.as_str()));
			let attached = self.attached();
			assert_eq!(attached.len(), 1);
			let surface = self.tabs.surface(&active[0].id).unwrap();
			assert_eq!(attached[0].id(), surface.id());
		}
	}
}

#[tokio::test]
async fn test_create_switch_close_keep_one_active_surface() {
	let mut f = Fixture::new();
	let a = f.tabs.create_tab("https://a.test", CreateTabOptions::new()).unwrap();
	f.assert_single_active();
	let b = f.tabs.create_tab("https://b.test", CreateTabOptions::new()).unwrap();
	let c = f.tabs.create_tab("https://c.test", CreateTabOptions::new()).unwrap();
	f.assert_single_active();
	assert_eq!(f.tabs.active_tab_id(), Some(c.as_str()));

	assert!(f.tabs.switch_tab(&a));
	f.assert_single_active();

	assert!(f.tabs.close_tab(&a));
	f.assert_single_active();
	assert_eq!(f.tabs.active_tab_id(), Some(c.as_str()));

	assert!(f.tabs.close_tab(&b));
	f.assert_single_active();
	assert!(f.tabs.close_tab(&c));
	f.assert_single_active();
	assert!(!f.tabs.close_tab(&c));
}

#[tokio::test]
async fn test_closing_inactive_tab_keeps_active() {
	let mut f = Fixture::new();
	let a = f.tabs.create_tab("https://a.test", CreateTabOptions::new()).unwrap();
	let b = f.tabs.create_tab("https://b.test", CreateTabOptions::new()).unwrap();

	f.tabs.close_tab(&a);
	assert_eq!(f.tabs.active_tab_id(), Some(b.as_str()));
	assert!(f.tabs.get_tab_info(&a).is_none());
	f.assert_single_active();
}

#[tokio::test]
async fn test_close_destroys_surface() {
	let mut f = Fixture::new();
	let a = f.tabs.create_tab("https://a.test", CreateTabOptions::new()).unwrap();
	let surface = f.tabs.surface(&a).unwrap();

	f.tabs.close_tab(&a);
	assert!(surface.is_destroyed());
	assert!(f.host.attached().is_empty());
}

#[tokio::test]
async fn test_switch_to_unknown_clears_active() {
	let mut f = Fixture::new();
	f.tabs.create_tab("https://a.test", CreateTabOptions::new()).unwrap();

	assert!(!f.tabs.switch_tab("missing"));
	assert!(f.tabs.active_tab_id().is_none());
	assert!(f.host.attached().is_empty());
	assert!(f.tabs.tabs().iter().all(|t| !t.is_active));
}

#[tokio::test]
async fn test_update_view_bounds_without_active_tab_is_noop() {
	let mut f = Fixture::new();
	let a = f.tabs.create_tab("https://a.test", CreateTabOptions::new()).unwrap();
	let surface = f.tabs.surface(&a).unwrap();
	f.tabs.close_tab(&a);

	f.host.set_bounds(Rect::new(0, 0, 640, 480));
	f.tabs.update_view_bounds();
	assert!(f.tabs.active_tab_id().is_none());
	assert_eq!(surface.bounds(), Rect::new(0, 72, 1200, 728));
}

#[tokio::test]
async fn test_home_tabs_reserve_less_chrome() {
	let mut f = Fixture::new();
	let control = f
		.engine
		.create_surface(SurfaceSpec {
			label: "control".into(),
			session: f.engine.session("persist:control"),
			preload: true,
			user_agent_suffix: None,
			events: tabwright_runtime::EventSink::discard(),
		})
		.unwrap();
	f.tabs.set_control_surface(control.clone());

	let home = f.tabs.create_tab("/home", CreateTabOptions::new().home(true)).unwrap();
	assert_eq!(f.tabs.surface(&home).unwrap().bounds(), Rect::new(0, 32, 1200, 768));
	assert_eq!(control.bounds(), Rect::new(0, 0, 1200, 32));

	let web = f.tabs.create_tab("example.com", CreateTabOptions::new()).unwrap();
	assert_eq!(f.tabs.surface(&web).unwrap().bounds(), Rect::new(0, 72, 1200, 728));
	assert_eq!(control.bounds(), Rect::new(0, 0, 1200, 72));
}

#[tokio::test]
async fn test_create_seeds_normalized_state() {
	let mut f = Fixture::new();
	let id = f.tabs.create_tab("/settings", CreateTabOptions::new()).unwrap();

	let state = f.tabs.get_tab_info(&id).unwrap();
	assert_eq!(state.url, "http://localhost:59001/settings");
	assert_eq!(state.title, "New Tab");
	assert!(!state.navigating);

	let kinds: Vec<_> = f.tabs.drain_notifications().into_iter().map(|e| e.kind).collect();
	assert_eq!(kinds, vec![MessageType::TabCreated]);

	let headless = f.engine.surface(f.tabs.surface(&id).unwrap().id()).unwrap();
	assert_eq!(headless.loads(), vec!["http://localhost:59001/settings".to_string()]);
	assert!(headless.user_agent().ends_with(" Tabwright"));
	assert!(!headless.has_preload());
}

#[tokio::test]
async fn test_navigation_placeholder_defers_load() {
	let mut f = Fixture::new();
	let id = f
		.tabs
		.create_tab("https://later.test", CreateTabOptions::new().navigate(true))
		.unwrap();

	let state = f.tabs.get_tab_info(&id).unwrap();
	assert!(state.navigating);
	assert_eq!(state.url, "");
	assert_eq!(state.title, "about:blank");

	let headless = f.engine.surface(f.tabs.surface(&id).unwrap().id()).unwrap();
	assert!(headless.loads().is_empty());
	assert!(headless.has_preload());

	assert!(f.tabs.load_url("https://dest.test"));
	let state = f.tabs.get_tab_info(&id).unwrap();
	assert!(!state.navigating);
	assert_eq!(state.url, "https://dest.test");
	assert_eq!(headless.loads(), vec!["https://dest.test".to_string()]);
}

#[tokio::test]
async fn test_placeholder_destination_gets_page_metadata() {
	let mut f = Fixture::new();
	let id = f.tabs.create_tab("", CreateTabOptions::new().navigate(true)).unwrap();
	assert_eq!(f.tabs.tabs()[0].kind, SurfaceKind::ChromeInternal);

	assert!(f.tabs.load_url("https://dest.test"));
	assert_eq!(f.tabs.tabs()[0].kind, SurfaceKind::Standard);
	f.drain();

	let headless = f.engine.surface(f.tabs.surface(&id).unwrap().id()).unwrap();
	assert_eq!(headless.scripts_run(), 1);
	match f.receiver.recv().await {
		Some(ControlEvent::MetaExtracted {
			tab_id,
			instance,
			url,
			result,
		}) => f.tabs.on_meta(&tab_id, instance, &url, result),
		other => panic!("expected page metadata, got {other:?}"),
	}

	let state = f.tabs.get_tab_info(&id).unwrap();
	assert!(!state.navigating);
	assert_eq!(state.url, "https://dest.test");
	assert_eq!(state.favicon.as_deref(), Some("https://dest.test/favicon.ico"));
	assert!(state.error.is_none());
}

#[tokio::test]
async fn test_home_tab_skips_page_metadata() {
	let mut f = Fixture::new();
	let id = f.tabs.create_tab("/home", CreateTabOptions::new().home(true)).unwrap();
	f.drain();

	let headless = f.engine.surface(f.tabs.surface(&id).unwrap().id()).unwrap();
	assert_eq!(headless.loads().len(), 1);
	assert_eq!(headless.scripts_run(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_memory_sampling() {
	let mut f = Fixture::new();
	let id = f.tabs.create_tab("https://a.test", CreateTabOptions::new()).unwrap();
	let headless = f.engine.surface(f.tabs.surface(&id).unwrap().id()).unwrap();

	tokio::time::sleep(SAMPLE_INTERVAL + std::time::Duration::from_secs(1)).await;
	assert_eq!(headless.memory_samples(), 1);

	assert!(f.tabs.close_tab(&id));
	assert!(headless.is_destroyed());
	tokio::time::sleep(SAMPLE_INTERVAL * 3).await;
	assert_eq!(headless.memory_samples(), 1);
}

#[tokio::test]
async fn test_proxied_tab_loads_after_proxy_rules() {
	let config = SystemConfig {
		proxy: ProxyConfig {
			enabled: true,
			host: "proxy.test".into(),
			port: 8080,
			username: String::new(),
			password: String::new(),
		},
		..Default::default()
	};
	let mut f = Fixture::with(config, PermissionGate::default());
	let id = f
		.tabs
		.create_tab("https://a.test", CreateTabOptions::new().use_proxy(true))
		.unwrap();
	let headless = f.engine.surface(f.tabs.surface(&id).unwrap().id()).unwrap();
	assert!(headless.loads().is_empty());

	for _ in 0..10 {
		if !headless.loads().is_empty() {
			break;
		}
		tokio::task::yield_now().await;
	}
	assert_eq!(headless.loads(), vec!["https://a.test".to_string()]);
	assert!(f.engine.headless_session("persist:tab_proxy").unwrap().proxy().is_some());

	f.drain();
	let state = f.tabs.get_tab_info(&id).unwrap();
	assert_eq!(state.url, "https://a.test");
	assert!(!state.loading);
}

#[tokio::test]
async fn test_denied_proxy_tab_redirects() {
	let mut f = Fixture::with(
		SystemConfig::default(),
		PermissionGate::new(Arc::new(StaticSubscription::denied("/upgrade"))),
	);
	let id = f
		.tabs
		.create_tab("https://secret.test", CreateTabOptions::new().use_proxy(true))
		.unwrap();

	let state = f.tabs.get_tab_info(&id).unwrap();
	assert_eq!(state.url, "http://localhost:59001/upgrade");
	assert!(!state.use_proxy);
	assert_eq!(f.tabs.len(), 1);
	assert_eq!(f.tabs.tabs()[0].partition, PartitionKey::Default);
	assert!(f.engine.headless_session("persist:tab_proxy").is_none());
}

#[tokio::test]
async fn test_proxy_tab_uses_proxy_partition() {
	let config = SystemConfig {
		proxy: ProxyConfig {
			enabled: true,
			host: "proxy.test".into(),
			port: 8080,
			username: "u".into(),
			password: "p".into(),
		},
		..Default::default()
	};
	let mut f = Fixture::with(config, PermissionGate::default());
	f.tabs.create_tab("https://a.test", CreateTabOptions::new().use_proxy(true)).unwrap();
	f.tabs.create_tab("https://b.test", CreateTabOptions::new().use_proxy(true)).unwrap();

	let session = f.engine.headless_session("persist:tab_proxy").unwrap();
	assert_eq!(session.user_agent_writes(), 1);
	assert_eq!(session.proxy_writes(), 2);
	assert_eq!(session.proxy().unwrap().proxy_rules, "http://proxy.test:8080");
	assert!(f.tabs.sessions().is_configured(PartitionKey::Proxy));
	assert!(!f.tabs.sessions().is_configured(PartitionKey::Default));
}

#[tokio::test]
async fn test_reused_id_drops_events_of_previous_instance() {
	let mut f = Fixture::new();
	f.tabs
		.create_tab("https://old.test", CreateTabOptions::new().tab_id("fixed"))
		.unwrap();
	f.tabs
		.create_tab("https://new.test", CreateTabOptions::new().tab_id("fixed"))
		.unwrap();
	assert_eq!(f.tabs.len(), 1);

	f.drain();
	let state = f.tabs.get_tab_info("fixed").unwrap();
	assert_eq!(state.url, "https://new.test");
	assert_eq!(state.title, "new.test");
}

#[tokio::test]
async fn test_history_guards() {
	let mut f = Fixture::new();
	assert!(!f.tabs.go_back());
	assert!(!f.tabs.reload());

	f.tabs.create_tab("https://one.test", CreateTabOptions::new()).unwrap();
	assert!(!f.tabs.go_back());
	f.tabs.load_url("https://two.test");
	assert!(f.tabs.go_back());
	assert!(!f.tabs.go_back());
	assert!(f.tabs.go_forward());
	assert!(!f.tabs.go_forward());
	assert!(f.tabs.reload());
}

#[tokio::test]
async fn test_dispose_destroys_everything() {
	let mut f = Fixture::new();
	let a = f.tabs.create_tab("https://a.test", CreateTabOptions::new()).unwrap();
	let surface = f.tabs.surface(&a).unwrap();

	f.tabs.dispose();
	assert!(f.tabs.is_empty());
	assert!(surface.is_destroyed());
	assert!(f.tabs.get_all_tab_info().is_empty());
	assert!(f.tabs.sessions().get(PartitionKey::Default).is_none());
}
