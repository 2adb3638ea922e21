//! Integration tests for the board engine, end to end through `Sidebar`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use sidebar::{
    Capabilities, DisplaySurface, MemoryRenderer, OnlineEntities, PlaceholderError,
    PlaceholderResolver, RenderError, Renderer, Sidebar, SidebarSetup, SurfaceOptions,
};
use sidebar_config::{ConfigResolver, ConfigSource, Passthrough, StaticSource};
use sidebar_scheduler::{RegionizedScheduler, SchedulerPort, SingleLoopScheduler};
use sidebar_shared::{
    EntityContext, EntityId, PlayerContext, SharedContext, JOIN_DELAY_TICKS,
    REFRESH_INITIAL_DELAY_TICKS,
};

const SIMPLE: &str = r#"
[default-scoreboard]
title = "T"
lines = ["A", "B"]
"#;

const LAYERED: &str = r#"
[settings.priority-order]
default = 0
world-specific = 50

[default-scoreboard]
title = "Default"
lines = ["d1", "d2", "d3"]

[world-scoreboards.arena]
title = "Arena"

[permission-scoreboards.vip]
permission = "rank.vip"
priority = 200
title = "VIP"
lines = ["v1"]
"#;

struct Harness {
    sidebar: Sidebar,
    scheduler: Arc<SingleLoopScheduler>,
    renderer: MemoryRenderer,
    online: Arc<OnlineEntities>,
}

fn harness(toml: &str, placeholders: Option<Arc<dyn PlaceholderResolver>>) -> Harness {
    let scheduler = Arc::new(SingleLoopScheduler::new());
    let renderer = MemoryRenderer::new();
    let online = Arc::new(OnlineEntities::new());
    let sidebar = Sidebar::start(SidebarSetup {
        source: Arc::new(StaticSource::from_toml_str(toml).unwrap()),
        scheduler: scheduler.clone(),
        directory: online.clone(),
        renderer: Arc::new(renderer.clone()),
        placeholders,
        markup: Arc::new(Passthrough),
        capabilities: Capabilities::default(),
    })
    .unwrap();
    Harness {
        sidebar,
        scheduler,
        renderer,
        online,
    }
}

impl Harness {
    fn join(&self, ctx: PlayerContext) -> SharedContext {
        let ctx = ctx.shared();
        self.online.connect(Arc::clone(&ctx));
        self.sidebar.lifecycle().on_connect(Arc::clone(&ctx));
        ctx
    }

    fn ticks(&self, n: u64) {
        for _ in 0..n {
            self.scheduler.tick();
        }
    }
}

fn resolver_of(h: &Harness) -> &Arc<ConfigResolver> {
    h.sidebar.registry().resolver()
}

#[test]
fn test_connect_toggle_toggle_scenario() {
    let h = harness(SIMPLE, None);
    let e = h.join(PlayerContext::new(EntityId::from_u128(1), "world"));
    h.ticks(JOIN_DELAY_TICKS);

    let first = h.renderer.live(e.id()).unwrap();
    assert_eq!(first.title.as_deref(), Some("T"));
    assert_eq!(first.lines, vec!["A", "B"]);

    let registry = h.sidebar.registry();
    assert!(registry.toggle(e.as_ref()));
    assert!(h.renderer.live(e.id()).is_none());
    assert!(registry.is_toggled(e.id()));

    assert!(!registry.toggle(e.as_ref()));
    let second = h.renderer.live(e.id()).unwrap();
    assert_eq!(second.title, first.title);
    assert_eq!(second.lines, first.lines);
    assert!(!registry.is_toggled(e.id()));
}

#[test]
fn test_toggle_is_involutive_from_hidden() {
    let h = harness(SIMPLE, None);
    let e = PlayerContext::new(EntityId::from_u128(2), "world");
    let registry = h.sidebar.registry();
    registry.toggle(&e);
    assert!(registry.is_toggled(e.id));

    let results = (registry.toggle(&e), registry.toggle(&e));

    assert_eq!(results, (false, true));
    assert!(registry.is_toggled(e.id));
    assert!(!registry.has_board(e.id));
}

#[test]
fn test_line_count_matches_resolved_config() {
    let h = harness(LAYERED, None);
    let players = [
        PlayerContext::new(EntityId::from_u128(1), "lobby"),
        PlayerContext::new(EntityId::from_u128(2), "arena"),
        PlayerContext::new(EntityId::from_u128(3), "arena").with_permission("rank.vip"),
    ];
    let registry = h.sidebar.registry();

    for p in &players {
        registry.create(p);
        registry.update(p);
        let expected = resolver_of(&h).resolve(p).lines().len();
        assert_eq!(h.renderer.live(p.id).unwrap().lines.len(), expected);
    }
}

#[test]
fn test_permission_rule_beats_world() {
    let h = harness(LAYERED, None);
    let p = PlayerContext::new(EntityId::from_u128(1), "arena").with_permission("rank.vip");

    h.sidebar.registry().create(&p);

    let snap = h.renderer.live(p.id).unwrap();
    assert_eq!(snap.title.as_deref(), Some("VIP"));
    assert_eq!(snap.lines, vec!["v1"]);
}

#[test]
fn test_world_board_inherits_default_lines() {
    let h = harness(LAYERED, None);
    let p = PlayerContext::new(EntityId::from_u128(1), "arena");

    h.sidebar.registry().create(&p);

    let snap = h.renderer.live(p.id).unwrap();
    assert_eq!(snap.title.as_deref(), Some("Arena"));
    assert_eq!(snap.lines, vec!["d1", "d2", "d3"]);
}

#[test]
fn test_shutdown_clears_boards_and_cancels_refresh() {
    let h = harness(SIMPLE, None);
    for i in 0..4 {
        h.join(PlayerContext::new(EntityId::from_u128(i), "world"));
    }
    h.ticks(JOIN_DELAY_TICKS);
    assert_eq!(h.sidebar.registry().board_count(), 4);
    let handle = h.sidebar.registry().refresh_scheduler().handle().unwrap();

    h.sidebar.shutdown();
    h.sidebar.shutdown();

    assert_eq!(h.sidebar.registry().board_count(), 0);
    assert_eq!(h.renderer.live_count(), 0);
    assert!(handle.is_cancelled());
    h.scheduler.cancel(&handle);
    assert!(!handle.cancel());
}

#[test]
fn test_failing_substitution_is_isolated() {
    let bad = EntityId::from_u128(3);
    let resolver = move |ctx: &dyn EntityContext, text: &str| -> Result<String, PlaceholderError> {
        if ctx.id() == bad {
            Err(PlaceholderError::Failed {
                text: text.to_owned(),
                reason: "backend offline".into(),
            })
        } else {
            Ok(text.replace("%n%", "7"))
        }
    };
    let h = harness(
        "[default-scoreboard]\ntitle = \"T\"\nlines = [\"n=%n%\", \"static\"]\n",
        Some(Arc::new(resolver)),
    );
    let ids: Vec<EntityId> = (1..=5).map(EntityId::from_u128).collect();
    for id in &ids {
        h.join(PlayerContext::new(*id, "world"));
    }
    h.ticks(JOIN_DELAY_TICKS);

    h.sidebar.registry().update_all();

    for id in &ids {
        let snap = h.renderer.live(*id).unwrap();
        assert_eq!(snap.line_pushes, 2, "entity {id} missed an update");
        let expected = if *id == bad { "n=%n%" } else { "n=7" };
        assert_eq!(snap.lines[0], expected);
        assert_eq!(snap.lines[1], "static");
    }
}

#[test]
fn test_refresh_picks_up_reloaded_interval() {
    let source = Arc::new(StaticSource::from_toml_str(SIMPLE).unwrap());
    let scheduler = Arc::new(SingleLoopScheduler::new());
    let renderer = MemoryRenderer::new();
    let online = Arc::new(OnlineEntities::new());
    let sidebar = Sidebar::start(SidebarSetup {
        source: source.clone(),
        scheduler: scheduler.clone(),
        directory: online.clone(),
        renderer: Arc::new(renderer.clone()),
        placeholders: None,
        markup: Arc::new(Passthrough),
        capabilities: Capabilities::default(),
    })
    .unwrap();
    let ctx = PlayerContext::new(EntityId::from_u128(1), "world").shared();
    online.connect(Arc::clone(&ctx));
    sidebar.registry().create(ctx.as_ref());

    let mut doc = source.load().unwrap();
    doc.settings.update_interval = 5;
    source.replace(doc);
    sidebar.reloader().reload().unwrap();
    // Reload rebuilt the board: one push from the rebuild.
    let base = renderer.live(ctx.id()).unwrap().line_pushes;

    for _ in 0..REFRESH_INITIAL_DELAY_TICKS + 10 {
        scheduler.tick();
    }
    assert_eq!(renderer.live(ctx.id()).unwrap().line_pushes, base + 3);
}

/// Wraps the memory renderer and reports every line push with the thread
/// it ran on.
struct Signalling {
    inner: MemoryRenderer,
    tx: Sender<(EntityId, String)>,
}

struct SignallingSurface {
    id: EntityId,
    inner: Box<dyn DisplaySurface>,
    tx: Sender<(EntityId, String)>,
}

impl Renderer for Signalling {
    fn create(
        &self,
        id: EntityId,
        options: SurfaceOptions,
    ) -> Result<Box<dyn DisplaySurface>, RenderError> {
        Ok(Box::new(SignallingSurface {
            id,
            inner: self.inner.create(id, options)?,
            tx: self.tx.clone(),
        }))
    }
}

impl DisplaySurface for SignallingSurface {
    fn set_title(&mut self, title: &str) -> Result<(), RenderError> {
        self.inner.set_title(title)
    }

    fn set_lines(&mut self, lines: &[String]) -> Result<(), RenderError> {
        self.inner.set_lines(lines)?;
        let name = thread::current().name().unwrap_or_default().to_owned();
        let _ = self.tx.send((self.id, name));
        Ok(())
    }

    fn destroy(&mut self) {
        self.inner.destroy();
    }
}

#[test]
fn test_regionized_update_all_dispatches_per_entity() {
    let scheduler = Arc::new(RegionizedScheduler::new(3).unwrap());
    let memory = MemoryRenderer::new();
    let (tx, rx) = unbounded();
    let online = Arc::new(OnlineEntities::new());
    let sidebar = Sidebar::start(SidebarSetup {
        source: Arc::new(StaticSource::from_toml_str(SIMPLE).unwrap()),
        scheduler: scheduler.clone(),
        directory: online.clone(),
        renderer: Arc::new(Signalling {
            inner: memory.clone(),
            tx,
        }),
        placeholders: None,
        markup: Arc::new(Passthrough),
        capabilities: Capabilities::default(),
    })
    .unwrap();

    let players: Vec<SharedContext> = (1..=6)
        .map(|i| PlayerContext::new(EntityId::from_u128(i), "world").shared())
        .collect();
    for p in &players {
        online.connect(Arc::clone(p));
        sidebar.registry().create(p.as_ref());
    }
    // Drain the pushes made by create on this thread.
    for _ in &players {
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    sidebar.registry().update_all();

    let mut seen = Vec::new();
    for _ in &players {
        let (id, thread_name) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(thread_name.starts_with("sidebar-region-"), "ran on {thread_name:?}");
        seen.push(id);
    }
    seen.sort();
    let mut expected: Vec<_> = players.iter().map(|p| p.id()).collect();
    expected.sort();
    assert_eq!(seen, expected);
    for p in &players {
        assert_eq!(memory.live(p.id()).unwrap().line_pushes, 2);
    }

    sidebar.shutdown();
    scheduler.shutdown();
}
