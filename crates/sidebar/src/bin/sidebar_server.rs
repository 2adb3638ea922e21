//! # Sidebar Demo Server
//!
//! Headless host that runs the board engine against simulated players and
//! logs what each of them would see.
//!
//! Usage: `sidebar_server [config.toml] [seconds]`
//!
//! Without a path the bundled `data/sidebar.toml` is used. Set
//! `SIDEBAR_REGIONIZED_RUNTIME=<threads>` to run on the regionized
//! scheduler, and `RUST_LOG` to change verbosity.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use sidebar::{
    BuiltinPlaceholders, Capabilities, ConsoleSender, DisplaySurface, EntitySender, OnlineEntities,
    RenderError, Renderer, Sidebar, SidebarResult, SidebarSetup, SurfaceOptions,
};
use sidebar_config::{ConfigSource, LegacyAmpersand, StaticSource, TomlFileSource};
use sidebar_scheduler::{RuntimeProbe, Scheduler};
use sidebar_shared::{EntityContext, EntityId, SharedContext, TICK_DURATION_MILLIS, TICK_RATE};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BUNDLED_CONFIG: &str = include_str!("../../../../data/sidebar.toml");

/// Logs surfaces instead of sending packets.
struct ConsoleRenderer;

struct ConsoleSurface {
    id: EntityId,
    options: SurfaceOptions,
    live: bool,
}

impl Renderer for ConsoleRenderer {
    fn create(
        &self,
        id: EntityId,
        options: SurfaceOptions,
    ) -> Result<Box<dyn DisplaySurface>, RenderError> {
        Ok(Box::new(ConsoleSurface {
            id,
            options,
            live: true,
        }))
    }
}

impl DisplaySurface for ConsoleSurface {
    fn set_title(&mut self, title: &str) -> Result<(), RenderError> {
        if !self.live {
            return Err(RenderError::SurfaceGone);
        }
        self.options.check_title(title)?;
        info!(entity = %self.id, title, "title");
        Ok(())
    }

    fn set_lines(&mut self, lines: &[String]) -> Result<(), RenderError> {
        if !self.live {
            return Err(RenderError::SurfaceGone);
        }
        self.options.check_lines(lines)?;
        tracing::debug!(entity = %self.id, ?lines, "lines");
        Ok(())
    }

    fn destroy(&mut self) {
        if std::mem::replace(&mut self.live, false) {
            info!(entity = %self.id, "board destroyed");
        }
    }
}

/// Simulated player whose world can change.
struct SimPlayer {
    id: EntityId,
    name: &'static str,
    world: RwLock<String>,
    permissions: Vec<&'static str>,
}

impl EntityContext for SimPlayer {
    fn id(&self) -> EntityId {
        self.id
    }

    fn world_name(&self) -> String {
        self.world.read().clone()
    }

    fn has_permission(&self, node: &str) -> bool {
        self.permissions.iter().any(|p| *p == node)
    }
}

fn sim_player(name: &'static str, world: &str, permissions: Vec<&'static str>) -> Arc<SimPlayer> {
    Arc::new(SimPlayer {
        id: EntityId::random(),
        name,
        world: RwLock::new(world.to_owned()),
        permissions,
    })
}

fn pause(ticks: u64) {
    thread::sleep(Duration::from_millis(ticks * TICK_DURATION_MILLIS));
}

/// Filter from `RUST_LOG`-style directives, `info` when absent or invalid.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> SidebarResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let source: Arc<dyn ConfigSource> = match args.next() {
        Some(path) => Arc::new(TomlFileSource::new(path)),
        None => Arc::new(StaticSource::from_toml_str(BUNDLED_CONFIG)?),
    };
    let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    let probe = RuntimeProbe::from_env();
    let scheduler = Arc::new(Scheduler::select(&probe)?);
    let ticker = scheduler.start_ticker(TICK_RATE)?;
    let online = Arc::new(OnlineEntities::new());

    let sidebar = Sidebar::start(SidebarSetup {
        source,
        scheduler: scheduler.clone(),
        directory: online.clone(),
        renderer: Arc::new(ConsoleRenderer),
        placeholders: Some(Arc::new(
            BuiltinPlaceholders::new()
                .with_value("server_name", "Demo")
                .with_value("online", "3"),
        )),
        markup: Arc::new(LegacyAmpersand),
        capabilities: Capabilities::default(),
    })?;

    let players = [
        sim_player("alex", "world", vec![]),
        sim_player("sam", "world_nether", vec![]),
        sim_player("kim", "world", vec!["sidebar.vip", "sidebar.toggle"]),
    ];
    for player in &players {
        let ctx: SharedContext = player.clone();
        info!(player = player.name, entity = %player.id, "player joined");
        online.connect(Arc::clone(&ctx));
        sidebar.lifecycle().on_connect(ctx);
    }
    pause(30);

    let alex = &players[0];
    *alex.world.write() = "world_nether".to_owned();
    info!(player = alex.name, "changed world");
    sidebar.lifecycle().on_context_change(alex.clone());
    pause(10);

    let kim: SharedContext = players[2].clone();
    let outcome = sidebar.commands().execute(&EntitySender(Arc::clone(&kim)), &["toggle"]);
    info!(player = players[2].name, outcome = outcome.message_key(), "toggle");
    let outcome = sidebar.commands().execute(&ConsoleSender, &["reload"]);
    info!(outcome = outcome.message_key(), "reload");

    thread::sleep(Duration::from_secs(seconds));

    let sam = &players[1];
    online.disconnect(sam.id);
    sidebar.lifecycle().on_disconnect(sam.id);

    sidebar.shutdown();
    scheduler.shutdown();
    if let Some(stats) = ticker.stop() {
        info!(
            ticks = stats.total_ticks,
            avg_us = stats.avg_tick_us,
            max_us = stats.max_tick_us,
            late = stats.late_ticks,
            "ticker stopped"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_log_filter_honours_directives() {
        assert_eq!(
            log_filter(Some("error".to_owned())).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("sidebar=loud".to_owned())).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
