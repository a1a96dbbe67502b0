//! Bevy plugin for obstacle_scatter providing resources, events, message types, and systems.
#![forbid(unsafe_code)]

#[cfg(feature = "ron")]
pub use assets::{ObstacleConfigAsset, ObstacleConfigAssetLoader};
use bevy::prelude::*;
pub use events::{ChannelSink, ObstacleBus, ObstacleBusConfig, ObstacleMessage};
use glam::DVec2;
use obstacle_scatter::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
pub use spawner::{ObstaclePrefab, ScatterObstacle};

#[cfg(feature = "ron")]
mod assets;
mod events;
mod spawner;

use events::drain_obstacle_messages;
use spawner::ObstacleSpawner;

/// Convenient re-exports for common types. Import with `use bevy_obstacle_scatter::prelude::*;`.
pub mod prelude {
    pub use obstacle_scatter::prelude::*;

    #[cfg(feature = "ron")]
    pub use crate::assets::{ObstacleConfigAsset, ObstacleConfigAssetLoader};
    pub use crate::events::{ChannelSink, ObstacleBus, ObstacleBusConfig, ObstacleMessage};
    pub use crate::spawner::{ObstaclePrefab, ScatterObstacle};
    pub use crate::{
        AbortObstacles, ClearObstacles, GenerateObstacles, ObstacleConfigSource,
        ObstaclePlaced, ObstacleReference, ObstacleScatterPlugin, ObstacleSession,
        ObstacleSessionFinished, RegenerateObstacles,
    };
}

/// Bevy plugin that drives one obstacle session per app, one slice per frame.
pub struct ObstacleScatterPlugin;

impl Plugin for ObstacleScatterPlugin {
    fn build(&self, app: &mut App) {
        add_session_systems(app);
        #[cfg(feature = "ron")]
        app.init_asset::<ObstacleConfigAsset>()
            .init_asset_loader::<ObstacleConfigAssetLoader>();
    }
}

fn add_session_systems(app: &mut App) {
    app.add_message::<ObstacleMessage>()
        .init_resource::<ObstacleBusConfig>()
        .init_resource::<ObstacleBus>()
        .init_resource::<ObstacleSession>()
        .add_systems(
            Update,
            (drive_obstacle_session, drain_obstacle_messages).chain(),
        )
        .add_observer(start_generation)
        .add_observer(regenerate_obstacles)
        .add_observer(abort_generation)
        .add_observer(clear_obstacles);
}

/// Session state shared by the plugin systems.
#[derive(Resource)]
pub struct ObstacleSession {
    controller: SessionController<Entity>,
    health_rng: StdRng,
}

impl Default for ObstacleSession {
    fn default() -> Self {
        Self::with_seed(rand::random())
    }
}

impl ObstacleSession {
    /// Seeds unseeded sessions and health rolls from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            controller: SessionController::with_base_seed(seed),
            health_rng: StdRng::seed_from_u64(seed.rotate_left(17) ^ 0x5EED_4EA1),
        }
    }

    pub fn controller(&self) -> &SessionController<Entity> {
        &self.controller
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    pub fn is_generating(&self) -> bool {
        self.controller.is_generating()
    }

    pub fn placed_count(&self) -> usize {
        self.controller.placed_count()
    }

    pub fn last_report(&self) -> Option<&SessionReport> {
        self.controller.last_report()
    }
}

/// Marks the entity whose position anchors sessions and is kept free of obstacles.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ObstacleReference;

/// Where a session's configuration comes from.
#[derive(Debug, Clone)]
pub enum ObstacleConfigSource {
    Inline(GenerationConfig),
    #[cfg(feature = "ron")]
    Asset(Handle<ObstacleConfigAsset>),
}

/// Starts a new session. Without a `center`, the grid is centered on the
/// [`ObstacleReference`] entity.
#[non_exhaustive]
#[derive(Event, Debug, Clone)]
pub struct GenerateObstacles {
    pub source: ObstacleConfigSource,
    pub center: Option<Vec2>,
}

impl GenerateObstacles {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            source: ObstacleConfigSource::Inline(config),
            center: None,
        }
    }

    #[cfg(feature = "ron")]
    pub fn from_asset(handle: Handle<ObstacleConfigAsset>) -> Self {
        Self {
            source: ObstacleConfigSource::Asset(handle),
            center: None,
        }
    }

    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = Some(center);
        self
    }
}

/// Restarts with the last configuration.
#[derive(Event, Debug, Clone, Default)]
pub struct RegenerateObstacles {
    pub center: Option<Vec2>,
}

/// Stops the running session; placed obstacles stay until the next session.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct AbortObstacles;

/// Aborts any running session and despawns every obstacle immediately.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ClearObstacles;

/// [`EntityEvent`] triggered for each spawned obstacle.
#[derive(EntityEvent, Debug, Clone)]
pub struct ObstaclePlaced {
    /// The obstacle entity.
    pub entity: Entity,
    pub session: u64,
    pub sequence_index: usize,
    pub position: Vec2,
    pub grid_coord: IVec2,
}

/// Triggered when a session completes.
#[derive(Event, Debug, Clone)]
pub struct ObstacleSessionFinished {
    pub report: SessionReport,
}

fn session_origin(
    center: Option<Vec2>,
    references: &Query<&GlobalTransform, With<ObstacleReference>>,
) -> Option<SessionOrigin> {
    let reference = references
        .iter()
        .next()
        .map(|t| to_dvec2(t.translation().truncate()));
    match (center.map(to_dvec2), reference) {
        (Some(center), Some(reference)) => {
            Some(SessionOrigin::new(center).with_reference(reference))
        }
        (Some(center), None) => Some(SessionOrigin::new(center)),
        (None, Some(reference)) => Some(SessionOrigin::at(reference)),
        (None, None) => None,
    }
}

fn to_dvec2(v: Vec2) -> DVec2 {
    DVec2::new(v.x as f64, v.y as f64)
}

#[allow(clippy::too_many_arguments)]
fn start_generation(
    request: On<GenerateObstacles>,
    mut commands: Commands,
    mut session: ResMut<ObstacleSession>,
    prefab: Option<Res<ObstaclePrefab>>,
    references: Query<&GlobalTransform, With<ObstacleReference>>,
    bus: Res<ObstacleBus>,
    bus_config: Res<ObstacleBusConfig>,
    #[cfg(feature = "ron")] configs: Option<Res<Assets<ObstacleConfigAsset>>>,
) {
    let config = match &request.source {
        ObstacleConfigSource::Inline(config) => config.clone(),
        #[cfg(feature = "ron")]
        ObstacleConfigSource::Asset(handle) => {
            let Some(asset) = configs.as_ref().and_then(|c| c.get(handle)) else {
                error!("ObstacleConfigAsset not loaded yet: {:?}", handle);
                return;
            };
            asset.into()
        }
    };

    let Some(origin) = session_origin(request.center, &references) else {
        warn!("GenerateObstacles needs a center or an ObstacleReference entity.");
        return;
    };

    let ObstacleSession {
        controller,
        health_rng,
    } = &mut *session;
    let next = controller.sessions_started() + 1;
    let spawner = ObstacleSpawner::new(&mut commands, prefab.as_deref(), health_rng, next);
    let mut sink = bus.sink(next, &bus_config);
    match controller.start_session_with_events(config, origin, &spawner, &mut sink) {
        Ok(id) => info!("Obstacle session {} started at {:?}.", id, origin.center),
        Err(err) => warn!("GenerateObstacles rejected: {}", err),
    }
}

fn regenerate_obstacles(
    request: On<RegenerateObstacles>,
    mut commands: Commands,
    mut session: ResMut<ObstacleSession>,
    prefab: Option<Res<ObstaclePrefab>>,
    references: Query<&GlobalTransform, With<ObstacleReference>>,
    bus: Res<ObstacleBus>,
    bus_config: Res<ObstacleBusConfig>,
) {
    let Some(origin) = session_origin(request.center, &references) else {
        warn!("RegenerateObstacles needs a center or an ObstacleReference entity.");
        return;
    };

    let ObstacleSession {
        controller,
        health_rng,
    } = &mut *session;
    let next = controller.sessions_started() + 1;
    let spawner = ObstacleSpawner::new(&mut commands, prefab.as_deref(), health_rng, next);
    let mut sink = bus.sink(next, &bus_config);
    if let Err(err) = controller.regenerate_with_events(origin, &spawner, &mut sink) {
        warn!("RegenerateObstacles rejected: {}", err);
    }
}

fn abort_generation(
    _request: On<AbortObstacles>,
    mut session: ResMut<ObstacleSession>,
    bus: Res<ObstacleBus>,
    bus_config: Res<ObstacleBusConfig>,
) {
    let id = session.controller.sessions_started();
    let mut sink = bus.sink(id, &bus_config);
    if session.controller.abort_with_events(&mut sink).is_none() {
        debug!("AbortObstacles ignored; no session is generating.");
    }
}

fn clear_obstacles(
    _request: On<ClearObstacles>,
    mut commands: Commands,
    mut session: ResMut<ObstacleSession>,
    prefab: Option<Res<ObstaclePrefab>>,
) {
    let ObstacleSession {
        controller,
        health_rng,
    } = &mut *session;
    let id = controller.sessions_started();
    let mut spawner = ObstacleSpawner::new(&mut commands, prefab.as_deref(), health_rng, id);
    let destroyed = controller.shutdown(&mut spawner);
    info!("Cleared {} obstacles.", destroyed);
}

fn drive_obstacle_session(
    mut commands: Commands,
    mut session: ResMut<ObstacleSession>,
    prefab: Option<Res<ObstaclePrefab>>,
    bus: Res<ObstacleBus>,
    bus_config: Res<ObstacleBusConfig>,
) {
    if !session.is_generating() {
        return;
    }

    let ObstacleSession {
        controller,
        health_rng,
    } = &mut *session;
    let id = controller.sessions_started();
    let mut spawner = ObstacleSpawner::new(&mut commands, prefab.as_deref(), health_rng, id);
    let mut sink = bus.sink(id, &bus_config);
    let state = controller.tick_with_events(&mut spawner, &mut sink);

    for (entity, request) in spawner.into_spawned() {
        commands.trigger(ObstaclePlaced {
            entity,
            session: id,
            sequence_index: request.sequence_index,
            position: request.position.as_vec2(),
            grid_coord: request.grid_coord,
        });
    }

    if state == SessionState::Complete {
        if let Some(report) = controller.last_report() {
            commands.trigger(ObstacleSessionFinished {
                report: report.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use bevy::prelude::*;

    use super::*;

    #[derive(Resource, Default)]
    struct Observed {
        placed: usize,
        finished: Vec<SessionReport>,
    }

    fn setup_app(with_prefab: bool) -> App {
        let mut app = App::new();
        add_session_systems(&mut app);
        app.insert_resource(ObstacleSession::with_seed(7))
            .init_resource::<Observed>()
            .add_observer(|_placed: On<ObstaclePlaced>, mut observed: ResMut<Observed>| {
                observed.placed += 1;
            })
            .add_observer(
                |finished: On<ObstacleSessionFinished>, mut observed: ResMut<Observed>| {
                    observed.finished.push(finished.report.clone());
                },
            );
        if with_prefab {
            app.insert_resource(ObstaclePrefab::default().with_z(2.0));
        }
        app.world_mut().spawn((
            ObstacleReference,
            GlobalTransform::from(Transform::from_xyz(5.0, 5.0, 0.0)),
        ));
        app
    }

    fn config() -> GenerationConfig {
        GenerationConfig::new(12)
            .with_grid_radius(10)
            .with_safe_radius(3.0)
            .with_max_items_per_slice(3)
            .with_health_range(HealthRange::new(25, 60))
            .with_seed(99)
    }

    fn run_until_idle(app: &mut App) -> usize {
        let mut frames = 0;
        while app.world().resource::<ObstacleSession>().is_generating() {
            app.update();
            frames += 1;
            assert!(frames < 100, "session never finished");
        }
        frames
    }

    fn obstacles(app: &mut App) -> Vec<(Entity, ScatterObstacle, Transform)> {
        app.world_mut()
            .query::<(Entity, &ScatterObstacle, &Transform)>()
            .iter(app.world())
            .map(|(e, o, t)| (e, o.clone(), *t))
            .collect()
    }

    #[test]
    fn generates_obstacles_over_several_frames() {
        let mut app = setup_app(true);
        app.world_mut().trigger(GenerateObstacles::new(config()));
        assert!(app.world().resource::<ObstacleSession>().is_generating());

        let frames = run_until_idle(&mut app);
        assert!(frames >= 4);

        let spawned = obstacles(&mut app);
        assert_eq!(spawned.len(), 12);
        let reference = Vec2::new(5.0, 5.0);
        for (_, obstacle, transform) in &spawned {
            assert_eq!(transform.translation.z, 2.0);
            assert!(transform.translation.truncate().distance(reference) >= 3.0 - 1e-4);
            let health = obstacle.health.expect("health rolled");
            assert!((25..=60).contains(&health));
        }

        let observed = app.world().resource::<Observed>();
        assert_eq!(observed.placed, 12);
        assert_eq!(observed.finished.len(), 1);
        assert_eq!(observed.finished[0].placed, 12);
    }

    #[test]
    fn regenerate_replaces_previous_obstacles() {
        let mut app = setup_app(true);
        app.world_mut().trigger(GenerateObstacles::new(config()));
        run_until_idle(&mut app);
        let first: HashSet<Entity> = obstacles(&mut app).iter().map(|(e, ..)| *e).collect();

        app.world_mut().trigger(RegenerateObstacles {
            center: Some(Vec2::new(30.0, 0.0)),
        });
        run_until_idle(&mut app);

        let second = obstacles(&mut app);
        assert_eq!(second.len(), 12);
        assert!(second.iter().all(|(e, o, _)| !first.contains(e) && o.session == 2));
        assert!(first.iter().all(|e| app.world().get_entity(*e).is_err()));
    }

    #[test]
    fn missing_prefab_keeps_session_idle() {
        let mut app = setup_app(false);
        app.world_mut().trigger(GenerateObstacles::new(config()));
        app.update();

        let session = app.world().resource::<ObstacleSession>();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.controller().sessions_started(), 0);
        assert!(obstacles(&mut app).is_empty());
    }

    #[test]
    fn abort_then_clear_despawns_everything() {
        let mut app = setup_app(true);
        app.world_mut().trigger(GenerateObstacles::new(config()));
        app.update();
        app.world_mut().trigger(AbortObstacles);

        let placed = app.world().resource::<ObstacleSession>().placed_count();
        assert!(placed > 0);
        assert_eq!(
            app.world().resource::<ObstacleSession>().state(),
            SessionState::Idle
        );
        assert_eq!(obstacles(&mut app).len(), placed);

        app.world_mut().trigger(ClearObstacles);
        assert!(obstacles(&mut app).is_empty());
        assert_eq!(app.world().resource::<ObstacleSession>().placed_count(), 0);
    }
}
