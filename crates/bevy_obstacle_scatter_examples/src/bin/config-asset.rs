use bevy::prelude::*;
use bevy_obstacle_scatter::prelude::*;

#[derive(Resource, Default)]
struct ConfigHandle(Handle<ObstacleConfigAsset>);

fn main() {
    App::new()
        .init_resource::<ConfigHandle>()
        .add_plugins(DefaultPlugins)
        .add_plugins(ObstacleScatterPlugin)
        .insert_resource(ObstaclePrefab::default())
        .insert_resource(ObstacleBusConfig::only([
            GenerationEventKind::SessionStarted,
            GenerationEventKind::GridBuilt,
            GenerationEventKind::SliceYielded,
            GenerationEventKind::Warning,
        ]))
        .add_systems(Startup, load_config)
        .add_systems(Update, (trigger_generation, on_obstacle_message))
        .run();
}

/// Loads the obstacle config asset on startup.
fn load_config(mut handle: ResMut<ConfigHandle>, assets: Res<AssetServer>) {
    handle.0 = assets.load("arena.obstacles");
}

/// Starts a session once the config asset is loaded.
fn trigger_generation(
    mut commands: Commands,
    mut once: Local<bool>,
    handle: Res<ConfigHandle>,
    assets: Res<Assets<ObstacleConfigAsset>>,
) {
    if *once || assets.get(&handle.0).is_none() {
        return;
    }
    commands.trigger(GenerateObstacles::from_asset(handle.0.clone()).with_center(Vec2::ZERO));
    *once = true;
}

fn on_obstacle_message(mut reader: MessageReader<ObstacleMessage>) {
    for msg in reader.read() {
        match &msg.event {
            GenerationEvent::SessionStarted { seed, .. } => {
                info!("Session {} started with seed {}", msg.session, seed);
            }
            GenerationEvent::GridBuilt {
                total_cells,
                available_cells,
                ..
            } => {
                info!("Grid built: {available_cells}/{total_cells} cells available");
            }
            GenerationEvent::SliceYielded {
                slice,
                committed,
                elapsed,
                reason,
            } => {
                debug!("Slice #{slice}: +{committed} in {elapsed:?} ({reason:?})");
            }
            GenerationEvent::Warning { context, message } => {
                warn!("Warning '{}': {}", context, message);
            }
            _ => {}
        }
    }
}
