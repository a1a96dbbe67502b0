use bevy::prelude::*;
use bevy_obstacle_scatter::prelude::*;

/// Screen pixels per grid cell.
const CELL: f32 = 24.0;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(ObstacleScatterPlugin)
        .insert_resource(ObstaclePrefab::default().with_z(1.0))
        .add_systems(Startup, setup)
        .add_systems(Update, (move_player, regenerate_on_key))
        .add_observer(decorate_obstacle)
        .add_observer(log_finished)
        .run();
}

/// Spawns the camera and the player, then starts the first session.
fn setup(mut commands: Commands) {
    // One world unit is one grid cell; zoom the camera so cells are visible.
    commands.spawn((Camera2d, Transform::from_scale(Vec3::splat(1.0 / CELL))));
    commands.spawn((
        ObstacleReference,
        Sprite::from_color(Color::srgb(0.3, 0.8, 0.45), Vec2::splat(0.8)),
        Transform::from_xyz(0.0, 0.0, 2.0),
    ));

    let config = GenerationConfig::new(30)
        .with_grid_radius(20)
        .with_safe_radius(5.0)
        .with_clustering_probability(0.3)
        .with_health_range(HealthRange::new(25, 60));
    commands.trigger(GenerateObstacles::new(config).with_center(Vec2::ZERO));
}

/// Gives freshly placed obstacles a sprite, tinted by health.
fn decorate_obstacle(
    placed: On<ObstaclePlaced>,
    mut commands: Commands,
    obstacles: Query<&ScatterObstacle>,
) {
    let health = obstacles
        .get(placed.entity)
        .ok()
        .and_then(|o| o.health)
        .unwrap_or(40);
    let shade = 0.35 + (health as f32 / 60.0) * 0.5;
    commands.entity(placed.entity).insert(Sprite::from_color(
        Color::srgb(shade, shade * 0.6, 0.3),
        Vec2::splat(0.9),
    ));
}

fn move_player(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut player: Query<&mut Transform, With<ObstacleReference>>,
) {
    let mut direction = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        direction.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        direction.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        direction.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        direction.x += 1.0;
    }
    for mut transform in &mut player {
        let step = direction.normalize_or_zero() * 8.0 * time.delta_secs();
        transform.translation += step.extend(0.0);
    }
}

/// R regenerates around the player, Space aborts, C clears.
fn regenerate_on_key(keys: Res<ButtonInput<KeyCode>>, mut commands: Commands) {
    if keys.just_pressed(KeyCode::KeyR) {
        commands.trigger(RegenerateObstacles::default());
    }
    if keys.just_pressed(KeyCode::Space) {
        commands.trigger(AbortObstacles);
    }
    if keys.just_pressed(KeyCode::KeyC) {
        commands.trigger(ClearObstacles);
    }
}

fn log_finished(finished: On<ObstacleSessionFinished>) {
    let report = &finished.report;
    info!(
        "Obstacle session {} finished: placed={}/{} attempts={} slices={}",
        report.session, report.placed, report.target, report.attempts, report.slices
    );
}
