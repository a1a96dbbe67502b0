use bevy::prelude::*;
use obstacle_scatter::prelude::{EntityFactory, SpawnError, SpawnRequest};
use rand::rngs::StdRng;

/// How spawned obstacles are laid out in the world. Generation is refused while
/// this resource is missing.
#[derive(Resource, Debug, Clone)]
pub struct ObstaclePrefab {
    /// Z coordinate of spawned obstacles.
    pub z: f32,
    /// Scale applied to every obstacle transform.
    pub scale: Vec3,
}

impl Default for ObstaclePrefab {
    fn default() -> Self {
        Self {
            z: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl ObstaclePrefab {
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// Component added to every spawned obstacle.
#[derive(Component, Debug, Clone)]
pub struct ScatterObstacle {
    pub session: u64,
    pub sequence_index: usize,
    pub grid_coord: IVec2,
    /// Rolled from the session's health range, if it has one.
    pub health: Option<i32>,
}

/// [`EntityFactory`] backed by [`Commands`].
pub(crate) struct ObstacleSpawner<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    prefab: Option<&'a ObstaclePrefab>,
    rng: &'a mut StdRng,
    session: u64,
    spawned: Vec<(Entity, SpawnRequest)>,
}

impl<'a, 'w, 's> ObstacleSpawner<'a, 'w, 's> {
    pub(crate) fn new(
        commands: &'a mut Commands<'w, 's>,
        prefab: Option<&'a ObstaclePrefab>,
        rng: &'a mut StdRng,
        session: u64,
    ) -> Self {
        Self {
            commands,
            prefab,
            rng,
            session,
            spawned: Vec::new(),
        }
    }

    /// Entities created so far, with the requests they were created for.
    pub(crate) fn into_spawned(self) -> Vec<(Entity, SpawnRequest)> {
        self.spawned
    }
}

impl EntityFactory for ObstacleSpawner<'_, '_, '_> {
    type Handle = Entity;

    fn create(&mut self, request: &SpawnRequest) -> Result<Entity, SpawnError> {
        let Some(prefab) = self.prefab else {
            return Err(SpawnError::new("no ObstaclePrefab resource"));
        };

        let health = request
            .health_range
            .map(|range| range.sample(&mut *self.rng));
        let translation = Vec3::new(
            request.position.x as f32,
            request.position.y as f32,
            prefab.z,
        );
        let entity = self
            .commands
            .spawn((
                ScatterObstacle {
                    session: self.session,
                    sequence_index: request.sequence_index,
                    grid_coord: request.grid_coord,
                    health,
                },
                Name::new(format!("Obstacle {}", request.sequence_index)),
                Transform::from_translation(translation).with_scale(prefab.scale),
            ))
            .id();
        self.spawned.push((entity, *request));
        Ok(entity)
    }

    fn destroy(&mut self, handle: Entity) {
        self.commands.entity(handle).try_despawn();
    }

    fn is_ready(&self) -> bool {
        self.prefab.is_some()
    }
}

