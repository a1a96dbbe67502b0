use std::time::Duration;

use criterion::{Criterion, Throughput};
use obstacle_scatter::prelude::{EntityFactory, SpawnError, SpawnRequest};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Factory that hands out sequence indices and does nothing on destroy.
#[allow(dead_code)]
pub struct NullFactory;

impl EntityFactory for NullFactory {
    type Handle = usize;

    fn create(&mut self, request: &SpawnRequest) -> Result<usize, SpawnError> {
        Ok(request.sequence_index)
    }

    fn destroy(&mut self, _handle: usize) {}
}
