use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use obstacle_scatter::prelude::{EventSink, GenerationEvent, GenerationEventKind};

/// Bevy message carrying the session number and the underlying [`GenerationEvent`].
#[derive(Message, Debug, Clone)]
pub struct ObstacleMessage {
    pub session: u64,
    pub event: GenerationEvent,
}

/// Which event kinds are forwarded to the bus. `None` forwards everything.
#[derive(Resource, Debug, Clone, Default)]
pub struct ObstacleBusConfig {
    pub kinds: Option<Vec<GenerationEventKind>>,
}

impl ObstacleBusConfig {
    pub fn only(kinds: impl IntoIterator<Item = GenerationEventKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
        }
    }

    pub fn allows(&self, kind: GenerationEventKind) -> bool {
        self.kinds.as_ref().is_none_or(|k| k.contains(&kind))
    }
}

/// Channel that carries generation events from the session driver to Bevy messages.
#[derive(Resource)]
pub struct ObstacleBus {
    tx: Sender<ObstacleMessage>,
    rx: Receiver<ObstacleMessage>,
}

impl Default for ObstacleBus {
    fn default() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }
}

impl ObstacleBus {
    pub fn sender(&self) -> &Sender<ObstacleMessage> {
        &self.tx
    }

    pub fn receiver(&self) -> &Receiver<ObstacleMessage> {
        &self.rx
    }

    /// Sink tagging every event with `session`, honoring `config`.
    pub fn sink(&self, session: u64, config: &ObstacleBusConfig) -> ChannelSink {
        ChannelSink {
            session,
            tx: self.tx.clone(),
            filter: config.clone(),
        }
    }
}

/// Event sink that forwards events to the [`ObstacleBus`].
pub struct ChannelSink {
    pub session: u64,
    pub tx: Sender<ObstacleMessage>,
    pub filter: ObstacleBusConfig,
}

impl EventSink for ChannelSink {
    #[inline]
    fn send(&mut self, event: GenerationEvent) {
        let _ = self.tx.send(ObstacleMessage {
            session: self.session,
            event,
        });
    }

    fn wants(&self, kind: GenerationEventKind) -> bool {
        self.filter.allows(kind)
    }
}

pub(crate) fn drain_obstacle_messages(
    bus: Res<ObstacleBus>,
    mut messages: ResMut<Messages<ObstacleMessage>>,
) {
    while let Ok(message) = bus.receiver().try_recv() {
        messages.write(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_respects_filter() {
        let bus = ObstacleBus::default();
        let mut sink = bus.sink(3, &ObstacleBusConfig::only([GenerationEventKind::Warning]));
        assert!(!sink.wants(GenerationEventKind::PlacementCommitted));
        sink.send(GenerationEvent::Warning {
            context: "session:3".into(),
            message: "short".into(),
        });

        let message = bus.receiver().try_recv().expect("forwarded");
        assert_eq!(message.session, 3);
        assert_eq!(message.event.kind(), GenerationEventKind::Warning);
    }
}
