use glam::DVec2;
use obstacle_scatter::prelude::*;
use obstacle_scatter_examples::{init_tracing, RecordingFactory};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GenerationConfig::new(20)
        .with_grid_radius(16)
        .with_max_items_per_slice(4)
        .with_health_range(HealthRange::new(25, 60));

    let mut factory = RecordingFactory::default();
    let mut controller = SessionController::new();

    // Only print the coarse lifecycle; placements and rejections are filtered out.
    let mut sink = FilterSink::new(
        FnSink::new(|event: GenerationEvent| match event {
            GenerationEvent::SessionStarted { session, seed, .. } => {
                println!("session {session} started (seed {seed})");
            }
            GenerationEvent::TeardownProgress {
                destroyed,
                remaining,
            } => println!("  teardown: -{destroyed}, {remaining} left"),
            GenerationEvent::GridBuilt {
                available_cells, ..
            } => println!("  grid: {available_cells} cells available"),
            GenerationEvent::SliceYielded {
                committed, reason, ..
            } => println!("  slice: +{committed} ({reason:?})"),
            GenerationEvent::SessionFinished { report } => println!(
                "session {} finished: {}/{}",
                report.session, report.placed, report.target
            ),
            _ => {}
        }),
        [
            GenerationEventKind::SessionStarted,
            GenerationEventKind::TeardownProgress,
            GenerationEventKind::GridBuilt,
            GenerationEventKind::SliceYielded,
            GenerationEventKind::SessionFinished,
        ],
    );

    controller.start_session_with_events(
        config,
        SessionOrigin::at(DVec2::ZERO),
        &factory,
        &mut sink,
    )?;
    while controller.tick_with_events(&mut factory, &mut sink) == SessionState::Generating {}

    // The player moved; regenerate around the new position.
    for step in 1..=2 {
        let origin = SessionOrigin::at(DVec2::new(step as f64 * 10.0, 0.0));
        controller.regenerate_with_events(origin, &factory, &mut sink)?;
        while controller.tick_with_events(&mut factory, &mut sink) == SessionState::Generating {}
    }

    let destroyed = controller.shutdown(&mut factory);
    println!(
        "created {}, destroyed {} ({} at shutdown)",
        factory.created, factory.destroyed, destroyed
    );
    Ok(())
}
