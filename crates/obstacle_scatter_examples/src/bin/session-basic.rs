use glam::DVec2;
use obstacle_scatter::prelude::*;
use obstacle_scatter_examples::{
    init_tracing, render_session_to_png, RecordingFactory, RenderConfig,
};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Grid of radius 20 around the origin, keeping 5 units clear around the player.
    let origin = SessionOrigin::at(DVec2::ZERO);
    let config = GenerationConfig::new(15)
        .with_grid_radius(20)
        .with_spacing_unit(1.0)
        .with_safe_radius(5.0)
        .with_clustering_probability(0.0)
        .with_seed(2025);

    let mut factory = RecordingFactory::default();
    let mut controller = SessionController::new();
    controller.start_session(config, origin, &factory)?;

    // A game would call `tick` once per frame; here we just count the frames.
    let mut frames = 0;
    while controller.tick(&mut factory) == SessionState::Generating {
        frames += 1;
    }

    if let Some(report) = controller.last_report() {
        println!(
            "placed {}/{} in {} frames ({} attempts, deficiency {})",
            report.placed,
            report.target,
            frames + 1,
            report.attempts,
            report.deficiency
        );
    }

    let out = "session-basic.png";
    render_session_to_png(&controller, &origin, &RenderConfig::default(), out)?;
    println!("wrote {out}");
    Ok(())
}
