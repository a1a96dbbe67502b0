use glam::DVec2;
use obstacle_scatter::prelude::*;
use obstacle_scatter_examples::{
    init_tracing, render_session_to_png, RecordingFactory, RenderConfig,
};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let origin = SessionOrigin::at(DVec2::ZERO);
    let render = RenderConfig::default().with_cell_px(12);

    // Same seed and target; only the clustering bias changes.
    for probability in [0.0, 0.5, 0.95] {
        let config = GenerationConfig::new(60)
            .with_grid_radius(24)
            .with_safe_radius(4.0)
            .with_clustering_probability(probability)
            .with_cluster_distance(1, 2)
            .with_seed(7);

        let mut factory = RecordingFactory::default();
        let mut controller = SessionController::new();
        controller.start_session(config, origin, &factory)?;
        let placed = controller
            .run_to_completion(&mut factory)
            .map_or(0, |report| report.placed);

        let out = format!("clustering-{:.0}.png", probability * 100.0);
        render_session_to_png(&controller, &origin, &render, &out)?;
        println!("p={probability:.2}: placed {placed}, wrote {out}");
    }

    Ok(())
}
