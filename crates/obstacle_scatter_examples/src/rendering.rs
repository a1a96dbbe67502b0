use std::path::Path;

use glam::{DVec2, IVec2};
use image::{Rgb, RgbImage};
use obstacle_scatter::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber honoring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Factory for headless examples: handles are sequence indices, destroys are counted.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    pub created: usize,
    pub destroyed: usize,
}

impl EntityFactory for RecordingFactory {
    type Handle = usize;

    fn create(&mut self, request: &SpawnRequest) -> std::result::Result<usize, SpawnError> {
        self.created += 1;
        Ok(request.sequence_index)
    }

    fn destroy(&mut self, _handle: usize) {
        self.destroyed += 1;
    }
}

/// How a session is drawn.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Pixels per grid cell.
    pub cell_px: u32,
    pub background: [u8; 3],
    pub available: [u8; 3],
    pub blocked: [u8; 3],
    pub reference: [u8; 3],
    /// Color of the first placement; later ones fade toward `last_obstacle`.
    pub first_obstacle: [u8; 3],
    pub last_obstacle: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_px: 16,
            background: [20, 20, 24],
            available: [48, 52, 60],
            blocked: [32, 34, 40],
            reference: [80, 200, 120],
            first_obstacle: [240, 200, 80],
            last_obstacle: [220, 70, 60],
        }
    }
}

impl RenderConfig {
    pub fn with_cell_px(mut self, cell_px: u32) -> Self {
        self.cell_px = cell_px.max(2);
        self
    }
}

/// Renders the grid and placements of the controller's last (or current) session.
pub fn render_session_to_png<H>(
    controller: &SessionController<H>,
    origin: &SessionOrigin,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let grid = controller
        .grid()
        .ok_or_else(|| anyhow::anyhow!("no grid to render; run a session first"))?;
    let frame = *grid.frame();
    let side = frame.side() as u32;
    let size = side * config.cell_px;
    let mut img = RgbImage::from_pixel(size, size, Rgb(config.background));

    let max_radius = controller
        .config()
        .map_or(f64::INFINITY, GenerationConfig::max_generation_radius);
    for cell in grid.cells() {
        if cell.dist_to_center > max_radius {
            continue;
        }
        let color = if grid.is_available(cell.grid_coord) {
            config.available
        } else {
            config.blocked
        };
        fill_cell(&mut img, frame, cell.grid_coord, config.cell_px, color, 1);
    }

    let placements = controller.placements();
    let last = placements.len().saturating_sub(1).max(1) as f32;
    for record in placements {
        let t = record.sequence_index as f32 / last;
        let color = lerp_color(config.first_obstacle, config.last_obstacle, t);
        let center = to_pixel(frame, record.position, config.cell_px);
        fill_circle(&mut img, center, config.cell_px as i32 * 2 / 5, color);
    }

    if let Some(reference) = origin.reference {
        let center = to_pixel(frame, reference, config.cell_px);
        fill_circle(&mut img, center, config.cell_px as i32 / 3, config.reference);
    }

    img.save(path.as_ref())?;
    Ok(())
}

fn to_pixel(frame: GridFrame, position: DVec2, cell_px: u32) -> IVec2 {
    let local = position - frame.center + DVec2::splat(frame.radius as f64);
    // Flip y so world +y points up in the image.
    let side = frame.side() as f64;
    IVec2::new(
        (local.x * cell_px as f64).round() as i32,
        ((side - local.y) * cell_px as f64).round() as i32,
    )
}

fn fill_cell(
    img: &mut RgbImage,
    frame: GridFrame,
    coord: IVec2,
    cell_px: u32,
    color: [u8; 3],
    gap: u32,
) {
    let x0 = (coord.x + frame.radius) as u32 * cell_px;
    let y0 = (frame.radius - coord.y) as u32 * cell_px;
    for y in y0 + gap..y0 + cell_px - gap {
        for x in x0 + gap..x0 + cell_px - gap {
            if x < img.width() && y < img.height() {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}

fn fill_circle(img: &mut RgbImage, center: IVec2, radius: i32, color: [u8; 3]) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let (x, y) = (center.x + dx, center.y + dy);
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, Rgb(color));
            }
        }
    }
}

fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}
