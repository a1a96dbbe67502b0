#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{init_tracing, render_session_to_png, RecordingFactory, RenderConfig};
