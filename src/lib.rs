//! Layered raster painting core: surfaces, a layer stack, brush / eraser /
//! flood-fill tools, a compositor and PNG / JPEG / WebP export.

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod ops;
pub mod settings;

pub use app::{CanvasSummary, DrawingApp};
pub use canvas::{Layer, LayerInfo, LayerStack, Point, RasterSurface};
pub use components::tools::{BrushConfig, BrushShape, EraserConfig, FillConfig, Tool};
pub use error::{CanvasError, CanvasResult};
pub use io::ExportFormat;
pub use settings::AppSettings;
