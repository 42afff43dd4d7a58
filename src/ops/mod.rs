pub mod canvas_ops;
pub mod fill;
pub mod paint;
pub mod script;
