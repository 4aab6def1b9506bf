pub mod error;
pub mod models;

pub use error::{PredictError, Violation};
pub use models::{Color, Dimension, Outcome, Palette, Size};
