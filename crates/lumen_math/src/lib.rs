// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod interval;
pub use interval::Interval;
