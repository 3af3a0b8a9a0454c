pub mod interpolation;
pub mod scheduler;

// Re-export commonly used types for convenience
pub use interpolation::EasingFunction;
pub use scheduler::{Animation, AnimationEntry, AnimationId, AnimationScheduler, Progress};
