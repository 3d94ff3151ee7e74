pub mod health;
pub mod mood;

pub use health::{health_handler, ping_handler};
pub use mood::analyze_mood_handler;
