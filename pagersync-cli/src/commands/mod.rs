pub mod daemon;
pub mod plan;
pub mod sync;
