/// Barrier helpers for the demo's single-queue recordings
pub mod barrier;

pub use barrier::{aspect_mask_for, cmd_buffer_memory_barrier, cmd_transition_image};
