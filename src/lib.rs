//! Utility types for the prism demo.
//!
//! Most of this is specific to the demo and would not fit a general helper
//! library: [`vertex::Vertex`] describes the vertex binding and attributes for
//! the geometry this demo uses, and the resource wrappers track exactly the
//! state the demo's single-queue recording needs.

pub mod error;
pub mod resource;
pub mod sync;
pub mod vertex;

pub use error::PrismError;

// Re-exports
pub use {ash, gpu_allocator};
