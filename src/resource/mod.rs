pub mod buffer;
pub mod image;
pub mod traits;

pub use buffer::BufferAndView;
pub use image::{create_image_simple, ImageAndView};
