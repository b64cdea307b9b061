mod native;
pub mod shared;

pub use native::Renderer;
pub use shared::{GlobalUniform, ObjectUniform};
