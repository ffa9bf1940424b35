mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::ViewTransform;
