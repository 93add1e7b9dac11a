use crate::{Frame, RenderError};

/// Something that displays frames, typically a GPU surface.
///
/// Calls are always made from a single task, one frame at a time.
pub trait Renderer {
	/// Decode and display the frame, replacing whatever was shown before.
	fn render(&mut self, frame: &Frame) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
	fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
		(**self).render(frame)
	}
}
