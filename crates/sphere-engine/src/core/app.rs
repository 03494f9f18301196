use winit::dpi::PhysicalSize;

use crate::render::RenderCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once, after the window and GPU exist and before the first frame.
    ///
    /// An error aborts the event loop and is returned from `Runtime::run`.
    fn on_init(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()>;

    /// Called after the surface was reconfigured for a new drawable size.
    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        let _ = size;
    }

    /// Called for each paint request.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the event loop is exiting, before the GPU is dropped.
    fn on_exit(&mut self) {}
}
