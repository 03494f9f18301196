/// A single acquired frame: swapchain texture, its view and the encoder
/// recording into it.
///
/// Holding the surface texture blocks acquisition of the next frame, so
/// hand it back to [`Gpu::submit`](super::Gpu::submit) promptly.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
