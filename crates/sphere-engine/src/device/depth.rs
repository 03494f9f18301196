use winit::dpi::PhysicalSize;

/// Depth attachment sized to the surface.
pub struct DepthTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

impl DepthTarget {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sphere depth target"),
            size: extent_for(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view, format }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Replaces the texture when the drawable size changed.
    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        let extent = extent_for(size);
        if self.texture.size() == extent {
            return;
        }
        *self = Self::new(device, self.format, size);
    }
}

impl Drop for DepthTarget {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

/// wgpu rejects zero-sized textures; clamp each side to 1.
fn extent_for(size: PhysicalSize<u32>) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_matches_drawable() {
        let e = extent_for(PhysicalSize::new(300, 200));
        assert_eq!((e.width, e.height, e.depth_or_array_layers), (300, 200, 1));
    }

    #[test]
    fn zero_size_is_clamped() {
        let e = extent_for(PhysicalSize::new(0, 0));
        assert_eq!((e.width, e.height), (1, 1));
    }
}
