use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use wgpu::util::DeviceExt;

use crate::shader::Program;

use super::RenderCtx;

/// Directional light block, laid out to match the `LightParameters` uniform
/// block (three `vec4<f32>` fields in this order).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightParameters {
    pub diffuse_intensity: Vec4,
    pub ambient_intensity: Vec4,
    pub light_direction: Vec4,
}

/// Bytes uploaded into the light uniform buffer.
pub const LIGHT_PARAMETERS_SIZE: u64 = std::mem::size_of::<LightParameters>() as u64;

impl Default for LightParameters {
    fn default() -> Self {
        Self {
            diffuse_intensity: Vec4::new(0.5, 0.5, 0.5, 1.0),
            ambient_intensity: Vec4::new(0.3, 0.3, 0.3, 1.0),
            light_direction: Vec4::new(-1.0, -1.0, 0.25, 1.0),
        }
    }
}

/// Constant shading inputs: the object color and the light.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub diffuse_color: Vec4,
    pub light: LightParameters,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse_color: Vec4::new(0.3, 0.3, 1.0, 1.0),
            light: LightParameters::default(),
        }
    }
}

/// Uniform buffers and the bind group exposing them to the program.
///
/// Written once at creation; never updated afterwards.
pub struct UniformState {
    diffuse_ubo: wgpu::Buffer,
    light_ubo: wgpu::Buffer,
    light_size: u64,
    bind_group: wgpu::BindGroup,
}

impl UniformState {
    pub fn create(ctx: &RenderCtx<'_>, program: &Program, material: &Material) -> Self {
        let interface = program.interface();

        let diffuse_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sphere diffuse color ubo"),
            size: std::mem::size_of::<Vec4>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue
            .write_buffer(&diffuse_ubo, 0, bytemuck::bytes_of(&material.diffuse_color));

        let light_ubo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere light ubo"),
            contents: bytemuck::bytes_of(&material.light),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sphere uniforms bind group"),
            layout: program.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: interface.diffuse_color.binding,
                    resource: diffuse_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: interface.light_block.binding,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &light_ubo,
                        offset: 0,
                        size: NonZeroU64::new(LIGHT_PARAMETERS_SIZE),
                    }),
                },
            ],
        });

        log::info!(
            "uploaded {LIGHT_PARAMETERS_SIZE} bytes of light parameters (binding {}), diffuse color at binding {}",
            interface.light_block.binding,
            interface.diffuse_color.binding
        );

        Self {
            diffuse_ubo,
            light_ubo,
            light_size: LIGHT_PARAMETERS_SIZE,
            bind_group,
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Bytes of the light buffer range bound to the `LightParameters` block.
    pub fn light_binding_size(&self) -> u64 {
        self.light_size
    }
}

impl Drop for UniformState {
    fn drop(&mut self) {
        self.diffuse_ubo.destroy();
        self.light_ubo.destroy();
        log::debug!("released uniform buffers");
    }
}
