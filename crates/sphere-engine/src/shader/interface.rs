use std::collections::BTreeSet;

use crate::mesh::ElementType;
use crate::render::LightParameters;

use super::{
    CompiledStage, ShaderError, ATTRIB_COORDS, ATTRIB_NORMALS, COORDS_INPUT,
    DIFFUSE_COLOR_UNIFORM, LIGHT_BLOCK, NORMALS_INPUT,
};

/// A uniform buffer binding reflected from shader source.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformSlot {
    pub group: u32,
    pub binding: u32,
    /// Size of the bound type in bytes.
    pub size: u32,
}

/// The linked interface of a vertex + fragment stage pair.
///
/// Produced by [`ShaderInterface::link`], which fails unless the sources
/// honor the fixed binding contract described in [`crate::shader`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderInterface {
    pub diffuse_color: UniformSlot,
    pub light_block: UniformSlot,
    /// Scalar type the vertex stage reads `in_coords` as.
    pub coords_element: ElementType,
    /// Scalar type the vertex stage reads `in_normals` as.
    pub normals_element: ElementType,
}

impl ShaderInterface {
    /// Links two compiled stages.
    ///
    /// Checks, in order:
    /// - the vertex inputs `in_coords`/`in_normals` sit at their fixed slots
    /// - every fragment input is produced by the vertex stage
    /// - `diffuse_color` (vec4) and the `LightParameters` block exist in bind
    ///   group 0 at distinct bindings, consistently across stages
    pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<Self, ShaderError> {
        let vs_entry = vertex
            .entry()
            .ok_or_else(|| ShaderError::link("vertex stage has no entry point"))?;
        let fs_entry = fragment
            .entry()
            .ok_or_else(|| ShaderError::link("fragment stage has no entry point"))?;

        let inputs = entry_inputs(vertex.module(), vs_entry);
        let coords_element = check_attribute(vertex.module(), &inputs, COORDS_INPUT, ATTRIB_COORDS)?;
        let normals_element =
            check_attribute(vertex.module(), &inputs, NORMALS_INPUT, ATTRIB_NORMALS)?;

        let outputs = entry_outputs(vertex.module(), vs_entry);
        for (name, location, _) in entry_inputs(fragment.module(), fs_entry) {
            if !outputs.contains(&location) {
                return Err(ShaderError::link(format!(
                    "fragment input `{name}` at location {location} is not written by the vertex stage"
                )));
            }
        }

        let mut diffuse_color = None;
        let mut light_block = None;
        for stage in [vertex, fragment] {
            let found = find_uniforms(stage.module())?;
            merge_slot(&mut diffuse_color, found.diffuse_color, DIFFUSE_COLOR_UNIFORM)?;
            merge_slot(&mut light_block, found.light_block, LIGHT_BLOCK)?;
        }

        let diffuse_color = diffuse_color.ok_or_else(|| {
            ShaderError::link(format!("no uniform named `{DIFFUSE_COLOR_UNIFORM}` is declared"))
        })?;
        let light_block = light_block.ok_or_else(|| {
            ShaderError::link(format!("no uniform block of type `{LIGHT_BLOCK}` is declared"))
        })?;

        if diffuse_color.binding == light_block.binding {
            return Err(ShaderError::link(format!(
                "`{DIFFUSE_COLOR_UNIFORM}` and `{LIGHT_BLOCK}` share binding {}",
                light_block.binding
            )));
        }

        Ok(Self {
            diffuse_color,
            light_block,
            coords_element,
            normals_element,
        })
    }

    /// Uniform slots in binding order.
    pub fn uniform_slots(&self) -> [UniformSlot; 2] {
        let mut slots = [self.diffuse_color, self.light_block];
        slots.sort_by_key(|s| s.binding);
        slots
    }
}

#[derive(Default)]
struct StageUniforms {
    diffuse_color: Option<UniformSlot>,
    light_block: Option<UniformSlot>,
}

/// Checks the slot of a vertex input and returns the scalar type it is read as.
fn check_attribute(
    module: &naga::Module,
    inputs: &[EntryInput],
    name: &str,
    slot: u32,
) -> Result<ElementType, ShaderError> {
    let Some((_, location, ty)) = inputs.iter().find(|(n, _, _)| n == name) else {
        return Err(ShaderError::link(format!("vertex stage declares no input named `{name}`")));
    };
    if *location != slot {
        return Err(ShaderError::link(format!(
            "vertex input `{name}` is bound to location {location}, expected {slot}"
        )));
    }

    input_element(module, *ty).ok_or_else(|| {
        ShaderError::link(format!(
            "vertex input `{name}` must be a 32-bit float, uint or sint scalar or vector"
        ))
    })
}

fn input_element(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Option<ElementType> {
    let scalar = match module.types[ty].inner {
        naga::TypeInner::Scalar(scalar) => scalar,
        naga::TypeInner::Vector { scalar, .. } => scalar,
        _ => return None,
    };

    match (scalar.kind, scalar.width) {
        (naga::ScalarKind::Float, 4) => Some(ElementType::F32),
        (naga::ScalarKind::Uint, 4) => Some(ElementType::U32),
        (naga::ScalarKind::Sint, 4) => Some(ElementType::I32),
        _ => None,
    }
}

/// `(name, location, type)` of an entry point input.
type EntryInput = (String, u32, naga::Handle<naga::Type>);

/// Every user-defined input of an entry point, including members of
/// struct-typed arguments.
fn entry_inputs(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<EntryInput> {
    let mut inputs = Vec::new();

    for arg in &entry.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => {
                inputs.push((arg.name.clone().unwrap_or_default(), *location, arg.ty));
            }
            Some(_) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                            inputs.push((
                                member.name.clone().unwrap_or_default(),
                                *location,
                                member.ty,
                            ));
                        }
                    }
                }
            }
        }
    }

    inputs
}

/// Locations written by an entry point's result.
fn entry_outputs(module: &naga::Module, entry: &naga::EntryPoint) -> BTreeSet<u32> {
    let mut outputs = BTreeSet::new();
    let Some(result) = &entry.function.result else { return outputs };

    match &result.binding {
        Some(naga::Binding::Location { location, .. }) => {
            outputs.insert(*location);
        }
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[result.ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        outputs.insert(*location);
                    }
                }
            }
        }
    }

    outputs
}

fn find_uniforms(module: &naga::Module) -> Result<StageUniforms, ShaderError> {
    let mut found = StageUniforms::default();

    for (_, var) in module.global_variables.iter() {
        if var.space != naga::AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = &var.binding else { continue };
        let ty = &module.types[var.ty];

        let is_diffuse = var.name.as_deref() == Some(DIFFUSE_COLOR_UNIFORM);
        let is_light = ty.name.as_deref() == Some(LIGHT_BLOCK);
        if !is_diffuse && !is_light {
            continue;
        }

        if binding.group != 0 {
            return Err(ShaderError::link(format!(
                "uniform `{}` is in bind group {}, expected 0",
                var.name.as_deref().unwrap_or("?"),
                binding.group
            )));
        }

        if is_diffuse {
            let is_vec4 = matches!(
                ty.inner,
                naga::TypeInner::Vector { size: naga::VectorSize::Quad, scalar }
                    if scalar == naga::Scalar::F32
            );
            if !is_vec4 {
                return Err(ShaderError::link(format!(
                    "uniform `{DIFFUSE_COLOR_UNIFORM}` must be a vec4<f32>"
                )));
            }
            found.diffuse_color = Some(UniformSlot {
                group: binding.group,
                binding: binding.binding,
                size: 16,
            });
        } else {
            let expected = std::mem::size_of::<LightParameters>() as u32;
            let span = match &ty.inner {
                naga::TypeInner::Struct { span, .. } => *span,
                _ => 0,
            };
            if span != expected {
                return Err(ShaderError::link(format!(
                    "uniform block `{LIGHT_BLOCK}` is {span} bytes, expected {expected}"
                )));
            }
            found.light_block = Some(UniformSlot {
                group: binding.group,
                binding: binding.binding,
                size: span,
            });
        }
    }

    Ok(found)
}

fn merge_slot(
    acc: &mut Option<UniformSlot>,
    found: Option<UniformSlot>,
    name: &str,
) -> Result<(), ShaderError> {
    match (*acc, found) {
        (_, None) => Ok(()),
        (None, Some(slot)) => {
            *acc = Some(slot);
            Ok(())
        }
        (Some(prev), Some(slot)) if prev == slot => Ok(()),
        (Some(prev), Some(slot)) => Err(ShaderError::link(format!(
            "`{name}` is bound to binding {} in one stage and {} in the other",
            prev.binding, slot.binding
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{compile_stage, fixtures, StageKind};

    fn vs(src: &str) -> CompiledStage {
        compile_stage(StageKind::Vertex, "test.vert.wgsl", src.into()).unwrap()
    }

    fn fs(src: &str) -> CompiledStage {
        compile_stage(StageKind::Fragment, "test.frag.wgsl", src.into()).unwrap()
    }

    fn link_reason(vertex: &str, fragment: &str) -> String {
        match ShaderInterface::link(&vs(vertex), &fs(fragment)) {
            Err(ShaderError::Link { reason }) => reason,
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn fixtures_link() {
        let iface = ShaderInterface::link(&vs(fixtures::VERTEX), &fs(fixtures::FRAGMENT)).unwrap();
        assert_eq!(iface.light_block, UniformSlot { group: 0, binding: 0, size: 48 });
        assert_eq!(iface.diffuse_color, UniformSlot { group: 0, binding: 1, size: 16 });
        assert_eq!(iface.uniform_slots()[0].binding, 0);
        assert_eq!(iface.coords_element, ElementType::F32);
        assert_eq!(iface.normals_element, ElementType::F32);
    }

    #[test]
    fn integer_inputs_are_reflected() {
        let vertex = fixtures::VERTEX
            .replace("in_coords: vec3<f32>", "in_coords: vec3<u32>")
            .replace("in_coords.xy, in_coords.z * 0.5 + 0.5", "vec3<f32>(in_coords).xy, 0.5");
        let iface = ShaderInterface::link(&vs(&vertex), &fs(fixtures::FRAGMENT)).unwrap();
        assert_eq!(iface.coords_element, ElementType::U32);
        assert_eq!(iface.normals_element, ElementType::F32);
    }

    #[test]
    fn swapped_attribute_locations_fail() {
        let vertex = fixtures::VERTEX
            .replace("@location(0) in_coords", "@location(9) in_coords")
            .replace("@location(1) in_normals", "@location(0) in_normals")
            .replace("@location(9) in_coords", "@location(1) in_coords");
        let reason = link_reason(&vertex, fixtures::FRAGMENT);
        assert!(reason.contains("in_coords"), "{reason}");
    }

    #[test]
    fn renamed_normal_input_fails() {
        let vertex = fixtures::VERTEX.replace("in_normals", "in_norm");
        let reason = link_reason(&vertex, fixtures::FRAGMENT);
        assert!(reason.contains(NORMALS_INPUT), "{reason}");
    }

    #[test]
    fn struct_inputs_are_reflected() {
        let vertex = r#"
struct Attribs {
    @location(0) in_coords: vec3<f32>,
    @location(1) in_normals: vec3<f32>,
};
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
};
@vertex
fn vs_main(a: Attribs) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(a.in_coords, 1.0);
    out.normal = a.in_normals;
    return out;
}
"#;
        ShaderInterface::link(&vs(vertex), &fs(fixtures::FRAGMENT)).unwrap();
    }

    #[test]
    fn missing_light_block_fails() {
        let fragment = r#"
@group(0) @binding(1) var<uniform> diffuse_color: vec4<f32>;
@fragment
fn fs_main(@location(0) normal: vec3<f32>) -> @location(0) vec4<f32> {
    return diffuse_color;
}
"#;
        let reason = link_reason(fixtures::VERTEX, fragment);
        assert!(reason.contains(LIGHT_BLOCK), "{reason}");
    }

    #[test]
    fn short_light_block_fails() {
        let fragment = fixtures::FRAGMENT.replace("    light_direction: vec4<f32>,\n", "");
        let fragment = fragment.replace("light.light_direction.xyz", "vec3<f32>(-1.0, -1.0, 0.25)");
        let reason = link_reason(fixtures::VERTEX, &fragment);
        assert!(reason.contains("32 bytes"), "{reason}");
    }

    #[test]
    fn unmatched_fragment_input_fails() {
        let fragment = fixtures::FRAGMENT.replace("@location(0) normal", "@location(3) normal");
        let reason = link_reason(fixtures::VERTEX, &fragment);
        assert!(reason.contains("location 3"), "{reason}");
    }

    #[test]
    fn shared_binding_across_stages_fails() {
        let vertex = format!(
            "@group(0) @binding(0) var<uniform> diffuse_color: vec4<f32>;\n{}",
            fixtures::VERTEX
        );
        let fragment = r#"
struct LightParameters {
    diffuse_intensity: vec4<f32>,
    ambient_intensity: vec4<f32>,
    light_direction: vec4<f32>,
};
@group(0) @binding(0) var<uniform> light: LightParameters;
@fragment
fn fs_main(@location(0) normal: vec3<f32>) -> @location(0) vec4<f32> {
    return light.ambient_intensity;
}
"#;
        let reason = link_reason(&vertex, fragment);
        assert!(reason.contains("share binding"), "{reason}");
    }

    #[test]
    fn inconsistent_bindings_across_stages_fail() {
        let vertex = format!(
            "@group(0) @binding(5) var<uniform> diffuse_color: vec4<f32>;\n{}",
            fixtures::VERTEX
        );
        let reason = link_reason(&vertex, fixtures::FRAGMENT);
        assert!(reason.contains(DIFFUSE_COLOR_UNIFORM), "{reason}");
    }
}
