use std::fmt;
use std::path::{Path, PathBuf};

use super::{read_shader_source, ShaderError};

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn naga(self) -> naga::ShaderStage {
        match self {
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// A parsed and validated shader stage.
///
/// Holds the source text (for GPU module creation) and the `naga` module
/// (for interface reflection).
#[derive(Debug)]
pub struct CompiledStage {
    kind: StageKind,
    path: PathBuf,
    source: String,
    module: naga::Module,
    entry_point: String,
}

impl CompiledStage {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    /// Name of the entry point used for this stage.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// The entry point declaration for this stage.
    pub(crate) fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.stage == self.kind.naga() && ep.name == self.entry_point)
    }

    /// Creates the GPU shader module from the validated source.
    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        let label = format!("sphere {} shader", self.kind);
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
        })
    }
}

/// Compiles WGSL source for one stage.
///
/// Parse and validation errors are returned with the full diagnostic. The
/// module must declare an entry point for `kind`; the first one found is used.
pub fn compile_stage(
    kind: StageKind,
    path: impl Into<PathBuf>,
    source: String,
) -> Result<CompiledStage, ShaderError> {
    let path = path.into();
    let compile_error = |log: String| ShaderError::Compile {
        stage: kind,
        path: path.clone(),
        log,
    };

    let module = naga::front::wgsl::parse_str(&source)
        .map_err(|err| compile_error(err.emit_to_string(&source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|err| compile_error(err.emit_to_string(&source)))?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == kind.naga())
        .map(|ep| ep.name.clone())
        .ok_or_else(|| compile_error(format!("no @{kind} entry point declared")))?;

    log::debug!("compiled {kind} stage {} (entry point `{entry_point}`)", path.display());

    Ok(CompiledStage {
        kind,
        path,
        source,
        module,
        entry_point,
    })
}

/// Reads and compiles one stage from disk.
pub fn load_stage(kind: StageKind, path: impl AsRef<Path>) -> Result<CompiledStage, ShaderError> {
    let path = path.as_ref();
    let source = read_shader_source(path)?;
    compile_stage(kind, path, source)
}
