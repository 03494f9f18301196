use std::path::Path;

use super::ShaderError;

/// Reads the full text of a shader file.
pub fn read_shader_source(path: impl AsRef<Path>) -> Result<String, ShaderError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ShaderError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("read {} bytes of shader source from {}", text.len(), path.display());
    Ok(text)
}
