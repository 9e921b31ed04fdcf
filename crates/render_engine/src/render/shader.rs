//! Shader program compilation
//!
//! Turns a vertex+fragment source pair into a linked program handle. Shader
//! sources are build-time assets shipped with the binary, so every failure
//! here (unreadable file, compile error, link error) is fatal at startup
//! and never retried.

use std::fmt;
use std::path::{Path, PathBuf};

use glow::HasContext;
use thiserror::Error;

/// The shader stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl ShaderStage {
    fn gl_type(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Shader compilation and linking errors
#[derive(Error, Debug)]
pub enum ShaderError {
    /// A shader source file could not be read
    #[error("failed to read shader source {path:?}: {source}")]
    Io {
        /// Path of the unreadable source file
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A GL shader or program object could not be allocated
    #[error("failed to allocate GL shader object: {0}")]
    Allocate(String),

    /// One stage failed to compile; carries the raw compiler log
    #[error("{stage} shader compilation failed:\n{log}")]
    Compile {
        /// The offending stage
        stage: ShaderStage,
        /// Raw driver compiler log
        log: String,
    },

    /// The program failed to link; carries the raw linker log
    #[error("shader program link failed:\n{log}")]
    Link {
        /// Raw driver linker log
        log: String,
    },
}

/// Result type for shader operations
pub type ShaderResult<T> = Result<T, ShaderError>;

/// A linked GL shader program
pub struct ShaderProgram {
    raw: glow::NativeProgram,
}

impl ShaderProgram {
    /// Compile and link a program from source strings
    pub fn from_sources(
        gl: &glow::Context,
        vertex_source: &str,
        fragment_source: &str,
    ) -> ShaderResult<Self> {
        unsafe {
            let vs = compile_stage(gl, ShaderStage::Vertex, vertex_source)?;
            let fs = match compile_stage(gl, ShaderStage::Fragment, fragment_source) {
                Ok(fs) => fs,
                Err(e) => {
                    gl.delete_shader(vs);
                    return Err(e);
                }
            };

            let program = match gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    gl.delete_shader(vs);
                    gl.delete_shader(fs);
                    return Err(ShaderError::Allocate(e));
                }
            };
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            gl.link_program(program);

            // The stage objects are no longer needed once the program holds
            // the linked binary
            gl.detach_shader(program, vs);
            gl.detach_shader(program, fs);
            gl.delete_shader(vs);
            gl.delete_shader(fs);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(ShaderError::Link { log });
            }

            Ok(Self { raw: program })
        }
    }

    /// Read, compile, and link a program from source files
    pub fn from_files(
        gl: &glow::Context,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> ShaderResult<Self> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();

        log::info!(
            "Compiling shader program: {:?} + {:?}",
            vertex_path,
            fragment_path
        );

        let vertex_source = read_source(vertex_path)?;
        let fragment_source = read_source(fragment_path)?;

        Self::from_sources(gl, &vertex_source, &fragment_source)
    }

    /// The underlying GL handle
    pub fn raw(&self) -> glow::NativeProgram {
        self.raw
    }
}

fn read_source(path: &Path) -> ShaderResult<String> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

unsafe fn compile_stage(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> ShaderResult<glow::NativeShader> {
    let shader = gl
        .create_shader(stage.gl_type())
        .map_err(ShaderError::Allocate)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(ShaderError::Compile { stage, log });
    }

    Ok(shader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_source_file_is_io_error() {
        let err = read_source(Path::new("shader/does_not_exist.frag")).unwrap_err();
        match err {
            ShaderError::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("shader/does_not_exist.frag"));
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_source_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "#version 330 core\nvoid main() {{}}\n").unwrap();

        let source = read_source(file.path()).unwrap();
        assert!(source.starts_with("#version 330 core"));
    }

    #[test]
    fn test_stage_names_in_diagnostics() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");

        let err = ShaderError::Compile {
            stage: ShaderStage::Fragment,
            log: "0:12: 'foo' : undeclared identifier".into(),
        };
        let message = err.to_string();
        assert!(message.contains("fragment shader compilation failed"));
        assert!(message.contains("undeclared identifier"));
    }
}
