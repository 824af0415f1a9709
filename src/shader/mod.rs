//! # Shader Module
//!
//! Loads a vertex/fragment GLSL pair from disk, compiles both stages, and links them into a
//! [`ShaderProgram`]. Stage objects only live for the duration of [`ShaderProgram::load`]; the
//! returned program is the only GL object the caller has to release.

mod driver;
mod error;

use std::{fmt, fs, path::Path};

pub use driver::ShaderDriver;
pub use error::ShaderError;

/// Upper bound in bytes for driver diagnostics carried by [`ShaderError`].
pub const INFO_LOG_LIMIT: usize = 1024;

/// Pipeline role of a single compiled stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// A linked GPU program.
///
/// The handle is not released on drop because that needs the driver; call
/// [`ShaderProgram::delete`] before the context is torn down.
#[derive(Debug)]
pub struct ShaderProgram<D: ShaderDriver> {
    program: D::Program,
}

impl<D: ShaderDriver> ShaderProgram<D> {
    /// Reads both source files, then compiles and links them.
    ///
    /// Both files are read before anything is handed to the driver, so a missing file never
    /// leaves GL objects behind.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::FileRead`]
    /// - [`ShaderError::Compile`]
    /// - [`ShaderError::Link`]
    /// - [`ShaderError::Driver`]
    pub fn load(
        driver: &D,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_src = read_source(StageKind::Vertex, vertex_path.as_ref())?;
        let fragment_src = read_source(StageKind::Fragment, fragment_path.as_ref())?;

        Self::from_sources(driver, &vertex_src, &fragment_src)
    }

    /// Compiles and links two in-memory sources.
    ///
    /// # Errors
    ///
    /// - [`ShaderError::Compile`]
    /// - [`ShaderError::Link`]
    /// - [`ShaderError::Driver`]
    pub fn from_sources(
        driver: &D,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(driver, StageKind::Vertex, vertex_src)?;
        let fragment = match compile_stage(driver, StageKind::Fragment, fragment_src) {
            Ok(fragment) => fragment,
            Err(err) => {
                driver.delete_shader(vertex);
                return Err(err);
            }
        };

        let linked = link(driver, vertex, fragment);

        // Stages are released whatever the link outcome.
        driver.delete_shader(vertex);
        driver.delete_shader(fragment);

        let program = linked?;
        log::debug!("Linked shader program {program:?}");

        Ok(Self { program })
    }

    /// Makes this program current for subsequent draw calls.
    pub fn use_program(&self, driver: &D) {
        driver.use_program(Some(self.program));
    }

    /// Writes a bool uniform as `0`/`1`. Unknown names are ignored, as are writes while another
    /// program is current.
    pub fn set_bool(&self, driver: &D, name: &str, value: bool) {
        self.set_int(driver, name, i32::from(value));
    }

    pub fn set_int(&self, driver: &D, name: &str, value: i32) {
        let location = driver.uniform_location(self.program, name);
        driver.uniform_1_i32(location.as_ref(), value);
    }

    pub fn set_float(&self, driver: &D, name: &str, value: f32) {
        let location = driver.uniform_location(self.program, name);
        driver.uniform_1_f32(location.as_ref(), value);
    }

    pub fn id(&self) -> D::Program {
        self.program
    }

    /// Releases the program object.
    pub fn delete(self, driver: &D) {
        driver.delete_program(self.program);
    }
}

fn read_source(stage: StageKind, path: &Path) -> Result<String, ShaderError> {
    fs::read_to_string(path).map_err(|source| {
        log::error!("Could not read {stage} shader '{}': {source}", path.display());
        ShaderError::FileRead {
            stage,
            path: path.to_path_buf(),
            source,
        }
    })
}

fn compile_stage<D: ShaderDriver>(
    driver: &D,
    stage: StageKind,
    source: &str,
) -> Result<D::Shader, ShaderError> {
    let shader = driver.create_shader(stage).map_err(ShaderError::Driver)?;
    driver.compile_shader(shader, source);

    if driver.shader_compile_status(shader) {
        return Ok(shader);
    }

    let log = bounded_log(driver.shader_info_log(shader));
    driver.delete_shader(shader);
    log::error!("{stage} shader failed to compile:\n{log}");

    Err(ShaderError::Compile { stage, log })
}

fn link<D: ShaderDriver>(
    driver: &D,
    vertex: D::Shader,
    fragment: D::Shader,
) -> Result<D::Program, ShaderError> {
    let program = driver.create_program().map_err(ShaderError::Driver)?;
    driver.attach_shader(program, vertex);
    driver.attach_shader(program, fragment);
    driver.link_program(program);

    let linked = driver.program_link_status(program);
    driver.detach_shader(program, vertex);
    driver.detach_shader(program, fragment);

    if linked {
        return Ok(program);
    }

    let log = bounded_log(driver.program_info_log(program));
    driver.delete_program(program);
    log::error!("Shader program failed to link:\n{log}");

    Err(ShaderError::Link { log })
}

/// Trims trailing NULs and whitespace, then cuts the log at [`INFO_LOG_LIMIT`] bytes without
/// splitting a character.
fn bounded_log(mut log: String) -> String {
    let end = log.trim_end_matches(['\0', '\n', '\r', ' ']).len();
    log.truncate(end);

    if log.len() > INFO_LOG_LIMIT {
        let mut cut = INFO_LOG_LIMIT;
        while !log.is_char_boundary(cut) {
            cut -= 1;
        }
        log.truncate(cut);
    }
    log
}
