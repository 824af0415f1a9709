//! The subset of the GL API the shader loader talks to.
//!
//! [`ShaderDriver`] is implemented for [`glow::Context`]. Every method assumes the context it is
//! called on is current on the calling thread, which the window module guarantees for the whole
//! lifetime of the render state.

use std::fmt::Debug;

use glow::HasContext;

use super::StageKind;

pub trait ShaderDriver {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type UniformLocation: Debug;

    fn create_shader(&self, kind: StageKind) -> Result<Self::Shader, String>;
    /// Uploads `source` into `shader` and runs the compiler on it.
    fn compile_shader(&self, shader: Self::Shader, source: &str);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    /// Writes to the currently bound program. A `None` location is ignored.
    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, value: i32);
    /// Writes to the currently bound program. A `None` location is ignored.
    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, value: f32);
}

impl ShaderDriver for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, kind: StageKind) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, kind.gl_enum()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) {
        unsafe {
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);
        }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, value: i32) {
        unsafe { HasContext::uniform_1_i32(self, location, value) }
    }

    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, value: f32) {
        unsafe { HasContext::uniform_1_f32(self, location, value) }
    }
}

/// In-memory driver that tracks every live object so tests can check for leaks.
///
/// Compilation succeeds when the source has a `void main()` and balanced brackets. Linking fails
/// when the fragment stage reads an `in` variable the vertex stage never writes as an `out`.
#[cfg(test)]
pub(crate) mod fake {
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
    };

    use super::{ShaderDriver, StageKind};

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub(crate) enum UniformValue {
        Int(i32),
        Float(f32),
    }

    #[derive(Debug)]
    struct FakeShader {
        kind: StageKind,
        source: String,
        compiled: bool,
    }

    #[derive(Debug, Default)]
    struct FakeProgram {
        attached: Vec<u32>,
        linked: bool,
        log: String,
        uniforms: Vec<String>,
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakeDriver {
        next_id: Cell<u32>,
        shaders: RefCell<HashMap<u32, FakeShader>>,
        programs: RefCell<HashMap<u32, FakeProgram>>,
        current: Cell<Option<u32>>,
        writes: RefCell<Vec<(u32, u32, UniformValue)>>,
        compiles: Cell<usize>,
        /// Overrides the info log returned for any failed stage or program.
        pub(crate) forced_log: Option<String>,
        /// Makes `create_shader` fail, like a lost context would.
        pub(crate) refuse_shaders: bool,
    }

    impl FakeDriver {
        pub(crate) fn live_shaders(&self) -> usize {
            self.shaders.borrow().len()
        }

        pub(crate) fn live_programs(&self) -> usize {
            self.programs.borrow().len()
        }

        pub(crate) fn compiles(&self) -> usize {
            self.compiles.get()
        }

        pub(crate) fn current_program(&self) -> Option<u32> {
            self.current.get()
        }

        /// `(program, location, value)` for every uniform write that hit a real location.
        pub(crate) fn uniform_writes(&self) -> Vec<(u32, u32, UniformValue)> {
            self.writes.borrow().clone()
        }

        fn next_id(&self) -> u32 {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            id
        }

        fn write(&self, location: Option<&u32>, value: UniformValue) {
            if let (Some(&location), Some(program)) = (location, self.current.get()) {
                self.writes.borrow_mut().push((program, location, value));
            }
        }
    }

    fn syntax_ok(source: &str) -> bool {
        let mut depth = [0i32; 2];
        for c in source.chars() {
            match c {
                '{' => depth[0] += 1,
                '}' => depth[0] -= 1,
                '(' => depth[1] += 1,
                ')' => depth[1] -= 1,
                _ => {}
            }
            if depth.iter().any(|d| *d < 0) {
                return false;
            }
        }
        depth == [0, 0] && source.contains("void main()")
    }

    fn declarations<'a>(source: &'a str, qualifier: &str) -> Vec<&'a str> {
        source
            .lines()
            .filter_map(|line| line.trim().strip_prefix(qualifier))
            .map(|rest| rest.trim().trim_end_matches(';').trim())
            .collect()
    }

    impl ShaderDriver for FakeDriver {
        type Shader = u32;
        type Program = u32;
        type UniformLocation = u32;

        fn create_shader(&self, kind: StageKind) -> Result<u32, String> {
            if self.refuse_shaders {
                return Err("context lost".to_owned());
            }
            let id = self.next_id();
            self.shaders.borrow_mut().insert(
                id,
                FakeShader {
                    kind,
                    source: String::new(),
                    compiled: false,
                },
            );
            Ok(id)
        }

        fn compile_shader(&self, shader: u32, source: &str) {
            self.compiles.set(self.compiles.get() + 1);
            if let Some(s) = self.shaders.borrow_mut().get_mut(&shader) {
                s.source = source.to_owned();
                s.compiled = syntax_ok(source);
            }
        }

        fn shader_compile_status(&self, shader: u32) -> bool {
            self.shaders
                .borrow()
                .get(&shader)
                .is_some_and(|s| s.compiled)
        }

        fn shader_info_log(&self, shader: u32) -> String {
            if let Some(log) = &self.forced_log {
                return log.clone();
            }
            match self.shaders.borrow().get(&shader) {
                Some(s) if !s.compiled => {
                    "0:1(1): error: syntax error, unexpected end of file\n".to_owned()
                }
                _ => String::new(),
            }
        }

        fn delete_shader(&self, shader: u32) {
            self.shaders.borrow_mut().remove(&shader);
        }

        fn create_program(&self) -> Result<u32, String> {
            let id = self.next_id();
            self.programs.borrow_mut().insert(id, FakeProgram::default());
            Ok(id)
        }

        fn attach_shader(&self, program: u32, shader: u32) {
            if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
                p.attached.push(shader);
            }
        }

        fn detach_shader(&self, program: u32, shader: u32) {
            if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
                p.attached.retain(|s| *s != shader);
            }
        }

        fn link_program(&self, program: u32) {
            let shaders = self.shaders.borrow();
            let mut programs = self.programs.borrow_mut();
            let Some(p) = programs.get_mut(&program) else {
                return;
            };

            let stages: Vec<&FakeShader> =
                p.attached.iter().filter_map(|id| shaders.get(id)).collect();
            let stage = |kind: StageKind| stages.iter().find(|s| s.kind == kind && s.compiled);
            let (Some(vertex), Some(fragment)) =
                (stage(StageKind::Vertex), stage(StageKind::Fragment))
            else {
                p.linked = false;
                p.log = "error: program is missing a compiled stage\n".to_owned();
                return;
            };

            let outputs = declarations(&vertex.source, "out ");
            let missing: Vec<&str> = declarations(&fragment.source, "in ")
                .into_iter()
                .filter(|input| !outputs.contains(input))
                .collect();

            p.linked = missing.is_empty();
            p.log = missing
                .iter()
                .map(|input| {
                    format!("error: fragment shader input '{input}' has no matching vertex output\n")
                })
                .collect();
            p.uniforms = [&vertex.source, &fragment.source]
                .into_iter()
                .flat_map(|src| declarations(src, "uniform "))
                .filter_map(|decl| decl.split_whitespace().last())
                .map(str::to_owned)
                .collect();
        }

        fn program_link_status(&self, program: u32) -> bool {
            self.programs
                .borrow()
                .get(&program)
                .is_some_and(|p| p.linked)
        }

        fn program_info_log(&self, program: u32) -> String {
            if let Some(log) = &self.forced_log {
                return log.clone();
            }
            self.programs
                .borrow()
                .get(&program)
                .map(|p| p.log.clone())
                .unwrap_or_default()
        }

        fn delete_program(&self, program: u32) {
            self.programs.borrow_mut().remove(&program);
            if self.current.get() == Some(program) {
                self.current.set(None);
            }
        }

        fn use_program(&self, program: Option<u32>) {
            self.current.set(program);
        }

        fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
            let programs = self.programs.borrow();
            let p = programs.get(&program).filter(|p| p.linked)?;
            p.uniforms
                .iter()
                .position(|u| u == name)
                .map(|i| i as u32)
        }

        fn uniform_1_i32(&self, location: Option<&u32>, value: i32) {
            self.write(location, UniformValue::Int(value));
        }

        fn uniform_1_f32(&self, location: Option<&u32>, value: f32) {
            self.write(location, UniformValue::Float(value));
        }
    }
}
