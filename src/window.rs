//! # Window Module
//!
//! The `window` module uses [`winit`] to create the window and poll events, [`glutin`] to put an
//! OpenGL 3.3 core context on it, and [`glow`] to issue GL calls. [`raw_window_handle`] bridges
//! the winit window to glutin when the context is created.
//!
//! All GL objects live in [`RenderState`], which exists between `resumed` and `exiting`.

use std::{ffi::CStr, num::NonZeroU32};

use glow::HasContext;
use glutin::{
    config::{Config as GlConfig, ConfigTemplateBuilder, GlConfig as _},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext,
        PossiblyCurrentContext, Version,
    },
    display::{GetGlDisplay, GlDisplay},
    surface::{GlSurface, Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::{HandleError, HasWindowHandle};
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window as WinitWindow, WindowId},
};

use crate::{
    config::Config,
    shader::{ShaderError, ShaderProgram},
    triangle::Triangle,
};

const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

/// Custom error types for window, context and GPU object setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WindowError {
    /// The display builder produced a GL config but no window.
    #[error("Window has not been created yet.")]
    NotInitialized,

    /// raw-window-handle failed to retrieve the window handle.
    #[error(transparent)]
    BadHandle(#[from] HandleError),

    /// No GL config matched the template, or the window could not be built.
    #[error("Failed to create a GL display: {0}")]
    Display(String),

    /// glutin failed to create the context or surface, or to make the context current.
    #[error(transparent)]
    Context(#[from] glutin::error::Error),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// The driver could not allocate the triangle's vertex objects.
    #[error("Failed to create vertex objects: {0}")]
    Geometry(String),
}

/// Everything that needs a live GL context.
struct RenderState {
    triangle: Triangle,
    shader: ShaderProgram<glow::Context>,
    gl: glow::Context,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: WinitWindow,
}

impl RenderState {
    fn new(event_loop: &ActiveEventLoop, config: &Config) -> Result<Self, WindowError> {
        let attributes = WinitWindow::default_attributes()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height));

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes))
            .build(event_loop, ConfigTemplateBuilder::new(), pick_config)
            .map_err(|e| WindowError::Display(e.to_string()))?;
        let window = window.ok_or(WindowError::NotInitialized)?;

        let raw_handle = window.window_handle()?.as_raw();
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_handle));

        let display = gl_config.display();
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes)? };

        let surface_attributes = window.build_surface_attributes(Default::default())?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes)? };
        let context = not_current.make_current(&surface)?;

        let interval = if config.no_vsync {
            SwapInterval::DontWait
        } else {
            SwapInterval::Wait(NonZeroU32::MIN)
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            log::warn!("Could not set swap interval {interval:?}: {err}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name: &CStr| display.get_proc_address(name))
        };
        log_driver_info(&gl);

        let shader = ShaderProgram::load(&gl, &config.vertex, &config.fragment)?;
        log::info!(
            "Loaded shader program {:?} from '{}' and '{}'",
            shader.id(),
            config.vertex.display(),
            config.fragment.display()
        );
        let triangle = match Triangle::new(&gl) {
            Ok(triangle) => triangle,
            Err(err) => {
                shader.delete(&gl);
                return Err(WindowError::Geometry(err));
            }
        };

        if config.wireframe {
            unsafe { gl.polygon_mode(glow::FRONT_AND_BACK, glow::LINE) };
        }

        let size = window.inner_size();
        unsafe { gl.viewport(0, 0, size.width as i32, size.height as i32) };

        Ok(Self {
            triangle,
            shader,
            gl,
            surface,
            context,
            window,
        })
    }

    fn resize(&self, size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return;
        };

        self.surface.resize(&self.context, width, height);
        unsafe { self.gl.viewport(0, 0, size.width as i32, size.height as i32) };
    }

    fn draw(&self, brightness: f32) -> Result<(), WindowError> {
        let [r, g, b, a] = CLEAR_COLOR;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }

        self.shader.use_program(&self.gl);
        self.shader.set_float(&self.gl, "brightness", brightness);
        self.triangle.draw(&self.gl);

        let error = unsafe { self.gl.get_error() };
        if error != glow::NO_ERROR {
            log::warn!("GL error 0x{error:04X} after draw");
        }

        self.surface.swap_buffers(&self.context)?;
        Ok(())
    }

    /// Releases GL objects while the context is still current.
    fn destroy(self) {
        self.triangle.delete(&self.gl);
        self.shader.delete(&self.gl);
        log::debug!("Released GPU objects");
    }
}

/// Prefers the config with the most MSAA samples.
fn pick_config(configs: Box<dyn Iterator<Item = GlConfig> + '_>) -> GlConfig {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("glutin never hands the picker an empty iterator")
}

fn log_driver_info(gl: &glow::Context) {
    unsafe {
        log::info!("OpenGL {}", gl.get_parameter_string(glow::VERSION));
        log::info!("Renderer: {}", gl.get_parameter_string(glow::RENDERER));
        log::info!(
            "Maximum nr of vertex attributes supported: {}",
            gl.get_parameter_i32(glow::MAX_VERTEX_ATTRIBS)
        );
    }
}

/// Application state driven by the winit event loop.
pub struct Window {
    config: Config,
    /// The GL state, present while the window exists
    inner: Option<RenderState>,
    result: Result<(), WindowError>,
}

impl Window {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            inner: None,
            result: Ok(()),
        }
    }

    /// Consumes the window, yielding the first error that stopped the event loop.
    ///
    /// # Errors
    ///
    /// Any [`WindowError`] raised while creating or drawing the window.
    pub fn finish(self) -> Result<(), WindowError> {
        self.result
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: WindowError) {
        log::error!("{err}");
        if self.result.is_ok() {
            self.result = Err(err);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for Window {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.inner.is_some() {
            return;
        }

        match RenderState::new(event_loop, &self.config) {
            Ok(state) => {
                state.window.request_redraw();
                self.inner = Some(state);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.inner.as_ref() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed; stopping");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("Escape was pressed; stopping");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::RedrawRequested => match state.draw(self.config.brightness) {
                Ok(()) => state.window.request_redraw(),
                Err(err) => self.fail(event_loop, err),
            },
            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.inner.take() {
            state.destroy();
        }
    }
}
