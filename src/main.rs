//! # GL Triangle
//!
//! This binary uses [`winit`] and [`glutin`] to open a window with an OpenGL 3.3 core context,
//! and [`glow`] to draw a single colored triangle through a vertex/fragment shader pair loaded
//! from disk. Shader compile and link diagnostics are reported as errors instead of being drawn
//! with a broken program.

mod config;
mod logging;
mod shader;
mod triangle;
mod window;

use anyhow::Context;
use clap::Parser;
use config::Config;
use window::Window;
use winit::event_loop::{ControlFlow, EventLoop};

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::parse();
    config.validate().context("Invalid configuration")?;
    log::debug!("{config:?}");

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut window = Window::new(config);
    event_loop
        .run_app(&mut window)
        .context("Event loop terminated with an error")?;

    window.finish().context("Renderer stopped")?;
    Ok(())
}
