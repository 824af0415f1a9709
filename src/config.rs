//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Window size must be non-zero, got {width}x{height}.")]
    ZeroSize { width: u32, height: u32 },

    #[error("Brightness must be a finite, non-negative number, got {0}.")]
    Brightness(f32),
}

/// Renders one colored triangle with a vertex/fragment shader pair.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Vertex shader source.
    #[arg(long, value_name = "PATH", default_value = "shaders/rainbow.vert")]
    pub vertex: PathBuf,

    /// Fragment shader source.
    #[arg(long, value_name = "PATH", default_value = "shaders/rainbow.frag")]
    pub fragment: PathBuf,

    #[arg(long, default_value_t = 800)]
    pub width: u32,

    #[arg(long, default_value_t = 600)]
    pub height: u32,

    #[arg(long, default_value = "LearnOpenGL")]
    pub title: String,

    /// Value written to the `brightness` uniform every frame.
    #[arg(long, default_value_t = 1.0)]
    pub brightness: f32,

    /// Draw polygon outlines only.
    #[arg(long)]
    pub wireframe: bool,

    /// Swap buffers as fast as possible instead of waiting for vblank.
    #[arg(long)]
    pub no_vsync: bool,
}

impl Config {
    /// # Errors
    ///
    /// - [`ConfigError::ZeroSize`]
    /// - [`ConfigError::Brightness`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroSize {
                width: self.width,
                height: self.height,
            });
        }
        if !self.brightness.is_finite() || self.brightness < 0.0 {
            return Err(ConfigError::Brightness(self.brightness));
        }
        Ok(())
    }
}
