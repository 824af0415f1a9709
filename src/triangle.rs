//! # Triangle Module
//!
//! The hard-coded triangle: its vertex layout, the VAO/VBO that hold it on the GPU, and the draw
//! call that renders it.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use glow::HasContext;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Bottom left red, bottom right green, top middle blue.
pub const VERTICES: [Vertex; 3] = [
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [1.0, 0.0, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: [0.0, 0.0, 1.0],
    },
];

const POSITION_LOCATION: u32 = 0;
const COLOR_LOCATION: u32 = 1;
const STRIDE: i32 = size_of::<Vertex>() as i32;

pub struct Triangle {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
}

impl Triangle {
    /// Uploads [`VERTICES`] and describes the position/color attributes.
    ///
    /// # Errors
    ///
    /// Returns the driver's message if a VAO or VBO cannot be created.
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        unsafe {
            let vao = gl.create_vertex_array()?;
            let vbo = match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(err) => {
                    gl.delete_vertex_array(vao);
                    return Err(err);
                }
            };

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&VERTICES),
                glow::STATIC_DRAW,
            );

            gl.vertex_attrib_pointer_f32(
                POSITION_LOCATION,
                3,
                glow::FLOAT,
                false,
                STRIDE,
                offset_of!(Vertex, position) as i32,
            );
            gl.enable_vertex_attrib_array(POSITION_LOCATION);

            gl.vertex_attrib_pointer_f32(
                COLOR_LOCATION,
                3,
                glow::FLOAT,
                false,
                STRIDE,
                offset_of!(Vertex, color) as i32,
            );
            gl.enable_vertex_attrib_array(COLOR_LOCATION);

            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);

            log::debug!("Uploaded {} vertices ({STRIDE} byte stride)", VERTICES.len());
            Ok(Self { vao, vbo })
        }
    }

    pub fn draw(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, VERTICES.len() as i32);
        }
    }

    pub fn delete(self, gl: &glow::Context) {
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
        }
    }
}
