use super::math::{Color, Vec2};
use anyhow::Result;
use glow::HasContext;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

const EFFECT_NONE: i32 = 0;
const EFFECT_DISC: i32 = 1;
const EFFECT_ROUNDED: i32 = 2;

/// Two triangles covering the axis-aligned box.
pub fn rect_vertices(x: f32, y: f32, w: f32, h: f32) -> [Vertex; 6] {
    let x2 = x + w;
    let y2 = y + h;
    [
        Vertex { pos: [x, y], uv: [0.0, 0.0] },
        Vertex { pos: [x2, y], uv: [1.0, 0.0] },
        Vertex { pos: [x2, y2], uv: [1.0, 1.0] },

        Vertex { pos: [x, y], uv: [0.0, 0.0] },
        Vertex { pos: [x2, y2], uv: [1.0, 1.0] },
        Vertex { pos: [x, y2], uv: [0.0, 1.0] },
    ]
}

/// Quad of the given width centred on the segment `a`-`b`.
/// Degenerate segments produce nothing.
pub fn line_vertices(a: Vec2, b: Vec2, width: f32) -> Option<[Vertex; 6]> {
    let dir = b - a;
    let len = dir.length();
    if len <= f32::EPSILON {
        return None;
    }
    let n = Vec2::new(-dir.y / len, dir.x / len) * (width / 2.0);

    let p0 = a + n;
    let p1 = b + n;
    let p2 = b - n;
    let p3 = a - n;
    Some([
        Vertex { pos: [p0.x, p0.y], uv: [0.0, 0.0] },
        Vertex { pos: [p1.x, p1.y], uv: [1.0, 0.0] },
        Vertex { pos: [p2.x, p2.y], uv: [1.0, 1.0] },

        Vertex { pos: [p0.x, p0.y], uv: [0.0, 0.0] },
        Vertex { pos: [p2.x, p2.y], uv: [1.0, 1.0] },
        Vertex { pos: [p3.x, p3.y], uv: [0.0, 1.0] },
    ])
}

pub struct DrawContext {
    gl: glow::Context,
    program: glow::Program,
    vbo: glow::Buffer,
    vertices: Vec<Vertex>,

    // Uniform locations
    u_viewport: Option<glow::UniformLocation>,
    u_color: Option<glow::UniformLocation>,
    u_effect_mode: Option<glow::UniformLocation>,
    u_shape_size: Option<glow::UniformLocation>,
    u_radius: Option<glow::UniformLocation>,
}

impl DrawContext {
    pub fn new(gl: glow::Context, program: glow::Program) -> Result<Self> {
        let vbo = unsafe {
            gl.create_buffer()
                .map_err(|e| anyhow::anyhow!("Failed to create buffer: {}", e))?
        };

        let u_viewport = unsafe { gl.get_uniform_location(program, "uViewport") };
        let u_color = unsafe { gl.get_uniform_location(program, "uColor") };
        let u_effect_mode = unsafe { gl.get_uniform_location(program, "uEffectMode") };
        let u_shape_size = unsafe { gl.get_uniform_location(program, "uShapeSize") };
        let u_radius = unsafe { gl.get_uniform_location(program, "uRadius") };

        Ok(Self {
            gl,
            program,
            vbo,
            vertices: Vec::with_capacity(1024),
            u_viewport,
            u_color,
            u_effect_mode,
            u_shape_size,
            u_radius,
        })
    }

    pub fn begin(&mut self, viewport_px: [f32; 2], clear: Color) {
        self.vertices.clear();

        unsafe {
            self.gl.viewport(0, 0, viewport_px[0] as i32, viewport_px[1] as i32);
            self.gl.clear_color(clear.r, clear.g, clear.b, clear.a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);

            // Alpha blending for the antialiased shapes
            self.gl.enable(glow::BLEND);
            self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);

            self.gl.use_program(Some(self.program));
            if let Some(loc) = self.u_viewport {
                self.gl.uniform_2_f32(Some(&loc), viewport_px[0], viewport_px[1]);
            }
        }
        self.set_effect_mode(EFFECT_NONE);
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.vertices.extend_from_slice(&rect_vertices(x, y, w, h));
        self.set_color(color);
        self.flush_batch();
    }

    pub fn round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Color) {
        let radius = radius.min(w / 2.0).min(h / 2.0).max(0.0);
        self.set_effect_mode(EFFECT_ROUNDED);
        self.set_shape(w, h, radius);
        self.rect(x, y, w, h, color);
        self.set_effect_mode(EFFECT_NONE);
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let d = radius * 2.0;
        self.set_effect_mode(EFFECT_DISC);
        self.set_shape(d, d, radius);
        self.rect(center.x - radius, center.y - radius, d, d, color);
        self.set_effect_mode(EFFECT_NONE);
    }

    pub fn line(&mut self, a: Vec2, b: Vec2, width: f32, color: Color) {
        if let Some(quad) = line_vertices(a, b, width) {
            self.vertices.extend_from_slice(&quad);
            self.set_color(color);
            self.flush_batch();
        }
    }

    /// Closed outline through `points`, with filled joints.
    pub fn polygon_outline(&mut self, points: &[Vec2], width: f32, color: Color) {
        for (i, &a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            self.line(a, b, width, color);
            self.circle(a, width / 2.0, color);
        }
    }

    fn set_color(&mut self, color: Color) {
        unsafe {
            if let Some(loc) = self.u_color {
                self.gl.uniform_4_f32(Some(&loc), color.r, color.g, color.b, color.a);
            }
        }
    }

    fn set_effect_mode(&mut self, mode: i32) {
        unsafe {
            if let Some(loc) = self.u_effect_mode {
                self.gl.uniform_1_i32(Some(&loc), mode);
            }
        }
    }

    fn set_shape(&mut self, w: f32, h: f32, radius: f32) {
        unsafe {
            if let Some(loc) = self.u_shape_size {
                self.gl.uniform_2_f32(Some(&loc), w, h);
            }
            if let Some(loc) = self.u_radius {
                self.gl.uniform_1_f32(Some(&loc), radius);
            }
        }
    }

    fn flush_batch(&mut self) {
        if self.vertices.is_empty() {
            return;
        }

        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));

            let data = bytemuck::cast_slice(&self.vertices);
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                data,
                glow::DYNAMIC_DRAW,
            );

            let a_pos = self.gl.get_attrib_location(self.program, "aPos");
            let a_uv = self.gl.get_attrib_location(self.program, "aUV");

            if let Some(a_pos) = a_pos {
                self.gl.enable_vertex_attrib_array(a_pos);
                self.gl.vertex_attrib_pointer_f32(
                    a_pos,
                    2,
                    glow::FLOAT,
                    false,
                    std::mem::size_of::<Vertex>() as i32,
                    0,
                );
            }

            if let Some(a_uv) = a_uv {
                self.gl.enable_vertex_attrib_array(a_uv);
                self.gl.vertex_attrib_pointer_f32(
                    a_uv,
                    2,
                    glow::FLOAT,
                    false,
                    std::mem::size_of::<Vertex>() as i32,
                    8,
                );
            }

            self.gl.draw_arrays(glow::TRIANGLES, 0, self.vertices.len() as i32);
        }

        self.vertices.clear();
    }

    pub fn flush(&mut self) {
        self.flush_batch();
    }
}

impl Drop for DrawContext {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_program(self.program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_is_a_centred_quad() {
        let quad = line_vertices(Vec2::new(0.0, 10.0), Vec2::new(20.0, 10.0), 4.0).unwrap();
        let ys: Vec<f32> = quad.iter().map(|v| v.pos[1]).collect();
        assert!(ys.iter().all(|&y| (y - 8.0).abs() < 1e-5 || (y - 12.0).abs() < 1e-5));
        let xs: Vec<f32> = quad.iter().map(|v| v.pos[0]).collect();
        assert!(xs.iter().all(|&x| x.abs() < 1e-5 || (x - 20.0).abs() < 1e-5));
    }

    #[test]
    fn zero_length_line_is_skipped() {
        let p = Vec2::new(3.0, 3.0);
        assert!(line_vertices(p, p, 2.0).is_none());
    }

    #[test]
    fn rect_uvs_span_unit_square() {
        let quad = rect_vertices(5.0, 5.0, 10.0, 2.0);
        assert_eq!(quad[2], Vertex { pos: [15.0, 7.0], uv: [1.0, 1.0] });
        assert_eq!(quad[5], Vertex { pos: [5.0, 7.0], uv: [0.0, 1.0] });
    }
}
