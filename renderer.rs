use glam::{Mat4, Vec3, Vec4};
use serde::Deserialize;

use crate::color::Color;
use crate::lighting::PointLight;
use crate::terrain::Grid;

/// Half-extent of the orthographic view volume on every axis.
pub const VIEW_RADIUS: f32 = 1.2;

/// How a grid cell is colored between its corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    /// Interpolate the four corner colors across the quad.
    #[default]
    Gouraud,
    /// Paint the whole quad with the color of its lowest-index corner.
    Flat,
}

#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    /// Pixel x, pixel y, NDC depth.
    screen: Vec3,
    color: Color,
}

pub struct Renderer {
    width: usize,
    height: usize,
    color: Vec<u32>,
    depth: Vec<f32>,
    projection: Mat4,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![0; width * height],
            depth: vec![f32::INFINITY; width * height],
            projection: Mat4::orthographic_rh_gl(
                -VIEW_RADIUS,
                VIEW_RADIUS,
                -VIEW_RADIUS,
                VIEW_RADIUS,
                -VIEW_RADIUS,
                VIEW_RADIUS,
            ),
        }
    }

    pub fn begin_frame(&mut self) {
        self.color.fill(Color::BLACK.to_u32());
        self.depth.fill(f32::INFINITY);
    }

    pub fn color_buffer(&self) -> &[u32] {
        &self.color
    }

    /// Draws one frame: a guide line per light, then the shaded surface.
    pub fn render(&mut self, grid: &Grid, lights: &[PointLight], model: Mat4, shading: ShadingMode) {
        self.begin_frame();
        let mvp = self.projection * model;
        for light in lights {
            let origin = self.project_point(Vec3::ZERO, &mvp, Color::WHITE);
            let tip = self.project_point(light.position, &mvp, Color::WHITE);
            if let (Some(origin), Some(tip)) = (origin, tip) {
                self.draw_line(&origin, &tip);
            }
        }
        self.draw_terrain(grid, &mvp, shading);
    }

    fn project_point(&self, position: Vec3, mvp: &Mat4, color: Color) -> Option<ScreenVertex> {
        let clip = *mvp * Vec4::new(position.x, position.y, position.z, 1.0);
        if clip.w.abs() < 0.001 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let screen_x = (ndc.x * 0.5 + 0.5) * (self.width as f32 - 1.0);
        let screen_y = (1.0 - (ndc.y * 0.5 + 0.5)) * (self.height as f32 - 1.0);
        Some(ScreenVertex {
            screen: Vec3::new(screen_x, screen_y, ndc.z),
            color,
        })
    }

    fn draw_terrain(&mut self, grid: &Grid, mvp: &Mat4, shading: ShadingMode) {
        let side = grid.size() + 1;
        let projected: Vec<Option<ScreenVertex>> = grid
            .vertices()
            .iter()
            .map(|vertex| self.project_point(vertex.position, mvp, vertex.color))
            .collect();

        for i in 0..grid.size() {
            for j in 0..grid.size() {
                let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)]
                    .map(|(ci, cj)| projected[ci * side + cj]);
                let [Some(a), Some(mut b), Some(mut c), Some(mut d)] = corners else {
                    continue;
                };
                if shading == ShadingMode::Flat {
                    b.color = a.color;
                    c.color = a.color;
                    d.color = a.color;
                }
                self.rasterize_triangle(&a, &b, &c);
                self.rasterize_triangle(&a, &c, &d);
            }
        }
    }

    fn draw_line(&mut self, start: &ScreenVertex, end: &ScreenVertex) {
        let mut x0 = start.screen.x as i32;
        let mut y0 = start.screen.y as i32;
        let x1 = end.screen.x as i32;
        let y1 = end.screen.y as i32;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let total = dx.max(-dy).max(1) as f32;
        let mut err = dx + dy;
        let mut travelled = 0;
        loop {
            if x0 >= 0 && x0 < self.width as i32 && y0 >= 0 && y0 < self.height as i32 {
                let t = (travelled as f32 / total).min(1.0);
                let ndc_depth = start.screen.z + (end.screen.z - start.screen.z) * t;
                self.write_fragment(x0 as usize, y0 as usize, ndc_depth, start.color);
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
            travelled += 1;
        }
    }

    fn rasterize_triangle(&mut self, v0: &ScreenVertex, v1: &ScreenVertex, v2: &ScreenVertex) {
        let min_x = v0.screen.x.min(v1.screen.x).min(v2.screen.x).floor().max(0.0) as i32;
        let max_x = v0.screen.x.max(v1.screen.x).max(v2.screen.x).ceil().min(self.width as f32 - 1.0) as i32;
        let min_y = v0.screen.y.min(v1.screen.y).min(v2.screen.y).floor().max(0.0) as i32;
        let max_y = v0.screen.y.max(v1.screen.y).max(v2.screen.y).ceil().min(self.height as f32 - 1.0) as i32;
        if min_x > max_x || min_y > max_y {
            return;
        }
        let area = edge(v0.screen, v1.screen, v2.screen);
        if area.abs() < 1e-6 {
            return;
        }
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let w0 = edge(v1.screen, v2.screen, p);
                let w1 = edge(v2.screen, v0.screen, p);
                let w2 = edge(v0.screen, v1.screen, p);
                let inside = (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0)
                    || (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0);
                if !inside {
                    continue;
                }
                let (w0, w1, w2) = (w0 / area, w1 / area, w2 / area);
                let ndc_depth = v0.screen.z * w0 + v1.screen.z * w1 + v2.screen.z * w2;
                let color = Color::lerp3(v0.color, v1.color, v2.color, w0, w1, w2);
                self.write_fragment(x as usize, y as usize, ndc_depth, color);
            }
        }
    }

    /// Depth-tested write; nearer fragments have smaller depth. Fragments
    /// outside the near/far slab are clipped here, per pixel.
    fn write_fragment(&mut self, x: usize, y: usize, ndc_depth: f32, color: Color) {
        if !(-1.0..=1.0).contains(&ndc_depth) {
            return;
        }
        let depth = ndc_depth * 0.5 + 0.5;
        let idx = y * self.width + x;
        if depth >= self.depth[idx] {
            return;
        }
        self.depth[idx] = depth;
        self.color[idx] = color.to_u32();
    }
}

fn edge(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::shade_grid;
    use crate::terrain::{Bounds, GRID_SIZE};

    const SIDE: usize = 96;

    fn lit_flat_grid(lights: &[PointLight]) -> Grid {
        let mut grid = Grid::new(GRID_SIZE);
        grid.rebuild_from_waves(Bounds::default(), &[]);
        shade_grid(&mut grid, lights);
        grid
    }

    #[test]
    fn lit_surface_covers_center_and_leaves_corners_black() {
        let lights = [PointLight::new(Vec3::new(0.0, 0.0, 1.0), Color::WHITE)];
        let grid = lit_flat_grid(&lights);
        for shading in [ShadingMode::Gouraud, ShadingMode::Flat] {
            let mut renderer = Renderer::new(SIDE, SIDE);
            renderer.render(&grid, &lights, Mat4::IDENTITY, shading);
            let buffer = renderer.color_buffer();
            assert_ne!(buffer[(SIDE / 2) * SIDE + SIDE / 2], 0, "{shading:?}");
            assert_eq!(buffer[0], 0);
            assert_eq!(buffer[SIDE * SIDE - 1], 0);
        }
    }

    #[test]
    fn flat_shading_uses_the_first_corner_color() {
        let mut grid = Grid::new(1);
        grid.rebuild_from_waves(Bounds::default(), &[]);
        grid.vertex_mut(0, 0).color = Color::new(1.0, 0.0, 0.0);
        grid.vertex_mut(1, 0).color = Color::new(0.0, 1.0, 0.0);
        grid.vertex_mut(1, 1).color = Color::new(0.0, 0.0, 1.0);
        grid.vertex_mut(0, 1).color = Color::new(0.0, 1.0, 0.0);

        let mut renderer = Renderer::new(SIDE, SIDE);
        renderer.render(&grid, &[], Mat4::IDENTITY, ShadingMode::Flat);
        let center = renderer.color_buffer()[(SIDE / 2) * SIDE + SIDE / 2];
        assert_eq!(center, 0x00FF_0000);

        renderer.render(&grid, &[], Mat4::IDENTITY, ShadingMode::Gouraud);
        let center = renderer.color_buffer()[(SIDE / 2) * SIDE + SIDE / 2];
        assert_ne!(center, 0x00FF_0000);
        assert_ne!(center, 0);
    }

    #[test]
    fn nearer_surface_wins_the_depth_test() {
        let mut renderer = Renderer::new(SIDE, SIDE);
        let near_color = Color::new(0.0, 0.0, 1.0);
        let far_color = Color::new(1.0, 0.0, 0.0);
        let corners = [
            Vec3::new(10.0, 10.0, 0.0),
            Vec3::new(80.0, 10.0, 0.0),
            Vec3::new(10.0, 80.0, 0.0),
        ];
        let triangle = |z: f32, color: Color| {
            corners.map(|corner| ScreenVertex {
                screen: corner + Vec3::Z * z,
                color,
            })
        };

        let [a, b, c] = triangle(-0.5, near_color);
        renderer.rasterize_triangle(&a, &b, &c);
        let [a, b, c] = triangle(0.5, far_color);
        renderer.rasterize_triangle(&a, &b, &c);

        assert_eq!(renderer.color_buffer()[20 * SIDE + 20], near_color.to_u32());
    }

    fn lit_pixels(renderer: &Renderer) -> usize {
        renderer.color_buffer().iter().filter(|&&px| px != 0).count()
    }

    #[test]
    fn light_line_beyond_near_plane_is_clipped() {
        let grid = Grid::new(0);
        let light = PointLight::new(Vec3::new(0.8, 1.0, 1.3), Color::WHITE);
        let mut renderer = Renderer::new(SIDE, SIDE);
        renderer.render(&grid, &[light], Mat4::IDENTITY, ShadingMode::Gouraud);

        assert!(lit_pixels(&renderer) > 0);
        assert_eq!(renderer.color_buffer()[47 * SIDE + 47], 0x00FF_FFFF);
        // The tip sits past the slab and is cut off.
        assert_eq!(renderer.color_buffer()[7 * SIDE + 79], 0);
    }

    #[test]
    fn rotated_light_line_stays_visible() {
        let grid = Grid::new(0);
        let light = PointLight::new(Vec3::new(0.8, 1.0, 1.0), Color::WHITE);
        let model = Mat4::from_rotation_x(45f32.to_radians());
        let mut renderer = Renderer::new(SIDE, SIDE);
        renderer.render(&grid, &[light], model, ShadingMode::Gouraud);
        assert!(lit_pixels(&renderer) > 0);
    }

    #[test]
    fn cells_crossing_depth_plane_keep_near_half() {
        let mut grid = Grid::new(1);
        grid.rebuild_from_waves(Bounds::default(), &[]);
        grid.vertex_mut(1, 1).position.z = 2.0;
        for vertex in grid.vertices_mut() {
            vertex.color = Color::WHITE;
        }

        let mut renderer = Renderer::new(SIDE, SIDE);
        renderer.render(&grid, &[], Mat4::IDENTITY, ShadingMode::Gouraud);
        assert_eq!(renderer.color_buffer()[82 * SIDE + 14], 0x00FF_FFFF);
        assert_eq!(renderer.color_buffer()[10 * SIDE + 84], 0);
    }
}
