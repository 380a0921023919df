//! Distance-attenuated diffuse reflection from point lights.
//!
//! Results are left unclamped: a light behind the surface yields a negative
//! reach and subtracts from the vertex color.

use glam::Vec3;
use rand::Rng;

use crate::color::{Channel, Color};
use crate::terrain::{Grid, Vertex};

const ATTENUATION_CONSTANT: f32 = 0.25;
const ATTENUATION_LINEAR: f32 = 0.25;
const ATTENUATION_QUADRATIC: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color) -> Self {
        Self { position, color }
    }

    /// Draws each color channel uniformly from `[min, max]`.
    pub fn randomize_color<R: Rng>(&mut self, rng: &mut R, min: f32, max: f32) {
        for channel in [Channel::Red, Channel::Green, Channel::Blue] {
            *self.color.channel_mut(channel) = rng.gen_range(min..=max);
        }
    }

    /// Signed, attenuated diffuse factor this light contributes at `vertex`.
    pub fn reach(&self, vertex: &Vertex) -> f32 {
        let to_light = self.position - vertex.position;
        attenuation(to_light.length()) * to_light.dot(vertex.normal)
    }
}

/// `1 / (a + b d + c d^2)`; strictly positive and decreasing for `d >= 0`.
pub fn attenuation(distance: f32) -> f32 {
    1.0 / (ATTENUATION_CONSTANT
        + ATTENUATION_LINEAR * distance
        + ATTENUATION_QUADRATIC * distance * distance)
}

pub fn shade_vertex(vertex: &Vertex, lights: &[PointLight]) -> Color {
    let mut color = Color::BLACK;
    for light in lights {
        color += light.color * light.reach(vertex);
    }
    color
}

/// Recomputes every vertex color in `grid` from the current lights.
pub fn shade_grid(grid: &mut Grid, lights: &[PointLight]) {
    for vertex in grid.vertices_mut() {
        vertex.color = shade_vertex(vertex, lights);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Bounds, GRID_SIZE};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rolling_grid() -> Grid {
        let mut grid = Grid::new(GRID_SIZE);
        grid.regenerate_terrain(Bounds::default(), &mut StdRng::seed_from_u64(42));
        grid
    }

    #[test]
    fn attenuation_at_zero_distance_is_four() {
        assert_eq!(attenuation(0.0), 4.0);
    }

    #[test]
    fn attenuation_is_positive_and_decreasing() {
        let mut previous = attenuation(0.0);
        for step in 1..=2000 {
            let current = attenuation(step as f32 * 0.05);
            assert!(current > 0.0);
            assert!(current < previous, "not decreasing at step {step}");
            previous = current;
        }
    }

    #[test]
    fn light_at_vertex_contributes_nothing() {
        let vertex = Vertex {
            position: Vec3::new(0.2, -0.4, 0.01),
            normal: Vec3::Z,
            color: Color::BLACK,
        };
        let light = PointLight::new(vertex.position, Color::WHITE);
        assert_eq!(light.reach(&vertex), 0.0);
    }

    #[test]
    fn overhead_light_matches_closed_form() {
        let vertex = Vertex {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            color: Color::BLACK,
        };
        let light = PointLight::new(Vec3::new(0.0, 0.0, 2.0), Color::new(1.0, 0.5, 0.0));
        // d = 2: 1 / (0.25 + 0.5 + 1.0) * 2
        let expected = 2.0 / 1.75;
        let color = shade_vertex(&vertex, &[light]);
        assert!((color.r - expected).abs() < 1e-6);
        assert!((color.g - expected * 0.5).abs() < 1e-6);
        assert_eq!(color.b, 0.0);
    }

    #[test]
    fn light_behind_surface_goes_negative() {
        let vertex = Vertex {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            color: Color::BLACK,
        };
        let light = PointLight::new(Vec3::new(0.0, 0.0, -1.0), Color::WHITE);
        let color = shade_vertex(&vertex, &[light]);
        assert!(color.r < 0.0 && color.g < 0.0 && color.b < 0.0);
    }

    #[test]
    fn bright_close_light_exceeds_one() {
        let vertex = Vertex {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            color: Color::BLACK,
        };
        let light = PointLight::new(Vec3::new(0.0, 0.0, 0.5), Color::WHITE);
        assert!(shade_vertex(&vertex, &[light, light]).r > 1.0);
    }

    #[test]
    fn coincident_lights_double_the_color() {
        let light = PointLight::new(Vec3::new(0.8, 1.0, 1.0), Color::new(0.3, 0.7, 0.9));
        let mut single = rolling_grid();
        let mut double = single.clone();
        shade_grid(&mut single, &[light]);
        shade_grid(&mut double, &[light, light]);

        for (one, two) in single.vertices().iter().zip(double.vertices()) {
            assert_eq!(two.color.r, 2.0 * one.color.r);
            assert_eq!(two.color.g, 2.0 * one.color.g);
            assert_eq!(two.color.b, 2.0 * one.color.b);
        }
    }

    #[test]
    fn randomized_colors_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut light = PointLight::new(Vec3::ZERO, Color::BLACK);
        for _ in 0..100 {
            light.randomize_color(&mut rng, 0.5, 1.0);
            for value in [light.color.r, light.color.g, light.color.b] {
                assert!((0.5..=1.0).contains(&value));
            }
        }
    }
}
