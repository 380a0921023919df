//! Height-field synthesis and normal estimation for the wavy surface.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::color::Color;

/// Cells per grid side. The grid holds `GRID_SIZE + 1` vertices per side.
pub const GRID_SIZE: usize = 128;

const WAVE_COUNT: u32 = 10;
const WAVE_AMPLITUDE: f32 = 0.01;
/// Waves whose direction vector is shorter than this are dropped.
const MIN_WAVE_LENGTH: f32 = 40.0;

/// Rectangle the surface is laid out over, in model units.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Bounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x_min: -1.0,
            x_max: 1.0,
            y_min: -1.0,
            y_max: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Color,
}

/// One plane wave of the height field, expressed in grid-index space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wave {
    pub rand_i: u32,
    pub rand_j: u32,
}

impl Wave {
    pub fn length(&self) -> f32 {
        ((self.rand_i * self.rand_i + self.rand_j * self.rand_j) as f32).sqrt()
    }

    pub fn is_sharp_enough(&self) -> bool {
        self.length() >= MIN_WAVE_LENGTH
    }

    fn height_at(&self, i: usize, j: usize, length_sq: f32) -> f32 {
        let phase = (self.rand_i as usize * i + self.rand_j as usize * j) as f32 / length_sq;
        WAVE_AMPLITUDE * (phase * TAU).sin()
    }
}

/// Draws the ten candidate waves for a grid of `size` cells. Both draws of a
/// wave are consumed from `rng` even when the wave ends up filtered out.
pub fn sample_waves<R: Rng>(rng: &mut R, size: usize) -> Vec<Wave> {
    let size = size as u32;
    (1..=WAVE_COUNT)
        .map(|wave| {
            let rand_i = rng.gen_range(0..size) / wave;
            let rand_j = rng.gen_range(0..size) / wave;
            Wave { rand_i, rand_j }
        })
        .collect()
}

/// Square vertex grid, row-major in `i` (x direction) then `j` (y direction).
#[derive(Clone, Debug)]
pub struct Grid {
    size: usize,
    vertices: Vec<Vertex>,
}

impl Grid {
    /// Creates a grid of `size` cells per side with every attribute zeroed.
    pub fn new(size: usize) -> Self {
        let side = size + 1;
        Self {
            size,
            vertices: vec![Vertex::default(); side * side],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, i: usize, j: usize) -> usize {
        i * (self.size + 1) + j
    }

    pub fn vertex(&self, i: usize, j: usize) -> &Vertex {
        &self.vertices[self.index(i, j)]
    }

    pub fn vertex_mut(&mut self, i: usize, j: usize) -> &mut Vertex {
        let idx = self.index(i, j);
        &mut self.vertices[idx]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Rebuilds the surface from fresh random waves and re-estimates normals.
    pub fn regenerate_terrain<R: Rng>(&mut self, bounds: Bounds, rng: &mut R) {
        let waves = sample_waves(rng, self.size);
        self.rebuild_from_waves(bounds, &waves);
    }

    /// Same as [`Grid::regenerate_terrain`] with an explicit wave list.
    pub fn rebuild_from_waves(&mut self, bounds: Bounds, waves: &[Wave]) {
        self.synthesize_heights(bounds, waves);
        self.estimate_normals();
    }

    fn synthesize_heights(&mut self, bounds: Bounds, waves: &[Wave]) {
        let n = self.size as f32;
        let side = self.size + 1;
        for i in 0..side {
            for j in 0..side {
                let vertex = self.vertex_mut(i, j);
                vertex.position = Vec3::new(
                    bounds.x_min + i as f32 * (bounds.x_max - bounds.x_min) / n,
                    bounds.y_min + j as f32 * (bounds.y_max - bounds.y_min) / n,
                    0.0,
                );
            }
        }

        for (index, wave) in waves.iter().enumerate() {
            if !wave.is_sharp_enough() {
                debug!(index = index + 1, ?wave, "skipping shallow wave");
                continue;
            }
            let length = wave.length();
            debug!(index = index + 1, ?wave, length, "adding wave");
            let length_sq = length * length;
            for i in 0..side {
                for j in 0..side {
                    let dz = wave.height_at(i, j, length_sq);
                    self.vertex_mut(i, j).position.z += dz;
                }
            }
        }
    }

    fn estimate_normals(&mut self) {
        let n = self.size;
        for i in 0..=n {
            for j in 0..=n {
                let p = self.vertex(i, j).position;
                let s = if i < n {
                    self.vertex(i + 1, j).position - p
                } else {
                    p - self.vertex(i - 1, j).position
                };
                let t = if j < n {
                    self.vertex(i, j + 1).position - p
                } else {
                    p - self.vertex(i, j - 1).position
                };

                // Degenerate tangents keep whatever normal was there before.
                if s.length() * t.length() > 0.0 {
                    if let Some(normal) = s.cross(t).try_normalize() {
                        self.vertex_mut(i, j).normal = normal;
                    }
                }
            }
        }
    }
}
