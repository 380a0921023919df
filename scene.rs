//! Scene state and the single-character command table that mutates it.

use glam::{Mat4, Vec3};
use rand::Rng;
use tracing::{debug, info};

use crate::color::{Channel, Color};
use crate::lighting::{shade_grid, PointLight};
use crate::terrain::{Bounds, Grid, GRID_SIZE};

pub const ROTATION_STEP_DEGREES: i32 = 5;
pub const LIGHT_STEP: f32 = 0.1;

const STARTUP_COLOR_RANGE: (f32, f32) = (0.2, 1.0);
const REGENERATE_COLOR_RANGE: (f32, f32) = (0.5, 1.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMode {
    Light1,
    Light2,
    Rotate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Decoded keyboard command. Whether it applies depends on the current mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SelectMode(EditMode),
    Regenerate,
    Nudge { axis: Axis, positive: bool },
    Tint { channel: Channel, positive: bool },
}

impl Command {
    pub fn from_char(key: char) -> Option<Self> {
        let positive = key.is_ascii_uppercase();
        let command = match key {
            '1' => Command::SelectMode(EditMode::Light1),
            '2' => Command::SelectMode(EditMode::Light2),
            '3' => Command::SelectMode(EditMode::Rotate),
            'i' => Command::Regenerate,
            'x' | 'X' => Command::Nudge { axis: Axis::X, positive },
            'y' | 'Y' => Command::Nudge { axis: Axis::Y, positive },
            'z' | 'Z' => Command::Nudge { axis: Axis::Z, positive },
            'r' | 'R' => Command::Tint { channel: Channel::Red, positive },
            'g' | 'G' => Command::Tint { channel: Channel::Green, positive },
            'b' | 'B' => Command::Tint { channel: Channel::Blue, positive },
            _ => return None,
        };
        Some(command)
    }
}

/// Object rotation in whole degrees, each axis kept in `[0, 360)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Rotation {
    fn step(&mut self, axis: Axis, delta: i32) {
        let angle = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        };
        *angle = (*angle + delta).rem_euclid(360);
    }

    /// Model matrix applying X, then Y, then Z rotations in that nesting order.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_x((self.x as f32).to_radians())
            * Mat4::from_rotation_y((self.y as f32).to_radians())
            * Mat4::from_rotation_z((self.z as f32).to_radians())
    }
}

pub struct SceneState {
    pub grid: Grid,
    pub lights: [PointLight; 2],
    pub mode: EditMode,
    pub rotation: Rotation,
    bounds: Bounds,
}

impl SceneState {
    /// Builds the startup scene: random light colors first, then the terrain,
    /// both drawn from the same stream.
    pub fn new<R: Rng>(bounds: Bounds, light_positions: [Vec3; 2], rng: &mut R) -> Self {
        let mut lights = light_positions.map(|position| PointLight::new(position, Color::BLACK));
        let (min, max) = STARTUP_COLOR_RANGE;
        for light in &mut lights {
            light.randomize_color(rng, min, max);
        }

        let mut grid = Grid::new(GRID_SIZE);
        grid.regenerate_terrain(bounds, rng);

        Self {
            grid,
            lights,
            mode: EditMode::Rotate,
            rotation: Rotation::default(),
            bounds,
        }
    }

    /// Picks new light colors and a new surface.
    pub fn regenerate<R: Rng>(&mut self, rng: &mut R) {
        let (min, max) = REGENERATE_COLOR_RANGE;
        for light in &mut self.lights {
            light.randomize_color(rng, min, max);
        }
        self.grid.regenerate_terrain(self.bounds, rng);
        info!(
            light1 = ?self.lights[0].color,
            light2 = ?self.lights[1].color,
            "regenerated terrain"
        );
    }

    /// Recomputes per-vertex colors from the current light set.
    pub fn shade(&mut self) {
        shade_grid(&mut self.grid, &self.lights);
    }

    /// Applies one typed character. Returns whether the scene changed.
    pub fn handle_key<R: Rng>(&mut self, key: char, rng: &mut R) -> bool {
        Command::from_char(key).is_some_and(|command| self.apply(command, rng))
    }

    /// Applies `command` in the current mode. Returns false when the command
    /// has no meaning in that mode.
    pub fn apply<R: Rng>(&mut self, command: Command, rng: &mut R) -> bool {
        match command {
            Command::SelectMode(mode) => {
                self.mode = mode;
                announce_mode(mode);
            }
            Command::Regenerate => self.regenerate(rng),
            Command::Nudge { axis, positive } => match self.selected_light() {
                Some(index) => {
                    let step = if positive { LIGHT_STEP } else { -LIGHT_STEP };
                    let light = &mut self.lights[index];
                    match axis {
                        Axis::X => light.position.x += step,
                        Axis::Y => light.position.y += step,
                        Axis::Z => light.position.z += step,
                    }
                    debug!(light = index + 1, position = ?light.position, "moved light");
                }
                None => {
                    let step = if positive {
                        ROTATION_STEP_DEGREES
                    } else {
                        -ROTATION_STEP_DEGREES
                    };
                    self.rotation.step(axis, step);
                    debug!(rotation = ?self.rotation, "rotated");
                }
            },
            Command::Tint { channel, positive } => {
                let Some(index) = self.selected_light() else {
                    return false;
                };
                let step = if positive { LIGHT_STEP } else { -LIGHT_STEP };
                let light = &mut self.lights[index];
                *light.color.channel_mut(channel) += step;
                debug!(light = index + 1, color = ?light.color, "tinted light");
            }
        }
        true
    }

    fn selected_light(&self) -> Option<usize> {
        match self.mode {
            EditMode::Light1 => Some(0),
            EditMode::Light2 => Some(1),
            EditMode::Rotate => None,
        }
    }
}

fn announce_mode(mode: EditMode) {
    match mode {
        EditMode::Rotate => {
            info!("Type x y z to decrease or X Y Z to increase ROTATION angles.");
        }
        EditMode::Light1 | EditMode::Light2 => {
            let number = if mode == EditMode::Light1 { 1 } else { 2 };
            info!("Light {number} controls.");
            info!("Type x, y, z to move the light down that axis, X, Y, Z to move it up.");
            info!("Type r, g, b to decrease red, green, or blue color value of the light.");
            info!("Type R, G, B to increase red, green, or blue color value of the light.");
        }
    }
}

pub fn print_startup_help() {
    info!("Type 1 to enter Light 1 control mode.");
    info!("Type 2 to enter Light 2 control mode.");
    info!("Type 3 to enter ROTATE mode.");
    info!("Type i to generate a new surface and light colors.");
}
