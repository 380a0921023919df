use std::ops::{AddAssign, Mul};

/// Linear RGB triple. Channels are not clamped; lighting sums may leave [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut f32 {
        match channel {
            Channel::Red => &mut self.r,
            Channel::Green => &mut self.g,
            Channel::Blue => &mut self.b,
        }
    }

    /// Packs into minifb's `0RGB` pixel. Saturates each channel the way a
    /// fixed-point color buffer does; the source color is left untouched.
    pub fn to_u32(self) -> u32 {
        let r = (self.r.clamp(0.0, 1.0) * 255.0) as u32;
        let g = (self.g.clamp(0.0, 1.0) * 255.0) as u32;
        let b = (self.b.clamp(0.0, 1.0) * 255.0) as u32;
        (r << 16) | (g << 8) | b
    }

    pub fn lerp3(a: Color, b: Color, c: Color, wa: f32, wb: f32, wc: f32) -> Color {
        Color::new(
            a.r * wa + b.r * wb + c.r * wc,
            a.g * wa + b.g * wb + c.g * wc,
            a.b * wa + b.b * wb + c.b * wc,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, rhs: f32) -> Color {
        Color::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}
impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_saturates_out_of_range_channels() {
        assert_eq!(Color::new(1.7, -0.3, 1.0).to_u32(), 0x00FF_00FF);
        assert_eq!(Color::BLACK.to_u32(), 0);
    }

    #[test]
    fn channel_mut_addresses_the_named_channel() {
        let mut color = Color::new(0.25, 0.5, 0.75);
        *color.channel_mut(Channel::Green) += 1.0;
        assert_eq!(color, Color::new(0.25, 1.5, 0.75));
    }
}
