// Deterministic colors derived from replicated state.

use glam::Vec3;

const PELLET_COLOR_PERIOD: f32 = 20.0;
const PELLET_COLOR_GREEN: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Fractional part that stays in `[0, 1)` for negative inputs.
pub fn frac(v: f32) -> f32 {
    v - v.floor()
}

/// Pellet color as a pure function of its position, so every client agrees.
pub fn pellet_color(pos: Vec3) -> Color {
    Color::new(
        frac(pos.x / PELLET_COLOR_PERIOD),
        PELLET_COLOR_GREEN,
        frac(pos.z / PELLET_COLOR_PERIOD),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_value_is_negative_then_frac_wraps_upward() {
        assert_eq!(frac(-0.25), 0.75);
        assert_eq!(frac(1.5), 0.5);
        assert_eq!(frac(-2.0), 0.0);
    }

    #[test]
    fn when_pellet_sits_at_known_point_then_color_matches_formula() {
        let color = pellet_color(Vec3::new(10.0, 0.1, -5.0));
        assert_eq!(color, Color::new(0.5, 0.35, 0.75));
    }

    #[test]
    fn when_two_pellets_share_a_position_then_colors_are_identical() {
        let pos = Vec3::new(-33.3, 0.1, 47.25);
        assert_eq!(pellet_color(pos), pellet_color(pos));
    }
}
