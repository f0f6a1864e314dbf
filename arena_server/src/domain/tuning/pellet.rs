// Pellet field tuning (not runtime config).

/// Gameplay tuning for the pellet field.
#[derive(Debug, Clone, Copy)]
pub struct PelletTuning {
    /// Number of pellet slots in the field.
    pub count: usize,

    /// Distance kept between a spawned pellet and the arena wall.
    pub spawn_inset: f32,

    /// Height pellets float above the ground plane.
    pub height: f32,
}

impl Default for PelletTuning {
    fn default() -> Self {
        Self {
            count: 2000,
            spawn_inset: 0.5,
            height: 0.1,
        }
    }
}
