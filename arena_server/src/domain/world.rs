// Arena bounds and spawn sampling. The arena is a square on the XZ plane.

use glam::Vec3;
use rand::Rng;

/// Half-width of the square arena.
pub const EXTENT: f32 = 50.0;

// Insets larger than the arena collapse the range to the centre line.
fn clamp_inset(inset: f32) -> f32 {
    inset.clamp(0.0, EXTENT)
}

/// Lowest reachable corner for a body that keeps `inset` from the walls.
pub fn min(inset: f32) -> Vec3 {
    let inset = clamp_inset(inset);
    Vec3::new(-EXTENT + inset, 0.0, -EXTENT + inset)
}

/// Highest reachable corner for a body that keeps `inset` from the walls.
pub fn max(inset: f32) -> Vec3 {
    let inset = clamp_inset(inset);
    Vec3::new(EXTENT - inset, 0.0, EXTENT - inset)
}

pub fn rand_coord<R: Rng + ?Sized>(rng: &mut R, inset: f32) -> f32 {
    let inset = clamp_inset(inset);
    rng.random_range(-EXTENT + inset..=EXTENT - inset)
}

/// Uniform point inside the bounds at height `y`.
pub fn rand_pos<R: Rng + ?Sized>(rng: &mut R, inset: f32, y: f32) -> Vec3 {
    let x = rand_coord(rng, inset);
    let z = rand_coord(rng, inset);
    Vec3::new(x, y, z)
}

/// True when `pos` lies inside the bounds shrunk by `inset` (height ignored).
pub fn contains(pos: Vec3, inset: f32) -> bool {
    let lo = min(inset);
    let hi = max(inset);
    (lo.x..=hi.x).contains(&pos.x) && (lo.z..=hi.z).contains(&pos.z)
}
