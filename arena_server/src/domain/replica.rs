// Client-side mirror of the pellet field, driven purely by replicated deltas.

use super::color::{Color, pellet_color};
use super::pellets::PelletDelta;
use glam::Vec3;

/// One drawable pellet: where it sits and how it is tinted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PelletInstance {
    pub position: Vec3,
    pub color: Color,
}

impl PelletInstance {
    fn at(position: Vec3) -> Self {
        Self {
            position,
            color: pellet_color(position),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PelletMirror {
    instances: Vec<PelletInstance>,
}

impl PelletMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[PelletInstance] {
        &self.instances
    }

    /// Replaces every instance from a full sync.
    pub fn apply_full(&mut self, positions: &[Vec3]) {
        self.instances = positions.iter().copied().map(PelletInstance::at).collect();
    }

    /// Updates only the slots named by the delta. Returns how many were touched.
    pub fn apply(&mut self, delta: &PelletDelta) -> usize {
        if self.instances.len() != delta.length {
            self.instances
                .resize(delta.length, PelletInstance::at(Vec3::ZERO));
        }

        let mut touched = 0;
        for (&index, &position) in delta.indices.iter().zip(&delta.positions) {
            // Deltas never name slots past their own length; skip rather than grow.
            if let Some(slot) = self.instances.get_mut(index as usize) {
                *slot = PelletInstance::at(position);
                touched += 1;
            }
        }
        touched
    }
}
