// Fixed-capacity pellet field with change tracking for replication.

use super::role::Role;
use super::tuning::pellet::PelletTuning;
use super::world;
use glam::Vec3;
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PelletError {
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for PelletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PelletError::IndexOutOfRange { index, len } => {
                write!(f, "pellet index {index} out of range for field of {len}")
            }
        }
    }
}

impl std::error::Error for PelletError {}

/// Changed slots since the last drain: parallel index/value lists plus the field length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PelletDelta {
    pub length: usize,
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
}

impl PelletDelta {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PelletField {
    tuning: PelletTuning,
    positions: Vec<Vec3>,
    // Indices in first-change order; `dirty` dedupes them.
    changed: Vec<usize>,
    dirty: Vec<bool>,
}

impl PelletField {
    /// Creates an empty field; slots are allocated at world-ready.
    pub fn new(tuning: PelletTuning) -> Self {
        Self {
            tuning,
            positions: Vec::new(),
            changed: Vec::new(),
            dirty: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.tuning.count
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<Vec3> {
        self.positions.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.iter().copied()
    }

    /// Full copy of every position, used for a client's first sync.
    pub fn snapshot(&self) -> Vec<Vec3> {
        self.positions.clone()
    }

    /// The authoritative side fills every slot once; clients stay empty until synced.
    pub fn on_world_ready<R: Rng + ?Sized>(&mut self, role: Role, rng: &mut R) {
        if !role.is_server() {
            return;
        }

        let count = self.tuning.count;
        self.positions = vec![Vec3::ZERO; count];
        self.dirty = vec![false; count];
        self.changed.clear();
        for index in 0..count {
            self.place(index, rng);
        }
    }

    /// Moves one pellet to a fresh random spot.
    pub fn respawn<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rng: &mut R,
    ) -> Result<Vec3, PelletError> {
        if index >= self.positions.len() {
            return Err(PelletError::IndexOutOfRange {
                index,
                len: self.positions.len(),
            });
        }
        Ok(self.place(index, rng))
    }

    fn place<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Vec3 {
        let pos = world::rand_pos(rng, self.tuning.spawn_inset, self.tuning.height);
        self.positions[index] = pos;
        if !self.dirty[index] {
            self.dirty[index] = true;
            self.changed.push(index);
        }
        pos
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Drains the change set into a delta carrying only the touched slots.
    pub fn take_changes(&mut self) -> PelletDelta {
        let mut delta = PelletDelta {
            length: self.positions.len(),
            indices: Vec::with_capacity(self.changed.len()),
            positions: Vec::with_capacity(self.changed.len()),
        };
        for index in self.changed.drain(..) {
            self.dirty[index] = false;
            delta.indices.push(index as u32);
            delta.positions.push(self.positions[index]);
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ready_field(count: usize, seed: u64) -> (PelletField, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut field = PelletField::new(PelletTuning {
            count,
            ..PelletTuning::default()
        });
        field.on_world_ready(Role::Server, &mut rng);
        (field, rng)
    }

    #[test]
    fn when_server_is_ready_then_every_slot_is_filled_in_bounds() {
        let (field, _) = ready_field(2000, 3);
        assert_eq!(field.len(), 2000);
        for pos in field.iter() {
            assert!(world::contains(pos, 0.5));
            assert_eq!(pos.y, 0.1);
        }
    }

    #[test]
    fn when_client_is_ready_then_field_stays_empty() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut field = PelletField::new(PelletTuning::default());
        field.on_world_ready(Role::Client, &mut rng);
        assert!(field.is_empty());
        assert!(!field.has_changes());
        assert_eq!(field.capacity(), 2000);
    }

    #[test]
    fn when_field_is_filled_then_first_delta_covers_every_slot() {
        let (mut field, _) = ready_field(64, 5);
        let delta = field.take_changes();
        assert_eq!(delta.length, 64);
        assert_eq!(delta.indices, (0..64).collect::<Vec<u32>>());
        assert_eq!(delta.positions, field.snapshot());
        assert!(field.take_changes().is_empty());
    }

    #[test]
    fn when_slot_respawns_twice_then_delta_lists_it_once_with_latest_value() {
        let (mut field, mut rng) = ready_field(16, 9);
        field.take_changes();

        let first = field.respawn(4, &mut rng).expect("index in range");
        let second = field.respawn(4, &mut rng).expect("index in range");
        field.respawn(2, &mut rng).expect("index in range");
        assert_ne!(first, second);

        let delta = field.take_changes();
        assert_eq!(delta.indices, vec![4, 2]);
        assert_eq!(delta.positions[0], second);
        assert_eq!(delta.length, 16);
    }

    #[test]
    fn when_index_is_out_of_range_then_respawn_is_a_no_op() {
        let (mut field, mut rng) = ready_field(8, 1);
        field.take_changes();
        let before = field.snapshot();

        let result = field.respawn(8, &mut rng);

        assert_eq!(result, Err(PelletError::IndexOutOfRange { index: 8, len: 8 }));
        assert_eq!(field.snapshot(), before);
        assert!(!field.has_changes());
    }

    proptest! {
        #[test]
        fn respawn_stays_in_bounds(seed in any::<u64>(), index in 0usize..32) {
            let (mut field, mut rng) = ready_field(32, seed);
            let a = field.respawn(index, &mut rng).unwrap();
            let b = field.respawn(index, &mut rng).unwrap();
            for pos in [a, b] {
                prop_assert!((-49.5..=49.5).contains(&pos.x));
                prop_assert!((-49.5..=49.5).contains(&pos.z));
                prop_assert_eq!(pos.y, 0.1);
            }
        }
    }
}
