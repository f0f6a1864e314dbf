// Server-only scoring: pellet consumption, actor-vs-actor merges and despawn.
//
// Naive O(actors * pellets + actors^2) scans; the field and player counts are small.

use crate::domain::actor::Actor;
use crate::domain::pellets::PelletField;
use rand::Rng;
use std::str::FromStr;
use tracing::debug;

/// How a squared distance is compared against a reach (radius or radius sum).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionMetric {
    /// Squared distance against the linear reach. Shrinks effective range as
    /// bodies grow; kept as the default for behavioral parity.
    #[default]
    Legacy,
    /// Squared distance against the squared reach: true circle overlap.
    Euclidean,
}

impl CollisionMetric {
    pub fn overlaps(self, dist_sq: f32, reach: f32) -> bool {
        match self {
            CollisionMetric::Legacy => dist_sq < reach,
            CollisionMetric::Euclidean => dist_sq < reach * reach,
        }
    }
}

impl FromStr for CollisionMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(CollisionMetric::Legacy),
            "euclidean" => Ok(CollisionMetric::Euclidean),
            other => Err(format!("unknown collision metric: {other}")),
        }
    }
}

/// One resolved actor-vs-actor collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub survivor_id: u64,
    pub loser_id: u64,
    pub gained: i32,
}

#[derive(Debug, Default)]
pub struct TickOutcome {
    pub pellets_eaten: u32,
    pub collisions: Vec<Collision>,
    // Actors removed from the live list this tick, in list order.
    pub despawned: Vec<Actor>,
}

/// Step 1: every actor eats every pellet it overlaps; eaten pellets respawn immediately.
pub fn consume_pellets<R: Rng + ?Sized>(
    actors: &mut [Actor],
    pellets: &mut PelletField,
    rng: &mut R,
    metric: CollisionMetric,
) -> u32 {
    let mut eaten = 0;
    for actor in actors.iter_mut() {
        let pos = actor.position();
        let radius = actor.collision_radius();

        for index in 0..pellets.len() {
            let Some(pellet) = pellets.at(index) else {
                continue;
            };
            if metric.overlaps(pellet.distance_squared(pos), radius) {
                actor.add_score(1);
                // Index comes from the field's own range.
                let _ = pellets.respawn(index, rng);
                eaten += 1;
            }
        }
    }
    eaten
}

/// Step 2: pairwise merges. Returns the resolved collisions; losers are the marked set.
pub fn resolve_collisions(actors: &mut [Actor], metric: CollisionMetric) -> Vec<Collision> {
    let mut dead = vec![false; actors.len()];
    let mut collisions = Vec::new();

    for i in 0..actors.len() {
        if actors[i].in_mercy() || dead[i] {
            continue;
        }

        let pos_i = actors[i].position();
        let radius_i = actors[i].collision_radius();

        for j in (i + 1)..actors.len() {
            // A marked actor takes no further part this tick.
            if dead[i] {
                break;
            }
            if actors[j].in_mercy() || dead[j] {
                continue;
            }

            let dist_sq = pos_i.distance_squared(actors[j].position());
            if !metric.overlaps(dist_sq, radius_i + actors[j].collision_radius()) {
                continue;
            }

            let (survivor, loser) = if actors[i].score >= actors[j].score {
                (i, j)
            } else {
                (j, i)
            };
            let gained = actors[loser].score / 2;
            actors[survivor].add_score(gained);
            dead[loser] = true;

            debug!(
                survivor_id = actors[survivor].id,
                loser_id = actors[loser].id,
                gained,
                "actors collided"
            );
            collisions.push(Collision {
                survivor_id: actors[survivor].id,
                loser_id: actors[loser].id,
                gained,
            });
        }
    }

    collisions
}

/// Step 3: removes losers from the live list, preserving survivor order.
pub fn despawn_losers(actors: &mut Vec<Actor>, collisions: &[Collision]) -> Vec<Actor> {
    if collisions.is_empty() {
        return Vec::new();
    }
    let (dead, alive): (Vec<Actor>, Vec<Actor>) = std::mem::take(actors)
        .into_iter()
        .partition(|actor| collisions.iter().any(|c| c.loser_id == actor.id));
    *actors = alive;
    dead
}

/// Runs the three scoring steps in order against the live actor list.
pub fn run_tick<R: Rng + ?Sized>(
    actors: &mut Vec<Actor>,
    pellets: &mut PelletField,
    rng: &mut R,
    metric: CollisionMetric,
) -> TickOutcome {
    let pellets_eaten = consume_pellets(actors, pellets, rng, metric);
    let collisions = resolve_collisions(actors, metric);
    let despawned = despawn_losers(actors, &collisions);
    TickOutcome {
        pellets_eaten,
        collisions,
        despawned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::ActorController;
    use crate::domain::role::Role;
    use crate::domain::tuning::pellet::PelletTuning;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn actor(id: u64, position: Vec3, score: i32) -> Actor {
        Actor {
            id,
            connection_id: id,
            score,
            color_seed: id,
            mercy_time: 0.0,
            controller: ActorController {
                position,
                ..ActorController::default()
            },
        }
    }

    fn empty_field() -> PelletField {
        PelletField::new(PelletTuning::default())
    }

    fn field_with(count: usize, rng: &mut Pcg32) -> PelletField {
        let mut field = PelletField::new(PelletTuning {
            count,
            ..PelletTuning::default()
        });
        field.on_world_ready(Role::Server, rng);
        field.take_changes();
        field
    }

    #[test]
    fn when_actor_sits_on_a_pellet_then_it_eats_it_and_pellet_moves() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut pellets = field_with(1, &mut rng);
        let pellet = pellets.at(0).expect("one pellet");
        let mut actors = vec![actor(1, pellet, 0)];

        let eaten = consume_pellets(&mut actors, &mut pellets, &mut rng, CollisionMetric::Legacy);

        assert_eq!(eaten, 1);
        assert_eq!(actors[0].score, 1);
        assert_ne!(pellets.at(0), Some(pellet));
        assert_eq!(pellets.take_changes().indices, vec![0]);
    }

    #[test]
    fn when_pellet_is_out_of_reach_then_nothing_changes() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut pellets = field_with(1, &mut rng);
        let pellet = pellets.at(0).expect("one pellet");
        // 1.2 units away: dist^2 = 1.44 + 0.01, radius 1.
        let mut actors = vec![actor(1, pellet + Vec3::new(1.2, -0.1, 0.0), 0)];

        let eaten = consume_pellets(&mut actors, &mut pellets, &mut rng, CollisionMetric::Legacy);

        assert_eq!(eaten, 0);
        assert_eq!(actors[0].score, 0);
        assert!(!pellets.has_changes());
    }

    #[test]
    fn when_scores_are_100_and_40_then_survivor_gains_20_and_loser_despawns() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pellets = empty_field();
        let mut actors = vec![
            actor(1, Vec3::new(0.0, 0.0, 0.0), 100),
            actor(2, Vec3::new(1.0, 0.0, 0.0), 40),
        ];

        let outcome = run_tick(&mut actors, &mut pellets, &mut rng, CollisionMetric::Legacy);

        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].id, 1);
        assert_eq!(actors[0].score, 120);
        assert_eq!(outcome.despawned.len(), 1);
        assert_eq!(outcome.despawned[0].id, 2);
        assert_eq!(
            outcome.collisions,
            vec![Collision {
                survivor_id: 1,
                loser_id: 2,
                gained: 20
            }]
        );
    }

    #[test]
    fn when_scores_tie_then_earlier_actor_survives() {
        let mut actors = vec![actor(1, Vec3::ZERO, 7), actor(2, Vec3::ZERO, 7)];

        let collisions = resolve_collisions(&mut actors, CollisionMetric::Legacy);

        assert_eq!(collisions[0].survivor_id, 1);
        assert_eq!(actors[0].score, 10);
    }

    #[test]
    fn when_either_actor_is_in_mercy_then_no_collision_happens() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pellets = empty_field();
        let mut actors = vec![actor(1, Vec3::ZERO, 10), actor(2, Vec3::ZERO, 4)];
        actors[1].mercy_time = 0.5;

        let outcome = run_tick(&mut actors, &mut pellets, &mut rng, CollisionMetric::Legacy);

        assert!(outcome.collisions.is_empty());
        assert!(outcome.despawned.is_empty());
        assert_eq!(actors.len(), 2);
        assert_eq!(actors[0].score, 10);
        assert_eq!(actors[1].score, 4);
    }

    #[test]
    fn when_big_actor_overlaps_two_small_ones_then_it_absorbs_both() {
        let mut actors = vec![
            actor(1, Vec3::ZERO, 50),
            actor(2, Vec3::new(0.5, 0.0, 0.0), 10),
            actor(3, Vec3::new(-0.5, 0.0, 0.0), 6),
        ];

        let collisions = resolve_collisions(&mut actors, CollisionMetric::Legacy);
        let dead = despawn_losers(&mut actors, &collisions);

        assert_eq!(collisions.len(), 2);
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].score, 50 + 5 + 3);
        assert_eq!(dead.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn when_outer_actor_loses_then_it_cannot_win_later_pairs() {
        // Actor 1 loses to 2, then must not be matched against 3.
        let mut actors = vec![
            actor(1, Vec3::ZERO, 4),
            actor(2, Vec3::new(0.5, 0.0, 0.0), 30),
            actor(3, Vec3::new(-0.5, 0.0, 0.0), 2),
        ];

        let collisions = resolve_collisions(&mut actors, CollisionMetric::Legacy);

        assert_eq!(collisions[0].loser_id, 1);
        assert!(collisions.iter().all(|c| c.survivor_id != 1));
        assert_eq!(actors[0].score, 4);
    }

    #[test]
    fn when_metric_is_euclidean_then_reach_is_squared() {
        // dist^2 = 4, radius sum = 2.04 (< 4 legacy miss, 4.16 euclidean hit).
        let a = actor(1, Vec3::ZERO, 1);
        let b = actor(2, Vec3::new(2.0, 0.0, 0.0), 1);
        let dist_sq = a.position().distance_squared(b.position());
        let reach = a.collision_radius() + b.collision_radius();

        assert!(!CollisionMetric::Legacy.overlaps(dist_sq, reach));
        assert!(CollisionMetric::Euclidean.overlaps(dist_sq, reach));
    }

    #[test]
    fn when_metric_names_are_parsed_then_case_is_ignored() {
        assert_eq!("Legacy".parse::<CollisionMetric>(), Ok(CollisionMetric::Legacy));
        assert_eq!(" euclidean ".parse::<CollisionMetric>(), Ok(CollisionMetric::Euclidean));
        assert!("manhattan".parse::<CollisionMetric>().is_err());
    }
}
