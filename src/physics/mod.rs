//! Collision detection for convex polyhedral colliders.
//!
//! # Architecture
//!
//! Each call to [`CollisionWorld::run_tick`] rebuilds every result from scratch:
//!
//! 1. Clear per-tick state on every collider
//! 2. Transform object-space bounds to world space
//! 3. Broadphase (sweep-and-prune on three axes)
//! 4. Narrowphase (GJK) for every candidate pair
//! 5. Penetration (EPA) in both directions for every confirmed pair
//! 6. Store one [`Collision`] per partner on each collider
//!
//! Entity data (world transforms and meshes) is read through the
//! [`EntitySource`] trait, implemented for `hecs::World`.

pub mod bounds;
pub mod broadphase;
pub mod collider;
pub mod contact;
pub mod debug;
pub mod epa;
pub mod error;
pub mod narrowphase;
pub mod raycast;
pub mod source;
pub mod support;

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use self::bounds::Bounds;
use self::broadphase::SweepAndPrune;
use self::collider::{entity_bounds, Collider, ColliderId};
use self::contact::Collision;
use self::epa::epa_penetration;
use self::error::{CollisionError, Result};
use self::narrowphase::gjk_intersection;
use self::raycast::{intersect_mesh, world_normal, Ray, RayHit};
use self::source::EntitySource;
use self::support::Hull;

/// Tunables for the collision pipeline.
#[derive(Debug, Clone)]
pub struct CollisionConfig {
    /// GJK iteration cap. Reaching it reports no intersection. Default: 64.
    pub gjk_max_iterations: u32,
    /// EPA iteration cap. Reaching it is a per-pair failure. Default: 32.
    pub epa_max_iterations: u32,
    /// EPA convergence distance. Default: 1e-4.
    pub epa_tolerance: f32,
    /// Maximum depth difference between the (A, B) and (B, A) EPA runs
    /// before the pair is rejected as inconsistent. Default: 1e-3.
    pub epa_agreement_tolerance: f32,
    /// GJK retries its first support point along Y when the point along X
    /// is more aligned with X than this fraction of its length. Default: 0.8.
    pub axis_alignment_threshold: f32,
    /// Squared length below which a GJK search direction is degenerate. Default: 1e-10.
    pub direction_epsilon: f32,
    /// Slack for the "ray starts inside the bounds" test. Default: 1e-6.
    pub ray_epsilon: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            gjk_max_iterations: 64,
            epa_max_iterations: 32,
            epa_tolerance: 1e-4,
            epa_agreement_tolerance: 1e-3,
            axis_alignment_threshold: 0.8,
            direction_epsilon: 1e-10,
            ray_epsilon: 1e-6,
        }
    }
}

/// Result of evaluating one candidate pair.
enum PairOutcome {
    Separated,
    /// GJK confirmed overlap but EPA produced no usable contact.
    Touching,
    Penetrating(Collision, Collision),
}

/// Registry of colliders and the per-tick collision pipeline.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    config: CollisionConfig,
    colliders: SlotMap<ColliderId, Collider>,
    broadphase: SweepAndPrune,
}

impl CollisionWorld {
    /// Create an empty collision world with the given configuration.
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            colliders: SlotMap::with_key(),
            broadphase: SweepAndPrune::new(),
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Register a collider for `entity`. Its bounds are computed from the
    /// entity's meshes now and only recomputed on request.
    pub fn add_collider<S: EntitySource>(
        &mut self,
        entity: hecs::Entity,
        source: &S,
    ) -> Result<ColliderId> {
        let bounds = entity_bounds(source, entity)?;
        let id = self.colliders.insert(Collider::new(entity, bounds));
        debug!(?id, ?entity, "collider added");
        Ok(id)
    }

    /// Unregister a collider and forget every result that mentions it.
    pub fn remove_collider(&mut self, id: ColliderId) -> Result<Collider> {
        let removed = self
            .colliders
            .remove(id)
            .ok_or(CollisionError::UnknownCollider(id))?;

        for collider in self.colliders.values_mut() {
            collider.broad_candidates.remove(&id);
            collider.narrow_candidates.remove(&id);
            collider.collisions.retain(|c| c.object2 != id);
        }
        debug!(?id, entity = ?removed.entity(), "collider removed");
        Ok(removed)
    }

    /// Remove every collider whose entity no longer exists in `source`.
    /// Returns the number of colliders removed.
    pub fn remove_despawned<S: EntitySource>(&mut self, source: &S) -> usize {
        let stale: Vec<ColliderId> = self
            .colliders
            .iter()
            .filter(|(_, collider)| !source.contains(collider.entity()))
            .map(|(id, _)| id)
            .collect();

        stale
            .into_iter()
            .filter(|&id| self.remove_collider(id).is_ok())
            .count()
    }

    /// Recompute a collider's object-space bounds from its entity's current meshes.
    pub fn recompute_bounds<S: EntitySource>(
        &mut self,
        id: ColliderId,
        source: &S,
    ) -> Result<Bounds> {
        let collider = self
            .colliders
            .get_mut(id)
            .ok_or(CollisionError::UnknownCollider(id))?;
        let bounds = entity_bounds(source, collider.entity())?;
        collider.set_bounds(bounds);
        Ok(bounds)
    }

    /// Current world-space bounds of a collider.
    pub fn world_bounds<S: EntitySource>(&self, id: ColliderId, source: &S) -> Result<Bounds> {
        let collider = self
            .colliders
            .get(id)
            .ok_or(CollisionError::UnknownCollider(id))?;
        let model = source
            .model_matrix(collider.entity())
            .ok_or(CollisionError::MissingTransform(collider.entity()))?;
        Ok(collider.bounds().transformed(model))
    }

    /// Run the broadphase, then the narrowphase, replacing all previous results.
    pub fn run_tick<S: EntitySource>(&mut self, source: &S) {
        for collider in self.colliders.values_mut() {
            collider.clear_tick_state();
        }

        let mut entries = Vec::with_capacity(self.colliders.len());
        for (id, collider) in self.colliders.iter_mut() {
            match source.model_matrix(collider.entity()) {
                Some(model) => {
                    let world = collider.bounds().transformed(model);
                    collider.set_world_bounds(Some(world));
                    entries.push((id, world));
                }
                None => warn!(
                    ?id,
                    entity = ?collider.entity(),
                    "skipping collider without a world transform"
                ),
            }
        }

        let candidates = self.broadphase.find_candidates(entries);
        let pairs = SweepAndPrune::pairs(&candidates);
        let mut hulls: HashMap<ColliderId, Hull> = HashMap::with_capacity(candidates.len());

        for (id, partners) in candidates {
            let Some(collider) = self.colliders.get_mut(id) else {
                continue;
            };
            match Hull::from_entity(source, collider.entity()) {
                Ok(hull) => {
                    hulls.insert(id, hull);
                }
                Err(err) => warn!(?id, %err, "skipping collider in narrowphase"),
            }
            collider.broad_candidates = partners;
        }

        let mut outcomes = Vec::new();
        for &(a, b) in &pairs {
            let (Some(hull_a), Some(hull_b)) = (hulls.get(&a), hulls.get(&b)) else {
                continue;
            };
            match self.evaluate_pair(a, b, hull_a, hull_b) {
                PairOutcome::Separated => {}
                outcome => outcomes.push((a, b, outcome)),
            }
        }

        let mut contacts = 0usize;
        for (a, b, outcome) in outcomes {
            if let Some(collider) = self.colliders.get_mut(a) {
                collider.narrow_candidates.insert(b);
            }
            if let Some(collider) = self.colliders.get_mut(b) {
                collider.narrow_candidates.insert(a);
            }
            if let PairOutcome::Penetrating(ab, ba) = outcome {
                contacts += 1;
                if let Some(collider) = self.colliders.get_mut(a) {
                    collider.collisions.push(ab);
                }
                if let Some(collider) = self.colliders.get_mut(b) {
                    collider.collisions.push(ba);
                }
            }
        }

        trace!(
            colliders = self.colliders.len(),
            broad_pairs = pairs.len(),
            contacts,
            "collision tick"
        );
    }

    /// GJK once, then EPA in both directions.
    fn evaluate_pair(
        &self,
        a: ColliderId,
        b: ColliderId,
        hull_a: &Hull,
        hull_b: &Hull,
    ) -> PairOutcome {
        let simplex = match gjk_intersection(hull_a, hull_b, &self.config) {
            Ok(Some(simplex)) => simplex,
            Ok(None) => return PairOutcome::Separated,
            Err(err) => {
                debug!(?a, ?b, %err, "GJK failed, skipping pair");
                return PairOutcome::Separated;
            }
        };

        let ab = epa_penetration(&simplex, hull_a, hull_b, a, b, &self.config);
        let ba = epa_penetration(&simplex.mirrored(), hull_b, hull_a, b, a, &self.config);

        match (ab, ba) {
            (Ok(ab), Ok(ba)) => {
                let agree = (ab.depth - ba.depth).abs() <= self.config.epa_agreement_tolerance;
                debug_assert!(
                    agree,
                    "EPA depth differs by direction: {} vs {}",
                    ab.depth, ba.depth
                );
                if !agree {
                    warn!(
                        ?a,
                        ?b,
                        depth_ab = ab.depth,
                        depth_ba = ba.depth,
                        "EPA results disagree, skipping pair"
                    );
                    return PairOutcome::Separated;
                }
                PairOutcome::Penetrating(ab, ba)
            }
            (Err(err), _) | (_, Err(err)) => {
                debug!(?a, ?b, %err, "EPA failed, pair has no contact this tick");
                PairOutcome::Touching
            }
        }
    }

    /// Whether the broadphase paired this collider with anything on the last tick.
    pub fn is_broad_colliding(&self, id: ColliderId) -> bool {
        self.colliders
            .get(id)
            .is_some_and(|c| !c.broad_candidates().is_empty())
    }

    /// Whether GJK confirmed an overlap for this collider on the last tick.
    pub fn is_narrow_colliding(&self, id: ColliderId) -> bool {
        self.colliders
            .get(id)
            .is_some_and(|c| !c.narrow_candidates().is_empty())
    }

    /// Contacts where `id` is `object1`. Empty for unknown colliders.
    pub fn collisions_of(&self, id: ColliderId) -> &[Collision] {
        self.colliders
            .get(id)
            .map(Collider::collisions)
            .unwrap_or_default()
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColliderId, &Collider)> {
        self.colliders.iter()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Nearest triangle hit across all colliders.
    ///
    /// Colliders are pre-filtered by their world bounds; a ray that starts
    /// inside a collider's bounds always reaches the triangle test.
    pub fn raycast<S: EntitySource>(&self, ray: &Ray, source: &S) -> Option<RayHit> {
        // `t` counts in multiples of the direction, which need not be unit length
        let direction_length = ray.direction.length();
        if direction_length == 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for (id, collider) in self.colliders.iter() {
            let entity = collider.entity();
            let Some(model) = source.model_matrix(entity) else {
                continue;
            };
            let bounds = collider.bounds().transformed(model);
            if !bounds.point_inside(ray.origin, self.config.ray_epsilon)
                && bounds.ray_intersect(ray).is_none()
            {
                continue;
            }
            let Some(inverse) = source.inverse_model_matrix(entity) else {
                continue;
            };

            let local_ray = ray.transformed(inverse);
            let hit = source
                .with_meshes(entity, |meshes| {
                    meshes
                        .filter_map(|mesh| intersect_mesh(&local_ray, mesh))
                        .min_by(|a, b| a.0.total_cmp(&b.0))
                })
                .flatten();

            if let Some((t, local_normal)) = hit {
                let distance = t * direction_length;
                if best.as_ref().map_or(true, |b| distance < b.distance) {
                    best = Some(RayHit {
                        position: ray.point_at(t),
                        normal: world_normal(inverse, local_normal, ray.direction),
                        distance,
                        collider: id,
                        entity,
                    });
                }
            }
        }
        best
    }
}
