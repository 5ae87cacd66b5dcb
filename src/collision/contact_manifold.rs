use crate::math::{Vector3, Transform};
use crate::collision::collision_pair::CollisionPair;
use crate::collision::narrow_phase::ContactPoint;

/// Maximum number of contact points to store in a manifold
pub const MAX_CONTACT_POINTS: usize = 4;

/// A contact point that persists across sub-steps.
///
/// Points are stored in each body's local frame so they can be re-projected
/// after the bodies move; accumulated impulses are kept for warm starting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldPoint {
    pub local_point_a: Vector3,
    pub local_point_b: Vector3,

    pub position_world_on_a: Vector3,
    pub position_world_on_b: Vector3,

    /// Unit normal pointing from B towards A
    pub normal_world_on_b: Vector3,

    /// Signed separation; negative when penetrating
    pub distance: f32,

    /// Number of sub-steps the point has survived
    pub lifetime: u32,

    pub applied_impulse: f32,
    pub applied_impulse_lateral1: f32,
    pub applied_impulse_lateral2: f32,

    /// First sliding friction direction used last sub-step; the lateral
    /// impulses above were accumulated along it
    pub lateral_friction_dir: Option<Vector3>,
}

impl ManifoldPoint {
    fn new(contact: &ContactPoint, transform_a: &Transform, transform_b: &Transform) -> Self {
        Self {
            local_point_a: transform_a.inverse_transform_point(contact.point_a),
            local_point_b: transform_b.inverse_transform_point(contact.point_b),
            position_world_on_a: contact.point_a,
            position_world_on_b: contact.point_b,
            normal_world_on_b: contact.normal,
            distance: contact.distance,
            lifetime: 0,
            applied_impulse: 0.0,
            applied_impulse_lateral1: 0.0,
            applied_impulse_lateral2: 0.0,
            lateral_friction_dir: None,
        }
    }
}

/// The persistent set of contact points between two bodies
#[derive(Debug, Clone)]
pub struct ContactManifold {
    /// The collision pair this manifold belongs to
    pub pair: CollisionPair,

    points: Vec<ManifoldPoint>,

    /// Points separated by more than this are dropped
    breaking_threshold: f32,
}

impl ContactManifold {
    pub fn new(pair: CollisionPair, breaking_threshold: f32) -> Self {
        Self {
            pair,
            points: Vec::with_capacity(MAX_CONTACT_POINTS),
            breaking_threshold,
        }
    }

    pub fn get_points(&self) -> &[ManifoldPoint] {
        &self.points
    }

    pub(crate) fn get_points_mut(&mut self) -> &mut [ManifoldPoint] {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Adds a new contact, merging it with a cached point that lies close by
    /// or replacing one chosen to keep the largest contact area
    pub fn add_contact(&mut self, contact: &ContactPoint, transform_a: &Transform, transform_b: &Transform) {
        let new_point = ManifoldPoint::new(contact, transform_a, transform_b);

        if let Some(index) = self.find_cached_point(&new_point) {
            let cached = self.points[index];
            self.points[index] = ManifoldPoint {
                lifetime: cached.lifetime,
                applied_impulse: cached.applied_impulse,
                applied_impulse_lateral1: cached.applied_impulse_lateral1,
                applied_impulse_lateral2: cached.applied_impulse_lateral2,
                lateral_friction_dir: cached.lateral_friction_dir,
                ..new_point
            };
            return;
        }

        if self.points.len() < MAX_CONTACT_POINTS {
            self.points.push(new_point);
        } else {
            let index = self.replacement_index(&new_point);
            self.points[index] = new_point;
        }
    }

    fn find_cached_point(&self, point: &ManifoldPoint) -> Option<usize> {
        let mut nearest = self.breaking_threshold * self.breaking_threshold;
        let mut found = None;
        for (i, existing) in self.points.iter().enumerate() {
            let dist_sq = (existing.local_point_b - point.local_point_b).length_squared();
            if dist_sq < nearest {
                nearest = dist_sq;
                found = Some(i);
            }
        }
        found
    }

    /// Picks the cached point to drop when the manifold is full. The deepest
    /// point is never dropped; among the rest, the one whose removal leaves
    /// the largest quadrilateral goes.
    fn replacement_index(&self, new_point: &ManifoldPoint) -> usize {
        let deepest = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance < new_point.distance)
            .min_by(|(_, x), (_, y)| x.distance.total_cmp(&y.distance))
            .map(|(i, _)| i);

        let p = |i: usize| self.points[i].local_point_a;
        let candidate = new_point.local_point_a;
        let area = |skip: usize| -> f32 {
            let others: Vec<Vector3> = (0..MAX_CONTACT_POINTS)
                .filter(|i| *i != skip)
                .map(p)
                .collect();
            quad_area(candidate, others[0], others[1], others[2])
        };

        (0..MAX_CONTACT_POINTS)
            .filter(|i| Some(*i) != deepest)
            .max_by(|x, y| area(*x).total_cmp(&area(*y)))
            .unwrap_or(0)
    }

    /// Re-projects every point with the current body transforms and drops
    /// points that separated or slid too far apart
    pub fn refresh_contact_points(&mut self, transform_a: &Transform, transform_b: &Transform) {
        let threshold = self.breaking_threshold;
        for point in &mut self.points {
            point.position_world_on_a = transform_a.transform_point(point.local_point_a);
            point.position_world_on_b = transform_b.transform_point(point.local_point_b);
            point.distance = (point.position_world_on_a - point.position_world_on_b).dot(&point.normal_world_on_b);
            point.lifetime += 1;
        }

        self.points.retain(|point| {
            if point.distance > threshold {
                return false;
            }
            let projected = point.position_world_on_a - point.normal_world_on_b * point.distance;
            let drift = point.position_world_on_b - projected;
            drift.length_squared() <= threshold * threshold
        });
    }
}

/// Largest squared cross product over the three ways of pairing the
/// diagonals of four points; proportional to the area they span
pub(crate) fn quad_area(p0: Vector3, p1: Vector3, p2: Vector3, p3: Vector3) -> f32 {
    let a = (p0 - p1).cross(&(p2 - p3)).length_squared();
    let b = (p0 - p2).cross(&(p1 - p3)).length_squared();
    let c = (p0 - p3).cross(&(p1 - p2)).length_squared();
    a.max(b).max(c)
}
