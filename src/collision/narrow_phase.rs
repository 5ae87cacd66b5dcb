use crate::math::{Vector3, Transform};
use crate::shapes::{ShapeGeometry, Plane};
use crate::collision::gjk::{GJK, GjkResult, ConvexProxy};
use crate::collision::epa::EPA;
use crate::collision::contact_manifold::{MAX_CONTACT_POINTS, quad_area};

/// Samples taken around cylinder and cone rims when resting them on a plane
const RIM_SAMPLES: usize = 8;

/// Contacts this close to the deepest one count as equally deep
const DEPTH_TOLERANCE: f32 = 0.005;

/// A candidate must beat the best score by this factor to replace it
const SPREAD_TOLERANCE: f32 = 1.001;

/// Another box axis is only preferred when its separation exceeds
/// `RELATIVE * best + ABSOLUTE`
const AXIS_RELATIVE_TOLERANCE: f32 = 0.98;
const AXIS_ABSOLUTE_TOLERANCE: f32 = 0.001;

/// A contact produced by the narrowphase, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Point on the surface of A
    pub point_a: Vector3,

    /// Point on the surface of B
    pub point_b: Vector3,

    /// Unit normal pointing from B towards A
    pub normal: Vector3,

    /// Signed separation along the normal; negative when penetrating
    pub distance: f32,
}

impl ContactPoint {
    fn flipped(self) -> Self {
        Self {
            point_a: self.point_b,
            point_b: self.point_a,
            normal: -self.normal,
            distance: self.distance,
        }
    }
}

/// Contact generation between pairs of shapes
pub struct NarrowPhase;

impl NarrowPhase {
    /// Generates contacts closer than `threshold` between shape A and shape B.
    ///
    /// Problems that prevent contact generation are appended to `warnings`.
    pub fn generate_contacts(
        geometry_a: &ShapeGeometry,
        transform_a: &Transform,
        geometry_b: &ShapeGeometry,
        transform_b: &Transform,
        threshold: f32,
        warnings: &mut Vec<String>,
    ) -> Vec<ContactPoint> {
        let contacts = match (geometry_a, geometry_b) {
            (ShapeGeometry::StaticPlane(_), ShapeGeometry::StaticPlane(_)) => Vec::new(),
            (ShapeGeometry::StaticPlane(plane), _) => {
                Self::plane_convex(plane, transform_a, geometry_b, transform_b, threshold)
            }
            (_, ShapeGeometry::StaticPlane(plane)) => {
                Self::plane_convex(plane, transform_b, geometry_a, transform_a, threshold)
                    .into_iter()
                    .map(ContactPoint::flipped)
                    .collect()
            }
            (ShapeGeometry::Sphere(a), ShapeGeometry::Sphere(b)) => Self::sphere_sphere(
                transform_a.position,
                a.get_radius(),
                transform_b.position,
                b.get_radius(),
                threshold,
            )
            .into_iter()
            .collect(),
            _ => {
                let face_contacts = match (box_half_extents(geometry_a), box_half_extents(geometry_b)) {
                    (Some(half_a), Some(half_b)) => {
                        Self::box_box(half_a, transform_a, half_b, transform_b, threshold)
                    }
                    _ => None,
                };
                match face_contacts {
                    Some(contacts) => contacts,
                    None => Self::convex_convex(geometry_a, transform_a, geometry_b, transform_b, threshold, warnings)
                        .into_iter()
                        .collect(),
                }
            }
        };

        let contacts = contacts
            .into_iter()
            .filter(|c| {
                let valid = c.normal.is_finite() && c.distance.is_finite() && !c.normal.is_zero();
                if !valid {
                    warnings.push(format!("discarded degenerate contact normal {}", c.normal));
                }
                valid
            })
            .collect();
        reduce_contacts(contacts)
    }

    fn sphere_sphere(
        center_a: Vector3,
        radius_a: f32,
        center_b: Vector3,
        radius_b: f32,
        threshold: f32,
    ) -> Option<ContactPoint> {
        let delta = center_a - center_b;
        let length = delta.length();
        let distance = length - radius_a - radius_b;
        if distance > threshold {
            return None;
        }

        let normal = if length > crate::math::EPSILON {
            delta / length
        } else {
            Vector3::unit_y()
        };
        Some(ContactPoint {
            point_a: center_a - normal * radius_a,
            point_b: center_b + normal * radius_b,
            normal,
            distance,
        })
    }

    /// Contacts of a convex shape (B side) against a plane (A side)
    fn plane_convex(
        plane: &Plane,
        plane_transform: &Transform,
        geometry: &ShapeGeometry,
        transform: &Transform,
        threshold: f32,
    ) -> Vec<ContactPoint> {
        let plane_normal = plane_transform.transform_direction(plane.get_normal());
        let plane_origin = plane_transform.transform_point(plane.get_normal() * plane.get_distance());

        Self::plane_candidates(geometry, transform, plane_normal)
            .into_iter()
            .filter_map(|point| {
                let distance = plane_normal.dot(&(point - plane_origin));
                (distance < threshold).then(|| ContactPoint {
                    point_a: point - plane_normal * distance,
                    point_b: point,
                    normal: -plane_normal,
                    distance,
                })
            })
            .collect()
    }

    /// World-space surface points of a convex shape that may rest on a plane
    /// with the given world normal
    fn plane_candidates(geometry: &ShapeGeometry, transform: &Transform, plane_normal: Vector3) -> Vec<Vector3> {
        let local_down = transform.inverse_transform_direction(-plane_normal);
        let margin_offset = -plane_normal * geometry.margin();

        let local_points: Vec<Vector3> = match geometry {
            ShapeGeometry::Box(b) => b.vertices().to_vec(),
            ShapeGeometry::Box2d(b) => b.as_box().vertices().to_vec(),
            ShapeGeometry::Sphere(_) => vec![Vector3::zero()],
            ShapeGeometry::Capsule(c) => {
                let (top, bottom) = c.segment();
                vec![top, bottom]
            }
            ShapeGeometry::Cylinder(c) => {
                let mut points = c.rim_points(RIM_SAMPLES);
                points.push(c.support(local_down));
                points
            }
            ShapeGeometry::Cone(c) => {
                let mut points = c.rim_points(RIM_SAMPLES);
                points.push(c.support(local_down));
                points
            }
            ShapeGeometry::StaticPlane(_) => Vec::new(),
        };

        local_points
            .into_iter()
            .map(|p| transform.transform_point(p) + margin_offset)
            .collect()
    }

    /// Face contacts between two boxes from the separating axis test.
    ///
    /// The incident face of one box is clipped against the side planes of the
    /// reference face of the other, giving up to eight points. Returns `None`
    /// when an edge-edge axis separates best, which is left to GJK/EPA.
    fn box_box(
        half_a: Vector3,
        transform_a: &Transform,
        half_b: Vector3,
        transform_b: &Transform,
        threshold: f32,
    ) -> Option<Vec<ContactPoint>> {
        let box_a = OrientedBox::new(half_a, transform_a);
        let box_b = OrientedBox::new(half_b, transform_b);
        let offset = box_b.center - box_a.center;
        let separation = |axis: Vector3| {
            offset.dot(&axis).abs() - box_a.projected_radius(axis) - box_b.projected_radius(axis)
        };

        let deepest_face = |boxed: &OrientedBox| {
            (0..3)
                .map(|i| (i, separation(boxed.axes[i])))
                .fold((0, f32::NEG_INFINITY), |best, axis| if axis.1 > best.1 { axis } else { best })
        };
        let (face_a, separation_a) = deepest_face(&box_a);
        let (face_b, separation_b) = deepest_face(&box_b);
        if separation_a > threshold || separation_b > threshold {
            return Some(Vec::new());
        }

        let mut edge_separation = f32::NEG_INFINITY;
        for axis_a in &box_a.axes {
            for axis_b in &box_b.axes {
                let cross = axis_a.cross(axis_b);
                let length = cross.length();
                if length < 1.0e-3 {
                    continue;
                }
                let s = separation(cross / length);
                if s > threshold {
                    return Some(Vec::new());
                }
                edge_separation = edge_separation.max(s);
            }
        }

        let face_separation = separation_a.max(separation_b);
        if edge_separation > AXIS_RELATIVE_TOLERANCE * face_separation + AXIS_ABSOLUTE_TOLERANCE {
            return None;
        }

        let reference_is_b = separation_b > AXIS_RELATIVE_TOLERANCE * separation_a + AXIS_ABSOLUTE_TOLERANCE;
        let (reference, incident, face) = if reference_is_b {
            (&box_b, &box_a, face_b)
        } else {
            (&box_a, &box_b, face_a)
        };

        // reference face normal, pointing at the incident box
        let axis = reference.axes[face];
        let normal = if (incident.center - reference.center).dot(&axis) >= 0.0 { axis } else { -axis };
        let face_center = reference.center + normal * reference.half_extents[face];

        let mut polygon = incident.face_towards(-normal).to_vec();
        for side in [(face + 1) % 3, (face + 2) % 3] {
            let tangent = reference.axes[side];
            let center = tangent.dot(&reference.center);
            let extent = reference.half_extents[side];
            polygon = clip_polygon(&polygon, tangent, center + extent);
            polygon = clip_polygon(&polygon, -tangent, extent - center);
        }
        if polygon.is_empty() {
            return None;
        }

        let contacts = polygon
            .into_iter()
            .filter_map(|point| {
                let distance = normal.dot(&(point - face_center));
                if distance >= threshold {
                    return None;
                }
                let on_reference = point - normal * distance;
                Some(if reference_is_b {
                    ContactPoint { point_a: point, point_b: on_reference, normal, distance }
                } else {
                    ContactPoint { point_a: on_reference, point_b: point, normal: -normal, distance }
                })
            })
            .collect();
        Some(contacts)
    }

    /// GJK on the shape cores, falling back to EPA on the full shapes when
    /// the cores overlap
    fn convex_convex(
        geometry_a: &ShapeGeometry,
        transform_a: &Transform,
        geometry_b: &ShapeGeometry,
        transform_b: &Transform,
        threshold: f32,
        warnings: &mut Vec<String>,
    ) -> Option<ContactPoint> {
        let core_a = ConvexProxy::core(geometry_a, transform_a);
        let core_b = ConvexProxy::core(geometry_b, transform_b);
        let (margin_a, margin_b) = (geometry_a.margin(), geometry_b.margin());

        match GJK::closest_points(&core_a, &core_b) {
            GjkResult::Separated { point_a, point_b, distance } if distance > crate::math::EPSILON => {
                let contact_distance = distance - margin_a - margin_b;
                if contact_distance > threshold {
                    return None;
                }
                let normal = (point_a - point_b) / distance;
                Some(ContactPoint {
                    point_a: point_a - normal * margin_a,
                    point_b: point_b + normal * margin_b,
                    normal,
                    distance: contact_distance,
                })
            }
            _ => {
                let full_a = ConvexProxy::full(geometry_a, transform_a);
                let full_b = ConvexProxy::full(geometry_b, transform_b);
                let simplex = match GJK::closest_points(&full_a, &full_b) {
                    GjkResult::Overlapping(simplex) => simplex,
                    GjkResult::Separated { .. } => {
                        // cores touch exactly while the margins overlap
                        let normal = (transform_a.position - transform_b.position)
                            .try_normalize()
                            .unwrap_or(Vector3::unit_y());
                        let point_a = full_a.support(-normal);
                        let point_b = full_b.support(normal);
                        return Some(ContactPoint {
                            point_a,
                            point_b,
                            normal,
                            distance: (point_a - point_b).dot(&normal),
                        });
                    }
                };

                match EPA::penetration_depth(&simplex, &full_a, &full_b) {
                    Some(penetration) => Some(ContactPoint {
                        point_a: penetration.point_a,
                        point_b: penetration.point_b,
                        normal: penetration.normal,
                        distance: -penetration.depth,
                    }),
                    None => {
                        warnings.push(format!(
                            "penetration depth solver failed for {:?} against {:?}",
                            geometry_a.shape_type(),
                            geometry_b.shape_type()
                        ));
                        None
                    }
                }
            }
        }
    }
}

/// Half extents of shapes that collide as boxes
fn box_half_extents(geometry: &ShapeGeometry) -> Option<Vector3> {
    match geometry {
        ShapeGeometry::Box(b) => Some(b.get_half_extents()),
        ShapeGeometry::Box2d(b) => Some(b.as_box().get_half_extents()),
        _ => None,
    }
}

/// A box placed in world space
struct OrientedBox {
    center: Vector3,
    axes: [Vector3; 3],
    half_extents: Vector3,
}

impl OrientedBox {
    fn new(half_extents: Vector3, transform: &Transform) -> Self {
        Self {
            center: transform.position,
            axes: [
                transform.transform_direction(Vector3::unit_x()),
                transform.transform_direction(Vector3::unit_y()),
                transform.transform_direction(Vector3::unit_z()),
            ],
            half_extents,
        }
    }

    /// Half the length of the box's shadow on `axis`
    fn projected_radius(&self, axis: Vector3) -> f32 {
        (0..3)
            .map(|i| self.half_extents[i] * self.axes[i].dot(&axis).abs())
            .sum()
    }

    /// Corners, in winding order, of the face whose outward normal is
    /// closest to `direction`
    fn face_towards(&self, direction: Vector3) -> [Vector3; 4] {
        let alignment = |i: usize| self.axes[i].dot(&direction);
        let k = (0..3)
            .max_by(|&i, &j| alignment(i).abs().total_cmp(&alignment(j).abs()))
            .unwrap_or(0);
        let sign = if alignment(k) >= 0.0 { 1.0 } else { -1.0 };

        let center = self.center + self.axes[k] * (sign * self.half_extents[k]);
        let (u, v) = ((k + 1) % 3, (k + 2) % 3);
        let du = self.axes[u] * self.half_extents[u];
        let dv = self.axes[v] * self.half_extents[v];
        [center + du + dv, center - du + dv, center - du - dv, center + du - dv]
    }
}

/// Keeps the part of `polygon` where `normal · p <= offset`
fn clip_polygon(polygon: &[Vector3], normal: Vector3, offset: f32) -> Vec<Vector3> {
    let mut clipped = Vec::with_capacity(polygon.len() + 1);
    for (i, &current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let d_current = normal.dot(&current) - offset;
        let d_next = normal.dot(&next) - offset;

        if d_current <= 0.0 {
            clipped.push(current);
        }
        if (d_current <= 0.0) != (d_next <= 0.0) {
            clipped.push(current.lerp(&next, d_current / (d_current - d_next)));
        }
    }
    clipped
}

/// Cuts a contact set down to what a manifold holds: the deepest point and
/// the points spanning the largest area with it. Earlier contacts win ties,
/// so a body at rest yields the same selection every sub-step.
fn reduce_contacts(contacts: Vec<ContactPoint>) -> Vec<ContactPoint> {
    if contacts.len() <= MAX_CONTACT_POINTS {
        return contacts;
    }

    let deepest = contacts.iter().map(|c| c.distance).fold(f32::INFINITY, f32::min);
    let first = contacts
        .iter()
        .position(|c| c.distance <= deepest + DEPTH_TOLERANCE)
        .unwrap_or(0);
    let point = |i: usize| contacts[i].point_b;
    let origin = point(first);

    let mut chosen = vec![first];
    let second = pick_spread(contacts.len(), &chosen, |i| (point(i) - origin).length_squared());
    chosen.push(second);
    let edge = point(second) - origin;
    let third = pick_spread(contacts.len(), &chosen, |i| (point(i) - origin).cross(&edge).length_squared());
    chosen.push(third);
    let fourth = pick_spread(contacts.len(), &chosen, |i| {
        quad_area(origin, point(second), point(third), point(i))
    });
    chosen.push(fourth);

    chosen.sort_unstable();
    chosen.into_iter().map(|i| contacts[i]).collect()
}

/// Index outside `chosen` with the highest score
fn pick_spread(count: usize, chosen: &[usize], score: impl Fn(usize) -> f32) -> usize {
    let mut candidates = (0..count).filter(|i| !chosen.contains(i));
    let mut best = candidates.next().unwrap_or(0);
    let mut best_score = score(best);
    for i in candidates {
        let s = score(i);
        if s > best_score * SPREAD_TOLERANCE {
            best = i;
            best_score = s;
        }
    }
    best
}
