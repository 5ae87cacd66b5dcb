use crate::math::{Vector3, Transform};
use crate::shapes::ShapeGeometry;

/// GJK (Gilbert-Johnson-Keerthi) closest-point queries between convex shapes
pub struct GJK;

/// Maximum number of iterations for the GJK algorithm
const MAX_ITERATIONS: usize = 64;

/// Relative convergence tolerance on the squared distance
const RELATIVE_TOLERANCE: f32 = 1.0e-6;

/// Squared distance below which the shapes are considered touching
const OVERLAP_TOLERANCE: f32 = 1.0e-10;

/// A convex shape placed in the world, queried either as its core or as
/// the full shape (core plus margin)
#[derive(Debug, Clone, Copy)]
pub struct ConvexProxy<'a> {
    pub geometry: &'a ShapeGeometry,
    pub transform: &'a Transform,
    pub with_margin: bool,
}

impl<'a> ConvexProxy<'a> {
    pub fn core(geometry: &'a ShapeGeometry, transform: &'a Transform) -> Self {
        Self { geometry, transform, with_margin: false }
    }

    pub fn full(geometry: &'a ShapeGeometry, transform: &'a Transform) -> Self {
        Self { geometry, transform, with_margin: true }
    }

    /// World-space support point along a world-space direction
    pub fn support(&self, direction: Vector3) -> Vector3 {
        let local_dir = self.transform.inverse_transform_direction(direction);
        let local = if self.with_margin {
            self.geometry.support(local_dir)
        } else {
            self.geometry.core_support(local_dir)
        };
        self.transform.transform_point(local)
    }
}

/// A vertex of the Minkowski difference together with the points that made it
#[derive(Debug, Clone, Copy)]
pub struct SupportPoint {
    /// `on_a - on_b`
    pub point: Vector3,
    pub on_a: Vector3,
    pub on_b: Vector3,
}

impl SupportPoint {
    pub fn new(a: &ConvexProxy, b: &ConvexProxy, direction: Vector3) -> Self {
        let on_a = a.support(direction);
        let on_b = b.support(-direction);
        Self { point: on_a - on_b, on_a, on_b }
    }
}

/// A simplex is a geometric shape: point, line, triangle, or tetrahedron
#[derive(Debug, Clone)]
pub struct Simplex {
    /// The points in the simplex (max 4)
    points: Vec<SupportPoint>,
}

impl Simplex {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(4),
        }
    }

    pub fn add_point(&mut self, point: SupportPoint) {
        self.points.push(point);
    }

    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn get_points(&self) -> &[SupportPoint] {
        &self.points
    }

    fn contains(&self, point: Vector3) -> bool {
        self.points
            .iter()
            .any(|p| (p.point - point).length_squared() < OVERLAP_TOLERANCE)
    }

    /// Keeps only the vertices with a non-zero weight
    fn retain(&mut self, weights: &[f32]) {
        let mut index = 0;
        self.points.retain(|_| {
            let keep = weights[index] > 0.0;
            index += 1;
            keep
        });
    }
}

impl Default for Simplex {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a GJK distance query
#[derive(Debug, Clone)]
pub enum GjkResult {
    /// The shapes are apart: closest points on each and their distance
    Separated {
        point_a: Vector3,
        point_b: Vector3,
        distance: f32,
    },

    /// The shapes touch or overlap; the final simplex encloses the origin
    Overlapping(Simplex),
}

/// Barycentric weights of the point of a segment closest to the origin
fn closest_on_segment(a: Vector3, b: Vector3) -> [f32; 2] {
    let ab = b - a;
    let denom = ab.length_squared();
    if denom < OVERLAP_TOLERANCE {
        return [1.0, 0.0];
    }
    let t = (-a.dot(&ab) / denom).clamp(0.0, 1.0);
    [1.0 - t, t]
}

/// Barycentric weights of the point of a triangle closest to the origin
fn closest_on_triangle(a: Vector3, b: Vector3, c: Vector3) -> [f32; 3] {
    let ab = b - a;
    let ac = c - a;
    let ao = -a;

    let d1 = ab.dot(&ao);
    let d2 = ac.dot(&ao);
    if d1 <= 0.0 && d2 <= 0.0 {
        return [1.0, 0.0, 0.0];
    }

    let bo = -b;
    let d3 = ab.dot(&bo);
    let d4 = ac.dot(&bo);
    if d3 >= 0.0 && d4 <= d3 {
        return [0.0, 1.0, 0.0];
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return [1.0 - v, v, 0.0];
    }

    let co = -c;
    let d5 = ab.dot(&co);
    let d6 = ac.dot(&co);
    if d6 >= 0.0 && d5 <= d6 {
        return [0.0, 0.0, 1.0];
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return [1.0 - w, 0.0, w];
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return [0.0, 1.0 - w, w];
    }

    // inside the face
    let denom = va + vb + vc;
    if denom.abs() < f32::MIN_POSITIVE {
        return [1.0, 0.0, 0.0];
    }
    let v = vb / denom;
    let w = vc / denom;
    [1.0 - v - w, v, w]
}

/// Barycentric weights of the point of a tetrahedron closest to the origin,
/// or `None` when the origin lies inside it
fn closest_on_tetrahedron(p: [Vector3; 4]) -> Option<[f32; 4]> {
    const FACES: [([usize; 3], usize); 4] = [
        ([0, 1, 2], 3),
        ([0, 1, 3], 2),
        ([0, 2, 3], 1),
        ([1, 2, 3], 0),
    ];

    let mut best: Option<([f32; 4], f32)> = None;
    let mut outside_any = false;
    for (face, opposite) in FACES {
        let (a, b, c) = (p[face[0]], p[face[1]], p[face[2]]);
        let normal = (b - a).cross(&(c - a));
        let origin_side = -a.dot(&normal);
        let opposite_side = (p[opposite] - a).dot(&normal);
        // degenerate tetrahedra fall through to the face tests
        if origin_side * opposite_side > 0.0 && opposite_side.abs() > OVERLAP_TOLERANCE {
            continue;
        }
        outside_any = true;

        let w = closest_on_triangle(a, b, c);
        let point = a * w[0] + b * w[1] + c * w[2];
        let distance = point.length_squared();
        if best.map_or(true, |(_, d)| distance < d) {
            let mut weights = [0.0; 4];
            weights[face[0]] = w[0];
            weights[face[1]] = w[1];
            weights[face[2]] = w[2];
            best = Some((weights, distance));
        }
    }

    if !outside_any {
        return None;
    }
    best.map(|(weights, _)| weights)
}

impl GJK {
    /// Closest point of the simplex to the origin. Reduces the simplex to the
    /// vertices that support it and returns the point with its weights, or
    /// `None` when the simplex encloses the origin.
    fn closest_point(simplex: &mut Simplex) -> Option<(Vector3, Vec<f32>)> {
        let pts: Vec<Vector3> = simplex.get_points().iter().map(|p| p.point).collect();
        let weights: Vec<f32> = match pts.len() {
            1 => vec![1.0],
            2 => closest_on_segment(pts[0], pts[1]).to_vec(),
            3 => closest_on_triangle(pts[0], pts[1], pts[2]).to_vec(),
            4 => closest_on_tetrahedron([pts[0], pts[1], pts[2], pts[3]])?.to_vec(),
            _ => return None,
        };

        let point = pts
            .iter()
            .zip(&weights)
            .fold(Vector3::zero(), |acc, (p, w)| acc + *p * *w);

        simplex.retain(&weights);
        let weights: Vec<f32> = weights.into_iter().filter(|w| *w > 0.0).collect();
        Some((point, weights))
    }

    /// Finds the closest points between two convex proxies
    pub fn closest_points(a: &ConvexProxy, b: &ConvexProxy) -> GjkResult {
        let mut simplex = Simplex::new();

        let initial = a.transform.position - b.transform.position;
        let direction = initial.try_normalize().unwrap_or(Vector3::unit_x());
        simplex.add_point(SupportPoint::new(a, b, -direction));

        let mut last: Option<(Vector3, Vec<f32>)> = None;
        for _ in 0..MAX_ITERATIONS {
            let (v, weights) = match Self::closest_point(&mut simplex) {
                Some(result) => result,
                None => return GjkResult::Overlapping(simplex),
            };

            let dist_sq = v.length_squared();
            if dist_sq < OVERLAP_TOLERANCE {
                return GjkResult::Overlapping(simplex);
            }
            last = Some((v, weights));

            let w = SupportPoint::new(a, b, -v);
            // no further progress towards the origin
            if dist_sq - v.dot(&w.point) <= RELATIVE_TOLERANCE * dist_sq || simplex.contains(w.point) {
                break;
            }
            simplex.add_point(w);
        }

        // the last reduction may have added a point that was never weighed
        let (v, weights) = match last {
            Some(result) => result,
            None => return GjkResult::Overlapping(simplex),
        };
        let support = &simplex.get_points()[..weights.len()];

        let mut point_a = Vector3::zero();
        let mut point_b = Vector3::zero();
        for (p, w) in support.iter().zip(&weights) {
            point_a += p.on_a * *w;
            point_b += p.on_b * *w;
        }

        GjkResult::Separated {
            point_a,
            point_b,
            distance: v.length(),
        }
    }

    /// Whether two convex proxies overlap
    pub fn intersect(a: &ConvexProxy, b: &ConvexProxy) -> bool {
        matches!(Self::closest_points(a, b), GjkResult::Overlapping(_))
    }
}
