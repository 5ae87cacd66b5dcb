use crate::math::Vector3;
use crate::collision::gjk::{ConvexProxy, Simplex, SupportPoint};

/// Expanding Polytope Algorithm (EPA) for computing penetration depth
pub struct EPA;

/// Maximum number of iterations for the EPA algorithm
const MAX_ITERATIONS: usize = 64;

/// Convergence tolerance on the face distance
const EPSILON: f32 = 1e-5;

/// Result of a penetration query
#[derive(Debug, Clone, Copy)]
pub struct Penetration {
    /// Unit normal pointing from shape B towards shape A
    pub normal: Vector3,

    /// Penetration depth (positive)
    pub depth: f32,

    /// Deepest point of A inside B
    pub point_a: Vector3,

    /// Deepest point of B inside A
    pub point_b: Vector3,
}

/// A face of the polytope, wound so that its normal points outwards
#[derive(Debug, Clone)]
struct Face {
    vertices: [usize; 3],
    normal: Vector3,
    distance: f32,
}

/// Search directions used to inflate a degenerate starting simplex
const AXES: [Vector3; 6] = [
    Vector3::new(1.0, 0.0, 0.0),
    Vector3::new(-1.0, 0.0, 0.0),
    Vector3::new(0.0, 1.0, 0.0),
    Vector3::new(0.0, -1.0, 0.0),
    Vector3::new(0.0, 0.0, 1.0),
    Vector3::new(0.0, 0.0, -1.0),
];

impl EPA {
    /// Computes the penetration of two overlapping shapes, seeded with the
    /// final GJK simplex. Returns `None` when the polytope degenerates.
    pub fn penetration_depth(simplex: &Simplex, a: &ConvexProxy, b: &ConvexProxy) -> Option<Penetration> {
        let mut vertices: Vec<SupportPoint> = simplex.get_points().to_vec();
        Self::expand_simplex_to_tetrahedron(&mut vertices, a, b);
        if vertices.len() < 4 {
            return None;
        }

        let mut faces = Self::create_initial_faces(&vertices)?;

        for _ in 0..MAX_ITERATIONS {
            let closest = Self::find_closest_face(&faces)?;
            let face = faces[closest].clone();

            let support = SupportPoint::new(a, b, face.normal);
            let support_dist = support.point.dot(&face.normal);
            if support_dist - face.distance < EPSILON {
                return Some(Self::penetration_from_face(&vertices, &face));
            }

            vertices.push(support);
            let new_index = vertices.len() - 1;

            // Remove faces that can "see" the new point, keeping the horizon
            let mut edges: Vec<(usize, usize)> = Vec::new();
            let mut i = 0;
            while i < faces.len() {
                let f = &faces[i];
                let can_see = (support.point - vertices[f.vertices[0]].point).dot(&f.normal) > EPSILON;
                if can_see {
                    let [x, y, z] = f.vertices;
                    Self::add_edge(&mut edges, x, y);
                    Self::add_edge(&mut edges, y, z);
                    Self::add_edge(&mut edges, z, x);
                    faces.swap_remove(i);
                } else {
                    i += 1;
                }
            }

            if edges.is_empty() {
                return Some(Self::penetration_from_face(&vertices, &face));
            }

            for (i, j) in edges {
                if let Some(new_face) = Self::make_face(&vertices, i, j, new_index) {
                    faces.push(new_face);
                }
            }
        }

        // best estimate after running out of iterations
        let closest = Self::find_closest_face(&faces)?;
        Some(Self::penetration_from_face(&vertices, &faces[closest]))
    }

    fn penetration_from_face(vertices: &[SupportPoint], face: &Face) -> Penetration {
        let [ia, ib, ic] = face.vertices;
        let (a, b, c) = (vertices[ia], vertices[ib], vertices[ic]);
        let projected = face.normal * face.distance;
        let w = barycentric(projected, a.point, b.point, c.point);

        Penetration {
            normal: -face.normal,
            depth: face.distance.max(0.0),
            point_a: a.on_a * w[0] + b.on_a * w[1] + c.on_a * w[2],
            point_b: a.on_b * w[0] + b.on_b * w[1] + c.on_b * w[2],
        }
    }

    /// Grows the GJK simplex into a tetrahedron with non-zero volume
    fn expand_simplex_to_tetrahedron(vertices: &mut Vec<SupportPoint>, a: &ConvexProxy, b: &ConvexProxy) {
        if vertices.is_empty() {
            vertices.push(SupportPoint::new(a, b, AXES[0]));
        }

        if vertices.len() == 1 {
            for dir in AXES {
                let support = SupportPoint::new(a, b, dir);
                if (support.point - vertices[0].point).length_squared() > EPSILON {
                    vertices.push(support);
                    break;
                }
            }
        }

        if vertices.len() == 2 {
            let line = vertices[1].point - vertices[0].point;
            let mut best: Option<(SupportPoint, f32)> = None;
            for axis in [Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()] {
                let Some(dir) = line.cross(&axis).try_normalize() else { continue };
                for dir in [dir, -dir] {
                    let support = SupportPoint::new(a, b, dir);
                    let off_line = (support.point - vertices[0].point).cross(&line).length_squared();
                    if best.map_or(true, |(_, d)| off_line > d) {
                        best = Some((support, off_line));
                    }
                }
            }
            match best {
                Some((support, off_line)) if off_line > EPSILON => vertices.push(support),
                _ => return,
            }
        }

        if vertices.len() == 3 {
            let (p0, p1, p2) = (vertices[0].point, vertices[1].point, vertices[2].point);
            let Some(normal) = (p1 - p0).cross(&(p2 - p0)).try_normalize() else { return };
            let up = SupportPoint::new(a, b, normal);
            let down = SupportPoint::new(a, b, -normal);
            let up_dist = (up.point - p0).dot(&normal);
            let down_dist = -(down.point - p0).dot(&normal);
            let (support, dist) = if up_dist > down_dist { (up, up_dist) } else { (down, down_dist) };
            if dist > EPSILON {
                vertices.push(support);
            }
        }

        vertices.truncate(4);
    }

    fn create_initial_faces(vertices: &[SupportPoint]) -> Option<Vec<Face>> {
        let p: Vec<Vector3> = vertices.iter().map(|v| v.point).collect();
        let volume = (p[1] - p[0]).dot(&(p[2] - p[0]).cross(&(p[3] - p[0])));
        if volume.abs() < 1e-9 {
            return None;
        }

        // wind every face so that the fourth vertex lies behind it
        let order: [[usize; 3]; 4] = if volume > 0.0 {
            [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]]
        } else {
            [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]]
        };

        let faces: Vec<Face> = order
            .iter()
            .filter_map(|[i, j, k]| Self::make_face(vertices, *i, *j, *k))
            .collect();
        (faces.len() == 4).then_some(faces)
    }

    fn make_face(vertices: &[SupportPoint], a: usize, b: usize, c: usize) -> Option<Face> {
        let pa = vertices[a].point;
        let normal = (vertices[b].point - pa).cross(&(vertices[c].point - pa)).try_normalize()?;
        Some(Face {
            vertices: [a, b, c],
            normal,
            distance: normal.dot(&pa),
        })
    }

    fn find_closest_face(faces: &[Face]) -> Option<usize> {
        faces
            .iter()
            .enumerate()
            .min_by(|(_, x), (_, y)| x.distance.total_cmp(&y.distance))
            .map(|(i, _)| i)
    }

    /// Adds a directed edge; an edge shared with an already removed face
    /// cancels out, leaving only the horizon
    fn add_edge(edges: &mut Vec<(usize, usize)>, a: usize, b: usize) {
        if let Some(idx) = edges.iter().position(|&(x, y)| x == b && y == a) {
            edges.swap_remove(idx);
        } else {
            edges.push((a, b));
        }
    }
}

/// Barycentric coordinates of `p` with respect to triangle `abc`
fn barycentric(p: Vector3, a: Vector3, b: Vector3, c: Vector3) -> [f32; 3] {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f32::MIN_POSITIVE {
        return [1.0, 0.0, 0.0];
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    [1.0 - v - w, v, w]
}
