use std::f32::consts::TAU;

use crate::debug::{DebugDraw, SPHERE_SEGMENTS};
use crate::math::{Transform, Vector3};
use crate::shapes::{Axis, BoxShape, ShapeGeometry};

/// Half length of the cross drawn for an infinite plane
const PLANE_EXTENT: f32 = 100.0;

/// Segments used for shape rims and caps
const RIM_SEGMENTS: usize = 16;

/// Emits the wireframe of a shape placed at `transform`
pub fn draw_shape(drawer: &mut dyn DebugDraw, geometry: &ShapeGeometry, transform: &Transform, color: Vector3) {
    match geometry {
        ShapeGeometry::Box(b) => draw_box(drawer, b, transform, color),
        ShapeGeometry::Box2d(b) => draw_box(drawer, &b.as_box(), transform, color),
        ShapeGeometry::Sphere(s) => {
            let radius = s.get_radius();
            for (u, v) in [
                (Vector3::unit_x(), Vector3::unit_y()),
                (Vector3::unit_y(), Vector3::unit_z()),
                (Vector3::unit_z(), Vector3::unit_x()),
            ] {
                draw_circle(drawer, transform, Vector3::zero(), u * radius, v * radius, RIM_SEGMENTS, color);
            }
        }
        ShapeGeometry::Capsule(c) => {
            let (top, bottom) = c.segment();
            draw_tube(drawer, transform, c.get_axis(), top, bottom, c.get_radius(), c.get_radius(), color);
            let (u, v) = frame(c.get_axis());
            let r = c.get_radius();
            let up = c.get_axis().unit() * r;
            for side in [u, v] {
                draw_arc(drawer, transform, top, side * r, up, color);
                draw_arc(drawer, transform, bottom, side * r, -up, color);
            }
        }
        ShapeGeometry::Cylinder(c) => {
            let offset = c.get_axis().unit() * c.get_half_height();
            draw_tube(drawer, transform, c.get_axis(), offset, -offset, c.get_radius(), c.get_radius(), color);
        }
        ShapeGeometry::Cone(c) => {
            let base = c.get_axis().unit() * (-0.5 * c.get_height());
            draw_tube(drawer, transform, c.get_axis(), c.apex(), base, 0.0, c.get_radius(), color);
        }
        ShapeGeometry::StaticPlane(p) => {
            let normal = p.get_normal();
            let origin = normal * p.get_distance();
            let (u, v) = normal.plane_space();
            for (a, b) in [
                (origin - u * PLANE_EXTENT, origin + u * PLANE_EXTENT),
                (origin - v * PLANE_EXTENT, origin + v * PLANE_EXTENT),
                (origin, origin + normal),
            ] {
                drawer.draw_line(transform.transform_point(a), transform.transform_point(b), color);
            }
        }
    }
}

/// Three great circles of `radius` around `center`, in world space
pub(crate) fn draw_sphere(drawer: &mut dyn DebugDraw, center: Vector3, radius: f32, color: Vector3) {
    let placed = Transform::from_position(center);
    for (u, v) in [
        (Vector3::unit_x(), Vector3::unit_y()),
        (Vector3::unit_y(), Vector3::unit_z()),
        (Vector3::unit_z(), Vector3::unit_x()),
    ] {
        draw_circle(drawer, &placed, Vector3::zero(), u * radius, v * radius, SPHERE_SEGMENTS, color);
    }
}

fn draw_box(drawer: &mut dyn DebugDraw, shape: &BoxShape, transform: &Transform, color: Vector3) {
    let he = shape.get_half_extents();
    let corner = |i: usize| {
        transform.transform_point(Vector3::new(
            if i & 1 == 0 { -he.x } else { he.x },
            if i & 2 == 0 { -he.y } else { he.y },
            if i & 4 == 0 { -he.z } else { he.z },
        ))
    };
    for i in 0..8 {
        for bit in [1, 2, 4] {
            if i & bit == 0 {
                drawer.draw_line(corner(i), corner(i | bit), color);
            }
        }
    }
}

/// Two unit vectors spanning the plane across `axis`
fn frame(axis: Axis) -> (Vector3, Vector3) {
    (axis.canonical(Vector3::unit_x()), axis.canonical(Vector3::unit_z()))
}

/// Rims at `top` and `bottom` joined by four side lines
#[allow(clippy::too_many_arguments)]
fn draw_tube(
    drawer: &mut dyn DebugDraw,
    transform: &Transform,
    axis: Axis,
    top: Vector3,
    bottom: Vector3,
    top_radius: f32,
    bottom_radius: f32,
    color: Vector3,
) {
    let (u, v) = frame(axis);
    for (center, radius) in [(top, top_radius), (bottom, bottom_radius)] {
        if radius > 0.0 {
            draw_circle(drawer, transform, center, u * radius, v * radius, RIM_SEGMENTS, color);
        }
    }
    for side in [u, -u, v, -v] {
        drawer.draw_line(
            transform.transform_point(top + side * top_radius),
            transform.transform_point(bottom + side * bottom_radius),
            color,
        );
    }
}

/// Polygon through `center + cos·u + sin·v`
fn draw_circle(
    drawer: &mut dyn DebugDraw,
    transform: &Transform,
    center: Vector3,
    u: Vector3,
    v: Vector3,
    segments: usize,
    color: Vector3,
) {
    let point = |i: usize| {
        let (s, c) = (i as f32 / segments as f32 * TAU).sin_cos();
        transform.transform_point(center + u * c + v * s)
    };
    for i in 0..segments {
        drawer.draw_line(point(i), point(i + 1), color);
    }
}

/// Half circle from `center + side` over `center + up` to `center - side`
fn draw_arc(drawer: &mut dyn DebugDraw, transform: &Transform, center: Vector3, side: Vector3, up: Vector3, color: Vector3) {
    let half = RIM_SEGMENTS / 2;
    let point = |i: usize| {
        let (s, c) = (i as f32 / half as f32 * TAU * 0.5).sin_cos();
        transform.transform_point(center + side * c + up * s)
    };
    for i in 0..half {
        drawer.draw_line(point(i), point(i + 1), color);
    }
}
