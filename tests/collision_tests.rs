use rigid_sim::{
    PhysicsWorld,
    collision::{
        BroadPhase, BruteForceBroadPhase, CollisionPair, ContactManifold, ContactPoint, ConvexProxy,
        GJK, GjkResult, NarrowPhase, MAX_CONTACT_POINTS,
    },
    error::PhysicsError,
    math::{Quaternion, Ray, Transform, Vector3},
    shapes::{Axis, Shape, ShapeGeometry, ShapeType},
};
use approx::assert_relative_eq;
use std::sync::Arc;

const THRESHOLD: f32 = 0.02;

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vector3::new(x, y, z))
}

fn contacts(a: &Shape, ta: &Transform, b: &Shape, tb: &Transform) -> Vec<ContactPoint> {
    let mut warnings = Vec::new();
    let found = NarrowPhase::generate_contacts(a.get_geometry(), ta, b.get_geometry(), tb, THRESHOLD, &mut warnings);
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    found
}

#[test]
fn test_shape_constructors_validate() {
    assert!(matches!(Shape::new_sphere(-1.0), Err(PhysicsError::InvalidParameter(_))));
    assert!(Shape::new_sphere(f32::NAN).is_err());
    assert!(Shape::new_box(Vector3::new(1.0, -1.0, 1.0)).is_err());
    assert!(Shape::new_plane(Vector3::zero(), 0.0).is_err());
    assert!(Shape::new_capsule(Axis::Y, 0.5, f32::INFINITY).is_err());
    assert!(Shape::new_cone(Axis::X, -0.1, 1.0).is_err());

    let plane = Shape::new_plane(Vector3::new(0.0, 3.0, 0.0), 2.0).unwrap();
    match plane.get_geometry() {
        ShapeGeometry::StaticPlane(p) => assert_relative_eq!(p.get_normal(), Vector3::unit_y()),
        other => panic!("expected a plane, got {:?}", other),
    }
}

#[test]
fn test_shape_type_values() {
    let cases = [
        (Shape::new_box(Vector3::splat(1.0)).unwrap(), ShapeType::Box, 0),
        (Shape::new_box_2d(1.0, 1.0).unwrap(), ShapeType::Box2d, 17),
        (Shape::new_sphere(1.0).unwrap(), ShapeType::Sphere, 8),
        (Shape::new_capsule(Axis::Z, 0.5, 1.0).unwrap(), ShapeType::Capsule, 10),
        (Shape::new_cone(Axis::Y, 0.5, 1.0).unwrap(), ShapeType::Cone, 11),
        (Shape::new_cylinder(Axis::X, Vector3::splat(0.5)).unwrap(), ShapeType::Cylinder, 13),
        (Shape::new_plane(Vector3::unit_y(), 0.0).unwrap(), ShapeType::StaticPlane, 28),
    ];
    for (shape, kind, raw) in cases {
        assert_eq!(shape.shape_type(), kind);
        assert_eq!(kind.as_raw(), raw);
        assert_eq!(ShapeType::from_raw(raw), Some(kind));
    }
    assert_eq!(ShapeType::from_raw(3), None);
}

#[test]
fn test_shape_user_data_through_shared_handle() {
    let shape = Arc::new(Shape::new_sphere(1.0).unwrap());
    let alias = shape.clone();
    assert_eq!(shape.get_user_index(), 0);
    assert!(shape.get_user_pointer().is_null());

    let mut value = 3u32;
    alias.set_user_index(-9);
    alias.set_user_pointer(&mut value as *mut u32 as *mut std::ffi::c_void);
    assert_eq!(shape.get_user_index(), -9);
    assert_eq!(shape.get_user_pointer(), &mut value as *mut u32 as *mut std::ffi::c_void);
}

#[test]
fn test_local_inertia() {
    let cube = Shape::new_box(Vector3::new(0.5, 1.0, 1.5)).unwrap();
    // full lengths 1, 2, 3
    assert_relative_eq!(
        cube.get_geometry().local_inertia(12.0),
        Vector3::new(4.0 + 9.0, 1.0 + 9.0, 1.0 + 4.0),
        epsilon = 1e-5
    );

    let ball = Shape::new_sphere(2.0).unwrap();
    assert_relative_eq!(ball.get_geometry().local_inertia(5.0), Vector3::splat(0.4 * 5.0 * 4.0), epsilon = 1e-5);

    let plane = Shape::new_plane(Vector3::unit_y(), 0.0).unwrap();
    assert!(plane.get_geometry().local_inertia(1.0).is_zero());
}

#[test]
fn test_capsule_bounds_follow_axis() {
    for (axis, long) in [(Axis::X, 0), (Axis::Y, 1), (Axis::Z, 2)] {
        let capsule = Shape::new_capsule(axis, 0.5, 1.0).unwrap();
        let aabb = capsule.get_geometry().local_aabb();
        for i in 0..3 {
            let expected = if i == long { 1.0 } else { 0.5 };
            assert_relative_eq!(aabb.max[i], expected, epsilon = 1e-5);
            assert_relative_eq!(aabb.min[i], -expected, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_world_aabb_of_rotated_box() {
    let cube = Shape::new_box(Vector3::splat(1.0)).unwrap();
    let rotation = rigid_sim::Quaternion::from_axis_angle(Vector3::unit_z(), std::f32::consts::FRAC_PI_4);
    let aabb = cube.get_geometry().world_aabb(&Transform::new(Vector3::new(3.0, 0.0, 0.0), rotation));

    let reach = 2.0f32.sqrt();
    assert_relative_eq!(aabb.max, Vector3::new(3.0 + reach, reach, 1.0), epsilon = 1e-4);
    assert_relative_eq!(aabb.min, Vector3::new(3.0 - reach, -reach, -1.0), epsilon = 1e-4);
}

#[test]
fn test_shape_ray_casts() {
    let ray = Ray::from_segment(Vector3::new(-4.0, 0.0, 0.0), Vector3::new(4.0, 0.0, 0.0));

    let ball = Shape::new_sphere(1.0).unwrap();
    let hit = ball.get_geometry().ray_cast(&ray).expect("ray crosses the sphere");
    assert_relative_eq!(hit.fraction, 3.0 / 8.0, epsilon = 1e-5);
    assert_relative_eq!(hit.normal, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    assert!(hit.front_face);

    let cylinder = Shape::new_cylinder(Axis::Y, Vector3::new(1.0, 2.0, 1.0)).unwrap();
    let hit = cylinder.get_geometry().ray_cast(&ray).expect("ray crosses the cylinder");
    assert_relative_eq!(hit.fraction, 3.0 / 8.0, epsilon = 1e-4);

    let down = Ray::from_segment(Vector3::new(0.0, 5.0, 0.0), Vector3::new(0.0, -5.0, 0.0));
    let capsule = Shape::new_capsule(Axis::Y, 0.5, 2.0).unwrap();
    let hit = capsule.get_geometry().ray_cast(&down).expect("ray hits the capsule cap");
    assert_relative_eq!(hit.fraction, (5.0 - 1.5) / 10.0, epsilon = 1e-4);
    assert_relative_eq!(hit.normal, Vector3::unit_y(), epsilon = 1e-4);

    let inside = Ray::from_segment(Vector3::zero(), Vector3::new(4.0, 0.0, 0.0));
    assert!(ball.get_geometry().ray_cast(&inside).is_none());
}

#[test]
fn test_sphere_sphere_contact() {
    let ball = Shape::new_sphere(1.0).unwrap();
    let found = contacts(&ball, &at(0.0, 0.0, 0.0), &ball, &at(1.5, 0.0, 0.0));
    assert_eq!(found.len(), 1);

    let contact = found[0];
    assert_relative_eq!(contact.distance, -0.5, epsilon = 1e-5);
    assert_relative_eq!(contact.normal, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(contact.point_a, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(contact.point_b, Vector3::new(0.5, 0.0, 0.0), epsilon = 1e-5);

    assert!(contacts(&ball, &at(0.0, 0.0, 0.0), &ball, &at(2.5, 0.0, 0.0)).is_empty());
}

#[test]
fn test_plane_box_contacts() {
    let plane = Shape::new_plane(Vector3::unit_y(), 0.0).unwrap();
    let cube = Shape::new_box(Vector3::splat(0.5)).unwrap();
    let (plane_at, cube_at) = (Transform::identity(), at(0.0, 0.49, 0.0));

    let found = contacts(&plane, &plane_at, &cube, &cube_at);
    assert_eq!(found.len(), 4);
    for contact in &found {
        assert_relative_eq!(contact.distance, -0.01, epsilon = 1e-4);
        assert_relative_eq!(contact.normal, -Vector3::unit_y());
        assert_relative_eq!(contact.point_a.y, 0.0, epsilon = 1e-5);
    }

    // with the order swapped the normal still points from B to A
    let swapped = contacts(&cube, &cube_at, &plane, &plane_at);
    assert_eq!(swapped.len(), 4);
    for contact in &swapped {
        assert_relative_eq!(contact.normal, Vector3::unit_y());
        assert_relative_eq!(contact.point_b.y, 0.0, epsilon = 1e-5);
    }

    assert!(contacts(&plane, &plane_at, &cube, &at(0.0, 0.6, 0.0)).is_empty());
}

#[test]
fn test_plane_sphere_contact_uses_radius() {
    let plane = Shape::new_plane(Vector3::unit_y(), 1.0).unwrap();
    let ball = Shape::new_sphere(0.5).unwrap();

    let found = contacts(&plane, &Transform::identity(), &ball, &at(2.0, 1.4, 0.0));
    assert_eq!(found.len(), 1);
    assert_relative_eq!(found[0].distance, -0.1, epsilon = 1e-5);
    assert_relative_eq!(found[0].point_b, Vector3::new(2.0, 0.9, 0.0), epsilon = 1e-5);
}

#[test]
fn test_box_box_penetration() {
    let cube = Shape::new_box(Vector3::splat(0.5)).unwrap();
    let found = contacts(&cube, &at(0.9, 0.0, 0.0), &cube, &at(0.0, 0.0, 0.0));
    assert_eq!(found.len(), 4);
    for contact in &found {
        assert_relative_eq!(contact.distance, -0.1, epsilon = 1e-4);
        assert_relative_eq!(contact.normal, Vector3::unit_x(), epsilon = 1e-4);
        assert_relative_eq!(contact.point_a.x, 0.4, epsilon = 1e-4);
        assert_relative_eq!(contact.point_b.x, 0.5, epsilon = 1e-4);
    }
}

#[test]
fn test_box_face_contacts_cover_the_overlap() {
    let cube = Shape::new_box(Vector3::splat(0.5)).unwrap();
    let twisted = Transform::new(
        Vector3::new(0.0, 0.99, 0.0),
        Quaternion::from_axis_angle(Vector3::unit_y(), std::f32::consts::FRAC_PI_4),
    );

    // the clipped face is an octagon, cut down to four spread out corners
    let found = contacts(&cube, &twisted, &cube, &Transform::identity());
    assert_eq!(found.len(), MAX_CONTACT_POINTS);
    for contact in &found {
        assert_relative_eq!(contact.distance, -0.01, epsilon = 1e-4);
        assert_relative_eq!(contact.normal, Vector3::unit_y(), epsilon = 1e-4);
        assert!(contact.point_b.x.abs() <= 0.5 + 1e-4 && contact.point_b.z.abs() <= 0.5 + 1e-4);
    }
    let widest = found
        .iter()
        .flat_map(|a| found.iter().map(move |b| a.point_b.distance(&b.point_b)))
        .fold(0.0f32, f32::max);
    assert!(widest > 0.9, "contacts bunched together: {}", widest);

    // a smaller box on a larger one keeps all four of its corners
    let small = Shape::new_box(Vector3::new(0.2, 0.2, 0.2)).unwrap();
    let slab = Shape::new_box(Vector3::new(5.0, 0.5, 5.0)).unwrap();
    let found = contacts(&slab, &Transform::identity(), &small, &at(1.0, 0.695, -1.0));
    assert_eq!(found.len(), 4);
    for contact in &found {
        assert_relative_eq!(contact.distance, -0.005, epsilon = 1e-4);
        assert_relative_eq!(contact.normal, -Vector3::unit_y(), epsilon = 1e-4);
        assert_relative_eq!(contact.point_a.y, 0.5, epsilon = 1e-4);
    }
}

#[test]
fn test_plane_cylinder_contacts_are_capped() {
    let plane = Shape::new_plane(Vector3::unit_y(), 0.0).unwrap();
    let cylinder = Shape::new_cylinder(Axis::Y, Vector3::splat(0.5)).unwrap();
    let resting = at(0.0, 0.49, 0.0);

    let found = contacts(&plane, &Transform::identity(), &cylinder, &resting);
    assert_eq!(found.len(), MAX_CONTACT_POINTS);
    for contact in &found {
        assert_relative_eq!(contact.distance, -0.01, epsilon = 1e-4);
        assert_relative_eq!(contact.normal, -Vector3::unit_y());
    }
    let widest = found
        .iter()
        .flat_map(|a| found.iter().map(move |b| a.point_b.distance(&b.point_b)))
        .fold(0.0f32, f32::max);
    assert_relative_eq!(widest, 1.0, epsilon = 1e-4);

    // the same rim points are picked every time
    assert_eq!(found, contacts(&plane, &Transform::identity(), &cylinder, &resting));
}

#[test]
fn test_box_box_near_miss_within_threshold() {
    let cube = Shape::new_box(Vector3::splat(0.5)).unwrap();
    let found = contacts(&cube, &at(0.0, 1.01, 0.0), &cube, &at(0.0, 0.0, 0.0));
    assert_eq!(found.len(), 4);
    for contact in &found {
        assert_relative_eq!(contact.distance, 0.01, epsilon = 1e-4);
        assert_relative_eq!(contact.normal, Vector3::unit_y(), epsilon = 1e-4);
    }

    assert!(contacts(&cube, &at(0.0, 1.1, 0.0), &cube, &at(0.0, 0.0, 0.0)).is_empty());
}

#[test]
fn test_capsule_sphere_contact() {
    let capsule = Shape::new_capsule(Axis::X, 0.5, 2.0).unwrap();
    let ball = Shape::new_sphere(0.5).unwrap();
    let found = contacts(&capsule, &Transform::identity(), &ball, &at(0.5, 0.9, 0.0));
    assert_eq!(found.len(), 1);
    assert_relative_eq!(found[0].distance, -0.1, epsilon = 1e-3);
    assert_relative_eq!(found[0].normal, -Vector3::unit_y(), epsilon = 1e-3);
}

#[test]
fn test_gjk_distance_and_intersection() {
    let cube = Shape::new_box(Vector3::splat(1.0)).unwrap();
    let (ta, tb) = (at(0.0, 0.0, 0.0), at(3.0, 0.5, 0.0));
    let a = ConvexProxy::full(cube.get_geometry(), &ta);
    let b = ConvexProxy::full(cube.get_geometry(), &tb);

    match GJK::closest_points(&a, &b) {
        GjkResult::Separated { distance, point_a, point_b } => {
            assert_relative_eq!(distance, 1.0, epsilon = 1e-4);
            assert_relative_eq!(point_a.x, 1.0, epsilon = 1e-4);
            assert_relative_eq!(point_b.x, 2.0, epsilon = 1e-4);
        }
        GjkResult::Overlapping(_) => panic!("boxes are apart"),
    }
    assert!(!GJK::intersect(&a, &b));

    let tc = at(1.5, 0.5, 0.5);
    let c = ConvexProxy::full(cube.get_geometry(), &tc);
    assert!(GJK::intersect(&a, &c));
}

fn pair_of_bodies() -> (PhysicsWorld, CollisionPair) {
    let mut world = PhysicsWorld::new();
    let ball = Arc::new(Shape::new_sphere(1.0).unwrap());
    let a = world.create_body(1.0, Transform::identity(), ball.clone()).unwrap();
    let b = world.create_body(1.0, Transform::identity(), ball).unwrap();
    (world, CollisionPair::new(b, a))
}

#[test]
fn test_collision_pair_is_ordered() {
    let (world, pair) = pair_of_bodies();
    let handles = world.body_handles();
    assert_eq!(pair, CollisionPair::new(handles[0], handles[1]));
    assert_eq!(pair.body_a, handles[0]);
    assert_eq!(pair.other(handles[0]), Some(handles[1]));
    assert!(pair.contains(handles[1]));
}

fn point(x: f32, z: f32, distance: f32) -> ContactPoint {
    ContactPoint {
        point_a: Vector3::new(x, distance, z),
        point_b: Vector3::new(x, 0.0, z),
        normal: Vector3::unit_y(),
        distance,
    }
}

#[test]
fn test_manifold_merges_and_caps_points() {
    let (_world, pair) = pair_of_bodies();
    let identity = Transform::identity();
    let mut manifold = ContactManifold::new(pair, THRESHOLD);

    manifold.add_contact(&point(0.0, 0.0, -0.01), &identity, &identity);
    manifold.add_contact(&point(0.001, 0.0, -0.02), &identity, &identity);
    assert_eq!(manifold.len(), 1);
    assert_relative_eq!(manifold.get_points()[0].distance, -0.02);

    for (x, z) in [(1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
        manifold.add_contact(&point(x, z, -0.005), &identity, &identity);
    }
    assert_eq!(manifold.len(), MAX_CONTACT_POINTS);

    // the deepest point survives replacement
    manifold.add_contact(&point(0.5, 0.5, -0.001), &identity, &identity);
    assert_eq!(manifold.len(), MAX_CONTACT_POINTS);
    assert!(manifold.get_points().iter().any(|p| p.distance == -0.02));
}

#[test]
fn test_manifold_refresh_drops_separated_points() {
    let (_world, pair) = pair_of_bodies();
    let identity = Transform::identity();
    let mut manifold = ContactManifold::new(pair, THRESHOLD);
    manifold.add_contact(&point(0.0, 0.0, -0.01), &identity, &identity);

    manifold.refresh_contact_points(&identity, &identity);
    assert_eq!(manifold.len(), 1);
    assert_eq!(manifold.get_points()[0].lifetime, 1);

    // A moves away along the normal beyond the breaking threshold
    manifold.refresh_contact_points(&at(0.0, 0.1, 0.0), &identity);
    assert!(manifold.is_empty());

    manifold.add_contact(&point(0.0, 0.0, -0.01), &identity, &identity);
    // sliding sideways too far also breaks the contact
    manifold.refresh_contact_points(&at(0.5, 0.0, 0.0), &identity);
    assert!(manifold.is_empty());
}

#[test]
fn test_broad_phase_pairs_and_filters() {
    let mut world = PhysicsWorld::new();
    let ball = Arc::new(Shape::new_sphere(1.0).unwrap());
    let a = world.create_body(1.0, at(0.0, 0.0, 0.0), ball.clone()).unwrap();
    let b = world.create_body(1.0, at(1.5, 0.0, 0.0), ball.clone()).unwrap();
    world.create_body(1.0, at(10.0, 0.0, 0.0), ball.clone()).unwrap();
    // static bodies never pair with each other
    world.create_body(0.0, at(0.0, 1.0, 0.0), ball.clone()).unwrap();
    world.create_body(0.0, at(0.0, 1.5, 0.0), ball).unwrap();

    let bodies: Vec<_> = world.bodies().collect();
    let mut broad_phase = BruteForceBroadPhase::new();
    broad_phase.update(&bodies, 0.04);
    let pairs = broad_phase.get_collision_pairs();

    assert!(pairs.contains(&CollisionPair::new(a, b)));
    let handles = world.body_handles();
    assert!(!pairs.contains(&CollisionPair::new(handles[3], handles[4])));
    assert!(!pairs.iter().any(|p| p.contains(handles[2])));
    // a and b each touch both static spheres
    assert_eq!(pairs.len(), 5);
}
