use rigid_sim::{
    PhysicsWorld, RigidBodyType, AnisotropicFrictionMode, BodyHandle, CollisionFilterGroups,
    RayCastFlags, SimulationConfig,
    error::PhysicsError,
    math::{Vector3, Transform, Quaternion},
    shapes::{Shape, SharedShape},
};
use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

const H: f32 = 1.0 / 60.0;

fn sphere(radius: f32) -> SharedShape {
    Arc::new(Shape::new_sphere(radius).unwrap())
}

fn cube(half: f32) -> SharedShape {
    Arc::new(Shape::new_box(Vector3::splat(half)).unwrap())
}

fn ground_plane() -> SharedShape {
    Arc::new(Shape::new_plane(Vector3::unit_y(), 0.0).unwrap())
}

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vector3::new(x, y, z))
}

fn world_with_gravity() -> PhysicsWorld {
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vector3::new(0.0, -9.8, 0.0)).unwrap();
    world
}

fn run(world: &mut PhysicsWorld, steps: usize) {
    for _ in 0..steps {
        world.step_simulation(H, 1, H).unwrap();
    }
}

#[test]
fn test_rigid_body_creation() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(2.0, at(0.0, 10.0, 0.0), sphere(0.5)).unwrap();

    let body = world.get_body(handle).unwrap();
    assert_eq!(body.get_position(), Vector3::new(0.0, 10.0, 0.0));
    assert_eq!(body.get_body_type(), RigidBodyType::Dynamic);
    assert_eq!(body.get_mass(), 2.0);
    assert_relative_eq!(body.get_inverse_mass(), 0.5);
    assert_relative_eq!(body.get_local_inertia(), Vector3::splat(0.4 * 2.0 * 0.25));
    assert!(body.get_linear_velocity().is_zero());
    assert_eq!(body.get_collision_group(), CollisionFilterGroups::DEFAULT);
    assert_eq!(body.get_collision_mask(), CollisionFilterGroups::ALL);
    assert_relative_eq!(body.get_friction(), 0.5);
    assert_eq!(body.get_restitution(), 0.0);

    let ground = world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let ground = world.get_body(ground).unwrap();
    assert_eq!(ground.get_body_type(), RigidBodyType::Static);
    assert_eq!(ground.get_inverse_mass(), 0.0);
    assert!(ground.get_inverse_inertia_local().is_zero());
    assert_eq!(ground.get_collision_group(), CollisionFilterGroups::STATIC);
    assert!(!ground.get_collision_mask().contains(CollisionFilterGroups::STATIC));
}

#[test]
fn test_body_creation_rejects_invalid_input() {
    let mut world = PhysicsWorld::new();

    let negative = world.create_body(-1.0, Transform::identity(), sphere(1.0));
    assert!(matches!(negative, Err(PhysicsError::InvalidParameter(_))));

    let nan = world.create_body(f32::NAN, Transform::identity(), sphere(1.0));
    assert!(matches!(nan, Err(PhysicsError::InvalidParameter(_))));

    let bad_transform = world.create_body(1.0, at(f32::INFINITY, 0.0, 0.0), sphere(1.0));
    assert!(matches!(bad_transform, Err(PhysicsError::InvalidParameter(_))));

    let dynamic_plane = world.create_body(1.0, Transform::identity(), ground_plane());
    assert!(matches!(dynamic_plane, Err(PhysicsError::UnsupportedShape(_))));

    assert_eq!(world.body_count(), 0);
}

#[test]
fn test_static_body_ignores_forces_and_impulses() {
    let mut world = world_with_gravity();
    let handle = world.create_body(0.0, at(0.0, 1.0, 0.0), cube(0.5)).unwrap();

    {
        let body = world.get_body_mut(handle).unwrap();
        let v = Vector3::new(1.0, 2.0, 3.0);
        body.apply_central_force(v);
        body.apply_force(v, Vector3::unit_x());
        body.apply_torque(v);
        body.apply_central_impulse(v);
        body.apply_impulse(v, Vector3::unit_y());
        body.apply_torque_impulse(v);
        body.apply_central_push_impulse(v);
        body.apply_push_impulse(v, Vector3::unit_z());
        body.apply_torque_turn_impulse(v);

        assert!(body.get_total_force().is_zero());
        assert!(body.get_total_torque().is_zero());
    }

    run(&mut world, 30);

    let body = world.get_body(handle).unwrap();
    assert!(body.get_linear_velocity().is_zero());
    assert!(body.get_angular_velocity().is_zero());
    assert_eq!(body.get_position(), Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn test_gravity_free_fall() {
    let mut world = world_with_gravity();
    let handle = world.create_body(1.0, at(0.0, 100.0, 0.0), sphere(0.5)).unwrap();

    let mut executed = 0;
    for _ in 0..60 {
        executed += world.step_simulation(H, 1, H).unwrap();
    }
    assert_eq!(executed, 60);

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity().y, -9.8 * 60.0 * H, epsilon = 1e-3);

    // semi-implicit Euler: velocity first, then position
    let expected_drop = 9.8 * H * H * (60.0 * 61.0 / 2.0);
    assert_relative_eq!(body.get_position().y, 100.0 - expected_drop, epsilon = 1e-2);
}

#[test]
fn test_clear_forces() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(1.0, Transform::identity(), cube(0.5)).unwrap();
    let body = world.get_body_mut(handle).unwrap();

    body.apply_force(Vector3::new(0.0, 0.0, 3.0), Vector3::new(1.0, 0.0, 0.0));
    body.apply_torque(Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(body.get_total_force(), Vector3::new(0.0, 0.0, 3.0));
    assert_eq!(body.get_total_torque(), Vector3::new(1.0, -3.0, 0.0));

    body.clear_forces();
    assert!(body.get_total_force().is_zero());
    assert!(body.get_total_torque().is_zero());
}

#[test]
fn test_forces_are_consumed_by_a_sub_step() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(2.0, Transform::identity(), sphere(0.5)).unwrap();
    world.get_body_mut(handle).unwrap().apply_central_force(Vector3::new(4.0, 0.0, 0.0));

    world.step_simulation(H, 1, H).unwrap();
    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity().x, 2.0 * H, epsilon = 1e-6);
    assert!(body.get_total_force().is_zero());
}

#[test]
fn test_impulses() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(1.0, Transform::identity(), sphere(1.0)).unwrap();
    let body = world.get_body_mut(handle).unwrap();

    body.apply_impulse(Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0));
    assert_relative_eq!(body.get_linear_velocity(), Vector3::new(0.0, 0.0, 1.0));
    // r × i = (0, -1, 0), inverse inertia 1 / 0.4
    assert_relative_eq!(body.get_angular_velocity(), Vector3::new(0.0, -2.5, 0.0), epsilon = 1e-5);

    body.apply_central_push_impulse(Vector3::new(2.0, 0.0, 0.0));
    body.apply_torque_turn_impulse(Vector3::new(0.4, 0.0, 0.0));
    assert_relative_eq!(body.get_push_velocity(), Vector3::new(2.0, 0.0, 0.0));
    assert_relative_eq!(body.get_turn_velocity(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_push_velocity_moves_once() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(1.0, Transform::identity(), sphere(0.5)).unwrap();
    world.get_body_mut(handle).unwrap().set_push_velocity(Vector3::new(6.0, 0.0, 0.0)).unwrap();

    run(&mut world, 3);

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_position().x, 6.0 * H, epsilon = 1e-5);
    assert!(body.get_push_velocity().is_zero());
    assert!(body.get_linear_velocity().is_zero());
}

#[test]
fn test_velocity_round_trip_is_exact() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(1.0, Transform::identity(), cube(0.5)).unwrap();
    let body = world.get_body_mut(handle).unwrap();

    let v = Vector3::new(0.1, -3.7, 1.0e-7);
    body.set_linear_velocity(v).unwrap();
    body.set_angular_velocity(v * 2.0).unwrap();
    body.set_push_velocity(v * 3.0).unwrap();
    body.set_turn_velocity(v * 4.0).unwrap();

    assert_eq!(body.get_linear_velocity(), v);
    assert_eq!(body.get_angular_velocity(), v * 2.0);
    assert_eq!(body.get_push_velocity(), v * 3.0);
    assert_eq!(body.get_turn_velocity(), v * 4.0);

    assert!(body.set_linear_velocity(Vector3::new(f32::NAN, 0.0, 0.0)).is_err());
    assert_eq!(body.get_linear_velocity(), v);
}

#[test]
fn test_material_setters() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(1.0, Transform::identity(), cube(0.5)).unwrap();
    let body = world.get_body_mut(handle).unwrap();

    body.set_friction(0.8).unwrap();
    body.set_rolling_friction(0.1).unwrap();
    body.set_spinning_friction(0.2).unwrap();
    body.set_restitution(0.3).unwrap();
    body.set_anisotropic_friction(Vector3::new(1.0, 0.5, 0.25), AnisotropicFrictionMode::Friction).unwrap();

    assert_eq!(body.get_friction(), 0.8);
    assert_eq!(body.get_rolling_friction(), 0.1);
    assert_eq!(body.get_spinning_friction(), 0.2);
    assert_eq!(body.get_restitution(), 0.3);
    assert_eq!(body.get_anisotropic_friction(), Vector3::new(1.0, 0.5, 0.25));
    assert_eq!(body.get_anisotropic_friction_mode(), AnisotropicFrictionMode::Friction);

    assert!(!body.has_contact_stiffness_and_damping());
    body.set_contact_stiffness_and_damping(3000.0, 0.5).unwrap();
    assert!(body.has_contact_stiffness_and_damping());
    assert_eq!(body.get_contact_stiffness(), 3000.0);
    assert_eq!(body.get_contact_damping(), 0.5);
    assert!(body.set_contact_stiffness_and_damping(0.0, 0.5).is_err());
    assert!(body.set_contact_stiffness_and_damping(10.0, -1.0).is_err());

    body.set_damping(0.1, 0.2).unwrap();
    assert_eq!(body.get_linear_damping(), 0.1);
    assert_eq!(body.get_angular_damping(), 0.2);
    assert!(body.set_damping(1.5, 0.0).is_err());
    assert_eq!(body.get_linear_damping(), 0.1);
}

#[test]
fn test_set_mass_props() {
    let mut world = world_with_gravity();
    let handle = world.create_body(0.0, at(0.0, 5.0, 0.0), cube(0.5)).unwrap();

    world.get_body_mut(handle).unwrap().set_mass_props(2.0, Vector3::new(1.0, 0.0, 4.0)).unwrap();
    {
        let body = world.get_body(handle).unwrap();
        assert_eq!(body.get_body_type(), RigidBodyType::Dynamic);
        assert_eq!(body.get_inverse_mass(), 0.5);
        assert_eq!(body.get_inverse_inertia_local(), Vector3::new(1.0, 0.0, 0.25));
    }

    run(&mut world, 10);
    assert!(world.get_body(handle).unwrap().get_position().y < 5.0);

    let body = world.get_body_mut(handle).unwrap();
    body.set_mass_props(0.0, Vector3::zero()).unwrap();
    assert!(body.is_static());
    assert!(body.set_mass_props(-2.0, Vector3::zero()).is_err());
}

#[test]
fn test_mass_change_refreshes_default_filter() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let crate_box = world.create_body(0.0, at(0.0, 2.0, 0.0), cube(0.5)).unwrap();
    let tagged = world.create_body(0.0, at(3.0, 2.0, 0.0), cube(0.5)).unwrap();

    {
        let body = world.get_body_mut(crate_box).unwrap();
        assert_eq!(body.get_collision_group(), CollisionFilterGroups::STATIC);
        body.set_mass_props(1.0, Vector3::splat(1.0 / 6.0)).unwrap();
        assert_eq!(body.get_collision_group(), CollisionFilterGroups::DEFAULT);
        assert_eq!(body.get_collision_mask(), CollisionFilterGroups::ALL);
    }
    {
        let body = world.get_body_mut(tagged).unwrap();
        body.set_collision_filter(CollisionFilterGroups::CHARACTER, CollisionFilterGroups::ALL);
        body.set_mass_props(1.0, Vector3::splat(1.0 / 6.0)).unwrap();
        assert_eq!(body.get_collision_group(), CollisionFilterGroups::CHARACTER);
    }

    // the former static box now lands on the ground instead of falling through it
    run(&mut world, 180);
    assert_relative_eq!(world.get_body(crate_box).unwrap().get_position().y, 0.5, epsilon = 0.05);

    let body = world.get_body_mut(crate_box).unwrap();
    body.set_mass_props(0.0, Vector3::zero()).unwrap();
    assert_eq!(body.get_collision_group(), CollisionFilterGroups::STATIC);
    assert_eq!(body.get_collision_mask(), CollisionFilterGroups::ALL ^ CollisionFilterGroups::STATIC);
}

#[test]
fn test_damping_decays_velocity() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(1.0, Transform::identity(), sphere(0.5)).unwrap();
    {
        let body = world.get_body_mut(handle).unwrap();
        body.set_damping(0.5, 0.5).unwrap();
        body.set_linear_velocity(Vector3::new(2.0, 0.0, 0.0)).unwrap();
        body.set_angular_velocity(Vector3::new(0.0, 1.0, 0.0)).unwrap();
    }

    run(&mut world, 60);

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity().x, 1.0, epsilon = 1e-3);
    assert_relative_eq!(body.get_angular_velocity().y, 0.5, epsilon = 1e-3);
}

#[test]
fn test_shared_shape_survives_body_destruction() {
    let mut world = PhysicsWorld::new();
    let shape = cube(0.5);
    shape.set_user_index(7);

    let a = world.create_body(1.0, at(0.0, 0.0, 0.0), shape.clone()).unwrap();
    let b = world.create_body(1.0, at(5.0, 0.0, 0.0), shape.clone()).unwrap();
    assert_eq!(Arc::strong_count(&shape), 3);

    world.destroy_body(a).unwrap();
    assert_eq!(Arc::strong_count(&shape), 2);

    let remaining = world.get_body(b).unwrap().get_shape();
    assert!(Arc::ptr_eq(remaining, &shape));
    assert_eq!(remaining.get_user_index(), 7);
}

#[test]
fn test_set_shape_keeps_mass() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(3.0, Transform::identity(), cube(0.5)).unwrap();
    let body = world.get_body_mut(handle).unwrap();
    let inertia = body.get_local_inertia();

    let replacement = sphere(2.0);
    body.set_shape(replacement.clone());
    assert!(Arc::ptr_eq(body.get_shape(), &replacement));
    assert_eq!(body.get_mass(), 3.0);
    assert_eq!(body.get_local_inertia(), inertia);
}

#[test]
fn test_stale_and_foreign_handles_are_rejected() {
    let mut world = PhysicsWorld::new();
    let mut other = PhysicsWorld::new();
    assert_ne!(world.get_id(), other.get_id());

    let handle = world.create_body(1.0, Transform::identity(), sphere(1.0)).unwrap();
    let foreign = other.create_body(1.0, Transform::identity(), sphere(1.0)).unwrap();

    assert!(matches!(world.get_body(foreign), Err(PhysicsError::InvalidHandle(_))));
    assert!(matches!(other.destroy_body(handle), Err(PhysicsError::InvalidHandle(_))));

    world.destroy_body(handle).unwrap();
    assert!(matches!(world.get_body(handle), Err(PhysicsError::InvalidHandle(_))));
    assert!(matches!(world.destroy_body(handle), Err(PhysicsError::InvalidHandle(_))));

    // the freed slot is reused, but the old handle still does not resolve
    let reused = world.create_body(1.0, Transform::identity(), sphere(1.0)).unwrap();
    assert_eq!(reused.index(), handle.index());
    assert_ne!(reused, handle);
    assert!(world.get_body(handle).is_err());
    assert!(world.get_body(reused).is_ok());
}

#[test]
fn test_body_handles_in_creation_order() {
    let mut world = PhysicsWorld::new();
    let handles: Vec<BodyHandle> = (0..5)
        .map(|i| world.create_body(1.0, at(i as f32 * 3.0, 0.0, 0.0), sphere(1.0)).unwrap())
        .collect();

    world.destroy_body(handles[1]).unwrap();
    let late = world.create_body(1.0, Transform::identity(), sphere(1.0)).unwrap();

    let expected = vec![handles[0], handles[2], handles[3], handles[4], late];
    assert_eq!(world.body_handles(), expected.as_slice());
    assert_eq!(world.body_count(), 5);
}

#[test]
fn test_sub_step_clamp() {
    let mut world = world_with_gravity();
    world.create_body(1.0, Transform::identity(), sphere(1.0)).unwrap();

    let steps = world.step_simulation(0.1, 4, 1.0 / 60.0).unwrap();
    assert!(steps <= 4);
    assert_eq!(steps, 4);
    // the clamped surplus is dropped, not carried
    assert!(world.get_local_time() < 1.0 / 60.0);
}

#[test]
fn test_accumulator_carry_over() {
    let mut world = PhysicsWorld::new();
    let fixed = 0.25;

    assert_eq!(world.step_simulation(fixed / 2.0, 1, fixed).unwrap(), 0);
    assert_relative_eq!(world.get_local_time(), fixed / 2.0);
    assert_eq!(world.step_simulation(fixed / 2.0, 1, fixed).unwrap(), 1);
    assert_relative_eq!(world.get_local_time(), 0.0);
}

#[test]
fn test_variable_step_mode() {
    let mut world = world_with_gravity();
    let handle = world.create_body(1.0, Transform::identity(), sphere(1.0)).unwrap();

    assert_eq!(world.step_simulation(0.05, 0, 0.0).unwrap(), 1);
    assert_relative_eq!(world.get_body(handle).unwrap().get_linear_velocity().y, -0.49, epsilon = 1e-5);
    assert_eq!(world.get_local_time(), 0.0);

    assert_eq!(world.step_simulation(0.0, 0, 0.0).unwrap(), 0);
}

#[test]
fn test_invalid_step_parameters() {
    let mut world = PhysicsWorld::new();
    assert!(matches!(world.step_simulation(-1.0, 1, H), Err(PhysicsError::InvalidParameter(_))));
    assert!(matches!(world.step_simulation(f32::NAN, 1, H), Err(PhysicsError::InvalidParameter(_))));
    assert!(matches!(world.step_simulation(H, 1, 0.0), Err(PhysicsError::InvalidParameter(_))));
    assert!(matches!(world.step_simulation(H, 1, f32::INFINITY), Err(PhysicsError::InvalidParameter(_))));
    assert!(world.set_gravity(Vector3::new(0.0, f32::NAN, 0.0)).is_err());
    assert_eq!(world.get_local_time(), 0.0);
}

#[test]
fn test_step_uses_config_defaults() {
    let config = SimulationConfig {
        fixed_time_step: 0.01,
        max_sub_steps: 3,
        ..SimulationConfig::default()
    };
    let mut world = PhysicsWorld::with_config(config);
    assert_eq!(world.step(0.025).unwrap(), 2);
    assert_eq!(world.step(1.0).unwrap(), 3);
}

#[test]
fn test_graphics_transform_extrapolation() {
    let mut world = PhysicsWorld::new();
    let handle = world.create_body(1.0, Transform::identity(), sphere(0.5)).unwrap();
    world.get_body_mut(handle).unwrap().set_linear_velocity(Vector3::new(1.0, 0.0, 0.0)).unwrap();

    let fixed = 0.125;
    world.step_simulation(fixed * 1.5, 1, fixed).unwrap();

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_world_transform().position.x, fixed, epsilon = 1e-6);
    assert_relative_eq!(body.get_graphics_transform().position.x, fixed * 1.5, epsilon = 1e-6);
}

#[test]
fn test_spheres_rest_on_plane() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let a = world.create_body(1.0, at(0.0, 2.0, 0.0), sphere(0.5)).unwrap();
    let b = world.create_body(1.0, at(3.0, 1.0, 0.0), sphere(0.5)).unwrap();

    run(&mut world, 240);

    for handle in [a, b] {
        let body = world.get_body(handle).unwrap();
        let penetration = 0.5 - body.get_position().y;
        assert!(penetration.abs() < 0.05, "penetration {}", penetration);
        assert!(body.get_linear_velocity().length() < 0.05, "velocity {}", body.get_linear_velocity());
    }
}

#[test]
fn test_boxes_rest_on_plane() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let a = world.create_body(1.0, at(0.0, 1.0, 0.0), cube(0.5)).unwrap();
    let b = world.create_body(2.0, at(4.0, 0.6, 0.0), cube(0.5)).unwrap();

    run(&mut world, 240);

    for handle in [a, b] {
        let body = world.get_body(handle).unwrap();
        let penetration = 0.5 - body.get_position().y;
        assert!(penetration.abs() < 0.05, "penetration {}", penetration);
        assert!(body.get_linear_velocity().length() < 0.05);
        assert!(body.get_angular_velocity().length() < 0.1);
    }

    let contacts: usize = world.get_contact_manifolds().map(|m| m.len()).sum();
    assert!(contacts >= 2);
}

#[test]
fn test_restitution_bounces() {
    let mut world = world_with_gravity();
    let ground = world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let ball = world.create_body(1.0, at(0.0, 2.0, 0.0), sphere(0.5)).unwrap();
    world.get_body_mut(ground).unwrap().set_restitution(1.0).unwrap();
    world.get_body_mut(ball).unwrap().set_restitution(1.0).unwrap();

    let mut max_upward = 0.0f32;
    for _ in 0..90 {
        world.step_simulation(H, 1, H).unwrap();
        max_upward = max_upward.max(world.get_body(ball).unwrap().get_linear_velocity().y);
    }
    assert!(max_upward > 2.0, "ball never bounced: {}", max_upward);
}

fn slide_box(configure: impl Fn(&mut rigid_sim::RigidBody)) -> Vector3 {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let handle = world.create_body(1.0, at(0.0, 0.5, 0.0), cube(0.5)).unwrap();
    {
        let body = world.get_body_mut(handle).unwrap();
        configure(body);
        body.set_linear_velocity(Vector3::new(3.0, 0.0, 0.0)).unwrap();
    }
    run(&mut world, 60);
    world.get_body(handle).unwrap().get_position()
}

#[test]
fn test_disabled_anisotropic_friction_matches_isotropic() {
    let isotropic = slide_box(|_| {});
    let disabled = slide_box(|body| {
        body.set_anisotropic_friction(Vector3::new(0.1, 1.0, 5.0), AnisotropicFrictionMode::Disabled)
            .unwrap();
    });
    assert_eq!(isotropic, disabled);

    // friction slowed the box down
    assert!(isotropic.x < 3.0 * 60.0 * H);
    assert!(isotropic.x > 0.0);
}

#[test]
fn test_friction_stops_sliding() {
    let frictionless = slide_box(|body| body.set_friction(0.0).unwrap());
    let rough = slide_box(|body| body.set_friction(1.0).unwrap());
    assert!(rough.x < frictionless.x);
    assert_relative_eq!(frictionless.x, 3.0, epsilon = 0.1);
}

#[test]
fn test_collision_filter_lets_bodies_pass() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let ghost = world.create_body(1.0, at(0.0, 1.0, 0.0), sphere(0.5)).unwrap();
    world
        .get_body_mut(ghost)
        .unwrap()
        .set_collision_filter(CollisionFilterGroups::DEBRIS, CollisionFilterGroups::ALL ^ CollisionFilterGroups::STATIC);

    run(&mut world, 60);
    assert!(world.get_body(ghost).unwrap().get_position().y < -1.0);
    assert_eq!(world.get_contact_manifolds().count(), 0);
}

#[test]
fn test_destroy_body_removes_contacts() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let ball = world.create_body(1.0, at(0.0, 0.5, 0.0), sphere(0.5)).unwrap();

    run(&mut world, 10);
    assert!(world.get_contact_manifolds().any(|m| m.pair.contains(ball)));

    world.destroy_body(ball).unwrap();
    assert!(!world.get_contact_manifolds().any(|m| m.pair.contains(ball)));
    run(&mut world, 2);
}

#[test]
fn test_sphere_stack_settles() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let lower = world.create_body(1.0, at(0.0, 0.5, 0.0), sphere(0.5)).unwrap();
    let upper = world.create_body(1.0, at(0.0, 1.5, 0.0), sphere(0.5)).unwrap();

    run(&mut world, 120);

    let lower_y = world.get_body(lower).unwrap().get_position().y;
    let upper_y = world.get_body(upper).unwrap().get_position().y;
    assert!((lower_y - 0.5).abs() < 0.05);
    assert!((upper_y - lower_y - 1.0).abs() < 0.05);
}

fn assert_at_rest(world: &PhysicsWorld, handle: BodyHandle) {
    let body = world.get_body(handle).unwrap();
    let (linear, angular) = (body.get_linear_velocity(), body.get_angular_velocity());
    assert!(linear.length() < 0.02, "{:?} still moving at {}", handle, linear);
    assert!(angular.length() < 0.05, "{:?} still turning at {}", handle, angular);
}

#[test]
fn test_box_rests_on_static_box() {
    let mut world = world_with_gravity();
    let slab = Arc::new(Shape::new_box(Vector3::new(5.0, 0.5, 5.0)).unwrap());
    world.create_body(0.0, Transform::identity(), slab).unwrap();
    let resting = world.create_body(1.0, at(0.0, 1.0, 0.0), cube(0.5)).unwrap();

    run(&mut world, 600);

    assert_at_rest(&world, resting);
    let position = world.get_body(resting).unwrap().get_position();
    assert_relative_eq!(position.y, 1.0, epsilon = 0.02);
    assert!(position.x.abs() < 0.02 && position.z.abs() < 0.02, "box drifted to {}", position);

    let contacts: usize = world.get_contact_manifolds().map(|m| m.len()).sum();
    assert_eq!(contacts, 4);
}

#[test]
fn test_box_stack_settles() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let stack: Vec<BodyHandle> = (0..3)
        .map(|level| world.create_body(1.0, at(0.0, 0.5 + level as f32, 0.0), cube(0.5)).unwrap())
        .collect();

    run(&mut world, 600);

    for (level, &handle) in stack.iter().enumerate() {
        assert_at_rest(&world, handle);
        let position = world.get_body(handle).unwrap().get_position();
        assert_relative_eq!(position.y, 0.5 + level as f32, epsilon = 0.05);
        assert!(position.x.abs() < 0.05 && position.z.abs() < 0.05, "level {} drifted to {}", level, position);
    }
}

#[test]
fn test_cylinder_rests_on_plane() {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let cylinder = Arc::new(Shape::new_cylinder(rigid_sim::shapes::Axis::Y, Vector3::splat(0.5)).unwrap());
    let handle = world.create_body(1.0, at(0.0, 0.5, 0.0), cylinder).unwrap();

    run(&mut world, 600);

    assert_at_rest(&world, handle);
    assert_relative_eq!(world.get_body(handle).unwrap().get_position().y, 0.5, epsilon = 0.02);
    let contacts: usize = world.get_contact_manifolds().map(|m| m.len()).sum();
    assert_eq!(contacts, 4);
}

#[test]
fn test_soft_contact_sinks_in() {
    let rest_depth = |soft: bool| {
        let mut world = world_with_gravity();
        world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
        let ball = world.create_body(1.0, at(0.0, 0.5, 0.0), sphere(0.5)).unwrap();
        if soft {
            world.get_body_mut(ball).unwrap().set_contact_stiffness_and_damping(300.0, 10.0).unwrap();
        }
        run(&mut world, 300);
        assert_at_rest(&world, ball);
        0.5 - world.get_body(ball).unwrap().get_position().y
    };

    // a spring of stiffness k carries the weight m * g at a depth near m * g / k
    let spring_depth = 9.8 / 300.0;
    let soft = rest_depth(true);
    assert!(soft > 0.5 * spring_depth && soft < 1.5 * spring_depth, "soft depth {}", soft);

    let stiff = rest_depth(false);
    assert!(stiff.abs() < 0.005, "stiff depth {}", stiff);
}

fn slide_box_along(velocity: Vector3, configure: impl Fn(&mut rigid_sim::RigidBody)) -> Vector3 {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let handle = world.create_body(1.0, at(0.0, 0.5, 0.0), cube(0.5)).unwrap();
    {
        let body = world.get_body_mut(handle).unwrap();
        configure(body);
        body.set_linear_velocity(velocity).unwrap();
    }
    run(&mut world, 60);
    world.get_body(handle).unwrap().get_position()
}

#[test]
fn test_anisotropic_friction_frees_local_axis() {
    let grooved = |body: &mut rigid_sim::RigidBody| {
        body.set_anisotropic_friction(Vector3::new(0.0, 1.0, 1.0), AnisotropicFrictionMode::Friction)
            .unwrap();
    };

    let along_groove = slide_box_along(Vector3::new(3.0, 0.0, 0.0), grooved);
    let across_groove = slide_box_along(Vector3::new(0.0, 0.0, 3.0), grooved);

    assert_relative_eq!(along_groove.x, 3.0, epsilon = 0.1);
    assert!(across_groove.z < along_groove.x - 0.5, "across {} along {}", across_groove.z, along_groove.x);

    // the same vector only shapes rolling friction in the other mode
    let rolling_mode = slide_box_along(Vector3::new(3.0, 0.0, 0.0), |body| {
        body.set_anisotropic_friction(Vector3::new(0.0, 1.0, 1.0), AnisotropicFrictionMode::RollingFriction)
            .unwrap();
    });
    assert!(rolling_mode.x < along_groove.x - 0.5);
}

fn roll_ball(configure: impl Fn(&mut rigid_sim::RigidBody)) -> rigid_sim::RigidBody {
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let ball = world.create_body(1.0, at(0.0, 0.5, 0.0), sphere(0.5)).unwrap();
    {
        let body = world.get_body_mut(ball).unwrap();
        configure(body);
    }
    run(&mut world, 180);
    world.destroy_body(ball).unwrap()
}

#[test]
fn test_rolling_friction_stops_rolling() {
    let rolling = |body: &mut rigid_sim::RigidBody| {
        body.set_linear_velocity(Vector3::new(2.0, 0.0, 0.0)).unwrap();
        body.set_angular_velocity(Vector3::new(0.0, 0.0, -4.0)).unwrap();
    };

    let free = roll_ball(rolling);
    assert!(free.get_linear_velocity().x > 1.5, "free ball slowed to {}", free.get_linear_velocity());

    let resisted = roll_ball(|body| {
        rolling(body);
        body.set_rolling_friction(0.3).unwrap();
    });
    assert!(resisted.get_linear_velocity().length() < 0.05);
    assert!(resisted.get_angular_velocity().length() < 0.1);

    // anisotropic rolling friction with no resistance about local z lets it roll on
    let grooved = roll_ball(|body| {
        rolling(body);
        body.set_rolling_friction(0.3).unwrap();
        body.set_anisotropic_friction(Vector3::new(1.0, 1.0, 0.0), AnisotropicFrictionMode::RollingFriction)
            .unwrap();
    });
    assert!(grooved.get_linear_velocity().x > 1.5, "grooved ball slowed to {}", grooved.get_linear_velocity());
}

#[test]
fn test_spinning_friction_stops_spin() {
    let spinning = |body: &mut rigid_sim::RigidBody| {
        body.set_angular_velocity(Vector3::new(0.0, 5.0, 0.0)).unwrap();
    };

    let free = roll_ball(spinning);
    assert_relative_eq!(free.get_angular_velocity().y, 5.0, epsilon = 0.05);

    let resisted = roll_ball(|body| {
        spinning(body);
        body.set_spinning_friction(0.3).unwrap();
    });
    assert!(resisted.get_angular_velocity().length() < 0.05);
}

#[test]
fn test_rotated_transform_is_kept() {
    let mut world = PhysicsWorld::new();
    let rotation = Quaternion::from_axis_angle(Vector3::unit_z(), 0.5);
    let handle = world
        .create_body(1.0, Transform::new(Vector3::new(1.0, 2.0, 3.0), rotation), cube(0.5))
        .unwrap();

    let body = world.get_body(handle).unwrap();
    let probe = Vector3::unit_x();
    assert_relative_eq!(
        body.get_world_transform().transform_direction(probe),
        rotation.rotate_vector(probe),
        epsilon = 1e-6
    );
    assert_eq!(body.get_graphics_transform(), body.get_world_transform());
}

#[test]
fn test_ray_test_closest() {
    let mut world = PhysicsWorld::new();
    let near = world.create_body(1.0, at(-2.0, 0.0, 0.0), cube(0.5)).unwrap();
    let far = world.create_body(1.0, at(3.0, 0.0, 0.0), sphere(1.0)).unwrap();

    let from = Vector3::new(-10.0, 0.0, 0.0);
    let to = Vector3::new(10.0, 0.0, 0.0);
    let hit = world
        .ray_test_closest(from, to, CollisionFilterGroups::DEFAULT, CollisionFilterGroups::ALL, RayCastFlags::empty())
        .expect("ray should hit the box");
    assert_eq!(hit.body, near);
    assert_relative_eq!(hit.hit_fraction, 7.5 / 20.0, epsilon = 1e-5);
    assert_relative_eq!(hit.hit_point_world, Vector3::new(-2.5, 0.0, 0.0), epsilon = 1e-4);
    assert_relative_eq!(hit.hit_normal_world, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);

    world
        .get_body_mut(near)
        .unwrap()
        .set_collision_filter(CollisionFilterGroups::DEBRIS, CollisionFilterGroups::ALL);
    let hit = world
        .ray_test_closest(
            from,
            to,
            CollisionFilterGroups::DEFAULT,
            CollisionFilterGroups::ALL ^ CollisionFilterGroups::DEBRIS,
            RayCastFlags::empty(),
        )
        .expect("ray should hit the sphere");
    assert_eq!(hit.body, far);
    assert_relative_eq!(hit.hit_fraction, 12.0 / 20.0, epsilon = 1e-4);
    assert_relative_eq!(hit.hit_normal_world, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-4);

    let miss = world.ray_test_closest(
        Vector3::new(-10.0, 5.0, 0.0),
        Vector3::new(10.0, 5.0, 0.0),
        CollisionFilterGroups::DEFAULT,
        CollisionFilterGroups::ALL,
        RayCastFlags::empty(),
    );
    assert!(miss.is_none());
}

#[test]
fn test_ray_test_plane_back_faces() {
    let mut world = PhysicsWorld::new();
    let ground = world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();
    let (group, mask) = (CollisionFilterGroups::DEFAULT, CollisionFilterGroups::ALL);

    let from_above = world
        .ray_test_closest(Vector3::new(0.0, 4.0, 0.0), Vector3::new(0.0, -4.0, 0.0), group, mask, RayCastFlags::empty())
        .unwrap();
    assert_eq!(from_above.body, ground);
    assert_relative_eq!(from_above.hit_fraction, 0.5);
    assert_relative_eq!(from_above.hit_normal_world, Vector3::unit_y());

    let (below, above) = (Vector3::new(0.0, -1.0, 0.0), Vector3::new(0.0, 3.0, 0.0));
    let flipped = world.ray_test_closest(below, above, group, mask, RayCastFlags::empty()).unwrap();
    assert_relative_eq!(flipped.hit_fraction, 0.25);
    assert_relative_eq!(flipped.hit_normal_world, -Vector3::unit_y());

    let kept = world
        .ray_test_closest(below, above, group, mask, RayCastFlags::KEEP_UNFLIPPED_NORMALS)
        .unwrap();
    assert_relative_eq!(kept.hit_normal_world, Vector3::unit_y());

    assert!(world.ray_test_closest(below, above, group, mask, RayCastFlags::SKIP_BACKFACES).is_none());
}

fn random_scene(seed: u64) -> PhysicsWorld {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = world_with_gravity();
    world.create_body(0.0, Transform::identity(), ground_plane()).unwrap();

    for _ in 0..12 {
        let position = Vector3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(0.6..6.0),
            rng.gen_range(-3.0..3.0),
        );
        let shape = if rng.gen_bool(0.5) {
            sphere(rng.gen_range(0.2..0.6))
        } else {
            cube(rng.gen_range(0.2..0.6))
        };
        world.create_body(rng.gen_range(0.5..3.0), Transform::from_position(position), shape).unwrap();
    }
    world
}

#[test]
fn test_simulation_is_deterministic() {
    let seed = rand::thread_rng().gen();
    let mut first = random_scene(seed);
    let mut second = random_scene(seed);

    run(&mut first, 120);
    run(&mut second, 120);

    let positions = |world: &PhysicsWorld| -> Vec<Transform> {
        world.bodies().map(|(_, body)| body.get_world_transform()).collect()
    };
    assert_eq!(positions(&first), positions(&second), "seed {}", seed);
}

#[test]
fn test_random_scene_stays_finite() {
    let mut world = random_scene(42);
    run(&mut world, 300);
    for (_, body) in world.bodies() {
        assert!(body.get_world_transform().is_finite());
        assert!(body.get_linear_velocity().is_finite());
        assert!(body.get_position().y > -1.0, "body fell through the ground");
    }
}
