//! Prints the debug geometry of a small scene as text, one primitive per line.
//!
//! Set `RUST_LOG=debug` to also see the world's own diagnostics.

use rigid_sim::{
    PhysicsWorld, DebugDraw, DebugDrawModes,
    shapes::{Axis, Shape},
    math::{Vector3, Transform, Quaternion},
};
use std::sync::Arc;

/// Counts primitives and echoes every contact point
#[derive(Default)]
struct TextDrawer {
    lines: usize,
    contacts: usize,
}

impl DebugDraw for TextDrawer {
    fn draw_line(&mut self, from: Vector3, to: Vector3, color: Vector3) {
        self.lines += 1;
        if self.lines <= 12 {
            println!("line {} -> {} color {}", from, to, color);
        }
    }

    fn draw_contact_point(&mut self, point: Vector3, normal: Vector3, distance: f32, life_time: i32, _color: Vector3) {
        self.contacts += 1;
        println!(
            "contact at {} normal {} distance {:.4} age {}",
            point, normal, distance, life_time
        );
    }

    fn report_error_warning(&mut self, warning: &str) {
        eprintln!("warning: {}", warning);
    }

    fn debug_mode(&self) -> DebugDrawModes {
        DebugDrawModes::WIREFRAME | DebugDrawModes::AABB | DebugDrawModes::CONTACT_POINTS
    }
}

impl Drop for TextDrawer {
    fn drop(&mut self) {
        println!("{} lines, {} contact points", self.lines, self.contacts);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut world = PhysicsWorld::new();
    world.set_gravity(Vector3::new(0.0, -9.8, 0.0))?;

    world.create_body(0.0, Transform::identity(), Arc::new(Shape::new_plane(Vector3::unit_y(), 0.0)?))?;
    world.create_body(
        1.0,
        Transform::from_position(Vector3::new(0.0, 0.5, 0.0)),
        Arc::new(Shape::new_box(Vector3::splat(0.5))?),
    )?;
    world.create_body(
        1.0,
        Transform::new(
            Vector3::new(2.0, 0.5, 0.0),
            Quaternion::from_axis_angle(Vector3::unit_z(), std::f32::consts::FRAC_PI_2),
        ),
        Arc::new(Shape::new_capsule(Axis::Y, 0.5, 1.0)?),
    )?;
    world.create_body(
        1.0,
        Transform::from_position(Vector3::new(-2.0, 1.0, 0.0)),
        Arc::new(Shape::new_cone(Axis::Y, 0.5, 1.0)?),
    )?;

    world.set_debug_drawer(Some(Box::new(TextDrawer::default())));
    for _ in 0..30 {
        world.step(1.0 / 60.0)?;
    }

    world.debug_draw();
    world.debug_draw_sphere(Vector3::new(0.0, 3.0, 0.0), 0.25, Vector3::new(0.0, 0.0, 1.0));

    // dropping the drawer prints the totals
    world.set_debug_drawer(None);
    Ok(())
}
