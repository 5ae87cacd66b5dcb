use rigid_sim::{
    PhysicsWorld, BodyHandle,
    shapes::Shape,
    math::{Vector3, Transform},
};
use std::sync::Arc;
use std::io::{stdout, Write};
use std::time::{Duration, Instant};
use std::thread::sleep;
use crossterm::{
    ExecutableCommand, QueueableCommand,
    terminal::{Clear, ClearType, size},
    cursor::{Hide, Show, MoveTo},
    style::{Color, Print, SetForegroundColor, ResetColor},
};

const FRAME_DURATION: Duration = Duration::from_millis(33); // ~30 FPS
const SIMULATION_DURATION: f32 = 10.0; // seconds
const CELLS_PER_METER: f32 = 2.0;
const STACK_HEIGHT: usize = 6;

struct Crate {
    handle: BodyHandle,
    glyph: char,
    color: Color,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut stdout = stdout();
    stdout.execute(Hide)?;
    let (width, height) = size()?;

    let mut world = PhysicsWorld::new();
    world.set_gravity(Vector3::new(0.0, -9.81, 0.0))?;
    world.get_config_mut().solver_iterations = 20;

    let ground = Arc::new(Shape::new_plane(Vector3::unit_y(), 0.0)?);
    world.create_body(0.0, Transform::identity(), ground)?;

    // one shared shape for every crate in the stack
    let crate_shape = Arc::new(Shape::new_box(Vector3::splat(0.5))?);
    let ball_shape = Arc::new(Shape::new_sphere(0.5)?);
    let center = width as f32 / CELLS_PER_METER / 2.0;

    let mut crates = Vec::new();
    for level in 0..STACK_HEIGHT {
        let position = Vector3::new(center, 0.5 + level as f32 * 1.01, 0.0);
        let handle = world.create_body(1.0, Transform::from_position(position), crate_shape.clone())?;
        let color = if level % 2 == 0 { Color::Yellow } else { Color::DarkYellow };
        crates.push(Crate { handle, glyph: '#', color });
    }

    // a ball thrown at the stack
    let ball = world.create_body(
        2.0,
        Transform::from_position(Vector3::new(center - 8.0, 3.0, 0.0)),
        ball_shape,
    )?;
    world.get_body_mut(ball)?.set_linear_velocity(Vector3::new(9.0, 2.0, 0.0))?;
    crates.push(Crate { handle: ball, glyph: 'O', color: Color::Red });

    let start_time = Instant::now();
    let mut last_update_time = Instant::now();

    while start_time.elapsed().as_secs_f32() < SIMULATION_DURATION {
        let dt = last_update_time.elapsed().as_secs_f32();
        last_update_time = Instant::now();
        world.step_simulation(dt, 4, 1.0 / 60.0)?;

        stdout.queue(Clear(ClearType::All))?;
        for x in 0..width {
            stdout.queue(MoveTo(x, height - 1))?.queue(Print('='))?;
        }

        for item in &crates {
            let body = world.get_body(item.handle)?;
            // the graphics transform is extrapolated between fixed steps
            let position = body.get_graphics_transform().position;
            let screen_x = (position.x * CELLS_PER_METER).round();
            let screen_y = height as f32 - 2.0 - (position.y * CELLS_PER_METER).round();

            if screen_x >= 0.0 && screen_x < width as f32 && screen_y >= 0.0 && screen_y < height as f32 {
                stdout
                    .queue(MoveTo(screen_x as u16, screen_y as u16))?
                    .queue(SetForegroundColor(item.color))?
                    .queue(Print(item.glyph))?
                    .queue(ResetColor)?;
            }
        }

        stdout
            .queue(MoveTo(0, 0))?
            .queue(Print(format!(
                "t = {:5.2}s  bodies: {}  manifolds: {}",
                start_time.elapsed().as_secs_f32(),
                world.body_count(),
                world.get_contact_manifolds().count()
            )))?;
        stdout.flush()?;

        let elapsed = last_update_time.elapsed();
        if elapsed < FRAME_DURATION {
            sleep(FRAME_DURATION - elapsed);
        }
    }

    stdout.execute(Show)?;
    stdout.execute(Clear(ClearType::All))?;
    stdout.execute(MoveTo(0, 0))?;
    println!("Simulation complete!");
    Ok(())
}
