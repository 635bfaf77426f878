//! Headless demo: a scripted platformer run, recorded and replayed

use tilekit::prelude::*;
use winit::event::ElementState;

const SOLID: Tag = 1;
const PLATFORM: Tag = 2;
const TICKS: u32 = 180;

const LEVEL: &str = "
    ....................
    ....................
    ....................
    ..........#.........
    ..........#.........
    ####################
";

/// Animation-facing states derived from movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Pose {
    Idle,
    Run,
    Rise,
    Fall,
}

impl StateKeys for Pose {
    const ALL: &'static [Self] = &[Pose::Idle, Pose::Run, Pose::Rise, Pose::Fall];
}

/// What the pose machine reads each tick
#[derive(Debug, Default)]
struct Body {
    on_ground: bool,
    speed: Vec2,
    landings: u32,
}

fn pose_machine() -> StateMachine<Pose, Body> {
    let mut fsm: StateMachine<Pose, Body> = StateMachine::new();
    fsm.populate(|pose| {
        State::new().on_update(move |body: &mut Body, sm| {
            let next = if !body.on_ground {
                if body.speed.y < 0.0 { Pose::Rise } else { Pose::Fall }
            } else if body.speed.x != 0.0 {
                Pose::Run
            } else {
                Pose::Idle
            };
            if next != pose {
                sm.change_state(next);
            }
        })
    });
    fsm.on_transition(Pose::Fall, Pose::Idle, |body: &mut Body, _| body.landings += 1);
    fsm.on_transition(Pose::Fall, Pose::Run, |body: &mut Body, _| body.landings += 1);
    fsm
}

/// Keyboard state for tick `t`: run right, hop the wall, drop a short hop
fn script(input: &mut InputState, t: u32) {
    let set = |input: &mut InputState, key, down: bool| {
        let state = if down {
            ElementState::Pressed
        } else {
            ElementState::Released
        };
        input.process_keyboard(key, state);
    };
    set(input, KeyCode::KeyD, (10..120).contains(&t));
    set(input, KeyCode::Space, (40..60).contains(&t) || (140..144).contains(&t));
}

fn build_world(
    config: &PlatformingConfig,
) -> Result<(World, hecs::Entity), Box<dyn std::error::Error>> {
    let mut world = World::new();
    let grid = GridCollider::from_str_rows(LEVEL, 16, 16)?;
    world.collisions.add_grid(IVec2::ZERO, grid, [SOLID]);
    let ledge = world.collisions.add_box(IVec2::ZERO, 48, 4, [PLATFORM]);

    let player = world.spawn((
        Name::new("player"),
        Position::new(16, 40),
        PlatformingMovement::new(config)?,
        Controller::with_defaults(),
        Controls::default(),
    ));
    world.spawn((Name::new("ledge"), Position::new(224, 48), ColliderRef(ledge)));
    Ok((world, player))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => PlatformingConfig::load(&path)?,
        None => PlatformingConfig {
            movement: MovementConfig::default()
                .with_hitbox(Rect::new(0, 0, 12, 16))
                .with_solid_tags([SOLID])
                .with_jump_through_tags([PLATFORM]),
            ..Default::default()
        },
    };

    // Live run, recorded
    let (mut world, player) = build_world(&config)?;
    let mut poses = pose_machine();
    let mut body = Body::default();
    poses.change_state(Pose::Fall, &mut body)?;
    world.get_mut::<Controller>(player)?.record()?;

    let mut input = InputState::new();
    for t in 0..TICKS {
        script(&mut input, t);
        world.step(&input)?;
        input.end_frame();

        {
            let movement = world.get::<PlatformingMovement>(player)?;
            body.on_ground = movement.on_ground();
            body.speed = movement.speed;
        }
        poses.update(&mut body)?;
        if poses.timer() == 0 {
            log::debug!("tick {t}: {:?}", poses.current());
        }
    }

    let recording = {
        let mut controller = world.get_mut::<Controller>(player)?;
        controller.stop();
        controller.last_recorded_string()?
    };
    let live_end = world.get::<Position>(player)?.0;
    log::info!(
        "Live run ended at {live_end} after {} landings, recording is {} bytes",
        body.landings,
        recording.len()
    );

    // Replay with idle keyboard
    let (mut world, player) = build_world(&config)?;
    world.get_mut::<Controller>(player)?.playback(&recording)?;
    let idle = InputState::new();
    for _ in 0..TICKS {
        world.step(&idle)?;
    }
    let replay_end = world.get::<Position>(player)?.0;

    if replay_end == live_end {
        log::info!("Replay matched at {replay_end}");
    } else {
        log::warn!("Replay diverged: {replay_end} != {live_end}");
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Demo error: {e}");
        std::process::exit(1);
    }
}
