//! An emitter circling a listener, rendered by the in-memory backend.
//!
//! Run with `cargo run --example orbiting_emitter`. Set `RUST_LOG=debug` to see
//! the voice lifecycle.

use anyhow::Result;
use petalsonic_router::{
    AudioRouter, EntityId, MockBackend, PlayState, Pose, RouterDesc, SoundId, Vec3,
};
use std::collections::HashMap;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);
const RADIUS: f32 = 6.0;
const ANGULAR_SPEED: f32 = std::f32::consts::FRAC_PI_2;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let listener = EntityId(1);
    let drone = EntityId(2);

    let mut router = AudioRouter::new(RouterDesc::new().reference_distance(2.0))?;
    let mut backend = MockBackend::new();
    let mut scene: HashMap<EntityId, Pose> = HashMap::new();

    // face the drone's starting point
    let mut ear = Pose::identity();
    ear.look_at(Vec3::new(RADIUS, 0.0, 0.0));
    scene.insert(listener, ear);
    router.add_listener(listener);
    router.on_entity_added(listener);

    scene.insert(drone, Pose::from_position(Vec3::new(RADIUS, 0.0, 0.0)));
    router.attach_emitter(drone);
    router.on_entity_added(drone);
    router.set_sound(drone, "rotor", SoundId(1))?;
    let rotor = router.sound_controller(drone, "rotor")?;
    router.set_looping(rotor, true)?;
    router.play(rotor)?;

    log::info!("Orbiting at radius {} for four seconds", RADIUS);
    for step in 0..80u32 {
        let angle = ANGULAR_SPEED * TICK.as_secs_f32() * step as f32;
        // a slow drift outward makes the Doppler shift visible
        let radius = RADIUS + 0.2 * step as f32;
        let position = Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin());
        let drone_pose = Pose::from_position(position);
        scene.insert(drone, drone_pose);

        router.update(TICK, &scene, &mut backend);

        if step % 10 == 0 {
            if let Some(binding) = router.voice(listener, rotor) {
                let params = binding.params.unwrap_or_default();
                log::info!(
                    "t={:.2}s distance={:.1} pan={:+.2} gain={:.3} pitch={:.4}",
                    step as f32 * TICK.as_secs_f32(),
                    ear.distance(&drone_pose),
                    params.pan,
                    params.gain,
                    params.pitch
                );
            }
        }
    }

    log::info!("Letting the current loop be the last one");
    router.exit_loop(rotor)?;
    router.update(TICK, &scene, &mut backend);
    backend.complete_iteration();
    router.update(TICK, &scene, &mut backend);
    log::info!("Rotor state: {:?}", router.play_state(rotor)?);
    assert_eq!(router.play_state(rotor)?, PlayState::Stopped);

    for event in router.poll_events() {
        log::debug!("{:?}", event);
    }

    router.shutdown(&mut backend);
    log::info!(
        "Backend created {} voices and destroyed {}",
        backend.created_total(),
        backend.destroyed_total()
    );
    Ok(())
}
