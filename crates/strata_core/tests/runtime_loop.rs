//! Integration tests for configuration loading and the frame runner.

use std::cell::Cell;
use std::rc::Rc;

use strata_core::{
    EcsError, EngineConfig, Entity, FnSystem, FrameConfig, Pacing, Runner, Signature, World,
};

struct Countdown(u32);

fn temp_config_path(tag: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("strata_{tag}_{id}.toml"))
}

#[test]
fn test_config_file_sizes_world() {
    let path = temp_config_path("sizes");
    std::fs::write(
        &path,
        "[world]\nmax_entities = 3\n\n[frame]\nmin_delay_ms = 0\n\n[frame.pacing]\nmode = \"fixed_delay\"\ndelay_ms = 0\n",
    )
    .unwrap();

    let config = EngineConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.frame.pacing, Pacing::FixedDelay { delay_ms: 0 });
    let mut world = World::with_config(&config.world);
    assert_eq!(world.capacity(), 3);
    for _ in 0..3 {
        world.create_entity();
    }
    assert_eq!(world.entity_count(), 3);
}

#[test]
fn test_malformed_config_is_rejected() {
    let err = EngineConfig::from_toml_str("[world\nmax_entities = 3").unwrap_err();
    assert!(matches!(err, EcsError::ConfigParse(_)));
}

#[test]
fn test_runner_drives_world_until_empty() {
    let mut world = World::with_capacity(8);
    world.register_component::<Countdown>();
    let sig = world.make_signature::<(Countdown,)>();
    world.register_system(
        "countdown",
        sig,
        FnSystem::new(|world: &mut World, entities: &[Entity], _dt: f64| {
            for &e in entities {
                let left = &mut world.get_component_mut::<Countdown>(e).0;
                *left -= 1;
                if *left == 0 {
                    // Applied at the start of the next frame.
                    world.defer(move |w| w.destroy_entity(e));
                }
            }
        }),
    );

    for ticks in [2, 4] {
        world.defer(move |w| {
            let e = w.create_entity();
            w.add_component(e, Countdown(ticks));
        });
    }
    // Seed the first frame so the loop condition sees live entities.
    world.flush_commands();

    let mut runner = Runner::new(FrameConfig::unpaced());
    let frames = runner.run_while(&mut world, |w| w.entity_count() > 0);

    // Four frames to count down, one more to apply the last destroy.
    assert_eq!(frames, 5);
    assert_eq!(world.entity_count(), 0);
    assert_eq!(world.pending_commands(), 0);
}

#[test]
fn test_stop_from_command_and_restart() {
    let mut world = World::with_capacity(2);
    let frames_seen = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&frames_seen);
    world.register_system(
        "frames",
        Signature::EMPTY,
        FnSystem::new(move |_: &mut World, _: &[Entity], _: f64| {
            counter.set(counter.get() + 1);
        }),
    );

    let mut runner = Runner::new(FrameConfig::unpaced());
    let stop = runner.stop_handle();
    world.defer(move |_| stop.stop());

    assert_eq!(runner.run_while(&mut world, |_| true), 1);
    assert!(runner.stop_handle().is_stop_requested());

    // A new run clears the previous stop request.
    assert_eq!(runner.run_frames(&mut world, 2), 2);
    assert_eq!(runner.frame_count(), 3);
    assert_eq!(frames_seen.get(), 3);
}
