//! Headless demo: a target circles the courtyard while pursuers and a homing
//! projectile chase it
//!
//! Usage: `tread_nav [config.ron] [arena.ron]`

use std::error::Error;

use tread_nav::prelude::*;

/// Seconds of simulated time
const DURATION: f32 = 30.0;

/// Radius of the target's patrol loop
const PATROL_RADIUS: f32 = 12.0;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load_ron(path)?,
        None => SimConfig::default(),
    };
    config.validate()?;
    let arena = match args.next() {
        Some(path) => Arena::load_ron(path)?,
        None => Arena::courtyard(),
    };

    let mut sim = Simulation::build(config, &arena)?;
    if let Ok(grid) = sim.navigator().grid() {
        log::debug!("Navigation grid:\n{}", grid.to_ascii());
    }

    let dt = sim.config().tick_seconds();
    let ticks = (DURATION / dt) as u32;
    log::info!("Running '{}' for {ticks} ticks", arena.name);

    for tick in 0..ticks {
        let t = tick as f32 * dt;
        let angle = t * 0.2;
        sim.set_target_position(Vec3::new(
            angle.sin() * PATROL_RADIUS,
            0.0,
            angle.cos() * PATROL_RADIUS,
        ));

        sim.tick(dt)?;

        for event in sim.events().iter() {
            let who = sim.world().label(event.entity());
            match event {
                GameEvent::StateChanged { from, to, .. } => {
                    log::info!("[{t:6.2}s] {who}: {from} -> {to}");
                }
                GameEvent::Exploded { position, .. } => {
                    log::info!("[{t:6.2}s] {who} detonated at {position}");
                }
                GameEvent::PathFailed { error, .. } => {
                    log::warn!("[{t:6.2}s] {who} has no path ({error:?})");
                }
                _ => {}
            }
        }

        if tick % sim.config().tick_rate.max(1) == 0 {
            log::debug!("{}", sim.stats().format_stats());
        }
    }

    log::info!("{}", sim.stats().format_stats());
    Ok(())
}
