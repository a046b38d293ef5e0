//! Entity Hierarchies — headless solar system.
//!
//! Builds a sun with orbiting planets and moons, spins them for a few
//! simulated seconds, reparents a moon while keeping its world pose, and
//! toggles a planet to show activation cascading to its moon.
//!
//! Run with: `RUST_LOG=info cargo run -p dreki-core --example scene_hierarchy`

use dreki_core::logging;
use dreki_core::prelude::*;

// ── Orbit component ─────────────────────────────────────────────────────

/// Spin speed in degrees per second around the local Y axis.
#[derive(Default)]
struct Orbit {
    speed: f32,
}

impl Component for Orbit {
    fn as_behaviour(&mut self) -> Option<&mut dyn Behaviour> {
        Some(self)
    }
}

impl Behaviour for Orbit {
    fn on_enabled(&mut self) {
        log::info!("orbit resumed ({} deg/s)", self.speed);
    }

    fn on_disabled(&mut self) {
        log::info!("orbit paused");
    }
}

fn main() {
    let config = CoreConfig {
        default_scene: "SolarSystem".into(),
        ..CoreConfig::default()
    };
    logging::init(&config);

    let mut world = World::builder().register::<Orbit>().config(config).build();

    let sun = world.create_entity("Sun");
    world.set_tag(sun, "Star");

    let planets = [("Mercury", 4.0, 90.0), ("Earth", 10.0, 30.0), ("Mars", 15.0, 20.0)];
    for (name, distance, speed) in planets {
        let Some(pivot) = world.create_child(sun, format!("{name}Pivot")) else {
            continue;
        };
        if let Some(orbit) = world.add_component::<Orbit>(pivot) {
            orbit.with_mut(|o| o.speed = speed);
        }
        let Some(planet) = world.create_child(pivot, name) else {
            continue;
        };
        world.set_tag(planet, "Planet");
        if let Some(mut t) = world.transform_mut(planet) {
            t.set_local_position(Vec3::new(distance, 0.0, 0.0));
        }
        if let Some(moon) = world.create_child(planet, format!("{name}Moon")) {
            if let Some(mut t) = world.transform_mut(moon) {
                t.set_local_position(Vec3::new(1.5, 0.0, 0.0));
            }
        }
    }

    // Spin every pivot for two simulated seconds.
    let dt = 1.0 / 60.0;
    for _ in 0..120 {
        for pivot in world.children(sun) {
            let speed = world
                .get_component::<Orbit>(pivot)
                .and_then(|o| o.with(|o| o.speed))
                .unwrap_or_default();
            let enabled = world.is_active_in_hierarchy(pivot);
            if let Some(mut t) = world.transform_mut(pivot).filter(|_| enabled) {
                t.rotate_euler(Vec3::new(0.0, speed * dt, 0.0), true);
            }
        }
        world.frame_update(dt);
    }

    for planet in world.find_all_with_tag("Planet") {
        let name = world.name(planet).unwrap_or("?").to_string();
        if let Some(t) = world.transform_mut(planet) {
            log::info!("{name:<8} at {:?}", t.position());
        }
    }

    // Hand Earth's moon over to Mars without it jumping.
    if let (Some(earth), Some(mars)) = (world.find(sun, "Earth"), world.find(sun, "Mars")) {
        if let Some(moon) = world.find(earth, "EarthMoon") {
            let before = world.transform_mut(moon).map(|t| t.position());
            world.set_parent(moon, Some(mars), true);
            let after = world.transform_mut(moon).map(|t| t.position());
            log::info!("moon reparented: {before:?} -> {after:?}");
        }

        // Pausing Mars' pivot deactivates Mars and both moons below it.
        if let Some(pivot) = world.parent(mars) {
            world.set_active(pivot, false);
            log::info!(
                "Mars active in hierarchy: {}",
                world.is_active_in_hierarchy(mars)
            );
        }
    }

    log::info!("{} entities in {:?}", world.entity_count(), world.active_scene());
}
