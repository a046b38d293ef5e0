//! Scene Save/Load — write a scene to JSON and read it back.
//!
//! Builds a small level, saves it to a temp file, loads it into a fresh
//! world, and prints the loaded hierarchy.
//!
//! Run with: `RUST_LOG=info cargo run -p dreki-core --example scene_save_load`

use dreki_core::logging;
use dreki_core::persist;
use dreki_core::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Health {
    hp: i32,
    max: i32,
}

impl Component for Health {}

/// Not persistent: comes back default-constructed.
#[derive(Default)]
struct PlayerInput;

impl Component for PlayerInput {}

fn world(config: &CoreConfig) -> World {
    World::builder()
        .register_persistent::<Health>()
        .register::<PlayerInput>()
        .config(config.clone())
        .build()
}

fn print_tree(world: &World, entity: Entity, depth: usize) {
    let components: Vec<_> = world
        .components(entity)
        .iter()
        .filter_map(|c| world.store().catalog().name(c.kind()))
        .collect();
    log::info!(
        "{:indent$}{} [{}] {:?}",
        "",
        world.name(entity).unwrap_or("?"),
        world.tag(entity).unwrap_or("?"),
        components,
        indent = depth * 2
    );
    for child in world.children(entity) {
        print_tree(world, child, depth + 1);
    }
}

fn main() -> Result<(), CoreError> {
    let config = CoreConfig::default();
    logging::init(&config);

    let mut level = world(&config);
    let player = level.create_entity("Player");
    level.set_tag(player, "Player");
    if let Some(health) = level.add_component::<Health>(player) {
        health.with_mut(|h| *h = Health { hp: 80, max: 100 });
    }
    level.add_component::<PlayerInput>(player);

    if let Some(sword) = level.create_child(player, "Sword") {
        if let Some(mut t) = level.transform_mut(sword) {
            t.set_local_position(Vec3::new(0.5, 1.0, 0.0))
                .set_local_euler_angles(Vec3::new(0.0, 0.0, 45.0));
        }
    }
    if let Some(shield) = level.create_child(player, "Shield") {
        level.set_active(shield, false);
    }
    let crate_root = level.create_entity("Crate");
    level.set_layer(crate_root, 2);

    let path = std::env::temp_dir().join("dreki_core_scene_save_load.json");
    persist::save_scene_to_file(&level, level.active_scene(), &path)?;
    log::info!("saved to {}", path.display());

    let mut fresh = world(&config);
    let scene = persist::load_scene_from_file(&mut fresh, &path)?;
    for root in fresh.scene_roots(scene) {
        print_tree(&fresh, root, 0);
    }

    if let Some(player) = fresh.find_with_tag("Player") {
        let hp = fresh
            .get_component::<Health>(player)
            .and_then(|h| h.with(|h| (h.hp, h.max)));
        log::info!("player health after load: {hp:?}");
    }
    Ok(())
}
