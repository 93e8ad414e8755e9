//! Built-in world and quest content.

use crate::config::GameConfig;
use crate::game::quest::{QuestDefinition, QuestObjective, QuestTrigger};
use crate::game::types::Coords;
use crate::game::world::{Bounds, Location, Region, WorldMap};

pub const PLAINS_REGION_ID: &str = "plains_of_serenity";
pub const FOREST_REGION_ID: &str = "dark_forest";

pub const ABANDONED_HUT: Coords = Coords::new(35, 25);
pub const HUT_CELLAR: Coords = Coords::new(45, 45);
pub const OVERGROWN_TRAIL: Coords = Coords::new(41, 25);

pub const FIRST_STEPS_QUEST_ID: &str = "first_steps";
pub const FOREST_EXPLORATION_QUEST_ID: &str = "forest_exploration";
pub const SMALL_HEALTH_POTION: &str = "small_health_potion";

/// The plains around the spawn stone, the dark forest to the east, a cellar
/// below the abandoned hut, and one uncharted trail cell past the forest edge.
pub fn standard_world(settings: &GameConfig) -> WorldMap {
    let spawn = settings.spawn();
    WorldMap::new(settings.world_width, settings.world_height, spawn)
        .with_region(
            Region::new(
                PLAINS_REGION_ID,
                "Plains of Serenity",
                Bounds::new(20, 30, 20, 30),
                "You walk across wide, peaceful plains.",
            )
            .with_special(
                Coords::new(25, 25),
                "The starting point. An ancient stone rests here.",
            ),
        )
        .with_region(
            Region::new(
                FOREST_REGION_ID,
                "Dark Forest",
                Bounds::new(31, 40, 20, 30),
                "You have entered a dark, dense forest.",
            )
            .with_special(
                ABANDONED_HUT,
                "An abandoned hut. Nobody seems to have lived here for years.",
            ),
        )
        .with_location(
            Location::new(
                ABANDONED_HUT,
                "Abandoned Hut",
                "An abandoned hut. Nobody seems to have lived here for years.",
            )
            .with_exit("cellar", HUT_CELLAR),
        )
        .with_location(
            Location::new(
                HUT_CELLAR,
                "Hut Cellar",
                "A cramped cellar that smells of damp earth. A ladder leads up.",
            )
            .with_exit("up", ABANDONED_HUT),
        )
        .with_location(Location::new(
            OVERGROWN_TRAIL,
            "Overgrown Trail",
            "The trees thin out into a trail nobody has mapped.",
        ))
        .fill_region_cells(PLAINS_REGION_ID)
        .fill_region_cells(FOREST_REGION_ID)
}

pub fn starter_quests() -> Vec<QuestDefinition> {
    vec![
        QuestDefinition::new(
            FIRST_STEPS_QUEST_ID,
            "First Steps",
            QuestTrigger::Level { value: 1 },
            QuestObjective::Move { count: 10 },
        )
        .with_description("Begin your adventure: walk ten steps through the world.")
        .with_reward_xp(50)
        .with_reward_stat_points(1),
        QuestDefinition::new(
            FOREST_EXPLORATION_QUEST_ID,
            "Forest Exploration",
            QuestTrigger::Level { value: 2 },
            QuestObjective::ReachCoord {
                coords: ABANDONED_HUT,
            },
        )
        .with_description("Enter the dark forest and find the abandoned hut.")
        .with_reward_xp(100)
        .with_reward_item(SMALL_HEALTH_POTION),
    ]
}
