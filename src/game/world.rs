//! Static world map: coordinate cells, bounding-box regions and movement
//! validation. The map itself never changes after construction; the only
//! thing it moves is a player's position.
//!
//! Movement rule: a cardinal move first follows an explicit exit on the
//! current location whose name matches the direction. Without one, the move
//! steps one cell on the grid and succeeds only if the target lies inside the
//! world bounds and exists in the location graph. Named exits (`go:<name>`)
//! only ever follow the explicit exits table.

use std::collections::{BTreeMap, HashMap};

use crate::game::player::PlayerRecord;
use crate::game::types::{Coords, Direction};

pub const UNKNOWN_REGION_ID: &str = "unknown_lands";
pub const UNKNOWN_REGION_NAME: &str = "Unknown Lands";
pub const UNKNOWN_REGION_DESCRIPTION: &str =
    "You stand somewhere strange and uncharted. Nothing here looks familiar.";

/// Inclusive bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Bounds {
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn contains(&self, c: Coords) -> bool {
        self.min_x <= c.x && c.x <= self.max_x && self.min_y <= c.y && c.y <= self.max_y
    }

    pub fn cells(&self) -> impl Iterator<Item = Coords> + '_ {
        (self.min_x..=self.max_x)
            .flat_map(move |x| (self.min_y..=self.max_y).map(move |y| Coords::new(x, y)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub bounds: Bounds,
    pub base_description: String,
    pub special_locations: HashMap<Coords, String>,
}

impl Region {
    pub fn new(id: &str, name: &str, bounds: Bounds, base_description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            bounds,
            base_description: base_description.to_string(),
            special_locations: HashMap::new(),
        }
    }

    pub fn with_special(mut self, at: Coords, text: &str) -> Self {
        self.special_locations.insert(at, text.to_string());
        self
    }

    fn unknown() -> Self {
        // Empty box: never matches, only handed out as the fallback.
        Self::new(
            UNKNOWN_REGION_ID,
            UNKNOWN_REGION_NAME,
            Bounds::new(0, -1, 0, -1),
            UNKNOWN_REGION_DESCRIPTION,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub coords: Coords,
    pub name: String,
    pub description: String,
    /// Named exits: a direction name ("north") or a free-form name ("cellar").
    pub exits: BTreeMap<String, Coords>,
    /// Overrides both region texts when present.
    pub special: Option<String>,
}

impl Location {
    pub fn new(coords: Coords, name: &str, description: &str) -> Self {
        Self {
            coords,
            name: name.to_string(),
            description: description.to_string(),
            exits: BTreeMap::new(),
            special: None,
        }
    }

    pub fn with_exit(mut self, name: &str, to: Coords) -> Self {
        self.exits.insert(name.to_ascii_lowercase(), to);
        self
    }

    pub fn with_special(mut self, text: &str) -> Self {
        self.special = Some(text.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct WorldMap {
    width: i32,
    height: i32,
    spawn: Coords,
    regions: Vec<Region>,
    locations: HashMap<Coords, Location>,
    unknown: Region,
}

impl WorldMap {
    pub fn new(width: i32, height: i32, spawn: Coords) -> Self {
        Self {
            width,
            height,
            spawn,
            regions: Vec::new(),
            locations: HashMap::new(),
            unknown: Region::unknown(),
        }
    }

    /// Regions are matched in insertion order.
    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.insert(location.coords, location);
        self
    }

    /// Add one plain location per cell of the region's bounding box (clipped to
    /// the world) named after the region. Existing cells are kept.
    pub fn fill_region_cells(mut self, region_id: &str) -> Self {
        let Some(region) = self.regions.iter().find(|r| r.id == region_id).cloned() else {
            return self;
        };
        for cell in region.bounds.cells() {
            if !self.in_bounds(cell) {
                continue;
            }
            self.locations
                .entry(cell)
                .or_insert_with(|| Location::new(cell, &region.name, &region.base_description));
        }
        self
    }

    pub fn spawn(&self) -> Coords {
        self.spawn
    }

    pub fn in_bounds(&self, c: Coords) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height
    }

    pub fn location(&self, c: Coords) -> Option<&Location> {
        self.locations.get(&c)
    }

    /// A cell a player may stand on: inside the world and present in the graph.
    pub fn is_walkable(&self, c: Coords) -> bool {
        self.in_bounds(c) && self.locations.contains_key(&c)
    }

    /// First region whose box contains `c`, or the unknown-region sentinel.
    pub fn resolve_region(&self, c: Coords) -> (&str, &Region) {
        match self.regions.iter().find(|r| r.bounds.contains(c)) {
            Some(region) => (region.id.as_str(), region),
            None => (self.unknown.id.as_str(), &self.unknown),
        }
    }

    /// Try a one-cell move. On failure the original position comes back with `false`.
    pub fn attempt_move(&self, position: Coords, direction: Direction) -> (bool, Coords) {
        let candidate = self
            .location(position)
            .and_then(|loc| loc.exits.get(direction.name()).copied())
            .unwrap_or_else(|| position.step(direction));
        if self.is_walkable(candidate) {
            (true, candidate)
        } else {
            (false, position)
        }
    }

    /// Follow a named exit of the current location.
    pub fn follow_exit(&self, position: Coords, exit_name: &str) -> Option<Coords> {
        let key = exit_name.trim().to_ascii_lowercase();
        self.location(position)
            .and_then(|loc| loc.exits.get(&key).copied())
            .filter(|to| self.is_walkable(*to))
    }

    /// Step `player` one cell; `false` leaves the position unchanged.
    pub fn move_player(&self, player: &mut PlayerRecord, direction: Direction) -> bool {
        let (moved, to) = self.attempt_move(player.position, direction);
        if moved {
            player.move_to(to);
        }
        moved
    }

    /// Send `player` through a named exit; `false` when there is none.
    pub fn take_exit(&self, player: &mut PlayerRecord, exit_name: &str) -> bool {
        match self.follow_exit(player.position, exit_name) {
            Some(to) => {
                player.move_to(to);
                true
            }
            None => false,
        }
    }

    /// Text shown to a player standing at `c`.
    pub fn describe(&self, c: Coords) -> String {
        let (_, region) = self.resolve_region(c);
        let location = self.location(c);
        let text = location
            .and_then(|loc| loc.special.clone())
            .or_else(|| region.special_locations.get(&c).cloned())
            .or_else(|| location.map(|loc| loc.description.clone()))
            .unwrap_or_else(|| region.base_description.clone());
        let mut out = format!("{} {}\n{}", region.name, c, text);
        if let Some(loc) = location {
            if !loc.exits.is_empty() {
                let names: Vec<&str> = loc.exits.keys().map(String::as_str).collect();
                out.push_str(&format!("\nExits: {}", names.join(", ")));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> WorldMap {
        WorldMap::new(10, 10, Coords::new(1, 1))
            .with_region(Region::new("field", "Field", Bounds::new(0, 2, 0, 2), "Grass."))
            .with_region(
                Region::new("wood", "Wood", Bounds::new(3, 5, 0, 2), "Trees.")
                    .with_special(Coords::new(4, 1), "A hollow stump."),
            )
            .fill_region_cells("field")
            .fill_region_cells("wood")
            .with_location(
                Location::new(Coords::new(8, 8), "Pit", "Dark.").with_exit("up", Coords::new(4, 1)),
            )
    }

    #[test]
    fn resolves_first_matching_region() {
        let world = small_world();
        assert_eq!(world.resolve_region(Coords::new(1, 1)).0, "field");
        assert_eq!(world.resolve_region(Coords::new(3, 0)).0, "wood");
    }

    #[test]
    fn falls_back_to_unknown_region() {
        let world = small_world();
        let (id, region) = world.resolve_region(Coords::new(8, 8));
        assert_eq!(id, UNKNOWN_REGION_ID);
        assert_eq!(region.base_description, UNKNOWN_REGION_DESCRIPTION);
        assert_eq!(world.resolve_region(Coords::new(-5, 99)).0, UNKNOWN_REGION_ID);
    }

    #[test]
    fn move_inside_graph_succeeds() {
        let world = small_world();
        assert_eq!(
            world.attempt_move(Coords::new(2, 1), Direction::East),
            (true, Coords::new(3, 1))
        );
    }

    #[test]
    fn move_off_graph_is_blocked() {
        let world = small_world();
        let start = Coords::new(1, 2);
        assert_eq!(world.attempt_move(start, Direction::North), (false, start));
        let corner = Coords::new(0, 0);
        assert_eq!(world.attempt_move(corner, Direction::West), (false, corner));
        assert_eq!(world.attempt_move(corner, Direction::South), (false, corner));
    }

    #[test]
    fn named_exits_are_followed() {
        let world = small_world();
        assert_eq!(world.follow_exit(Coords::new(8, 8), "UP"), Some(Coords::new(4, 1)));
        assert_eq!(world.follow_exit(Coords::new(8, 8), "down"), None);
        assert_eq!(world.follow_exit(Coords::new(1, 1), "up"), None);
    }

    #[test]
    fn description_prefers_special_text() {
        let world = small_world();
        assert!(world.describe(Coords::new(4, 1)).contains("hollow stump"));
        assert!(world.describe(Coords::new(3, 1)).contains("Trees."));
        let pit = world.describe(Coords::new(8, 8));
        assert!(pit.starts_with(UNKNOWN_REGION_NAME));
        assert!(pit.contains("Dark."));
        assert!(pit.contains("Exits: up"));
    }

    #[test]
    fn move_player_updates_position_only_on_success() {
        let world = small_world();
        let mut player = PlayerRecord::new(1, "Arin", Coords::new(2, 1), 100);
        assert!(world.move_player(&mut player, Direction::East));
        assert_eq!(player.position, Coords::new(3, 1));
        player.move_to(Coords::new(5, 2));
        assert!(!world.move_player(&mut player, Direction::East));
        assert_eq!(player.position, Coords::new(5, 2));
    }

    #[test]
    fn take_exit_follows_named_exits() {
        let world = small_world();
        let mut player = PlayerRecord::new(1, "Arin", Coords::new(8, 8), 100);
        assert!(!world.take_exit(&mut player, "down"));
        assert!(world.take_exit(&mut player, "UP"));
        assert_eq!(player.position, Coords::new(4, 1));
    }
}
