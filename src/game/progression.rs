//! Leveling and rank-breakthrough rules.
//!
//! Two independent axes: `level` advances with ordinary xp along the curve
//! `floor(100 * L^1.5)`, while `rank_index` advances along the chosen path's
//! ladder by spending path-xp in a breakthrough.

use log::info;

use crate::game::player::PlayerRecord;
use crate::game::types::{NotificationEvent, Path};

pub const LEVEL_UP_STAT_POINTS: u32 = 5;
pub const BREAKTHROUGH_ATTRIBUTE_POINTS: u32 = 1;
pub const DEFAULT_TITLE: &str = "Untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankInfo {
    pub name: &'static str,
    /// Path-xp needed to break through; `None` means unreachable.
    pub xp_needed: Option<u64>,
}

impl RankInfo {
    const fn new(name: &'static str, xp_needed: u64) -> Self {
        Self {
            name,
            xp_needed: Some(xp_needed),
        }
    }
}

/// Past the last rank of a ladder.
pub const LEGEND_RANK: RankInfo = RankInfo {
    name: "Living Legend",
    xp_needed: None,
};

/// Before a path is chosen.
pub const UNRANKED: RankInfo = RankInfo {
    name: "Unranked",
    xp_needed: None,
};

const CULTIVATION_RANKS: &[RankInfo] = &[
    RankInfo::new("Body Tempering", 100),
    RankInfo::new("Qi Condensation", 300),
    RankInfo::new("Foundation Establishment", 700),
    RankInfo::new("Core Formation", 1500),
    RankInfo::new("Nascent Soul", 3000),
];

const MANA_RANKS: &[RankInfo] = &[
    RankInfo::new("Initiate", 100),
    RankInfo::new("Apprentice", 300),
    RankInfo::new("Adept", 700),
    RankInfo::new("Magus", 1500),
    RankInfo::new("Archmage", 3000),
];

/// Ordered `(min_rank_index, title)` table.
pub const TITLES: &[(u32, &str)] = &[
    (0, "Wanderer"),
    (1, "Awakened"),
    (3, "Ascendant"),
    (5, "Sovereign"),
];

/// XP needed to advance out of `level`: `floor(100 * level^1.5)`.
///
/// Computed as `isqrt(10_000 * level^3)` so the result is exact for every
/// level instead of depending on float rounding at perfect squares.
pub fn xp_required(level: u32) -> u64 {
    let l = level as u128;
    let value = isqrt(10_000 * l * l * l);
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = (n as f64).sqrt() as u128;
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u32,
    pub stat_points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGain {
    pub amount: u64,
    pub level_up: Option<LevelUp>,
}

impl XpGain {
    pub fn notifications(&self, player_id: u64) -> Vec<NotificationEvent> {
        let mut out = Vec::new();
        if self.amount > 0 {
            out.push(NotificationEvent::info(
                player_id,
                format!("You gained {} XP.", self.amount),
            ));
        }
        if let Some(level_up) = self.level_up {
            out.push(NotificationEvent::success(
                player_id,
                format!(
                    "Level up! You reached level {} and received {} stat points.",
                    level_up.new_level, level_up.stat_points
                ),
            ));
        }
        out
    }
}

/// Add xp and apply at most one level transition.
///
/// Crossing the threshold raises the level by one, subtracts the old
/// threshold, recomputes the next threshold, grants stat points and restores
/// hp. Overflow beyond the new threshold stays as leftover xp; the next call
/// resolves it.
pub fn add_xp(player: &mut PlayerRecord, amount: u64) -> XpGain {
    player.xp = player.xp.saturating_add(amount);
    if player.xp < player.xp_to_next_level {
        return XpGain {
            amount,
            level_up: None,
        };
    }

    let threshold = player.xp_to_next_level;
    player.xp -= threshold;
    player.level = player.level.saturating_add(1);
    player.xp_to_next_level = xp_required(player.level);
    player.stat_points = player.stat_points.saturating_add(LEVEL_UP_STAT_POINTS);
    player.restore_hp();
    info!(
        "player {} reached level {} (leftover xp {})",
        player.id, player.level, player.xp
    );
    XpGain {
        amount,
        level_up: Some(LevelUp {
            new_level: player.level,
            stat_points: LEVEL_UP_STAT_POINTS,
        }),
    }
}

pub fn rank_ladder(path: Path) -> &'static [RankInfo] {
    match path {
        Path::Cultivation => CULTIVATION_RANKS,
        Path::Mana => MANA_RANKS,
    }
}

/// Rank the player currently holds on their path.
pub fn rank_info(player: &PlayerRecord) -> RankInfo {
    match player.path {
        None => UNRANKED,
        Some(path) => rank_ladder(path)
            .get(player.rank_index as usize)
            .copied()
            .unwrap_or(LEGEND_RANK),
    }
}

pub fn can_breakthrough(player: &PlayerRecord) -> bool {
    matches!(rank_info(player).xp_needed, Some(needed) if player.path_xp >= needed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakthroughOutcome {
    Advanced { new_rank: &'static str, rank_index: u32 },
    NotReady { path_xp: u64, needed: Option<u64> },
}

/// Spend path-xp to climb one rank. Not being ready is an ordinary outcome.
pub fn breakthrough(player: &mut PlayerRecord) -> BreakthroughOutcome {
    if !can_breakthrough(player) {
        return BreakthroughOutcome::NotReady {
            path_xp: player.path_xp,
            needed: rank_info(player).xp_needed,
        };
    }
    player.path_xp = 0;
    player.rank_index += 1;
    player.attribute_points = player
        .attribute_points
        .saturating_add(BREAKTHROUGH_ATTRIBUTE_POINTS);
    let new_rank = rank_info(player).name;
    info!(
        "player {} broke through to rank {} ({})",
        player.id, player.rank_index, new_rank
    );
    BreakthroughOutcome::Advanced {
        new_rank,
        rank_index: player.rank_index,
    }
}

/// Title of the highest table entry whose minimum rank the player has reached.
pub fn title_for(rank_index: u32) -> &'static str {
    TITLES
        .iter()
        .filter(|(min_rank, _)| *min_rank <= rank_index)
        .last()
        .map(|(_, title)| *title)
        .unwrap_or(DEFAULT_TITLE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingResult {
    pub path_xp_gained: u64,
    pub xp: XpGain,
    pub breakthrough_ready: bool,
}

/// One training session: path-xp toward the next rank plus ordinary xp.
/// Callers check that a path has been chosen.
pub fn train(player: &mut PlayerRecord, path_xp: u64, xp: u64) -> TrainingResult {
    player.path_xp = player.path_xp.saturating_add(path_xp);
    let xp = add_xp(player, xp);
    TrainingResult {
        path_xp_gained: path_xp,
        xp,
        breakthrough_ready: can_breakthrough(player),
    }
}

fn format_requirement(needed: Option<u64>) -> String {
    match needed {
        Some(n) => n.to_string(),
        None => "∞".to_string(),
    }
}

/// Status sheet for the `status` action.
pub fn format_status(player: &PlayerRecord) -> String {
    let rank = rank_info(player);
    let path = player
        .path
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| "none chosen".to_string());
    let mut out = format!(
        "=== {} ===\nTitle: {}\nPath: {}\nRank: {} ({}/{} path XP)\n\
         Level: {} ({}/{} XP)\nHP: {}/{}\n",
        player.display_name,
        title_for(player.rank_index),
        path,
        rank.name,
        player.path_xp,
        format_requirement(rank.xp_needed),
        player.level,
        player.xp,
        player.xp_to_next_level,
        player.hp,
        player.max_hp,
    );
    out.push_str(&format!(
        "STR {} AGI {} INT {} STA {}\n",
        player.attributes.strength,
        player.attributes.agility,
        player.attributes.intelligence,
        player.attributes.stamina
    ));
    if player.stat_points > 0 {
        out.push_str(&format!("Unspent stat points: {}\n", player.stat_points));
    }
    if player.attribute_points > 0 {
        out.push_str(&format!(
            "Unspent attribute points: {}\n",
            player.attribute_points
        ));
    }
    if can_breakthrough(player) {
        out.push_str("You are ready to break through!\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Coords;

    fn player() -> PlayerRecord {
        PlayerRecord::new(1, "Arin", Coords::new(25, 25), 100)
    }

    #[test]
    fn xp_curve_matches_formula() {
        assert_eq!(xp_required(1), 100);
        assert_eq!(xp_required(2), 282);
        assert_eq!(xp_required(3), 519);
        assert_eq!(xp_required(4), 800);
        assert_eq!(xp_required(9), 2700);
        assert_eq!(xp_required(16), 6400);
    }

    #[test]
    fn xp_curve_strictly_increases() {
        for level in 1..2000u32 {
            assert!(xp_required(level + 1) > xp_required(level), "level {}", level);
        }
    }

    #[test]
    fn small_gain_does_not_level() {
        let mut p = player();
        let gain = add_xp(&mut p, 99);
        assert!(gain.level_up.is_none());
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 99);
    }

    #[test]
    fn level_up_carries_leftover_and_heals() {
        let mut p = player();
        p.hp = 10;
        let gain = add_xp(&mut p, 150);
        assert_eq!(
            gain.level_up,
            Some(LevelUp {
                new_level: 2,
                stat_points: 5
            })
        );
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 50);
        assert_eq!(p.xp_to_next_level, 282);
        assert_eq!(p.stat_points, 5);
        assert_eq!(p.hp, p.max_hp);
    }

    #[test]
    fn at_most_one_level_per_call() {
        let mut p = player();
        add_xp(&mut p, 1000);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 900);
        // the carried overflow resolves on the next call
        add_xp(&mut p, 0);
        assert_eq!(p.level, 3);
        assert_eq!(p.xp, 900 - 282);
    }

    #[test]
    fn breakthrough_needs_enough_path_xp() {
        let mut p = player();
        p.path = Some(Path::Cultivation);
        p.path_xp = 99;
        assert!(!can_breakthrough(&p));
        assert_eq!(
            breakthrough(&mut p),
            BreakthroughOutcome::NotReady {
                path_xp: 99,
                needed: Some(100)
            }
        );
        assert_eq!(p.rank_index, 0);

        p.path_xp = 120;
        assert!(can_breakthrough(&p));
        let outcome = breakthrough(&mut p);
        assert_eq!(
            outcome,
            BreakthroughOutcome::Advanced {
                new_rank: "Qi Condensation",
                rank_index: 1
            }
        );
        assert_eq!(p.path_xp, 0);
        assert_eq!(p.attribute_points, 1);
    }

    #[test]
    fn no_breakthrough_past_last_rank() {
        let mut p = player();
        p.path = Some(Path::Mana);
        p.rank_index = MANA_RANKS.len() as u32;
        p.path_xp = u64::MAX;
        assert_eq!(rank_info(&p), LEGEND_RANK);
        assert!(!can_breakthrough(&p));
    }

    #[test]
    fn no_breakthrough_without_path() {
        let mut p = player();
        p.path_xp = 10_000;
        assert!(!can_breakthrough(&p));
        assert_eq!(rank_info(&p), UNRANKED);
    }

    #[test]
    fn titles_follow_rank() {
        assert_eq!(title_for(0), "Wanderer");
        assert_eq!(title_for(2), "Awakened");
        assert_eq!(title_for(3), "Ascendant");
        assert_eq!(title_for(40), "Sovereign");
    }

    #[test]
    fn training_feeds_both_axes() {
        let mut p = player();
        p.path = Some(Path::Mana);
        let result = train(&mut p, 25, 10);
        assert_eq!(p.path_xp, 25);
        assert_eq!(p.xp, 10);
        assert!(!result.breakthrough_ready);
        for _ in 0..3 {
            train(&mut p, 25, 10);
        }
        assert!(can_breakthrough(&p));
    }

    #[test]
    fn status_mentions_rank_and_level() {
        let mut p = player();
        p.path = Some(Path::Cultivation);
        let status = format_status(&p);
        assert!(status.contains("Body Tempering"));
        assert!(status.contains("Level: 1 (0/100 XP)"));
        assert!(status.contains("Title: Wanderer"));
    }
}
