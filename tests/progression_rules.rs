//! Leveling and rank rules through the public API.

use sysrpg::game::progression::{rank_ladder, LEGEND_RANK, LEVEL_UP_STAT_POINTS};
use sysrpg::game::{
    add_xp, breakthrough, can_breakthrough, rank_info, title_for, xp_required,
    BreakthroughOutcome, Coords, Path, PlayerRecord,
};

fn player() -> PlayerRecord {
    PlayerRecord::new(1, "Arin", Coords::new(25, 25), 100)
}

#[test]
fn xp_requirement_matches_the_curve() {
    // floor(100 * L^1.5) is the integer square root of 10000 * L^3
    for level in 1..=200u64 {
        let required = xp_required(level as u32);
        let squared = 10_000 * level.pow(3);
        assert!(required * required <= squared, "level {}", level);
        assert!((required + 1) * (required + 1) > squared, "level {}", level);
        assert!(xp_required(level as u32 + 1) > required);
    }
    assert_eq!(xp_required(2), 282);
}

#[test]
fn level_up_conserves_progress() {
    for amount in [100u64, 150, 381, 1000] {
        let mut p = player();
        p.hp = 30;
        let old_threshold = p.xp_to_next_level;
        add_xp(&mut p, amount);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, amount - old_threshold);
        assert_eq!(p.xp_to_next_level, xp_required(2));
        assert_eq!(p.stat_points, LEVEL_UP_STAT_POINTS);
        assert_eq!(p.hp, p.max_hp);
    }
}

#[test]
fn one_level_per_call_with_leftover_carried() {
    let mut p = player();
    add_xp(&mut p, 1000);
    assert_eq!((p.level, p.xp), (2, 900));
    add_xp(&mut p, 0);
    assert_eq!((p.level, p.xp), (3, 618));
}

#[test]
fn breakthrough_scenario() {
    let mut p = player();
    p.path = Some(Path::Cultivation);
    p.path_xp = 120;
    assert!(can_breakthrough(&p));
    let outcome = breakthrough(&mut p);
    assert!(matches!(outcome, BreakthroughOutcome::Advanced { rank_index: 1, .. }));
    assert_eq!(p.path_xp, 0);
    assert_eq!(p.rank_index, 1);
    assert_eq!(p.attribute_points, 1);
}

#[test]
fn past_the_last_rank_breakthrough_is_closed() {
    let mut p = player();
    p.path = Some(Path::Mana);
    p.rank_index = rank_ladder(Path::Mana).len() as u32;
    p.path_xp = u64::MAX;
    assert_eq!(rank_info(&p), LEGEND_RANK);
    assert!(!can_breakthrough(&p));
    assert!(matches!(
        breakthrough(&mut p),
        BreakthroughOutcome::NotReady { needed: None, .. }
    ));
}

#[test]
fn titles_follow_the_highest_reached_entry() {
    assert_eq!(title_for(0), "Wanderer");
    assert_eq!(title_for(2), "Awakened");
    assert_eq!(title_for(4), "Ascendant");
    assert_eq!(title_for(50), "Sovereign");
}
