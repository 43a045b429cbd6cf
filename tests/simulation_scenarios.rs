use lemtris::agent::{Direction, MAX_AGENTS};
use lemtris::game::BLOOD_LIFETIME_MS;
use lemtris::grid::{COLS, Cell, ColorTag, Grid, Pos, ROWS};
use lemtris::shape::ShapeKind;
use lemtris::{DeathCause, Difficulty, GameConfig, GameEvent, Simulation};

const BOTTOM: i32 = ROWS as i32 - 1;

fn sim(difficulty: Difficulty) -> Simulation {
    Simulation::new(&GameConfig::new(difficulty).with_seed(2024), 0)
}

/// Bottom two rows full except the two middle columns an O piece fits into.
fn o_well() -> Grid {
    Grid::from_ascii(&["####..####", "####..####"])
}

fn killed(events: &[GameEvent], cause: DeathCause) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GameEvent::AgentKilled { cause: c, .. } if *c == cause))
        .count()
}

#[test]
fn hard_drop_o_on_empty_grid() {
    let mut s = sim(Difficulty::Easy);
    s.set_next_kind_for_test(ShapeKind::O);
    s.advance(1);
    assert_eq!(s.piece().map(|p| p.pos), Some(Pos::new(4, 0)));

    assert!(s.hard_drop());
    let grid = s.grid();
    assert_eq!(grid.filled_count(), 4);
    for (x, y) in [(4, BOTTOM), (5, BOTTOM), (4, BOTTOM - 1), (5, BOTTOM - 1)] {
        assert!(grid.is_filled(x, y), "({x}, {y})");
    }
    assert_eq!(s.score(), 0);
    assert_eq!(s.kills(), 0);
    assert!(!s.is_awaiting_landing());
    assert!(s.piece().is_none());
}

#[test]
fn two_line_clear_with_ten_agents_scores_900_and_spawns_two() {
    let mut s = sim(Difficulty::Medium);
    s.set_grid_for_test(o_well());
    for _ in 0..10 {
        s.insert_agent_for_test(0.0, f64::from(BOTTOM - 2), Direction::Right);
    }
    s.set_piece_for_test(ShapeKind::O, Pos::new(4, 0));

    assert!(s.hard_drop());
    assert_eq!(s.score(), 900);
    assert_eq!(s.lines_cleared(), 2);
    assert_eq!(s.kills(), 0);
    assert_eq!(s.agents().len(), 12);
    assert_eq!(s.grid().filled_count(), 0);
    assert!(s.is_awaiting_landing());

    let events = s.drain_events();
    assert!(events.contains(&GameEvent::LinesCleared { lines: 2, reward: 900 }));
    let spawned: Vec<_> = s.agents()[10..].iter().collect();
    for agent in spawned {
        assert!(agent.falling);
        assert_eq!(agent.y, 0.0);
        assert!((1.0..=(COLS - 2) as f64).contains(&agent.x));
    }
}

#[test]
fn population_never_exceeds_cap() {
    let mut s = sim(Difficulty::Medium);
    s.set_grid_for_test(o_well());
    for _ in 0..MAX_AGENTS - 1 {
        s.insert_agent_for_test(9.0, f64::from(BOTTOM - 2), Direction::Left);
    }
    s.set_piece_for_test(ShapeKind::O, Pos::new(4, 0));
    s.hard_drop();
    assert_eq!(s.agents().len(), MAX_AGENTS);
}

#[test]
fn crushed_agents_die_in_the_lock_that_covers_them() {
    let mut s = sim(Difficulty::Easy);
    s.set_piece_for_test(ShapeKind::O, Pos::new(4, 0));
    let a = s.insert_agent_for_test(4.0, f64::from(BOTTOM), Direction::Left);
    let b = s.insert_agent_for_test(5.0, f64::from(BOTTOM - 1), Direction::Right);
    let safe = s.insert_agent_for_test(7.0, f64::from(BOTTOM), Direction::Right);

    assert!(s.hard_drop());
    assert_eq!(s.kills(), 2);
    // One batch penalty for both, not two single ones.
    assert_eq!(s.score(), -367);
    assert_eq!(s.blood().len(), 2);
    assert_eq!(s.agents().iter().map(|a| a.id).collect::<Vec<_>>(), vec![safe]);

    let events = s.drain_events();
    assert_eq!(killed(&events, DeathCause::Crush), 2);
    assert!(events.contains(&GameEvent::AgentKilled {
        id: a,
        cell: Pos::new(4, BOTTOM),
        cause: DeathCause::Crush,
    }));
    assert!(events.contains(&GameEvent::AgentKilled {
        id: b,
        cell: Pos::new(5, BOTTOM - 1),
        cause: DeathCause::Crush,
    }));
    assert!(events.contains(&GameEvent::Penalty { kills: 2, points: 367 }));

    // Nothing left to encase on later physics ticks.
    for t in (16..400).step_by(16) {
        s.advance(t);
    }
    assert_eq!(s.kills(), 2);
    assert_eq!(killed(&s.drain_events(), DeathCause::Encasement), 0);
}

#[test]
fn agent_slightly_above_a_row_counts_as_in_the_row_below() {
    let mut s = sim(Difficulty::Easy);
    s.set_piece_for_test(ShapeKind::O, Pos::new(4, 0));
    s.insert_agent_for_test(4.4, f64::from(BOTTOM) - 0.05, Direction::Left);
    s.hard_drop();
    assert_eq!(s.kills(), 1);
    assert_eq!(s.score(), -20);
}

#[test]
fn landing_gate_holds_spawn_until_released_agent_lands() {
    let mut s = sim(Difficulty::Hard);
    s.set_grid_for_test(Grid::from_ascii(&["####..####"]));
    s.set_piece_for_test(ShapeKind::O, Pos::new(4, 0));
    s.hard_drop();
    assert_eq!(s.lines_cleared(), 1);
    assert_eq!(s.score(), 100);
    assert_eq!(s.agents().len(), 1);
    assert!(s.is_awaiting_landing());
    s.drain_events();

    let mut t = 0;
    let mut physics_ticks = 0;
    while s.piece().is_none() && t < 5_000 {
        t += 16;
        let before = s.agents()[0].y;
        s.advance(t);
        if s.agents()[0].y != before {
            physics_ticks += 1;
        }
        if physics_ticks > 0 && physics_ticks < 5 {
            assert!(s.is_awaiting_landing());
            assert!(s.piece().is_none());
        }
    }
    // About 17 rows at 0.6 rows per tick.
    assert!(physics_ticks >= 20, "{physics_ticks}");
    assert!(s.piece().is_some());
    assert!(!s.is_awaiting_landing());
    assert!(!s.agents()[0].falling);
}

#[test]
fn lock_without_agents_spawns_next_piece_on_next_frame() {
    let mut s = sim(Difficulty::Easy);
    s.set_piece_for_test(ShapeKind::T, Pos::new(4, 0));
    s.set_next_kind_for_test(ShapeKind::L);
    s.hard_drop();
    s.advance(16);
    assert_eq!(s.piece().map(|p| p.kind), Some(ShapeKind::L));
}

#[test]
fn spawned_piece_waits_a_full_gravity_interval() {
    let mut s = sim(Difficulty::Medium);
    let mut grid = Grid::new();
    grid.set(4, 2, Cell::Filled(ColorTag(1)));
    grid.set(5, 2, Cell::Filled(ColorTag(1)));
    s.set_grid_for_test(grid);
    s.set_next_kind_for_test(ShapeKind::O);

    // Gravity is due on the spawn frame; the tick is consumed, not applied.
    s.advance(501);
    assert_eq!(s.piece().map(|p| p.pos), Some(Pos::new(4, 0)));
    assert_eq!(s.drain_events(), vec![GameEvent::PieceSpawned { kind: ShapeKind::O }]);
    assert!(s.move_left());
    assert!(s.move_right());

    s.advance(1_001);
    assert!(s.piece().is_some());
    s.advance(1_002);
    assert!(s.piece().is_none());
    assert!(s.drain_events().contains(&GameEvent::PieceLocked {
        kind: ShapeKind::O,
        pos: Pos::new(4, 0),
    }));
}

#[test]
fn piece_after_hard_drop_is_not_moved_on_its_spawn_frame() {
    let mut s = sim(Difficulty::Hard);
    s.set_piece_for_test(ShapeKind::T, Pos::new(4, 0));
    s.advance(200);
    s.hard_drop();
    // Gravity has been due since 251 and fires on the frame that spawns the next piece.
    s.advance(400);
    assert_eq!(s.piece().map(|p| p.pos.y), Some(0));
    s.advance(650);
    assert_eq!(s.piece().map(|p| p.pos.y), Some(0));
    s.advance(651);
    assert_eq!(s.piece().map(|p| p.pos.y), Some(1));
}

#[test]
fn gravity_locks_piece_when_it_cannot_fall() {
    let mut s = sim(Difficulty::Hard);
    s.set_piece_for_test(ShapeKind::O, Pos::new(0, BOTTOM - 1));
    s.advance(251);
    assert!(s.piece().is_none());
    assert!(s.grid().is_filled(0, BOTTOM));
    assert!(s
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::PieceLocked { kind: ShapeKind::O, .. })));
}

#[test]
fn encased_agent_dies_on_physics_tick() {
    let mut s = sim(Difficulty::Easy);
    s.set_piece_for_test(ShapeKind::I, Pos::new(0, 0));
    let mut grid = Grid::new();
    grid.set(3, 12, Cell::Filled(ColorTag(4)));
    s.set_grid_for_test(grid);
    s.insert_agent_for_test(3.0, 12.0, Direction::Right);
    s.advance(10);
    assert_eq!(s.kills(), 0);
    s.advance(21);
    assert_eq!(s.kills(), 1);
    assert_eq!(s.score(), -20);
    assert_eq!(killed(&s.drain_events(), DeathCause::Encasement), 1);
}

#[test]
fn blocked_spawn_ends_game_once_with_current_totals() {
    let mut s = sim(Difficulty::Easy);
    s.set_piece_for_test(ShapeKind::O, Pos::new(0, 10));
    let mut grid = Grid::new();
    for y in 0..4 {
        for x in 3..7 {
            grid.set(x, y, Cell::Filled(ColorTag(1)));
        }
    }
    s.set_grid_for_test(grid);
    s.insert_agent_for_test(4.0, 1.0, Direction::Left);
    s.advance(21);
    assert_eq!((s.score(), s.kills()), (-20, 1));

    s.hard_drop();
    s.drain_events();
    s.advance(40);
    assert!(s.is_game_over());
    assert_eq!(
        s.drain_events(),
        vec![GameEvent::GameOver { score: -20, kills: 1 }]
    );

    for t in (56..2_000).step_by(16) {
        s.advance(t);
    }
    assert!(s.drain_events().is_empty());
    assert!(!s.move_left());
    assert!(!s.hard_drop());
    assert!(!s.toggle_pause());
}

#[test]
fn pause_freezes_agents_and_blood() {
    let mut s = sim(Difficulty::Easy);
    s.set_piece_for_test(ShapeKind::O, Pos::new(0, 0));
    s.insert_agent_for_test(5.0, 3.0, Direction::Left);
    s.toggle_pause();
    for t in (16..2_000).step_by(16) {
        s.advance(t);
    }
    assert_eq!(s.agents()[0].y, 3.0);
    assert_eq!(s.piece().map(|p| p.pos.y), Some(0));
    s.toggle_pause();
    s.advance(2_000);
    s.advance(2_021);
    assert!(s.agents()[0].y > 3.0);
}

#[test]
fn gravity_is_frame_rate_independent() {
    let run = |frame_ms: u64| {
        let mut s = sim(Difficulty::Medium);
        s.set_piece_for_test(ShapeKind::I, Pos::new(3, 0));
        let mut t = 0;
        while t + frame_ms <= 2_000 {
            t += frame_ms;
            s.advance(t);
        }
        s.piece().map(|p| p.pos.y)
    };
    assert_eq!(run(5), Some(3));
    assert_eq!(run(16), Some(3));
    assert_eq!(run(33), Some(3));
}

#[test]
fn blood_marker_is_pruned_after_lifetime() {
    let mut s = sim(Difficulty::Easy);
    s.set_piece_for_test(ShapeKind::O, Pos::new(4, BOTTOM - 1));
    s.insert_agent_for_test(4.0, f64::from(BOTTOM), Direction::Left);
    s.hard_drop();
    assert_eq!(s.blood().len(), 1);
    let stain = s.blood()[0];
    assert_eq!(stain.cell, Pos::new(4, BOTTOM));
    assert_eq!(stain.created_ms, 0);

    s.advance(BLOOD_LIFETIME_MS - 5);
    assert_eq!(s.blood().len(), 1);
    s.advance(BLOOD_LIFETIME_MS + 30);
    assert!(s.blood().is_empty());
}

#[test]
fn snapshot_reflects_state_between_frames() {
    let mut s = sim(Difficulty::Hard);
    s.set_next_kind_for_test(ShapeKind::S);
    s.advance(1);
    let snap = s.snapshot();
    assert_eq!(snap.piece.map(|p| p.kind), Some(ShapeKind::S));
    assert_eq!(snap.gravity_interval_ms, 250);
    assert_eq!(snap.grid, *s.grid());
    assert!(!snap.paused);
    assert!(!snap.game_over);
    assert_eq!(s.ghost().map(|g| g.pos.y), Some(BOTTOM - 1));
}
