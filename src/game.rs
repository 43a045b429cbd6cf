//! Game state: grid, falling piece, lemmings, lock resolution, scoring, cadence.

use crate::agent::{Agent, AgentId, AgentStep, Direction, MAX_AGENTS};
use crate::grid::{COLS, Grid, Pos};
use crate::scheduler::Cadence;
use crate::scoring::{crush_penalty, line_clear_reward};
use crate::shape::{ActivePiece, ShapeKind};
use crate::{Difficulty, GameConfig};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Blood markers disappear after this long.
pub const BLOOD_LIFETIME_MS: u64 = 3_000;

/// Cosmetic death marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloodStain {
    pub agent: AgentId,
    pub cell: Pos,
    pub created_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// A locking piece landed on the agent.
    Crush,
    /// The agent ended up inside a filled cell during a physics tick.
    Encasement,
}

/// Observable things that happened during a command or frame, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PieceSpawned { kind: ShapeKind },
    PieceLocked { kind: ShapeKind, pos: Pos },
    AgentKilled { id: AgentId, cell: Pos, cause: DeathCause },
    /// Score deduction for all kills of one lock or one encasement.
    Penalty { kills: u32, points: i64 },
    LinesCleared { lines: u32, reward: i64 },
    AgentsSpawned { ids: Vec<AgentId> },
    GameOver { score: i64, kills: u32 },
}

/// Player commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
    TogglePause,
}

/// Consistent copy of everything a renderer needs, taken between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Grid,
    pub piece: Option<ActivePiece>,
    pub next_kind: ShapeKind,
    pub agents: Vec<Agent>,
    pub blood: Vec<BloodStain>,
    pub score: i64,
    pub kills: u32,
    pub lines_cleared: u32,
    pub paused: bool,
    pub game_over: bool,
    pub awaiting_landing: bool,
    pub gravity_interval_ms: u64,
}

/// One game. Every mutation happens inside [`Simulation::advance`] or a command.
#[derive(Debug, Clone)]
pub struct Simulation {
    difficulty: Difficulty,
    grid: Grid,
    piece: Option<ActivePiece>,
    next_kind: ShapeKind,
    agents: Vec<Agent>,
    blood: Vec<BloodStain>,
    score: i64,
    kills: u32,
    lines_cleared: u32,
    paused: bool,
    game_over: bool,
    /// No new piece spawns while agents released by the last lock are still falling.
    awaiting_landing: bool,
    /// Set on unpause; the next frame restarts both cadences at its timestamp.
    resume_pending: bool,
    cadence: Cadence,
    last_frame_ms: u64,
    next_agent_id: u64,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl Simulation {
    pub fn new(config: &GameConfig, now_ms: u64) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let next_kind = random_kind(&mut rng);
        info!(
            "new game: difficulty={} gravity={}ms physics={}ms",
            config.difficulty,
            config.gravity_interval_ms(),
            config.physics_interval_ms
        );
        Self {
            difficulty: config.difficulty,
            grid: Grid::new(),
            piece: None,
            next_kind,
            agents: Vec::new(),
            blood: Vec::new(),
            score: 0,
            kills: 0,
            lines_cleared: 0,
            paused: false,
            game_over: false,
            awaiting_landing: false,
            resume_pending: false,
            cadence: Cadence::new(
                config.gravity_interval_ms(),
                config.physics_interval_ms,
                now_ms,
            ),
            last_frame_ms: now_ms,
            next_agent_id: 0,
            rng,
            events: Vec::new(),
        }
    }

    // --- observers ---

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn piece(&self) -> Option<&ActivePiece> {
        self.piece.as_ref()
    }

    pub fn next_kind(&self) -> ShapeKind {
        self.next_kind
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn blood(&self) -> &[BloodStain] {
        &self.blood
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_awaiting_landing(&self) -> bool {
        self.awaiting_landing
    }

    pub fn gravity_interval_ms(&self) -> u64 {
        self.cadence.gravity.interval_ms()
    }

    pub fn physics_interval_ms(&self) -> u64 {
        self.cadence.physics.interval_ms()
    }

    /// Where a hard drop would put the active piece.
    pub fn ghost(&self) -> Option<ActivePiece> {
        self.piece.as_ref().map(|p| {
            let y = self.grid.landing_row(p.pos, &p.matrix);
            ActivePiece {
                pos: Pos::new(p.pos.x, y),
                ..p.clone()
            }
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.clone(),
            piece: self.piece.clone(),
            next_kind: self.next_kind,
            agents: self.agents.clone(),
            blood: self.blood.clone(),
            score: self.score,
            kills: self.kills,
            lines_cleared: self.lines_cleared,
            paused: self.paused,
            game_over: self.game_over,
            awaiting_landing: self.awaiting_landing,
            gravity_interval_ms: self.gravity_interval_ms(),
        }
    }

    /// Take all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // --- frame ---

    /// Run one frame at `now_ms`: spawn if allowed, then whichever of the
    /// gravity and physics ticks are due. Frozen while paused or after game over.
    pub fn advance(&mut self, now_ms: u64) {
        self.last_frame_ms = now_ms;
        if self.game_over || self.paused {
            return;
        }
        if self.resume_pending {
            self.cadence.rewind(now_ms);
            self.resume_pending = false;
        }

        let mut spawned = false;
        if self.piece.is_none() && !self.awaiting_landing {
            self.spawn_piece();
            if self.game_over {
                return;
            }
            spawned = true;
        }

        // A due tick is still consumed on the spawn frame, so a fresh piece
        // waits a full interval at row 0.
        if self.cadence.gravity.poll(now_ms) && !spawned && !self.awaiting_landing {
            self.gravity_tick();
        }

        if self.cadence.physics.poll(now_ms) {
            self.physics_tick(now_ms);
        }
    }

    fn spawn_piece(&mut self) {
        let piece = ActivePiece::spawn(self.next_kind);
        if !self.grid.is_valid_move(piece.pos, &piece.matrix) {
            self.game_over = true;
            info!(
                "game over: {:?} blocked at spawn, score={} kills={}",
                piece.kind, self.score, self.kills
            );
            self.events.push(GameEvent::GameOver {
                score: self.score,
                kills: self.kills,
            });
            return;
        }
        self.events.push(GameEvent::PieceSpawned { kind: piece.kind });
        self.piece = Some(piece);
        self.next_kind = random_kind(&mut self.rng);
    }

    fn gravity_tick(&mut self) {
        let Some(piece) = self.piece.as_ref() else {
            return;
        };
        let lowered = piece.moved(0, 1);
        if self.grid.is_valid_move(lowered.pos, &lowered.matrix) {
            self.piece = Some(lowered);
        } else if let Some(piece) = self.piece.take() {
            self.lock(piece);
        }
    }

    fn physics_tick(&mut self, now_ms: u64) {
        let grid = &self.grid;
        let mut anyone_falling = false;
        let mut encased = Vec::new();
        self.agents.retain_mut(|agent| match agent.step(grid) {
            AgentStep::Encased => {
                encased.push((agent.id, agent.cell()));
                false
            }
            AgentStep::Falling => {
                anyone_falling = true;
                true
            }
            AgentStep::Grounded => true,
        });

        for (id, cell) in encased {
            trace!("{id} encased at ({}, {})", cell.x, cell.y);
            self.kill(id, cell, DeathCause::Encasement, now_ms);
            self.apply_penalty(1);
        }

        if self.awaiting_landing && (self.agents.is_empty() || !anyone_falling) {
            self.awaiting_landing = false;
        }

        self.blood
            .retain(|b| now_ms.saturating_sub(b.created_ms) < BLOOD_LIFETIME_MS);
    }

    // --- lock & resolution ---

    /// Lock `piece` where it is: crush agents under it, stamp it, clear rows,
    /// reward, release agents. Atomic; the active piece is gone afterwards.
    fn lock(&mut self, piece: ActivePiece) {
        let now_ms = self.last_frame_ms;
        let occupied: HashSet<Pos> = piece.cells().collect();

        let mut crushed = Vec::new();
        self.agents.retain(|agent| {
            let cell = agent.cell();
            let hit = occupied.contains(&cell);
            if hit {
                crushed.push((agent.id, cell));
            }
            !hit
        });
        let crush_count = crushed.len() as u32;
        for (id, cell) in crushed {
            self.kill(id, cell, DeathCause::Crush, now_ms);
        }
        self.apply_penalty(crush_count);

        self.grid.stamp(piece.pos, &piece.matrix, piece.color());
        self.events.push(GameEvent::PieceLocked {
            kind: piece.kind,
            pos: piece.pos,
        });

        let lines = self.grid.clear_full_rows();
        if lines > 0 {
            let reward = line_clear_reward(lines, self.agents.len());
            self.score += reward;
            self.lines_cleared += lines;
            self.events.push(GameEvent::LinesCleared { lines, reward });

            let room = MAX_AGENTS.saturating_sub(self.agents.len());
            let ids: Vec<AgentId> = (0..(lines as usize).min(room))
                .map(|_| self.spawn_agent())
                .collect();
            if !ids.is_empty() {
                self.events.push(GameEvent::AgentsSpawned { ids });
            }
        }

        debug!(
            "locked {:?} at ({}, {}): crushed={} lines={} agents={} score={}",
            piece.kind,
            piece.pos.x,
            piece.pos.y,
            crush_count,
            lines,
            self.agents.len(),
            self.score
        );

        // With nobody alive the next physics tick would lift the gate anyway.
        self.awaiting_landing = !self.agents.is_empty();
        self.piece = None;
    }

    fn spawn_agent(&mut self) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        let column = self.rng.gen_range(1..=COLS as i32 - 2);
        let direction = if self.rng.gen_bool(0.5) {
            Direction::Right
        } else {
            Direction::Left
        };
        self.agents.push(Agent::spawn(id, column, direction));
        id
    }

    fn kill(&mut self, id: AgentId, cell: Pos, cause: DeathCause, now_ms: u64) {
        self.kills += 1;
        self.blood.push(BloodStain {
            agent: id,
            cell,
            created_ms: now_ms,
        });
        self.events.push(GameEvent::AgentKilled { id, cell, cause });
    }

    fn apply_penalty(&mut self, kills: u32) {
        if kills == 0 {
            return;
        }
        let points = crush_penalty(kills);
        self.score -= points;
        self.events.push(GameEvent::Penalty { kills, points });
    }

    // --- commands ---

    fn accepts_input(&self) -> bool {
        !self.paused && !self.game_over && self.piece.is_some()
    }

    /// Replace the active piece with `f(piece)` if the result fits.
    fn try_transform(&mut self, f: impl FnOnce(&ActivePiece) -> ActivePiece) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(piece) = self.piece.as_ref() else {
            return false;
        };
        let candidate = f(piece);
        if self.grid.is_valid_move(candidate.pos, &candidate.matrix) {
            self.piece = Some(candidate);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.try_transform(|p| p.moved(-1, 0))
    }

    pub fn move_right(&mut self) -> bool {
        self.try_transform(|p| p.moved(1, 0))
    }

    /// One row down. Never locks; a blocked soft drop is a no-op.
    pub fn soft_drop(&mut self) -> bool {
        self.try_transform(|p| p.moved(0, 1))
    }

    /// Clockwise rotation in place; rejected if it would collide.
    pub fn rotate(&mut self) -> bool {
        self.try_transform(ActivePiece::rotated)
    }

    /// Drop to the landing row and lock immediately.
    pub fn hard_drop(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(mut piece) = self.piece.take() else {
            return false;
        };
        piece.pos.y = self.grid.landing_row(piece.pos, &piece.matrix);
        self.lock(piece);
        true
    }

    /// Pause or resume. Ignored after game over.
    pub fn toggle_pause(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.paused = !self.paused;
        if !self.paused {
            self.resume_pending = true;
        }
        true
    }

    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::MoveLeft => self.move_left(),
            Command::MoveRight => self.move_right(),
            Command::SoftDrop => self.soft_drop(),
            Command::Rotate => self.rotate(),
            Command::HardDrop => self.hard_drop(),
            Command::TogglePause => self.toggle_pause(),
        }
    }
}

/// Direct state setters for tests and scripted setups.
#[cfg(any(test, feature = "test-fixtures"))]
impl Simulation {
    /// Replace the grid.
    pub fn set_grid_for_test(&mut self, grid: Grid) {
        self.grid = grid;
    }

    /// Put `kind` in play at `pos` in spawn orientation.
    pub fn set_piece_for_test(&mut self, kind: ShapeKind, pos: Pos) {
        let mut piece = ActivePiece::spawn(kind);
        piece.pos = pos;
        self.piece = Some(piece);
    }

    pub fn set_next_kind_for_test(&mut self, kind: ShapeKind) {
        self.next_kind = kind;
    }

    /// Add a landed agent at (x, y).
    pub fn insert_agent_for_test(&mut self, x: f64, y: f64, direction: Direction) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        self.agents.push(Agent {
            id,
            x,
            y,
            direction,
            falling: false,
        });
        id
    }
}

fn random_kind(rng: &mut StdRng) -> ShapeKind {
    ShapeKind::ALL[rng.gen_range(0..ShapeKind::ALL.len())]
}
