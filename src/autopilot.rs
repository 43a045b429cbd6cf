//! Input policies for headless play.

use crate::game::{Command, Simulation};
use crate::grid::COLS;
use rand::prelude::*;

/// Chooses the next command for the current state, or `None` to idle this frame.
///
/// Object-safe so it can be used as `Box<dyn Policy>`.
pub trait Policy {
    fn choose_command(&mut self, sim: &Simulation) -> Option<Command>;
}

/// Placement the policy is steering the current piece towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    rotations_left: u8,
    target_x: i32,
    last_x: Option<i32>,
}

/// Picks a random rotation and column for every piece, steers there, hard-drops.
#[derive(Debug)]
pub struct RandomPolicy {
    rng: StdRng,
    plan: Option<Plan>,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            plan: None,
        }
    }
}

impl Policy for RandomPolicy {
    fn choose_command(&mut self, sim: &Simulation) -> Option<Command> {
        let Some(piece) = sim.piece() else {
            self.plan = None;
            return None;
        };
        let rng = &mut self.rng;
        let plan = self.plan.get_or_insert_with(|| Plan {
            rotations_left: rng.gen_range(0..4),
            target_x: rng.gen_range(-1..COLS as i32),
            last_x: None,
        });

        if plan.rotations_left > 0 {
            plan.rotations_left -= 1;
            return Some(Command::Rotate);
        }

        let x = piece.pos.x;
        let stuck = plan.last_x == Some(x);
        plan.last_x = Some(x);
        let command = if x == plan.target_x || stuck {
            self.plan = None;
            Command::HardDrop
        } else if x < plan.target_x {
            Command::MoveRight
        } else {
            Command::MoveLeft
        };
        Some(command)
    }
}
