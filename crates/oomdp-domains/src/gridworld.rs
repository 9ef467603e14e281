//! Grid world with walls and optional slip

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use oomdp_core::{
    sample_transition, Action, ActionSignature, Attribute, Domain, GroundedAction, ObjectInstance,
    OomdpError, Result, Reward, RewardFunction, State, TerminalFunction, TransitionProbability,
};

/// Agent object class
pub const CLASS_AGENT: &str = "agent";
/// Location object class
pub const CLASS_LOCATION: &str = "location";
/// Column attribute
pub const ATT_X: &str = "x";
/// Row attribute
pub const ATT_Y: &str = "y";

/// Compass moves and their offsets, in action registration order
const MOVES: [(&str, isize, isize); 4] = [
    ("north", 0, 1),
    ("south", 0, -1),
    ("east", 1, 0),
    ("west", -1, 0),
];

/// Grid world layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridWorld {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Blocked cells
    pub walls: Vec<(usize, usize)>,
    /// Probability that a move goes in one of the other three directions
    pub slip: f64,
    /// Seed for slip sampling; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            walls: Vec::new(),
            slip: 0.0,
            seed: None,
        }
    }
}

impl GridWorld {
    /// Open grid of the given size
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Add blocked cells
    #[must_use]
    pub fn with_walls(mut self, walls: impl IntoIterator<Item = (usize, usize)>) -> Self {
        self.walls.extend(walls);
        self
    }

    /// Set the slip probability, clamped to `[0, 1]`
    #[must_use]
    pub fn with_slip(mut self, slip: f64) -> Self {
        self.slip = slip.clamp(0.0, 1.0);
        self
    }

    /// Fix the seed of slip sampling
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the domain schema with one action per compass move
    pub fn domain(&self) -> Result<Arc<Domain>> {
        let max_x = i64::try_from(self.width).unwrap_or(i64::MAX) - 1;
        let max_y = i64::try_from(self.height).unwrap_or(i64::MAX) - 1;
        let map = Arc::new(GridMap {
            width: self.width,
            height: self.height,
            walls: self.walls.iter().copied().collect(),
        });
        // One generator per domain, shared by every move
        let rng = Arc::new(Mutex::new(match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }));

        let mut builder = Domain::builder()
            .attribute(Attribute::discrete_range(ATT_X, 0, max_x, 1))
            .attribute(Attribute::discrete_range(ATT_Y, 0, max_y, 1))
            .object_class(CLASS_AGENT, &[ATT_X, ATT_Y])
            .object_class(CLASS_LOCATION, &[ATT_X, ATT_Y]);
        for (direction, (name, _, _)) in MOVES.iter().enumerate() {
            builder = builder.action(Move {
                signature: ActionSignature::new(*name, &[CLASS_AGENT]),
                direction,
                map: Arc::clone(&map),
                slip: self.slip,
                rng: Arc::clone(&rng),
            });
        }
        debug!(
            width = self.width,
            height = self.height,
            walls = self.walls.len(),
            slip = self.slip,
            seed = ?self.seed,
            "grid world domain built"
        );
        builder.build()
    }

    /// State with one agent and a location object per goal cell
    pub fn state(
        domain: &Domain,
        agent: (usize, usize),
        goals: &[(usize, usize)],
    ) -> Result<State> {
        let mut state = State::new();
        state.add_object(place(domain.new_object("agent0", CLASS_AGENT)?, agent)?)?;
        for (i, goal) in goals.iter().enumerate() {
            let location = domain.new_object(format!("location{i}"), CLASS_LOCATION)?;
            state.add_object(place(location, *goal)?)?;
        }
        Ok(state)
    }
}

fn place(object: ObjectInstance, (x, y): (usize, usize)) -> Result<ObjectInstance> {
    object.with_value(ATT_X, x)?.with_value(ATT_Y, y)
}

/// Cell of an object
pub fn position(object: &ObjectInstance) -> Result<(usize, usize)> {
    Ok((object.discrete(ATT_X)?, object.discrete(ATT_Y)?))
}

/// Whether any agent shares a cell with any location
#[must_use]
pub fn agent_at_location(state: &State) -> bool {
    let locations: HashSet<(usize, usize)> = state
        .objects_of_class(CLASS_LOCATION)
        .filter_map(|o| position(o).ok())
        .collect();
    state
        .objects_of_class(CLASS_AGENT)
        .filter_map(|o| position(o).ok())
        .any(|cell| locations.contains(&cell))
}

#[derive(Debug)]
struct GridMap {
    width: usize,
    height: usize,
    walls: HashSet<(usize, usize)>,
}

impl GridMap {
    /// Cell reached from `from` by `(dx, dy)`; blocked moves stay put
    fn step(&self, from: (usize, usize), dx: isize, dy: isize) -> (usize, usize) {
        let target = (
            from.0.checked_add_signed(dx),
            from.1.checked_add_signed(dy),
        );
        match target {
            (Some(x), Some(y))
                if x < self.width && y < self.height && !self.walls.contains(&(x, y)) =>
            {
                (x, y)
            }
            _ => from,
        }
    }
}

fn agent_param(params: &[String]) -> Result<&str> {
    params
        .first()
        .map(String::as_str)
        .ok_or_else(|| OomdpError::SchemaViolation("move needs an agent parameter".into()))
}

struct Move {
    signature: ActionSignature,
    direction: usize,
    map: Arc<GridMap>,
    slip: f64,
    rng: Arc<Mutex<StdRng>>,
}

impl Move {
    fn moved(&self, state: &State, agent: &str, direction: usize) -> Result<State> {
        let (_, dx, dy) = MOVES[direction];
        let mut next = state.clone();
        let object = next.object_mut(agent)?;
        let (x, y) = self.map.step(position(object)?, dx, dy);
        object.set_value(ATT_X, x)?;
        object.set_value(ATT_Y, y)?;
        Ok(next)
    }
}

impl Action for Move {
    fn signature(&self) -> &ActionSignature {
        &self.signature
    }

    fn perform(&self, state: State, params: &[String]) -> Result<State> {
        if self.slip > 0.0 {
            let outcomes = self.transitions(&state, params)?;
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            return sample_transition(outcomes, &mut *rng);
        }
        self.moved(&state, agent_param(params)?, self.direction)
    }

    fn transitions(&self, state: &State, params: &[String]) -> Result<Vec<TransitionProbability>> {
        if self.slip <= 0.0 {
            return Ok(vec![TransitionProbability::new(
                self.moved(state, agent_param(params)?, self.direction)?,
                1.0,
            )]);
        }
        (0..MOVES.len())
            .map(|direction| {
                let probability = if direction == self.direction {
                    1.0 - self.slip
                } else {
                    self.slip / 3.0
                };
                Ok(TransitionProbability::new(
                    self.moved(state, agent_param(params)?, direction)?,
                    probability,
                ))
            })
            .collect()
    }
}

/// Goal reward on reaching a location, step cost elsewhere
#[derive(Debug, Clone, Copy)]
pub struct GoalReward {
    /// Reward for entering a goal cell
    pub goal: f64,
    /// Reward for every other transition
    pub step: f64,
}

impl Default for GoalReward {
    fn default() -> Self {
        Self {
            goal: 0.0,
            step: -1.0,
        }
    }
}

impl RewardFunction for GoalReward {
    fn reward(&self, _state: &State, _action: &GroundedAction, next_state: &State) -> Reward {
        if agent_at_location(next_state) {
            Reward(self.goal)
        } else {
            Reward(self.step)
        }
    }
}

/// Episodes end when the agent reaches a location
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalReached;

impl TerminalFunction for GoalReached {
    fn is_terminal(&self, state: &State) -> bool {
        agent_at_location(state)
    }
}
