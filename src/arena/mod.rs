//! Arena controllers.
//!
//! An arena owns every agent record of one match, the obstacle, the physics
//! backend and the coordinator, and advances them with a single tick function:
//!
//! ```text
//! actuate → physics → reward shaping / termination → observe
//! ```
//!
//! Episodes start with `reset`, which runs the coordinator's `begin_episode`
//! for each agent. Once a terminal fires, every agent is terminal and `step`
//! refuses to run until the next `reset`.

mod goal;
mod tag;

pub use goal::{GoalArena, GoalStepResult};
pub use tag::{TagArena, TagStepResult};

use crate::action::{ActionDecoder, ActionRecord};
use crate::agent::AgentState;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::obstacle::ObstacleManager;
use crate::physics::{ContactReport, PhysicsWorld};
use crate::types::{AgentId, Pose};

/// Creates the agent records for `config`, facing the arena center.
fn spawn_agents(config: &ArenaConfig) -> Vec<AgentState> {
    config
        .start_positions
        .iter()
        .take(config.n_agents())
        .enumerate()
        .map(|(i, &position)| {
            AgentState::new(
                AgentId(i as u8),
                Pose::facing(position, config.arena_center),
                config.motion.agent_radius,
                config.motion.agent_mass,
            )
        })
        .collect()
}

/// Fails unless every agent is mid-episode.
fn ensure_active(agents: &[AgentState]) -> Result<(), ArenaError> {
    if agents.iter().all(AgentState::is_active) {
        Ok(())
    } else {
        Err(ArenaError::EpisodeNotActive)
    }
}

/// Ends whatever episode the agents are in so the next `begin_episode` starts
/// a fresh one.
fn abandon_episode(agents: &mut [AgentState]) {
    for agent in agents.iter_mut() {
        agent.end_episode();
    }
}

/// Refreshes each agent's grounded flag from the physics probe.
fn probe_ground<P: PhysicsWorld>(physics: &P, agents: &mut [AgentState]) {
    for agent in agents.iter_mut() {
        agent.grounded = physics.is_grounded(&agent.body);
    }
}

/// Decodes one action per agent, advances physics by one tick and bumps the
/// step counters. Returns the contact report of each agent.
fn advance<P: PhysicsWorld>(
    physics: &mut P,
    agents: &mut [AgentState],
    obstacle: &mut ObstacleManager,
    actions: &[ActionRecord],
    config: &ArenaConfig,
) -> Vec<ContactReport> {
    let dt = config.fixed_delta;
    for (agent, action) in agents.iter_mut().zip(actions) {
        let grounded = agent.grounded;
        ActionDecoder::apply(action, &mut agent.body, grounded, &config.motion, dt);
    }

    let mut bodies: Vec<_> = agents.iter().map(|a| a.body).collect();
    let contacts = physics.step(&mut bodies, obstacle.body_mut(), dt);

    for ((agent, body), contact) in agents.iter_mut().zip(bodies).zip(&contacts) {
        agent.body = body;
        agent.grounded = contact.grounded;
        agent.step_count += 1;
    }
    contacts
}
