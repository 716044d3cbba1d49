//! Episode coordinator and role arbiter.
//!
//! Exactly one agent index holds spawner authority for the lifetime of the
//! coordinator. Only the spawner's `begin_episode` draws roles, places both
//! agents and spawns the obstacle; the other agent's call just resets itself.
//! Termination is always applied to every agent at once. When several agents
//! detect a terminal on the same tick, [`EpisodeCoordinator::arbitrate`]
//! decides which one ends the episode from what the agents did, never from
//! their index.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::AgentState;
use crate::config::{ArenaConfig, SpawnLayout};
use crate::obstacle::ObstacleManager;
use crate::reward::{RewardShaper, RewardUpdate, TerminalCause, TerminalEvent};
use crate::scoreboard::Outcome;
use crate::types::{Pose, Role};

/// Drives episode boundaries for the agents of one arena.
#[derive(Debug)]
pub struct EpisodeCoordinator {
    spawner: usize,
    rng: StdRng,
    episode_index: u64,
}

impl EpisodeCoordinator {
    /// Creates a coordinator with `spawner` as the authoritative agent index.
    pub fn new(spawner: usize, seed: u64) -> Self {
        Self {
            spawner,
            rng: StdRng::seed_from_u64(seed),
            episode_index: 0,
        }
    }

    pub fn spawner(&self) -> usize {
        self.spawner
    }

    /// Number of episodes started by the spawner so far.
    pub fn episode_index(&self) -> u64 {
        self.episode_index
    }

    /// Shared episode RNG, for placement decisions made outside the
    /// coordinator (goal targets).
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Starts a new episode for `agents[index]`.
    ///
    /// Resets the agent; if it is the spawner, also assigns complementary roles
    /// (when there are two agents), places every agent according to the spawn
    /// layout and spawns the obstacle clear of the agents and `target`.
    ///
    /// A spawner that has already begun this episode and not ticked since is
    /// only reset again: roles, placement, obstacle and episode counter stay.
    pub fn begin_episode(
        &mut self,
        agents: &mut [AgentState],
        index: usize,
        obstacle: &mut ObstacleManager,
        target: Option<Vec3>,
        config: &ArenaConfig,
    ) {
        let already_begun = agents[index].is_active() && agents[index].step_count == 0;
        agents[index].reset_for_episode();

        if index != self.spawner || already_begun {
            return;
        }

        if let [first, second] = agents {
            let spawner_is_tagger = self.rng.gen_bool(0.5);
            let own = if spawner_is_tagger {
                Role::Tagger
            } else {
                Role::Runner
            };
            let (me, other) = if index == 0 {
                (first, second)
            } else {
                (second, first)
            };
            me.role = own;
            other.role = own.complement();
        }

        self.place_agents(agents, config);

        let positions: Vec<Vec3> = agents.iter().map(AgentState::position).collect();
        obstacle.spawn(&mut self.rng, &positions, target);

        self.episode_index += 1;
        tracing::debug!(
            episode = self.episode_index,
            spawner = %agents[index].id,
            roles = ?agents.iter().map(|a| a.role).collect::<Vec<_>>(),
            "episode started"
        );
    }

    /// Ends the episode for every agent: the detecting agent gets the event's
    /// own reward, all others the complementary reward. Returns the outcome to
    /// record.
    pub fn terminate(agents: &mut [AgentState], index: usize, event: &TerminalEvent) -> Outcome {
        for (i, agent) in agents.iter_mut().enumerate() {
            if i == index {
                event.own.apply(agent);
            } else {
                event.other.apply(agent);
            }
            agent.end_episode();
        }
        event.outcome
    }

    /// Chooses which of the terminals `detected` this tick ends the episode.
    ///
    /// Each entry is an agent index and the event that agent raised; all of
    /// them must come from the same post-physics state. The earliest pipeline
    /// check wins. Ties within a cause are broken by behaviour:
    ///
    /// - out of bounds: an agent that fell or left the arena loses over one
    ///   that only stretched the leash; if both breached, the one farther from
    ///   the center loses; a pure leash breach is the runner's.
    /// - stuck: the agent stuck first loses; stuck since the same tick is a
    ///   draw and both take the stuck terminal reward.
    /// - tag and step limit: both sides raise the same rewards; the tagger's
    ///   event is used.
    ///
    /// Agent order only decides exact geometric ties.
    pub fn arbitrate(
        agents: &[AgentState],
        detected: &[(usize, TerminalEvent)],
        config: &ArenaConfig,
    ) -> Option<(usize, TerminalEvent)> {
        let first = detected.iter().map(|(_, e)| e.cause.precedence()).min()?;
        let tied: Vec<(usize, TerminalEvent)> = detected
            .iter()
            .copied()
            .filter(|(_, e)| e.cause.precedence() == first)
            .collect();

        let &(_, event) = tied.first()?;
        if tied.len() == 1 {
            return tied.first().copied();
        }

        match event.cause {
            TerminalCause::OutOfBounds => Self::blame_out_of_bounds(agents, &tied, config),
            TerminalCause::Stuck => Self::blame_stuck(agents, &tied, config),
            TerminalCause::Tag | TerminalCause::GoalReached | TerminalCause::StepLimit => tied
                .iter()
                .copied()
                .find(|&(i, _)| agents[i].role == Role::Tagger)
                .or_else(|| tied.first().copied()),
        }
    }

    fn blame_out_of_bounds(
        agents: &[AgentState],
        tied: &[(usize, TerminalEvent)],
        config: &ArenaConfig,
    ) -> Option<(usize, TerminalEvent)> {
        let breached: Vec<(usize, TerminalEvent)> = tied
            .iter()
            .copied()
            .filter(|&(i, _)| RewardShaper::breaches_bounds(agents[i].position(), config))
            .collect();

        if breached.is_empty() {
            return tied
                .iter()
                .copied()
                .find(|&(i, _)| agents[i].role == Role::Runner)
                .or_else(|| tied.first().copied());
        }

        let from_center = |i: usize| agents[i].position().distance(config.arena_center);
        breached.into_iter().max_by(|a, b| {
            from_center(a.0)
                .total_cmp(&from_center(b.0))
                .then(b.0.cmp(&a.0))
        })
    }

    fn blame_stuck(
        agents: &[AgentState],
        tied: &[(usize, TerminalEvent)],
        config: &ArenaConfig,
    ) -> Option<(usize, TerminalEvent)> {
        let since = |i: usize| agents[i].stuck.stuck_since().unwrap_or(f32::INFINITY);
        let earliest = tied
            .iter()
            .map(|&(i, _)| since(i))
            .fold(f32::INFINITY, f32::min);
        let first: Vec<(usize, TerminalEvent)> = tied
            .iter()
            .copied()
            .filter(|&(i, _)| since(i) == earliest)
            .collect();

        match first.as_slice() {
            [only] => Some(*only),
            _ => first.first().map(|&(i, event)| {
                let reward = RewardUpdate::Set(config.reward.stuck_terminal_reward);
                let draw = TerminalEvent {
                    own: reward,
                    other: reward,
                    outcome: Outcome::Draw,
                    ..event
                };
                (i, draw)
            }),
        }
    }

    /// Writes new start poses and moves the agents onto them.
    fn place_agents(&mut self, agents: &mut [AgentState], config: &ArenaConfig) {
        let poses: Vec<Pose> = match config.spawn_layout {
            SpawnLayout::Fixed => agents.iter().map(|a| a.start_pose).collect(),
            SpawnLayout::Circle {
                radius,
                angle_degrees,
            } => Self::circle_poses(config, radius, angle_degrees.to_radians()),
            SpawnLayout::RandomCircle { radius } => {
                let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
                Self::circle_poses(config, radius, angle)
            }
        };

        for (agent, pose) in agents.iter_mut().zip(poses) {
            agent.start_pose = pose;
            agent.body.pose = pose;
            agent.body.halt();
        }
    }

    /// Opposite points on a circle around the arena center, facing each other.
    fn circle_poses(config: &ArenaConfig, radius: f32, angle: f32) -> Vec<Pose> {
        let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * radius;
        let center = config.arena_center;
        let a = center + offset + Vec3::Y * config.start_positions[0].y;
        let b = center - offset + Vec3::Y * config.start_positions[1].y;
        vec![Pose::facing(a, b), Pose::facing(b, a)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::EpisodePhase;
    use crate::config::{ObstacleConfig, ObstacleMode, StuckConfig};
    use crate::types::AgentId;

    fn agents(config: &ArenaConfig) -> Vec<AgentState> {
        config
            .start_positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                AgentState::new(
                    AgentId(i as u8),
                    Pose::facing(p, config.arena_center),
                    config.motion.agent_radius,
                    config.motion.agent_mass,
                )
            })
            .collect()
    }

    fn begin_both(
        coordinator: &mut EpisodeCoordinator,
        agents: &mut [AgentState],
        obstacle: &mut ObstacleManager,
        config: &ArenaConfig,
    ) {
        for agent in agents.iter_mut() {
            agent.end_episode();
        }
        for i in 0..agents.len() {
            coordinator.begin_episode(agents, i, obstacle, None, config);
        }
    }

    #[test]
    fn roles_are_always_complementary() {
        let config = ArenaConfig::tag();
        let mut coordinator = EpisodeCoordinator::new(0, 11);
        let mut obstacle = ObstacleManager::new(config.obstacle.clone());
        let mut agents = agents(&config);
        let mut tagger_first = 0;
        for _ in 0..200 {
            begin_both(&mut coordinator, &mut agents, &mut obstacle, &config);
            let roles = [agents[0].role, agents[1].role];
            assert!(
                roles == [Role::Tagger, Role::Runner] || roles == [Role::Runner, Role::Tagger],
                "roles {roles:?}"
            );
            if roles[0] == Role::Tagger {
                tagger_first += 1;
            }
        }
        // Both assignments occur.
        assert!(tagger_first > 50 && tagger_first < 150);
    }

    #[test]
    fn non_spawner_never_assigns() {
        let config = ArenaConfig::tag();
        let mut coordinator = EpisodeCoordinator::new(1, 3);
        let mut obstacle = ObstacleManager::new(config.obstacle.clone());
        let mut agents = agents(&config);
        coordinator.begin_episode(&mut agents, 0, &mut obstacle, None, &config);
        assert_eq!(agents[0].role, Role::None);
        assert_eq!(agents[1].role, Role::None);
        assert!(!obstacle.is_active());
        assert_eq!(coordinator.episode_index(), 0);

        coordinator.begin_episode(&mut agents, 1, &mut obstacle, None, &config);
        assert_eq!(agents[0].role.complement(), agents[1].role);
        assert!(obstacle.is_active());
        assert_eq!(coordinator.episode_index(), 1);
    }

    #[test]
    fn circle_layout_places_agents_opposite_and_facing() {
        let config = ArenaConfig {
            spawn_layout: SpawnLayout::Circle {
                radius: 4.0,
                angle_degrees: 90.0,
            },
            ..ArenaConfig::tag()
        };
        let mut coordinator = EpisodeCoordinator::new(0, 5);
        let mut obstacle = ObstacleManager::new(config.obstacle.clone());
        let mut agents = agents(&config);
        begin_both(&mut coordinator, &mut agents, &mut obstacle, &config);

        let (a, b) = (agents[0].position(), agents[1].position());
        assert!((a - Vec3::new(0.0, 0.5, 4.0)).length() < 1e-4);
        assert!((b - Vec3::new(0.0, 0.5, -4.0)).length() < 1e-4);
        let dir = (b - a).normalize();
        assert!(agents[0].forward().dot(dir) > 0.999);
        assert!(agents[1].forward().dot(-dir) > 0.999);
    }

    #[test]
    fn placement_is_order_independent() {
        let config = ArenaConfig::tag();
        let mut obstacle = ObstacleManager::new(config.obstacle.clone());

        let mut forward = agents(&config);
        let mut coordinator = EpisodeCoordinator::new(0, 9);
        coordinator.begin_episode(&mut forward, 0, &mut obstacle, None, &config);
        coordinator.begin_episode(&mut forward, 1, &mut obstacle, None, &config);

        let mut backward = agents(&config);
        let mut coordinator = EpisodeCoordinator::new(0, 9);
        coordinator.begin_episode(&mut backward, 1, &mut obstacle, None, &config);
        coordinator.begin_episode(&mut backward, 0, &mut obstacle, None, &config);

        for (f, b) in forward.iter().zip(&backward) {
            assert_eq!(f.body.pose, b.body.pose);
            assert_eq!(f.role, b.role);
        }
    }

    #[test]
    fn begin_episode_is_idempotent() {
        let config = ArenaConfig::tag();
        let mut coordinator = EpisodeCoordinator::new(0, 21);
        let mut obstacle = ObstacleManager::new(config.obstacle.clone());
        let mut agents = agents(&config);
        agents[0].body.pose.position = Vec3::new(7.0, 2.0, 7.0);
        agents[0].step_count = 77;

        coordinator.begin_episode(&mut agents, 0, &mut obstacle, None, &config);
        let once = agents.clone();
        let obstacle_once = obstacle.body().copied();
        let generation = obstacle.generation();
        coordinator.begin_episode(&mut agents, 0, &mut obstacle, None, &config);

        for (a, b) in once.iter().zip(&agents) {
            assert_eq!(a.body, b.body);
            assert_eq!(a.start_pose, b.start_pose);
            assert_eq!(a.role, b.role);
        }
        let (once, twice) = (&once[0], &agents[0]);
        assert_eq!(once.step_count, twice.step_count);
        assert_eq!(once.prev_distance, twice.prev_distance);
        assert_eq!(once.stuck, twice.stuck);
        assert_eq!(once.cumulative_reward, twice.cumulative_reward);
        assert_eq!(once.phase, twice.phase);
        assert_eq!(agents[0].role.complement(), agents[1].role);

        assert_eq!(coordinator.episode_index(), 1);
        assert_eq!(obstacle.generation(), generation);
        assert_eq!(obstacle.body().copied(), obstacle_once);
    }

    #[test]
    fn ended_episode_is_redrawn() {
        let config = ArenaConfig::tag();
        let mut coordinator = EpisodeCoordinator::new(0, 21);
        let mut obstacle = ObstacleManager::new(config.obstacle.clone());
        let mut agents = agents(&config);
        begin_both(&mut coordinator, &mut agents, &mut obstacle, &config);
        let first = agents[0].start_pose;
        begin_both(&mut coordinator, &mut agents, &mut obstacle, &config);
        assert_eq!(coordinator.episode_index(), 2);
        assert_ne!(agents[0].start_pose, first);
    }

    #[test]
    fn single_agent_gets_no_role() {
        let config = ArenaConfig::goal();
        let mut coordinator = EpisodeCoordinator::new(0, 1);
        let mut obstacle = ObstacleManager::new(ObstacleConfig {
            mode: ObstacleMode::Disabled,
            ..config.obstacle.clone()
        });
        let mut agents = agents(&config);
        agents.truncate(1);
        coordinator.begin_episode(&mut agents, 0, &mut obstacle, Some(Vec3::X), &config);
        assert_eq!(agents[0].role, Role::None);
        assert_eq!(agents[0].phase, EpisodePhase::Active);
    }

    /// Two active agents with the given roles at the given positions.
    fn pair(roles: [Role; 2], positions: [Vec3; 2]) -> Vec<AgentState> {
        let mut agents = agents(&ArenaConfig::tag());
        for ((agent, role), p) in agents.iter_mut().zip(roles).zip(positions) {
            agent.reset_for_episode();
            agent.role = role;
            agent.body.pose.position = p;
        }
        agents
    }

    fn loss(cause: TerminalCause, role: Role) -> TerminalEvent {
        TerminalEvent {
            cause,
            own: RewardUpdate::Set(-1.0),
            other: RewardUpdate::Add(0.5),
            outcome: match role {
                Role::Tagger => Outcome::RunnerWon,
                _ => Outcome::TaggerWon,
            },
        }
    }

    #[test]
    fn leash_breach_is_the_runners_in_either_order() {
        let config = ArenaConfig::tag();
        let (origin, far) = (Vec3::new(0.0, 0.5, 0.0), Vec3::new(16.0, 0.5, 0.0));
        for runner in 0..2 {
            let tagger = 1 - runner;
            let mut roles = [Role::Tagger; 2];
            roles[runner] = Role::Runner;
            let mut positions = [origin; 2];
            positions[runner] = far;
            let agents = pair(roles, positions);
            let detected = [
                (0, loss(TerminalCause::OutOfBounds, agents[0].role)),
                (1, loss(TerminalCause::OutOfBounds, agents[1].role)),
            ];
            let (blamed, event) =
                EpisodeCoordinator::arbitrate(&agents, &detected, &config).unwrap();
            assert_eq!(blamed, runner, "tagger at {tagger}");
            assert_eq!(event.outcome, Outcome::TaggerWon);
        }
    }

    #[test]
    fn falling_agent_loses_over_leash() {
        let config = ArenaConfig::tag();
        // The tagger fell off the edge; the runner only exceeds the leash.
        let agents = pair(
            [Role::Runner, Role::Tagger],
            [Vec3::new(5.0, 0.5, 0.0), Vec3::new(21.0, -3.0, 0.0)],
        );
        let detected = [
            (0, loss(TerminalCause::OutOfBounds, Role::Runner)),
            (1, loss(TerminalCause::OutOfBounds, Role::Tagger)),
        ];
        let (blamed, event) = EpisodeCoordinator::arbitrate(&agents, &detected, &config).unwrap();
        assert_eq!(blamed, 1);
        assert_eq!(event.outcome, Outcome::RunnerWon);
    }

    #[test]
    fn earlier_pipeline_check_wins() {
        let config = ArenaConfig::tag();
        let agents = pair(
            [Role::Tagger, Role::Runner],
            [Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -3.0, 0.0)],
        );
        let detected = [
            (0, loss(TerminalCause::StepLimit, Role::Tagger)),
            (1, loss(TerminalCause::OutOfBounds, Role::Runner)),
        ];
        let (blamed, event) = EpisodeCoordinator::arbitrate(&agents, &detected, &config).unwrap();
        assert_eq!(blamed, 1);
        assert_eq!(event.cause, TerminalCause::OutOfBounds);
        assert_eq!(EpisodeCoordinator::arbitrate(&agents, &[], &config), None);
    }

    #[test]
    fn first_stuck_agent_loses_and_simultaneous_stuck_is_a_draw() {
        let config = ArenaConfig {
            stuck: StuckConfig {
                displacement_threshold: 0.01,
                frames: 1,
                timeout_secs: 10.0,
            },
            ..ArenaConfig::tag()
        };
        let still = |agent: &mut AgentState, ticks: std::ops::Range<u32>| {
            let p = agent.position();
            for t in ticks {
                agent.stuck.observe(p, t as f32 * 0.02, &config.stuck);
            }
        };
        let detected = |agents: &[AgentState]| {
            [
                (0, loss(TerminalCause::Stuck, agents[0].role)),
                (1, loss(TerminalCause::Stuck, agents[1].role)),
            ]
        };

        let mut agents = pair(
            [Role::Tagger, Role::Runner],
            [Vec3::new(-3.0, 0.5, 0.0), Vec3::new(3.0, 0.5, 0.0)],
        );
        still(&mut agents[1], 0..5);
        still(&mut agents[0], 2..5);
        let (blamed, event) =
            EpisodeCoordinator::arbitrate(&agents, &detected(&agents), &config).unwrap();
        assert_eq!(blamed, 1);
        assert_eq!(event.outcome, Outcome::TaggerWon);

        let mut agents = pair(
            [Role::Runner, Role::Tagger],
            [Vec3::new(-3.0, 0.5, 0.0), Vec3::new(3.0, 0.5, 0.0)],
        );
        still(&mut agents[0], 0..5);
        still(&mut agents[1], 0..5);
        let (_, event) =
            EpisodeCoordinator::arbitrate(&agents, &detected(&agents), &config).unwrap();
        assert_eq!(event.outcome, Outcome::Draw);
        let reward = RewardUpdate::Set(config.reward.stuck_terminal_reward);
        assert_eq!(event.own, reward);
        assert_eq!(event.other, reward);
    }

    #[test]
    fn terminate_ends_both_with_complementary_rewards() {
        let config = ArenaConfig::tag();
        let mut agents = agents(&config);
        for a in agents.iter_mut() {
            a.reset_for_episode();
            a.add_reward(0.1);
        }
        let event = TerminalEvent {
            cause: TerminalCause::OutOfBounds,
            own: RewardUpdate::Set(-1.0),
            other: RewardUpdate::Add(0.5),
            outcome: Outcome::TaggerWon,
        };
        let outcome = EpisodeCoordinator::terminate(&mut agents, 1, &event);
        assert_eq!(outcome, Outcome::TaggerWon);
        assert!(agents.iter().all(|a| a.phase == EpisodePhase::Terminal));
        assert!((agents[1].pending_reward + 1.0).abs() < 1e-6);
        assert!((agents[0].pending_reward - 0.6).abs() < 1e-6);
    }
}
