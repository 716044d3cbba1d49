//! Physics collaborator interface and a flat-arena reference backend.
//!
//! The simulation core owns body state; a [`PhysicsWorld`] only integrates it
//! and reports the contacts the reward shaper needs.

use glam::{Quat, Vec3};

use crate::types::{horizontal, Body};

/// Contacts observed for one agent during a physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactReport {
    /// Ground probe hit after the step.
    pub grounded: bool,
    /// Approach speed of an agent–obstacle contact, if one happened.
    pub obstacle_impact: Option<f32>,
}

/// Integrates rigid bodies for one fixed tick.
pub trait PhysicsWorld {
    /// Advances `agents` and the optional `obstacle` by `dt` seconds and
    /// returns one [`ContactReport`] per agent, in the same order.
    fn step(&mut self, agents: &mut [Body], obstacle: Option<&mut Body>, dt: f32)
        -> Vec<ContactReport>;

    /// Short downward probe: is the body standing on something?
    fn is_grounded(&self, body: &Body) -> bool;
}

/// Gravity, a flat circular floor, linear damping and sphere contacts.
#[derive(Debug, Clone)]
pub struct FlatArenaPhysics {
    pub gravity: f32,
    pub floor_height: f32,
    pub floor_center: Vec3,
    /// Radius of the floor disc; bodies beyond it fall.
    pub floor_radius: f32,
    pub linear_damping: f32,
    /// Length of the ground probe below a body's lowest point.
    pub ground_probe: f32,
}

impl FlatArenaPhysics {
    /// Floor disc of `floor_radius` centered on `floor_center`, at its height.
    pub fn new(floor_center: Vec3, floor_radius: f32) -> Self {
        Self {
            gravity: -9.81,
            floor_height: floor_center.y,
            floor_center,
            floor_radius,
            linear_damping: 0.1,
            ground_probe: 0.1,
        }
    }

    fn over_floor(&self, position: Vec3) -> bool {
        horizontal(position - self.floor_center).length() <= self.floor_radius
    }

    fn integrate(&self, body: &mut Body, dt: f32) {
        body.linear_velocity.y += self.gravity * dt;
        body.linear_velocity *= (1.0 - self.linear_damping * dt).max(0.0);
        body.pose.position += body.linear_velocity * dt;

        let yaw = body.angular_velocity.y * dt;
        if yaw != 0.0 {
            body.pose.rotation = (Quat::from_rotation_y(yaw) * body.pose.rotation).normalize();
        }

        let lowest = body.pose.position.y - body.radius;
        // Once below the surface off the edge, keep falling.
        let above_surface = lowest > self.floor_height - body.radius;
        if self.over_floor(body.pose.position) && above_surface && lowest < self.floor_height {
            body.pose.position.y = self.floor_height + body.radius;
            if body.linear_velocity.y < 0.0 {
                body.linear_velocity.y = 0.0;
            }
        }
    }

    /// Separates two overlapping spheres, splitting the correction by mass.
    /// Returns the approach speed along the contact normal when they touch.
    fn resolve(a: &mut Body, b: &mut Body) -> Option<f32> {
        let delta = a.pose.position - b.pose.position;
        let dist = delta.length();
        let min_dist = a.radius + b.radius;
        if dist >= min_dist {
            return None;
        }
        let normal = if dist > 1e-6 { delta / dist } else { Vec3::X };
        let total = a.mass + b.mass;
        let (wa, wb) = (b.mass / total, a.mass / total);
        let depth = min_dist - dist;
        a.pose.position += normal * depth * wa;
        b.pose.position -= normal * depth * wb;

        let approach = (b.linear_velocity - a.linear_velocity).dot(normal);
        if approach > 0.0 {
            a.linear_velocity += normal * approach * wa;
            b.linear_velocity -= normal * approach * wb;
        }
        Some(approach.max(0.0))
    }
}

impl PhysicsWorld for FlatArenaPhysics {
    fn step(
        &mut self,
        agents: &mut [Body],
        mut obstacle: Option<&mut Body>,
        dt: f32,
    ) -> Vec<ContactReport> {
        for body in agents.iter_mut() {
            self.integrate(body, dt);
        }
        if let Some(obs) = obstacle.as_deref_mut() {
            self.integrate(obs, dt);
        }

        let mut reports = vec![ContactReport::default(); agents.len()];

        for i in 0..agents.len() {
            for j in (i + 1)..agents.len() {
                let (left, right) = agents.split_at_mut(j);
                Self::resolve(&mut left[i], &mut right[0]);
            }
        }

        if let Some(obs) = obstacle.as_deref_mut() {
            for (body, report) in agents.iter_mut().zip(reports.iter_mut()) {
                report.obstacle_impact = Self::resolve(body, obs);
            }
        }

        for (body, report) in agents.iter().zip(reports.iter_mut()) {
            report.grounded = self.is_grounded(body);
        }
        reports
    }

    fn is_grounded(&self, body: &Body) -> bool {
        let gap = body.pose.position.y - body.radius - self.floor_height;
        self.over_floor(body.pose.position) && (-body.radius..=self.ground_probe).contains(&gap)
    }
}
