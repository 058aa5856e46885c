//! Closed-form segment kinematics
//!
//! Each segment is evaluated analytically from its start state, so the same
//! function serves dense preview sampling and the end state used to chain
//! the next segment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult, Point3D};

/// Below this turn rate [rad/s] a coordinated turn is flown as a straight line
pub const TURN_RATE_EPSILON: f64 = 1e-4;

pub const PARAM_VELOCITY: &str = "velocity";
pub const PARAM_ACCEL: &str = "accel";
pub const PARAM_TURN_RATE: &str = "turn_rate";

/// Motion model of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionMode {
    /// Constant speed `params.velocity` along the start heading
    #[serde(alias = "Const Vel")]
    ConstVel,
    /// Constant acceleration `params.accel` from `start_vel` along the start heading
    #[serde(alias = "Const Accel")]
    ConstAccel,
    /// Coordinated turn at `params.velocity` and `params.turn_rate` [deg/s]
    Turn,
}

/// Position, heading [rad] and speed [m/s] at a segment boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub position: Point3D,
    pub heading: f64,
    pub velocity: f64,
}

impl KinematicState {
    pub fn new(position: Point3D, heading: f64, velocity: f64) -> Self {
        Self { position, heading, velocity }
    }
}

/// One kinematic chunk of a planned path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathSegment {
    pub mode: MotionMode,
    /// Duration [s], strictly positive
    pub duration: f64,
    pub start_pos: Point3D,
    pub start_heading: f64,
    pub start_vel: f64,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl MathSegment {
    pub fn new(mode: MotionMode, duration: f64, start: KinematicState) -> Self {
        Self {
            mode,
            duration,
            start_pos: start.position,
            start_heading: start.heading,
            start_vel: start.velocity,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Parameter value, 0.0 when absent
    pub fn param(&self, key: &str) -> f64 {
        self.params.get(key).copied().unwrap_or(0.0)
    }

    pub fn start_state(&self) -> KinematicState {
        KinematicState::new(self.start_pos, self.start_heading, self.start_vel)
    }

    pub fn validate(&self) -> MotionResult<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "segment duration must be positive, got {}",
                self.duration
            )));
        }
        Ok(())
    }

    /// Angular rate [rad/s] of a turn segment
    fn omega(&self) -> f64 {
        self.param(PARAM_TURN_RATE).to_radians()
    }

    /// Position at local time `t`, measured from the segment start
    pub fn position_at(&self, t: f64) -> Point3D {
        let Point3D { x: x0, y: y0, z: z0 } = self.start_pos;
        let theta = self.start_heading;

        let (x, y) = match self.mode {
            MotionMode::ConstVel => {
                let v = self.param(PARAM_VELOCITY);
                (x0 + v * theta.cos() * t, y0 + v * theta.sin() * t)
            }
            MotionMode::ConstAccel => {
                let a = self.param(PARAM_ACCEL);
                let s = self.start_vel * t + 0.5 * a * t * t;
                (x0 + s * theta.cos(), y0 + s * theta.sin())
            }
            MotionMode::Turn => {
                let v = self.param(PARAM_VELOCITY);
                let omega = self.omega();
                if omega.abs() < TURN_RATE_EPSILON {
                    (x0 + v * theta.cos() * t, y0 + v * theta.sin() * t)
                } else {
                    let r = v / omega;
                    (
                        x0 + r * ((omega * t + theta).sin() - theta.sin()),
                        y0 - r * ((omega * t + theta).cos() - theta.cos()),
                    )
                }
            }
        };

        Point3D::new(x, y, z0)
    }

    /// Exit state, evaluated in closed form at `t = duration`
    pub fn end_state(&self) -> KinematicState {
        let position = self.position_at(self.duration);
        let (heading, velocity) = match self.mode {
            MotionMode::ConstVel => (self.start_heading, self.param(PARAM_VELOCITY)),
            MotionMode::ConstAccel => (
                self.start_heading,
                self.start_vel + self.param(PARAM_ACCEL) * self.duration,
            ),
            MotionMode::Turn => {
                let omega = self.omega();
                let heading = if omega.abs() < TURN_RATE_EPSILON {
                    self.start_heading
                } else {
                    self.start_heading + omega * self.duration
                };
                (heading, self.param(PARAM_VELOCITY))
            }
        };
        KinematicState::new(position, heading, velocity)
    }

    /// `n` evenly spaced samples over `[0, duration]`, endpoints included
    pub fn sample(&self, n: usize) -> Vec<Point3D> {
        match n {
            0 => Vec::new(),
            1 => vec![self.position_at(0.0)],
            _ => (0..n)
                .map(|i| self.position_at(self.duration * i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}
