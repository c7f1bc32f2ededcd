//! Time-based interpolation for the camera fly-to.

use cgmath::{Point3, Vector3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Cubic ease-in for the first half, ease-out for the second.
    Power3InOut,
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power3InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Interpolates a value from `start` to `end` over `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub duration: f32,
    pub easing: Easing,
    elapsed: f32,
}

impl Tween {
    pub fn new(start: Point3<f32>, end: Point3<f32>, duration: f32, easing: Easing) -> Self {
        Self {
            start,
            end,
            duration,
            easing,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// The current value; exactly `end` once the duration has elapsed.
    pub fn value(&self) -> Point3<f32> {
        if self.is_finished() {
            return self.end;
        }
        let k = self.easing.apply(self.elapsed / self.duration);
        let delta: Vector3<f32> = self.end - self.start;
        self.start + delta * k
    }
}

/// Camera position and orbit target, animated together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTransition {
    pub position: Tween,
    pub target: Tween,
}

/// The one in-flight camera transition, if any.
///
/// Starting a new transition replaces the current one; the new tween starts
/// from whatever values the camera has at that moment.
#[derive(Clone, Debug, Default)]
pub struct TransitionSlot {
    active: Option<CameraTransition>,
}

pub const TRANSITION_SECONDS: f32 = 2.0;

impl TransitionSlot {
    pub fn start(
        &mut self,
        from: (Point3<f32>, Point3<f32>),
        to: (Point3<f32>, Point3<f32>),
    ) {
        if self.active.is_some() {
            log::debug!("camera transition superseded");
        }
        self.active = Some(CameraTransition {
            position: Tween::new(from.0, to.0, TRANSITION_SECONDS, Easing::Power3InOut),
            target: Tween::new(from.1, to.1, TRANSITION_SECONDS, Easing::Power3InOut),
        });
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<&CameraTransition> {
        self.active.as_ref()
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Advance by `dt` seconds and return the new `(position, target)`.
    ///
    /// The slot empties on the step that reaches the end values.
    pub fn step(&mut self, dt: f32) -> Option<(Point3<f32>, Point3<f32>)> {
        let transition = self.active.as_mut()?;
        transition.position.advance(dt);
        transition.target.advance(dt);
        let values = (transition.position.value(), transition.target.value());
        if transition.position.is_finished() && transition.target.is_finished() {
            self.active = None;
        }
        Some(values)
    }
}
