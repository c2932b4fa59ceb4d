//! Row-level smooth scroll with exponential ease-out.
//!
//! When the scroll target changes, the distance between the old visible
//! position and the new target becomes a row displacement.  Each tick the
//! displacement decays toward zero, so the document slides a few terminal
//! rows per frame with visible deceleration.  Retargeting mid-flight starts
//! from wherever the animation currently is.

/// Row-offset smooth scroll animator.
#[derive(Debug, Clone)]
pub struct ScrollAnimator {
    /// Where the animation is heading.
    target: i64,
    /// Current displacement from `target`.  Positive = still above the
    /// target (scrolling down); negative = below it (scrolling up).
    row_offset: f64,
    /// Damping: `offset *= (1 - speed)` each tick.
    speed: f64,
}

impl ScrollAnimator {
    pub fn new(speed: f64) -> Self {
        Self {
            target: 0,
            row_offset: 0.0,
            speed: speed.clamp(0.05, 0.95),
        }
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(0.05, 0.95);
    }

    /// Animate from the current visible position toward `target`.
    pub fn set_target(&mut self, target: i64) {
        if target == self.target {
            return;
        }
        let current = self.position_f64();
        self.target = target;
        self.row_offset = target as f64 - current;
    }

    /// Move to `target` immediately, cancelling any motion.
    pub fn jump(&mut self, target: i64) {
        self.target = target;
        self.row_offset = 0.0;
    }

    /// Decay the offset toward zero.  Call once per frame.
    pub fn tick(&mut self) {
        self.row_offset *= 1.0 - self.speed;
        if self.row_offset.abs() < 0.4 {
            self.row_offset = 0.0;
        }
    }

    /// Visible scroll position (integer rows).
    pub fn position(&self) -> i64 {
        self.position_f64().round() as i64
    }

    /// Row the animation is heading for.
    pub fn target(&self) -> i64 {
        self.target
    }

    /// True until the animation has fully settled.
    pub fn is_animating(&self) -> bool {
        self.row_offset != 0.0
    }

    fn position_f64(&self) -> f64 {
        self.target as f64 - self.row_offset
    }
}
