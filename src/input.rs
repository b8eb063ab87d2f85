/// Directional movement flags sampled by the host once per frame.
///
/// Each flag is independent; opposing flags set in the same frame cancel
/// out when the camera accumulates them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionsInput {
    pub front: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl DirectionsInput {
    pub fn any(&self) -> bool {
        self.front || self.back || self.left || self.right || self.up || self.down
    }
}

/// Signed mouse movement since the last sample, in device units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseRelativeMovement {
    pub x: f32,
    pub y: f32,
}

impl MouseRelativeMovement {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Adds another sample; the host accumulates raw deltas between frames.
    pub fn accumulate(&mut self, x: f32, y: f32) {
        self.x += x;
        self.y += y;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_default_to_idle() {
        let directions = DirectionsInput::default();
        assert!(!directions.any());
    }

    #[test]
    fn mouse_movement_accumulates_and_resets() {
        let mut movement = MouseRelativeMovement::default();
        movement.accumulate(2.0, -1.0);
        movement.accumulate(0.5, 0.5);
        assert_eq!(movement, MouseRelativeMovement::new(2.5, -0.5));
        movement.reset();
        assert_eq!(movement, MouseRelativeMovement::default());
    }
}
