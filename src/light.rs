use glam::{Mat4, Vec3, Vec4};

/// Number of point lights a scene always carries; the lights uniform buffer
/// is sized for exactly this many entries.
pub const NUM_LIGHTS: usize = 2;

/// A point light orbiting the scene origin.
///
/// Each light owns its animation clock and updates independently of every
/// other object in the scene.
#[derive(Clone, Debug)]
pub struct PointLight {
    base_position: Vec4,
    position: Vec4,
    color: Vec4,
    attenuation_distance: f32,
    orbit_rate: f32,
    elapsed: f32,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, attenuation_distance: f32) -> Self {
        let position = position.extend(1.0);
        Self {
            base_position: position,
            position,
            color: color.extend(1.0),
            attenuation_distance,
            orbit_rate: 0.0,
            elapsed: 0.0,
        }
    }

    /// Makes the light revolve around the world Y axis at `rate` rad/s.
    pub fn with_orbit(mut self, rate: f32) -> Self {
        self.orbit_rate = rate;
        self
    }

    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        if self.orbit_rate != 0.0 {
            let rotation = Mat4::from_rotation_y(self.orbit_rate * self.elapsed);
            self.position = rotation * self.base_position;
        }
    }

    pub fn position(&self) -> Vec4 {
        self.position
    }

    pub fn color(&self) -> Vec4 {
        self.color
    }

    pub fn attenuation_distance(&self) -> f32 {
        self.attenuation_distance
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 5.0, -5.0), Vec3::ONE, 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_light_keeps_its_position() {
        let mut light = PointLight::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, 8.0);
        light.update(0.5);
        assert_eq!(light.position(), Vec4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn orbiting_light_stays_on_its_ring() {
        let mut light = PointLight::new(Vec3::new(4.0, 1.0, 0.0), Vec3::ONE, 8.0).with_orbit(1.0);
        light.update(std::f32::consts::PI);
        let position = light.position();
        // Half a revolution about Y flips X, preserves height and radius.
        assert!((position.x + 4.0).abs() < 1e-4);
        assert!((position.y - 1.0).abs() < 1e-6);
        assert!((position.z).abs() < 1e-4);
    }
}
