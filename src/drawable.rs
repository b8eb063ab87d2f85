use glam::{Mat4, Vec3, Vec4};

use crate::geometry::MeshData;
use crate::render::pipeline::RenderableGpu;
use crate::texture::Material;

/// Closed-form animation attached to a static renderable.
///
/// Each variant is a function of the object's own elapsed clock and fixed
/// per-variant constants; there is no hidden shared state between objects.
#[derive(Clone, Debug, PartialEq)]
pub enum Motion {
    Fixed,
    /// Rotates about the world Y axis.
    Spin { rate: f32 },
    /// Spins in place while revolving around the origin at a fixed offset.
    Orbit {
        spin_rate: f32,
        orbit_rate: f32,
        offset: Vec3,
        scale: f32,
    },
    /// Grows and shrinks between two scale bounds while spinning; the spin
    /// direction flips every time a bound is reached.
    PingPong(PingPong),
    /// Rotates while bobbing up and down on a sine wave at a fixed radius.
    Bob { radius: f32 },
}

/// Reflecting scale oscillation.
///
/// The scale parameter advances by `rate * dt`; when it reaches a bound it
/// is set exactly to that bound, the rate sign flips and the spin
/// accumulator is negated, mirroring the spin angle. Overshoot is never
/// carried past a bound.
#[derive(Clone, Debug, PartialEq)]
pub struct PingPong {
    pub lower: f32,
    pub upper: f32,
    pub height: f32,
    scale_param: f32,
    rate: f32,
    spin_acc: f32,
}

impl PingPong {
    pub fn new(lower: f32, upper: f32, height: f32) -> Self {
        Self {
            lower,
            upper,
            height,
            scale_param: lower,
            rate: 1.0,
            spin_acc: 0.0,
        }
    }

    pub fn scale_param(&self) -> f32 {
        self.scale_param
    }

    fn advance(&mut self, delta_time: f32) {
        self.spin_acc += delta_time;
        self.scale_param += self.rate * delta_time;
        if self.rate > 0.0 && self.scale_param >= self.upper {
            self.scale_param = self.upper;
            self.rate = -self.rate;
            self.spin_acc = -self.spin_acc;
        } else if self.rate < 0.0 && self.scale_param <= self.lower {
            self.scale_param = self.lower;
            self.rate = -self.rate;
            self.spin_acc = -self.spin_acc;
        }
    }

    fn world(&self) -> Mat4 {
        let translate = Mat4::from_translation(Vec3::new(0.0, self.height, 0.0));
        let orbit = Mat4::from_rotation_z(-self.spin_acc * 2.0);
        let spin = Mat4::from_rotation_y(-self.spin_acc);
        let scale = Mat4::from_scale(Vec3::splat(0.1 * self.scale_param));
        translate * orbit * spin * scale
    }
}

impl Motion {
    fn advance(&mut self, delta_time: f32) {
        if let Motion::PingPong(state) = self {
            state.advance(delta_time);
        }
    }

    /// World transform for the given elapsed time. Pure for the closed-form
    /// variants; `PingPong` reads its own accumulated state instead.
    pub fn world(&self, elapsed: f32) -> Mat4 {
        match self {
            Motion::Fixed => Mat4::IDENTITY,
            Motion::Spin { rate } => Mat4::from_rotation_y(rate * elapsed),
            Motion::Orbit {
                spin_rate,
                orbit_rate,
                offset,
                scale,
            } => {
                let orbit = Mat4::from_rotation_y(-orbit_rate * elapsed);
                let translate = Mat4::from_translation(*offset);
                let spin = Mat4::from_rotation_z(-spin_rate * elapsed);
                let scaling = Mat4::from_scale(Vec3::splat(*scale));
                orbit * translate * spin * scaling
            }
            Motion::PingPong(state) => state.world(),
            Motion::Bob { radius } => {
                Mat4::from_translation(Vec3::new(*radius, elapsed.sin(), 0.0))
                    * Mat4::from_rotation_y(elapsed)
            }
        }
    }
}

/// A static mesh drawn once per frame with its own world transform.
pub struct StaticRenderable {
    mesh: MeshData,
    materials: Vec<Material>,
    motion: Motion,
    output_color: Vec4,
    elapsed: f32,
    world: Mat4,
    vertex_shader: Option<String>,
    pixel_shader: Option<String>,
    pub(crate) gpu: Option<RenderableGpu>,
}

impl StaticRenderable {
    pub fn new(mesh: MeshData, motion: Motion) -> Self {
        Self {
            mesh,
            materials: Vec::new(),
            motion,
            output_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            elapsed: 0.0,
            world: Mat4::IDENTITY,
            vertex_shader: None,
            pixel_shader: None,
            gpu: None,
        }
    }

    pub fn with_materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_output_color(mut self, color: Vec4) -> Self {
        self.output_color = color;
        self
    }

    pub fn with_shaders(mut self, vertex: impl Into<String>, pixel: impl Into<String>) -> Self {
        self.vertex_shader = Some(vertex.into());
        self.pixel_shader = Some(pixel.into());
        self
    }

    /// Recomputes the world transform from this object's own clock.
    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        self.motion.advance(delta_time);
        self.world = self.motion.world(self.elapsed);
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn output_color(&self) -> Vec4 {
        self.output_color
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn has_texture(&self) -> bool {
        self.materials
            .iter()
            .any(|material| material.diffuse.is_some())
    }

    pub fn has_normal_map(&self) -> bool {
        self.materials
            .iter()
            .any(|material| material.normal.is_some())
    }

    pub fn vertex_shader(&self) -> Option<&str> {
        self.vertex_shader.as_deref()
    }

    pub fn pixel_shader(&self) -> Option<&str> {
        self.pixel_shader.as_deref()
    }

    pub fn set_vertex_shader(&mut self, name: impl Into<String>) {
        self.vertex_shader = Some(name.into());
    }

    pub fn set_pixel_shader(&mut self, name: impl Into<String>) {
        self.pixel_shader = Some(name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::unit_cube;

    #[test]
    fn spin_world_is_pure_in_elapsed_time() {
        let motion = Motion::Spin { rate: 2.0 };
        let a = motion.world(1.25);
        let b = motion.world(1.25);
        assert_eq!(a.to_cols_array(), b.to_cols_array());
        assert_eq!(
            a.to_cols_array(),
            Mat4::from_rotation_y(2.5).to_cols_array()
        );
    }

    #[test]
    fn identical_motions_stay_bit_identical_under_stepping() {
        let mut first = StaticRenderable::new(
            unit_cube(),
            Motion::Orbit {
                spin_rate: 1.0,
                orbit_rate: 2.0,
                offset: Vec3::new(-4.0, 0.0, 0.0),
                scale: 0.3,
            },
        );
        let mut second = StaticRenderable::new(unit_cube(), first.motion().clone());
        for _ in 0..100 {
            first.update(1.0 / 60.0);
            second.update(1.0 / 60.0);
        }
        assert_eq!(
            first.world().to_cols_array(),
            second.world().to_cols_array()
        );
    }

    #[test]
    fn ping_pong_reflects_exactly_at_bounds() {
        let mut state = PingPong::new(1.0, 5.0, 2.0);
        let step = 0.05;
        let mut hit_upper = false;
        let mut hit_lower = false;
        for _ in 0..400 {
            state.advance(step);
            assert!(state.scale_param() >= 1.0 && state.scale_param() <= 5.0);
            if state.scale_param() == 5.0 {
                hit_upper = true;
            }
            if state.scale_param() == 1.0 {
                hit_lower = true;
            }
        }
        assert!(hit_upper && hit_lower);
    }

    #[test]
    fn ping_pong_negates_spin_accumulator_at_bound() {
        let mut state = PingPong::new(1.0, 2.0, 0.0);
        // Drive straight past the upper bound in one step.
        state.advance(10.0);
        assert_eq!(state.scale_param(), 2.0);
        assert_eq!(state.spin_acc, -10.0);
        // The accumulator keeps counting up from the mirrored angle.
        state.advance(0.1);
        assert!((state.spin_acc + 9.9).abs() < 1e-6);
    }

    #[test]
    fn update_never_leaves_world_stale() {
        let mut renderable = StaticRenderable::new(unit_cube(), Motion::Spin { rate: 1.0 });
        assert_eq!(renderable.world(), Mat4::IDENTITY);
        renderable.update(0.5);
        assert_eq!(
            renderable.world().to_cols_array(),
            Mat4::from_rotation_y(0.5).to_cols_array()
        );
    }

    #[test]
    fn untextured_renderable_reports_no_maps() {
        let renderable = StaticRenderable::new(unit_cube(), Motion::Fixed);
        assert!(!renderable.has_texture());
        assert!(!renderable.has_normal_map());
    }
}
