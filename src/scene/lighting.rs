//! The scene's light rig: one key light plus the character's own
//! screen-emissive light node.
//!
//! The rig starts dimmed so the bare scene is visible while the model loads,
//! and ramps to full intensity when the lifecycle triggers lights-on after
//! the settle delay.

use crate::scene::{NodeKind, NodePath, SceneGraph};

/// Light data as laid out for the shader uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    // Uniforms require 16 byte (4 float) spacing, hence the padding fields
    pub _padding: u32,
    pub color: [f32; 3],
    pub _padding2: u32,
}

#[derive(Clone, Debug)]
pub struct LightRig {
    position: [f32; 3],
    color: [f32; 3],
    intensity: f32,
    target_intensity: f32,
    /// Seconds for the lights-on ramp.
    ramp: f32,
}

impl LightRig {
    /// Intensity while the character has not been revealed yet.
    const DIM: f32 = 0.12;

    pub fn new() -> Self {
        Self {
            position: [8.0, 80.0, 50.0],
            color: [1.0, 1.0, 1.0],
            intensity: Self::DIM,
            target_intensity: Self::DIM,
            ramp: 0.8,
        }
    }

    /// Trigger the lights-on reveal. Safe to call more than once.
    pub fn turn_on(&mut self) {
        self.target_intensity = 1.0;
    }

    pub fn is_on(&self) -> bool {
        self.target_intensity >= 1.0
    }

    /// Ease the current intensity toward its target.
    pub fn advance(&mut self, dt_seconds: f32) {
        if self.ramp <= 0.0 {
            self.intensity = self.target_intensity;
            return;
        }
        let step = (dt_seconds / self.ramp).clamp(0.0, 1.0);
        self.intensity += (self.target_intensity - self.intensity) * step;
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position,
            _padding: 0,
            color: [
                self.color[0] * self.intensity,
                self.color[1] * self.intensity,
                self.color[2] * self.intensity,
            ],
            _padding2: 0,
        }
    }

    /// Couple the character's screen-emissive light to head orientation:
    /// the further the head turns away from center, the dimmer the screen
    /// glow reads from the camera.
    pub fn update_screen_light(
        &self,
        scene: &mut SceneGraph,
        path: &NodePath,
        yaw: f32,
        max_yaw: f32,
    ) {
        let Some(node) = scene.node_mut(path) else {
            return;
        };
        if let NodeKind::Light(light) = &mut node.kind {
            let off_center = if max_yaw > 0.0 {
                (yaw.abs() / max_yaw).clamp(0.0, 1.0)
            } else {
                0.0
            };
            light.intensity = self.intensity * (1.0 - 0.6 * off_center);
        }
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::new()
    }
}
