//! The drawing seam between the lifecycle manager and the GPU.
//!
//! The lifecycle owns exactly one [`DrawTarget`] for its entire mounted
//! lifetime and disposes it exactly once during teardown, whether or not a
//! character ever loaded. [`context::GpuContext`] is the wgpu-backed
//! implementation; tests substitute a counting fake.

pub mod context;
pub mod texture;

use crate::loader::CharacterFragment;
use crate::scene::camera::Camera;
use crate::scene::lighting::LightRig;
use crate::scene::SceneGraph;

pub trait DrawTarget {
    /// Recompute the output size. Must not restart anything.
    fn resize(&mut self, width: u32, height: u32);

    /// Pre-compile shaders and upload the fragment's GPU resources before
    /// it is attached to the live scene, so attachment itself cannot fail
    /// halfway.
    fn warm_up(&mut self, fragment: &CharacterFragment, camera: &Camera) -> anyhow::Result<()>;

    /// Issue one draw call for the current scene state.
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera, rig: &LightRig) -> anyhow::Result<()>;

    /// Release every GPU resource. Idempotent.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}
