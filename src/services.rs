//! External collaborators the core calls into but does not own: the
//! scroll/timeline choreography service and the loading-progress reporter.
//!
//! Both are passed explicitly into the lifecycle instead of living in
//! shared module state, so initialization-before-use and
//! teardown-on-unmount stay visible at the call site.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::scene::camera::Camera;
use crate::scene::SceneGraph;

/// Choreographs scroll-linked motion once the character is attached. The
/// core calls both hooks exactly once per successful load and does not care
/// how they animate anything.
pub trait TimelineService {
    fn bind_character_timeline(&mut self, scene: &SceneGraph, camera: &Camera);
    fn bind_global_timelines(&mut self);
}

/// A timeline service that choreographs nothing.
#[derive(Default)]
pub struct NullTimeline;

impl TimelineService for NullTimeline {
    fn bind_character_timeline(&mut self, _scene: &SceneGraph, _camera: &Camera) {}
    fn bind_global_timelines(&mut self) {}
}

/// Receives monotonically non-decreasing completion percentages during
/// loading. The lifecycle polls [`ProgressReporter::fully_loaded`] before
/// arming the intro sequence. Reporters cross into the load task, hence
/// the `Send` bound.
pub trait ProgressReporter: Send {
    fn report(&mut self, percent: f32);
    fn fully_loaded(&self) -> bool;
}

/// Shared progress state: the load task writes it, the lifecycle reads it.
/// Clamped so the reported percentage never goes backwards.
#[derive(Clone, Default)]
pub struct SharedProgress {
    // Percent scaled by 100 so it fits an atomic; f32 precision is overkill
    // for a loading bar anyway.
    basis_points: Arc<AtomicU32>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> f32 {
        self.basis_points.load(Ordering::Relaxed) as f32 / 100.0
    }
}

impl ProgressReporter for SharedProgress {
    fn report(&mut self, percent: f32) {
        let next = (percent.clamp(0.0, 100.0) * 100.0) as u32;
        self.basis_points.fetch_max(next, Ordering::Relaxed);
    }

    fn fully_loaded(&self) -> bool {
        self.basis_points.load(Ordering::Relaxed) >= 100_00
    }
}
