//! The scene lifecycle: mount, load delivery, per-frame stepping, teardown.
//!
//! One lifecycle instance owns exactly one [`DrawTarget`], one camera, one
//! light rig, and the live scene graph. The frame loop is valid immediately
//! after mount on an empty scene; the character joins it whenever its load
//! resolves, and a failed load leaves the loop running on the bare scene.
//! Teardown is reachable from every state and is idempotent: listeners come
//! off in reverse-registration order, actions stop, every mesh disposes,
//! and the draw target is disposed exactly once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cgmath::{Point3, Quaternion, Rad, Rotation3};
use instant::{Duration, Instant};

use crate::animation::AnimationOrchestrator;
use crate::error::Result;
use crate::input::{InputEvent, InputInterpolator, ListenerId, Listeners, Smoothing};
use crate::loader::CharacterFragment;
use crate::render::DrawTarget;
use crate::scene::camera::{Camera, Projection};
use crate::scene::lighting::LightRig;
use crate::scene::{NodePath, SceneGraph};
use crate::services::{ProgressReporter, SharedProgress, TimelineService};

/// Tunable constants of the character scene, preloaded with the stock
/// values the scene ships with.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub camera_position: Point3<f32>,
    pub camera_look_at: Point3<f32>,
    pub camera_fovy_deg: f32,
    pub camera_zoom: f32,
    pub camera_znear: f32,
    pub camera_zfar: f32,
    /// Pause between the load finishing and the reveal, so the page settles
    /// before the character moves.
    pub settle_delay: Duration,
    pub mouse_smoothing: Smoothing,
    /// Larger-settling factors applied after a touch release.
    pub flung_smoothing: Smoothing,
    pub touch_debounce: Duration,
    pub head_bone: String,
    pub screen_light: String,
    /// Head rotation limits, radians.
    pub max_yaw: f32,
    pub max_pitch: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_position: Point3::new(0.0, 13.1, 24.7),
            camera_look_at: Point3::new(0.0, 11.0, 0.0),
            camera_fovy_deg: 14.5,
            camera_zoom: 1.1,
            camera_znear: 0.1,
            camera_zfar: 1000.0,
            settle_delay: Duration::from_millis(2500),
            mouse_smoothing: Smoothing { x: 0.1, y: 0.2 },
            flung_smoothing: Smoothing { x: 0.05, y: 0.05 },
            touch_debounce: Duration::from_millis(200),
            head_bone: "spine006".into(),
            screen_light: "screenlight".into(),
            max_yaw: 0.6,
            max_pitch: 0.35,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    /// Surface and frame loop are live; no load in flight yet.
    SurfaceReady,
    ModelPending,
    /// The load failed; the scene keeps rendering without a character.
    ModelAbsent,
    ModelAttached,
    Animating,
    TornDown,
}

pub struct SceneLifecycle<T: DrawTarget> {
    config: SceneConfig,
    state: LifecycleState,
    target: T,
    camera: Camera,
    rig: LightRig,
    scene: SceneGraph,
    orchestrator: AnimationOrchestrator,
    timeline: Box<dyn TimelineService>,
    progress: SharedProgress,
    listeners: Listeners,
    disposers: Vec<ListenerId>,
    interpolator: Rc<RefCell<InputInterpolator>>,
    hover_active: Rc<Cell<bool>>,
    last_hover: bool,
    head_path: Option<NodePath>,
    head_rest: Option<Quaternion<f32>>,
    screen_light_path: Option<NodePath>,
    head_yaw: f32,
    head_pitch: f32,
    last_frame: Option<Instant>,
    settle_started: Option<Instant>,
}

impl<T: DrawTarget> SceneLifecycle<T> {
    /// Take ownership of the draw target, build the camera and light rig,
    /// and register the input listeners. The returned lifecycle can draw
    /// frames right away.
    pub fn mount(
        target: T,
        surface_size: (u32, u32),
        config: SceneConfig,
        timeline: Box<dyn TimelineService>,
        progress: SharedProgress,
    ) -> Self {
        let projection = Projection::new(
            surface_size.0,
            surface_size.1,
            cgmath::Deg(config.camera_fovy_deg),
            config.camera_zoom,
            config.camera_znear,
            config.camera_zfar,
        );
        let camera = Camera::new(config.camera_position, config.camera_look_at, projection);

        let interpolator = Rc::new(RefCell::new(InputInterpolator::new(
            surface_size,
            config.mouse_smoothing,
            config.flung_smoothing,
            config.touch_debounce,
        )));
        let hover_active = Rc::new(Cell::new(false));

        let mut listeners = Listeners::new();
        let mut disposers = Vec::new();

        let pointer = Rc::clone(&interpolator);
        disposers.push(listeners.register(Box::new(move |event| {
            if matches!(event, InputEvent::PointerMove { .. }) {
                pointer.borrow_mut().handle(event);
            }
        })));

        let touch = Rc::clone(&interpolator);
        disposers.push(listeners.register(Box::new(move |event| {
            if matches!(
                event,
                InputEvent::TouchStart { .. } | InputEvent::TouchMove { .. } | InputEvent::TouchEnd
            ) {
                touch.borrow_mut().handle(event);
            }
        })));

        let hover = Rc::clone(&hover_active);
        disposers.push(listeners.register(Box::new(move |event| match event {
            InputEvent::HoverEnter => hover.set(true),
            InputEvent::HoverLeave => hover.set(false),
            _ => {}
        })));

        let viewport = Rc::clone(&interpolator);
        disposers.push(listeners.register(Box::new(move |event| {
            if matches!(event, InputEvent::Resize { .. }) {
                viewport.borrow_mut().handle(event);
            }
        })));

        Self {
            config,
            state: LifecycleState::SurfaceReady,
            target,
            camera,
            rig: LightRig::new(),
            scene: SceneGraph::new(),
            orchestrator: AnimationOrchestrator::new(),
            timeline,
            progress,
            listeners,
            disposers,
            interpolator,
            hover_active,
            last_hover: false,
            head_path: None,
            head_rest: None,
            screen_light_path: None,
            head_yaw: 0.0,
            head_pitch: 0.0,
            last_frame: None,
            settle_started: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Mark a load in flight. The app layer spawns the actual task.
    pub fn begin_loading(&mut self) {
        if self.state == LifecycleState::SurfaceReady {
            self.state = LifecycleState::ModelPending;
        }
    }

    /// Route an external event through the registered listeners.
    pub fn dispatch(&mut self, event: &InputEvent) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        self.listeners.dispatch(event);
    }

    /// Deliver the one-shot load result. Arriving after teardown it is a
    /// logged no-op; a second delivery is ignored.
    pub fn apply_load_result(&mut self, result: Result<CharacterFragment>) {
        match self.state {
            LifecycleState::TornDown => {
                log::info!("load result arrived after teardown, dropping it");
                return;
            }
            LifecycleState::ModelAttached | LifecycleState::Animating => {
                log::warn!("character already attached, ignoring a second load result");
                return;
            }
            _ => {}
        }

        let fragment = match result {
            Ok(fragment) => fragment,
            Err(e) => {
                log::error!("failed to load character: {e}. {}", e.guidance());
                self.state = LifecycleState::ModelAbsent;
                return;
            }
        };

        // Compile and upload before anything touches the live scene, so a
        // failure here cannot leave partially-attached nodes behind.
        if let Err(e) = self.target.warm_up(&fragment, &self.camera) {
            log::error!("character warm-up failed: {e}");
            self.state = LifecycleState::ModelAbsent;
            return;
        }

        let CharacterFragment {
            root,
            mut clips,
            names: _,
        } = fragment;
        let root_index = self.scene.attach(root);

        // Clip tracks address nodes relative to the fragment root; rebase
        // them onto the slot the fragment landed in.
        for clip in &mut clips {
            for track in &mut clip.tracks {
                track.target.insert(0, root_index);
            }
        }

        self.head_path = self.scene.find(&self.config.head_bone).cloned();
        self.head_rest = self
            .head_path
            .as_ref()
            .and_then(|path| self.scene.node(path))
            .map(|node| node.transform.rotation);
        if self.head_path.is_none() {
            log::debug!(
                "head bone {} not found, head tracking disabled",
                self.config.head_bone
            );
        }
        self.screen_light_path = self.scene.find(&self.config.screen_light).cloned();

        self.orchestrator.bind(clips);
        self.timeline
            .bind_character_timeline(&self.scene, &self.camera);
        self.timeline.bind_global_timelines();

        self.state = LifecycleState::ModelAttached;
        log::info!("character attached");
    }

    /// Step one frame: input, head tracking, the reveal gate, animation,
    /// lights, one draw. Draw errors are logged and the loop keeps going.
    pub fn frame(&mut self) {
        if self.state == LifecycleState::TornDown {
            return;
        }

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        // Hover toggles are deferred until the mixer exists, so a pointer
        // already inside the region when the character attaches still
        // starts the loop on the next frame.
        let hover = self.hover_active.get();
        if hover != self.last_hover && self.orchestrator.is_bound() {
            self.orchestrator.set_hover(hover);
            self.last_hover = hover;
        }

        self.track_head();

        if self.state == LifecycleState::ModelAttached && self.progress.fully_loaded() {
            let started = *self.settle_started.get_or_insert(now);
            if now.duration_since(started) >= self.config.settle_delay {
                self.rig.turn_on();
                self.orchestrator.start_intro();
                self.state = LifecycleState::Animating;
            }
        }

        self.orchestrator.advance(dt, &mut self.scene);
        self.rig.advance(dt);
        if let Some(path) = self.screen_light_path.clone() {
            self.rig
                .update_screen_light(&mut self.scene, &path, self.head_yaw, self.config.max_yaw);
        }

        if let Err(e) = self.target.draw(&self.scene, &self.camera, &self.rig) {
            log::error!("draw failed: {e}");
        }
    }

    /// Ease the head bone toward the pointer target. The step is applied
    /// once per frame, so responsiveness scales with refresh rate; the
    /// per-axis factors in [`SceneConfig`] are the tuning knobs.
    fn track_head(&mut self) {
        let (Some(path), Some(rest)) = (self.head_path.clone(), self.head_rest) else {
            return;
        };
        let ((x, y), smoothing) = self.interpolator.borrow().sample();
        let target_yaw = x * self.config.max_yaw;
        let target_pitch = -y * self.config.max_pitch;
        self.head_yaw += (target_yaw - self.head_yaw) * smoothing.x;
        self.head_pitch += (target_pitch - self.head_pitch) * smoothing.y;
        if let Some(node) = self.scene.node_mut(&path) {
            node.transform.rotation = rest
                * Quaternion::from_angle_y(Rad(self.head_yaw))
                * Quaternion::from_angle_x(Rad(self.head_pitch));
        }
    }

    /// Resize the surface and the camera projection in place. Never
    /// restarts loading or animation.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        self.target.resize(width, height);
        self.camera.projection.resize(width, height);
        self.listeners.dispatch(&InputEvent::Resize { width, height });
    }

    /// Tear the whole scene down. Valid in every state, idempotent.
    ///
    /// The drawing-surface element itself is not removed here: on the web
    /// the canvas is adopted from the host page by id rather than created
    /// by this crate (see `app::App::resumed`), so its DOM lifetime stays
    /// with the page.
    pub fn teardown(&mut self) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        for id in self.disposers.drain(..).rev() {
            self.listeners.remove(id);
        }
        self.orchestrator.dispose();
        let disposed = self.scene.dispose_meshes();
        self.scene.clear();
        self.target.dispose();
        self.state = LifecycleState::TornDown;
        log::info!("scene torn down, {disposed} mesh resources released");
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn light_rig(&self) -> &LightRig {
        &self.rig
    }

    pub fn intro_started(&self) -> bool {
        self.orchestrator.intro_started()
    }

    /// Live listener registrations; zero after a complete teardown.
    pub fn active_listeners(&self) -> usize {
        self.listeners.active()
    }

    pub fn draw_target(&self) -> &T {
        &self.target
    }
}

impl<T: DrawTarget> Drop for SceneLifecycle<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
