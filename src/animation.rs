//! Skeletal animation playback: clips, the mixer, and the named action
//! triggers exposed to the lifecycle.
//!
//! Clips come out of the loader as per-node keyframe tracks. The mixer
//! advances playing actions by elapsed seconds and writes the sampled
//! transforms back into the live scene graph. At most one exclusive action
//! (the intro) plays at a time; the hover loop and the procedural head
//! rotation overlay freely.

use cgmath::{Quaternion, Vector3};

use crate::scene::{NodePath, SceneGraph};

#[derive(Clone, Debug)]
pub enum TrackValues {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
}

/// One animated property of one node.
#[derive(Clone, Debug)]
pub struct Track {
    pub target: NodePath,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

/// A named set of tracks that play together.
#[derive(Clone, Debug)]
pub struct Clip {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Clip {
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .filter_map(|t| t.times.last().copied())
            .fold(0.0, f32::max)
    }
}

#[derive(Clone, Debug)]
struct Action {
    clip: usize,
    looping: bool,
    exclusive: bool,
    time: f32,
    playing: bool,
}

/// Advances and blends animation clips over time, bound to one skeleton.
pub struct Mixer {
    clips: Vec<Clip>,
    actions: Vec<Action>,
}

impl Mixer {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self {
            clips,
            actions: Vec::new(),
        }
    }

    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    fn add_action(&mut self, clip: usize, looping: bool, exclusive: bool) -> usize {
        self.actions.push(Action {
            clip,
            looping,
            exclusive,
            time: 0.0,
            playing: false,
        });
        self.actions.len() - 1
    }

    fn play(&mut self, action: usize) {
        if self.actions[action].exclusive {
            // Only one exclusive action may run at a time.
            for other in self.actions.iter_mut().filter(|a| a.exclusive) {
                other.playing = false;
            }
        }
        let action = &mut self.actions[action];
        action.time = 0.0;
        action.playing = true;
    }

    fn stop(&mut self, action: usize) {
        self.actions[action].playing = false;
    }

    pub fn stop_all(&mut self) {
        for action in &mut self.actions {
            action.playing = false;
        }
    }

    /// Step every playing action and apply the sampled transforms.
    pub fn advance(&mut self, dt_seconds: f32, scene: &mut SceneGraph) {
        for action in &mut self.actions {
            if !action.playing {
                continue;
            }
            let clip = &self.clips[action.clip];
            let duration = clip.duration();
            action.time += dt_seconds;
            if duration <= 0.0 {
                if !action.looping {
                    action.playing = false;
                }
                continue;
            }
            if action.time >= duration {
                if action.looping {
                    action.time %= duration;
                } else {
                    action.time = duration;
                    action.playing = false;
                }
            }
            apply_clip(clip, action.time, scene);
        }
    }
}

fn apply_clip(clip: &Clip, time: f32, scene: &mut SceneGraph) {
    for track in &clip.tracks {
        let Some(node) = scene.node_mut(&track.target) else {
            continue;
        };
        match &track.values {
            TrackValues::Translation(keys) => {
                if let Some(v) = sample_vec3(&track.times, keys, time) {
                    node.transform.position = v;
                }
            }
            TrackValues::Rotation(keys) => {
                if let Some(q) = sample_quat(&track.times, keys, time) {
                    node.transform.rotation = q;
                }
            }
            TrackValues::Scale(keys) => {
                if let Some(v) = sample_vec3(&track.times, keys, time) {
                    node.transform.scale = v;
                }
            }
        }
    }
}

fn segment(times: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    if times.is_empty() {
        return None;
    }
    if time <= times[0] {
        return Some((0, 0, 0.0));
    }
    let last = times.len() - 1;
    if time >= times[last] {
        return Some((last, last, 0.0));
    }
    let next = times.partition_point(|&t| t <= time);
    let prev = next - 1;
    let span = times[next] - times[prev];
    let factor = if span > 0.0 {
        (time - times[prev]) / span
    } else {
        0.0
    };
    Some((prev, next, factor))
}

fn sample_vec3(times: &[f32], keys: &[Vector3<f32>], time: f32) -> Option<Vector3<f32>> {
    let (prev, next, factor) = segment(times, time)?;
    let a = *keys.get(prev)?;
    let b = *keys.get(next)?;
    Some(a + (b - a) * factor)
}

fn sample_quat(times: &[f32], keys: &[Quaternion<f32>], time: f32) -> Option<Quaternion<f32>> {
    let (prev, next, factor) = segment(times, time)?;
    let a = *keys.get(prev)?;
    let b = *keys.get(next)?;
    if prev == next {
        return Some(a);
    }
    Some(a.slerp(b, factor))
}

/// Builds a playback controller over loaded clips and exposes the named
/// action triggers. All triggers are no-ops until a mixer is bound.
#[derive(Default)]
pub struct AnimationOrchestrator {
    mixer: Option<Mixer>,
    intro: Option<usize>,
    hover: Option<usize>,
    intro_started: bool,
}

impl AnimationOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a mixer over the loaded clips. The intro action is the clip
    /// named "intro" (falling back to the first clip); the hover loop is
    /// the clip named "hover" when present.
    pub fn bind(&mut self, clips: Vec<Clip>) {
        let mut mixer = Mixer::new(clips);
        let intro_clip = mixer
            .clip_index("intro")
            .or((mixer.clip_count() > 0).then_some(0));
        self.intro = intro_clip.map(|clip| mixer.add_action(clip, false, true));
        self.hover = mixer
            .clip_index("hover")
            .map(|clip| mixer.add_action(clip, true, false));
        self.mixer = Some(mixer);
    }

    pub fn is_bound(&self) -> bool {
        self.mixer.is_some()
    }

    /// Play the intro once. A second trigger is ignored: the intro is not
    /// restartable.
    pub fn start_intro(&mut self) -> bool {
        if self.intro_started {
            return false;
        }
        let (Some(mixer), Some(intro)) = (self.mixer.as_mut(), self.intro) else {
            return false;
        };
        mixer.play(intro);
        self.intro_started = true;
        true
    }

    pub fn intro_started(&self) -> bool {
        self.intro_started
    }

    /// Toggle the hover reaction, bound for the component's lifetime.
    pub fn set_hover(&mut self, active: bool) {
        let (Some(mixer), Some(hover)) = (self.mixer.as_mut(), self.hover) else {
            return;
        };
        if active {
            mixer.play(hover);
        } else {
            mixer.stop(hover);
        }
    }

    /// Step the mixer. A no-op while no character is loaded.
    pub fn advance(&mut self, dt_seconds: f32, scene: &mut SceneGraph) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.advance(dt_seconds, scene);
        }
    }

    /// Stop every action, then release the mixer.
    pub fn dispose(&mut self) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.stop_all();
        }
        self.mixer = None;
    }
}
