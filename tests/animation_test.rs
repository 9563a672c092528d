use cgmath::{Quaternion, Vector3, Zero};

use figurine::animation::{AnimationOrchestrator, Clip, Track, TrackValues};
use figurine::scene::{SceneGraph, SceneNode};

mod common;

fn translation_clip(name: &str, reach: f32) -> Clip {
    Clip {
        name: name.into(),
        tracks: vec![Track {
            target: vec![0],
            times: vec![0.0, 1.0],
            values: TrackValues::Translation(vec![
                Vector3::zero(),
                Vector3::new(reach, 0.0, 0.0),
            ]),
        }],
    }
}

fn scene_with_one_node() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.attach(SceneNode::group(Some("puppet".into())));
    scene
}

fn x_of(scene: &SceneGraph) -> f32 {
    scene.node(&vec![0]).unwrap().transform.position.x
}

#[test]
fn triggers_are_noops_until_a_mixer_is_bound() {
    let mut scene = scene_with_one_node();
    let mut orchestrator = AnimationOrchestrator::new();
    assert!(!orchestrator.start_intro());
    orchestrator.set_hover(true);
    orchestrator.advance(1.0, &mut scene);
    assert_eq!(x_of(&scene), 0.0);
}

#[test]
fn intro_plays_once_and_is_not_restartable() {
    let mut scene = scene_with_one_node();
    let mut orchestrator = AnimationOrchestrator::new();
    orchestrator.bind(vec![translation_clip("intro", 2.0)]);

    assert!(orchestrator.start_intro());
    assert!(!orchestrator.start_intro(), "second trigger must be ignored");

    orchestrator.advance(0.5, &mut scene);
    assert!((x_of(&scene) - 1.0).abs() < 1e-5);

    // A non-looping clip clamps at its end and stays there.
    orchestrator.advance(2.0, &mut scene);
    assert!((x_of(&scene) - 2.0).abs() < 1e-5);
    orchestrator.advance(1.0, &mut scene);
    assert!((x_of(&scene) - 2.0).abs() < 1e-5);
}

#[test]
fn first_clip_stands_in_for_a_missing_intro() {
    let mut scene = scene_with_one_node();
    let mut orchestrator = AnimationOrchestrator::new();
    orchestrator.bind(vec![translation_clip("entrance", 1.0)]);
    assert!(orchestrator.start_intro());
    orchestrator.advance(0.5, &mut scene);
    assert!((x_of(&scene) - 0.5).abs() < 1e-5);
}

#[test]
fn hover_loops_while_active_and_stops_on_leave() {
    let mut scene = scene_with_one_node();
    let mut orchestrator = AnimationOrchestrator::new();
    orchestrator.bind(vec![
        translation_clip("intro", 2.0),
        translation_clip("hover", 1.0),
    ]);

    orchestrator.set_hover(true);
    // 1.25s into a 1s looping clip wraps back to the quarter mark.
    orchestrator.advance(1.25, &mut scene);
    assert!((x_of(&scene) - 0.25).abs() < 1e-5);

    orchestrator.set_hover(false);
    let frozen = x_of(&scene);
    orchestrator.advance(0.5, &mut scene);
    assert!((x_of(&scene) - frozen).abs() < 1e-6);
}

#[test]
fn rotation_tracks_interpolate_between_keys() {
    let mut scene = scene_with_one_node();
    let mut orchestrator = AnimationOrchestrator::new();
    orchestrator.bind(vec![Clip {
        name: "intro".into(),
        tracks: vec![Track {
            target: vec![0],
            times: vec![0.0, 1.0],
            values: TrackValues::Rotation(vec![
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Quaternion::new(0.707_106_78, 0.0, 0.707_106_78, 0.0),
            ]),
        }],
    }]);
    orchestrator.start_intro();
    orchestrator.advance(1.0, &mut scene);
    let rotation = scene.node(&vec![0]).unwrap().transform.rotation;
    assert!((rotation.v.y - 0.707_106_78).abs() < 1e-4);
}

#[test]
fn dispose_stops_playback_for_good() {
    let mut scene = scene_with_one_node();
    let mut orchestrator = AnimationOrchestrator::new();
    orchestrator.bind(vec![translation_clip("intro", 2.0)]);
    orchestrator.start_intro();
    orchestrator.advance(0.25, &mut scene);
    let at_dispose = x_of(&scene);

    orchestrator.dispose();
    assert!(!orchestrator.is_bound());
    orchestrator.advance(1.0, &mut scene);
    assert!((x_of(&scene) - at_dispose).abs() < 1e-6);
}
