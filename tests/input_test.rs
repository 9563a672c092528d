use instant::Duration;

use figurine::input::{InputEvent, InputInterpolator, Listeners, Smoothing};

mod common;

const MOUSE: Smoothing = Smoothing { x: 0.1, y: 0.2 };
const FLUNG: Smoothing = Smoothing { x: 0.05, y: 0.05 };

fn interpolator(debounce_ms: u64) -> InputInterpolator {
    InputInterpolator::new((200, 100), MOUSE, FLUNG, Duration::from_millis(debounce_ms))
}

#[test]
fn starts_centered_with_mouse_smoothing() {
    let input = interpolator(0);
    let ((x, y), smoothing) = input.sample();
    assert_eq!((x, y), (0.0, 0.0));
    assert_eq!(smoothing, MOUSE);
}

#[test]
fn pointer_position_maps_proportionally_into_the_unit_range() {
    let mut input = interpolator(0);

    input.handle(&InputEvent::PointerMove { x: 100.0, y: 50.0 });
    assert_eq!(input.sample().0, (0.0, 0.0));

    input.handle(&InputEvent::PointerMove { x: 150.0, y: 25.0 });
    let ((x, y), _) = input.sample();
    assert!((x - 0.5).abs() < 1e-6);
    assert!((y - 0.5).abs() < 1e-6);

    // Corners clamp to the unit square.
    input.handle(&InputEvent::PointerMove { x: 500.0, y: -40.0 });
    assert_eq!(input.sample().0, (1.0, 1.0));
}

#[test]
fn touch_release_commits_the_delta_with_flung_smoothing() {
    let mut input = interpolator(0);

    input.handle(&InputEvent::TouchStart { x: 100.0, y: 50.0 });
    input.handle(&InputEvent::TouchMove { x: 150.0, y: 50.0 });
    let ((x, _), smoothing) = input.sample();
    assert!((x - 0.5).abs() < 1e-6);
    assert_eq!(smoothing, MOUSE);

    input.handle(&InputEvent::TouchEnd);
    let ((x, y), smoothing) = input.sample();
    // Final delta of 0.5 is amplified and clamped at the edge.
    assert!((x - 1.0).abs() < 1e-6);
    assert!(y.abs() < 1e-6);
    assert_eq!(smoothing, FLUNG);
}

#[test]
fn touch_moves_inside_the_debounce_window_are_ignored() {
    let mut input = interpolator(10_000);

    input.handle(&InputEvent::TouchStart { x: 100.0, y: 50.0 });
    input.handle(&InputEvent::TouchMove { x: 200.0, y: 0.0 });
    assert_eq!(input.sample().0, (0.0, 0.0));
}

#[test]
fn resize_rescales_subsequent_pointer_positions() {
    let mut input = interpolator(0);
    input.handle(&InputEvent::Resize {
        width: 400,
        height: 400,
    });
    input.handle(&InputEvent::PointerMove { x: 300.0, y: 100.0 });
    let ((x, y), _) = input.sample();
    assert!((x - 0.5).abs() < 1e-6);
    assert!((y - 0.5).abs() < 1e-6);
}

#[test]
fn listener_registry_counts_balance_after_removal() {
    let mut listeners = Listeners::new();
    let seen = std::rc::Rc::new(std::cell::Cell::new(0));

    let a = {
        let seen = std::rc::Rc::clone(&seen);
        listeners.register(Box::new(move |_| seen.set(seen.get() + 1)))
    };
    let b = {
        let seen = std::rc::Rc::clone(&seen);
        listeners.register(Box::new(move |_| seen.set(seen.get() + 1)))
    };
    assert_eq!(listeners.active(), 2);

    listeners.dispatch(&InputEvent::TouchEnd);
    assert_eq!(seen.get(), 2);

    assert!(listeners.remove(b));
    listeners.dispatch(&InputEvent::TouchEnd);
    assert_eq!(seen.get(), 3);

    assert!(listeners.remove(a));
    assert!(!listeners.remove(a), "double removal must not double count");
    assert_eq!(listeners.active(), 0);
    assert_eq!(listeners.registered(), 2);
    assert_eq!(listeners.removed(), 2);
}
