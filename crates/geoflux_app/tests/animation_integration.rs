//! Integration tests for the container + frame driver + animation system
//!
//! These tests verify that:
//! - Camera sequences gate their steps and call back once
//! - Clearing camera work suppresses callbacks for good
//! - Layer animations reach the layer's style resolution
//! - Random phases desynchronize features reproducibly
//! - Track animations steer the camera along a path

use geoflux_animation::{
    CameraStep, DriverConfig, Easing, FeatureAnimateConfig, PropertyAnimate, TimeRange,
    TrackConfig,
};
use geoflux_app::headless_runner::run_scenario;
use geoflux_app::headless_runtime::HeadlessRunConfig;
use geoflux_app::{Container, Layer};
use geoflux_core::{
    CameraState, Completion, Feature, LngLat, ResolvedStyle, StyleKey, StyleProperty, StyleValue,
};
use std::sync::{Arc, Mutex};

fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &str) -> Option<Completion> {
    let log = log.clone();
    let name = name.to_string();
    Some(Box::new(move || log.lock().unwrap().push(name)))
}

fn points(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| Feature::at(LngLat::new(116.0 + i as f64 * 0.001, 39.9)))
        .collect()
}

/// Run frames every 16ms from `from` up to and including `to`
fn run_until(container: &mut Container, from: f64, to: f64) {
    let mut now = from;
    while now <= to {
        container.frame(now);
        now += 16.0;
    }
}

#[test]
fn test_sequence_steps_are_gated() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut container = Container::with_camera(
        DriverConfig::default(),
        CameraState::new(LngLat::new(116.4, 39.9), 4.0),
    );

    // Step A is slow on zoom and fast on pitch; B is fast
    let a = CameraStep::new()
        .zoom(PropertyAnimate::new(8.0, 400.0))
        .pitch(PropertyAnimate::new(30.0, 50.0));
    let b = CameraStep::new().rotation(PropertyAnimate::new(90.0, 50.0));
    container
        .view_control()
        .add_animates(&[a, b], recorder(&log, "sequence"))
        .unwrap();

    container.frame(0.0);
    container.frame(100.0);
    // Pitch finished, zoom did not: B has not started
    let camera = container.camera();
    assert_eq!(camera.pitch, 30.0);
    assert_eq!(camera.rotation, 0.0);
    assert!(log.lock().unwrap().is_empty());

    container.frame(200.0);
    container.frame(300.0);
    container.frame(400.0);
    assert_eq!(container.camera().zoom, 8.0);
    assert!(log.lock().unwrap().is_empty());

    container.frame(450.0);
    assert_eq!(container.camera().rotation, 90.0);
    assert_eq!(*log.lock().unwrap(), vec!["sequence".to_string()]);

    container.frame(500.0);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_clear_animates_suppresses_callback() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut container = Container::default();
    container
        .view_control()
        .add_animates(
            &[CameraStep::new().zoom(PropertyAnimate::new(15.0, 200.0))],
            recorder(&log, "cleared"),
        )
        .unwrap();

    container.frame(0.0);
    container.frame(100.0);
    container.view_control().clear_animates();
    run_until(&mut container, 116.0, 1000.0);

    assert!(log.lock().unwrap().is_empty());
    assert!(!container.driver().is_active());
}

#[test]
fn test_layer_animation_scales_resolved_style() {
    let mut container = Container::default();
    let layer = container
        .add_layer(
            Layer::new("prisms").with_features(points(4)).with_style(
                StyleKey::Height,
                StyleProperty::Number(StyleValue::per_feature(|i, _| (i + 1) as f32 * 100.0)),
            ),
        )
        .unwrap();

    let config = FeatureAnimateConfig::new(StyleKey::Height, vec![0.0, 1.0], 1000.0);
    container.layer_animate(layer, &config, None).unwrap();
    container.start();

    container.frame(0.0);
    container.frame(50.0);
    container.frame(100.0);
    container.frame(150.0);
    container.frame(200.0);

    let prisms = container.layer(layer).unwrap();
    for i in 0..4 {
        let expected = (i + 1) as f32 * 100.0 * 0.2;
        match prisms.resolve_style(StyleKey::Height, i) {
            Some(ResolvedStyle::Number(v)) => assert!((v - expected).abs() < 1e-2),
            other => panic!("unexpected style {other:?}"),
        }
    }
}

#[test]
fn test_random_phases_are_seeded() {
    let run = |seed: u64| -> Vec<f32> {
        let mut container = Container::new(DriverConfig::default().with_seed(seed));
        let layer = container
            .add_layer(Layer::new("dots").with_features(points(64)))
            .unwrap();
        let config = FeatureAnimateConfig::new(StyleKey::Radius, vec![0.0, 1.0], 500.0)
            .easing(Easing::QuadraticOut)
            .random(Some(TimeRange::upto(1000.0).unwrap()), None);
        container.layer_animate(layer, &config, None).unwrap();
        container.start();
        run_until(&mut container, 0.0, 480.0);

        let dots = container.layer(layer).unwrap();
        (0..64).map(|i| dots.factor(StyleKey::Radius, i)).collect()
    };

    let first = run(11);
    assert_eq!(first, run(11));
    assert!(first.iter().any(|v| *v != first[0]));
    assert!(first.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_track_steers_camera() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut container = Container::default();
    let path = vec![
        LngLat::new(116.0, 39.0),
        LngLat::new(116.0, 39.5),
        LngLat::new(116.5, 39.5),
    ];
    container
        .view_control()
        .add_track_animate(
            TrackConfig::new(path, 1000.0).rotation_speed(360.0),
            recorder(&log, "track"),
        )
        .unwrap();

    container.frame(0.0);
    assert!(container.camera().rotation.abs() < 1e-3);

    run_until(&mut container, 16.0, 1008.0);
    let camera = container.camera();
    assert!((camera.center.lng - 116.5).abs() < 1e-6);
    assert!((camera.center.lat - 39.5).abs() < 1e-6);
    // Heading turned east once the second leg started
    assert!((camera.rotation - 90.0).abs() < 1.0, "{}", camera.rotation);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_hide_fade_then_show() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut container = Container::default();
    let layer = container
        .add_layer(Layer::new("heat").with_opacity(0.6))
        .unwrap();

    container
        .hide_layer(layer, Some(200.0), recorder(&log, "hidden"))
        .unwrap();
    container.frame(0.0);
    container.frame(100.0);
    assert!((container.layer(layer).unwrap().opacity() - 0.3).abs() < 1e-4);
    assert!(container.layer(layer).unwrap().is_visible());

    container.frame(200.0);
    assert!(!container.layer(layer).unwrap().is_visible());
    assert_eq!(*log.lock().unwrap(), vec!["hidden".to_string()]);

    container
        .show_layer(layer, Some(100.0), recorder(&log, "shown"))
        .unwrap();
    container.frame(300.0);
    container.frame(400.0);
    let heat = container.layer(layer).unwrap();
    assert!(heat.is_visible());
    assert!((heat.opacity() - 0.6).abs() < 1e-4);
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn test_scenario_file_shape() {
    let outcome = run_scenario(
        r#"{
            "name": "grow dots",
            "layers": [{ "name": "dots", "count": 10, "styles": { "radius": 8 } }],
            "steps": [
                { "type": "layer_animate", "layer": "dots",
                  "animate": { "key": "radius", "value": [0, 1], "duration": 320 } },
                { "type": "start" },
                { "type": "wait", "ms": 160 },
                { "type": "assert_style", "layer": "dots", "index": 9, "key": "radius", "value": 0.5 },
                { "type": "wait", "ms": 160 },
                { "type": "assert_style", "layer": "dots", "index": 0, "key": "radius", "value": 1 },
                { "type": "assert_completed", "count": 1 },
                { "type": "hide_layer", "layer": "dots", "duration": 100 },
                { "type": "tick", "frames": 8 },
                { "type": "assert_visible", "layer": "dots", "visible": false },
                { "type": "assert_idle" }
            ]
        }"#,
        HeadlessRunConfig::default(),
    )
    .unwrap();

    assert!(!outcome.is_failed(), "{:?}", outcome.report());
    assert_eq!(outcome.report().stats.completions, 2);
}
