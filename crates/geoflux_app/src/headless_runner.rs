//! Scenario runner that drives a container through headless frames.

use crate::container::Container;
use crate::headless_report::{HeadlessReport, RunStats};
use crate::headless_runtime::{HeadlessRunConfig, HeadlessRuntime};
use crate::headless_scenario::{HeadlessScenario, ScenarioStep, SourceSpec};
use anyhow::{Context, Result};
use geoflux_animation::DriverConfig;
use geoflux_core::{Completion, LayerId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Final outcome of a scenario run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { report: HeadlessReport },
    Failed { report: HeadlessReport },
}

impl RunOutcome {
    pub fn report(&self) -> &HeadlessReport {
        match self {
            RunOutcome::Passed { report } => report,
            RunOutcome::Failed { report } => report,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Execute scenario JSON with default driver settings.
pub fn run_scenario(input: &str, runtime_cfg: HeadlessRunConfig) -> Result<RunOutcome> {
    let scenario = HeadlessScenario::from_json(input)?;
    run_loaded_scenario(&scenario, runtime_cfg, DriverConfig::default())
}

/// Execute a pre-loaded scenario.
pub fn run_loaded_scenario(
    scenario: &HeadlessScenario,
    runtime_cfg: HeadlessRunConfig,
    driver_cfg: DriverConfig,
) -> Result<RunOutcome> {
    driver_cfg.validate()?;
    let mut run = ScenarioRun::new(scenario, runtime_cfg, driver_cfg)?;
    tracing::info!(
        name = scenario.name.as_deref().unwrap_or("unnamed"),
        steps = scenario.steps.len(),
        layers = scenario.layers.len(),
        "running scenario"
    );

    for (step_index, step) in scenario.steps.iter().enumerate() {
        if step.is_assertion() {
            if let Err(failure) = run.check(step) {
                tracing::warn!(step_index, assertion = failure.0, "{}", failure.1);
                let report = HeadlessReport::failed(
                    failure.0,
                    step_index,
                    failure.1,
                    run.stats(),
                    run.container.camera(),
                );
                return Ok(RunOutcome::Failed { report });
            }
        } else {
            run.apply(step)
                .with_context(|| format!("scenario step {step_index} failed"))?;
        }
    }

    Ok(RunOutcome::Passed {
        report: HeadlessReport::passed(run.stats(), run.container.camera()),
    })
}

/// Assertion name and message
struct Failure(&'static str, String);

struct ScenarioRun {
    container: Container,
    runtime_cfg: HeadlessRunConfig,
    completions: Arc<AtomicUsize>,
    clock_ms: u64,
    stats: RunStats,
}

impl ScenarioRun {
    fn new(
        scenario: &HeadlessScenario,
        runtime_cfg: HeadlessRunConfig,
        driver_cfg: DriverConfig,
    ) -> Result<Self> {
        let mut container = Container::with_camera(driver_cfg, scenario.camera);
        for light in &scenario.lights {
            container.add_light(light.clone());
        }
        for spec in &scenario.layers {
            container
                .add_layer(spec.build())
                .with_context(|| format!("adding layer '{}'", spec.name))?;
        }

        Ok(Self {
            container,
            runtime_cfg,
            completions: Arc::new(AtomicUsize::new(0)),
            clock_ms: 0,
            stats: RunStats::default(),
        })
    }

    fn stats(&self) -> RunStats {
        RunStats {
            completions: self.completions.load(Ordering::SeqCst),
            ..self.stats
        }
    }

    fn callback(&self) -> Option<Completion> {
        let completions = self.completions.clone();
        Some(Box::new(move || {
            completions.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn layer(&self, name: &str) -> Result<LayerId> {
        Ok(self.container.find_layer(name)?)
    }

    fn apply(&mut self, step: &ScenarioStep) -> Result<()> {
        match step {
            ScenarioStep::Animate { steps } => {
                let callback = self.callback();
                self.container.view_control().add_animates(steps, callback)?;
            }
            ScenarioStep::Track { track } => {
                let callback = self.callback();
                self.container
                    .view_control()
                    .add_track_animate(track.clone(), callback)?;
            }
            ScenarioStep::ClearAnimates => self.container.view_control().clear_animates(),
            ScenarioStep::PauseAnimate => self.container.view_control().pause_animate(),
            ScenarioStep::ResumeAnimate => self.container.view_control().resume_animate(),
            ScenarioStep::LayerAnimate { layer, animate } => {
                let id = self.layer(layer)?;
                let callback = self.callback();
                self.container.layer_animate(id, animate, callback)?;
            }
            ScenarioStep::ShowLayer { layer, duration } => {
                let id = self.layer(layer)?;
                let callback = self.callback();
                self.container.show_layer(id, *duration, callback)?;
            }
            ScenarioStep::HideLayer { layer, duration } => {
                let id = self.layer(layer)?;
                let callback = self.callback();
                self.container.hide_layer(id, *duration, callback)?;
            }
            ScenarioStep::SetSource {
                layer,
                features,
                count,
            } => {
                let id = self.layer(layer)?;
                let source = SourceSpec {
                    features: features.clone(),
                    count: *count,
                };
                self.container.set_layer_source(id, source.features())?;
            }
            ScenarioStep::RemoveLayer { layer } => {
                let id = self.layer(layer)?;
                self.container.remove_layer(id);
            }
            ScenarioStep::Start => self.container.start(),
            ScenarioStep::Pause => self.container.view_control().pause_all(),
            ScenarioStep::Resume => self.container.view_control().resume_all(),
            ScenarioStep::Stop => self.container.view_control().cancel_all(),
            ScenarioStep::Wait { ms } => {
                let frames = wait_frames(*ms, self.runtime_cfg.tick_ms);
                return self.run_frames(frames, *ms);
            }
            ScenarioStep::Tick { frames } => {
                let total = self.runtime_cfg.tick_ms.saturating_mul(*frames as u64);
                return self.run_frames(*frames, total);
            }
            _ => {}
        }

        // The host keeps calling frames; a freshly started driver sees its
        // zero-delta tick before any time passes
        self.container.frame(self.clock_ms as f64);
        Ok(())
    }

    fn run_frames(&mut self, frames: u32, total_ms: u64) -> Result<()> {
        if frames == 0 {
            return Ok(());
        }
        let mut cfg = self.runtime_cfg;
        cfg.max_frames = frames;
        let tick_ms = cfg.tick_ms;
        let mut remaining_ms = total_ms;

        HeadlessRuntime::run(cfg, |_| {
            let step_ms = remaining_ms.min(tick_ms);
            remaining_ms = remaining_ms.saturating_sub(step_ms);
            self.clock_ms = self.clock_ms.saturating_add(step_ms);

            let report = self.container.frame(self.clock_ms as f64);
            tracing::trace!(clock_ms = self.clock_ms, dt_ms = report.dt_ms, "headless frame");

            self.stats.elapsed_frames = self.stats.elapsed_frames.saturating_add(1);
            self.stats.elapsed_ms = self.stats.elapsed_ms.saturating_add(step_ms);
            if self.container.take_render() {
                self.stats.redraws += 1;
            }
        })?;
        Ok(())
    }

    fn check(&self, step: &ScenarioStep) -> std::result::Result<(), Failure> {
        match step {
            ScenarioStep::AssertCamera {
                center,
                zoom,
                pitch,
                rotation,
                tolerance,
            } => {
                let camera = self.container.camera();
                let mut checks: Vec<(&str, f64, f64)> = Vec::new();
                if let Some(center) = center {
                    checks.push(("center.lng", center.lng, camera.center.lng));
                    checks.push(("center.lat", center.lat, camera.center.lat));
                }
                if let Some(zoom) = zoom {
                    checks.push(("zoom", *zoom as f64, camera.zoom as f64));
                }
                if let Some(pitch) = pitch {
                    checks.push(("pitch", *pitch as f64, camera.pitch as f64));
                }
                if let Some(rotation) = rotation {
                    checks.push(("rotation", *rotation as f64, camera.rotation as f64));
                }
                for (field, expected, actual) in checks {
                    if (expected - actual).abs() > *tolerance {
                        return Err(Failure(
                            "assert_camera",
                            format!("{field}: expected {expected}, got {actual}"),
                        ));
                    }
                }
                Ok(())
            }
            ScenarioStep::AssertStyle {
                layer,
                index,
                key,
                value,
                tolerance,
            } => {
                let Some(layer_ref) = self
                    .container
                    .layer_id(layer)
                    .and_then(|id| self.container.layer(id))
                else {
                    return Err(Failure("assert_style", format!("{layer}: layer not found")));
                };
                let actual = layer_ref.factor(*key, *index);
                if ((actual - value).abs() as f64) > *tolerance {
                    return Err(Failure(
                        "assert_style",
                        format!("{layer}[{index}].{key}: expected {value}, got {actual}"),
                    ));
                }
                Ok(())
            }
            ScenarioStep::AssertVisible { layer, visible } => {
                let Some(layer_ref) = self
                    .container
                    .layer_id(layer)
                    .and_then(|id| self.container.layer(id))
                else {
                    return Err(Failure("assert_visible", format!("{layer}: layer not found")));
                };
                if layer_ref.is_visible() != *visible {
                    return Err(Failure(
                        "assert_visible",
                        format!("{layer}: expected visible={visible}"),
                    ));
                }
                Ok(())
            }
            ScenarioStep::AssertCompleted { count } => {
                let actual = self.completions.load(Ordering::SeqCst);
                if actual != *count {
                    return Err(Failure(
                        "assert_completed",
                        format!("expected {count} completions, got {actual}"),
                    ));
                }
                Ok(())
            }
            ScenarioStep::AssertIdle => {
                if self.container.driver().is_active() {
                    return Err(Failure(
                        "assert_idle",
                        "animations are still running".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn wait_frames(wait_ms: u64, tick_ms: u64) -> u32 {
    if wait_ms == 0 {
        return 0;
    }
    let tick = tick_ms.max(1);
    let frames = wait_ms.saturating_add(tick.saturating_sub(1)) / tick;
    frames.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_frames_rounds_up() {
        assert_eq!(wait_frames(0, 16), 0);
        assert_eq!(wait_frames(16, 16), 1);
        assert_eq!(wait_frames(17, 16), 2);
        assert_eq!(wait_frames(500, 16), 32);
    }

    #[test]
    fn test_zoom_scenario_passes() {
        let outcome = run_scenario(
            r#"{
                "camera": { "center": [116.4, 39.9], "zoom": 3 },
                "steps": [
                    { "type": "animate", "steps": [{ "zoom": { "value": 10, "duration": 500 } }] },
                    { "type": "wait", "ms": 250 },
                    { "type": "assert_camera", "zoom": 6.5 },
                    { "type": "wait", "ms": 250 },
                    { "type": "assert_camera", "zoom": 10 },
                    { "type": "assert_completed", "count": 1 },
                    { "type": "assert_idle" }
                ]
            }"#,
            HeadlessRunConfig::default(),
        )
        .unwrap();
        assert!(!outcome.is_failed(), "{:?}", outcome.report());
        assert_eq!(outcome.report().stats.elapsed_ms, 500);
    }

    #[test]
    fn test_failed_assertion_reports_step() {
        let outcome = run_scenario(
            r#"{
                "steps": [
                    { "type": "animate", "steps": [{ "pitch": { "value": 60, "duration": 1000 } }] },
                    { "type": "wait", "ms": 100 },
                    { "type": "assert_camera", "pitch": 60 }
                ]
            }"#,
            HeadlessRunConfig::default(),
        )
        .unwrap();
        assert!(outcome.is_failed());
        assert_eq!(outcome.report().failed_step_index, Some(2));
        assert_eq!(outcome.report().assertion.as_deref(), Some("assert_camera"));
    }

    #[test]
    fn test_config_errors_surface() {
        let err = run_scenario(
            r#"{ "steps": [{ "type": "animate", "steps": [{ "zoom": { "value": 1, "duration": 0 } }] }] }"#,
            HeadlessRunConfig::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("duration must be positive"));

        assert!(run_scenario(
            r#"{ "steps": [{ "type": "show_layer", "layer": "nope" }] }"#,
            HeadlessRunConfig::default(),
        )
        .is_err());
    }
}
