//! Python bindings for the tennis-core court simulation.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from tennis_physics import CourtSimulation
//!
//! sim = CourtSimulation(seed=7)
//! sim.set_mode("clay")
//! sim.launch()
//!
//! def answer(force, angle, spin):
//!     return (300.0, 20.0, 1500.0)   # or None to let the ball go
//!
//! for _ in range(600):
//!     for event in sim.step(answer):
//!         print(event)
//! x, y = sim.ball_position()
//! ```

use pyo3::exceptions::{PyIndexError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use tennis_core::lifecycle::{Shot, ShotPhase};
use tennis_core::materials::{SurfaceCatalog, SurfaceLoader};
use tennis_core::player::{
    DefaultsResponder, PlayerContact, PlayerMove, ReturnOutcome, ReturnShotResponder,
};
use tennis_core::types::{CourtType, HeightSample, Lifecycle, ShotLimits, ShotParameters};
use tennis_core::{ConfigError, CourtMode, ShotEvent, ShotEventKind, Simulation, SimulationConfig};

/// How many invalid answers a Python responder gets before the contact is cancelled.
const MAX_ATTEMPTS: usize = 5;

fn config_err(e: ConfigError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Adapts a Python callable `(force, angle, spin) -> (force, angle, spin) | None`.
///
/// A Python exception cancels the contact and is re-raised once the step ends.
struct PyResponder<'a, 'py> {
    callable: &'a Bound<'py, PyAny>,
    error: Option<PyErr>,
}

impl ReturnShotResponder for PyResponder<'_, '_> {
    fn request_return_shot(
        &mut self,
        defaults: &ShotParameters,
        limits: &ShotLimits,
    ) -> ReturnOutcome {
        for _ in 0..MAX_ATTEMPTS {
            let answer = match self
                .callable
                .call1((defaults.force, defaults.angle, defaults.spin))
            {
                Ok(answer) => answer,
                Err(e) => {
                    self.error = Some(e);
                    return ReturnOutcome::Cancelled;
                }
            };
            if answer.is_none() {
                return ReturnOutcome::Cancelled;
            }

            let (force, angle, spin) = match answer.extract::<(f64, f64, f64)>() {
                Ok(triple) => triple,
                Err(_) => {
                    log::warn!("responder returned {answer}, expected (force, angle, spin)");
                    continue;
                }
            };
            let params = ShotParameters::new(force, angle, spin);
            match params.validate(limits) {
                Ok(()) => return ReturnOutcome::Accepted(params),
                Err(e) => log::warn!("return shot rejected: {e}"),
            }
        }
        ReturnOutcome::Cancelled
    }
}

fn event_dict<'py>(py: Python<'py>, event: &ShotEvent) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("shot", event.shot)?;
    dict.set_item("court", event.court.key())?;
    dict.set_item("time", event.time)?;
    match event.kind {
        ShotEventKind::NetContact { height } => {
            dict.set_item("kind", "net_contact")?;
            dict.set_item("height", height)?;
        }
        ShotEventKind::Bounce { count, rebound_vy } => {
            dict.set_item("kind", "bounce")?;
            dict.set_item("count", count)?;
            dict.set_item("rebound_vy", rebound_vy)?;
        }
        ShotEventKind::PlayerContact(PlayerContact::Returned(params)) => {
            dict.set_item("kind", "player_contact")?;
            dict.set_item("accepted", true)?;
            dict.set_item("shot_params", (params.force, params.angle, params.spin))?;
        }
        ShotEventKind::PlayerContact(PlayerContact::Cancelled) => {
            dict.set_item("kind", "player_contact")?;
            dict.set_item("accepted", false)?;
        }
        ShotEventKind::CameToRest => dict.set_item("kind", "came_to_rest")?,
        ShotEventKind::WentOutOfBounds => dict.set_item("kind", "went_out_of_bounds")?,
        ShotEventKind::Relaunched(params) => {
            dict.set_item("kind", "relaunched")?;
            dict.set_item("shot_params", (params.force, params.angle, params.spin))?;
        }
    }
    Ok(dict)
}

fn phase_name(phase: ShotPhase) -> &'static str {
    match phase {
        ShotPhase::Idle => "idle",
        ShotPhase::Flying => "flying",
        ShotPhase::Paused => "paused",
        ShotPhase::Finished(_) => "finished",
        ShotPhase::WaitingToRelaunch { .. } => "waiting_to_relaunch",
    }
}

/// How the last ball ended, or `None` while it is still in play.
fn outcome_name(phase: ShotPhase) -> Option<&'static str> {
    phase.outcome().map(|lifecycle| match lifecycle {
        Lifecycle::OutOfBounds => "out_of_bounds",
        Lifecycle::AtRest => "at_rest",
        Lifecycle::Flying => "flying",
    })
}

fn marker_pairs(samples: &[HeightSample]) -> Vec<(f64, f64)> {
    samples
        .iter()
        .map(|sample| (sample.time, sample.height))
        .collect()
}

/// Court simulation: one or four balls and the receiving player.
#[pyclass]
pub struct CourtSimulation {
    sim: Simulation,
}

impl CourtSimulation {
    fn shot(&self, index: usize) -> PyResult<&Shot> {
        self.sim
            .shots()
            .get(index)
            .ok_or_else(|| PyIndexError::new_err(format!("no shot {index}")))
    }

    fn step_with(&mut self, responder: Option<&Bound<'_, PyAny>>) -> PyResult<Vec<ShotEvent>> {
        match responder {
            Some(callable) => {
                let mut responder = PyResponder {
                    callable,
                    error: None,
                };
                let events = self.sim.step(&mut responder);
                match responder.error {
                    Some(e) => Err(e),
                    None => Ok(events),
                }
            }
            None => Ok(self.sim.step(&mut DefaultsResponder)),
        }
    }
}

#[pymethods]
impl CourtSimulation {
    /// Create a simulation in surface comparison mode.
    ///
    /// `config_path` points at a YAML configuration, `materials_path` at a
    /// directory holding `surfaces/*.yaml`. Both default to built-in values.
    #[new]
    #[pyo3(signature = (seed=None, config_path=None, materials_path=None))]
    fn new(
        seed: Option<u64>,
        config_path: Option<&str>,
        materials_path: Option<&str>,
    ) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => SimulationConfig::from_yaml_file(path).map_err(config_err)?,
            None => SimulationConfig::default(),
        };
        let catalog = match materials_path {
            Some(path) => SurfaceCatalog::from_loader(&SurfaceLoader::new(path)).map_err(config_err)?,
            None => SurfaceCatalog::standard(),
        };
        Ok(Self {
            sim: Simulation::new(config, catalog, seed.unwrap_or(0)),
        })
    }

    /// Raw simulation clock in seconds.
    #[getter]
    fn time(&self) -> f64 {
        self.sim.elapsed()
    }

    /// "comparison" or the rally court key.
    #[getter]
    fn mode(&self) -> String {
        match self.sim.mode() {
            CourtMode::Comparison => "comparison".to_string(),
            CourtMode::Rally(court) => court.key().to_string(),
        }
    }

    #[getter]
    fn shot_count(&self) -> usize {
        self.sim.shots().len()
    }

    /// Switch to "comparison" or to a rally on the named court ("clay", "us_open_hard", ...).
    fn set_mode(&mut self, mode: &str) -> PyResult<()> {
        let mode = if mode.eq_ignore_ascii_case("comparison") {
            CourtMode::Comparison
        } else {
            let court = CourtType::parse(mode)
                .ok_or_else(|| PyValueError::new_err(format!("unknown court '{mode}'")))?;
            CourtMode::Rally(court)
        };
        self.sim.set_mode(mode);
        Ok(())
    }

    /// Serve every active ball. Missing values come from the configured default shot.
    #[pyo3(signature = (force=None, angle=None, spin=None))]
    fn launch(&mut self, force: Option<f64>, angle: Option<f64>, spin: Option<f64>) {
        let defaults = self.sim.config().default_shot;
        let params = ShotParameters::new(
            force.unwrap_or(defaults.force),
            angle.unwrap_or(defaults.angle),
            spin.unwrap_or(defaults.spin),
        );
        self.sim.launch(&params);
    }

    /// Drop every ball from rest; defaults to the configured drop height.
    #[pyo3(signature = (height=None))]
    fn drop(&mut self, height: Option<f64>) {
        let height = height.unwrap_or(self.sim.config().drop_height);
        self.sim.drop_all(height);
    }

    fn reset(&mut self) {
        self.sim.reset();
    }

    /// Advance one tick and return the events as dicts.
    ///
    /// `responder` is called when the ball reaches the player; without one the
    /// default shot is played back.
    #[pyo3(signature = (responder=None))]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        responder: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Vec<Bound<'py, PyDict>>> {
        let events = self.step_with(responder)?;
        events.iter().map(|event| event_dict(py, event)).collect()
    }

    /// Run several ticks at once (more efficient).
    #[pyo3(signature = (steps, responder=None))]
    fn step_n<'py>(
        &mut self,
        py: Python<'py>,
        steps: usize,
        responder: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Vec<Bound<'py, PyDict>>> {
        let mut out = Vec::new();
        for _ in 0..steps {
            for event in self.step_with(responder)? {
                out.push(event_dict(py, &event)?);
            }
        }
        Ok(out)
    }

    fn is_settled(&self) -> bool {
        self.sim.is_settled()
    }

    fn move_left(&mut self) {
        self.sim.move_player(PlayerMove::Left);
    }

    fn move_right(&mut self) {
        self.sim.move_player(PlayerMove::Right);
    }

    fn player_position(&self) -> f64 {
        self.sim.player().position()
    }

    #[pyo3(signature = (shot=0))]
    fn ball_position(&self, shot: usize) -> PyResult<(f64, f64)> {
        let pos = self.shot(shot)?.ball().pos;
        Ok((pos.x, pos.y))
    }

    #[pyo3(signature = (shot=0))]
    fn ball_velocity(&self, shot: usize) -> PyResult<(f64, f64)> {
        let vel = self.shot(shot)?.ball().vel;
        Ok((vel.x, vel.y))
    }

    /// Height samples as `(time, height)` pairs.
    #[pyo3(signature = (shot=0))]
    fn trajectory(&self, shot: usize) -> PyResult<Vec<(f64, f64)>> {
        Ok(marker_pairs(&self.shot(shot)?.ball().trajectory))
    }

    /// `(time, height)` markers of the first three bounces.
    #[pyo3(signature = (shot=0))]
    fn bounces(&self, shot: usize) -> PyResult<Vec<(f64, f64)>> {
        Ok(marker_pairs(&self.shot(shot)?.ball().bounces))
    }

    /// Get the state of one shot as a dict for easy inspection.
    #[pyo3(signature = (shot=0))]
    fn state_dict<'py>(&self, py: Python<'py>, shot: usize) -> PyResult<Bound<'py, PyDict>> {
        let shot = self.shot(shot)?;
        let ball = shot.ball();
        let dict = PyDict::new(py);
        dict.set_item("court", shot.surface().court.key())?;
        dict.set_item("surface", shot.surface().name.as_str())?;
        dict.set_item("phase", phase_name(shot.phase()))?;
        dict.set_item("outcome", outcome_name(shot.phase()))?;
        dict.set_item("time", ball.elapsed)?;
        dict.set_item("ball_x", ball.pos.x)?;
        dict.set_item("ball_y", ball.pos.y)?;
        dict.set_item("ball_vx", ball.vel.x)?;
        dict.set_item("ball_vy", ball.vel.y)?;
        dict.set_item("ball_speed", ball.speed())?;
        dict.set_item("ball_spin_rpm", ball.spin)?;
        dict.set_item("bounce_count", ball.bounce_count)?;
        dict.set_item("player_x", self.sim.player().position())?;
        Ok(dict)
    }
}

/// Python module definition.
#[pymodule]
fn tennis_physics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<CourtSimulation>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tennis_core::player::ScriptedResponder;

    #[test]
    fn test_bounce_markers_are_time_height_pairs() {
        let mut sim = Simulation::new(SimulationConfig::default(), SurfaceCatalog::standard(), 0);
        sim.drop_all(2.0);
        sim.run(600, &mut ScriptedResponder::default());

        let pairs = marker_pairs(&sim.shots()[0].ball().bounces);

        assert_eq!(pairs.len(), 3);
        assert!((pairs[0].0 - 0.64).abs() < 0.01, "first bounce at t={}", pairs[0].0);
        assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(pairs.iter().all(|&(_, height)| height == 0.0));
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(outcome_name(ShotPhase::Flying), None);
        assert_eq!(
            outcome_name(ShotPhase::WaitingToRelaunch {
                remaining: 1.0,
                after: Lifecycle::OutOfBounds
            }),
            Some("out_of_bounds")
        );
        assert_eq!(outcome_name(ShotPhase::Finished(Lifecycle::AtRest)), Some("at_rest"));
        assert_eq!(phase_name(ShotPhase::Finished(Lifecycle::AtRest)), "finished");
    }
}
