//! Python bindings for the serving layer.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDateTime;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::aggregator::{self, AggregatedStatus};
use crate::config::{EngineConfig, GapPolicy};
use crate::error::RotaError;
use crate::intervals;
use crate::models::{AvailabilityBlock, Personnel, SlotMap};
use crate::readiness::{self, ReadinessResult};
use crate::week::{self, WeekWindow, WeeklyStats};

fn value_error(err: RotaError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_gap_policy(name: &str) -> PyResult<GapPolicy> {
    match name {
        "tolerant" => Ok(GapPolicy::Tolerant),
        "breaking" => Ok(GapPolicy::Breaking),
        other => Err(PyValueError::new_err(format!("Unknown gap policy: {}", other))),
    }
}

fn to_blocks(pairs: Vec<(NaiveDateTime, NaiveDateTime)>) -> PyResult<Vec<AvailabilityBlock>> {
    pairs
        .into_iter()
        .map(|(start, end)| AvailabilityBlock::new(start, end).map_err(value_error))
        .collect()
}

/// A continuous availability block `[start, end)`.
#[pyclass(name = "Block")]
#[derive(Clone, Debug)]
pub struct PyBlock {
    #[pyo3(get)]
    pub start: NaiveDateTime,
    #[pyo3(get)]
    pub end: NaiveDateTime,
}

#[pymethods]
impl PyBlock {
    fn __repr__(&self) -> String {
        format!("Block(start={}, end={})", self.start, self.end)
    }
}

impl From<AvailabilityBlock> for PyBlock {
    fn from(block: AvailabilityBlock) -> Self {
        Self {
            start: block.start,
            end: block.end,
        }
    }
}

/// Current status signals for one entity.
#[pyclass(name = "Status")]
#[derive(Clone, Debug)]
pub struct PyStatus {
    #[pyo3(get)]
    pub available_now: bool,
    #[pyo3(get)]
    pub next_available: Option<NaiveDateTime>,
    #[pyo3(get)]
    pub next_available_until: Option<NaiveDateTime>,
    /// Display form, e.g. "7.98h" or ">72h"
    #[pyo3(get)]
    pub available_for: Option<String>,
    #[pyo3(get)]
    pub available_for_hours: Option<f64>,
    #[pyo3(get)]
    pub determined: bool,
}

#[pymethods]
impl PyStatus {
    fn __repr__(&self) -> String {
        format!(
            "Status(available_now={}, next_available={:?}, available_for={:?})",
            self.available_now, self.next_available, self.available_for
        )
    }
}

impl From<AggregatedStatus> for PyStatus {
    fn from(status: AggregatedStatus) -> Self {
        Self {
            available_now: status.available_now,
            next_available: status.next_available,
            next_available_until: status.next_available_until,
            available_for: status.available_for.map(|a| a.to_string()),
            available_for_hours: status.available_for.and_then(|a| a.hours()),
            determined: status.is_determined(),
        }
    }
}

/// Weekly hour totals for one person.
#[pyclass(name = "WeeklyStats")]
#[derive(Clone, Debug)]
pub struct PyWeeklyStats {
    #[pyo3(get)]
    pub hours_planned: f64,
    #[pyo3(get)]
    pub hours_achieved: f64,
    #[pyo3(get)]
    pub hours_remaining: f64,
}

#[pymethods]
impl PyWeeklyStats {
    fn __repr__(&self) -> String {
        format!(
            "WeeklyStats(planned={:.2}, achieved={:.2}, remaining={:.2})",
            self.hours_planned, self.hours_achieved, self.hours_remaining
        )
    }
}

impl From<WeeklyStats> for PyWeeklyStats {
    fn from(stats: WeeklyStats) -> Self {
        Self {
            hours_planned: stats.hours_planned,
            hours_achieved: stats.hours_achieved,
            hours_remaining: stats.hours_remaining,
        }
    }
}

/// A crew member as stored upstream.
#[pyclass(name = "Personnel")]
#[derive(Clone, Debug)]
pub struct PyPersonnel {
    inner: Personnel,
}

#[pymethods]
impl PyPersonnel {
    #[new]
    #[pyo3(signature = (id, name, role, skills, contract_hours=String::new()))]
    fn new(id: i64, name: String, role: String, skills: String, contract_hours: String) -> Self {
        Self {
            inner: Personnel::new(id, &name, &role, &skills, &contract_hours),
        }
    }

    #[getter]
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    #[getter]
    fn role(&self) -> String {
        self.inner.role.clone()
    }

    #[getter]
    fn skills(&self) -> String {
        self.inner.skills.to_string()
    }

    #[getter]
    fn unrecognised_skills(&self) -> Vec<String> {
        self.inner.unrecognised_skills.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "Personnel(name={:?}, role={:?}, skills={:?})",
            self.inner.name,
            self.inner.role,
            self.inner.skills.to_string()
        )
    }
}

/// Readiness verdict for the appliance.
#[pyclass(name = "Readiness")]
#[derive(Clone, Debug)]
pub struct PyReadiness {
    #[pyo3(get)]
    pub rules_pass: bool,
    #[pyo3(get)]
    pub rules: HashMap<String, bool>,
    #[pyo3(get)]
    pub skill_counts: HashMap<String, usize>,
    #[pyo3(get)]
    pub ba_non_ttr: usize,
}

#[pymethods]
impl PyReadiness {
    fn __repr__(&self) -> String {
        format!(
            "Readiness(rules_pass={}, ba_non_ttr={})",
            self.rules_pass, self.ba_non_ttr
        )
    }
}

impl From<ReadinessResult> for PyReadiness {
    fn from(result: ReadinessResult) -> Self {
        let rules = HashMap::from([
            ("total_crew_ok".to_string(), result.rules.total_crew_ok),
            ("ttr_present".to_string(), result.rules.ttr_present),
            ("lgv_present".to_string(), result.rules.lgv_present),
            ("ba_non_ttr_ok".to_string(), result.rules.ba_non_ttr_ok),
            ("ffc_with_ba".to_string(), result.rules.ffc_with_ba),
        ]);
        let skill_counts = HashMap::from([
            ("TTR".to_string(), result.skill_counts.ttr),
            ("LGV".to_string(), result.skill_counts.lgv),
            ("BA".to_string(), result.skill_counts.ba),
        ]);
        Self {
            rules_pass: result.rules_pass,
            rules,
            skill_counts,
            ba_non_ttr: result.ba_non_ttr,
        }
    }
}

/// Convert one entity's slots (keyed "DD/MM/YYYY HHMM") into availability blocks.
///
/// Malformed keys are dropped.
#[pyfunction]
#[pyo3(signature = (slots, gap_policy="tolerant"))]
fn build_blocks(slots: HashMap<String, bool>, gap_policy: &str) -> PyResult<Vec<PyBlock>> {
    let config = EngineConfig {
        gap_policy: parse_gap_policy(gap_policy)?,
        ..EngineConfig::default()
    };
    let slots = SlotMap::from_raw(slots, config.verbosity);
    Ok(intervals::build_blocks(&slots, &config)
        .into_iter()
        .map(PyBlock::from)
        .collect())
}

/// Merge slot maps for one entity, later maps overwriting earlier ones.
#[pyfunction]
fn aggregate_slots(maps: Vec<HashMap<String, bool>>) -> HashMap<String, bool> {
    let parsed: Vec<SlotMap> = maps
        .into_iter()
        .map(|m| SlotMap::from_raw(m, EngineConfig::default().verbosity))
        .collect();
    aggregator::aggregate(&parsed).to_raw().into_iter().collect()
}

/// Derive current status signals for one entity at `now`.
#[pyfunction]
fn derive_status(slots: HashMap<String, bool>, now: NaiveDateTime) -> PyStatus {
    let config = EngineConfig::default();
    let slots = SlotMap::from_raw(slots, config.verbosity);
    aggregator::derive_status(&slots, now, &config).into()
}

/// Remaining availability of the block covering `now`, e.g. "7.98h".
#[pyfunction]
fn remaining_at(
    blocks: Vec<(NaiveDateTime, NaiveDateTime)>,
    now: NaiveDateTime,
) -> PyResult<Option<String>> {
    let blocks = to_blocks(blocks)?;
    let cap = EngineConfig::default().availability_cap;
    Ok(intervals::remaining_at(&blocks, now, cap).map(|r| r.to_string()))
}

/// Union of overlapping or touching intervals.
#[pyfunction]
fn merge_intervals(
    intervals: Vec<(NaiveDateTime, NaiveDateTime)>,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    week::merge_intervals(&intervals)
}

/// Planned, achieved and remaining hours for the week containing `now`.
#[pyfunction]
#[pyo3(signature = (blocks, now, contract_hours=""))]
fn weekly_stats(
    blocks: Vec<(NaiveDateTime, NaiveDateTime)>,
    now: NaiveDateTime,
    contract_hours: &str,
) -> PyResult<PyWeeklyStats> {
    let blocks = to_blocks(blocks)?;
    let window = WeekWindow::containing(now, EngineConfig::default().week_start);
    Ok(week::weekly_stats(&blocks, &window, now, contract_hours).into())
}

/// Evaluate the appliance readiness rules over the available crew.
#[pyfunction]
fn evaluate_readiness(personnel: Vec<PyPersonnel>) -> PyReadiness {
    let config = EngineConfig::default();
    let crew: Vec<Personnel> = personnel.into_iter().map(|p| p.inner).collect();
    readiness::evaluate(&crew, &config.readiness, config.verbosity).into()
}

/// The rota_core Python module.
#[pymodule]
fn rota_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBlock>()?;
    m.add_class::<PyStatus>()?;
    m.add_class::<PyWeeklyStats>()?;
    m.add_class::<PyPersonnel>()?;
    m.add_class::<PyReadiness>()?;

    m.add_function(wrap_pyfunction!(build_blocks, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate_slots, m)?)?;
    m.add_function(wrap_pyfunction!(derive_status, m)?)?;
    m.add_function(wrap_pyfunction!(remaining_at, m)?)?;
    m.add_function(wrap_pyfunction!(merge_intervals, m)?)?;
    m.add_function(wrap_pyfunction!(weekly_stats, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_readiness, m)?)?;

    Ok(())
}
