use std::convert::Infallible;

use log::trace;
use serde::Serialize;

use crate::config::{Columns, OutputSettings, OutputShape};
use crate::rows::{EventRows, RecoRow, TruthRow, NO_GENERATION};
use crate::traits::Write;

/// A single entry of the output table
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    /// One measurement per hit
    HitValues(Vec<f32>),
    /// Hit measurements for several particles
    HitValuesArray(Vec<Vec<f32>>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Optional groups of columns
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
enum Group {
    Generation,
    TrackScore,
    Calorimetry,
}

impl Columns {
    fn contains(&self, group: Group) -> bool {
        match group {
            Group::Generation => self.generation,
            Group::TrackScore => self.track_score,
            Group::Calorimetry => self.calorimetry,
        }
    }
}

const PER_EVENT: [(&str, Option<Group>); 17] = [
    ("eventID", None),
    ("recoNParticles", None),
    ("reco", None),
    ("recoGeneration", Some(Group::Generation)),
    ("recoTrackLength", None),
    ("recoTrackScore", Some(Group::TrackScore)),
    ("recodEdx", Some(Group::Calorimetry)),
    ("recoResidualRange", Some(Group::Calorimetry)),
    ("simNParticles", None),
    ("sim", None),
    ("simGeneration", Some(Group::Generation)),
    ("simPdgCode", None),
    ("simEnergy", None),
    ("simID", None),
    ("nPFParticles", None),
    ("nDaughters", None),
    ("nPrimaryChildren", None),
];

const PER_PARTICLE: [(&str, Option<Group>); 12] = [
    ("eventID", None),
    ("reco", None),
    ("pfparticle", None),
    ("generation", Some(Group::Generation)),
    ("trackLength", None),
    ("trackScore", Some(Group::TrackScore)),
    ("dEdx", Some(Group::Calorimetry)),
    ("residualRange", Some(Group::Calorimetry)),
    ("truePdgCode", None),
    ("trueEnergy", None),
    ("trueTrackID", None),
    ("trueGeneration", Some(Group::Generation)),
];

type Record = Vec<(&'static str, Value)>;

/// A named column
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    name: &'static str,
    values: Vec<Value>,
}

impl Column {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Append-only columnar table
///
/// The layout is fixed on construction. With
/// [OutputShape::PerEvent] there is one record for each event,
/// including rejected ones, and particle quantities are stored as
/// arrays. The `reco` and `sim` flags tell which of the particles were
/// reconstructed and which have a simulated counterpart.
///
/// With [OutputShape::PerParticle] there is one record for each
/// reconstructed particle and for each primary simulated particle that
/// was not reconstructed. Rejected events are skipped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    shape: OutputShape,
    records: usize,
    columns: Vec<Column>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(OutputSettings::default())
    }
}

impl Table {
    pub fn new(settings: OutputSettings) -> Self {
        let layout: &[_] = match settings.shape {
            OutputShape::PerEvent => &PER_EVENT,
            OutputShape::PerParticle => &PER_PARTICLE,
        };
        let columns = layout
            .iter()
            .filter(|(_, group)| {
                group.map_or(true, |g| settings.columns.contains(g))
            })
            .map(|(name, _)| Column {
                name: *name,
                values: Vec::new(),
            })
            .collect();
        Self {
            shape: settings.shape,
            records: 0,
            columns,
        }
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    fn push(&mut self, record: Record) {
        for (name, value) in record {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name == name) {
                col.values.push(value)
            }
        }
        self.records += 1;
    }
}

impl Write for Table {
    type Error = Infallible;

    fn write(&mut self, rows: &EventRows) -> Result<(), Self::Error> {
        match self.shape {
            OutputShape::PerEvent => self.push(event_record(rows)),
            OutputShape::PerParticle => {
                for reco in &rows.reco {
                    self.push(reco_record(rows.event, reco));
                }
                for truth in &rows.truth_only {
                    self.push(truth_only_record(rows.event, truth));
                }
            }
        }
        trace!("Table has {} records", self.records);
        Ok(())
    }
}

fn event_record(rows: &EventRows) -> Record {
    let reco = &rows.reco;
    let truth_only = &rows.truth_only;
    let reco_flags = reco.iter().map(|_| 1).chain(truth_only.iter().map(|_| 0));
    let sim_flags = reco
        .iter()
        .map(|r| r.truth.is_some() as i64)
        .chain(truth_only.iter().map(|_| 1));
    let sim_generation = reco
        .iter()
        .map(|r| r.truth_generation())
        .chain(truth_only.iter().map(|t| t.generation as i64));
    let sim_pdg = reco
        .iter()
        .map(|r| r.truth_pdg().id() as i64)
        .chain(truth_only.iter().map(|t| t.pdg.id() as i64));
    let sim_energy = reco
        .iter()
        .map(|r| r.truth_energy())
        .chain(truth_only.iter().map(|t| t.energy));
    let sim_id = reco
        .iter()
        .map(|r| r.truth_track_id() as i64)
        .chain(truth_only.iter().map(|t| t.track_id as i64));
    vec![
        ("eventID", Value::Int(rows.event as i64)),
        ("recoNParticles", Value::Int(reco.len() as i64)),
        ("reco", Value::IntArray(reco_flags.collect())),
        (
            "recoGeneration",
            Value::IntArray(reco.iter().map(|r| r.generation as i64).collect()),
        ),
        (
            "recoTrackLength",
            Value::FloatArray(reco.iter().map(|r| r.track_length()).collect()),
        ),
        (
            "recoTrackScore",
            Value::FloatArray(
                reco.iter().map(|r| r.track_score() as f64).collect(),
            ),
        ),
        (
            "recodEdx",
            Value::HitValuesArray(reco.iter().map(|r| r.dedx.clone()).collect()),
        ),
        (
            "recoResidualRange",
            Value::HitValuesArray(
                reco.iter().map(|r| r.residual_range.clone()).collect(),
            ),
        ),
        (
            "simNParticles",
            Value::Int(rows.counts.truth_primaries as i64),
        ),
        ("sim", Value::IntArray(sim_flags.collect())),
        ("simGeneration", Value::IntArray(sim_generation.collect())),
        ("simPdgCode", Value::IntArray(sim_pdg.collect())),
        ("simEnergy", Value::FloatArray(sim_energy.collect())),
        ("simID", Value::IntArray(sim_id.collect())),
        ("nPFParticles", Value::Int(rows.counts.pfparticles as i64)),
        ("nDaughters", Value::Int(rows.counts.daughters as i64)),
        (
            "nPrimaryChildren",
            Value::Int(rows.counts.primary_children as i64),
        ),
    ]
}

fn reco_record(event: u32, reco: &RecoRow) -> Record {
    vec![
        ("eventID", Value::Int(event as i64)),
        ("reco", Value::Int(1)),
        ("pfparticle", Value::Int(reco.pfparticle as i64)),
        ("generation", Value::Int(reco.generation as i64)),
        ("trackLength", Value::Float(reco.track_length())),
        ("trackScore", Value::Float(reco.track_score() as f64)),
        ("dEdx", Value::HitValues(reco.dedx.clone())),
        ("residualRange", Value::HitValues(reco.residual_range.clone())),
        ("truePdgCode", Value::Int(reco.truth_pdg().id() as i64)),
        ("trueEnergy", Value::Float(reco.truth_energy())),
        ("trueTrackID", Value::Int(reco.truth_track_id() as i64)),
        ("trueGeneration", Value::Int(reco.truth_generation())),
    ]
}

fn truth_only_record(event: u32, truth: &TruthRow) -> Record {
    vec![
        ("eventID", Value::Int(event as i64)),
        ("reco", Value::Int(0)),
        ("pfparticle", Value::Int(-1)),
        ("generation", Value::Int(NO_GENERATION)),
        ("trackLength", Value::Float(f64::NAN)),
        ("trackScore", Value::Float(f64::NAN)),
        ("dEdx", Value::HitValues(Vec::new())),
        ("residualRange", Value::HitValues(Vec::new())),
        ("truePdgCode", Value::Int(truth.pdg.id() as i64)),
        ("trueEnergy", Value::Float(truth.energy)),
        ("trueTrackID", Value::Int(truth.track_id as i64)),
        ("trueGeneration", Value::Int(truth.generation as i64)),
    ]
}
