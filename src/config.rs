use std::io::Read;

use derive_builder::Builder;
use log::warn;
use particle_id::ParticleID;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::event::{Current, McParticle, TruthInteraction};

/// Labels of the modules that produced the event products
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct Labels {
    /// Simulated neutrino interactions
    pub mc_truth: String,
    /// Simulated particles
    pub mc_particle: String,
    /// Slices
    pub slice: String,
    /// PFParticles, their metadata, clusters and hits
    pub pfparticle: String,
    /// Tracks and PFParticle-track associations
    pub track: String,
    /// Calorimetry and track-calorimetry associations
    pub calorimetry: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            mc_truth: "generator".to_owned(),
            mc_particle: "largeant".to_owned(),
            slice: "pandora".to_owned(),
            pfparticle: "pandora".to_owned(),
            track: "pandoraTrack".to_owned(),
            calorimetry: "pandoracalo".to_owned(),
        }
    }
}

/// Event selection by neutrino flavour and interaction current
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct Selection {
    /// PDG code of the initial neutrino
    pub neutrino: i32,
    pub current: Current,
    /// Reject events without any simulated interaction
    ///
    /// By default such events pass, since all of their (zero)
    /// interactions match.
    pub reject_empty_truth: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            neutrino: 14,
            current: Current::Charged,
            reject_empty_truth: false,
        }
    }
}

impl Selection {
    /// Whether an event with the given interactions is selected
    pub fn accepts(&self, interactions: &[TruthInteraction]) -> bool {
        if self.reject_empty_truth && interactions.is_empty() {
            return false;
        }
        crate::selection::matches_selection(
            interactions,
            ParticleID::new(self.neutrino),
            self.current,
        )
    }
}

/// Which mother ID marks a primary truth particle
#[derive(Copy, Clone, Debug, Default, Display, EnumString, Eq, PartialEq, Hash)]
#[derive(Deserialize, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryConvention {
    /// Primaries have mother 0
    #[default]
    MotherZero,
    /// Primaries have mother -1
    MotherMinusOne,
    /// Both 0 and -1 mark primaries
    Either,
}

impl PrimaryConvention {
    pub fn is_primary_mother(self, mother: i32) -> bool {
        use PrimaryConvention::*;
        match self {
            MotherZero => mother == 0,
            MotherMinusOne => mother == -1,
            Either => mother == 0 || mother == -1,
        }
    }

    pub fn is_primary(self, particle: &McParticle) -> bool {
        self.is_primary_mother(particle.mother)
    }
}

/// How simulated particles are interpreted
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct TruthSettings {
    pub primary: PrimaryConvention,
    /// Attribute energy deposited by untracked shower particles
    /// (negative track IDs) to their tracked ancestor
    pub roll_up_unsaved_ids: bool,
}

impl Default for TruthSettings {
    fn default() -> Self {
        Self {
            primary: Default::default(),
            roll_up_unsaved_ids: true,
        }
    }
}

/// Name of the metadata property holding the track score
pub const TRACK_SCORE: &str = "TrackScore";

/// How reconstructed particles are interpreted
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoSettings {
    /// Detection plane for dE/dx and residual range
    pub calorimetry_plane: u32,
    /// Metadata property used as track score
    pub track_score_property: String,
    /// Only emit rows for particles with exactly one track
    pub require_unique_track: bool,
}

impl Default for RecoSettings {
    fn default() -> Self {
        Self {
            calorimetry_plane: 2,
            track_score_property: TRACK_SCORE.to_owned(),
            require_unique_track: false,
        }
    }
}

/// Record layout of the output table
#[derive(Copy, Clone, Debug, Default, Display, EnumString, Eq, PartialEq, Hash)]
#[derive(Deserialize, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum OutputShape {
    /// One record per event with array columns
    #[default]
    PerEvent,
    /// One record per reconstructed or truth-only particle
    PerParticle,
}

/// Optional column groups
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct Columns {
    pub generation: bool,
    pub track_score: bool,
    pub calorimetry: bool,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            generation: true,
            track_score: true,
            calorimetry: true,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub shape: OutputShape,
    pub columns: Columns,
}

/// Analysis configuration
///
/// This is fixed before the first event is analysed.
#[derive(Builder, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    #[builder(default)]
    pub labels: Labels,
    #[builder(default)]
    pub selection: Selection,
    #[builder(default)]
    pub truth: TruthSettings,
    #[builder(default)]
    pub reco: RecoSettings,
    #[builder(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseErr(#[from] serde_yaml::Error),
}

impl Config {
    /// Read a configuration in YAML format
    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.check();
        Ok(config)
    }

    /// Read a configuration in YAML format
    pub fn from_reader<R: Read>(r: R) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_reader(r)?;
        config.check();
        Ok(config)
    }

    fn check(&self) {
        if !ParticleID::new(self.selection.neutrino).abs().is_neutrino() {
            warn!(
                "Selected initial neutrino has PDG code {}, which is not a neutrino",
                self.selection.neutrino
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConfigBuilder::default().build().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.selection.neutrino, 14);
        assert_eq!(config.reco.calorimetry_plane, 2);
        assert_eq!(config.truth.primary, PrimaryConvention::MotherZero);
        assert!(config.truth.roll_up_unsaved_ids);
        assert_eq!(config.output.shape, OutputShape::PerEvent);
    }

    #[test]
    fn from_yaml() {
        let yaml = "
labels:
  mc_truth: generator
  track: pandoraTrackKalman
selection:
  neutrino: 16
  current: nc
truth:
  primary: mother-minus-one
output:
  shape: per-particle
  columns:
    calorimetry: false
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.labels.track, "pandoraTrackKalman");
        assert_eq!(config.labels.slice, "pandora");
        assert_eq!(config.selection.neutrino, 16);
        assert_eq!(config.selection.current, Current::Neutral);
        assert!(!config.selection.reject_empty_truth);
        assert_eq!(config.truth.primary, PrimaryConvention::MotherMinusOne);
        assert_eq!(config.output.shape, OutputShape::PerParticle);
        assert!(!config.output.columns.calorimetry);
        assert!(config.output.columns.generation);
    }

    #[test]
    fn yaml_round_trip() {
        let config = ConfigBuilder::default()
            .selection(Selection {
                neutrino: -12,
                current: Current::Charged,
                reject_empty_truth: true,
            })
            .build()
            .unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn current_flags() {
        let current = |yaml: &str| Config::from_yaml(yaml).unwrap().selection.current;
        assert_eq!(current("selection: {current: 0}"), Current::Charged);
        assert_eq!(current("selection: {current: 1}"), Current::Neutral);
        assert_eq!(current("selection: {current: '0'}"), Current::Charged);
        assert_eq!(current("selection: {current: '1'}"), Current::Neutral);
        assert_eq!(current("selection: {current: CC}"), Current::Charged);
        assert_eq!(current("selection: {current: neutral}"), Current::Neutral);
        assert!(Config::from_yaml("selection: {current: 2}").is_err());
        assert!(Config::from_yaml("selection: {current: -1}").is_err());
    }

    #[test]
    fn bad_yaml() {
        assert!(Config::from_yaml("selection: {current: xc}").is_err());
    }

    #[test]
    fn primary_convention() {
        use PrimaryConvention::*;
        assert!(MotherZero.is_primary_mother(0));
        assert!(!MotherZero.is_primary_mother(-1));
        assert!(MotherMinusOne.is_primary_mother(-1));
        assert!(!MotherMinusOne.is_primary_mother(0));
        assert!(Either.is_primary_mother(0) && Either.is_primary_mother(-1));
        assert!(!Either.is_primary_mother(3));
        assert_eq!("mother-minus-one".parse::<PrimaryConvention>(), Ok(MotherMinusOne));
    }
}
