use std::collections::{BTreeMap, HashMap};
use std::default::Default;

use particle_id::ParticleID;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::assns::Assns;

/// Interaction current of a simulated neutrino interaction
///
/// Parses from `cc`/`charged` and `nc`/`neutral`, case-insensitive,
/// or from the generator's `CCNC` flag: 0 is charged current and 1 is
/// neutral current. Deserialisation accepts the same names and flags,
/// both as strings and as integers.
#[derive(Copy, Clone, Debug, Default, Display, EnumString, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[derive(Deserialize, Serialize)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "CurrentFlag")]
pub enum Current {
    /// Charged current
    #[default]
    #[strum(to_string = "cc", serialize = "charged", serialize = "0")]
    #[serde(rename = "cc")]
    Charged,
    /// Neutral current
    #[strum(to_string = "nc", serialize = "neutral", serialize = "1")]
    #[serde(rename = "nc")]
    Neutral,
}

impl Current {
    /// Convert from the generator's `CCNC` flag (0 for CC, 1 for NC)
    pub fn from_ccnc(ccnc: i32) -> Self {
        if ccnc == 0 {
            Self::Charged
        } else {
            Self::Neutral
        }
    }
}

// serialised form of a `Current`, parsed with `FromStr`
#[derive(Deserialize)]
#[serde(untagged)]
enum CurrentFlag {
    Ccnc(i64),
    Name(String),
}

impl TryFrom<CurrentFlag> for Current {
    type Error = strum::ParseError;

    fn try_from(flag: CurrentFlag) -> Result<Self, Self::Error> {
        match flag {
            CurrentFlag::Ccnc(ccnc) => ccnc.to_string().parse(),
            CurrentFlag::Name(name) => name.parse(),
        }
    }
}

/// Simulated neutrino interaction
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TruthInteraction {
    /// Incoming neutrino
    pub neutrino: ParticleID,
    pub current: Current,
}

/// Simulated ("truth") particle
#[derive(Clone, Debug, PartialEq)]
pub struct McParticle {
    /// Geant4 track ID
    pub track_id: i32,
    /// Track ID of the mother particle
    ///
    /// Which value marks a primary particle depends on the
    /// [PrimaryConvention](crate::config::PrimaryConvention).
    pub mother: i32,
    pub pdg: ParticleID,
    /// Energy in GeV
    pub energy: f64,
    pub daughters: Vec<i32>,
}

/// Reconstructed particle candidate
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PfParticle {
    pub id: usize,
    /// ID of the parent particle, `None` for primaries
    pub parent: Option<usize>,
    pub primary: bool,
    pub pdg: ParticleID,
    pub daughters: Vec<usize>,
}

impl PfParticle {
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Whether this is the neutrino hypothesis of its slice
    ///
    /// Pattern recognition only ever labels neutrino candidates as
    /// electron or muon neutrinos.
    pub fn is_neutrino(&self) -> bool {
        self.is_primary() && matches!(self.pdg.abs().id(), 12 | 14)
    }
}

/// Partition of the reconstructed hits of an event
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Slice {
    pub id: usize,
}

/// Reconstructed track
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Track {
    pub id: usize,
    /// Length in cm
    pub length: f64,
}

/// Energy loss along a track as measured on one detection plane
#[derive(Clone, Debug, PartialEq)]
pub struct Calorimetry {
    pub id: usize,
    pub plane: u32,
    /// Energy loss per unit length in MeV/cm for each hit
    pub dedx: Vec<f32>,
    /// Distance to the track end in cm for each hit
    pub residual_range: Vec<f32>,
}

/// Named properties attached to a reconstructed particle
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PfParticleMetadata {
    pub id: usize,
    pub properties: BTreeMap<String, f32>,
}

/// Kinds of associations between event products
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum AssnKind {
    SlicePfParticle,
    PfParticleTrack,
    PfParticleMetadata,
    PfParticleCluster,
    ClusterHit,
    TrackCalorimetry,
}

/// Requested product is not part of the event
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProductError {
    #[error("No {kind} collection with label `{label}` in event {event}")]
    MissingCollection {
        event: u32,
        kind: &'static str,
        label: String,
    },
    #[error("No {kind} association with label `{label}` in event {event}")]
    MissingAssociation {
        event: u32,
        kind: AssnKind,
        label: String,
    },
}

/// Product collections by label
pub type Collections<T> = HashMap<String, Vec<T>>;

/// Event data products, read-only while the event is analysed
///
/// Collections and associations are addressed by the label of the
/// module that produced them, as in the host framework.
#[derive(Clone, Debug, Default)]
pub struct Event {
    id: u32,
    interactions: Collections<TruthInteraction>,
    mc_particles: Collections<McParticle>,
    slices: Collections<Slice>,
    pfparticles: Collections<PfParticle>,
    tracks: Collections<Track>,
    calorimetry: Collections<Calorimetry>,
    metadata: Collections<PfParticleMetadata>,
    assns: HashMap<(AssnKind, String), Assns>,
}

/// A type of product stored in an [Event]
pub trait Product: Sized {
    /// Human-readable product name
    const NAME: &'static str;

    fn collections(event: &Event) -> &Collections<Self>;

    fn collections_mut(event: &mut Event) -> &mut Collections<Self>;
}

macro_rules! impl_product {
    ($t:ty, $field:ident, $name:literal) => {
        impl Product for $t {
            const NAME: &'static str = $name;

            fn collections(event: &Event) -> &Collections<Self> {
                &event.$field
            }

            fn collections_mut(event: &mut Event) -> &mut Collections<Self> {
                &mut event.$field
            }
        }
    };
}

impl_product!(TruthInteraction, interactions, "truth interaction");
impl_product!(McParticle, mc_particles, "truth particle");
impl_product!(Slice, slices, "slice");
impl_product!(PfParticle, pfparticles, "PFParticle");
impl_product!(Track, tracks, "track");
impl_product!(Calorimetry, calorimetry, "calorimetry");
impl_product!(PfParticleMetadata, metadata, "PFParticle metadata");

impl Event {
    pub fn new(id: u32) -> Self {
        Self { id, ..Default::default() }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The collection of `T` produced by `label`
    pub fn get<T: Product>(&self, label: &str) -> Result<&[T], ProductError> {
        T::collections(self)
            .get(label)
            .map(|c| c.as_slice())
            .ok_or_else(|| ProductError::MissingCollection {
                event: self.id,
                kind: T::NAME,
                label: label.to_owned(),
            })
    }

    /// The association table of the given kind produced by `label`
    pub fn assns(&self, kind: AssnKind, label: &str) -> Result<&Assns, ProductError> {
        self.assns
            .get(&(kind, label.to_owned()))
            .ok_or_else(|| ProductError::MissingAssociation {
                event: self.id,
                kind,
                label: label.to_owned(),
            })
    }
}

/// Assemble an [Event] product by product
///
/// This is what a host framework adapter (or a test) uses to hand over
/// an event.
#[derive(Clone, Debug, Default)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    pub fn new(id: u32) -> Self {
        Self { event: Event::new(id) }
    }

    /// Add a product collection, replacing any previous one with the same label
    pub fn add<T, I>(&mut self, label: &str, products: I) -> &mut Self
    where
        T: Product,
        I: IntoIterator<Item = T>,
    {
        T::collections_mut(&mut self.event)
            .insert(label.to_owned(), products.into_iter().collect());
        self
    }

    /// Add (source ID, target ID) associations
    ///
    /// Associations of the same kind and label accumulate.
    pub fn associate<I>(&mut self, kind: AssnKind, label: &str, assns: I) -> &mut Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        self.event
            .assns
            .entry((kind, label.to_owned()))
            .or_default()
            .extend(assns);
        self
    }

    pub fn build(self) -> Event {
        self.event
    }
}

impl From<EventBuilder> for Event {
    fn from(b: EventBuilder) -> Self {
        b.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfp(id: usize, parent: Option<usize>, pdg: i32) -> PfParticle {
        PfParticle {
            id,
            parent,
            primary: parent.is_none(),
            pdg: ParticleID::new(pdg),
            daughters: vec![],
        }
    }

    #[test]
    fn neutrino_hypothesis() {
        assert!(pfp(0, None, 14).is_neutrino());
        assert!(pfp(0, None, -12).is_neutrino());
        assert!(!pfp(0, None, 16).is_neutrino());
        assert!(!pfp(0, None, 13).is_neutrino());
        assert!(!pfp(1, Some(0), 14).is_neutrino());
    }

    #[test]
    fn current_from_str() {
        assert_eq!("cc".parse::<Current>(), Ok(Current::Charged));
        assert_eq!("NC".parse::<Current>(), Ok(Current::Neutral));
        assert_eq!(Current::from_ccnc(0), Current::Charged);
        assert_eq!(Current::from_ccnc(1), Current::Neutral);
        assert_eq!("1".parse::<Current>(), Ok(Current::Neutral));
        assert_eq!("0".parse::<Current>(), Ok(Current::Charged));
        assert!("xc".parse::<Current>().is_err());
        assert!("2".parse::<Current>().is_err());
    }

    #[test]
    fn lookup_by_label() {
        let mut builder = EventBuilder::new(3);
        builder
            .add("pandora", [Slice { id: 0 }, Slice { id: 1 }])
            .associate(AssnKind::SlicePfParticle, "pandora", [(1, 4), (0, 2), (1, 3)]);
        let event = builder.build();

        assert_eq!(event.id(), 3);
        assert_eq!(event.get::<Slice>("pandora").unwrap().len(), 2);
        assert_eq!(
            event.get::<Track>("pandoraTrack"),
            Err(ProductError::MissingCollection {
                event: 3,
                kind: "track",
                label: "pandoraTrack".to_owned()
            })
        );
        let assns = event.assns(AssnKind::SlicePfParticle, "pandora").unwrap();
        let targets: Vec<_> = assns.targets(&1).copied().collect();
        assert_eq!(targets, [4, 3]);
        assert!(event.assns(AssnKind::ClusterHit, "pandora").is_err());
    }
}
