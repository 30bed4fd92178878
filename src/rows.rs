use std::collections::hash_map::{Entry, HashMap};
use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, trace};
use particle_id::ParticleID;
use rayon::prelude::*;
use serde::Serialize;

use crate::assns::Assns;
use crate::config::{Config, Labels};
use crate::event::{
    AssnKind, Calorimetry, Event, McParticle, PfParticle, PfParticleMetadata,
    ProductError, Slice, Track, TruthInteraction,
};
use crate::slice::NeutrinoSlice;
use crate::traits::BackTracker;
use crate::truth::TruthIndex;

/// Track ID written for reconstructed particles without truth match
pub const NO_TRACK_ID: i32 = -1;
/// PDG code written for reconstructed particles without truth match
pub const NO_PDG: ParticleID = ParticleID::new(0);
/// Truth generation written for reconstructed particles without truth match
pub const NO_GENERATION: i64 = -1;

/// A simulated particle
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TruthRow {
    pub track_id: i32,
    pub pdg: ParticleID,
    /// Energy in GeV
    pub energy: f64,
    pub generation: u32,
}

impl TruthRow {
    pub fn new(particle: &McParticle, truth: &TruthIndex<'_>) -> Self {
        Self {
            track_id: particle.track_id,
            pdg: particle.pdg,
            energy: particle.energy,
            generation: truth.generation(particle),
        }
    }
}

/// A reconstructed daughter of the neutrino
///
/// Missing quantities are `None` (or empty for calorimetry). The
/// accessors return the sentinel values used in the output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecoRow {
    pub pfparticle: usize,
    pub generation: u32,
    /// Length in cm of the unique associated track
    pub track_length: Option<f64>,
    /// Track score from the unique metadata record
    pub track_score: Option<f32>,
    pub dedx: Vec<f32>,
    pub residual_range: Vec<f32>,
    /// Matched simulated particle
    pub truth: Option<TruthRow>,
}

impl RecoRow {
    pub fn track_length(&self) -> f64 {
        self.track_length.unwrap_or(f64::NAN)
    }

    pub fn track_score(&self) -> f32 {
        self.track_score.unwrap_or(f32::NAN)
    }

    pub fn truth_track_id(&self) -> i32 {
        self.truth.map_or(NO_TRACK_ID, |t| t.track_id)
    }

    pub fn truth_pdg(&self) -> ParticleID {
        self.truth.map_or(NO_PDG, |t| t.pdg)
    }

    pub fn truth_energy(&self) -> f64 {
        self.truth.map_or(f64::NAN, |t| t.energy)
    }

    pub fn truth_generation(&self) -> i64 {
        self.truth.map_or(NO_GENERATION, |t| t.generation as i64)
    }
}

/// Particle counts of one event
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize)]
pub struct EventCounts {
    /// Particles in the neutrino slice, excluding the neutrino
    pub pfparticles: usize,
    /// Reconstructed daughters of the neutrino
    pub daughters: usize,
    /// Daughters as listed by the neutrino particle itself
    pub primary_children: usize,
    /// Primary simulated particles
    pub truth_primaries: usize,
}

/// Everything extracted from one event
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EventRows {
    pub event: u32,
    pub selected: bool,
    pub counts: EventCounts,
    /// One row per reconstructed daughter of the neutrino
    pub reco: Vec<RecoRow>,
    /// Primary simulated particles not matched to any reconstructed row
    pub truth_only: Vec<TruthRow>,
}

impl EventRows {
    /// Rows of an event that fails the selection
    pub fn rejected(event: u32) -> Self {
        Self {
            event,
            selected: false,
            ..Default::default()
        }
    }

    fn selected(event: u32) -> Self {
        Self {
            event,
            selected: true,
            ..Default::default()
        }
    }
}

/// Extract reconstructed and truth-only rows from events
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RowBuilder {
    config: Config,
}

impl RowBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyse a single event
    ///
    /// Missing or ambiguous information results in sentinel values,
    /// never in an error. Errors are only returned when the event lacks
    /// one of the configured collections or associations.
    pub fn build<B: BackTracker + ?Sized>(
        &self,
        event: &Event,
        back_tracker: &B,
    ) -> Result<EventRows, ProductError> {
        let labels = &self.config.labels;
        let interactions = event.get::<TruthInteraction>(&labels.mc_truth)?;
        if !self.config.selection.accepts(interactions) {
            debug!("Event {} rejected by selection", event.id());
            return Ok(EventRows::rejected(event.id()));
        }

        let products = Products::fetch(event, labels)?;
        let truth = TruthIndex::new(
            event.get::<McParticle>(&labels.mc_particle)?,
            self.config.truth.primary,
        );

        let mut rows = EventRows::selected(event.id());
        rows.counts.truth_primaries = truth.primaries().count();
        let nu_slice = NeutrinoSlice::find(products.slices, |s| {
            products.slice_particles(s)
        });
        if let Some(nu_slice) = nu_slice {
            rows.counts.pfparticles = nu_slice.particles().len();
            rows.counts.daughters = nu_slice.daughters().count();
            rows.counts.primary_children = nu_slice.neutrino().daughters.len();
            rows.reco = self.reco_rows(&nu_slice, &products, &truth, back_tracker);
        } else {
            debug!("No neutrino slice in event {}", event.id());
        }

        let consumed: HashSet<_> = rows
            .reco
            .iter()
            .filter_map(|r| r.truth.map(|t| t.track_id))
            .collect();
        rows.truth_only = truth
            .primaries()
            .filter(|p| !consumed.contains(&p.track_id))
            .map(|p| TruthRow::new(p, &truth))
            .collect();
        debug!(
            "Event {}: {} reconstructed, {} truth-only rows",
            event.id(),
            rows.reco.len(),
            rows.truth_only.len()
        );
        Ok(rows)
    }

    /// Analyse independent events in parallel
    ///
    /// The results are in the same order as the events.
    pub fn build_all<B: BackTracker + Sync>(
        &self,
        events: &[(Event, B)],
    ) -> Vec<Result<EventRows, ProductError>> {
        events
            .par_iter()
            .map(|(event, back_tracker)| self.build(event, back_tracker))
            .collect()
    }

    fn reco_rows<B: BackTracker + ?Sized>(
        &self,
        nu_slice: &NeutrinoSlice<'_>,
        products: &Products<'_>,
        truth: &TruthIndex<'_>,
        back_tracker: &B,
    ) -> Vec<RecoRow> {
        let reco = &self.config.reco;
        let mut rows = Vec::new();
        let mut deposited = Vec::new();
        for daughter in nu_slice.daughters() {
            let track = products.track(daughter.id);
            if reco.require_unique_track && track.is_none() {
                trace!("Skipping particle {} without unique track", daughter.id);
                continue;
            }
            let calo = track.and_then(
                |t| products.calorimetry(t.id, reco.calorimetry_plane)
            );
            let truth_match = truth.match_hits(
                products.hits(daughter.id),
                back_tracker,
                self.config.truth.roll_up_unsaved_ids,
            );
            let row = RecoRow {
                pfparticle: daughter.id,
                generation: nu_slice.generation(daughter),
                track_length: track.map(|t| t.length),
                track_score: products
                    .track_score(daughter.id, &reco.track_score_property),
                dedx: calo.map(|c| c.dedx.clone()).unwrap_or_default(),
                residual_range: calo
                    .map(|c| c.residual_range.clone())
                    .unwrap_or_default(),
                truth: truth_match.map(|m| TruthRow::new(m.particle, truth)),
            };
            trace!("{row:?}");
            rows.push(row);
            deposited.push(truth_match.map(|m| m.deposited));
        }
        release_shared_matches(&mut rows, &deposited);
        rows
    }
}

/// Ensure that no truth particle is matched to more than one row
///
/// The row with the largest deposited energy keeps the match, the
/// first one on ties. All others become unmatched.
fn release_shared_matches(rows: &mut [RecoRow], deposited: &[Option<f64>]) {
    let mut owner: HashMap<i32, usize> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(truth) = row.truth else { continue };
        match owner.entry(truth.track_id) {
            Entry::Vacant(entry) => {
                entry.insert(idx);
            }
            Entry::Occupied(mut entry) => {
                if deposited[idx] > deposited[*entry.get()] {
                    entry.insert(idx);
                }
            }
        }
    }
    for (idx, row) in rows.iter_mut().enumerate() {
        let Some(truth) = row.truth else { continue };
        if owner.get(&truth.track_id) != Some(&idx) {
            debug!(
                "Truth track {} already matched, unmatching particle {}",
                truth.track_id, row.pfparticle
            );
            row.truth = None;
        }
    }
}

// first object wins on duplicate IDs
fn by_id<T>(items: &[T], id: impl Fn(&T) -> usize) -> HashMap<usize, &T> {
    let mut res = HashMap::with_capacity(items.len());
    for item in items {
        res.entry(id(item)).or_insert(item);
    }
    res
}

/// Reconstructed products of one event with lookup by ID
struct Products<'a> {
    slices: &'a [Slice],
    pfparticles: HashMap<usize, &'a PfParticle>,
    tracks: HashMap<usize, &'a Track>,
    calorimetry: HashMap<usize, &'a Calorimetry>,
    metadata: HashMap<usize, &'a PfParticleMetadata>,
    slice_pfparticles: &'a Assns,
    pfparticle_tracks: &'a Assns,
    pfparticle_metadata: &'a Assns,
    pfparticle_clusters: &'a Assns,
    cluster_hits: &'a Assns,
    track_calorimetry: &'a Assns,
}

impl<'a> Products<'a> {
    fn fetch(event: &'a Event, labels: &Labels) -> Result<Self, ProductError> {
        let pfp = labels.pfparticle.as_str();
        Ok(Self {
            slices: event.get(&labels.slice)?,
            pfparticles: by_id(event.get::<PfParticle>(pfp)?, |p| p.id),
            tracks: by_id(event.get::<Track>(&labels.track)?, |t| t.id),
            calorimetry: by_id(
                event.get::<Calorimetry>(&labels.calorimetry)?,
                |c| c.id,
            ),
            metadata: by_id(event.get::<PfParticleMetadata>(pfp)?, |m| m.id),
            slice_pfparticles: event.assns(AssnKind::SlicePfParticle, pfp)?,
            pfparticle_tracks: event.assns(AssnKind::PfParticleTrack, &labels.track)?,
            pfparticle_metadata: event.assns(AssnKind::PfParticleMetadata, pfp)?,
            pfparticle_clusters: event.assns(AssnKind::PfParticleCluster, pfp)?,
            cluster_hits: event.assns(AssnKind::ClusterHit, pfp)?,
            track_calorimetry: event
                .assns(AssnKind::TrackCalorimetry, &labels.calorimetry)?,
        })
    }

    fn slice_particles(
        &self,
        slice: &Slice,
    ) -> impl Iterator<Item = &'a PfParticle> + '_ {
        self.slice_pfparticles
            .targets(&slice.id)
            .filter_map(move |id| self.pfparticles.get(id).copied())
    }

    /// The unique track of a particle
    fn track(&self, pfparticle: usize) -> Option<&'a Track> {
        let id = self.pfparticle_tracks.targets(&pfparticle).exactly_one().ok()?;
        self.tracks.get(id).copied()
    }

    /// The unique calorimetry record of a track on the given plane
    fn calorimetry(&self, track: usize, plane: u32) -> Option<&'a Calorimetry> {
        self.track_calorimetry
            .targets(&track)
            .filter_map(|id| self.calorimetry.get(id).copied())
            .filter(|c| c.plane == plane)
            .exactly_one()
            .ok()
    }

    /// Track score from the unique metadata record of a particle
    fn track_score(&self, pfparticle: usize, property: &str) -> Option<f32> {
        let id = self
            .pfparticle_metadata
            .targets(&pfparticle)
            .exactly_one()
            .ok()?;
        self.metadata.get(id)?.properties.get(property).copied()
    }

    /// All hits of a particle, via its clusters
    fn hits(&self, pfparticle: usize) -> impl Iterator<Item = usize> + '_ {
        self.pfparticle_clusters
            .targets(&pfparticle)
            .flat_map(move |cluster| self.cluster_hits.targets(cluster))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth(track_id: i32) -> Option<TruthRow> {
        Some(TruthRow {
            track_id,
            pdg: ParticleID::new(13),
            energy: 1.,
            generation: 1,
        })
    }

    fn row(pfparticle: usize, truth: Option<TruthRow>) -> RecoRow {
        RecoRow {
            pfparticle,
            generation: 1,
            track_length: None,
            track_score: None,
            dedx: vec![],
            residual_range: vec![],
            truth,
        }
    }

    #[test]
    fn sentinels() {
        let r = row(3, None);
        assert!(r.track_length().is_nan());
        assert!(r.track_score().is_nan());
        assert!(r.truth_energy().is_nan());
        assert_eq!(r.truth_track_id(), NO_TRACK_ID);
        assert_eq!(r.truth_pdg(), NO_PDG);
        assert_eq!(r.truth_generation(), NO_GENERATION);

        let r = row(3, truth(7));
        assert_eq!(r.truth_track_id(), 7);
        assert_eq!(r.truth_pdg(), ParticleID::new(13));
        assert_eq!(r.truth_energy(), 1.);
        assert_eq!(r.truth_generation(), 1);
    }

    #[test]
    fn shared_match_goes_to_largest_deposit() {
        let mut rows = vec![row(1, truth(5)), row(2, truth(5)), row(3, truth(6))];
        release_shared_matches(&mut rows, &[Some(1.), Some(2.), Some(0.5)]);
        let ids: Vec<_> = rows.iter().map(|r| r.truth_track_id()).collect();
        assert_eq!(ids, [NO_TRACK_ID, 5, 6]);
    }

    #[test]
    fn shared_match_tie_goes_to_first() {
        let mut rows = vec![row(1, truth(5)), row(2, None), row(3, truth(5))];
        release_shared_matches(&mut rows, &[Some(1.), None, Some(1.)]);
        let ids: Vec<_> = rows.iter().map(|r| r.truth_track_id()).collect();
        assert_eq!(ids, [5, NO_TRACK_ID, NO_TRACK_ID]);
    }
}
