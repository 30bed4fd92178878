use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use crate::config::PrimaryConvention;
use crate::event::McParticle;
use crate::generation::generation;
use crate::traits::BackTracker;

/// Energy deposited by a simulated particle
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrackIde {
    /// Geant4 track ID
    ///
    /// Negative IDs denote particles that were not saved, usually
    /// shower particles, whose energy is attributed to the tracked
    /// ancestor with the absolute ID.
    pub track_id: i32,
    /// Deposited energy in MeV
    pub energy: f64,
}

/// In-memory [BackTracker]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitTruthTable {
    ides: HashMap<usize, Vec<TrackIde>>,
}

impl HitTruthTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an energy deposit for the hit with the given ID
    pub fn insert(&mut self, hit: usize, ide: TrackIde) {
        self.ides.entry(hit).or_default().push(ide)
    }

    pub fn is_empty(&self) -> bool {
        self.ides.is_empty()
    }
}

impl BackTracker for HitTruthTable {
    fn hit_ides(&self, hit: usize) -> &[TrackIde] {
        self.ides.get(&hit).map(|v| v.as_slice()).unwrap_or_default()
    }
}

impl FromIterator<(usize, TrackIde)> for HitTruthTable {
    fn from_iter<I: IntoIterator<Item = (usize, TrackIde)>>(iter: I) -> Self {
        let mut res = Self::new();
        res.extend(iter);
        res
    }
}

impl Extend<(usize, TrackIde)> for HitTruthTable {
    fn extend<I: IntoIterator<Item = (usize, TrackIde)>>(&mut self, iter: I) {
        for (hit, ide) in iter {
            self.insert(hit, ide)
        }
    }
}

/// Truth track ID with the largest energy deposit in the given hits
///
/// Returns the ID together with the summed energy. There is no
/// dominant track and the result is `None` if the largest deposit is
/// not positive, if several tracks share it, or if any of the summed
/// energies is not finite.
pub fn dominant_track_id<B, I>(
    hits: I,
    back_tracker: &B,
    roll_up_unsaved_ids: bool,
) -> Option<(i32, f64)>
where
    B: BackTracker + ?Sized,
    I: IntoIterator<Item = usize>,
{
    let mut energies: BTreeMap<i32, f64> = BTreeMap::new();
    for hit in hits {
        for ide in back_tracker.hit_ides(hit) {
            let id = if roll_up_unsaved_ids {
                ide.track_id.abs()
            } else {
                ide.track_id
            };
            *energies.entry(id).or_default() += ide.energy;
        }
    }
    if let Some((id, energy)) = energies.iter().find(|(_, e)| !e.is_finite()) {
        debug!("No dominant truth particle: track {id} deposited {energy}");
        return None;
    }
    let mut best: Option<(i32, f64)> = None;
    let mut ambiguous = false;
    for (id, energy) in energies {
        match best {
            Some((_, max)) if energy < max => {}
            Some((_, max)) if energy == max => ambiguous = true,
            _ => {
                best = Some((id, energy));
                ambiguous = false;
            }
        }
    }
    if ambiguous {
        debug!("No dominant truth particle: {best:?} is not unique");
        return None;
    }
    best.filter(|(_, max)| *max > 0.)
}

/// A truth particle matched to a reconstructed one
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TruthMatch<'a> {
    pub particle: &'a McParticle,
    /// Energy the particle deposited in the reconstructed particle's hits
    pub deposited: f64,
}

/// Lookup of simulated particles by track ID
#[derive(Clone, Debug)]
pub struct TruthIndex<'a> {
    particles: &'a [McParticle],
    by_track_id: HashMap<i32, &'a McParticle>,
    convention: PrimaryConvention,
}

impl<'a> TruthIndex<'a> {
    pub fn new(particles: &'a [McParticle], convention: PrimaryConvention) -> Self {
        let mut by_track_id = HashMap::with_capacity(particles.len());
        for p in particles {
            by_track_id.entry(p.track_id).or_insert(p);
        }
        Self {
            particles,
            by_track_id,
            convention,
        }
    }

    /// Particle with the given track ID
    ///
    /// Only positive IDs denote valid tracks.
    pub fn get(&self, track_id: i32) -> Option<&'a McParticle> {
        if track_id > 0 {
            self.by_track_id.get(&track_id).copied()
        } else {
            None
        }
    }

    pub fn is_primary(&self, particle: &McParticle) -> bool {
        self.convention.is_primary(particle)
    }

    /// Primary particles in collection order
    pub fn primaries(&self) -> impl Iterator<Item = &'a McParticle> + '_ {
        self.particles.iter().filter(|p| self.is_primary(p))
    }

    /// Ancestry depth, 1 for primaries
    pub fn generation(&self, particle: &McParticle) -> u32 {
        generation(
            Some(particle.mother),
            |mother| self.convention.is_primary_mother(mother),
            |mother| self.get(mother).map(|p| p.mother),
            self.by_track_id.len(),
        )
    }

    /// Match hits to the particle with the largest energy deposit
    pub fn match_hits<B, I>(
        &self,
        hits: I,
        back_tracker: &B,
        roll_up_unsaved_ids: bool,
    ) -> Option<TruthMatch<'a>>
    where
        B: BackTracker + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        let (id, deposited) =
            dominant_track_id(hits, back_tracker, roll_up_unsaved_ids)?;
        let particle = self.get(id);
        if particle.is_none() {
            trace!("Dominant truth track {id} is not a known particle");
        }
        particle.map(|particle| TruthMatch { particle, deposited })
    }
}
