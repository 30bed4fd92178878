use std::collections::HashMap;

use log::trace;

use crate::event::{PfParticle, Slice};
use crate::generation::generation;

/// Find the slice containing the neutrino hypothesis
///
/// Slices are scanned in the given order, and within each slice the
/// particles returned by `particles_of`. Returns the IDs of the slice
/// and of the first primary electron or muon neutrino found.
pub fn find_neutrino_slice<'a, F, I>(
    slices: &[Slice],
    mut particles_of: F,
) -> Option<(usize, usize)>
where
    F: FnMut(&Slice) -> I,
    I: IntoIterator<Item = &'a PfParticle>,
{
    slices.iter().find_map(|slice| {
        particles_of(slice)
            .into_iter()
            .find(|p| p.is_neutrino())
            .map(|nu| (slice.id, nu.id))
    })
}

/// All particles whose parent is `neutrino`, in the given order
pub fn daughters_of<'a, 'b>(
    neutrino: usize,
    particles: &'b [&'a PfParticle],
) -> impl Iterator<Item = &'a PfParticle> + 'b {
    particles
        .iter()
        .copied()
        .filter(move |p| p.parent == Some(neutrino))
}

/// The reconstructed particles of the neutrino slice
#[derive(Clone, Debug)]
pub struct NeutrinoSlice<'a> {
    id: usize,
    neutrino: &'a PfParticle,
    // all other particles in the slice, in association order
    particles: Vec<&'a PfParticle>,
    by_id: HashMap<usize, &'a PfParticle>,
}

impl<'a> NeutrinoSlice<'a> {
    /// Locate the neutrino slice
    ///
    /// See [find_neutrino_slice] for the search order.
    pub fn find<F, I>(slices: &[Slice], mut particles_of: F) -> Option<Self>
    where
        F: FnMut(&Slice) -> I,
        I: IntoIterator<Item = &'a PfParticle>,
    {
        let (id, nu_id) = find_neutrino_slice(slices, &mut particles_of)?;
        let slice = slices.iter().find(|s| s.id == id)?;
        let mut neutrino = None;
        let mut particles = Vec::new();
        for p in particles_of(slice) {
            if p.id == nu_id {
                neutrino.get_or_insert(p);
            } else {
                particles.push(p);
            }
        }
        let neutrino = neutrino?;
        trace!(
            "neutrino {} with {} other particles in slice {id}",
            neutrino.id,
            particles.len()
        );
        let by_id = particles.iter().map(|p| (p.id, *p)).collect();
        Some(Self {
            id,
            neutrino,
            particles,
            by_id,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn neutrino(&self) -> &'a PfParticle {
        self.neutrino
    }

    /// All particles in the slice except for the neutrino
    pub fn particles(&self) -> &[&'a PfParticle] {
        &self.particles
    }

    /// Particle in the slice with the given ID, excluding the neutrino
    pub fn get(&self, id: usize) -> Option<&'a PfParticle> {
        self.by_id.get(&id).copied()
    }

    /// Direct daughters of the neutrino
    pub fn daughters(&self) -> impl Iterator<Item = &'a PfParticle> + '_ {
        daughters_of(self.neutrino.id, &self.particles)
    }

    /// Ancestry depth relative to the neutrino
    ///
    /// Parents are only looked up among the particles of this slice.
    pub fn generation(&self, particle: &PfParticle) -> u32 {
        let nu = self.neutrino.id;
        generation(
            particle.parent,
            |parent| parent == nu,
            |parent| self.get(parent).and_then(|p| p.parent),
            self.particles.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use particle_id::ParticleID;

    use super::*;
    use crate::generation::UNKNOWN_GENERATION;

    fn pfp(id: usize, parent: Option<usize>, pdg: i32) -> PfParticle {
        PfParticle {
            id,
            parent,
            primary: parent.is_none(),
            pdg: ParticleID::new(pdg),
            daughters: vec![],
        }
    }

    fn slice_contents() -> Vec<(Slice, Vec<PfParticle>)> {
        vec![
            // cosmic muon slice
            (Slice { id: 0 }, vec![pfp(0, None, 13)]),
            (
                Slice { id: 1 },
                vec![
                    pfp(1, Some(2), 11),
                    pfp(2, None, 14),
                    pfp(3, Some(2), 13),
                    pfp(4, Some(3), 211),
                    pfp(5, Some(4), 2212),
                    pfp(6, Some(99), 22),
                ],
            ),
            // second neutrino candidate is never looked at
            (Slice { id: 2 }, vec![pfp(7, None, -12), pfp(8, Some(7), 11)]),
        ]
    }

    fn find(contents: &[(Slice, Vec<PfParticle>)]) -> Option<NeutrinoSlice<'_>> {
        let slices: Vec<_> = contents.iter().map(|(s, _)| *s).collect();
        NeutrinoSlice::find(&slices, |s: &Slice| {
            contents.iter().find(|(c, _)| c == s).into_iter().flat_map(|(_, p)| p)
        })
    }

    #[test]
    fn first_neutrino_slice() {
        let contents = slice_contents();
        let slices: Vec<_> = contents.iter().map(|(s, _)| *s).collect();
        let found = find_neutrino_slice(&slices, |s: &Slice| {
            contents.iter().find(|(c, _)| c == s).into_iter().flat_map(|(_, p)| p)
        });
        assert_eq!(found, Some((1, 2)));

        let nu_slice = find(&contents).unwrap();
        assert_eq!(nu_slice.id(), 1);
        assert_eq!(nu_slice.neutrino().id, 2);
        assert_eq!(nu_slice.particles().len(), 5);
        assert!(nu_slice.get(2).is_none());
    }

    #[test]
    fn no_neutrino() {
        let contents = vec![(Slice { id: 0 }, vec![pfp(0, None, 13), pfp(1, Some(0), 11)])];
        assert!(find(&contents).is_none());
        assert!(find(&[]).is_none());
    }

    #[test]
    fn non_primary_neutrino_is_ignored() {
        let contents = vec![(Slice { id: 4 }, vec![pfp(0, Some(1), 14), pfp(1, None, 13)])];
        assert!(find(&contents).is_none());
    }

    #[test]
    fn daughters() {
        let contents = slice_contents();
        let nu_slice = find(&contents).unwrap();
        let daughters: Vec<_> = nu_slice.daughters().map(|p| p.id).collect();
        assert_eq!(daughters, [1, 3]);
    }

    #[test]
    fn generations() {
        let contents = slice_contents();
        let nu_slice = find(&contents).unwrap();
        let depth = |id| nu_slice.generation(nu_slice.get(id).unwrap());
        assert_eq!(depth(1), 1);
        assert_eq!(depth(3), 1);
        assert_eq!(depth(4), 2);
        assert_eq!(depth(5), 3);
        assert_eq!(depth(6), UNKNOWN_GENERATION);
    }
}
