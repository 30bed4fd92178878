use log::trace;
use particle_id::ParticleID;

use crate::event::{Current, TruthInteraction};

/// Check whether all simulated interactions have the wanted initial
/// neutrino and current
///
/// An event without interactions matches.
pub fn matches_selection(
    interactions: &[TruthInteraction],
    neutrino: ParticleID,
    current: Current,
) -> bool {
    interactions.iter().all(|interaction| {
        let matches =
            interaction.neutrino == neutrino && interaction.current == current;
        if !matches {
            trace!(
                "interaction with neutrino {} ({}) does not match",
                interaction.neutrino.id(),
                interaction.current
            );
        }
        matches
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NU_MU: ParticleID = ParticleID::new(14);
    const NU_E: ParticleID = ParticleID::new(12);

    fn interaction(pdg: i32, current: Current) -> TruthInteraction {
        TruthInteraction {
            neutrino: ParticleID::new(pdg),
            current,
        }
    }

    #[test]
    fn all_match() {
        let interactions = [
            interaction(14, Current::Charged),
            interaction(14, Current::Charged),
        ];
        assert!(matches_selection(&interactions, NU_MU, Current::Charged));
    }

    #[test]
    fn any_mismatch() {
        let interactions = [
            interaction(14, Current::Charged),
            interaction(14, Current::Neutral),
        ];
        assert!(!matches_selection(&interactions, NU_MU, Current::Charged));
        assert!(!matches_selection(&interactions, NU_MU, Current::Neutral));

        let interactions = [interaction(12, Current::Charged)];
        assert!(!matches_selection(&interactions, NU_MU, Current::Charged));
        assert!(matches_selection(&interactions, NU_E, Current::Charged));
        // antineutrinos are a different flavour code
        assert!(!matches_selection(&interactions, ParticleID::new(-12), Current::Charged));
    }

    #[test]
    fn no_interactions() {
        assert!(matches_selection(&[], NU_MU, Current::Charged));
        assert!(matches_selection(&[], NU_E, Current::Neutral));
    }
}
