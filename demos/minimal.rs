// minimal example: analyse a single hand-made event
// run with `cargo run --example minimal`
// set the environment variable `RUST_LOG=debug` for command-line output
use std::convert::Infallible;
use std::error::Error;
use std::iter::empty;

use nuana::event::{
    Calorimetry, McParticle, PfParticle, PfParticleMetadata, Slice, Track,
    TruthInteraction,
};
use nuana::prelude::*;
use particle_id::ParticleID;

use env_logger;

fn main() -> Result<(), Box<dyn Error>> {
    // initialise logging from the RUST_LOG environment variable
    env_logger::init();

    // Default settings: select muon neutrino CC events
    let config = Config::default();

    // An event with a neutrino and a single reconstructed muon
    let mut event = EventBuilder::new(0);
    event
        .add(
            &config.labels.mc_truth,
            [TruthInteraction {
                neutrino: ParticleID::new(14),
                current: Current::Charged,
            }],
        )
        .add(
            &config.labels.mc_particle,
            [McParticle {
                track_id: 1,
                mother: 0,
                pdg: ParticleID::new(13),
                energy: 0.8,
                daughters: vec![],
            }],
        )
        .add(&config.labels.slice, [Slice { id: 0 }])
        .add(
            &config.labels.pfparticle,
            [
                PfParticle {
                    id: 0,
                    parent: None,
                    primary: true,
                    pdg: ParticleID::new(14),
                    daughters: vec![1],
                },
                PfParticle {
                    id: 1,
                    parent: Some(0),
                    primary: false,
                    pdg: ParticleID::new(13),
                    daughters: vec![],
                },
            ],
        )
        .add(&config.labels.pfparticle, empty::<PfParticleMetadata>())
        .add(&config.labels.track, empty::<Track>())
        .add(&config.labels.calorimetry, empty::<Calorimetry>())
        .associate(AssnKind::SlicePfParticle, &config.labels.pfparticle, [(0, 0), (0, 1)])
        .associate(AssnKind::PfParticleCluster, &config.labels.pfparticle, [(1, 0)])
        .associate(AssnKind::ClusterHit, &config.labels.pfparticle, [(0, 0), (0, 1)])
        .associate(AssnKind::PfParticleMetadata, &config.labels.pfparticle, empty())
        .associate(AssnKind::PfParticleTrack, &config.labels.track, empty())
        .associate(AssnKind::TrackCalorimetry, &config.labels.calorimetry, empty());

    // Simulated energy deposits in the two hits
    let back_tracker: HitTruthTable = [
        (0, TrackIde { track_id: 1, energy: 1.5 }),
        (1, TrackIde { track_id: 1, energy: 0.7 }),
    ]
    .into_iter()
    .collect();

    let reader = [Ok::<_, Infallible>((event.build(), back_tracker))];

    let mut analysis = AnalysisBuilder {
        reader: reader.into_iter(),
        rows: RowBuilder::new(config.clone()),
        writer: Table::new(config.output),
    }
    .build();
    analysis.run()?;

    println!("{}", serde_yaml::to_string(analysis.writer())?);
    Ok(())
}
