use std::convert::From;
use std::iter::Iterator;

use log::{debug, info};
use thiserror::Error;

use crate::event::{Event, ProductError};
use crate::rows::RowBuilder;
use crate::traits::*;

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct AnalysisBuilder<R, W> {
    pub reader: R,
    pub rows: RowBuilder,
    pub writer: W,
}

impl<R, W> AnalysisBuilder<R, W> {
    pub fn build(self) -> Analysis<R, W> {
        Analysis {
            reader: self.reader,
            rows: self.rows,
            writer: self.writer,
        }
    }
}

impl<R, W> From<Analysis<R, W>> for AnalysisBuilder<R, W> {
    fn from(a: Analysis<R, W>) -> Self {
        AnalysisBuilder {
            reader: a.reader,
            rows: a.rows,
            writer: a.writer,
        }
    }
}

/// Event loop: read, extract rows, write
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Analysis<R, W> {
    reader: R,
    rows: RowBuilder,
    writer: W,
}

impl<R, W> From<AnalysisBuilder<R, W>> for Analysis<R, W> {
    fn from(b: AnalysisBuilder<R, W>) -> Self {
        b.build()
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError<E1, E2> {
    #[error("Failed to read event: {0}")]
    ReadErr(E1),
    #[error("Failed to analyse event: {0}")]
    BuildErr(ProductError),
    #[error("Failed to write event: {0}")]
    WriteErr(E2),
}

/// Number of processed events
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Summary {
    pub selected: usize,
    pub rejected: usize,
}

impl Summary {
    pub fn events(&self) -> usize {
        self.selected + self.rejected
    }
}

impl<R, W> Analysis<R, W> {
    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R, W, B, E> Analysis<R, W>
where
    R: Iterator<Item = Result<(Event, B), E>>,
    B: BackTracker,
    W: Write,
{
    /// Process all events from the reader
    ///
    /// Stops at the first error.
    pub fn run(&mut self) -> Result<Summary, AnalysisError<E, W::Error>> {
        use AnalysisError::*;

        let mut summary = Summary::default();
        for ev in &mut self.reader {
            let (event, back_tracker) = ev.map_err(ReadErr)?;
            let rows = self.rows.build(&event, &back_tracker).map_err(BuildErr)?;
            if rows.selected {
                summary.selected += 1;
            } else {
                summary.rejected += 1;
            }
            self.writer.write(&rows).map_err(WriteErr)?;
            debug!("Processed event {}", event.id());
        }
        info!(
            "Analysed {} events, {} selected, {} rejected",
            summary.events(),
            summary.selected,
            summary.rejected
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::event::{EventBuilder, TruthInteraction};
    use crate::table::Table;
    use crate::truth::HitTruthTable;

    #[test]
    fn missing_products() {
        let events = [Ok::<_, Infallible>((Event::new(0), HitTruthTable::new()))];
        let mut analysis = AnalysisBuilder {
            reader: events.into_iter(),
            rows: RowBuilder::default(),
            writer: Table::default(),
        }
        .build();
        let res = analysis.run();
        assert!(matches!(res, Err(AnalysisError::BuildErr(_))));
    }

    #[test]
    fn count_rejected() {
        let mut builder = EventBuilder::new(1);
        builder.add(
            "generator",
            [TruthInteraction {
                neutrino: particle_id::ParticleID::new(12),
                current: Default::default(),
            }],
        );
        let events = [Ok::<_, Infallible>((builder.build(), HitTruthTable::new()))];
        let mut analysis = Analysis::from(AnalysisBuilder {
            reader: events.into_iter(),
            rows: RowBuilder::default(),
            writer: Table::default(),
        });
        let summary = analysis.run().unwrap();
        assert_eq!(summary, Summary { selected: 0, rejected: 1 });
        assert_eq!(analysis.writer().len(), 1);
    }
}
