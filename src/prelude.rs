pub use crate::{
    analysis::{Analysis, AnalysisBuilder, AnalysisError, Summary},
    config::{Config, ConfigBuilder, OutputShape, PrimaryConvention},
    event::{AssnKind, Current, Event, EventBuilder, ProductError},
    rows::{EventRows, RecoRow, RowBuilder, TruthRow},
    table::{Table, Value},
    traits::{BackTracker, Write},
    truth::{HitTruthTable, TrackIde},
};
