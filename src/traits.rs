use crate::rows::EventRows;
use crate::truth::TrackIde;

/// Simulated energy deposits behind reconstructed hits
pub trait BackTracker {
    /// Energy deposits contributing to the hit with the given ID
    fn hit_ides(&self, hit: usize) -> &[TrackIde];
}

impl<B: BackTracker + ?Sized> BackTracker for &B {
    fn hit_ides(&self, hit: usize) -> &[TrackIde] {
        (**self).hit_ides(hit)
    }
}

/// Append-only output
pub trait Write {
    type Error;

    fn write(&mut self, rows: &EventRows) -> Result<(), Self::Error>;
}

impl<W: Write + ?Sized> Write for &mut W {
    type Error = W::Error;

    fn write(&mut self, rows: &EventRows) -> Result<(), Self::Error> {
        (**self).write(rows)
    }
}
