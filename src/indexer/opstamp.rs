//! Operation stamps: the single total order over write operations.

use parking_lot::Mutex;

/// A monotonically increasing operation stamp.
pub type Opstamp = u64;

/// Hands out strictly increasing opstamps.
///
/// Seeded from the persisted commit opstamp at writer construction, so
/// stamps never regress across restarts. A plain mutex is enough here; the
/// stamper is touched once per submitted document, never on the query path.
#[derive(Debug)]
pub struct Stamper {
    last: Mutex<Opstamp>,
}

impl Stamper {
    /// Create a stamper whose next stamp is `seed + 1`.
    pub fn new(seed: Opstamp) -> Self {
        Stamper {
            last: Mutex::new(seed),
        }
    }

    /// Allocate the next opstamp.
    pub fn stamp(&self) -> Opstamp {
        let mut last = self.last.lock();
        *last += 1;
        *last
    }

    /// The most recently allocated opstamp.
    pub fn last(&self) -> Opstamp {
        *self.last.lock()
    }
}
