//! Running time reference for compressed timestamp headers.

/// The last full timestamp seen in a document.
///
/// Compressed timestamp headers carry only the low five bits of a timestamp.
/// The upper bits come from this reference, rolling over by 32 seconds when
/// the offset is below the reference's own low bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeReference {
    last: Option<u32>,
}

impl TimeReference {
    /// A reference with no timestamp yet.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// The current reference, if one has been seen.
    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// Replace the reference with a full timestamp.
    pub fn reset(&mut self, timestamp: u32) {
        self.last = Some(timestamp);
    }

    /// Resolve a time offset against the reference, advancing it.
    ///
    /// Returns `None` when no full timestamp has been seen yet.
    pub fn advance(&mut self, offset: u8) -> Option<u32> {
        const MASK: u32 = 0x1F;

        let last = self.last?;
        let offset = u32::from(offset) & MASK;

        let mut next = (last & !MASK).wrapping_add(offset);
        if offset < (last & MASK) {
            next = next.wrapping_add(MASK + 1);
        }

        self.last = Some(next);
        Some(next)
    }
}
