//! Byte ranges for partial object updates.
//!
//! A write carrying a [`ByteRange`] updates an existing object in place
//! instead of replacing it:
//!
//! ```text
//! existing:  The cat crossed the road.
//! bounded:       ^^^                      from_offset_length(4, 3) + "dog"
//! result:    The dog crossed the road.
//!
//! existing:  The cat crossed the road.
//! open:          ^--------------------->  from_offset(4) + "lucky animal."
//! result:    The lucky animal.
//! ```
//!
//! Ranges are not checked at all on the client. A window the service cannot
//! apply (past the end, zero-length, beyond the largest offset) is still sent
//! as written and comes back as a service error.

/// Write window of a partial update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ByteRange {
    start: u64,
    length: Option<u64>,
}

impl ByteRange {
    /// Bounded range: `length` bytes starting at `offset`.
    ///
    /// Bytes of the existing object outside the window are preserved.
    pub const fn from_offset_length(offset: u64, length: u64) -> Self {
        Self {
            start: offset,
            length: Some(length),
        }
    }

    /// Open-ended range: everything from `offset` onwards is replaced.
    ///
    /// The updated object is the prior bytes `[0, offset)` followed by the
    /// new body, whatever the relative lengths.
    pub const fn from_offset(offset: u64) -> Self {
        Self {
            start: offset,
            length: None,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn is_open_ended(&self) -> bool {
        self.length.is_none()
    }

    /// Inclusive offset of the last byte for bounded ranges.
    ///
    /// Widened so that a zero-length window at offset 0 (`-1`) and windows
    /// ending past `u64::MAX` are still expressible.
    pub fn last_byte(&self) -> Option<i128> {
        self.length
            .map(|length| i128::from(self.start) + i128::from(length) - 1)
    }

    /// Value of the `Range` header for this window.
    ///
    /// `bytes=<start>-<last>` when bounded, `bytes=<start>-` when open-ended.
    pub fn header_value(&self) -> String {
        match self.last_byte() {
            Some(last) => format!("bytes={}-{}", self.start, last),
            None => format!("bytes={}-", self.start),
        }
    }
}
