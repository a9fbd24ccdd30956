//! Debug visibility without prints in the hot path.
//!
//! The scanner can record every committed key transition into a ring
//! buffer of fixed-layout records. The buffer overwrites itself when
//! full; a debugger or a host-side tool reading target memory can keep
//! up with normal typing rates and only loses data after falling a full
//! buffer behind.

use core::sync::atomic::{AtomicBool, Ordering};

const LOG_SIZE: usize = 256;

/// What a record describes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PressRelease {
    /// A committed press.
    Press,
    /// A committed release.
    Release,
}

/// A packed representation of one committed transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct KeyRecord {
    /// The time the transition was observed.
    pub timestamp_ns: u64,
    /// Index of the expander in the scanner's list.
    pub expander: u8,
    /// The pin that changed.
    pub pin: u8,
    /// The event that was produced.
    pub event: PressRelease,
}

const EMPTY_RECORD: KeyRecord = KeyRecord {
    timestamp_ns: 0,
    expander: 0,
    pin: 0,
    event: PressRelease::Release,
};

/// A transition log that is accessible by the debugger.
pub struct Log {
    head: usize,
    body: [KeyRecord; LOG_SIZE],
}

static mut THELOG: Log = Log::new();

impl Log {
    /// Creates an empty log. Firmware normally uses the [`Log::get`]
    /// singleton instead so the buffer has a predictable address.
    pub const fn new() -> Self {
        Log {
            head: 0,
            body: [EMPTY_RECORD; LOG_SIZE],
        }
    }

    /// Appends a record, overwriting the oldest when full.
    pub fn log(&mut self, record: KeyRecord) {
        self.body[self.head] = record;
        self.head += 1;
        self.head %= LOG_SIZE;
    }

    /// The most recently written record, if any was ever written.
    pub fn latest(&self) -> Option<&KeyRecord> {
        let slot = self.head.checked_sub(1).unwrap_or(LOG_SIZE - 1);
        let record = &self.body[slot];
        if *record == EMPTY_RECORD && self.head == 0 {
            None
        } else {
            Some(record)
        }
    }

    /// The raw record buffer, oldest-first from `head`.
    pub fn body(&self) -> &[KeyRecord] {
        &self.body
    }

    /// Position the next record will be written to.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Return the log singleton. Panics if called twice.
    pub fn get() -> &'static mut Self {
        static TAKEN: AtomicBool = AtomicBool::new(false);
        if TAKEN.swap(true, Ordering::AcqRel) {
            panic!();
        }
        unsafe { &mut THELOG }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(t: u64) -> KeyRecord {
        KeyRecord {
            timestamp_ns: t,
            expander: 0,
            pin: 1,
            event: PressRelease::Press,
        }
    }

    #[test]
    fn empty_log_has_no_latest() {
        let log = Log::new();
        assert_eq!(None, log.latest());
    }

    #[test]
    fn records_in_ring_order() {
        let mut log = Log::new();
        log.log(record(1));
        log.log(record(2));
        assert_eq!(2, log.head());
        assert_eq!(Some(&record(2)), log.latest());
        assert_eq!(record(1), log.body()[0]);
    }

    #[test]
    fn wraps_around_when_full() {
        let mut log = Log::new();
        for t in 0..LOG_SIZE as u64 + 2 {
            log.log(record(t));
        }
        assert_eq!(2, log.head());
        // the oldest slots now hold the newest records
        assert_eq!(LOG_SIZE as u64, log.body()[0].timestamp_ns);
        assert_eq!(LOG_SIZE as u64 + 1, log.body()[1].timestamp_ns);
        assert_eq!(2, log.body()[2].timestamp_ns);
    }
}
