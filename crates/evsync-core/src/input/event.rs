// Evsync Input Layer - Raw Kernel Events
// Fixed-layout input_event records and batch decoding

use crate::codes::{EV_ABS, EV_KEY, EV_REL, EV_SYN};
use crate::error::ReadError;

/// Size of one `struct input_event` on 64-bit Linux.
///
/// Layout: `struct timeval` (two native-endian i64), then `u16 type`,
/// `u16 code` and `i32 value`.
pub const RECORD_SIZE: usize = 24;

/// Timestamp carried by a raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventTime {
    pub sec: i64,
    pub usec: i64,
}

impl EventTime {
    pub fn new(sec: i64, usec: i64) -> Self {
        Self { sec, usec }
    }

    /// Milliseconds since the epoch, truncated to 32 bits like server time
    pub fn as_millis(&self) -> u32 {
        self.sec.wrapping_mul(1000).wrapping_add(self.usec / 1000) as u32
    }
}

/// Event class of a raw record, as routed by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Sync,
    Key,
    Relative,
    Absolute,
    Other(u16),
}

/// One raw kernel input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub time: EventTime,
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    /// Create an event with a zero timestamp
    pub fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            time: EventTime::default(),
            event_type,
            code,
            value,
        }
    }

    pub fn with_time(mut self, time: EventTime) -> Self {
        self.time = time;
        self
    }

    pub fn class(&self) -> EventClass {
        match self.event_type {
            EV_SYN => EventClass::Sync,
            EV_KEY => EventClass::Key,
            EV_REL => EventClass::Relative,
            EV_ABS => EventClass::Absolute,
            other => EventClass::Other(other),
        }
    }

    /// Decode a single record. `bytes` must be exactly [`RECORD_SIZE`] long.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut sec = [0u8; 8];
        let mut usec = [0u8; 8];
        let mut event_type = [0u8; 2];
        let mut code = [0u8; 2];
        let mut value = [0u8; 4];
        sec.copy_from_slice(&bytes[0..8]);
        usec.copy_from_slice(&bytes[8..16]);
        event_type.copy_from_slice(&bytes[16..18]);
        code.copy_from_slice(&bytes[18..20]);
        value.copy_from_slice(&bytes[20..24]);

        Self {
            time: EventTime::new(i64::from_ne_bytes(sec), i64::from_ne_bytes(usec)),
            event_type: u16::from_ne_bytes(event_type),
            code: u16::from_ne_bytes(code),
            value: i32::from_ne_bytes(value),
        }
    }

    /// Encode into the kernel record layout
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..8].copy_from_slice(&self.time.sec.to_ne_bytes());
        out[8..16].copy_from_slice(&self.time.usec.to_ne_bytes());
        out[16..18].copy_from_slice(&self.event_type.to_ne_bytes());
        out[18..20].copy_from_slice(&self.code.to_ne_bytes());
        out[20..24].copy_from_slice(&self.value.to_ne_bytes());
        out
    }

    /// Decode a whole read buffer.
    ///
    /// The kernel only ever hands out complete records, so a length that is
    /// not a multiple of [`RECORD_SIZE`] aborts the batch without decoding
    /// anything.
    pub fn decode_batch(bytes: &[u8]) -> Result<Vec<RawEvent>, ReadError> {
        if bytes.len() % RECORD_SIZE != 0 {
            return Err(ReadError::PartialRecord { len: bytes.len() });
        }

        Ok(bytes
            .chunks_exact(RECORD_SIZE)
            .map(|chunk| {
                let mut record = [0u8; RECORD_SIZE];
                record.copy_from_slice(chunk);
                RawEvent::decode(&record)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{ABS_X, BTN_LEFT, REL_X, SYN_REPORT};

    #[test]
    fn test_class_routing() {
        assert_eq!(RawEvent::new(EV_SYN, SYN_REPORT, 0).class(), EventClass::Sync);
        assert_eq!(RawEvent::new(EV_KEY, BTN_LEFT, 1).class(), EventClass::Key);
        assert_eq!(RawEvent::new(EV_REL, REL_X, 3).class(), EventClass::Relative);
        assert_eq!(RawEvent::new(EV_ABS, ABS_X, 3).class(), EventClass::Absolute);
        assert_eq!(RawEvent::new(0x04, 4, 0).class(), EventClass::Other(0x04));
    }

    #[test]
    fn test_decode_batch_reads_records_in_order() {
        let events = [
            RawEvent::new(EV_REL, REL_X, -7).with_time(EventTime::new(10, 500)),
            RawEvent::new(EV_SYN, SYN_REPORT, 0),
        ];
        let mut bytes = Vec::new();
        for event in &events {
            bytes.extend_from_slice(&event.encode());
        }

        let decoded = RawEvent::decode_batch(&bytes).unwrap();
        assert_eq!(decoded, events);
        assert_eq!(decoded[0].time.sec, 10);
        assert_eq!(decoded[0].value, -7);
    }

    #[test]
    fn test_decode_batch_rejects_partial_record() {
        let mut bytes = RawEvent::new(EV_KEY, BTN_LEFT, 1).encode().to_vec();
        bytes.extend_from_slice(&[0u8; 5]);

        match RawEvent::decode_batch(&bytes) {
            Err(ReadError::PartialRecord { len }) => assert_eq!(len, RECORD_SIZE + 5),
            other => panic!("expected partial record error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_batch() {
        assert!(RawEvent::decode_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_event_time_millis() {
        assert_eq!(EventTime::new(2, 345_000).as_millis(), 2345);

        // Extreme timestamps wrap instead of overflowing
        let expected = i64::MAX.wrapping_mul(1000).wrapping_add(999) as u32;
        assert_eq!(EventTime::new(i64::MAX, 999_999).as_millis(), expected);
        assert_eq!(EventTime::new(i64::MIN, -999_999).as_millis(), (-999i64) as u32);
    }
}
