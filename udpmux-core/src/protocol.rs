//! Wire segment types, protocol constants, and sequence arithmetic

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::time::{SystemTime, UNIX_EPOCH};

/// Protocol constants
pub mod constants {
    /// Minimum RTO with the low-latency profile
    pub const RTO_MIN_NODELAY: u32 = 30;
    /// Minimum RTO with the standard profile
    pub const RTO_MIN: u32 = 100;
    /// Initial RTO before the first RTT sample
    pub const RTO_DEFAULT: u32 = 200;
    /// RTO ceiling
    pub const RTO_MAX: u32 = 60000;
    /// cmd: data segment
    pub const CMD_PUSH: u8 = 81;
    /// cmd: acknowledgment
    pub const CMD_ACK: u8 = 82;
    /// cmd: remote-window probe request
    pub const CMD_PROBE_ASK: u8 = 83;
    /// cmd: remote-window size report
    pub const CMD_PROBE_TELL: u8 = 84;
    /// probe flag: a PROBE_ASK is due
    pub const PROBE_SEND: u32 = 1;
    /// probe flag: a PROBE_TELL is due
    pub const PROBE_REPLY: u32 = 2;
    /// default send window (segments)
    pub const WND_SND: u32 = 32;
    /// default receive window (segments)
    pub const WND_RCV: u32 = 128;
    /// default MTU
    pub const MTU_DEFAULT: u32 = 1400;
    /// segment header overhead in bytes
    pub const OVERHEAD: u32 = 24;
    /// retransmissions of one segment before the link is considered dead
    pub const DEAD_LINK: u32 = 20;
    /// initial slow-start threshold
    pub const SSTHRESH_INIT: u32 = 2;
    /// slow-start threshold floor
    pub const SSTHRESH_MIN: u32 = 2;
    /// initial window-probe backoff (ms)
    pub const PROBE_INIT: u32 = 7000;
    /// window-probe backoff ceiling (ms)
    pub const PROBE_LIMIT: u32 = 120000;
    /// max times one segment may be fast-retransmitted
    pub const FASTACK_LIMIT: u32 = 5;
}

/// Conversation ID type
pub type ConvId = u32;

/// Sequence number type
pub type SeqNum = u32;

/// Timestamp type (milliseconds, wrapping)
pub type Timestamp = u32;

/// Read the conversation id from the first 4 bytes of a raw datagram.
///
/// The id is little-endian on the wire regardless of host byte order, and it
/// is the dispatch key an endpoint uses before any session exists. Returns 0
/// when fewer than 4 bytes are present.
pub fn peek_conv_id(data: &[u8]) -> ConvId {
    match data {
        [a, b, c, d, ..] => u32::from_le_bytes([*a, *b, *c, *d]),
        _ => 0,
    }
}

/// Generate a random conversation id using OS-entropy-seeded hashing.
/// Avoids 0 since `peek_conv_id` returns 0 for undersized datagrams.
pub fn random_conv_id() -> ConvId {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    loop {
        let id = RandomState::new().build_hasher().finish() as u32;
        if id != 0 {
            return id;
        }
    }
}

/// Get current wall-clock time in milliseconds (truncated to u32)
pub fn current_timestamp() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as Timestamp
}

/// Signed time difference handling wrap-around
pub fn time_diff(later: Timestamp, earlier: Timestamp) -> i32 {
    later.wrapping_sub(earlier) as i32
}

/// Check if `seq1` is before `seq2` (handling wrap-around)
pub fn seq_before(seq1: SeqNum, seq2: SeqNum) -> bool {
    (seq1.wrapping_sub(seq2) as i32) < 0
}

/// Check if `seq1` is after `seq2` (handling wrap-around)
pub fn seq_after(seq1: SeqNum, seq2: SeqNum) -> bool {
    (seq1.wrapping_sub(seq2) as i32) > 0
}

/// Segment header — 24 bytes on the wire, all fields little-endian.
///
/// The conversation id is deliberately first so that `peek_conv_id` works on
/// any datagram without decoding the rest of the header.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentHeader {
    pub conv: ConvId,
    pub cmd: u8,
    pub frg: u8,
    pub wnd: u16,
    pub ts: Timestamp,
    pub sn: SeqNum,
    pub una: SeqNum,
    pub len: u32,
}

impl SegmentHeader {
    /// Size of the segment header in bytes
    pub const SIZE: usize = 24;

    pub fn new(conv: ConvId, cmd: u8) -> Self {
        Self {
            conv,
            cmd,
            frg: 0,
            wnd: 0,
            ts: 0,
            sn: 0,
            una: 0,
            len: 0,
        }
    }

    /// Encode header into buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.conv);
        buf.put_u8(self.cmd);
        buf.put_u8(self.frg);
        buf.put_u16_le(self.wnd);
        buf.put_u32_le(self.ts);
        buf.put_u32_le(self.sn);
        buf.put_u32_le(self.una);
        buf.put_u32_le(self.len);
    }

    /// Decode header from buffer, consuming [`Self::SIZE`] bytes on success
    pub fn decode(buf: &mut Bytes) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            conv: buf.get_u32_le(),
            cmd: buf.get_u8(),
            frg: buf.get_u8(),
            wnd: buf.get_u16_le(),
            ts: buf.get_u32_le(),
            sn: buf.get_u32_le(),
            una: buf.get_u32_le(),
            len: buf.get_u32_le(),
        })
    }

    /// Command name for log output
    pub fn cmd_str(&self) -> &'static str {
        match self.cmd {
            constants::CMD_PUSH => "PUSH",
            constants::CMD_ACK => "ACK",
            constants::CMD_PROBE_ASK => "PROBE_ASK",
            constants::CMD_PROBE_TELL => "PROBE_TELL",
            _ => "UNKNOWN",
        }
    }
}

/// One segment: header, payload, and retransmission bookkeeping
#[derive(Debug, Clone)]
pub struct Segment {
    pub header: SegmentHeader,
    pub data: Bytes,

    // Retransmit state, never serialized
    pub resend_at: Timestamp,
    pub rto: u32,
    pub fast_acks: u32,
    pub sends: u32,
}

impl Segment {
    pub fn new(conv: ConvId, cmd: u8, data: Bytes) -> Self {
        let mut header = SegmentHeader::new(conv, cmd);
        header.len = data.len() as u32;

        Self {
            header,
            data,
            resend_at: 0,
            rto: constants::RTO_DEFAULT,
            fast_acks: 0,
            sends: 0,
        }
    }

    /// Create a PUSH segment carrying application data
    pub fn push(conv: ConvId, data: Bytes) -> Self {
        Self::new(conv, constants::CMD_PUSH, data)
    }

    /// Create an ACK segment echoing the peer's send timestamp
    pub fn ack(conv: ConvId, sn: SeqNum, ts: Timestamp) -> Self {
        let mut seg = Self::new(conv, constants::CMD_ACK, Bytes::new());
        seg.header.sn = sn;
        seg.header.ts = ts;
        seg
    }

    /// Encode segment into buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        self.header.encode(buf);
        buf.extend_from_slice(&self.data);
    }

    /// Decode one segment from the front of `buf`
    pub fn decode(mut buf: Bytes) -> Option<Self> {
        let header = SegmentHeader::decode(&mut buf)?;

        if buf.len() < header.len as usize {
            return None;
        }

        let data = buf.slice(..header.len as usize);
        Some(Self {
            header,
            data,
            resend_at: 0,
            rto: constants::RTO_DEFAULT,
            fast_acks: 0,
            sends: 0,
        })
    }

    /// Total wire size
    pub fn size(&self) -> usize {
        SegmentHeader::SIZE + self.data.len()
    }

    pub fn is_data(&self) -> bool {
        self.header.cmd == constants::CMD_PUSH
    }

    pub fn is_ack(&self) -> bool {
        self.header.cmd == constants::CMD_ACK
    }

    pub fn is_probe(&self) -> bool {
        matches!(
            self.header.cmd,
            constants::CMD_PROBE_ASK | constants::CMD_PROBE_TELL
        )
    }
}

/// Counters exposed by the engine for observability
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineStats {
    /// Application bytes accepted by `send`
    pub bytes_sent: u64,
    /// Application bytes handed out by `recv`
    pub bytes_received: u64,
    /// Wire packets produced
    pub packets_sent: u64,
    /// Wire packets consumed by `input`
    pub packets_received: u64,
    /// Timeout retransmissions
    pub retransmissions: u64,
    /// Duplicate-ack-triggered retransmissions
    pub fast_retransmissions: u64,
    /// Smoothed RTT in milliseconds
    pub rtt: u32,
    /// RTT variance
    pub rtt_var: u32,
    /// Current RTO
    pub rto: u32,
    /// Congestion window (segments)
    pub cwnd: u32,
    /// Segments waiting for acknowledgment
    pub snd_buf_size: u32,
    /// Out-of-order segments waiting for reassembly
    pub rcv_buf_size: u32,
}
