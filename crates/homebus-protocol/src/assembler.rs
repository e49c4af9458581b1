//! Frame assembly from a raw byte stream.
//!
//! The bus has no length prefix. A frame starts with `AA 55` and ends with the
//! first `0D 0D` after it, so the assembler is a small state machine fed one
//! byte at a time:
//!
//! ```text
//!            0xAA                 0x55
//!   Idle ──────────► AwaitingSecondMarker ──────────► Accumulating
//!    ▲  ◄──────────────────┘ other                        │
//!    └──────────── 0D 0D seen, or 256 bytes buffered ─────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::constants::*;

/// Assembler state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssemblerState {
    /// Nothing buffered; waiting for `0xAA`.
    #[default]
    Idle,
    /// `0xAA` buffered; waiting for `0x55`.
    AwaitingSecondMarker,
    /// Both markers seen; collecting bytes until `0D 0D`.
    Accumulating,
}

/// Outcome of a byte that ended the current candidate frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    /// Delimited frame of at least [`MIN_FRAME_SIZE`] bytes. Not yet checksummed.
    Frame(Bytes),
    /// Terminator arrived before [`MIN_FRAME_SIZE`] bytes.
    TooShort(Bytes),
    /// [`MAX_FRAME_SIZE`] bytes buffered without a terminator; contents dropped.
    Overflow {
        /// Bytes discarded.
        len: usize,
    },
}

/// Byte-at-a-time frame delimiter.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    /// Candidate frame, markers included.
    buffer: BytesMut,
    state: AssemblerState,
}

impl FrameAssembler {
    /// Create an idle assembler.
    pub fn new() -> Self {
        FrameAssembler {
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE),
            state: AssemblerState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial frame and return to [`AssemblerState::Idle`].
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = AssemblerState::Idle;
    }

    /// Feed one byte.
    ///
    /// Returns `Some` only when the byte ended the current candidate frame,
    /// after which the assembler is idle again.
    pub fn push(&mut self, byte: u8) -> Option<Assembled> {
        match self.state {
            AssemblerState::Idle => {
                if byte == FRAME_START_1 {
                    self.buffer.clear();
                    self.buffer.reserve(MAX_FRAME_SIZE);
                    self.buffer.put_u8(byte);
                    self.state = AssemblerState::AwaitingSecondMarker;
                }
                None
            }
            AssemblerState::AwaitingSecondMarker => {
                if byte == FRAME_START_2 {
                    self.buffer.put_u8(byte);
                    self.state = AssemblerState::Accumulating;
                } else {
                    self.reset();
                }
                None
            }
            AssemblerState::Accumulating => self.accumulate(byte),
        }
    }

    fn accumulate(&mut self, byte: u8) -> Option<Assembled> {
        self.buffer.put_u8(byte);

        if self.buffer.ends_with(&FRAME_END) {
            let frame = self.take();
            if frame.len() >= MIN_FRAME_SIZE {
                trace!(len = frame.len(), "frame delimited");
                return Some(Assembled::Frame(frame));
            }
            trace!(len = frame.len(), "frame too short");
            return Some(Assembled::TooShort(frame));
        }

        if self.buffer.len() >= MAX_FRAME_SIZE {
            let len = self.buffer.len();
            trace!(len, "no terminator within buffer capacity, resetting");
            self.reset();
            return Some(Assembled::Overflow { len });
        }

        None
    }

    /// Hand the buffered frame out and go idle.
    fn take(&mut self) -> Bytes {
        self.state = AssemblerState::Idle;
        self.buffer.split().freeze()
    }
}
