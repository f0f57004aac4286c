//! Host-side MIDI events with sample-accurate timing.

use midi_msg::{Channel, ChannelVoiceMsg, ControlChange, MidiMsg};

use crate::error::{Error, Result};

/// Payload of a host MIDI event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostMidiData {
    Voice {
        channel: Channel,
        msg: ChannelVoiceMsg,
    },
    /// One raw byte of a stream the host does not parse (realtime, sysex, ...).
    Byte(u8),
}

/// MIDI event as found in a host's MIDI buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostMidiEvent {
    /// Offset within the current buffer (0 = first sample).
    pub frame_offset: usize,
    /// Virtual cable; the engine sees channel `port * 16 + channel`.
    pub port: u8,
    pub data: HostMidiData,
}

impl HostMidiEvent {
    #[inline]
    pub fn voice(frame_offset: usize, channel: u8, msg: ChannelVoiceMsg) -> Self {
        Self {
            frame_offset,
            port: 0,
            data: HostMidiData::Voice {
                channel: Channel::from_u8(channel),
                msg,
            },
        }
    }

    #[inline]
    pub fn note_on(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::voice(frame_offset, channel, ChannelVoiceMsg::NoteOn { note, velocity })
    }

    #[inline]
    pub fn note_off(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::voice(frame_offset, channel, ChannelVoiceMsg::NoteOff { note, velocity })
    }

    #[inline]
    pub fn control_change(frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self::voice(
            frame_offset,
            channel,
            ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC { control: cc, value },
            },
        )
    }

    #[inline]
    pub fn program_change(frame_offset: usize, channel: u8, program: u8) -> Self {
        Self::voice(frame_offset, channel, ChannelVoiceMsg::ProgramChange { program })
    }

    /// `bend` is 0..=16383 with 8192 at center.
    #[inline]
    pub fn pitch_bend(frame_offset: usize, channel: u8, bend: u16) -> Self {
        Self::voice(frame_offset, channel, ChannelVoiceMsg::PitchBend { bend })
    }

    #[inline]
    pub fn aftertouch(frame_offset: usize, channel: u8, pressure: u8) -> Self {
        Self::voice(frame_offset, channel, ChannelVoiceMsg::ChannelPressure { pressure })
    }

    #[inline]
    pub fn poly_aftertouch(frame_offset: usize, channel: u8, note: u8, pressure: u8) -> Self {
        Self::voice(
            frame_offset,
            channel,
            ChannelVoiceMsg::PolyPressure { note, pressure },
        )
    }

    #[inline]
    pub fn byte(frame_offset: usize, port: u8, byte: u8) -> Self {
        Self {
            frame_offset,
            port,
            data: HostMidiData::Byte(byte),
        }
    }

    #[inline]
    pub fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    /// Zero-based channel, or `None` for raw bytes.
    #[inline]
    pub fn channel_num(&self) -> Option<u8> {
        match self.data {
            HostMidiData::Voice { channel, .. } => Some(channel as u8),
            HostMidiData::Byte(_) => None,
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(
            self.data,
            HostMidiData::Voice {
                msg: ChannelVoiceMsg::NoteOn { velocity, .. },
                ..
            } if velocity > 0
        )
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(
            self.data,
            HostMidiData::Voice {
                msg: ChannelVoiceMsg::NoteOff { .. } | ChannelVoiceMsg::NoteOn { velocity: 0, .. },
                ..
            }
        )
    }

    /// Wire bytes for this event.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.data {
            HostMidiData::Voice { channel, msg } => MidiMsg::ChannelVoice { channel, msg }.to_midi(),
            HostMidiData::Byte(byte) => vec![byte],
        }
    }

    /// Parse one channel-voice message from wire bytes.
    pub fn from_bytes(bytes: &[u8], frame_offset: usize) -> Result<Self> {
        let (msg, _len) = MidiMsg::from_midi(bytes).map_err(|e| Error::Parse(format!("{:?}", e)))?;
        match msg {
            MidiMsg::ChannelVoice { channel, msg } => Ok(Self {
                frame_offset,
                port: 0,
                data: HostMidiData::Voice { channel, msg },
            }),
            _ => Err(Error::Unsupported("expected a channel voice message")),
        }
    }
}
