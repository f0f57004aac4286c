//! Engine-side MIDI events.
//!
//! These mirror the engine's per-event-type call surface: channels are
//! zero-based and may exceed 15 (`port * 16 + channel`), pitch bend is signed
//! around zero, and raw bytes carry their port.

/// Event kind tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MidiKind {
    NoteOn,
    ControlChange,
    ProgramChange,
    PitchBend,
    Aftertouch,
    PolyAftertouch,
    Byte,
}

/// Fixed-size, trivially copyable MIDI event as produced or consumed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiEvent {
    /// Velocity 0 means note off.
    NoteOn {
        channel: i32,
        pitch: i32,
        velocity: i32,
    },
    ControlChange {
        channel: i32,
        controller: i32,
        value: i32,
    },
    /// Program number 0-127.
    ProgramChange { channel: i32, program: i32 },
    /// -8192..=8191, 0 is center.
    PitchBend { channel: i32, value: i32 },
    Aftertouch { channel: i32, value: i32 },
    PolyAftertouch {
        channel: i32,
        pitch: i32,
        value: i32,
    },
    Byte { port: i32, byte: i32 },
}

pub const PITCH_BEND_MIN: i32 = -8192;
pub const PITCH_BEND_MAX: i32 = 8191;

impl MidiEvent {
    #[inline]
    pub fn kind(&self) -> MidiKind {
        match self {
            MidiEvent::NoteOn { .. } => MidiKind::NoteOn,
            MidiEvent::ControlChange { .. } => MidiKind::ControlChange,
            MidiEvent::ProgramChange { .. } => MidiKind::ProgramChange,
            MidiEvent::PitchBend { .. } => MidiKind::PitchBend,
            MidiEvent::Aftertouch { .. } => MidiKind::Aftertouch,
            MidiEvent::PolyAftertouch { .. } => MidiKind::PolyAftertouch,
            MidiEvent::Byte { .. } => MidiKind::Byte,
        }
    }

    /// Engine channel, or `None` for raw bytes.
    #[inline]
    pub fn channel(&self) -> Option<i32> {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::ProgramChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::Aftertouch { channel, .. }
            | MidiEvent::PolyAftertouch { channel, .. } => Some(channel),
            MidiEvent::Byte { .. } => None,
        }
    }

    /// Check every field against the engine's accepted ranges.
    ///
    /// Returns the name of the first offending field.
    pub fn validate(&self) -> Result<(), (&'static str, i32)> {
        fn data(name: &'static str, value: i32) -> Result<(), (&'static str, i32)> {
            if (0..=127).contains(&value) {
                Ok(())
            } else {
                Err((name, value))
            }
        }
        fn channel(value: i32) -> Result<(), (&'static str, i32)> {
            if value >= 0 {
                Ok(())
            } else {
                Err(("channel", value))
            }
        }

        match *self {
            MidiEvent::NoteOn {
                channel: ch,
                pitch,
                velocity,
            } => {
                channel(ch)?;
                data("pitch", pitch)?;
                data("velocity", velocity)
            }
            MidiEvent::ControlChange {
                channel: ch,
                controller,
                value,
            } => {
                channel(ch)?;
                data("controller", controller)?;
                data("value", value)
            }
            MidiEvent::ProgramChange { channel: ch, program } => {
                channel(ch)?;
                data("program", program)
            }
            MidiEvent::PitchBend { channel: ch, value } => {
                channel(ch)?;
                if (PITCH_BEND_MIN..=PITCH_BEND_MAX).contains(&value) {
                    Ok(())
                } else {
                    Err(("bend", value))
                }
            }
            MidiEvent::Aftertouch { channel: ch, value } => {
                channel(ch)?;
                data("pressure", value)
            }
            MidiEvent::PolyAftertouch {
                channel: ch,
                pitch,
                value,
            } => {
                channel(ch)?;
                data("pitch", pitch)?;
                data("pressure", value)
            }
            MidiEvent::Byte { port, byte } => {
                if !(0..=0x0fff).contains(&port) {
                    return Err(("port", port));
                }
                if (0..=255).contains(&byte) {
                    Ok(())
                } else {
                    Err(("byte", byte))
                }
            }
        }
    }
}
