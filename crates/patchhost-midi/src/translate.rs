//! Host MIDI buffer entries <-> engine per-event calls.
//!
//! Host side: 7-bit data, unsigned 14-bit pitch bend, channel 0-15 plus a port.
//! Engine side: `port * 16 + channel`, signed pitch bend, note off as note on
//! with velocity 0.

use midi_msg::{Channel, ChannelVoiceMsg, ControlChange, MidiMsg};
use patchhost_core::{EngineError, MidiEvent, PatchEngine};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::event::{HostMidiData, HostMidiEvent};

/// Engine events produced from one host event. Most produce one;
/// compound controller messages may produce several.
pub type EngineMidiVec = SmallVec<[MidiEvent; 2]>;

const PITCH_BEND_CENTER: i32 = 8192;

/// Converts and range-checks MIDI in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiTranslator {
    ports: u16,
}

impl Default for MidiTranslator {
    fn default() -> Self {
        Self { ports: 16 }
    }
}

impl MidiTranslator {
    /// `ports` virtual cables are accepted (channels `0..ports * 16`).
    pub fn new(ports: u16) -> Self {
        Self {
            ports: ports.max(1),
        }
    }

    #[inline]
    pub fn ports(&self) -> u16 {
        self.ports
    }

    /// Translate one host event into engine events.
    pub fn to_engine(&self, event: &HostMidiEvent) -> Result<EngineMidiVec> {
        if u16::from(event.port) >= self.ports {
            return Err(Error::PortOutOfRange {
                port: i32::from(event.port),
                ports: self.ports,
            });
        }
        let port = i32::from(event.port);

        let (channel, msg) = match event.data {
            HostMidiData::Byte(byte) => {
                return Ok(smallvec::smallvec![MidiEvent::Byte {
                    port,
                    byte: i32::from(byte),
                }]);
            }
            HostMidiData::Voice { channel, msg } => (channel, msg),
        };
        let ch = port * 16 + channel as i32;

        let mut out = EngineMidiVec::new();
        match msg {
            ChannelVoiceMsg::NoteOn { note, velocity } => out.push(MidiEvent::NoteOn {
                channel: ch,
                pitch: data7("note", note)?,
                velocity: data7("velocity", velocity)?,
            }),
            ChannelVoiceMsg::NoteOff { note, .. } => out.push(MidiEvent::NoteOn {
                channel: ch,
                pitch: data7("note", note)?,
                velocity: 0,
            }),
            ChannelVoiceMsg::HighResNoteOn { note, velocity } => out.push(MidiEvent::NoteOn {
                channel: ch,
                pitch: data7("note", note)?,
                // High-res velocity is 14-bit, keep the upper 7 bits
                velocity: i32::from(velocity >> 7).min(127),
            }),
            ChannelVoiceMsg::HighResNoteOff { note, .. } => out.push(MidiEvent::NoteOn {
                channel: ch,
                pitch: data7("note", note)?,
                velocity: 0,
            }),
            ChannelVoiceMsg::PolyPressure { note, pressure } => {
                out.push(MidiEvent::PolyAftertouch {
                    channel: ch,
                    pitch: data7("note", note)?,
                    value: data7("pressure", pressure)?,
                })
            }
            ChannelVoiceMsg::ChannelPressure { pressure } => out.push(MidiEvent::Aftertouch {
                channel: ch,
                value: data7("pressure", pressure)?,
            }),
            ChannelVoiceMsg::ProgramChange { program } => out.push(MidiEvent::ProgramChange {
                channel: ch,
                program: data7("program", program)?,
            }),
            ChannelVoiceMsg::PitchBend { bend } => {
                if bend > 16383 {
                    return Err(Error::OutOfRange {
                        field: "bend",
                        value: i32::from(bend),
                    });
                }
                out.push(MidiEvent::PitchBend {
                    channel: ch,
                    value: i32::from(bend) - PITCH_BEND_CENTER,
                })
            }
            ChannelVoiceMsg::ControlChange { control } => match control {
                ControlChange::CC { control, value } => out.push(MidiEvent::ControlChange {
                    channel: ch,
                    controller: data7("controller", control)?,
                    value: data7("value", value)?,
                }),
                other => {
                    // Compound controllers (bank select, RPN, ...) expand into plain CCs.
                    let bytes = MidiMsg::ChannelVoice {
                        channel,
                        msg: ChannelVoiceMsg::ControlChange { control: other },
                    }
                    .to_midi();
                    controller_pairs(&bytes, |controller, value| {
                        out.push(MidiEvent::ControlChange {
                            channel: ch,
                            controller,
                            value,
                        })
                    });
                }
            },
            #[allow(unreachable_patterns)]
            _ => return Err(Error::Unsupported("channel voice message")),
        }
        Ok(out)
    }

    /// Call the engine entry point matching `event`.
    pub fn deliver<E: PatchEngine + ?Sized>(
        &self,
        engine: &mut E,
        event: &MidiEvent,
    ) -> std::result::Result<(), EngineError> {
        event
            .validate()
            .map_err(|(field, value)| EngineError::OutOfRange { field, value })?;
        match *event {
            MidiEvent::NoteOn {
                channel,
                pitch,
                velocity,
            } => engine.note_on(channel, pitch, velocity),
            MidiEvent::ControlChange {
                channel,
                controller,
                value,
            } => engine.control_change(channel, controller, value),
            MidiEvent::ProgramChange { channel, program } => {
                engine.program_change(channel, program)
            }
            MidiEvent::PitchBend { channel, value } => engine.pitch_bend(channel, value),
            MidiEvent::Aftertouch { channel, value } => engine.aftertouch(channel, value),
            MidiEvent::PolyAftertouch {
                channel,
                pitch,
                value,
            } => engine.poly_aftertouch(channel, pitch, value),
            MidiEvent::Byte { port, byte } => engine.midi_byte(port, byte),
        }
    }

    /// Translate and deliver one host event. Returns the number of engine calls made.
    pub fn send<E: PatchEngine + ?Sized>(
        &self,
        engine: &mut E,
        event: &HostMidiEvent,
    ) -> Result<usize> {
        let events = self.to_engine(event)?;
        for ev in &events {
            self.deliver(engine, ev)?;
        }
        Ok(events.len())
    }

    /// Translate one engine event for the host's output buffer.
    pub fn to_host(&self, event: MidiEvent, frame_offset: usize) -> Result<HostMidiEvent> {
        event
            .validate()
            .map_err(|(field, value)| Error::OutOfRange { field, value })?;

        if let MidiEvent::Byte { port, byte } = event {
            let port = self.port_of(port, port)?;
            return Ok(HostMidiEvent::byte(frame_offset, port, byte as u8));
        }

        // validate() guarantees a non-negative channel for voice events
        let engine_channel = event.channel().unwrap_or(0);
        let port = self.port_of(engine_channel / 16, engine_channel)?;
        let channel = Channel::from_u8((engine_channel % 16) as u8);

        let msg = match event {
            MidiEvent::NoteOn {
                pitch, velocity: 0, ..
            } => ChannelVoiceMsg::NoteOff {
                note: pitch as u8,
                velocity: 0,
            },
            MidiEvent::NoteOn {
                pitch, velocity, ..
            } => ChannelVoiceMsg::NoteOn {
                note: pitch as u8,
                velocity: velocity as u8,
            },
            MidiEvent::ControlChange {
                controller, value, ..
            } => ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC {
                    control: controller as u8,
                    value: value as u8,
                },
            },
            MidiEvent::ProgramChange { program, .. } => ChannelVoiceMsg::ProgramChange {
                program: program as u8,
            },
            MidiEvent::PitchBend { value, .. } => ChannelVoiceMsg::PitchBend {
                bend: (value + PITCH_BEND_CENTER) as u16,
            },
            MidiEvent::Aftertouch { value, .. } => ChannelVoiceMsg::ChannelPressure {
                pressure: value as u8,
            },
            MidiEvent::PolyAftertouch { pitch, value, .. } => ChannelVoiceMsg::PolyPressure {
                note: pitch as u8,
                pressure: value as u8,
            },
            MidiEvent::Byte { .. } => return Err(Error::Unsupported("raw byte")),
        };

        Ok(HostMidiEvent {
            frame_offset,
            port,
            data: HostMidiData::Voice { channel, msg },
        })
    }

    fn port_of(&self, port: i32, reported: i32) -> Result<u8> {
        if port < 0 || port >= i32::from(self.ports) || port > i32::from(u8::MAX) {
            return Err(Error::PortOutOfRange {
                port: reported,
                ports: self.ports,
            });
        }
        Ok(port as u8)
    }
}

#[inline]
fn data7(field: &'static str, value: u8) -> Result<i32> {
    if value > 127 {
        return Err(Error::OutOfRange {
            field,
            value: i32::from(value),
        });
    }
    Ok(i32::from(value))
}

/// Walk control-change wire bytes (running status allowed) as (controller, value) pairs.
fn controller_pairs(bytes: &[u8], mut f: impl FnMut(i32, i32)) {
    let mut data = bytes.iter().filter(|b| *b & 0x80 == 0).copied();
    while let (Some(controller), Some(value)) = (data.next(), data.next()) {
        f(i32::from(controller), i32::from(value));
    }
}
