//! LIFX LAN protocol codec.
//!
//! Every packet is a 36-byte little-endian header followed by a
//! message-specific payload:
//!
//! ```text
//! frame header       size:u16  protocol/flags:u16  source:u32
//! frame address      target:[u8; 8]  reserved:[u8; 6]  ack/res flags:u8  sequence:u8
//! protocol header    reserved:u64  type:u16  reserved:u16
//! ```
//!
//! Only the messages needed to probe a bulb and drive a transition are
//! implemented.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

use crate::device::{ColorState, DeviceError};

pub const HEADER_SIZE: usize = 36;
pub const ECHO_PAYLOAD_SIZE: usize = 64;
pub const LABEL_SIZE: usize = 32;

const PROTOCOL_NUMBER: u16 = 1024;
const ADDRESSABLE: u16 = 1 << 12;
const TAGGED: u16 = 1 << 13;

const RES_REQUIRED: u8 = 1 << 0;
const ACK_REQUIRED: u8 = 1 << 1;

pub mod message_type {
    pub const ACKNOWLEDGEMENT: u16 = 45;
    pub const ECHO_REQUEST: u16 = 58;
    pub const ECHO_RESPONSE: u16 = 59;
    pub const LIGHT_GET: u16 = 101;
    pub const LIGHT_SET_COLOR: u16 = 102;
    pub const LIGHT_STATE: u16 = 107;
    pub const LIGHT_GET_POWER: u16 = 116;
    pub const LIGHT_SET_POWER: u16 = 117;
    pub const LIGHT_STATE_POWER: u16 = 118;
    pub const STATE_UNHANDLED: u16 = 223;
}

/// Power level as the protocol encodes it: 0 or 65535.
pub const POWER_ON: u16 = u16::MAX;
pub const POWER_OFF: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Acknowledgement,
    EchoRequest([u8; ECHO_PAYLOAD_SIZE]),
    EchoResponse([u8; ECHO_PAYLOAD_SIZE]),
    LightGet,
    LightSetColor {
        color: ColorState,
        duration_ms: u32,
    },
    LightState {
        color: ColorState,
        power: u16,
        label: String,
    },
    LightGetPower,
    LightSetPower {
        level: u16,
        duration_ms: u32,
    },
    LightStatePower {
        level: u16,
    },
    StateUnhandled {
        unhandled_type: u16,
    },
}

impl Message {
    pub fn message_type(&self) -> u16 {
        use message_type::*;
        match self {
            Message::Acknowledgement => ACKNOWLEDGEMENT,
            Message::EchoRequest(_) => ECHO_REQUEST,
            Message::EchoResponse(_) => ECHO_RESPONSE,
            Message::LightGet => LIGHT_GET,
            Message::LightSetColor { .. } => LIGHT_SET_COLOR,
            Message::LightState { .. } => LIGHT_STATE,
            Message::LightGetPower => LIGHT_GET_POWER,
            Message::LightSetPower { .. } => LIGHT_SET_POWER,
            Message::LightStatePower { .. } => LIGHT_STATE_POWER,
            Message::StateUnhandled { .. } => STATE_UNHANDLED,
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Message::Acknowledgement | Message::LightGet | Message::LightGetPower => {}
            Message::EchoRequest(payload) | Message::EchoResponse(payload) => {
                writer.write_all(payload)?;
            }
            Message::LightSetColor { color, duration_ms } => {
                writer.write_u8(0)?;
                write_hsbk(writer, color)?;
                writer.write_u32::<LittleEndian>(*duration_ms)?;
            }
            Message::LightState {
                color,
                power,
                label,
            } => {
                write_hsbk(writer, color)?;
                writer.write_i16::<LittleEndian>(0)?;
                writer.write_u16::<LittleEndian>(*power)?;
                let mut raw = [0u8; LABEL_SIZE];
                let bytes = label.as_bytes();
                let len = bytes.len().min(LABEL_SIZE);
                raw[..len].copy_from_slice(&bytes[..len]);
                writer.write_all(&raw)?;
                writer.write_u64::<LittleEndian>(0)?;
            }
            Message::LightSetPower { level, duration_ms } => {
                writer.write_u16::<LittleEndian>(*level)?;
                writer.write_u32::<LittleEndian>(*duration_ms)?;
            }
            Message::LightStatePower { level } => {
                writer.write_u16::<LittleEndian>(*level)?;
            }
            Message::StateUnhandled { unhandled_type } => {
                writer.write_u16::<LittleEndian>(*unhandled_type)?;
            }
        }
        Ok(())
    }

    fn read_payload<R: Read>(kind: u16, reader: &mut R) -> io::Result<Option<Self>> {
        use message_type::*;
        let message = match kind {
            ACKNOWLEDGEMENT => Message::Acknowledgement,
            ECHO_REQUEST | ECHO_RESPONSE => {
                let mut payload = [0u8; ECHO_PAYLOAD_SIZE];
                reader.read_exact(&mut payload)?;
                if kind == ECHO_REQUEST {
                    Message::EchoRequest(payload)
                } else {
                    Message::EchoResponse(payload)
                }
            }
            LIGHT_GET => Message::LightGet,
            LIGHT_SET_COLOR => {
                reader.read_u8()?;
                let color = read_hsbk(reader)?;
                let duration_ms = reader.read_u32::<LittleEndian>()?;
                Message::LightSetColor { color, duration_ms }
            }
            LIGHT_STATE => {
                let color = read_hsbk(reader)?;
                reader.read_i16::<LittleEndian>()?;
                let power = reader.read_u16::<LittleEndian>()?;
                let mut raw = [0u8; LABEL_SIZE];
                reader.read_exact(&mut raw)?;
                let end = raw.iter().position(|b| *b == 0).unwrap_or(LABEL_SIZE);
                let label = String::from_utf8_lossy(&raw[..end]).into_owned();
                Message::LightState {
                    color,
                    power,
                    label,
                }
            }
            LIGHT_GET_POWER => Message::LightGetPower,
            LIGHT_SET_POWER => {
                let level = reader.read_u16::<LittleEndian>()?;
                let duration_ms = reader.read_u32::<LittleEndian>()?;
                Message::LightSetPower { level, duration_ms }
            }
            LIGHT_STATE_POWER => Message::LightStatePower {
                level: reader.read_u16::<LittleEndian>()?,
            },
            STATE_UNHANDLED => Message::StateUnhandled {
                unhandled_type: reader.read_u16::<LittleEndian>()?,
            },
            _ => return Ok(None),
        };
        Ok(Some(message))
    }
}

fn write_hsbk<W: Write>(writer: &mut W, color: &ColorState) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(color.hue)?;
    writer.write_u16::<LittleEndian>(color.saturation)?;
    writer.write_u16::<LittleEndian>(color.brightness)?;
    writer.write_u16::<LittleEndian>(color.kelvin)?;
    Ok(())
}

fn read_hsbk<R: Read>(reader: &mut R) -> io::Result<ColorState> {
    Ok(ColorState {
        hue: reader.read_u16::<LittleEndian>()?,
        saturation: reader.read_u16::<LittleEndian>()?,
        brightness: reader.read_u16::<LittleEndian>()?,
        kelvin: reader.read_u16::<LittleEndian>()?,
    })
}

/// Routing fields of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub source: u32,
    /// Device MAC address in the first six bytes; all zero addresses every device.
    pub target: [u8; 8],
    pub ack_required: bool,
    pub res_required: bool,
    pub sequence: u8,
}

pub fn encode(header: &Header, message: &Message) -> Vec<u8> {
    let mut payload = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = message.write_payload(&mut payload);

    let mut packet = Vec::with_capacity(HEADER_SIZE + payload.len());
    let _ = write_header(&mut packet, header, message.message_type(), payload.len());
    packet.extend_from_slice(&payload);
    packet
}

fn write_header<W: Write>(
    writer: &mut W,
    header: &Header,
    kind: u16,
    payload_len: usize,
) -> io::Result<()> {
    let size = (HEADER_SIZE + payload_len) as u16;
    let mut protocol = PROTOCOL_NUMBER | ADDRESSABLE;
    if header.target == [0u8; 8] {
        protocol |= TAGGED;
    }

    writer.write_u16::<LittleEndian>(size)?;
    writer.write_u16::<LittleEndian>(protocol)?;
    writer.write_u32::<LittleEndian>(header.source)?;

    writer.write_all(&header.target)?;
    writer.write_all(&[0u8; 6])?;
    let mut flags = 0u8;
    if header.res_required {
        flags |= RES_REQUIRED;
    }
    if header.ack_required {
        flags |= ACK_REQUIRED;
    }
    writer.write_u8(flags)?;
    writer.write_u8(header.sequence)?;

    writer.write_u64::<LittleEndian>(0)?;
    writer.write_u16::<LittleEndian>(kind)?;
    writer.write_u16::<LittleEndian>(0)?;
    Ok(())
}

/// Decode a packet. Unknown message types decode to `None` so callers can
/// skip them.
pub fn decode(bytes: &[u8]) -> Result<(Header, Option<Message>), DeviceError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeviceError::ProtocolMismatch(format!(
            "short packet of {} bytes",
            bytes.len()
        )));
    }

    let mut reader = Cursor::new(bytes);
    let truncated = |e: io::Error| DeviceError::ProtocolMismatch(format!("truncated packet: {e}"));

    let size = reader.read_u16::<LittleEndian>().map_err(truncated)? as usize;
    let protocol = reader.read_u16::<LittleEndian>().map_err(truncated)?;
    if protocol & 0x0fff != PROTOCOL_NUMBER {
        return Err(DeviceError::ProtocolMismatch(format!(
            "unexpected protocol number {}",
            protocol & 0x0fff
        )));
    }
    if size > bytes.len() {
        return Err(DeviceError::ProtocolMismatch(format!(
            "packet claims {size} bytes, received {}",
            bytes.len()
        )));
    }
    let source = reader.read_u32::<LittleEndian>().map_err(truncated)?;

    let mut target = [0u8; 8];
    reader.read_exact(&mut target).map_err(truncated)?;
    let mut reserved = [0u8; 6];
    reader.read_exact(&mut reserved).map_err(truncated)?;
    let flags = reader.read_u8().map_err(truncated)?;
    let sequence = reader.read_u8().map_err(truncated)?;

    reader.read_u64::<LittleEndian>().map_err(truncated)?;
    let kind = reader.read_u16::<LittleEndian>().map_err(truncated)?;
    reader.read_u16::<LittleEndian>().map_err(truncated)?;

    let header = Header {
        source,
        target,
        ack_required: flags & ACK_REQUIRED != 0,
        res_required: flags & RES_REQUIRED != 0,
        sequence,
    };

    let mut payload = Cursor::new(&bytes[HEADER_SIZE..size]);
    let message = Message::read_payload(kind, &mut payload).map_err(truncated)?;
    Ok((header, message))
}

/// Parse `d0:73:d5:01:02:03` (or `-` separated) into a frame target.
pub fn parse_target(mac: &str) -> Result<[u8; 8], DeviceError> {
    let invalid = || DeviceError::InvalidAddress(format!("mac address '{mac}'"));

    let parts: Vec<&str> = mac.trim().split([':', '-']).collect();
    if parts.len() != 6 {
        return Err(invalid());
    }

    let mut target = [0u8; 8];
    for (slot, part) in target.iter_mut().zip(&parts) {
        if part.len() != 2 {
            return Err(invalid());
        }
        *slot = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
    }
    Ok(target)
}

pub fn format_target(target: &[u8; 8]) -> String {
    target[..6]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
