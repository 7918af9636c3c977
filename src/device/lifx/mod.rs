//! LIFX bulbs over the LAN protocol.
//!
//! Each operation opens a fresh UDP socket connected to the bulb. Requests are
//! matched to replies by source id and sequence number; anything else on the
//! socket is ignored. Writes ask for an acknowledgement so a lost packet shows
//! up as a timeout instead of silently doing nothing.

pub mod protocol;

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use self::protocol::{Header, Message, POWER_OFF, POWER_ON};
use super::{ColorState, Connection, Device, DeviceError, Power, remaining};
use crate::common::constants::{LIFX_PORT, LIFX_RESPONSE_TIMEOUT};

const RECEIVE_BUFFER_SIZE: usize = 1024;

pub struct LifxBulb {
    label: String,
    addr: SocketAddr,
    target: [u8; 8],
    source: u32,
    bulb_label: String,
}

impl LifxBulb {
    /// Resolve the bulb, check it answers an echo and speaks the light protocol.
    pub fn connect(
        label: &str,
        host: &str,
        mac: Option<&str>,
        deadline: Instant,
    ) -> Result<Self, DeviceError> {
        let addr = resolve(host)?;
        let target = match mac {
            Some(mac) => protocol::parse_target(mac)?,
            None => [0u8; 8],
        };

        let mut bulb = Self {
            label: label.to_string(),
            addr,
            target,
            // 0 and 1 ask bulbs to broadcast their replies.
            source: std::process::id().max(2),
            bulb_label: String::new(),
        };

        let mut conn = bulb.open(deadline)?;
        conn.echo()?;
        let (_, _, bulb_label) = conn.light_state()?;
        drop(conn);

        log_debug!("{label}: lifx bulb '{bulb_label}' answered at {addr}");
        bulb.bulb_label = bulb_label;
        Ok(bulb)
    }

    fn open(&self, deadline: Instant) -> Result<LifxConnection, DeviceError> {
        let bind_addr: SocketAddr = if self.addr.is_ipv6() {
            SocketAddr::from(([0u16; 8], 0))
        } else {
            SocketAddr::from(([0u8; 4], 0))
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(self.addr)?;

        Ok(LifxConnection {
            socket,
            target: self.target,
            source: self.source,
            sequence: 0,
            deadline,
        })
    }
}

impl Device for LifxBulb {
    fn label(&self) -> &str {
        &self.label
    }

    fn describe(&self) -> String {
        let mac = if self.target == [0u8; 8] {
            "any".to_string()
        } else {
            protocol::format_target(&self.target)
        };
        if self.bulb_label.is_empty() {
            format!("LIFX bulb at {} ({mac})", self.addr)
        } else {
            format!("LIFX bulb '{}' at {} ({mac})", self.bulb_label, self.addr)
        }
    }

    fn connect(&self, deadline: Instant) -> Result<Box<dyn Connection + '_>, DeviceError> {
        Ok(Box::new(self.open(deadline)?))
    }
}

fn resolve(host: &str) -> Result<SocketAddr, DeviceError> {
    let host = host.trim();
    let resolved = if let Ok(addr) = host.parse::<SocketAddr>() {
        Some(addr)
    } else if host.contains(':') && !host.contains("::") {
        host.to_socket_addrs()
            .map_err(|e| DeviceError::InvalidAddress(format!("{host}: {e}")))?
            .next()
    } else {
        (host.trim_matches(['[', ']']), LIFX_PORT)
            .to_socket_addrs()
            .map_err(|e| DeviceError::InvalidAddress(format!("{host}: {e}")))?
            .next()
    };
    resolved.ok_or_else(|| DeviceError::InvalidAddress(format!("{host}: no addresses")))
}

struct LifxConnection {
    socket: UdpSocket,
    target: [u8; 8],
    source: u32,
    sequence: u8,
    deadline: Instant,
}

impl LifxConnection {
    /// Send `message` and wait for the reply carrying the same sequence number.
    fn request(&mut self, message: Message, ack_required: bool) -> Result<Message, DeviceError> {
        self.sequence = self.sequence.wrapping_add(1);
        let header = Header {
            source: self.source,
            target: self.target,
            ack_required,
            res_required: !ack_required,
            sequence: self.sequence,
        };

        let reply_deadline = Instant::now() + remaining(self.deadline)?.min(LIFX_RESPONSE_TIMEOUT);
        self.socket.send(&protocol::encode(&header, &message))?;

        let mut buf = [0u8; RECEIVE_BUFFER_SIZE];
        loop {
            let wait = reply_deadline
                .checked_duration_since(Instant::now())
                .filter(|left| !left.is_zero())
                .ok_or_else(|| {
                    DeviceError::Timeout(format!(
                        "no reply to message type {}",
                        message.message_type()
                    ))
                })?;
            self.socket.set_read_timeout(Some(wait))?;

            let len = self.socket.recv(&mut buf)?;
            let (reply_header, reply) = match protocol::decode(&buf[..len]) {
                Ok(decoded) => decoded,
                Err(e) => {
                    log_debug!("ignoring undecodable packet: {e}");
                    continue;
                }
            };
            if reply_header.source != self.source || reply_header.sequence != self.sequence {
                continue;
            }

            match reply {
                Some(Message::StateUnhandled { unhandled_type }) => {
                    return Err(DeviceError::ProtocolMismatch(format!(
                        "device does not handle message type {unhandled_type}"
                    )));
                }
                Some(reply) => return Ok(reply),
                None => continue,
            }
        }
    }

    fn expect_ack(&mut self, message: Message) -> Result<(), DeviceError> {
        match self.request(message, true)? {
            Message::Acknowledgement => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    fn light_state(&mut self) -> Result<(ColorState, u16, String), DeviceError> {
        match self.request(Message::LightGet, false)? {
            Message::LightState {
                color,
                power,
                label,
            } => Ok((color, power, label)),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(message: &Message) -> DeviceError {
    DeviceError::ProtocolMismatch(format!(
        "unexpected reply of type {}",
        message.message_type()
    ))
}

fn duration_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

impl Connection for LifxConnection {
    fn echo(&mut self) -> Result<(), DeviceError> {
        let mut payload = [0u8; protocol::ECHO_PAYLOAD_SIZE];
        payload[..4].copy_from_slice(&self.source.to_le_bytes());
        payload[4] = self.sequence.wrapping_add(1);

        match self.request(Message::EchoRequest(payload), false)? {
            Message::EchoResponse(echoed) if echoed == payload => Ok(()),
            Message::EchoResponse(_) => Err(DeviceError::ProtocolMismatch(
                "echo payload does not match".to_string(),
            )),
            other => Err(unexpected(&other)),
        }
    }

    fn power(&mut self) -> Result<Power, DeviceError> {
        match self.request(Message::LightGetPower, false)? {
            Message::LightStatePower { level } if level == POWER_OFF => Ok(Power::Off),
            Message::LightStatePower { .. } => Ok(Power::On),
            other => Err(unexpected(&other)),
        }
    }

    fn color(&mut self) -> Result<ColorState, DeviceError> {
        let (color, power, _) = self.light_state()?;
        if power == POWER_OFF {
            Ok(color.with_brightness(0))
        } else {
            Ok(color)
        }
    }

    fn set_power(&mut self, power: Power, duration: Duration) -> Result<(), DeviceError> {
        let level = match power {
            Power::On => POWER_ON,
            Power::Off => POWER_OFF,
        };
        self.expect_ack(Message::LightSetPower {
            level,
            duration_ms: duration_ms(duration),
        })
    }

    fn set_color(&mut self, color: ColorState, duration: Duration) -> Result<(), DeviceError> {
        self.expect_ack(Message::LightSetColor {
            color,
            duration_ms: duration_ms(duration),
        })
    }
}
