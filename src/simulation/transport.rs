//! Datagram transport for encoded packets.
//!
//! Each vehicle driver owns one handle for its whole run; dropping the handle
//! releases the socket. Delivery is best-effort, so callers decide what to do
//! with a failed send.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use super::packet::Packet;
use super::types::Vehicle;

/// An owned, per-vehicle packet sink.
pub trait Transport {
    /// One-shot send attempt; no retries.
    fn send(&mut self, packet: &Packet) -> io::Result<()>;
}

/// Opens a transport handle for a vehicle's configured address.
pub trait TransportFactory {
    type Handle: Transport;

    fn open(&self, vehicle: &Vehicle) -> io::Result<Self::Handle>;
}

/// UDP socket bound to an ephemeral local port, aimed at one target.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Bind a socket of the target's address family.
    ///
    /// The socket is non-blocking so a full send buffer surfaces as
    /// `WouldBlock` instead of stalling the executor thread.
    pub fn open(target: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;

        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, packet: &Packet) -> io::Result<()> {
        let sent = self.socket.send_to(packet, self.target)?;
        if sent != packet.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {sent} of {} bytes", packet.len()),
            ));
        }
        Ok(())
    }
}

/// Opens a `UdpTransport` per vehicle.
///
/// Uses the address pinned by the scenario loader; a vehicle built without
/// one is looked up here instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTransportFactory;

impl TransportFactory for UdpTransportFactory {
    type Handle = UdpTransport;

    fn open(&self, vehicle: &Vehicle) -> io::Result<UdpTransport> {
        let target = match vehicle.target {
            Some(target) => target,
            None => vehicle.lookup_target()?,
        };
        log::trace!("Vehicle {} sending to {}", vehicle.id, target);
        UdpTransport::open(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::packet::PACKET_SIZE;
    use std::time::Duration;

    fn vehicle(ip: Option<&str>, port: Option<u16>) -> Vehicle {
        Vehicle {
            id: "unit".to_string(),
            path: Vec::new(),
            ip: ip.map(str::to_string),
            port,
            target: None,
        }
    }

    #[test]
    fn udp_transport_delivers_whole_packet_over_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut transport = UdpTransportFactory.open(&vehicle(Some("127.0.0.1"), Some(port))).unwrap();
        assert_eq!(transport.target().port(), port);

        let mut packet = [0u8; PACKET_SIZE];
        packet[0] = 0xAB;
        packet[71] = 0xCD;
        transport.send(&packet).unwrap();

        let mut buf = [0u8; 128];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(len, PACKET_SIZE);
        assert_eq!(&buf[..len], &packet[..]);
    }

    #[test]
    fn vehicle_defaults_target_loopback_2021() {
        let transport = UdpTransportFactory.open(&vehicle(None, None)).unwrap();
        assert_eq!(transport.target(), "127.0.0.1:2021".parse().unwrap());
    }

    #[test]
    fn pinned_target_wins_over_lookup() {
        let mut pinned = vehicle(Some("not a host name"), Some(9));
        pinned.target = Some("127.0.0.1:4000".parse().unwrap());
        let transport = UdpTransportFactory.open(&pinned).unwrap();
        assert_eq!(transport.target().port(), 4000);
    }

    #[test]
    fn unresolvable_host_fails_to_open() {
        assert!(UdpTransportFactory.open(&vehicle(Some("not a host name"), None)).is_err());
    }
}
