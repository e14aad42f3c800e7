//! getaddrinfo-shaped request hints and results.
//!
//! Every resolver in this crate, native or DoH-backed, answers in this
//! shape so callers cannot tell which path served a request.

use std::net::{IpAddr, SocketAddr, SocketAddrV4, SocketAddrV6};

/// Address family requested by, or attached to, an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressFamily {
    /// Any family (`AF_UNSPEC`).
    #[default]
    Unspec,
    /// IPv4 (`AF_INET`).
    Inet,
    /// IPv6 (`AF_INET6`).
    Inet6,
}

impl AddressFamily {
    /// Family of a concrete IP address.
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Inet,
            IpAddr::V6(_) => AddressFamily::Inet6,
        }
    }

    /// Family inferred from a textual address literal.
    ///
    /// A colon anywhere in the literal means IPv6.
    pub fn of_literal(literal: &str) -> Self {
        if literal.contains(':') {
            AddressFamily::Inet6
        } else {
            AddressFamily::Inet
        }
    }

    /// Whether an address of family `other` satisfies this hint.
    pub fn admits(self, other: AddressFamily) -> bool {
        self == AddressFamily::Unspec || self == other
    }
}

/// Socket type hint (`SOCK_*`), passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SocketKind {
    #[default]
    Any,
    Stream,
    Datagram,
    Raw,
}

/// Protocol hint (`IPPROTO_*`), passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Any,
    Tcp,
    Udp,
}

/// Hints accompanying a resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddrInfoHints {
    pub family: AddressFamily,
    pub socket_kind: SocketKind,
    pub protocol: Protocol,
    /// Opaque `AI_*` flags.
    pub flags: i32,
}

impl AddrInfoHints {
    /// Hints for a TCP stream connection of any family.
    pub fn stream() -> Self {
        Self {
            socket_kind: SocketKind::Stream,
            protocol: Protocol::Tcp,
            ..Self::default()
        }
    }

    /// Restrict to a single address family.
    pub fn with_family(mut self, family: AddressFamily) -> Self {
        self.family = family;
        self
    }
}

/// One resolved address: `(family, socket_kind, protocol, canonical_name, addr)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
    pub family: AddressFamily,
    pub socket_kind: SocketKind,
    pub protocol: Protocol,
    /// Always empty; canonical names are not requested.
    pub canonical_name: String,
    pub addr: SocketAddr,
}

impl AddrInfo {
    /// Builds the entry for `ip:port`, copying socket kind and protocol from
    /// the request hints. IPv6 addresses get flowinfo 0 and scope id 0.
    pub fn new(ip: IpAddr, port: u16, hints: &AddrInfoHints) -> Self {
        let addr = match ip {
            IpAddr::V4(v4) => SocketAddr::V4(SocketAddrV4::new(v4, port)),
            IpAddr::V6(v6) => SocketAddr::V6(SocketAddrV6::new(v6, port, 0, 0)),
        };
        Self {
            family: AddressFamily::of(&ip),
            socket_kind: hints.socket_kind,
            protocol: hints.protocol,
            canonical_name: String::new(),
            addr,
        }
    }
}
