//! DNS Module Tests
//!
//! Covers:
//! - `Name` struct
//! - The getaddrinfo-shaped result type
//! - `GaiResolver` (Basic System Resolver)
//! - `SocketAddrs` literal parsing

use sniveil::dns::{
    AddrInfo, AddrInfoHints, AddressFamily, GaiResolver, Name, Protocol, Resolve, SocketAddrs,
    SocketKind,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

#[test]
fn test_name_api() {
    let name = Name::new("example.com");
    assert_eq!(name.as_str(), "example.com");
    assert_eq!(name.to_string(), "example.com");
}

#[test]
fn test_addrinfo_shape_ipv6() {
    let hints = AddrInfoHints {
        family: AddressFamily::Unspec,
        socket_kind: SocketKind::Datagram,
        protocol: Protocol::Udp,
        flags: 0x20,
    };
    let info = AddrInfo::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 53, &hints);

    assert_eq!(info.family, AddressFamily::Inet6);
    assert_eq!(info.socket_kind, SocketKind::Datagram);
    assert_eq!(info.protocol, Protocol::Udp);
    assert_eq!(info.canonical_name, "");
    match info.addr {
        SocketAddr::V6(v6) => {
            assert_eq!(v6.port(), 53);
            assert_eq!(v6.flowinfo(), 0);
            assert_eq!(v6.scope_id(), 0);
        }
        SocketAddr::V4(_) => panic!("expected an IPv6 sockaddr"),
    }
}

#[test]
fn test_literal_family_inference() {
    assert_eq!(AddressFamily::of_literal("1.2.3.4"), AddressFamily::Inet);
    assert_eq!(AddressFamily::of_literal("2001:db8::1"), AddressFamily::Inet6);
    assert_eq!(AddressFamily::of_literal("::ffff:1.2.3.4"), AddressFamily::Inet6);
}

#[tokio::test]
async fn test_gai_resolver_localhost() {
    let resolver = GaiResolver::new();
    let infos = resolver
        .resolve(Name::new("localhost"), 8080, AddrInfoHints::stream())
        .await
        .unwrap();

    assert!(!infos.is_empty());
    assert!(infos.iter().all(|i| i.addr.port() == 8080));
    assert!(infos.iter().all(|i| i.socket_kind == SocketKind::Stream));
}

#[tokio::test]
async fn test_gai_resolver_family_filter() {
    let resolver = GaiResolver::new();
    let infos = resolver
        .resolve(
            Name::new("127.0.0.1"),
            80,
            AddrInfoHints::stream().with_family(AddressFamily::Inet),
        )
        .await
        .unwrap();

    assert_eq!(infos.len(), 1);
    assert_eq!(
        infos[0].addr,
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 80)
    );

    let err = resolver
        .resolve(
            Name::new("127.0.0.1"),
            80,
            AddrInfoHints::stream().with_family(AddressFamily::Inet6),
        )
        .await
        .unwrap_err();
    assert!(err.is_name_not_resolved());
}

#[test]
fn test_socket_addrs_literals() {
    let v4: Vec<_> = SocketAddrs::try_parse("192.0.2.7", 443).unwrap().collect();
    assert_eq!(v4, vec!["192.0.2.7:443".parse::<SocketAddr>().unwrap()]);

    let v6: Vec<_> = SocketAddrs::try_parse("[2001:db8::1]", 443).unwrap().collect();
    assert_eq!(v6, vec!["[2001:db8::1]:443".parse::<SocketAddr>().unwrap()]);

    assert!(SocketAddrs::try_parse("example.com", 443).is_none());
}
