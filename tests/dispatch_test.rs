//! Resolution Dispatcher Tests
//!
//! Covers:
//! - Pass-through for unprotected hosts
//! - DoH routing, cache population and reuse for protected hosts
//! - Family filtering on the cache path
//! - The DoH endpoint host never routed through DoH
//! - DoH failures degrading to an empty answer without native fallback

use bytes::Bytes;
use sniveil::base::neterror::NetError;
use sniveil::dns::doh::DohFetching;
use sniveil::dns::{
    AddrInfo, AddrInfoHints, AddressFamily, DohConfig, DohTransport, Name, Resolve, Resolving,
};
use sniveil::InterceptionContext;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Native resolver answering 10.9.9.9 for everything, counting calls.
#[derive(Default)]
struct CountingNative {
    calls: AtomicUsize,
    names: Mutex<Vec<String>>,
}

impl Resolve for CountingNative {
    fn resolve(&self, name: Name, port: u16, hints: AddrInfoHints) -> Resolving {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.names.lock().unwrap().push(name.as_str().to_string());
        Box::pin(async move {
            Ok(vec![AddrInfo::new(
                IpAddr::V4(Ipv4Addr::new(10, 9, 9, 9)),
                port,
                &hints,
            )])
        })
    }
}

/// DoH transport returning a canned body (or error), counting calls.
struct CountingTransport {
    calls: AtomicUsize,
    urls: Mutex<Vec<Url>>,
    response: Result<&'static str, NetError>,
}

impl CountingTransport {
    fn answering(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            response: Ok(body),
        })
    }

    fn failing(err: NetError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            response: Err(err),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DohTransport for CountingTransport {
    fn get(&self, url: Url) -> DohFetching {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url);
        let response = self
            .response
            .clone()
            .map(|body| Bytes::from_static(body.as_bytes()));
        Box::pin(async move { response })
    }
}

const MIXED_ANSWER: &str = r#"{"Status":0,"Answer":[
    {"name":"blocked.example.","type":1,"TTL":300,"data":"1.2.3.4"},
    {"name":"blocked.example.","type":28,"TTL":300,"data":"2001:db8::7"},
    {"name":"blocked.example.","type":1,"TTL":300,"data":"5.6.7.8"}
]}"#;

fn setup(
    transport: Arc<CountingTransport>,
) -> (InterceptionContext, Arc<CountingNative>, sniveil::dns::ResolutionDispatcher) {
    let ctx = InterceptionContext::with_transport(DohConfig::default(), transport);
    let native = Arc::new(CountingNative::default());
    let dispatcher = ctx.dispatcher(native.clone());
    (ctx, native, dispatcher)
}

fn v4() -> AddrInfoHints {
    AddrInfoHints::stream().with_family(AddressFamily::Inet)
}

fn v6() -> AddrInfoHints {
    AddrInfoHints::stream().with_family(AddressFamily::Inet6)
}

#[tokio::test]
async fn test_unprotected_host_is_passed_through() {
    let transport = CountingTransport::answering(MIXED_ANSWER);
    let (ctx, native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);

    let infos = dispatcher
        .resolve_addresses("open.example", 443, AddrInfoHints::stream())
        .await
        .unwrap();

    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].addr.to_string(), "10.9.9.9:443");
    assert_eq!(native.calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_protected_host_uses_doh_once_then_cache() {
    let transport = CountingTransport::answering(MIXED_ANSWER);
    let (ctx, native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["Blocked.Example"]);

    // IPv4 only: one DoH call, IPv6 record filtered out
    let infos = dispatcher
        .resolve_addresses("blocked.example", 443, v4())
        .await
        .unwrap();
    let addrs: Vec<String> = infos.iter().map(|i| i.addr.to_string()).collect();
    assert_eq!(addrs, vec!["1.2.3.4:443", "5.6.7.8:443"]);
    assert!(infos.iter().all(|i| i.family == AddressFamily::Inet));
    assert_eq!(transport.calls(), 1);

    // IPv6 only: served from cache, no second DoH call
    let infos = dispatcher
        .resolve_addresses("BLOCKED.example", 8443, v6())
        .await
        .unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].addr.to_string(), "[2001:db8::7]:8443");
    assert_eq!(infos[0].family, AddressFamily::Inet6);
    assert_eq!(transport.calls(), 1);

    assert_eq!(native.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_doh_query_shape() {
    let transport = CountingTransport::answering(MIXED_ANSWER);
    let (ctx, _native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);

    dispatcher
        .resolve_addresses("blocked.example", 443, AddrInfoHints::stream())
        .await
        .unwrap();

    let urls = transport.urls.lock().unwrap();
    assert_eq!(urls.len(), 1);
    assert_eq!(
        urls[0].as_str(),
        "https://cloudflare-dns.com/dns-query?name=blocked.example&type=A"
    );
}

#[tokio::test]
async fn test_cache_hit_copies_hints() {
    let transport = CountingTransport::answering(MIXED_ANSWER);
    let (ctx, _native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);
    ctx.cache().update("blocked.example", &["9.9.9.9"], &[600]);

    let hints = AddrInfoHints::stream();
    let infos = dispatcher
        .resolve_addresses("blocked.example", 80, hints)
        .await
        .unwrap();

    assert_eq!(transport.calls(), 0);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].socket_kind, hints.socket_kind);
    assert_eq!(infos[0].protocol, hints.protocol);
    assert!(infos[0].canonical_name.is_empty());
}

#[tokio::test]
async fn test_endpoint_host_always_native() {
    let transport = CountingTransport::answering(MIXED_ANSWER);
    let (ctx, native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["cloudflare-dns.com", "blocked.example"]);

    let infos = dispatcher
        .resolve_addresses("cloudflare-dns.com", 443, AddrInfoHints::stream())
        .await
        .unwrap();

    assert_eq!(infos[0].addr.to_string(), "10.9.9.9:443");
    assert_eq!(transport.calls(), 0);
    assert_eq!(native.calls.load(Ordering::SeqCst), 1);
    assert!(!dispatcher.routes_via_doh("cloudflare-dns.com"));
}

#[tokio::test]
async fn test_doh_failure_yields_empty_without_fallback() {
    let transport = CountingTransport::failing(NetError::DnsServerFailed);
    let (ctx, native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);

    let infos = dispatcher
        .resolve_addresses("blocked.example", 443, AddrInfoHints::stream())
        .await
        .unwrap();

    assert!(infos.is_empty());
    assert_eq!(transport.calls(), 1);
    assert_eq!(native.calls.load(Ordering::SeqCst), 0);
    assert!(ctx.cache().is_empty());
}

#[tokio::test]
async fn test_malformed_body_yields_empty() {
    let transport = CountingTransport::answering("not json at all");
    let (ctx, native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);

    let infos = dispatcher
        .resolve_addresses("blocked.example", 443, AddrInfoHints::stream())
        .await
        .unwrap();

    assert!(infos.is_empty());
    assert_eq!(native.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_answer_is_requeried() {
    let transport = CountingTransport::answering(r#"{"Status":0}"#);
    let (ctx, _native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);

    for _ in 0..2 {
        let infos = dispatcher
            .resolve_addresses("blocked.example", 443, AddrInfoHints::stream())
            .await
            .unwrap();
        assert!(infos.is_empty());
    }

    // Nothing usable was cached, so each lookup goes back to DoH
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_resolve_trait_matches_inherent_method() {
    let transport = CountingTransport::answering(MIXED_ANSWER);
    let (ctx, _native, dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);

    let via_trait = dispatcher
        .resolve(Name::new("blocked.example"), 443, v4())
        .await
        .unwrap();
    let via_method = dispatcher
        .resolve_addresses("blocked.example", 443, v4())
        .await
        .unwrap();

    assert_eq!(via_trait, via_method);
}

#[tokio::test]
async fn test_native_errors_pass_through_unchanged() {
    struct Failing;
    impl Resolve for Failing {
        fn resolve(&self, name: Name, _port: u16, _hints: AddrInfoHints) -> Resolving {
            Box::pin(async move { Err(NetError::no_addresses(name.as_str())) })
        }
    }

    let ctx = InterceptionContext::with_transport(
        DohConfig::default(),
        CountingTransport::answering(MIXED_ANSWER),
    );
    let dispatcher = ctx.dispatcher(Arc::new(Failing));

    let err = dispatcher
        .resolve_addresses("open.example", 443, AddrInfoHints::stream())
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::NameNotResolvedFor { ref domain, .. } if domain == "open.example"));
}

#[tokio::test]
async fn test_separate_contexts_do_not_interfere() {
    let transport = CountingTransport::answering(MIXED_ANSWER);
    let (ctx, _native, _dispatcher) = setup(transport.clone());
    ctx.add_hosts(["blocked.example"]);

    // A second, empty context treats the host as ordinary
    let (_other_ctx, other_native, other_dispatcher) = setup(transport.clone());
    other_dispatcher
        .resolve_addresses("blocked.example", 443, AddrInfoHints::stream())
        .await
        .unwrap();

    assert_eq!(other_native.calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.calls(), 0);
}
