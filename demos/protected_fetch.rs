//! Fetch a protected host with interception enabled, then with a plain
//! client.
//!
//! Usage: `cargo run --example protected_fetch -- [url] [config.json]`
//!
//! Without a config file the URL's host is the only protected host and the
//! default DoH endpoint is used.

use sniveil::{Client, DohConfig, InterceptionConfig, InterceptionContext};
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let target = args
        .next()
        .unwrap_or_else(|| "https://www.pixiv.net/".to_string());
    let host = Url::parse(&target)?
        .host_str()
        .ok_or("URL has no host")?
        .to_string();

    let ctx = match args.next() {
        Some(path) => InterceptionConfig::from_path(path)?.into_context()?,
        None => {
            let ctx = InterceptionContext::new(DohConfig::default())?;
            ctx.add_hosts([host.as_str()]);
            ctx
        }
    };

    println!("Protected: {} ({} hosts registered)", ctx.is_protected(&host), ctx.hosts().len());

    let intercepting = Client::builder().interception(ctx.clone()).build()?;
    match intercepting.get(&target).send().await {
        Ok(resp) => println!("Intercepted fetch: {} {:?}", resp.status(), resp.version()),
        Err(e) => println!("Intercepted fetch failed: {} ({})", e, e.as_i32()),
    }
    println!("Cached addresses: {:?}", ctx.cache().get_addresses(&host));

    let plain = Client::new()?;
    match plain.get(&target).send().await {
        Ok(resp) => println!("Plain fetch: {} {:?}", resp.status(), resp.version()),
        Err(e) => println!("Plain fetch failed: {} ({})", e, e.as_i32()),
    }

    Ok(())
}
