use std::{net::Ipv4Addr, time::Duration};

use rand::seq::IndexedRandom;
use reqwest::Client;
use tracing::{info, warn};

use crate::config;

const PROXIFLY_HTTP_LIST: &str =
    "https://cdn.jsdelivr.net/gh/proxifly/free-proxy-list@main/proxies/protocols/http/data.txt";

/// Proxy URL for the audio fetch subprocess.
///
/// An explicit `YTDLP_PROXY` wins. Otherwise, when `ENABLE_PROXY` is set, a
/// random entry from the public Proxifly HTTP list is used. Any failure to
/// obtain the list means no proxy.
pub async fn select_proxy(http: &Client) -> Option<String> {
    if let Some(proxy) = config::ytdlp_proxy() {
        return Some(proxy);
    }
    if !config::proxy_enabled() {
        return None;
    }

    match fetch_public_proxy(http).await {
        Ok(Some(proxy)) => {
            info!(%proxy, "using public proxy for audio fetches");
            Some(proxy)
        }
        Ok(None) => {
            warn!("public proxy list contained no usable entries");
            None
        }
        Err(e) => {
            warn!(error = %e, "could not fetch public proxy list");
            None
        }
    }
}

async fn fetch_public_proxy(http: &Client) -> Result<Option<String>, reqwest::Error> {
    let body = http
        .get(PROXIFLY_HTTP_LIST)
        .timeout(Duration::from_secs(10))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let candidates = parse_proxy_list(&body);
    Ok(candidates
        .choose(&mut rand::rng())
        .map(|addr| format!("http://{}", addr)))
}

/// Keeps the `ip:port` lines of a proxy list, with or without an `http://` prefix.
fn parse_proxy_list(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| line.trim().trim_start_matches("http://"))
        .filter(|line| is_ip_port(line))
        .map(str::to_string)
        .collect()
}

fn is_ip_port(candidate: &str) -> bool {
    match candidate.rsplit_once(':') {
        Some((ip, port)) => ip.parse::<Ipv4Addr>().is_ok() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ip_port_lines_survive() {
        let body = "# header\n1.2.3.4:8080\nhttp://5.6.7.8:3128\nnot-a-proxy\n9.9.9.9\n";
        assert_eq!(parse_proxy_list(body), vec!["1.2.3.4:8080", "5.6.7.8:3128"]);
    }
}
