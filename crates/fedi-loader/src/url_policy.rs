//! SSRF guard: reject fetches aimed at loopback, link-local, or private
//! network ranges unless the caller explicitly opts out.

use crate::error::LoaderError;
use reqwest::Url;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};

/// Hostnames treated as loopback without needing DNS resolution.
const LOOPBACK_HOSTNAMES: &[&str] = &["localhost"];

/// Returns `true` if `ip` is loopback, link-local, unspecified, a private
/// RFC1918 IPv4 range, or an IPv6 unique-local/link-local/multicast range.
#[must_use]
pub fn is_disallowed_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_disallowed_v4(v4),
        IpAddr::V6(v6) => is_disallowed_v6(v6),
    }
}

fn is_disallowed_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_link_local()
        || ip.is_private()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
}

fn is_disallowed_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() || ip.is_multicast() {
        return true;
    }
    // Unique local addresses (fc00::/7) and link-local (fe80::/10).
    let segments = ip.segments();
    let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
    let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
    is_unique_local || is_link_local
}

/// Resolve `url`'s host and reject it if it resolves to a disallowed
/// address, unless `allow_private_address` is set.
///
/// Resolution runs on a blocking thread via [`tokio::task::spawn_blocking`]
/// since `std::net::ToSocketAddrs` performs synchronous getaddrinfo and this
/// crate does not otherwise depend on `tokio`'s `net` feature.
///
/// # Errors
///
/// Returns [`LoaderError::PrivateAddress`] if the host resolves to a
/// disallowed address, and [`LoaderError::DnsFailure`] if resolution fails
/// outright.
pub async fn check_url(url: &Url, allow_private_address: bool) -> Result<(), LoaderError> {
    let Some(host) = url.host_str() else {
        return Err(LoaderError::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".into(),
        });
    };

    if allow_private_address {
        return Ok(());
    }

    if LOOPBACK_HOSTNAMES.contains(&host) {
        return Err(LoaderError::PrivateAddress { url: url.to_string() });
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_disallowed_address(ip) {
            return Err(LoaderError::PrivateAddress { url: url.to_string() });
        }
        return Ok(());
    }

    let lookup_host = format!("{host}:{}", url.port_or_known_default().unwrap_or(443));
    let host_owned = host.to_string();
    let url_owned = url.to_string();
    let addrs: Vec<SocketAddr> = tokio::task::spawn_blocking(move || lookup_host.to_socket_addrs())
        .await
        .map_err(|e| LoaderError::DnsFailure { host: host_owned.clone(), reason: e.to_string() })?
        .map_err(|e| LoaderError::DnsFailure { host: host_owned.clone(), reason: e.to_string() })?
        .collect();

    if addrs.is_empty() {
        return Err(LoaderError::DnsFailure {
            host: host_owned,
            reason: "no addresses returned".into(),
        });
    }

    if addrs.iter().any(|addr| is_disallowed_address(addr.ip())) {
        return Err(LoaderError::PrivateAddress { url: url_owned });
    }

    Ok(())
}

/// Reject non-`https` schemes. `http` is permitted only for loopback hosts,
/// which is how the in-process test mock loader operates.
///
/// # Errors
///
/// Returns [`LoaderError::ProtocolDowngrade`] for any other scheme, or
/// `http` against a non-loopback host.
pub fn check_scheme(url: &Url) -> Result<(), LoaderError> {
    match url.scheme() {
        "https" => Ok(()),
        "http" if url.host_str().is_some_and(|h| LOOPBACK_HOSTNAMES.contains(&h) || h == "127.0.0.1") => Ok(()),
        _ => Err(LoaderError::ProtocolDowngrade { url: url.to_string() }),
    }
}
