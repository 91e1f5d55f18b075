//! `lookup_webfinger`: the WebFinger client side.

use crate::jrd::{Jrd, JRD_JSON};
use fedi_loader::url_policy;
use reqwest::{Client, Url};
use tracing::debug;

/// Maximum manual redirects [`lookup_webfinger`] will follow before giving
/// up.
const MAX_REDIRECTS: u8 = 5;

/// Resolve `resource` (an `acct:user@host` URI or an `https:` actor URL)
/// via its host's `.well-known/webfinger` endpoint.
///
/// Returns `None` for any failure: malformed `resource`, DNS/connect
/// failure, a disallowed (private/loopback) or protocol-downgraded
/// redirect target, too many redirects, a non-2xx response, or an
/// unparseable body. Failures are logged at `debug` level; WebFinger
/// lookups are routinely attempted against hosts that don't support it; it
/// isn't this crate's job to treat that as noteworthy.
pub async fn lookup_webfinger(resource: &str, user_agent: &str) -> Option<Jrd> {
    let host = resource_host(resource)?;
    let query = format!("resource={}", percent_encode(resource));
    let mut target = Url::parse(&format!("https://{host}/.well-known/webfinger?{query}")).ok()?;

    let client = Client::builder().redirect(reqwest::redirect::Policy::none()).build().ok()?;

    for _ in 0..=MAX_REDIRECTS {
        url_policy::check_scheme(&target).ok()?;
        url_policy::check_url(&target, false).await.ok()?;

        let response = client
            .get(target.clone())
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(reqwest::header::ACCEPT, JRD_JSON)
            .send()
            .await
            .map_err(|e| debug!(error = %e, "webfinger request failed"))
            .ok()?;

        if response.status().is_redirection() {
            let location = response.headers().get(reqwest::header::LOCATION)?.to_str().ok()?;
            target = target.join(location).ok()?;
            continue;
        }

        if !response.status().is_success() {
            debug!(status = %response.status(), "webfinger endpoint returned a non-success status");
            return None;
        }

        return response.json::<Jrd>().await.ok();
    }

    debug!(resource, "webfinger lookup exceeded the maximum redirect count");
    None
}

fn resource_host(resource: &str) -> Option<String> {
    if let Some(rest) = resource.strip_prefix("acct:") {
        let (_, host) = rest.split_once('@')?;
        return Some(host.to_string());
    }
    let url = Url::parse(resource).ok()?;
    if url.scheme() != "https" {
        return None;
    }
    url.host_str().map(str::to_string)
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
