use tracing::{debug, instrument};
use url::Url;

use crate::error::ResolutionFailure;
use crate::http::HttpClient;

/// Drop query and fragment, which carry tracking and signing tokens
pub fn strip_query(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);
    canonical
}

/// Resolve an audio URL through its redirects and strip its query
///
/// Canonicalizing an already canonical URL returns it unchanged.
#[instrument(level = "debug", skip(client))]
pub async fn canonicalize<C: HttpClient + ?Sized>(
    client: &C,
    raw: &str,
) -> Result<Url, ResolutionFailure> {
    let response = client
        .resolve(raw)
        .await
        .map_err(|e| ResolutionFailure::RequestFailed {
            url: raw.to_string(),
            source: e,
        })?;

    if !response.is_success() {
        return Err(ResolutionFailure::HttpStatus {
            url: raw.to_string(),
            status: response.status,
        });
    }

    let resolved = Url::parse(&response.final_url).map_err(|e| ResolutionFailure::InvalidUrl {
        url: response.final_url.clone(),
        source: e,
    })?;

    let canonical = strip_query(&resolved);
    debug!(%canonical, "resolved audio URL");
    Ok(canonical)
}
