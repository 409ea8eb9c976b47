//! HTTP clients for the two external systems Hangar reads from.
//!
//! - [`RsiDirectoryClient`] implements `CitizenDirectory`.
//! - [`GalaxyClient`] implements `ShipCatalogProvider`.
//!
//! Neither client retries; a failed request is reported once.

pub mod directory;
pub mod error;
pub mod galaxy;

pub use directory::RsiDirectoryClient;
pub use error::{Error, Result};
pub use galaxy::GalaxyClient;

use std::time::Duration;

use reqwest::{Client, Url};

/// Build the shared `reqwest` client and validate `base_url`.
pub(crate) fn client(base_url: &str, timeout: Duration) -> Result<(Client, Url)> {
  let base = Url::parse(base_url).map_err(|_| Error::InvalidBaseUrl(base_url.to_owned()))?;
  if base.cannot_be_a_base() {
    return Err(Error::InvalidBaseUrl(base_url.to_owned()));
  }
  let client = Client::builder().timeout(timeout).build()?;
  Ok((client, base))
}

/// `base` with `segments` appended as escaped path segments.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Result<Url> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|()| Error::InvalidBaseUrl(base.to_string()))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}

#[cfg(test)]
mod tests;
