//! Client for the citizen directory.
//!
//! `GET {base}/citizens/{handle}` answers with the citizen record or `404`
//! when the handle does not exist:
//!
//! ```json
//! {"handle": "Ioni", "citizen_number": "123456", "bio": "...",
//!  "organizations": [{"sid": "FLK", "rank": 1}, {"sid": null, "rank": null}]}
//! ```

use std::time::Duration;

use hangar_core::{
  citizen::Handle,
  provider::{CitizenDirectory, DirectoryRecord},
};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::{Error, Result, client, join};

#[derive(Clone)]
pub struct RsiDirectoryClient {
  http: Client,
  base: Url,
}

impl RsiDirectoryClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
    let (http, base) = client(base_url, timeout)?;
    Ok(Self { http, base })
  }

  /// `GET /citizens/{handle}`
  pub async fn citizen(&self, handle: &Handle) -> Result<Option<DirectoryRecord>> {
    let url = join(&self.base, &["citizens", handle.as_str()])?;
    debug!(%url, "looking up citizen");
    let resp = self.http.get(url.clone()).send().await?;

    match resp.status() {
      StatusCode::NOT_FOUND => Ok(None),
      status if status.is_success() => Ok(Some(resp.json().await?)),
      status => Err(Error::Status { url: url.to_string(), status }),
    }
  }
}

impl CitizenDirectory for RsiDirectoryClient {
  type Error = Error;

  async fn lookup(&self, handle: &Handle) -> Result<Option<DirectoryRecord>> {
    self.citizen(handle).await
  }
}
