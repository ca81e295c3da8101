//! `/recommendations` façade.

use libris_core::recommendation::Recommendation;
use reqwest::Method;

use crate::{error::Result, gateway::Gateway};

/// How many recommendations to ask for when the caller doesn't say.
pub const DEFAULT_LIMIT: u32 = 10;

pub struct RecommendationsApi<'a> {
  pub(crate) gateway: &'a Gateway,
}

impl RecommendationsApi<'_> {
  /// `GET /recommendations?limit=<n>`
  pub async fn get(&self, limit: u32) -> Result<Vec<Recommendation>> {
    let req = self
      .gateway
      .request(Method::GET, "/recommendations")
      .query(&[("limit", limit)]);
    self.gateway.json(req).await
  }
}
