//! `/preferences` façade.

use libris_core::preferences::{PreferenceUpdate, Preferences};
use reqwest::Method;

use crate::{error::Result, gateway::Gateway};

pub struct PreferencesApi<'a> {
  pub(crate) gateway: &'a Gateway,
}

impl PreferencesApi<'_> {
  /// `GET /preferences`
  pub async fn get(&self) -> Result<Preferences> {
    self.gateway.json(self.gateway.request(Method::GET, "/preferences")).await
  }

  /// `PUT /preferences`
  pub async fn update(&self, update: &PreferenceUpdate) -> Result<Preferences> {
    let req = self.gateway.request(Method::PUT, "/preferences").json(update);
    self.gateway.json(req).await
  }
}
