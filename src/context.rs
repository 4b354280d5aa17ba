//! Request-scoped application state, handed to every controller via axum's
//! `State` extractor. Holds the collaborators named in `spec.md` §6: the
//! outbound HTTP client and the access-control check.

use std::sync::Arc;

use reqwest::Client as HttpClient;

use crate::access_control::AccessControl;
use crate::client::ResourceClient;

#[derive(Clone)]
pub struct AppContext {
    client: ResourceClient,
    access_control: Arc<dyn AccessControl>,
}

impl AppContext {
    pub fn new(access_control: Arc<dyn AccessControl>) -> Self {
        Self {
            client: ResourceClient::new(HttpClient::new()),
            access_control,
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn access_control(&self) -> &dyn AccessControl {
        self.access_control.as_ref()
    }
}
