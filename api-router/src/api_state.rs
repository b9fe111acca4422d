use std::{sync::Arc, time::Duration};

use campaign_localizer::CampaignGenerator;
use common::storage::store::ContentStore;

use crate::query_handler::QueryHandler;

#[derive(Clone)]
pub struct ApiState {
    pub handler: Arc<QueryHandler>,
    /// Used by the readiness probe only; queries go through `handler`.
    pub store: Arc<dyn ContentStore>,
    pub store_timeout: Duration,
    pub campaigns: CampaignGenerator,
}

impl ApiState {
    pub fn new(
        handler: QueryHandler,
        store: Arc<dyn ContentStore>,
        store_timeout: Duration,
        campaigns: CampaignGenerator,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            store,
            store_timeout,
            campaigns,
        }
    }
}
