use std::sync::Arc;

use fixer_core::{
    Authenticator, BridgeContext, CampaignStore, Config, FixerClient, LifecycleController,
    SanitizedConfig, SnapshotStore, SnapshotThrottle, StatusSynchronizer,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    bridge: Arc<BridgeContext>,
    lifecycle: LifecycleController,
    synchronizer: StatusSynchronizer,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        bridge: Arc<BridgeContext>,
    ) -> Self {
        Self {
            config,
            authenticator,
            lifecycle: LifecycleController::new(Arc::clone(&bridge)),
            synchronizer: StatusSynchronizer::new(Arc::clone(&bridge)),
            bridge,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn synchronizer(&self) -> &StatusSynchronizer {
        &self.synchronizer
    }

    pub fn fixer(&self) -> &dyn FixerClient {
        self.bridge.fixer().as_ref()
    }

    pub fn campaigns(&self) -> &dyn CampaignStore {
        self.bridge.campaigns().as_ref()
    }

    pub fn snapshots(&self) -> &dyn SnapshotStore {
        self.bridge.snapshots().as_ref()
    }

    pub fn throttle(&self) -> &SnapshotThrottle {
        self.bridge.throttle()
    }
}
