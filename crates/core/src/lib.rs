pub mod auth;
pub mod bridge;
pub mod campaign;
pub mod clock;
pub mod config;
pub(crate) mod db;
pub mod error;
pub mod fixer;
pub mod metrics;
pub mod snapshot;
pub mod testing;
pub mod throttle;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use bridge::{
    BridgeContext, BridgeError, CampaignGuard, CampaignLocks, LifecycleController, PollOutcome,
    SnapshotWrite, StartOutcome, StartParams, StatusSynchronizer, StopOutcome,
};
pub use campaign::{
    Baseline, CampaignRecord, CampaignStore, EngagementMetrics, LifecycleState, NewCampaign,
    OrderCounters, SqliteCampaignStore,
};
pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, DatabaseConfig, EngineConfig, OrderDefaults, SanitizedConfig, ServerConfig,
    SnapshotConfig,
};
pub use error::StoreError;
pub use fixer::{
    CreateCampaignParams, EngineHealth, EngineStatus, FixerClient, FixerError, HttpFixerClient,
    StopAck,
};
pub use snapshot::{NewSnapshot, Snapshot, SnapshotStore, SqliteSnapshotStore, UpstreamStatus};
pub use throttle::{SnapshotThrottle, DEFAULT_SNAPSHOT_INTERVAL};
