use std::sync::Arc;

use serde_json::Value as JsonValue;

use coursemart_events::{EventBus, EventEnvelope, InMemoryEventBus};
use coursemart_infra::{InMemoryCustody, JournalStore, LedgerConfig, LedgerService, ServiceError};

pub type Journal = Arc<dyn JournalStore>;
pub type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
pub type Custody = Arc<InMemoryCustody>;
pub type MarketplaceService = LedgerService<Journal, Bus, Custody>;

/// Shared state behind every handler.
pub struct AppServices {
    pub ledger: MarketplaceService,
}

pub fn build_services(config: &LedgerConfig) -> Result<AppServices, ServiceError> {
    let journal = config.open_journal()?;
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let custody: Custody = Arc::new(InMemoryCustody::new());

    let ledger = LedgerService::open(config.ledger_id, config.owner, journal, bus, custody)?;
    Ok(AppServices { ledger })
}

/// Background subscriber: bus -> structured audit log.
///
/// Runs on its own thread until the bus is dropped.
pub fn spawn_audit_subscriber(services: &AppServices) {
    let sub = services.ledger.bus().subscribe();
    let spawned = std::thread::Builder::new()
        .name("coursemart-audit".to_string())
        .spawn(move || {
            while let Ok(env) = sub.recv() {
                tracing::info!(
                    target: "coursemart::audit",
                    ledger_id = %env.ledger_id(),
                    sequence_number = env.sequence_number(),
                    event_type = env.event_type(),
                    event_id = %env.event_id(),
                    occurred_at = %env.occurred_at(),
                    payload = %env.payload(),
                    "ledger event"
                );
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "audit subscriber not started; events are still journaled");
    }
}
