// Counter service pipeline
// Gate, then accessor, then response builder. Every outcome becomes exactly
// one well-formed response; nothing here returns an error to the caller
//
// Numan Thabit 2025 Nov

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::counter::{CounterAccessor, CounterIds};
use crate::errors::CounterError;
use crate::gate::RequestGate;
use crate::response::{self, CountBody, DebugInfo};
use crate::store::StoreConnector;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// New values of the counters touched by one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub total: u64,
    pub today: Option<u64>,
}

#[derive(Clone)]
pub struct CounterService {
    config: Arc<AppConfig>,
    gate: RequestGate,
    connector: Arc<dyn StoreConnector>,
    clock: Clock,
}

impl CounterService {
    pub fn new(config: Arc<AppConfig>, connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            config,
            gate: RequestGate::default(),
            connector,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn handle(&self, method: &Method, headers: &HeaderMap, debug: bool) -> Response {
        let decision = self.gate.admit(method, headers);
        if let Some(status) = decision.short_circuit {
            return if status == StatusCode::NO_CONTENT {
                response::preflight(decision.cors)
            } else {
                response::method_not_allowed(decision.cors)
            };
        }

        let has_endpoint = self.config.has_endpoint();
        let has_key = self.config.has_key();
        debug!(has_endpoint, has_key, "store configuration presence");

        let day = (self.clock)().date_naive();
        let ids = CounterIds::for_day(day);

        match self.count(&ids).await {
            Ok(counts) => {
                info!(count = counts.total, today = ?counts.today, "visit counted");
                let debug = debug.then(|| DebugInfo {
                    has_endpoint,
                    has_key,
                    day: day.format("%Y-%m-%d").to_string(),
                    total_id: ids.total.clone(),
                    daily_id: ids.daily.clone(),
                });
                response::success(
                    decision.cors,
                    CountBody {
                        count: counts.total,
                        today: counts.today,
                        debug,
                    },
                )
            }
            Err(err) => {
                error!(
                    kind = err.kind(),
                    code = ?err.code(),
                    extra = ?err.extra(),
                    error = %err,
                    "counter request failed"
                );
                response::failure(decision.cors, &err)
            }
        }
    }

    /// Checks configuration, connects, and runs the increments.
    pub async fn count(&self, ids: &CounterIds) -> Result<Counts, CounterError> {
        let settings = self.config.store_settings()?;
        let store = self.connector.connect(&settings).await?;
        let accessor = CounterAccessor::new(store.as_ref());

        if self.config.track_daily {
            let counts = accessor
                .increment_all(&[ids.total.as_str(), ids.daily.as_str()])
                .await?;
            Ok(Counts {
                total: counts[0],
                today: Some(counts[1]),
            })
        } else {
            Ok(Counts {
                total: accessor.increment(&ids.total).await?,
                today: None,
            })
        }
    }
}
