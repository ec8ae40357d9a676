//! In-memory stand-ins for providers and the shared pool

use nzb_health::{Dialer, PoolError, PoolManager, ProbeError, ProviderConfig, SegmentPool, StatSession};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Record of one STAT issued through [`StubDialer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCall {
    pub host: String,
    pub message_id: String,
}

/// Provider behaviour keyed by host
#[derive(Clone, Default)]
pub struct StubProvider {
    /// Articles reported missing (430); everything else is present (223)
    pub absent: HashSet<String>,
    /// Refuse connections altogether
    pub unreachable: bool,
}

impl StubProvider {
    pub fn with_absent(ids: &[&str]) -> Self {
        Self {
            absent: ids.iter().map(|id| id.to_string()).collect(),
            unreachable: false,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            absent: HashSet::new(),
            unreachable: true,
        }
    }
}

/// Dialer that answers from in-memory provider tables and records every STAT
#[derive(Default)]
pub struct StubDialer {
    providers: HashMap<String, StubProvider>,
    delay: Duration,
    calls: Arc<Mutex<Vec<StatCall>>>,
}

impl StubDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, host: &str, behaviour: StubProvider) -> Self {
        self.providers.insert(host.to_string(), behaviour);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<StatCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Distinct message-ids that were STAT'd on any provider
    pub fn checked_ids(&self) -> HashSet<String> {
        self.calls().into_iter().map(|c| c.message_id).collect()
    }
}

struct StubSession {
    host: String,
    behaviour: StubProvider,
    delay: Duration,
    calls: Arc<Mutex<Vec<StatCall>>>,
}

#[async_trait::async_trait]
impl StatSession for StubSession {
    async fn stat(&mut self, message_id: &str) -> Result<bool, ProbeError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.lock().unwrap().push(StatCall {
            host: self.host.clone(),
            message_id: message_id.to_string(),
        });
        Ok(!self.behaviour.absent.contains(message_id))
    }

    async fn quit(&mut self) -> Result<(), ProbeError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl Dialer for StubDialer {
    async fn dial(&self, provider: &ProviderConfig) -> Result<Box<dyn StatSession>, ProbeError> {
        let behaviour = self.providers.get(&provider.host).cloned().unwrap_or_default();
        if behaviour.unreachable {
            return Err(ProbeError::Connect {
                host: provider.host.clone(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(Box::new(StubSession {
            host: provider.host.clone(),
            behaviour,
            delay: self.delay,
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Pool returning fixed answers per message-id (223 when unlisted)
#[derive(Default)]
pub struct StubPool {
    pub answers: HashMap<String, Result<u16, PoolError>>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl SegmentPool for StubPool {
    async fn stat(&self, message_id: &str, _groups: &[String]) -> Result<u16, PoolError> {
        self.calls.lock().unwrap().push(message_id.to_string());
        self.answers.get(message_id).cloned().unwrap_or(Ok(223))
    }
}

/// Pool manager handing out one pool, or failing when there is none
pub struct StubPoolManager(pub Option<Arc<StubPool>>);

impl PoolManager for StubPoolManager {
    fn get_pool(&self) -> Result<Arc<dyn SegmentPool>, PoolError> {
        match &self.0 {
            Some(pool) => Ok(Arc::clone(pool) as Arc<dyn SegmentPool>),
            None => Err(PoolError::Unavailable("no pool configured".to_string())),
        }
    }
}

/// Enabled TLS provider entry with a small connection budget
pub fn provider(host: &str) -> ProviderConfig {
    let mut provider = ProviderConfig::new(host, host);
    provider.max_connections = 2;
    provider
}
