//! Model-backed oracle: a remote or local decision service behind a
//! pluggable transport.
//!
//! # Wire format
//!
//! Request (`POST`, JSON):
//!
//! ```json
//! { "context": ["GATHER_FOOD"], "agents": [ { "agent": 3, "role": "FARMER", "needs": { ... }, ... } ] }
//! ```
//!
//! Response:
//!
//! ```json
//! { "decisions": [ { "agent": 3, "intent": "EAT" } ] }
//! ```
//!
//! Intent tokens outside the closed vocabulary read as `IDLE`.  An agent
//! missing from the response gets the rule-table answer for that agent only;
//! a response that does not parse at all degrades the whole batch.
//!
//! # Time bound
//!
//! The transport call runs on a helper thread and is abandoned after
//! `timeout`.  The oracle never retries inside a call; a timeout or transport
//! error marks it unavailable until the next availability recheck.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use hive_agent::AgentSituation;
use hive_core::{duration_ms, AgentId, Intent, Millis, OracleConfig};

use crate::{Decision, DecisionOracle, DecisionSource, OracleError, OracleResult, OracleStats, RuleTable};

// ── Transport ─────────────────────────────────────────────────────────────────

/// Moves one JSON request to the decision service and back.
///
/// Implementations may block; [`ModelOracle`] enforces the time bound itself.
pub trait OracleTransport: Send + Sync + 'static {
    fn complete(&self, request: &str, timeout: Duration) -> OracleResult<String>;

    /// Cheap health probe used by availability rechecks.
    fn probe(&self, timeout: Duration) -> bool;
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DecideRequest<'a> {
    context: &'a [String],
    agents: &'a [AgentSituation],
}

#[derive(Deserialize)]
struct DecideResponse {
    decisions: Vec<WireDecision>,
}

#[derive(Deserialize)]
struct WireDecision {
    agent: AgentId,
    intent: String,
}

// ── ModelOracle ───────────────────────────────────────────────────────────────

pub struct ModelOracle {
    transport: Arc<dyn OracleTransport>,
    timeout: Duration,
    recheck: Duration,
    fallback: RuleTable,
    available: bool,
    next_probe: Millis,
    latencies: VecDeque<u64>,
    latency_window: usize,
    stats: OracleStats,
}

impl ModelOracle {
    pub fn new(transport: impl OracleTransport, cfg: &OracleConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            timeout: cfg.timeout(),
            recheck: cfg.availability_recheck(),
            fallback: RuleTable::default(),
            available: true,
            next_probe: Millis(0),
            latencies: VecDeque::with_capacity(cfg.latency_window),
            latency_window: cfg.latency_window.max(1),
            stats: OracleStats { available: true, ..OracleStats::default() },
        }
    }

    fn mark_unavailable(&mut self, now: Millis) {
        self.available = false;
        self.stats.available = false;
        self.next_probe = now + self.recheck;
    }

    fn record_latency(&mut self, elapsed: Duration) {
        if self.latencies.len() == self.latency_window {
            self.latencies.pop_front();
        }
        self.latencies.push_back(duration_ms(elapsed));
        let sum: u64 = self.latencies.iter().sum();
        self.stats.avg_latency_ms = sum as f64 / self.latencies.len() as f64;
    }

    /// One bounded round trip.  Never retries.
    fn call(&self, body: String) -> OracleResult<String> {
        let (tx, rx) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;
        thread::Builder::new()
            .name("hive-oracle-call".into())
            .spawn(move || {
                // The receiver is gone if the call was abandoned.
                let _ = tx.send(transport.complete(&body, timeout));
            })
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(OracleError::Timeout(duration_ms(timeout))),
            Err(RecvTimeoutError::Disconnected) => {
                Err(OracleError::Transport("transport thread exited without a reply".into()))
            }
        }
    }

    fn fallback_all(&mut self, batch: &[AgentSituation], cause: &OracleError) -> Vec<Decision> {
        warn!("oracle batch of {} fell back to rules: {cause}", batch.len());
        self.stats.fallbacks += 1;
        self.fallback.decide_all(batch, DecisionSource::Fallback)
    }

    fn merge(&mut self, batch: &[AgentSituation], response: DecideResponse) -> Vec<Decision> {
        let mut answers: HashMap<AgentId, Intent> = HashMap::with_capacity(response.decisions.len());
        for d in response.decisions {
            if !Intent::is_known_token(&d.intent) {
                debug!("oracle returned unknown intent {:?} for {}; using IDLE", d.intent, d.agent);
            }
            answers.entry(d.agent).or_insert_with(|| Intent::parse_token(&d.intent));
        }

        let mut missing = 0usize;
        let decisions = batch
            .iter()
            .map(|s| match answers.get(&s.agent) {
                Some(&intent) => Decision { agent: s.agent, intent, source: DecisionSource::Oracle },
                None => {
                    missing += 1;
                    Decision { agent: s.agent, intent: self.fallback.intent_for(s), source: DecisionSource::Fallback }
                }
            })
            .collect();
        if missing > 0 {
            warn!("oracle response omitted {missing} of {} agents; rules filled the gaps", batch.len());
        }
        decisions
    }
}

impl DecisionOracle for ModelOracle {
    fn name(&self) -> &str {
        "model"
    }

    fn decide(&mut self, batch: &[AgentSituation], context: &[String], now: Millis) -> Vec<Decision> {
        if batch.is_empty() {
            return Vec::new();
        }
        if !self.is_available(now) {
            return self.fallback_all(batch, &OracleError::Unavailable);
        }

        let body = match serde_json::to_string(&DecideRequest { context, agents: batch }) {
            Ok(body) => body,
            Err(e) => return self.fallback_all(batch, &OracleError::Json(e)),
        };

        self.stats.calls += 1;
        let started = Instant::now();
        let reply = self.call(body);
        self.record_latency(started.elapsed());

        match reply {
            Ok(text) => match serde_json::from_str::<DecideResponse>(&text) {
                Ok(response) => self.merge(batch, response),
                Err(e) => {
                    self.stats.malformed += 1;
                    self.fallback_all(batch, &OracleError::Malformed(e.to_string()))
                }
            },
            Err(err) => {
                if matches!(err, OracleError::Timeout(_)) {
                    self.stats.timeouts += 1;
                }
                self.mark_unavailable(now);
                self.fallback_all(batch, &err)
            }
        }
    }

    fn is_available(&mut self, now: Millis) -> bool {
        if !self.available && now >= self.next_probe {
            if self.transport.probe(self.timeout) {
                debug!("oracle probe succeeded; marking available");
                self.available = true;
                self.stats.available = true;
            } else {
                self.next_probe = now + self.recheck;
            }
        }
        self.available
    }

    fn stats(&self) -> OracleStats {
        self.stats.clone()
    }
}

// ── HTTP transport ────────────────────────────────────────────────────────────

/// Blocking HTTP transport: `POST <endpoint>/decide`, `GET <endpoint>/health`.
#[cfg(feature = "http")]
pub struct HttpTransport {
    endpoint: String,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_owned();
        Self { endpoint }
    }

    fn agent(timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build()
    }
}

#[cfg(feature = "http")]
impl OracleTransport for HttpTransport {
    fn complete(&self, request: &str, timeout: Duration) -> OracleResult<String> {
        let response = Self::agent(timeout)
            .post(&format!("{}/decide", self.endpoint))
            .set("content-type", "application/json")
            .send_string(request);
        match response {
            Ok(resp) => resp.into_string().map_err(|e| OracleError::Transport(e.to_string())),
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Err(OracleError::Transport(format!("status {code}: {text}")))
            }
            Err(err) => Err(OracleError::Transport(err.to_string())),
        }
    }

    fn probe(&self, timeout: Duration) -> bool {
        Self::agent(timeout)
            .get(&format!("{}/health", self.endpoint))
            .call()
            .is_ok()
    }
}
