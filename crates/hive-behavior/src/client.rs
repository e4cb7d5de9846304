//! `OracleClient`: the cache in front of an oracle, with panic isolation.

use std::panic::{self, AssertUnwindSafe};

use log::{error, warn};

use hive_agent::AgentSituation;
use hive_core::{DecisionConfig, Millis};

use crate::{
    AggregateContext, CacheStats, Decision, DecisionCache, DecisionOracle, DecisionSource,
    Fingerprint, OracleStats, RuleTable,
};

/// What the scheduler talks to.
///
/// Fresh cache hits never reach the oracle.  Only real answers
/// ([`DecisionSource::is_cacheable`]) are stored.  A panicking oracle is
/// contained: the affected batch gets rule-table fallbacks and the panic is
/// logged.
pub struct OracleClient {
    oracle: Box<dyn DecisionOracle>,
    cache: DecisionCache,
    fallback: RuleTable,
    panics: u64,
}

impl OracleClient {
    pub fn new(oracle: Box<dyn DecisionOracle>, cfg: &DecisionConfig) -> Self {
        Self {
            oracle,
            cache: DecisionCache::new(cfg.cache_ttl(), cfg.cache_capacity),
            fallback: RuleTable::default(),
            panics: 0,
        }
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    pub fn decide(&mut self, batch: &[AgentSituation], context: &[String], now: Millis) -> Vec<Decision> {
        let mut out: Vec<Option<Decision>> = vec![None; batch.len()];
        let mut misses: Vec<usize> = Vec::new();

        for (i, s) in batch.iter().enumerate() {
            match self.cache.get(&Fingerprint::of(s), now) {
                Some(intent) => out[i] = Some(Decision { agent: s.agent, intent, source: DecisionSource::Cache }),
                None => misses.push(i),
            }
        }

        if !misses.is_empty() {
            let pending: Vec<AgentSituation> = misses.iter().map(|&i| batch[i].clone()).collect();
            let answers = self.ask_oracle(&pending, context, now);
            for (&i, d) in misses.iter().zip(answers) {
                if d.source.is_cacheable() {
                    self.cache.insert(Fingerprint::of(&batch[i]), d.intent, now);
                }
                out[i] = Some(d);
            }
        }

        batch
            .iter()
            .zip(out)
            .map(|(s, d)| match d {
                Some(d) if d.agent == s.agent => d,
                _ => Decision { agent: s.agent, intent: self.fallback.intent_for(s), source: DecisionSource::Fallback },
            })
            .collect()
    }

    /// Oracle call with panic isolation and a length check on the result.
    fn ask_oracle(&mut self, batch: &[AgentSituation], context: &[String], now: Millis) -> Vec<Decision> {
        let oracle = &mut self.oracle;
        let result = panic::catch_unwind(AssertUnwindSafe(|| oracle.decide(batch, context, now)));
        match result {
            Ok(decisions) if decisions.len() == batch.len() => decisions,
            Ok(decisions) => {
                warn!(
                    "oracle '{}' returned {} decisions for {} agents; using rules",
                    self.oracle.name(),
                    decisions.len(),
                    batch.len(),
                );
                self.fallback.decide_all(batch, DecisionSource::Fallback)
            }
            Err(payload) => {
                self.panics += 1;
                error!("oracle '{}' panicked: {}; batch degraded to rules", self.oracle.name(), panic_message(&payload));
                self.fallback.decide_all(batch, DecisionSource::Fallback)
            }
        }
    }

    pub fn advise(&mut self, aggregate: &AggregateContext) -> Vec<String> {
        let oracle = &mut self.oracle;
        match panic::catch_unwind(AssertUnwindSafe(|| oracle.advise(aggregate))) {
            Ok(advice) => advice,
            Err(payload) => {
                self.panics += 1;
                error!("oracle '{}' panicked in advise: {}", self.oracle.name(), panic_message(&payload));
                crate::rules::advise(aggregate)
            }
        }
    }

    pub fn is_available(&mut self, now: Millis) -> bool {
        self.oracle.is_available(now)
    }

    pub fn oracle_stats(&self) -> OracleStats {
        self.oracle.stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn panics(&self) -> u64 {
        self.panics
    }

    pub fn purge_cache(&mut self, now: Millis) -> usize {
        self.cache.purge_expired(now)
    }

    pub fn evict_cache(&mut self) -> usize {
        self.cache.evict_all()
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
