//! Participant resolution: free-text names to directory identities.
//!
//! Strategy per name, cache-first:
//! 1. exact directory search, with a full-name short-circuit
//! 2. fallback: prefix search on the longest token (≥3 chars), else a
//!    surname-initial search
//! 3. decision ladder over the candidate set: fuzzy matcher, then the
//!    disambiguation oracle for large sets, then a structured ambiguous
//!    outcome for the caller to present
//!
//! Batches resolve concurrently and fail fast: booking logic must never
//! act on a silently incomplete attendee list.

pub mod cache;
pub mod matcher;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::error::GatewayError;
use crate::gateway::{DirectoryGateway, DisambiguationOracle};
use crate::types::{AmbiguousName, Confidence, Identity};
use crate::util::{longest_token, normalize_term};

use self::cache::ResultCache;
use self::matcher::{find_best_match, FuzzyScorer, MatchConfig, NameScorer};

/// Words a requester uses to mean themselves.
const SELF_MARKERS: &[&str] = &["me", "я", "мене", "мною"];

/// Result of resolving one name.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// One confident identity.
    Resolved(Identity),
    /// Several plausible candidates; the caller has to ask.
    Ambiguous {
        term: String,
        candidates: Vec<Identity>,
    },
    /// No candidate survived any strategy.
    Failed { reason: String },
}

/// Result of resolving a whole participant list.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Every name resolved. Identities are in input order, self-references
    /// first.
    Resolved(Vec<Identity>),
    /// At least one name needs a human pick. Everything already resolved is
    /// kept so the caller can ask only about the pending names.
    Ambiguous {
        resolved: Vec<Identity>,
        pending: Vec<AmbiguousName>,
    },
    /// A name was not found or a gateway failed; the whole batch aborts.
    Failed { message: String },
}

/// How a participant entry should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    Name,
    SelfReference,
}

/// One entry of a participant list, as extracted by the intent pipeline.
#[derive(Debug, Clone)]
pub struct ParticipantRef {
    pub name: String,
    pub kind: ParticipantKind,
}

impl ParticipantRef {
    pub fn name(name: impl Into<String>) -> Self {
        ParticipantRef {
            name: name.into(),
            kind: ParticipantKind::Name,
        }
    }

    pub fn self_reference() -> Self {
        ParticipantRef {
            name: String::new(),
            kind: ParticipantKind::SelfReference,
        }
    }

    fn is_self(&self) -> bool {
        self.kind == ParticipantKind::SelfReference
            || SELF_MARKERS.contains(&self.name.trim().to_lowercase().as_str())
    }
}

/// Tunables for the resolution ladder.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Result cap for the exact search.
    pub exact_limit: usize,
    /// Result cap for the fallback searches.
    pub fallback_limit: usize,
    /// Most candidates ever shown in an ambiguous outcome.
    pub shortlist_max: usize,
    /// Most candidates ever passed to the oracle.
    pub oracle_max: usize,
    /// Minimum token length for the prefix fallback.
    pub min_prefix_len: usize,
    pub match_config: MatchConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            exact_limit: 5,
            fallback_limit: 20,
            shortlist_max: 10,
            oracle_max: 20,
            min_prefix_len: 3,
            match_config: MatchConfig::default(),
        }
    }
}

/// Resolves free-text names against the directory, with fuzzy matching,
/// optional AI disambiguation, and result caching.
pub struct ParticipantResolver {
    directory: Arc<dyn DirectoryGateway>,
    oracle: Option<Arc<dyn DisambiguationOracle>>,
    cache: Option<ResultCache>,
    scorer: Box<dyn NameScorer>,
    config: ResolverConfig,
}

impl ParticipantResolver {
    pub fn new(directory: Arc<dyn DirectoryGateway>) -> Self {
        ParticipantResolver {
            directory,
            oracle: None,
            cache: Some(ResultCache::with_defaults()),
            scorer: Box::new(FuzzyScorer),
            config: ResolverConfig::default(),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn DisambiguationOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Replace the cache, or disable caching entirely with `None`.
    pub fn with_cache(mut self, cache: Option<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn NameScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve a single free-text name.
    ///
    /// Every outcome, including ambiguity and not-found, is cached under
    /// the normalized term, so repeated bad input does not hammer the
    /// directory. Gateway errors are not cached.
    pub async fn resolve_one(&self, name: &str) -> Result<SearchOutcome, GatewayError> {
        let key = normalize_term(name);
        if key.is_empty() {
            return Ok(SearchOutcome::Failed {
                reason: "Порожнє ім'я учасника".to_string(),
            });
        }

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                log::debug!("cache hit for '{name}'");
                return Ok(hit);
            }
        }

        let outcome = self.search_directory(name).await?;
        if let Some(cache) = &self.cache {
            cache.insert(&key, outcome.clone());
        }
        Ok(outcome)
    }

    /// Resolve a participant list.
    ///
    /// Self-references resolve first through a direct id lookup. The
    /// remaining names are deduplicated by normalized term and resolved
    /// concurrently; results are reassembled in input order. A not-found
    /// name or a gateway error aborts the whole batch.
    pub async fn resolve_many(
        &self,
        participants: &[ParticipantRef],
        requester_id: Option<&str>,
    ) -> BatchOutcome {
        let mut resolved: Vec<Identity> = Vec::new();
        let mut names: Vec<&str> = Vec::new();

        for participant in participants {
            if participant.is_self() {
                match requester_id {
                    Some(id) => match self.directory.get_by_id(id).await {
                        Ok(identity) => resolved.push(identity),
                        Err(err) => log::warn!("self lookup failed for requester {id}: {err}"),
                    },
                    None => log::warn!("self reference without requester id, skipping"),
                }
            } else {
                names.push(participant.name.as_str());
            }
        }

        // Deduplicate before the fan-out so a repeated name shares one
        // resolution instead of racing the cache with parallel lookups.
        let mut unique: Vec<&str> = Vec::new();
        let mut slot_of: Vec<usize> = Vec::with_capacity(names.len());
        let mut slot_by_key: HashMap<String, usize> = HashMap::new();
        for name in &names {
            let key = normalize_term(name);
            let next_slot = unique.len();
            let slot = *slot_by_key.entry(key).or_insert_with(|| {
                unique.push(*name);
                next_slot
            });
            slot_of.push(slot);
        }

        let results = join_all(unique.iter().copied().map(|name| self.resolve_one(name))).await;

        let mut pending: Vec<AmbiguousName> = Vec::new();
        for (position, name) in names.iter().enumerate() {
            match &results[slot_of[position]] {
                Ok(SearchOutcome::Resolved(identity)) => resolved.push(identity.clone()),
                Ok(SearchOutcome::Ambiguous { candidates, .. }) => pending.push(AmbiguousName {
                    search_term: (*name).to_string(),
                    candidates: candidates.clone(),
                }),
                Ok(SearchOutcome::Failed { reason }) => {
                    return BatchOutcome::Failed {
                        message: reason.clone(),
                    };
                }
                Err(err) => {
                    log::error!("participant resolution failed for '{name}': {err}");
                    return BatchOutcome::Failed {
                        message: format!("Помилка пошуку користувача: {err}"),
                    };
                }
            }
        }

        if pending.is_empty() {
            BatchOutcome::Resolved(resolved)
        } else {
            BatchOutcome::Ambiguous { resolved, pending }
        }
    }

    async fn search_directory(&self, name: &str) -> Result<SearchOutcome, GatewayError> {
        let candidates = self
            .directory
            .search_by_name(name, self.config.exact_limit)
            .await?;

        if candidates.len() == 1 && is_exact_match(name, &candidates[0]) {
            log::info!("exact match for '{name}': {}", candidates[0].display_name);
            return Ok(SearchOutcome::Resolved(candidates[0].clone()));
        }

        let candidates = if candidates.is_empty() {
            log::info!("exact search empty for '{name}', trying fallback");
            self.fallback_search(name).await?
        } else {
            candidates
        };

        self.resolve_candidates(name, candidates).await
    }

    /// Prefix search on the longest token; surname initial as last resort
    /// for short terms or a failing prefix query.
    async fn fallback_search(&self, name: &str) -> Result<Vec<Identity>, GatewayError> {
        let token = longest_token(name);
        if token.chars().count() >= self.config.min_prefix_len {
            match self
                .directory
                .search_by_prefix(token, self.config.fallback_limit)
                .await
            {
                Ok(found) => return Ok(found),
                Err(err) => {
                    log::warn!(
                        "prefix search failed for '{token}': {err}, trying surname initial"
                    );
                }
            }
        }
        self.directory
            .search_by_surname_initial(name, self.config.fallback_limit)
            .await
    }

    /// Decision ladder over a candidate set.
    async fn resolve_candidates(
        &self,
        name: &str,
        candidates: Vec<Identity>,
    ) -> Result<SearchOutcome, GatewayError> {
        if candidates.is_empty() {
            return Ok(not_found(name));
        }
        if candidates.len() == 1 {
            return Ok(SearchOutcome::Resolved(candidates[0].clone()));
        }

        if let Some(winner) = find_best_match(
            name,
            &candidates,
            self.config.match_config,
            self.scorer.as_ref(),
        ) {
            log::info!("fuzzy match for '{name}': {}", winner.display_name);
            return Ok(SearchOutcome::Resolved(winner));
        }

        if candidates.len() > self.config.shortlist_max {
            if let Some(pick) = self.consult_oracle(name, &candidates).await {
                return Ok(SearchOutcome::Resolved(pick));
            }
        }

        let mut shortlist = candidates;
        shortlist.truncate(self.config.shortlist_max);
        Ok(SearchOutcome::Ambiguous {
            term: name.to_string(),
            candidates: shortlist,
        })
    }

    /// Ask the oracle; only a high-confidence pick is accepted. Errors and
    /// hedges degrade to the ambiguous branch.
    async fn consult_oracle(&self, name: &str, candidates: &[Identity]) -> Option<Identity> {
        let oracle = self.oracle.as_ref()?;
        let shortlist = &candidates[..candidates.len().min(self.config.oracle_max)];
        match oracle.select_best_match(name, shortlist).await {
            Ok(Some(selection)) if selection.confidence == Confidence::High => {
                log::info!(
                    "oracle selected {} for '{name}'",
                    selection.identity.display_name
                );
                Some(selection.identity)
            }
            Ok(Some(selection)) => {
                log::debug!(
                    "oracle pick for '{name}' not confident enough ({:?})",
                    selection.confidence
                );
                None
            }
            Ok(None) => None,
            Err(err) => {
                log::warn!("oracle selection failed for '{name}': {err}");
                None
            }
        }
    }
}

/// A single exact-search hit counts as exact only when the query is a full
/// name (two or more tokens) and every token appears in the display name.
fn is_exact_match(name: &str, candidate: &Identity) -> bool {
    let tokens: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
    if tokens.len() < 2 {
        return false;
    }
    let display = candidate.display_name.to_lowercase();
    tokens.iter().all(|token| display.contains(token.as_str()))
}

fn not_found(name: &str) -> SearchOutcome {
    SearchOutcome::Failed {
        reason: format!("Користувача '{name}' не знайдено"),
    }
}
