//! Compiled-pattern cache
//!
//! Every regex-based trigger resolves its pattern through this cache, so a
//! pattern string shared by many rules across many guilds is compiled once
//! and reused until its entry expires. The cache is constructed at engine
//! start-up and injected into every evaluation rather than living in global
//! state.

use crate::CACHE_TARGET;
use crate::automod::{EngineError, EngineResult};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a compiled pattern stays valid before the next fetch recompiles.
pub const PATTERN_TTL: Duration = Duration::from_secs(10 * 60);

/// Compiled patterns above this size are rejected at build time.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

struct CachedPattern {
    regex: Arc<Regex>,
    compiled_at: Instant,
}

/// Concurrency-safe pattern-string -> compiled-matcher cache with a TTL.
pub struct RegexCache {
    patterns: DashMap<String, CachedPattern>,
    ttl: Duration,
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexCache {
    /// Create a cache with the production TTL
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(PATTERN_TTL)
    }

    /// Create a cache with a custom TTL
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            patterns: DashMap::new(),
            ttl,
        }
    }

    /// Fetch the compiled matcher for `pattern`, compiling it on a miss or
    /// after expiry. Concurrent callers for the same key compile at most
    /// once; the entry lock covers the compile-and-insert.
    ///
    /// # Errors
    /// Returns `EngineError::Pattern` if the pattern does not compile.
    /// Callers treat that as a non-match rather than propagating it.
    pub fn get_or_compile(&self, pattern: &str) -> EngineResult<Arc<Regex>> {
        // Fast path: live entry, shared read lock only
        if let Some(entry) = self.patterns.get(pattern) {
            if entry.compiled_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&entry.regex));
            }
        }

        match self.patterns.entry(pattern.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().compiled_at.elapsed() < self.ttl {
                    // Another caller refreshed it while we waited for the lock
                    return Ok(Arc::clone(&occupied.get().regex));
                }
                let regex = compile(pattern)?;
                debug!(target: CACHE_TARGET, pattern = %pattern, "Recompiled expired pattern");
                occupied.insert(CachedPattern {
                    regex: Arc::clone(&regex),
                    compiled_at: Instant::now(),
                });
                Ok(regex)
            }
            Entry::Vacant(vacant) => {
                let regex = compile(pattern)?;
                debug!(target: CACHE_TARGET, pattern = %pattern, "Compiled new pattern");
                vacant.insert(CachedPattern {
                    regex: Arc::clone(&regex),
                    compiled_at: Instant::now(),
                });
                Ok(regex)
            }
        }
    }

    /// Number of cached patterns, live or expired
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the cache holds no patterns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(pattern: &str) -> EngineResult<Arc<Regex>> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map(Arc::new)
        .map_err(|e| EngineError::pattern(pattern, e))
}
