//! Class expression parse cache

use crate::condition::ast::Condition;
use crate::condition::evaluator::{self, ClassLookup, Packet};
use crate::condition::parser;
use crate::error::Result;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Global expression cache keyed by the trimmed expression text
static EXPRESSION_CACHE: Lazy<RwLock<AHashMap<String, Condition>>> = Lazy::new(|| {
    let map = AHashMap::with_capacity(256);
    RwLock::new(map)
});

/// Get or parse a class expression, using the cache for repeated expressions
#[inline]
pub fn get_or_parse(expression: &str) -> Result<Condition> {
    let expression = expression.trim();

    {
        let cache = EXPRESSION_CACHE.read();
        if let Some(cond) = cache.get(expression) {
            return Ok(cond.clone());
        }
    }

    tracing::debug!(expression, "class expression cache miss");
    let cond = parser::parse(expression)?;

    {
        let mut cache = EXPRESSION_CACHE.write();
        cache.insert(expression.to_string(), cond.clone());
    }

    Ok(cond)
}

/// Check an expression against a packet, using the cached tree.
///
/// An empty expression matches every packet.
#[inline]
pub fn check_expression(
    expression: &str,
    packet: &Packet,
    classes: &impl ClassLookup,
) -> Result<bool> {
    if expression.trim().is_empty() {
        return Ok(true);
    }

    let cond = get_or_parse(expression)?;
    Ok(evaluator::check(&cond, packet, classes))
}

/// Clear the expression cache
pub fn clear_cache() {
    let mut cache = EXPRESSION_CACHE.write();
    cache.clear();
}

pub fn cache_size() -> usize {
    let cache = EXPRESSION_CACHE.read();
    cache.len()
}
