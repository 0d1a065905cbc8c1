//! Python bindings

use crate::condition::{self, ClassId, Condition, Packet};
use crate::config::ConsoleConfig;
use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

// ============================================================================
// Cached Configuration
// ============================================================================

/// Global cached configuration
static CACHED_CONFIG: OnceCell<Arc<RwLock<ConsoleConfig>>> = OnceCell::new();

fn current_config() -> ConsoleConfig {
    CACHED_CONFIG
        .get()
        .map(|config| config.read().clone())
        .unwrap_or_default()
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_addr(text: &str) -> PyResult<Ipv4Addr> {
    text.parse().map_err(|_| {
        pyo3::exceptions::PyValueError::new_err(format!("Invalid IPv4 address: {}", text))
    })
}

/// Decode `{class id: wire JSON}` into a lookup table
fn decode_classes(classes: HashMap<ClassId, String>) -> PyResult<AHashMap<ClassId, Condition>> {
    let mut table = AHashMap::with_capacity(classes.len());
    for (id, wire) in classes {
        table.insert(id, condition::decode_str(&wire)?);
    }
    Ok(table)
}

// ============================================================================
// Python Functions
// ============================================================================

/// Initialize the console configuration
///
/// # Arguments
/// * `config` - Optional dict with `raw_format` ("expression" | "yaml") and
///   `max_class_depth`; missing keys keep their defaults
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_config(config: Option<&Bound<'_, PyDict>>) -> PyResult<()> {
    let parsed = match config {
        Some(dict) => ConsoleConfig::from_py_dict(dict)?,
        None => ConsoleConfig::default(),
    };

    // If already initialized, update the config
    if let Some(existing) = CACHED_CONFIG.get() {
        let mut guard = existing.write();
        *guard = parsed;
    } else {
        let _ = CACHED_CONFIG.set(Arc::new(RwLock::new(parsed)));
    }

    Ok(())
}

/// Check if config is initialized
#[pyfunction]
fn is_config_initialized() -> bool {
    CACHED_CONFIG.get().is_some()
}

/// Render a wire-format condition (JSON string) as a class expression
#[pyfunction]
fn render_condition(wire_json: &str) -> PyResult<String> {
    let cond = condition::decode_str(wire_json)?;
    Ok(condition::render(&cond))
}

/// Parse a class expression into its wire format (JSON string)
#[pyfunction]
fn parse_class(expression: &str) -> PyResult<String> {
    let wire = condition::encode(&condition::parse(expression)?)?;
    Ok(wire.to_string())
}

#[pyfunction]
fn validate_cidr(text: &str) -> bool {
    condition::validate_cidr(text)
}

#[pyfunction]
fn validate_dscp(text: &str) -> bool {
    condition::validate_dscp(text)
}

/// Evaluate a wire-format condition against a packet
///
/// # Arguments
/// * `wire_json` - Condition in wire format
/// * `src`, `dst` - Dotted-quad IPv4 addresses
/// * `tos` - Type-of-service byte
/// * `classes` - Optional `{class id: wire JSON}` for `cls=` references
#[pyfunction]
#[pyo3(signature = (wire_json, src, dst, tos, classes=None))]
fn classify(
    wire_json: &str,
    src: &str,
    dst: &str,
    tos: u8,
    classes: Option<HashMap<ClassId, String>>,
) -> PyResult<bool> {
    let cond = condition::decode_str(wire_json)?;
    let packet = Packet::new(parse_addr(src)?, parse_addr(dst)?, tos);
    let table = decode_classes(classes.unwrap_or_default())?;
    let max_depth = current_config().max_class_depth;

    Ok(condition::check_with_limit(&cond, &packet, &table, max_depth))
}

/// Number of cached class expressions
#[pyfunction]
fn expression_cache_size() -> usize {
    condition::cache::cache_size()
}

#[pyfunction]
fn clear_expression_cache() {
    condition::cache::clear_cache()
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn traffic_class_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_config, m)?)?;
    m.add_function(wrap_pyfunction!(is_config_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(render_condition, m)?)?;
    m.add_function(wrap_pyfunction!(parse_class, m)?)?;
    m.add_function(wrap_pyfunction!(validate_cidr, m)?)?;
    m.add_function(wrap_pyfunction!(validate_dscp, m)?)?;
    m.add_function(wrap_pyfunction!(classify, m)?)?;
    m.add_function(wrap_pyfunction!(expression_cache_size, m)?)?;
    m.add_function(wrap_pyfunction!(clear_expression_cache, m)?)?;
    Ok(())
}

