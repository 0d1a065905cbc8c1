//! Leaf value validation for CIDR blocks and DSCP code points

use crate::condition::ast::{Condition, Ipv4Predicate};
use crate::error::ValidationError;
use ipnet::Ipv4Net;
use once_cell::sync::Lazy;
use regex::Regex;

/// Largest DSCP value accepted by the editor
pub const DSCP_MAX: u8 = 64;

static DSCP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x([0-9a-fA-F]+)$").expect("DSCP pattern is valid"));

/// Parse an IPv4 CIDR block such as `192.168.0.0/24`
pub fn parse_cidr(text: &str) -> Result<Ipv4Net, ValidationError> {
    text.parse::<Ipv4Net>()
        .map_err(|_| ValidationError::InvalidCidr(text.to_string()))
}

/// Parse a `0x`-prefixed hex DSCP value in [0, 64]
pub fn parse_dscp(text: &str) -> Result<u8, ValidationError> {
    let caps = DSCP_PATTERN
        .captures(text)
        .ok_or_else(|| ValidationError::InvalidDscp(text.to_string()))?;
    let digits = caps[1].trim_start_matches('0');
    // Anything longer than 16 hex digits cannot fit in a u64 and is out of range anyway
    if digits.len() > 16 {
        return Err(ValidationError::DscpOutOfRange(u64::MAX));
    }
    let value = if digits.is_empty() {
        0
    } else {
        u64::from_str_radix(digits, 16)
            .map_err(|_| ValidationError::InvalidDscp(text.to_string()))?
    };
    check_dscp_range(value)
}

/// Range check shared by the hex and integer wire forms
pub fn check_dscp_range(value: u64) -> Result<u8, ValidationError> {
    if value > u64::from(DSCP_MAX) {
        return Err(ValidationError::DscpOutOfRange(value));
    }
    Ok(value as u8)
}

#[inline]
pub fn validate_cidr(text: &str) -> bool {
    parse_cidr(text).is_ok()
}

#[inline]
pub fn validate_dscp(text: &str) -> bool {
    parse_dscp(text).is_ok()
}

/// Collect every leaf that would be rejected when persisted.
///
/// Unset class references and DSCP values are reported as well as
/// malformed networks and empty NOT operands.
pub fn issues(cond: &Condition) -> Vec<String> {
    let mut out = Vec::new();
    collect_issues(cond, &mut String::from("$"), &mut out);
    out
}

fn collect_issues(cond: &Condition, at: &mut String, out: &mut Vec<String>) {
    match cond {
        Condition::AllOf(conds) | Condition::AnyOf(conds) => {
            for (i, child) in conds.iter().enumerate() {
                let len = at.len();
                at.push_str(&format!("/{}", i));
                collect_issues(child, at, out);
                at.truncate(len);
            }
        }
        Condition::Not(None) => out.push(format!("{}: NOT without operand", at)),
        Condition::Not(Some(operand)) => {
            let len = at.len();
            at.push_str("/0");
            collect_issues(operand, at, out);
            at.truncate(len);
        }
        Condition::Bool(_) => {}
        Condition::ClassMatch(None) => out.push(format!("{}: class reference unset", at)),
        Condition::ClassMatch(Some(_)) => {}
        Condition::Ipv4Match(Ipv4Predicate::MatchSource(net))
        | Condition::Ipv4Match(Ipv4Predicate::MatchDestination(net)) => {
            if let Err(e) = parse_cidr(net) {
                out.push(format!("{}: {}", at, e));
            }
        }
        Condition::Ipv4Match(Ipv4Predicate::MatchDscp(None)) => {
            out.push(format!("{}: DSCP unset", at))
        }
        Condition::Ipv4Match(Ipv4Predicate::MatchDscp(Some(_))) => {}
    }
}
