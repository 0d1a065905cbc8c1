//! Condition evaluator

use crate::condition::ast::{ClassId, Condition, Ipv4Predicate};
use crate::condition::validate::parse_cidr;
use ahash::AHashMap;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Default limit on nested class references
pub const MAX_CLASS_DEPTH: usize = 16;

/// IPv4 header fields a condition can test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    /// Type-of-service byte; the DSCP is its upper six bits
    pub tos: u8,
}

impl Packet {
    pub fn new(src: Ipv4Addr, dst: Ipv4Addr, tos: u8) -> Self {
        Self { src, dst, tos }
    }

    #[inline]
    pub fn dscp(&self) -> u8 {
        self.tos >> 2
    }
}

/// Resolves `ClassMatch` references to the referenced class's condition
pub trait ClassLookup {
    fn condition(&self, id: ClassId) -> Option<&Condition>;
}

impl ClassLookup for AHashMap<ClassId, Condition> {
    fn condition(&self, id: ClassId) -> Option<&Condition> {
        self.get(&id)
    }
}

impl ClassLookup for HashMap<ClassId, Condition> {
    fn condition(&self, id: ClassId) -> Option<&Condition> {
        self.get(&id)
    }
}

/// Lookup with no classes; every reference evaluates to false
pub struct NoClasses;

impl ClassLookup for NoClasses {
    fn condition(&self, _id: ClassId) -> Option<&Condition> {
        None
    }
}

/// Evaluate a condition against a packet
pub fn check(cond: &Condition, packet: &Packet, classes: &impl ClassLookup) -> bool {
    check_with_limit(cond, packet, classes, MAX_CLASS_DEPTH)
}

/// Evaluate with an explicit limit on nested class references.
///
/// A reference chain longer than `max_depth`, or one that comes back to a
/// class already being evaluated, makes the whole check false. Every child of
/// a combinator is visited so the outcome does not depend on child order.
pub fn check_with_limit(
    cond: &Condition,
    packet: &Packet,
    classes: &impl ClassLookup,
    max_depth: usize,
) -> bool {
    let mut visiting = SmallVec::new();
    check_at(cond, packet, classes, max_depth, &mut visiting).unwrap_or(false)
}

/// `None` when a class reference could not be resolved to a finite tree
fn check_at(
    cond: &Condition,
    packet: &Packet,
    classes: &impl ClassLookup,
    budget: usize,
    visiting: &mut SmallVec<[ClassId; 8]>,
) -> Option<bool> {
    match cond {
        Condition::AllOf(conds) => {
            let mut all = true;
            for c in conds {
                all &= check_at(c, packet, classes, budget, visiting)?;
            }
            Some(all)
        }
        Condition::AnyOf(conds) => {
            let mut any = false;
            for c in conds {
                any |= check_at(c, packet, classes, budget, visiting)?;
            }
            Some(any)
        }
        Condition::Not(Some(operand)) => {
            check_at(operand, packet, classes, budget, visiting).map(|matched| !matched)
        }
        // Incomplete trees never match
        Condition::Not(None) => Some(false),
        Condition::Bool(value) => Some(*value),
        Condition::Ipv4Match(predicate) => Some(check_predicate(predicate, packet)),
        Condition::ClassMatch(None) => Some(false),
        Condition::ClassMatch(Some(id)) => {
            if visiting.contains(id) {
                tracing::debug!(class = id, "class reference cycle");
                return None;
            }
            if budget == 0 {
                tracing::debug!(class = id, "class reference depth exhausted");
                return None;
            }
            let Some(referenced) = classes.condition(*id) else {
                return Some(false);
            };
            visiting.push(*id);
            let matched = check_at(referenced, packet, classes, budget - 1, visiting);
            visiting.pop();
            matched
        }
    }
}

fn check_predicate(predicate: &Ipv4Predicate, packet: &Packet) -> bool {
    match predicate {
        Ipv4Predicate::MatchSource(net) => parse_cidr(net)
            .map(|net| net.contains(&packet.src))
            .unwrap_or(false),
        Ipv4Predicate::MatchDestination(net) => parse_cidr(net)
            .map(|net| net.contains(&packet.dst))
            .unwrap_or(false),
        Ipv4Predicate::MatchDscp(Some(dscp)) => packet.dscp() == *dscp,
        Ipv4Predicate::MatchDscp(None) => false,
    }
}
