//! Condition tree node model

use std::fmt;

/// Identifier of a traffic class record
pub type ClassId = u32;

/// Discriminant of a condition or IPv4 predicate node.
///
/// `as_str` is the node's key in the JSON wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    CondAllOf,
    CondAnyOf,
    CondNot,
    CondBool,
    CondIpv4,
    CondClass,
    MatchSource,
    MatchDestination,
    MatchDscp,
}

impl Tag {
    /// Every tag accepted at condition level
    pub const ALL: [Tag; 9] = [
        Tag::CondAllOf,
        Tag::CondAnyOf,
        Tag::CondNot,
        Tag::CondBool,
        Tag::CondIpv4,
        Tag::CondClass,
        Tag::MatchSource,
        Tag::MatchDestination,
        Tag::MatchDscp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::CondAllOf => "CondAllOf",
            Tag::CondAnyOf => "CondAnyOf",
            Tag::CondNot => "CondNot",
            Tag::CondBool => "CondBool",
            Tag::CondIpv4 => "CondIPv4",
            Tag::CondClass => "CondClass",
            Tag::MatchSource => "MatchSource",
            Tag::MatchDestination => "MatchDestination",
            Tag::MatchDscp => "MatchDSCP",
        }
    }

    /// Look up a wire key
    pub fn from_key(key: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == key)
    }

    /// True for the three IPv4 predicate tags
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            Tag::MatchSource | Tag::MatchDestination | Tag::MatchDscp
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// True iff every child is true
    AllOf(Vec<Condition>),
    /// True iff any child is true
    AnyOf(Vec<Condition>),
    /// Negation. `None` only exists while the tree is being edited.
    Not(Option<Box<Condition>>),
    /// Constant leaf
    Bool(bool),
    /// Single IPv4 header predicate
    Ipv4Match(Ipv4Predicate),
    /// True iff the packet already matches the referenced traffic class
    ClassMatch(Option<ClassId>),
}

/// IPv4 header predicate held by [`Condition::Ipv4Match`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ipv4Predicate {
    /// Source address within a CIDR block. Empty while unset.
    MatchSource(String),
    /// Destination address within a CIDR block. Empty while unset.
    MatchDestination(String),
    /// DSCP code point
    MatchDscp(Option<u8>),
}

impl Ipv4Predicate {
    pub fn tag(&self) -> Tag {
        match self {
            Ipv4Predicate::MatchSource(_) => Tag::MatchSource,
            Ipv4Predicate::MatchDestination(_) => Tag::MatchDestination,
            Ipv4Predicate::MatchDscp(_) => Tag::MatchDscp,
        }
    }
}

impl Condition {
    pub fn tag(&self) -> Tag {
        match self {
            Condition::AllOf(_) => Tag::CondAllOf,
            Condition::AnyOf(_) => Tag::CondAnyOf,
            Condition::Not(_) => Tag::CondNot,
            Condition::Bool(_) => Tag::CondBool,
            Condition::Ipv4Match(_) => Tag::CondIpv4,
            Condition::ClassMatch(_) => Tag::CondClass,
        }
    }

    pub fn all_of(conds: impl IntoIterator<Item = Condition>) -> Self {
        Condition::AllOf(conds.into_iter().collect())
    }

    pub fn any_of(conds: impl IntoIterator<Item = Condition>) -> Self {
        Condition::AnyOf(conds.into_iter().collect())
    }

    pub fn not(operand: Condition) -> Self {
        Condition::Not(Some(Box::new(operand)))
    }

    pub fn source(net: impl Into<String>) -> Self {
        Condition::Ipv4Match(Ipv4Predicate::MatchSource(net.into()))
    }

    pub fn destination(net: impl Into<String>) -> Self {
        Condition::Ipv4Match(Ipv4Predicate::MatchDestination(net.into()))
    }

    pub fn dscp(dscp: u8) -> Self {
        Condition::Ipv4Match(Ipv4Predicate::MatchDscp(Some(dscp)))
    }

    pub fn class(id: ClassId) -> Self {
        Condition::ClassMatch(Some(id))
    }

    /// True if a `ClassMatch` anywhere in the tree points at `id`
    pub fn references_class(&self, id: ClassId) -> bool {
        match self {
            Condition::ClassMatch(target) => *target == Some(id),
            _ => self.children().iter().any(|c| c.references_class(id)),
        }
    }

    /// Direct children in display order
    pub fn children(&self) -> &[Condition] {
        match self {
            Condition::AllOf(conds) | Condition::AnyOf(conds) => conds,
            Condition::Not(Some(operand)) => std::slice::from_ref(&**operand),
            _ => &[],
        }
    }

    /// False if any `Not` in the tree is missing its operand
    pub fn is_complete(&self) -> bool {
        match self {
            Condition::Not(None) => false,
            _ => self.children().iter().all(Condition::is_complete),
        }
    }
}

/// Combinator a node can be wrapped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    AllOf,
    AnyOf,
    Not,
}

impl Combinator {
    /// Build a combinator whose sole child (or operand) is `node`
    pub fn wrap(self, node: Condition) -> Condition {
        match self {
            Combinator::AllOf => Condition::AllOf(vec![node]),
            Combinator::AnyOf => Condition::AnyOf(vec![node]),
            Combinator::Not => Condition::not(node),
        }
    }
}

/// Node kinds that can be inserted by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    AllOf,
    AnyOf,
    Not,
    Bool,
    Source,
    Destination,
    Dscp,
    Class,
}

impl NodeKind {
    /// Default instance: empty combinators and unset leaves
    pub fn instantiate(self) -> Condition {
        match self {
            NodeKind::AllOf => Condition::AllOf(Vec::new()),
            NodeKind::AnyOf => Condition::AnyOf(Vec::new()),
            NodeKind::Not => Condition::Not(None),
            NodeKind::Bool => Condition::Bool(false),
            NodeKind::Source => Condition::Ipv4Match(Ipv4Predicate::MatchSource(String::new())),
            NodeKind::Destination => {
                Condition::Ipv4Match(Ipv4Predicate::MatchDestination(String::new()))
            }
            NodeKind::Dscp => Condition::Ipv4Match(Ipv4Predicate::MatchDscp(None)),
            NodeKind::Class => Condition::ClassMatch(None),
        }
    }
}
