//! Canonical expression rendering
//!
//! Produces the `ALL(src=10.0.0.0/8,NOT(dscp=0x2))` form used for previews
//! and as the starting text of raw editing. [`crate::condition::parse`]
//! reads the same grammar back for complete trees.

use crate::condition::ast::{Condition, Ipv4Predicate};
use std::fmt::{self, Write};

/// Render a condition tree to its canonical expression string
pub fn render(cond: &Condition) -> String {
    cond.to_string()
}

/// Render an optional root, empty when there is none
pub fn render_root(root: Option<&Condition>) -> String {
    root.map(render).unwrap_or_default()
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, conds: &[Condition]) -> fmt::Result {
    f.write_str(name)?;
    f.write_char('(')?;
    for (i, cond) in conds.iter().enumerate() {
        if i > 0 {
            f.write_char(',')?;
        }
        write!(f, "{}", cond)?;
    }
    f.write_char(')')
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::AllOf(conds) => write_list(f, "ALL", conds),
            Condition::AnyOf(conds) => write_list(f, "ANY", conds),
            Condition::Not(Some(operand)) => write!(f, "NOT({})", operand),
            // Transient editing state renders as nothing
            Condition::Not(None) => Ok(()),
            Condition::Bool(value) => write!(f, "{}", value),
            Condition::Ipv4Match(predicate) => write!(f, "{}", predicate),
            Condition::ClassMatch(Some(id)) => write!(f, "cls={}", id),
            Condition::ClassMatch(None) => f.write_str("cls="),
        }
    }
}

impl fmt::Display for Ipv4Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ipv4Predicate::MatchSource(net) => write!(f, "src={}", net),
            Ipv4Predicate::MatchDestination(net) => write!(f, "dst={}", net),
            Ipv4Predicate::MatchDscp(Some(dscp)) => write!(f, "dscp={:#x}", dscp),
            Ipv4Predicate::MatchDscp(None) => f.write_str("dscp="),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_combinators() {
        assert_eq!(render(&Condition::all_of([])), "ALL()");
        assert_eq!(render(&Condition::any_of([])), "ANY()");
    }

    #[test]
    fn test_render_leaves() {
        let tree = Condition::all_of([
            Condition::source("10.0.0.0/8"),
            Condition::destination(""),
        ]);
        assert_eq!(render(&tree), "ALL(src=10.0.0.0/8,dst=)");
        assert_eq!(render(&Condition::dscp(0x10)), "dscp=0x10");
        assert_eq!(
            render(&Condition::Ipv4Match(Ipv4Predicate::MatchDscp(None))),
            "dscp="
        );
        assert_eq!(render(&Condition::class(12)), "cls=12");
        assert_eq!(render(&Condition::class(0)), "cls=0");
        assert_eq!(render(&Condition::ClassMatch(None)), "cls=");
        assert_eq!(render(&Condition::Bool(true)), "true");
    }

    #[test]
    fn test_render_not() {
        assert_eq!(render(&Condition::not(Condition::Bool(false))), "NOT(false)");
        assert_eq!(render(&Condition::Not(None)), "");
        assert_eq!(
            render(&Condition::any_of([Condition::Not(None), Condition::dscp(2)])),
            "ANY(,dscp=0x2)"
        );
    }

    #[test]
    fn test_render_nested() {
        let tree = Condition::any_of([
            Condition::dscp(2),
            Condition::all_of([
                Condition::destination("12.12.12.0/26"),
                Condition::not(Condition::source("12.12.12.0/26")),
            ]),
        ]);
        let first = render(&tree);
        assert_eq!(
            first,
            "ANY(dscp=0x2,ALL(dst=12.12.12.0/26,NOT(src=12.12.12.0/26)))"
        );
        assert_eq!(render(&tree), first);
    }

    #[test]
    fn test_render_root() {
        assert_eq!(render_root(None), "");
        assert_eq!(render_root(Some(&Condition::class(1))), "cls=1");
    }
}
