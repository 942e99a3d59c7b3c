//! Rule evaluator: turns a classified unit into findings.
//!
//! Evaluation is a pure function of the unit text and the rule set. Each
//! applicable rule yields exactly one finding per unit; findings are never
//! merged across units.

use crate::catalog::RuleSet;
use crate::error::UnitError;
use crate::models::kind::ResourceKind;
use crate::models::rule::Rule;
use crate::models::{ConfigUnit, Finding, Severity};
use std::collections::BTreeSet;

/// Rule id attached to the synthetic finding for an unreadable unit.
pub const UNIT_READ_RULE: &str = "unit-read";

/// Evaluate every rule whose kinds intersect `kinds`, in table order.
pub fn evaluate(
    unit: &ConfigUnit,
    kinds: &BTreeSet<ResourceKind>,
    rules: &RuleSet,
) -> Vec<Finding> {
    if kinds.is_empty() {
        return Vec::new();
    }
    rules
        .iter()
        .filter(|r| r.applies_to(kinds))
        .filter(|r| !r.is_waived(&unit.id, &unit.text))
        .map(|r| evaluate_rule(unit, r))
        .collect()
}

fn evaluate_rule(unit: &ConfigUnit, rule: &Rule) -> Finding {
    let missing: Vec<&str> = rule
        .requires
        .iter()
        .filter(|c| !c.pattern.is_match(&unit.text))
        .map(|c| c.label.as_str())
        .collect();
    let (severity, message) = if missing.is_empty() {
        (Severity::Pass, rule.title.clone())
    } else {
        (rule.level.into(), rule.render_message(&unit.id, &missing))
    };
    Finding {
        rule: rule.id.clone(),
        title: rule.title.clone(),
        dimension: Some(rule.dimension),
        unit: unit.id.clone(),
        severity,
        message,
        recommendation: match severity {
            Severity::Pass => None,
            _ => rule.recommendation.clone(),
        },
    }
}

/// Single error finding standing in for a unit that could not be loaded.
pub fn unreadable(unit_id: &str, err: &UnitError) -> Finding {
    Finding {
        rule: UNIT_READ_RULE.to_string(),
        title: "Configuration file is readable".to_string(),
        dimension: None,
        unit: unit_id.to_string(),
        severity: Severity::Error,
        message: format!("Could not read {}: {}", unit_id, err),
        recommendation: None,
    }
}
