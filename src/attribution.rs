//! Analyst attribution.
//!
//! Every record gets exactly one responsible analyst. Rules are checked in
//! tier order (default map, partner, economic group, financial project) and
//! every match overwrites the previous one, so the last matching rule wins.

use crate::config::{ConditionalRuleConfig, MatchKind, RulesConfig};
use crate::models::{Record, RuleField, UNASSIGNED};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A single attribution rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Exact lookup of the technical-responsible code.
    DefaultMap(BTreeMap<String, String>),
    /// Field starts with `literal` (case-sensitive).
    PrefixMatch {
        field: RuleField,
        literal: String,
        analyst: String,
    },
    /// Upper-cased field contains `literal`.
    ContainsUpper {
        field: RuleField,
        literal: String,
        analyst: String,
    },
}

impl Rule {
    fn conditional(field: RuleField, config: &ConditionalRuleConfig) -> Self {
        let literal = config.literal.clone();
        let analyst = config.analyst.clone();
        match config.kind {
            MatchKind::Prefix => Rule::PrefixMatch {
                field,
                literal,
                analyst,
            },
            MatchKind::ContainsUpper => Rule::ContainsUpper {
                field,
                literal,
                analyst,
            },
        }
    }

    /// Reason this rule can never be evaluated sensibly, if any.
    fn defect(&self) -> Option<&'static str> {
        match self {
            Rule::DefaultMap(_) => None,
            Rule::PrefixMatch { literal, .. } if literal.is_empty() => Some("empty literal"),
            Rule::ContainsUpper { literal, .. } if literal.is_empty() => Some("empty literal"),
            Rule::ContainsUpper { literal, .. } if literal.to_uppercase() != *literal => {
                Some("literal is not upper-case")
            }
            _ => None,
        }
    }
}

/// Evaluate one rule against a record, returning the analyst on a match.
///
/// Malformed rules never match.
pub fn evaluate<'r>(rule: &'r Rule, record: &Record) -> Option<&'r str> {
    if let Some(reason) = rule.defect() {
        debug!("Skipping malformed attribution rule {:?}: {}", rule, reason);
        return None;
    }

    match rule {
        Rule::DefaultMap(map) => record
            .technical_responsible
            .as_deref()
            .and_then(|code| map.get(code))
            .map(String::as_str),
        Rule::PrefixMatch {
            field,
            literal,
            analyst,
        } => record
            .rule_field(*field)
            .starts_with(literal.as_str())
            .then_some(analyst.as_str()),
        Rule::ContainsUpper {
            field,
            literal,
            analyst,
        } => record
            .rule_field(*field)
            .to_uppercase()
            .contains(literal.as_str())
            .then_some(analyst.as_str()),
    }
}

/// Ordered rule list resolving the responsible analyst.
#[derive(Debug, Clone)]
pub struct AttributionResolver {
    rules: Vec<Rule>,
}

impl AttributionResolver {
    /// Build the resolver from explicit rules, in evaluation order.
    pub fn new(rules: Vec<Rule>) -> Self {
        for rule in rules.iter() {
            if let Some(reason) = rule.defect() {
                warn!("Attribution rule {:?} is malformed ({}); it will never match", rule, reason);
            }
        }
        Self { rules }
    }

    /// Build the four tiers from configuration.
    pub fn from_config(config: &RulesConfig) -> Self {
        let tiers = [
            (RuleField::Partner, &config.partner),
            (RuleField::EconomicGroup, &config.economic_group),
            (RuleField::FinancialProject, &config.financial_project),
        ];

        let mut rules = vec![Rule::DefaultMap(config.technical_responsible.clone())];
        for (field, tier) in tiers {
            rules.extend(tier.iter().map(|rule| Rule::conditional(field, rule)));
        }

        debug!("Loaded {} attribution rules", rules.len());
        Self::new(rules)
    }

    /// Resolve the analyst for a record; the last matching rule wins.
    pub fn resolve(&self, record: &Record) -> String {
        self.rules
            .iter()
            .fold(None, |current, rule| evaluate(rule, record).or(current))
            .unwrap_or(UNASSIGNED)
            .to_string()
    }
}

impl Default for AttributionResolver {
    fn default() -> Self {
        Self::from_config(&RulesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRow;
    use crate::normalize::record_from_row;

    fn record() -> Record {
        record_from_row(&RawRow::new())
    }

    #[test]
    fn test_default_map_exact_match() {
        let resolver = AttributionResolver::default();
        let mut rec = record();
        rec.technical_responsible = Some("ALEX_V".to_string());
        assert_eq!(resolver.resolve(&rec), "Pedro Moreira");

        rec.technical_responsible = Some("alex_v".to_string());
        assert_eq!(resolver.resolve(&rec), UNASSIGNED);
    }

    #[test]
    fn test_unmatched_is_unassigned() {
        let resolver = AttributionResolver::default();
        assert_eq!(resolver.resolve(&record()), UNASSIGNED);
    }

    #[test]
    fn test_partner_rule_overrides_default_map() {
        let resolver = AttributionResolver::default();
        let mut rec = record();
        rec.technical_responsible = Some("ALEX_V".to_string());
        rec.partner = Some("NEC Brasil".to_string());
        assert_eq!(resolver.resolve(&rec), "Valmeire Alves");
    }

    #[test]
    fn test_sest_project_keeps_default_analyst() {
        let resolver = AttributionResolver::default();
        let mut rec = record();
        rec.technical_responsible = Some("ALEX_V".to_string());
        for project in ["Projeto Sest Senat", "SEST SENAT"] {
            rec.financial_project = Some(project.to_string());
            assert_eq!(resolver.resolve(&rec), "Pedro Moreira", "{project}");
        }
    }

    #[test]
    fn test_last_matching_rule_wins_across_tiers() {
        let resolver = AttributionResolver::default();
        let mut rec = record();
        rec.technical_responsible = Some("VAGNER".to_string());
        rec.partner = Some("Cliente PABX Oi".to_string());
        rec.economic_group = Some("grupo algar".to_string());
        assert_eq!(resolver.resolve(&rec), "Pedro Moreira");

        rec.financial_project = Some("OI - UC4X fase 2".to_string());
        assert_eq!(resolver.resolve(&rec), "Valmeire Alves");
    }

    #[test]
    fn test_last_match_wins_within_tier() {
        let resolver = AttributionResolver::default();
        let mut rec = record();
        // Matches both "PABX OI" and "OI - MG"; the later rule wins.
        rec.partner = Some("pabx oi - mg".to_string());
        assert_eq!(resolver.resolve(&rec), "Tamires Merces");
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let resolver = AttributionResolver::default();
        let mut rec = record();
        rec.partner = Some("nec brasil".to_string());
        assert_eq!(resolver.resolve(&rec), UNASSIGNED);
    }

    #[test]
    fn test_malformed_rules_never_match() {
        let resolver = AttributionResolver::new(vec![
            Rule::PrefixMatch {
                field: RuleField::Partner,
                literal: String::new(),
                analyst: "Empty Prefix".to_string(),
            },
            Rule::ContainsUpper {
                field: RuleField::Partner,
                literal: "lower".to_string(),
                analyst: "Lower Literal".to_string(),
            },
        ]);
        let mut rec = record();
        rec.partner = Some("lower".to_string());
        assert_eq!(resolver.resolve(&rec), UNASSIGNED);
    }

    #[test]
    fn test_evaluate_dispatch() {
        let rule = Rule::ContainsUpper {
            field: RuleField::FinancialProject,
            literal: "ACME".to_string(),
            analyst: "Carlos Lima".to_string(),
        };
        let mut rec = record();
        assert_eq!(evaluate(&rule, &rec), None);
        rec.financial_project = Some("Projeto Acme Sul".to_string());
        assert_eq!(evaluate(&rule, &rec), Some("Carlos Lima"));
    }
}
