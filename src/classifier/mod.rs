//! Charging-result classification of review text
//!
//! A [`Classifier`] is an ordered list of (condition, label) rules evaluated
//! first-match-wins. Precedence lives in the order of the list:
//!
//! 1. occupied / full / given up → [`ChargingResult::GaveUpInUse`]
//! 2. a bare "may be unavailable" caveat → [`ChargingResult::Other`]
//! 3. success phrases → [`ChargingResult::Success`]
//! 4. failure phrases → [`ChargingResult::Failed`]
//! 5. anything else → the default label
//!
//! Rule tables are data ([`ClassifierSpec`]); the built-in table can be
//! replaced by a TOML file.

pub mod batch;
pub mod rules;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::ChargingResult;
use crate::utils::error::ClassifierError;

pub use batch::{classify_table, rows_with_label, LabelCounts, CONTENT_COLUMN, RESULT_COLUMN};

lazy_static! {
    static ref DEFAULT_CLASSIFIER: Classifier =
        Classifier::from_spec(&rules::builtin_spec()).expect("built-in rule table must compile");
}

/// Classify text with the built-in rule table
///
/// Total and deterministic: empty or blank text is [`ChargingResult::Other`].
pub fn classify(text: &str) -> ChargingResult {
    DEFAULT_CLASSIFIER.classify(text)
}

/// Classify optional text; `None` is [`ChargingResult::Other`]
pub fn classify_opt(text: Option<&str>) -> ChargingResult {
    DEFAULT_CLASSIFIER.classify_opt(text)
}

/// Built-in classifier
pub fn default_classifier() -> &'static Classifier {
    &DEFAULT_CLASSIFIER
}

/// Serializable rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSpec {
    /// Label when no rule matches (`success`, `gave_up_in_use`, `other`, `failed`)
    #[serde(default = "default_label")]
    pub default: String,

    /// Rules in evaluation order
    pub rules: Vec<RuleSpec>,
}

fn default_label() -> String {
    String::from("other")
}

/// One serializable rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub label: String,
    pub when: ConditionSpec,
}

/// Serializable condition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSpec {
    /// Any of the regular expressions matches
    AnyPattern(Vec<String>),
    /// Text contains the literal
    Contains(String),
    /// Text contains any of the literals
    ContainsAny(Vec<String>),
    /// Every sub-condition holds
    All(Vec<ConditionSpec>),
    /// At least one sub-condition holds
    Any(Vec<ConditionSpec>),
    /// The sub-condition does not hold
    Not(Box<ConditionSpec>),
}

/// Compiled condition
#[derive(Debug, Clone)]
pub enum Condition {
    AnyPattern(Vec<Regex>),
    Contains(String),
    ContainsAny(Vec<String>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Compile a condition; `rule` names the owning rule in errors
    pub fn compile(spec: &ConditionSpec, rule: &str) -> Result<Self, ClassifierError> {
        let compiled = match spec {
            ConditionSpec::AnyPattern(patterns) => Self::AnyPattern(
                patterns
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|source| ClassifierError::InvalidPattern {
                            rule: rule.to_string(),
                            source,
                        })
                    })
                    .collect::<Result<_, _>>()?,
            ),
            ConditionSpec::Contains(needle) => Self::Contains(needle.clone()),
            ConditionSpec::ContainsAny(needles) => Self::ContainsAny(needles.clone()),
            ConditionSpec::All(specs) => Self::All(
                specs
                    .iter()
                    .map(|s| Self::compile(s, rule))
                    .collect::<Result<_, _>>()?,
            ),
            ConditionSpec::Any(specs) => Self::Any(
                specs
                    .iter()
                    .map(|s| Self::compile(s, rule))
                    .collect::<Result<_, _>>()?,
            ),
            ConditionSpec::Not(spec) => Self::Not(Box::new(Self::compile(spec, rule)?)),
        };
        Ok(compiled)
    }

    /// Evaluate against trimmed text
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::AnyPattern(patterns) => patterns.iter().any(|re| re.is_match(text)),
            Self::Contains(needle) => text.contains(needle.as_str()),
            Self::ContainsAny(needles) => needles.iter().any(|n| text.contains(n.as_str())),
            Self::All(conditions) => conditions.iter().all(|c| c.matches(text)),
            Self::Any(conditions) => conditions.iter().any(|c| c.matches(text)),
            Self::Not(condition) => !condition.matches(text),
        }
    }
}

/// A (condition, label) pair
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub condition: Condition,
    pub label: ChargingResult,
}

/// Ordered first-match-wins classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    default: ChargingResult,
}

impl Classifier {
    /// Compile a rule table
    pub fn from_spec(spec: &ClassifierSpec) -> Result<Self, ClassifierError> {
        let default = parse_label(&spec.default)?;
        let rules = spec
            .rules
            .iter()
            .map(|r| -> Result<Rule, ClassifierError> {
                Ok(Rule {
                    name: r.name.clone(),
                    condition: Condition::compile(&r.when, &r.name)?,
                    label: parse_label(&r.label)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules, default })
    }

    /// Load a rule table from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ClassifierError> {
        let spec: ClassifierSpec = toml::from_str(content)?;
        Self::from_spec(&spec)
    }

    /// Load a rule table from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ClassifierError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Label and the name of the rule that produced it
    ///
    /// Blank text is always [`ChargingResult::Other`]; text no rule matches
    /// gets the table's default label. The rule name is `None` in both cases.
    pub fn explain(&self, text: &str) -> (ChargingResult, Option<&str>) {
        let text = text.trim();
        if text.is_empty() {
            return (ChargingResult::Other, None);
        }

        self.rules
            .iter()
            .find(|rule| rule.condition.matches(text))
            .map(|rule| (rule.label, Some(rule.name.as_str())))
            .unwrap_or((self.default, None))
    }

    /// Classify text
    pub fn classify(&self, text: &str) -> ChargingResult {
        self.explain(text).0
    }

    /// Classify optional text; absent text is [`ChargingResult::Other`]
    pub fn classify_opt(&self, text: Option<&str>) -> ChargingResult {
        text.map_or(ChargingResult::Other, |t| self.classify(t))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

fn parse_label(name: &str) -> Result<ChargingResult, ClassifierError> {
    ChargingResult::from_name(name).ok_or_else(|| ClassifierError::UnknownLabel(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_missing_text() {
        assert_eq!(classify(""), ChargingResult::Other);
        assert_eq!(classify("   \n"), ChargingResult::Other);
        assert_eq!(classify_opt(None), ChargingResult::Other);
    }

    #[test]
    fn test_gave_up_precedes_success() {
        assert_eq!(
            classify("使用中で充電できず、後で別の場所で充電できました"),
            ChargingResult::GaveUpInUse
        );
    }

    #[test]
    fn test_success_precedes_failure() {
        assert_eq!(
            classify("最初はうまくいかなかったが充電できました"),
            ChargingResult::Success
        );
        assert_eq!(
            classify("故障かと思ったが再起動したら充電できました"),
            ChargingResult::Success
        );
    }

    #[test]
    fn test_hedge_only_is_other() {
        assert_eq!(classify("利用できない可能性があります"), ChargingResult::Other);
        assert_eq!(
            classify("故障のため利用できない可能性があります"),
            ChargingResult::Failed
        );
    }

    #[test]
    fn test_gave_up_keyword_combination() {
        assert_eq!(classify("満車のため断念しました"), ChargingResult::GaveUpInUse);
        assert_eq!(classify("時間がなく断念"), ChargingResult::Other);
    }

    #[test]
    fn test_failure_phrases() {
        assert_eq!(classify("調整中のため使えません"), ChargingResult::Failed);
        assert_eq!(classify("ケーブルが壊れていた"), ChargingResult::Failed);
        assert_eq!(classify("エラーで充電できず"), ChargingResult::Failed);
    }

    #[test]
    fn test_character_class_patterns() {
        assert_eq!(classify("すぐに充電できたので満足"), ChargingResult::Success);
        assert_eq!(classify("場所の確認のみ"), ChargingResult::Other);
    }

    #[test]
    fn test_explain_names_rule() {
        let classifier = default_classifier();
        assert_eq!(
            classifier.explain("全て使用中でした"),
            (ChargingResult::GaveUpInUse, Some("gave-up-phrase"))
        );
        assert_eq!(classifier.explain("下見"), (ChargingResult::Other, None));
    }

    #[test]
    fn test_builtin_spec_serializes() {
        let spec = rules::builtin_spec();
        let text = serde_json::to_string(&spec).unwrap();
        let parsed: ClassifierSpec = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, spec);
        assert_eq!(Classifier::from_spec(&parsed).unwrap().rules().len(), 6);
    }

    #[test]
    fn test_custom_table_from_toml() {
        let classifier = Classifier::from_toml_str(
            r#"
            default = "failed"

            [[rules]]
            name = "ok"
            label = "success"
            when = { any = [{ contains = "OK" }, { any_pattern = ["成功\\s*しました"] }] }
            "#,
        )
        .unwrap();

        assert_eq!(classifier.classify("OKでした"), ChargingResult::Success);
        assert_eq!(classifier.classify("成功 しました"), ChargingResult::Success);
        assert_eq!(classifier.classify("不明"), ChargingResult::Failed);
        assert_eq!(classifier.classify(""), ChargingResult::Other);
        assert_eq!(classifier.rules().len(), 1);
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        let err = Classifier::from_toml_str(
            r#"
            [[rules]]
            name = "bad"
            label = "success"
            when = { any_pattern = ["(unclosed"] }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidPattern { .. }));

        let err = Classifier::from_toml_str(
            r#"
            [[rules]]
            name = "bad"
            label = "maybe"
            when = { contains = "x" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownLabel(_)));
    }
}
