//! Built-in rule table for charging-result classification
//!
//! The phrase lists were tuned against real reviews from ev.gogo.gs. Order
//! inside a list does not matter; order of the rules does.

use super::{ClassifierSpec, ConditionSpec, RuleSpec};

/// Charger occupied, lot full, given up
pub const GAVE_UP_PATTERNS: &[&str] = &[
    r"使用中で\s*充電できず",
    r"使用中で\s*利用できな",
    r"全て\s*使用中",
    r"すべて\s*使用中",
    r"EV枠は?\s*全て\s*使用中",
    r"全ての充電器が使用中",
    r"使用中でした[。、]",
    r"使用中で空き無",
    r"一般車のおかげで充電できなかった",
    r"一般車で埋ま",
    r"他の車が使用中",
    r"他車が使用中",
    r"空きがなく",
    r"空き無し",
    r"空き無でした",
    r"満車で\s*充電できず",
    r"満車だった",
    r"EV充電2基とも使用中で充電できず",
    r"使用中に加えて",
    r"使用中止に加えて",
];

/// Words that turn a bare `断念` into an occupied-charger report
pub const GAVE_UP_CONTEXT: &[&str] = &["使用中", "満車", "空き", "他の車", "一般車"];

/// "may be unavailable" caveat
pub const HEDGE_PATTERN: &str = r"(利用|充電)\s*できな(い|ず)\s*可能性";

/// Phrases that make a caveat an actual failure report
pub const DEFINITE_FAILURE_PATTERNS: &[&str] = &[
    "充電できなかった",
    "利用できなかった",
    "故障",
    "使えな",
    "調整中",
    "使用中止",
    "利用できない状況",
    "利用できないとのこと",
    "利用できないようです",
];

/// Charging started or completed
pub const SUCCESS_PATTERNS: &[&str] = &[
    r"充電ができました",
    r"充電できました",
    r"充電ができた",
    r"充電できた[ので]",
    r"充電できた[のは]",
    r"充電完了",
    r"充電した[。、]",
    r"充電しました",
    r"充電を開始",
    r"利用できた",
    r"利用できました",
    r"利用できるようになっておりました",
    r"充電ができる[ので]",
    r"充電できる[ので]",
    r"充電がお得です",
    r"使わせてもらっています",
    r"充電スタート",
    r"左側の充電口で充電しました",
];

/// Broken, under adjustment, out of service, explicit inability.
/// Payment-method complaints (`使えません`, `使えず`) are not failures.
pub const FAILURE_PATTERNS: &[&str] = &[
    r"充電できなかった",
    r"充電できませんでした",
    r"充電できません[。、]",
    r"充電できなくて",
    r"充電できなくなって",
    r"利用できなかった",
    r"利用できませんでした",
    r"利用できない\s*状況",
    r"一般の方は?\s*利用できな",
    r"使えなかった",
    r"使えなくなり",
    r"使用中止",
    r"機器調整中のため充電できません",
    r"調整中のため",
    r"故障",
    r"壊れ",
    r"利用できないようです",
    r"利用できないとのこと",
];

fn patterns(list: &[&str]) -> ConditionSpec {
    ConditionSpec::AnyPattern(list.iter().map(|s| s.to_string()).collect())
}

fn rule(name: &str, label: &str, when: ConditionSpec) -> RuleSpec {
    RuleSpec {
        name: name.to_string(),
        label: label.to_string(),
        when,
    }
}

/// The built-in ordered rule table
pub fn builtin_spec() -> ClassifierSpec {
    ClassifierSpec {
        default: String::from("other"),
        rules: vec![
            rule("gave-up-phrase", "gave_up_in_use", patterns(GAVE_UP_PATTERNS)),
            rule(
                "gave-up-keyword",
                "gave_up_in_use",
                ConditionSpec::All(vec![
                    ConditionSpec::Contains(String::from("断念")),
                    ConditionSpec::ContainsAny(
                        GAVE_UP_CONTEXT.iter().map(|s| s.to_string()).collect(),
                    ),
                ]),
            ),
            rule(
                "hedge-only",
                "other",
                ConditionSpec::All(vec![
                    patterns(&[HEDGE_PATTERN]),
                    ConditionSpec::Not(Box::new(patterns(DEFINITE_FAILURE_PATTERNS))),
                ]),
            ),
            rule("success", "success", patterns(SUCCESS_PATTERNS)),
            rule("failure", "failed", patterns(FAILURE_PATTERNS)),
            rule("could-not-charge", "failed", patterns(&["充電できず"])),
        ],
    }
}
