use serde::Serialize;

pub const BASE_SCORE: u8 = 70;
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatch {
    /// Any keyword present is enough.
    Any,
    /// Every keyword must be present.
    All,
}

#[derive(Debug)]
pub struct ScoringRule {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
    pub matching: KeywordMatch,
    pub points: u8,
}

impl ScoringRule {
    /// `text` must already be lower-cased.
    fn matches(&self, text: &str) -> bool {
        match self.matching {
            KeywordMatch::Any => self.keywords.iter().any(|keyword| text.contains(keyword)),
            KeywordMatch::All => self.keywords.iter().all(|keyword| text.contains(keyword)),
        }
    }
}

/// The single rule table used for stored scores and for live previews.
/// Rules are independent: every rule whose keywords match adds its points.
pub const RULES: &[ScoringRule] = &[
    ScoringRule {
        label: "Publication in journal",
        keywords: &["published", "journal"],
        matching: KeywordMatch::Any,
        points: 15,
    },
    ScoringRule {
        label: "Conference/Seminar participation",
        keywords: &["conference", "seminar"],
        matching: KeywordMatch::Any,
        points: 10,
    },
    ScoringRule {
        label: "Award/Recognition received",
        keywords: &["award", "recognition"],
        matching: KeywordMatch::Any,
        points: 20,
    },
    ScoringRule {
        label: "Innovation/New initiative",
        keywords: &["innovation", "new"],
        matching: KeywordMatch::Any,
        points: 15,
    },
    ScoringRule {
        label: "Student feedback",
        keywords: &["student", "feedback"],
        matching: KeywordMatch::All,
        points: 10,
    },
    ScoringRule {
        label: "International exposure",
        keywords: &["international"],
        matching: KeywordMatch::Any,
        points: 10,
    },
    ScoringRule {
        label: "Patent filed/granted",
        keywords: &["patent"],
        matching: KeywordMatch::Any,
        points: 25,
    },
    ScoringRule {
        label: "Workshop/Training conducted",
        keywords: &["workshop", "training"],
        matching: KeywordMatch::Any,
        points: 8,
    },
    ScoringRule {
        label: "Book/Chapter published",
        keywords: &["book", "chapter"],
        matching: KeywordMatch::Any,
        points: 12,
    },
    ScoringRule {
        label: "Grant/Funding received",
        keywords: &["grant", "funding"],
        matching: KeywordMatch::Any,
        points: 18,
    },
    ScoringRule {
        label: "Community service",
        keywords: &["community", "service"],
        matching: KeywordMatch::Any,
        points: 7,
    },
    ScoringRule {
        label: "Research activity",
        keywords: &["research"],
        matching: KeywordMatch::Any,
        points: 12,
    },
    ScoringRule {
        label: "Project completed",
        keywords: &["project"],
        matching: KeywordMatch::Any,
        points: 10,
    },
    ScoringRule {
        label: "Student mentorship",
        keywords: &["mentor", "guidance"],
        matching: KeywordMatch::Any,
        points: 8,
    },
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuleHit {
    pub label: &'static str,
    pub points: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScorePreview {
    pub score: u8,
    pub score_out_of_10: i32,
    pub breakdown: Vec<RuleHit>,
}

fn matched_rules(evidence: &str, comments: &str) -> Vec<&'static ScoringRule> {
    let text = format!("{evidence} {comments}").to_lowercase();
    RULES.iter().filter(|rule| rule.matches(&text)).collect()
}

fn total(rules: &[&ScoringRule]) -> u8 {
    let sum: u32 = u32::from(BASE_SCORE) + rules.iter().map(|rule| u32::from(rule.points)).sum::<u32>();
    sum.min(u32::from(MAX_SCORE)) as u8
}

/// Empty input still earns the base score.
pub fn score(evidence: &str, comments: &str) -> u8 {
    total(&matched_rules(evidence, comments))
}

/// Score with a per-rule breakdown for display while a record is being
/// written. Blank input previews as 0 since nothing has been entered yet.
pub fn preview(evidence: &str, comments: &str) -> ScorePreview {
    if evidence.trim().is_empty() && comments.trim().is_empty() {
        return ScorePreview {
            score: 0,
            score_out_of_10: 0,
            breakdown: Vec::new(),
        };
    }

    let rules = matched_rules(evidence, comments);
    let score = total(&rules);
    ScorePreview {
        score,
        score_out_of_10: score_out_of_10(i32::from(score)),
        breakdown: rules
            .into_iter()
            .map(|rule| RuleHit {
                label: rule.label,
                points: rule.points,
            })
            .collect(),
    }
}

/// Halves round up.
pub fn score_out_of_10(score: i32) -> i32 {
    (score + 5).div_euclid(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_keeps_base_score() {
        assert_eq!(score("", ""), 70);
    }

    #[test]
    fn patent_adds_twenty_five() {
        assert_eq!(score("patent filed", ""), 95);
    }

    #[test]
    fn combined_rules_are_capped() {
        assert_eq!(
            score("Published in international journal, received award", ""),
            100
        );
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(score("JOURNALISM club", ""), 85);
        assert_eq!(score("", "Seminars held"), 80);
    }

    #[test]
    fn evidence_and_comments_are_joined() {
        // "student" and "feedback" only co-occur across the two fields.
        assert_eq!(score("collected from each student", "positive feedback"), 80);
        assert_eq!(score("student cohort", ""), 70);
    }

    #[test]
    fn rules_apply_once_regardless_of_repeats() {
        assert_eq!(score("patent patent patent", "patent"), 95);
    }

    #[test]
    fn scores_stay_in_range_and_grow_with_matches() {
        let inputs = [
            "",
            "seminar",
            "seminar workshop",
            "seminar workshop community",
            "seminar workshop community mentor",
            "seminar workshop community mentor patent",
            "seminar workshop community mentor patent award",
        ];
        let mut previous = 0;
        for input in inputs {
            let value = score(input, "");
            assert!((70..=100).contains(&value), "{input} scored {value}");
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn preview_of_blank_input_is_zero() {
        let preview = preview("   ", "");
        assert_eq!(preview.score, 0);
        assert!(preview.breakdown.is_empty());
    }

    #[test]
    fn preview_lists_matched_rules_in_table_order() {
        let preview = preview("Research project funded by a grant", "");
        assert_eq!(preview.score, 100);
        assert_eq!(
            preview.breakdown,
            vec![
                RuleHit {
                    label: "Grant/Funding received",
                    points: 18
                },
                RuleHit {
                    label: "Research activity",
                    points: 12
                },
                RuleHit {
                    label: "Project completed",
                    points: 10
                },
            ]
        );
    }

    #[test]
    fn preview_matches_stored_score_for_non_blank_input() {
        let evidence = "Conducted a workshop";
        assert_eq!(preview(evidence, "").score, score(evidence, ""));
        assert_eq!(preview(evidence, "").score, 78);
    }

    #[test]
    fn out_of_ten_formulas_agree() {
        for value in 0..=100 {
            let by_ten = (f64::from(value) / 10.0).round() as i32;
            let by_percent = (f64::from(value) / 100.0 * 10.0).round() as i32;
            assert_eq!(score_out_of_10(value), by_ten);
            assert_eq!(score_out_of_10(value), by_percent);
        }
    }
}
