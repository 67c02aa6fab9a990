//! The embedded compliance rule corpus.
//!
//! The metric file is versioned as a unit: every evaluation request carries
//! the full text, so editing any rule's wording changes evaluation semantics
//! for all future reports and warrants a new corpus version.

use std::sync::LazyLock;

use regex::Regex;

/// Methodology identifier for the embedded corpus.
pub const CORPUS_VERSION: &str = "JCM_PH_AM004";

const CORPUS_TEXT: &str = include_str!("../../resources/rules/jcm_ph_am004.txt");

/// One numbered rule from the metric file.
#[derive(Debug, Clone)]
pub struct Rule {
    pub number: u32,
    pub title: String,
    pub statement: String,
}

/// The full ordered rule list plus the verbatim text sent to the evaluator.
#[derive(Debug)]
pub struct RuleCorpus {
    rules: Vec<Rule>,
}

impl RuleCorpus {
    pub fn version(&self) -> &'static str {
        CORPUS_VERSION
    }

    /// Verbatim metric file text, exactly as embedded in evaluation requests.
    pub fn text(&self) -> &'static str {
        CORPUS_TEXT
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a rule with this number exists in the corpus.
    pub fn contains(&self, number: u32) -> bool {
        self.rules.iter().any(|r| r.number == number)
    }
}

static CORPUS: LazyLock<RuleCorpus> = LazyLock::new(|| parse_corpus(CORPUS_TEXT));

/// The process-wide rule corpus, parsed once from the embedded metric file.
pub fn corpus() -> &'static RuleCorpus {
    &CORPUS
}

fn parse_corpus(text: &str) -> RuleCorpus {
    static HEADER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^RULE (\d+): (.+)$").unwrap());

    let mut rules: Vec<Rule> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = HEADER.captures(line) {
            let number = caps[1].parse().unwrap_or(0);
            rules.push(Rule {
                number,
                title: caps[2].trim().to_string(),
                statement: String::new(),
            });
        } else if let Some(current) = rules.last_mut() {
            let line = line.trim();
            if !line.is_empty() {
                if !current.statement.is_empty() {
                    current.statement.push('\n');
                }
                current.statement.push_str(line);
            }
        }
    }

    RuleCorpus { rules }
}
