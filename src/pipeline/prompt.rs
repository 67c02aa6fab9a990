//! Prompt assembly for the compliance evaluation call.
//!
//! The system prompt pins the model into deterministic validator behavior
//! and fixes the JSON output contract. The user prompt carries the full rule
//! corpus plus the budgeted document text, so every request is self-contained
//! and the model needs no outside knowledge.

use super::extract::ExtractedText;
use super::rules::RuleCorpus;

pub const SYSTEM_PROMPT: &str = r#"You are a STRICT rule-based document compliance checker for JCM carbon credit methodology.

Your job is to compare an UPLOADED DOCUMENT against a METRIC FILE that contains rules/requirements.

You MUST behave like a deterministic validator, NOT a general chatbot.

MANDATORY BEHAVIOR RULES:
1. Use ONLY the provided METRIC FILE (the JCM rules below).
2. DO NOT use outside knowledge.
3. DO NOT guess or assume missing rules.
4. DO NOT generate generic or default answers.
5. Your output MUST change depending on the uploaded document content.
6. Every conclusion MUST be supported by quoting evidence from the document or stating "NOT FOUND".
7. If you cannot find supporting text, explicitly say "NOT FOUND".
8. NEVER give the same fixed/template response for different inputs.
9. If you produce an answer without referencing the provided context, the answer is INVALID.

You must return a JSON response with this exact structure:
{
  "projectName": "extracted project name or 'Unknown Project'",
  "issues": [
    {
      "severity": "major" or "minor",
      "category": "calculation" or "parameters" or "eligibility" or "monitoring" or "documentation",
      "title": "concise issue title",
      "section": "section/location reference from document or 'General'",
      "description": "what is wrong, with EXACT QUOTES from the document as evidence",
      "suggestedFix": "actionable fix recommendation",
      "status": "FAIL" or "NOT FOUND"
    }
  ],
  "compliantRules": [
    {
      "ruleNumber": 1,
      "title": "rule name",
      "evidence": "exact quote from document proving compliance"
    }
  ],
  "summary": "brief summary based ONLY on findings above"
}

Severity classification:
- "major": Rule FAIL with evidence of wrong values, missing critical calculations, or formula errors
- "minor": Rule NOT FOUND (missing documentation) or minor discrepancies

CRITICAL: You must evaluate EVERY rule. Different documents MUST produce different results.
Return ONLY valid JSON, no markdown or other formatting."#;

const MISSING_CALC_INSTRUCTION: &str =
    "NO CALCULATION SPREADSHEET PROVIDED - mark Rule 16 (Data Cross-Consistency) as NOT FOUND.";

/// A fully assembled chat request, ready for the gateway.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub system: &'static str,
    pub user: String,
}

/// Assemble the evaluation request from the rule corpus and budgeted text.
/// Pure string assembly; identical inputs produce identical requests.
pub fn build_evaluation_request(
    corpus: &RuleCorpus,
    pdd: &ExtractedText,
    calculation: Option<&ExtractedText>,
) -> EvaluationRequest {
    let calc_section = match calculation {
        Some(calc) => format!("UPLOADED CALCULATION SPREADSHEET:\n{}", calc.content),
        None => MISSING_CALC_INSTRUCTION.to_string(),
    };

    let user = format!(
        "METRIC FILE:\n{}\n\nUPLOADED PDD DOCUMENT:\n{}\n\n{}\n\nNow evaluate this document against ALL 17 rules. Return the JSON compliance report.",
        corpus.text(),
        pdd.content,
        calc_section,
    );

    EvaluationRequest {
        system: SYSTEM_PROMPT,
        user,
    }
}
