//! Document-code recognition inside extracted text.

use crate::ports::CodeExtractor;
use crate::resolve::profiles::{ExtractionProfiles, MatchStrategy, Profile};

/// Candidates at or below this length are bare category tokens ("RIR"), not
/// codes, and are discarded by the longest-match strategy.
const MIN_CODE_LENGTH: usize = 3;

pub struct RegexCodeExtractor {
    profiles: ExtractionProfiles,
}

impl RegexCodeExtractor {
    pub fn new(profiles: ExtractionProfiles) -> Self {
        Self { profiles }
    }

    fn first_match(profile: &Profile, text: &str) -> Option<String> {
        for pattern in &profile.patterns {
            if let Some(caps) = pattern.captures(text) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    return Some(m.as_str().trim().to_string());
                }
            }
        }
        None
    }

    fn longest_match(profile: &Profile, text: &str) -> Option<String> {
        let mut best: Option<String> = None;
        for pattern in &profile.patterns {
            for caps in pattern.captures_iter(text) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    let candidate = m.as_str().trim();
                    if candidate.len() <= MIN_CODE_LENGTH {
                        tracing::debug!(candidate, "discarding short candidate");
                        continue;
                    }
                    let better = best
                        .as_ref()
                        .map_or(true, |current| candidate.len() > current.len());
                    if better {
                        best = Some(candidate.to_string());
                    }
                }
            }
        }
        best
    }
}

impl CodeExtractor for RegexCodeExtractor {
    fn find_code(&self, text: &str, profile_id: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        let Some(profile) = self.profiles.get(profile_id) else {
            tracing::warn!(profile = profile_id, "unknown extraction profile");
            return None;
        };
        let code = match profile.strategy {
            MatchStrategy::FirstMatch => Self::first_match(profile, text),
            MatchStrategy::LongestMatch => Self::longest_match(profile, text),
        };
        match &code {
            Some(code) => {
                tracing::debug!(profile = profile_id, code = %code, "extracted document code")
            }
            None => tracing::debug!(profile = profile_id, "no pattern matched"),
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::profiles::ProfileConfig;
    use std::collections::HashMap;

    fn extractor_with(
        id: &str,
        patterns: &[&str],
        strategy: MatchStrategy,
    ) -> RegexCodeExtractor {
        let configs = HashMap::from([(
            id.to_string(),
            ProfileConfig {
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                strategy,
            },
        )]);
        let profiles = ExtractionProfiles::from_configs(configs).unwrap();
        RegexCodeExtractor::new(profiles)
    }

    #[test]
    fn first_match_uses_capture_group_one() {
        let extractor = extractor_with(
            "P",
            &[r"Código:\s*([A-Z0-9\-]+)", r"([A-Z]{2}-\d+)"],
            MatchStrategy::FirstMatch,
        );
        let code = extractor
            .find_code("Relatório de inspeção\nCódigo: RL-5290-001\n", "P")
            .unwrap();
        assert_eq!(code, "RL-5290-001");
    }

    #[test]
    fn first_match_falls_back_to_the_whole_match_without_groups() {
        let extractor = extractor_with("P", &[r"[A-Z]{2}-\d{4}"], MatchStrategy::FirstMatch);
        let code = extractor.find_code("ver doc RL-5290 anexo", "P").unwrap();
        assert_eq!(code, "RL-5290");
    }

    #[test]
    fn first_match_respects_pattern_order() {
        let extractor = extractor_with(
            "P",
            &[r"Primário:\s*(\S+)", r"Secundário:\s*(\S+)"],
            MatchStrategy::FirstMatch,
        );
        let text = "Secundário: B-222\nPrimário: A-111";
        assert_eq!(extractor.find_code(text, "P").unwrap(), "A-111");
    }

    #[test]
    fn longest_match_rejects_bare_category_tokens() {
        let extractor = extractor_with("P", &[r"[A-Z0-9_\.\-]{3,}"], MatchStrategy::LongestMatch);
        // "RIR" alone is length 3 and must lose to the full code
        let text = "RIR\nCZ6_5290.00_22212_3.1.1_TUB_RIR_M-5290.62-1200-940-CZ6-012";
        let code = extractor.find_code(text, "P").unwrap();
        assert_eq!(code, "CZ6_5290.00_22212_3.1.1_TUB_RIR_M-5290.62-1200-940-CZ6-012");
    }

    #[test]
    fn longest_match_with_only_short_candidates_finds_nothing() {
        let extractor = extractor_with("P", &[r"[A-Z]{2,}"], MatchStrategy::LongestMatch);
        assert_eq!(extractor.find_code("RIR em RIR", "P"), None);
    }

    #[test]
    fn builtin_rir_profile_prefers_the_labeled_code() {
        let extractor = RegexCodeExtractor::new(ExtractionProfiles::builtin());
        let text = "RELATÓRIO DE INSPEÇÃO DE RECEBIMENTO\n\
                    Relatório: CZ6_5290.00_22212_3.1.1_TUB_RIR_M-5290.62-1200-940-CZ6-012\n\
                    Página 1 de 3";
        let code = extractor.find_code(text, "RIR").unwrap();
        assert_eq!(code, "CZ6_5290.00_22212_3.1.1_TUB_RIR_M-5290.62-1200-940-CZ6-012");
    }

    #[test]
    fn unknown_profile_and_empty_text_yield_nothing() {
        let extractor = RegexCodeExtractor::new(ExtractionProfiles::builtin());
        assert_eq!(extractor.find_code("Relatório: ABCD_EFGH", "NOPE"), None);
        assert_eq!(extractor.find_code("   \n  ", "RIR"), None);
    }
}
