//! Report analysis pipeline: match, classify, recommend.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::classify::Reading;
use crate::error::Result;
use crate::matcher::ParameterMatcher;
use crate::reference::ReferenceTable;
use crate::specialty::{Recommendation, SpecialtyMapping};
use crate::symptoms::SymptomMapping;

/// The static tables the pipeline runs against.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    pub ranges: ReferenceTable,
    pub specialties: SpecialtyMapping,
    pub symptoms: SymptomMapping,
}

impl KnowledgeBase {
    pub fn builtin() -> Self {
        Self {
            ranges: ReferenceTable::builtin(),
            specialties: SpecialtyMapping::builtin(),
            symptoms: SymptomMapping::builtin(),
        }
    }

    /// Built-in tables, each optionally replaced by a JSON file.
    pub fn load(
        ranges: Option<&Path>,
        specialties: Option<&Path>,
        symptoms: Option<&Path>,
    ) -> Result<Self> {
        let mut kb = Self::builtin();
        if let Some(path) = ranges {
            kb.ranges = ReferenceTable::from_json(&std::fs::read_to_string(path)?)?;
            tracing::info!(path = %path.display(), parameters = kb.ranges.len(), "loaded reference ranges");
        }
        if let Some(path) = specialties {
            kb.specialties = SpecialtyMapping::from_json(&std::fs::read_to_string(path)?)?;
            tracing::info!(path = %path.display(), specialties = kb.specialties.len(), "loaded specialty mapping");
        }
        if let Some(path) = symptoms {
            kb.symptoms = SymptomMapping::from_json(&std::fs::read_to_string(path)?)?;
            tracing::info!(path = %path.display(), phrases = kb.symptoms.len(), "loaded symptom mapping");
        }
        Ok(kb)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysis {
    pub readings: Vec<Reading>,
    pub recommendation: Recommendation,
}

impl ReportAnalysis {
    /// True when no parameter was found at all. The recommendation alone
    /// cannot tell this apart from an all-normal report.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn abnormal(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(|r| r.is_abnormal())
    }
}

pub struct Analyzer {
    kb: KnowledgeBase,
    matcher: ParameterMatcher,
}

impl Analyzer {
    pub fn new(kb: KnowledgeBase) -> Result<Self> {
        let matcher = ParameterMatcher::new(&kb.ranges)?;
        Ok(Self { kb, matcher })
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Analyze lowercased report text. Readings come out in reference table
    /// order, not document order.
    pub fn analyze(&self, text: &str) -> ReportAnalysis {
        let readings: Vec<Reading> = self
            .matcher
            .match_text(text)
            .into_iter()
            .filter_map(|raw| {
                let range = self.kb.ranges.get(&raw.parameter)?;
                Some(Reading::new(range, raw.value))
            })
            .collect();

        let abnormal: BTreeSet<&str> = readings
            .iter()
            .filter(|r| r.is_abnormal())
            .map(|r| r.parameter.as_str())
            .collect();
        let recommendation = self.kb.specialties.recommend(&abnormal);

        tracing::debug!(
            matched = readings.len(),
            abnormal = abnormal.len(),
            "report analyzed"
        );

        ReportAnalysis {
            readings,
            recommendation,
        }
    }

    pub fn recommend_tests(&self, symptoms: &str) -> BTreeSet<String> {
        self.kb.symptoms.recommend_tests(symptoms)
    }
}
