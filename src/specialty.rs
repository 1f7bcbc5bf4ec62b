//! Specialist recommendation from the set of abnormal parameters.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::Result;

pub const ALL_NORMAL: &str = "All parameters are within normal ranges.";

/// Which parameters each specialty looks after. A parameter may belong to
/// several specialties.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialtyMapping {
    entries: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "specialties", rename_all = "snake_case")]
pub enum Recommendation {
    Consult(BTreeSet<String>),
    AllNormal,
}

impl Recommendation {
    pub fn specialties(&self) -> impl Iterator<Item = &str> {
        let set = match self {
            Recommendation::Consult(set) => Some(set),
            Recommendation::AllNormal => None,
        };
        set.into_iter().flatten().map(String::as_str)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Consult(set) => {
                let names: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "Consult: {}.", names.join(", "))
            }
            Recommendation::AllNormal => f.write_str(ALL_NORMAL),
        }
    }
}

impl SpecialtyMapping {
    pub fn new<S, P>(entries: impl IntoIterator<Item = (S, P)>) -> Self
    where
        S: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(specialty, params)| (specialty.into(), params.into_iter().map(Into::into).collect()))
            .collect();
        Self { entries }
    }

    /// Load from a JSON object of `specialty -> [parameter]`.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut entries = Vec::with_capacity(map.len());
        for (specialty, params) in map {
            let params: Vec<String> = serde_json::from_value(params)?;
            entries.push((specialty, params));
        }
        Ok(Self { entries })
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_SPECIALTIES.iter().map(|&(s, p)| (s, p.iter().copied())))
    }

    /// Every specialty with at least one parameter in `abnormal`.
    pub fn recommend(&self, abnormal: &BTreeSet<&str>) -> Recommendation {
        let specialties: BTreeSet<String> = self
            .entries
            .iter()
            .filter(|(_, params)| params.iter().any(|p| abnormal.contains(p.as_str())))
            .map(|(specialty, _)| specialty.clone())
            .collect();

        if specialties.is_empty() {
            Recommendation::AllNormal
        } else {
            Recommendation::Consult(specialties)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const BUILTIN_SPECIALTIES: &[(&str, &[&str])] = &[
    ("Hematologist", &["hemoglobin", "rbc", "wbc", "platelets", "crp"]),
    (
        "Endocrinologist",
        &["glucose", "cholesterol", "triglycerides", "hdl", "ldl", "vitamin d", "vitamin b12"],
    ),
    (
        "Nephrologist",
        &["creatinine", "urea", "sodium", "potassium", "calcium", "phosphate", "magnesium"],
    ),
    ("Hepatologist", &["alt", "ast", "bilirubin", "albumin", "total protein"]),
    ("Gastroenterologist", &["amylase", "lipase"]),
    ("Cardiologist", &["cholesterol", "triglycerides", "hdl", "ldl"]),
    ("General Physician", &["prothrombin time", "inr"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn set<'a>(names: &[&'a str]) -> BTreeSet<&'a str> {
        names.iter().copied().collect()
    }

    #[test]
    fn empty_abnormal_set_is_all_normal() {
        let rec = SpecialtyMapping::builtin().recommend(&BTreeSet::new());
        assert_eq!(rec, Recommendation::AllNormal);
        assert_eq!(rec.to_string(), ALL_NORMAL);
    }

    #[test]
    fn unmapped_parameter_is_all_normal() {
        let rec = SpecialtyMapping::builtin().recommend(&set(&["ferritin"]));
        assert_eq!(rec, Recommendation::AllNormal);
    }

    #[test]
    fn shared_parameter_reaches_every_specialty() {
        let rec = SpecialtyMapping::builtin().recommend(&set(&["ldl"]));
        assert_eq!(rec.to_string(), "Consult: Cardiologist, Endocrinologist.");
    }

    #[test]
    fn specialties_are_deduplicated() {
        let rec = SpecialtyMapping::builtin().recommend(&set(&["hemoglobin", "wbc", "crp"]));
        assert_eq!(rec.specialties().collect::<Vec<_>>(), ["Hematologist"]);
    }

    #[test]
    fn mapping_order_does_not_matter() {
        let abnormal = set(&["glucose", "urea", "alt", "hdl"]);
        let forward = SpecialtyMapping::builtin();
        let reversed = SpecialtyMapping::new(
            BUILTIN_SPECIALTIES
                .iter()
                .rev()
                .map(|&(s, p)| (s, p.iter().rev().copied())),
        );
        assert_eq!(forward.recommend(&abnormal), reversed.recommend(&abnormal));
    }

    #[test]
    fn loads_from_json() {
        let mapping = SpecialtyMapping::from_json(r#"{"Rheumatologist": ["crp", "esr"]}"#).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping.recommend(&set(&["esr"])).to_string(),
            "Consult: Rheumatologist."
        );
    }
}
