//! Symptom phrase to recommended test lookup.

use std::collections::BTreeSet;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SymptomMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl SymptomMapping {
    /// Phrases are lowercased so they compare against lowercased input.
    /// Blank phrases are dropped; they would match any input.
    pub fn new<S, T>(entries: impl IntoIterator<Item = (S, T)>) -> Self
    where
        S: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|(phrase, tests)| {
                let phrase: String = phrase.into();
                if phrase.trim().is_empty() {
                    return None;
                }
                Some((phrase.to_lowercase(), tests.into_iter().map(Into::into).collect::<Vec<String>>()))
            })
            .collect();
        Self { entries }
    }

    /// Load from a JSON object of `phrase -> [test]`. Blank phrases are an
    /// error here rather than silently dropped.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut entries = Vec::with_capacity(map.len());
        for (phrase, tests) in map {
            if phrase.trim().is_empty() {
                return Err(Error::EmptySymptomPhrase);
            }
            let tests: Vec<String> = serde_json::from_value(tests)?;
            entries.push((phrase, tests));
        }
        Ok(Self::new(entries))
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_SYMPTOMS.iter().map(|&(s, t)| (s, t.iter().copied())))
    }

    /// Union of the tests for every phrase contained in `symptoms`.
    ///
    /// Plain substring containment: "fatigue" and "persistent fatigue" both
    /// match "persistent fatigue", and a phrase may match inside a longer word.
    pub fn recommend_tests(&self, symptoms: &str) -> BTreeSet<String> {
        let symptoms = symptoms.to_lowercase();
        self.entries
            .iter()
            .filter(|(phrase, _)| symptoms.contains(phrase.as_str()))
            .flat_map(|(_, tests)| tests.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const BUILTIN_SYMPTOMS: &[(&str, &[&str])] = &[
    ("fatigue", &["Complete Blood Count (CBC)", "Thyroid Function Test", "Vitamin B12 Test"]),
    ("fever", &["CBC", "Blood Culture", "Malaria Test"]),
    ("joint pain", &["Rheumatoid Factor Test", "CRP Test", "Uric Acid Test"]),
    ("weight loss", &["Thyroid Function Test", "HbA1c", "Liver Function Test"]),
    ("weight gain", &["Thyroid Function Test", "Lipid Profile"]),
    ("dizziness", &["CBC", "Iron Studies", "Vitamin B12 Test"]),
    ("nausea", &["Liver Function Test", "Amylase Test"]),
    ("vomiting", &["Electrolyte Panel", "Liver Function Test"]),
    ("blurred vision", &["Blood Sugar Test", "Thyroid Test"]),
    ("shortness of breath", &["CBC", "D-Dimer Test", "Arterial Blood Gas (ABG)"]),
    ("palpitations", &["Thyroid Function Test", "Electrolyte Panel"]),
    ("swelling", &["Kidney Function Test", "Liver Function Test", "Albumin Test"]),
    ("persistent cough", &["CBC", "Sputum Culture", "Chest X-Ray (imaging)"]),
    ("skin rash", &["Allergy Panel", "CBC", "Autoimmune Panel"]),
    ("abdominal pain", &["Liver Function Test", "Amylase/Lipase Test", "CBC"]),
    ("frequent urination", &["Blood Sugar Test", "Kidney Function Test", "Electrolyte Panel"]),
    ("thirst", &["Blood Sugar Test", "Electrolyte Panel"]),
    ("hair loss", &["Thyroid Function Test", "Vitamin D Test", "Ferritin Test"]),
    ("memory loss", &["Vitamin B12 Test", "Thyroid Function Test", "Electrolyte Panel"]),
    ("muscle weakness", &["Electrolyte Panel", "Thyroid Function Test", "Creatinine Kinase (CK) Test"]),
    ("anemia", &["CBC", "Iron Studies", "Vitamin B12 Test", "Folate Test"]),
    ("high blood pressure", &["Kidney Function Test", "Lipid Profile", "Electrolyte Panel"]),
    ("low blood pressure", &["CBC", "Electrolyte Panel", "Cortisol Test"]),
    ("chest pain", &["Troponin Test", "Lipid Profile", "CBC", "CK-MB Test"]),
    ("swollen lymph nodes", &["CBC", "Lymph Node Biopsy (not blood test)", "Viral Panel"]),
    ("loss of appetite", &["Liver Function Test", "Thyroid Function Test", "CBC"]),
    ("irregular periods", &["Hormone Panel", "Thyroid Function Test", "FSH/LH Test"]),
    ("infertility", &["Hormone Panel", "Thyroid Function Test", "Prolactin Test"]),
    ("itching", &["Allergy Panel", "Liver Function Test", "Kidney Function Test"]),
    ("joint stiffness", &["Rheumatoid Factor Test", "CRP Test", "Anti-CCP Test"]),
    ("blood in urine", &["Urinalysis (not blood test)", "Kidney Function Test", "CBC"]),
    ("persistent fatigue", &["CBC", "Thyroid Function Test", "Vitamin D Test", "Iron Studies"]),
    ("chronic headache", &["CBC", "Thyroid Function Test", "Vitamin B12 Test"]),
    ("confusion", &["Electrolyte Panel", "Thyroid Function Test", "Vitamin B12 Test"]),
    ("tremors", &["Thyroid Function Test", "Electrolyte Panel"]),
    ("chest tightness", &["CBC", "D-Dimer Test", "Troponin Test"]),
    ("swollen feet", &["Kidney Function Test", "Liver Function Test", "Albumin Test"]),
    ("frequent infections", &["CBC with Differential", "Immunoglobulin Panel"]),
    ("slow wound healing", &["Blood Sugar Test", "CBC", "Vitamin C Test"]),
    ("yellowing of skin or eyes", &["Liver Function Test", "Bilirubin Test"]),
    ("excessive sweating", &["Thyroid Function Test", "Glucose Test"]),
];
