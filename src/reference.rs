//! Reference ranges for blood test parameters.
//!
//! A [`ReferenceTable`] is an ordered, immutable list of [`ReferenceRange`]s.
//! Its iteration order is the order readings are reported in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normal interval for one parameter. Values in `[min, max]` are normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub explanation: String,
}

impl ReferenceRange {
    pub fn new(
        name: impl Into<String>,
        min: f64,
        max: f64,
        unit: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Result<Self> {
        let range = Self {
            name: name.into(),
            min,
            max,
            unit: unit.into(),
            explanation: explanation.into(),
        };
        range.validate()?;
        Ok(range)
    }

    fn validate(&self) -> Result<()> {
        // A blank name would match any number in the text
        if self.name.trim().is_empty() {
            return Err(Error::EmptyParameterName);
        }
        // NaN bounds fail this check as well
        if !(self.min <= self.max) {
            return Err(Error::InvalidRange {
                name: self.name.clone(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    ranges: Vec<ReferenceRange>,
}

impl ReferenceTable {
    /// Build a table, rejecting blank names, inverted bounds and duplicate
    /// names.
    pub fn new(ranges: Vec<ReferenceRange>) -> Result<Self> {
        let mut seen = HashSet::new();
        for range in &ranges {
            range.validate()?;
            if !seen.insert(range.name.as_str()) {
                return Err(Error::DuplicateParameter(range.name.clone()));
            }
        }
        Ok(Self { ranges })
    }

    /// Load a table from a JSON array of range objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let ranges: Vec<ReferenceRange> = serde_json::from_str(json)?;
        Self::new(ranges)
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceRange> {
        self.ranges.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The canonical adult blood panel.
    pub fn builtin() -> Self {
        let ranges = BUILTIN_RANGES
            .iter()
            .map(|&(name, min, max, unit, explanation)| ReferenceRange {
                name: name.to_string(),
                min,
                max,
                unit: unit.to_string(),
                explanation: explanation.to_string(),
            })
            .collect();
        Self { ranges }
    }
}

impl<'a> IntoIterator for &'a ReferenceTable {
    type Item = &'a ReferenceRange;
    type IntoIter = std::slice::Iter<'a, ReferenceRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

const BUILTIN_RANGES: &[(&str, f64, f64, &str, &str)] = &[
    ("hemoglobin", 13.5, 17.5, "g/dL", "Low hemoglobin may indicate anemia."),
    ("rbc", 4.7, 6.1, "million cells/mcL", "Abnormal RBC count may suggest anemia or polycythemia."),
    ("wbc", 4500.0, 11000.0, "cells/mcL", "High WBC can indicate infection or inflammation."),
    ("platelets", 150000.0, 450000.0, "platelets/mcL", "Low platelets may lead to bleeding problems."),
    ("glucose", 70.0, 100.0, "mg/dL", "High glucose levels can indicate diabetes."),
    ("creatinine", 0.6, 1.3, "mg/dL", "High creatinine may suggest kidney dysfunction."),
    ("urea", 7.0, 20.0, "mg/dL", "High urea may suggest kidney dysfunction or dehydration."),
    ("bilirubin", 0.1, 1.2, "mg/dL", "High bilirubin may suggest liver dysfunction or hemolysis."),
    ("alt", 7.0, 56.0, "U/L", "High ALT may suggest liver injury."),
    ("ast", 10.0, 40.0, "U/L", "High AST may suggest liver or muscle damage."),
    ("cholesterol", 125.0, 200.0, "mg/dL", "High cholesterol is a risk factor for heart disease."),
    ("triglycerides", 0.0, 150.0, "mg/dL", "High triglycerides may suggest metabolic syndrome or heart disease."),
    ("hdl", 40.0, 60.0, "mg/dL", "Low HDL increases heart disease risk."),
    ("ldl", 0.0, 130.0, "mg/dL", "High LDL increases heart disease risk."),
    ("sodium", 135.0, 145.0, "mEq/L", "Abnormal sodium levels may cause dehydration or electrolyte imbalance."),
    ("potassium", 3.5, 5.0, "mEq/L", "Abnormal potassium can cause heart rhythm problems."),
    ("calcium", 8.5, 10.2, "mg/dL", "Low calcium may cause muscle spasms; high may suggest parathyroid disorder."),
    ("phosphate", 2.5, 4.5, "mg/dL", "Abnormal phosphate can affect bone health and kidney function."),
    ("magnesium", 1.7, 2.2, "mg/dL", "Low magnesium can cause muscle cramps and arrhythmias."),
    ("total protein", 6.0, 8.3, "g/dL", "Abnormal protein may suggest liver or kidney disease."),
    ("albumin", 3.5, 5.0, "g/dL", "Low albumin suggests liver/kidney disease or malnutrition."),
    ("crp", 0.0, 10.0, "mg/L", "High CRP indicates inflammation or infection."),
    ("vitamin d", 20.0, 50.0, "ng/mL", "Low vitamin D may suggest bone disorders or deficiency."),
    ("vitamin b12", 200.0, 900.0, "pg/mL", "Low B12 can cause anemia and neurological issues."),
];
