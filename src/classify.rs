use serde::Serialize;

use crate::reference::ReferenceRange;

pub const NORMAL_EXPLANATION: &str = "Within normal range.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Normal,
    Abnormal,
}

/// Which side of the reference interval an abnormal value falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Deviation {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: Status,
    pub deviation: Option<Deviation>,
    pub explanation: String,
}

/// A classified value for one parameter found in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<Deviation>,
    pub explanation: String,
}

impl Reading {
    pub fn new(range: &ReferenceRange, value: f64) -> Self {
        let Classification {
            status,
            deviation,
            explanation,
        } = classify(value, range);
        Self {
            parameter: range.name.clone(),
            value,
            unit: range.unit.clone(),
            status,
            deviation,
            explanation,
        }
    }

    pub fn is_abnormal(&self) -> bool {
        self.status == Status::Abnormal
    }
}

/// Compare `value` against `range`, both bounds inclusive.
///
/// Reference explanations are written for the high side; the low-side
/// message wraps the explanation instead of rewriting it.
pub fn classify(value: f64, range: &ReferenceRange) -> Classification {
    if value < range.min {
        Classification {
            status: Status::Abnormal,
            deviation: Some(Deviation::Low),
            explanation: format!("Low {}: {}", range.name, range.explanation),
        }
    } else if value > range.max {
        Classification {
            status: Status::Abnormal,
            deviation: Some(Deviation::High),
            explanation: range.explanation.clone(),
        }
    } else {
        Classification {
            status: Status::Normal,
            deviation: None,
            explanation: NORMAL_EXPLANATION.to_string(),
        }
    }
}
