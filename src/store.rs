//! Persistence and identity collaborators.
//!
//! The analysis pipeline never touches these; the request layer stores a
//! summary of each analyzed upload for authenticated users.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::ReportAnalysis;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Summary of one analyzed upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub user: UserId,
    pub filename: String,
    pub file_hash: String,
    pub uploaded_at: DateTime<Utc>,
    pub parameters_found: usize,
    pub abnormal_parameters: Vec<String>,
    pub recommendation: String,
}

impl ReportRecord {
    pub fn new(user: UserId, filename: String, file_hash: String, analysis: &ReportAnalysis) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            filename,
            file_hash,
            uploaded_at: Utc::now(),
            parameters_found: analysis.readings.len(),
            abnormal_parameters: analysis.abnormal().map(|r| r.parameter.clone()).collect(),
            recommendation: analysis.recommendation.to_string(),
        }
    }
}

pub trait ReportStore: Send + Sync {
    fn store_report(&self, record: ReportRecord);

    /// Reports of `user`, oldest first.
    fn list_reports(&self, user: &UserId) -> Vec<ReportRecord>;
}

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<UserId>;
}

#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<UserId, Vec<ReportRecord>>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn store_report(&self, record: ReportRecord) {
        let mut reports = self.reports.write().unwrap_or_else(|e| e.into_inner());
        reports.entry(record.user.clone()).or_default().push(record);
    }

    fn list_reports(&self, user: &UserId) -> Vec<ReportRecord> {
        let reports = self.reports.read().unwrap_or_else(|e| e.into_inner());
        reports.get(user).cloned().unwrap_or_default()
    }
}

/// Fixed bearer tokens, e.g. from configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticTokens {
    tokens: HashMap<String, UserId>,
}

impl StaticTokens {
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|(token, user)| (token, UserId(user)))
            .collect();
        Self { tokens }
    }

    /// Parse `token=user` pairs separated by commas. Malformed pairs are skipped.
    pub fn parse(spec: &str) -> Self {
        Self::new(spec.split(',').filter_map(|pair| {
            let (token, user) = pair.split_once('=')?;
            let (token, user) = (token.trim(), user.trim());
            if token.is_empty() || user.is_empty() {
                return None;
            }
            Some((token.to_string(), user.to_string()))
        }))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokens {
    fn authenticate(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).cloned()
    }
}
