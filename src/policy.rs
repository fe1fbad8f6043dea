use std::collections::BTreeSet;

use serde::Serialize;

use crate::plan::{Action, Plan};

/// Security review policy: which resource types need elevated approval, and
/// which approval group gets pulled in when one of them changes.
///
/// The registry is injected, never compiled in, so the policy can be widened
/// without touching the scanner.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    types: BTreeSet<String>,
    approval_group: String,
}

/// How far a scan runs once it starts matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Stop on the first qualifying (change, action) pair.
    FailFast,
    /// Record every qualifying pair, for audit trails.
    Exhaustive,
}

/// A single detected match between a resource change and the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub action: Action,
}

/// Aggregate decision for one plan scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub mode: ScanMode,
    pub findings: Vec<Finding>,
}

impl Verdict {
    pub fn triggered(&self) -> bool {
        !self.findings.is_empty()
    }
}

impl SecurityPolicy {
    pub fn new(
        types: impl IntoIterator<Item = String>,
        approval_group: impl Into<String>,
    ) -> Self {
        Self {
            types: types.into_iter().collect(),
            approval_group: approval_group.into(),
        }
    }

    pub fn approval_group(&self) -> &str {
        &self.approval_group
    }

    /// Exact, case-sensitive registry membership.
    pub fn is_security_type(&self, resource_type: &str) -> bool {
        self.types.contains(resource_type)
    }

    /// Scan a plan's resource changes in document order.
    ///
    /// A finding is recorded for each registered resource type proposing a
    /// create, update, or delete. Read and no-op actions never match, and
    /// neither do action kinds outside the known vocabulary.
    pub fn scan(&self, plan: &Plan, mode: ScanMode) -> Verdict {
        let mut findings = Vec::new();

        'changes: for change in &plan.resource_changes {
            if !self.is_security_type(&change.resource_type) {
                continue;
            }

            for action in &change.change.actions {
                if !action.is_mutating() {
                    continue;
                }

                tracing::debug!(
                    address = %change.address,
                    action = %action,
                    "security-sensitive change matched"
                );

                findings.push(Finding {
                    address: change.address.clone(),
                    resource_type: change.resource_type.clone(),
                    action: action.clone(),
                });

                if mode == ScanMode::FailFast {
                    break 'changes;
                }
            }
        }

        Verdict { mode, findings }
    }
}
