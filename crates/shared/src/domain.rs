use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(OrderId);

/// Case-insensitive, whitespace-trimmed identifier comparison. All matching
/// between decoded QR values and expected identifiers goes through this.
pub fn ids_match(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    AssignOrder,
    HoldOrder,
    ReturnOrder,
    CashHandover,
    VerifyOfficer,
}

impl WorkflowKind {
    /// Officer-facing workflows decode against the officer id rules, the
    /// rest against invoice rules.
    pub fn decode_profile(self) -> DecodeProfile {
        match self {
            WorkflowKind::CashHandover | WorkflowKind::VerifyOfficer => DecodeProfile::Officer,
            _ => DecodeProfile::Invoice,
        }
    }
}

/// Which extraction rules apply to a raw QR payload. Officer ids are shorter
/// than invoice numbers, so the minimum run length differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeProfile {
    Invoice,
    Officer,
}

/// The identifier a verification-style scan must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub expected_id: String,
}

impl ScanTarget {
    pub fn new(expected_id: impl Into<String>) -> Self {
        Self {
            expected_id: expected_id.into(),
        }
    }
}

/// Persisted evidence that an order's QR was successfully scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub order_id: OrderId,
    pub invoice_no: String,
    pub scanned_at: DateTime<Utc>,
}

/// One order in a multi-item batch, keyed by its invoice number on the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMember {
    pub order_id: OrderId,
    pub invoice_no: String,
}

impl BatchMember {
    pub fn new(order_id: OrderId, invoice_no: impl Into<String>) -> Self {
        Self {
            order_id,
            invoice_no: invoice_no.into(),
        }
    }
}

/// The set of orders that must all be scanned before a workflow completes.
/// Duplicate order ids collapse on construction so completion counting stays
/// a set-equality check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanBatch {
    members: Vec<BatchMember>,
}

impl ScanBatch {
    pub fn new(members: Vec<BatchMember>) -> Self {
        let mut deduped: Vec<BatchMember> = Vec::with_capacity(members.len());
        for member in members {
            if !deduped.iter().any(|m| m.order_id == member.order_id) {
                deduped.push(member);
            }
        }
        Self { members: deduped }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[BatchMember] {
        &self.members
    }

    pub fn order_ids(&self) -> Vec<OrderId> {
        self.members.iter().map(|m| m.order_id).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_for_invoice(&self, invoice_no: &str) -> Option<&BatchMember> {
        self.members
            .iter()
            .find(|m| ids_match(&m.invoice_no, invoice_no))
    }
}
