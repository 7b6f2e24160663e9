//! Types mirroring the processor's payment payloads and the canonical status
//! enumeration derived from them.

use serde::Deserialize;

/// Canonical processor-side lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorStatus {
    Created,
    Started,
    Submitted,
    Capturable,
    Success,
    Failed,
    Cancelled,
    Error,
}

impl ProcessorStatus {
    pub const ALL: [ProcessorStatus; 8] = [
        ProcessorStatus::Created,
        ProcessorStatus::Started,
        ProcessorStatus::Submitted,
        ProcessorStatus::Capturable,
        ProcessorStatus::Success,
        ProcessorStatus::Failed,
        ProcessorStatus::Cancelled,
        ProcessorStatus::Error,
    ];

    /// Whether the processor will never move this payment again.
    pub fn finished(self) -> bool {
        matches!(
            self,
            ProcessorStatus::Success
                | ProcessorStatus::Failed
                | ProcessorStatus::Cancelled
                | ProcessorStatus::Error
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ProcessorStatus::Created => "created",
            ProcessorStatus::Started => "started",
            ProcessorStatus::Submitted => "submitted",
            ProcessorStatus::Capturable => "capturable",
            ProcessorStatus::Success => "success",
            ProcessorStatus::Failed => "failed",
            ProcessorStatus::Cancelled => "cancelled",
            ProcessorStatus::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.name() == name)
    }
}

/// The `state` object the processor attaches to every payment and event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentState {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Settlement timing as reported by the processor. Both fields arrive as
/// strings and may be absent, blank or unparseable; parsing is lenient.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettlementSummary {
    #[serde(default)]
    pub capture_submit_time: Option<String>,
    #[serde(default)]
    pub captured_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub cardholder_name: Option<String>,
    #[serde(default)]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub first_digits_card_number: Option<String>,
    #[serde(default)]
    pub last_digits_card_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub billing_address: Option<serde_json::Value>,
}

/// A transient snapshot of one processor payment, re-fetched every cycle and
/// never persisted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessorPayment {
    pub payment_id: String,
    #[serde(default)]
    pub state: PaymentState,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub settlement_summary: Option<SettlementSummary>,
    #[serde(default)]
    pub card_details: Option<CardDetails>,
    #[serde(default)]
    pub provider_id: Option<String>,
}

/// One entry of a payment's event history: a past state the payment was in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentEvent {
    #[serde(default)]
    pub state: PaymentState,
}

impl PaymentEvent {
    pub fn was(&self, status: ProcessorStatus) -> bool {
        self.state.status.as_deref() == Some(status.name())
    }
}
