//! Diffing processor-supplied payment attributes against the ledger record.
//!
//! The resulting patch is minimal and first-write-wins: a field is included
//! only when the processor supplies a non-empty value and the ledger does not
//! already hold one. A later, possibly stale, gateway response can therefore
//! never clobber previously recorded data, and re-reconciling an already
//! patched field produces no further writes.

use serde_json::Value;

use crate::domain::{LedgerPayment, PaymentPatch, ProcessorPayment, is_filled};

pub(crate) fn attribute_patch(
    ledger: Option<&LedgerPayment>,
    processor: Option<&ProcessorPayment>,
) -> PaymentPatch {
    let mut patch = PaymentPatch::default();
    let Some(processor) = processor else {
        return patch;
    };

    fill(
        &mut patch.email,
        ledger.and_then(|l| l.email.as_deref()),
        processor.email.as_deref(),
    );
    fill(
        &mut patch.worldpay_id,
        ledger.and_then(|l| l.worldpay_id.as_deref()),
        processor.provider_id.as_deref(),
    );

    if let Some(card) = processor.card_details.as_ref() {
        fill(
            &mut patch.cardholder_name,
            ledger.and_then(|l| l.cardholder_name.as_deref()),
            card.cardholder_name.as_deref(),
        );
        fill(
            &mut patch.card_brand,
            ledger.and_then(|l| l.card_brand.as_deref()),
            card.card_brand.as_deref(),
        );
        fill(
            &mut patch.card_number_first_digits,
            ledger.and_then(|l| l.card_number_first_digits.as_deref()),
            card.first_digits_card_number.as_deref(),
        );
        fill(
            &mut patch.card_number_last_digits,
            ledger.and_then(|l| l.card_number_last_digits.as_deref()),
            card.last_digits_card_number.as_deref(),
        );
        fill(
            &mut patch.card_expiry_date,
            ledger.and_then(|l| l.card_expiry_date.as_deref()),
            card.expiry_date.as_deref(),
        );

        let current_address = ledger.and_then(|l| l.billing_address.as_ref());
        if value_filled(card.billing_address.as_ref()) && !value_filled(current_address) {
            patch.billing_address = card.billing_address.clone();
        }
    }

    patch
}

fn fill(slot: &mut Option<String>, current: Option<&str>, incoming: Option<&str>) {
    if is_filled(incoming) && !is_filled(current) {
        *slot = incoming.map(str::to_string);
    }
}

fn value_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
