//! Extraction of an order/officer identifier from a raw QR payload.
//!
//! Rules are ordered and the first match wins:
//! 1. an `INV` + digits substring anywhere in the payload,
//! 2. a known identifier field inside a JSON object payload,
//! 3. the whole trimmed payload when it is a plain alphanumeric code,
//! 4. the longest embedded alphanumeric run.
//!
//! Decoding never fails loudly; an unusable payload yields `None` and the
//! caller treats it as an unrecognized QR.

use serde_json::Value;

use shared::domain::DecodeProfile;

const INVOICE_JSON_KEYS: &[&str] = &["invNo", "invoiceNo", "invoiceNumber", "invoice"];
const OFFICER_JSON_KEYS: &[&str] = &[
    "empId",
    "officerId",
    "officer_id",
    "officerID",
    "id",
    "userId",
    "user_id",
    "employeeId",
    "employee_id",
];

fn json_keys(profile: DecodeProfile) -> &'static [&'static str] {
    match profile {
        DecodeProfile::Invoice => INVOICE_JSON_KEYS,
        DecodeProfile::Officer => OFFICER_JSON_KEYS,
    }
}

fn min_run_len(profile: DecodeProfile) -> usize {
    match profile {
        DecodeProfile::Invoice => 6,
        DecodeProfile::Officer => 3,
    }
}

const MAX_WHOLE_LEN: usize = 20;

/// Best-guess identifier for a scanned payload, or `None` when nothing in
/// the payload looks like one.
pub fn decode(raw: &str, profile: DecodeProfile) -> Option<String> {
    if let Some(invoice) = find_inv_number(raw) {
        return Some(invoice);
    }

    if let Some(field) = json_identifier(raw, profile) {
        return Some(field);
    }

    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if (min_run_len(profile)..=MAX_WHOLE_LEN).contains(&len) && is_code_run(trimmed) {
        return Some(trimmed.to_string());
    }

    longest_code_run(raw, profile)
}

/// Rule 1: the first `INV` (any case) followed by one or more digits. The
/// returned substring keeps the payload's original casing.
fn find_inv_number(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    for start in 0..bytes.len().saturating_sub(3) {
        if !bytes[start..start + 3].eq_ignore_ascii_case(b"INV") {
            continue;
        }
        let mut end = start + 3;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > start + 3 {
            return Some(raw[start..end].to_string());
        }
    }
    None
}

/// Rule 2: a JSON object payload carrying the identifier under one of a
/// fixed, ordered set of field names. Parse failure falls through silently.
fn json_identifier(raw: &str, profile: DecodeProfile) -> Option<String> {
    let value: Value = serde_json::from_str(raw.trim()).ok()?;
    let object = value.as_object()?;
    for key in json_keys(profile) {
        match object.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn is_code_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit()
}

fn is_code_run(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_code_char)
}

/// Rule 4: longest run of `[A-Z0-9]` at or above the profile's minimum
/// length, skipping runs that are really JSON key names. First run wins a
/// length tie.
fn longest_code_run(raw: &str, profile: DecodeProfile) -> Option<String> {
    let min_len = min_run_len(profile);
    let keys = json_keys(profile);
    let mut best: Option<&str> = None;

    let mut rest = raw;
    while !rest.is_empty() {
        let Some(start) = rest.find(is_code_char) else {
            break;
        };
        let after_start = &rest[start..];
        let end = after_start
            .find(|c: char| !is_code_char(c))
            .unwrap_or(after_start.len());
        let run = &after_start[..end];

        let is_key_name = keys.iter().any(|key| run.eq_ignore_ascii_case(key));
        if run.len() >= min_len && !is_key_name && best.map_or(true, |b| run.len() > b.len()) {
            best = Some(run);
        }

        rest = &after_start[end..];
    }

    best.map(str::to_string)
}
