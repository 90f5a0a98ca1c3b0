//! Mapping of backend responses onto the scan failure taxonomy.
//!
//! The backend does not emit machine-readable error codes, so classification
//! is a fixed, ordered list of status/substring checks over the response
//! `message` — first match wins. The brittleness is deliberate and contained
//! here: when the backend grows stable codes, only this module changes.

use shared::error::ScanFailure;

/// Classifies a non-success backend response into a user-facing failure.
pub fn classify_response(status: u16, message: &str) -> ScanFailure {
    let msg = message.to_ascii_lowercase();

    if msg.contains("already assigned to you") || msg.contains("already scanned") {
        return ScanFailure::AlreadyAssignedToSelf;
    }
    if status == 409
        || msg.contains("assigned to another")
        || msg.contains("not available")
        || msg.contains("unavailable")
    {
        return ScanFailure::AssignedToOther;
    }
    if msg.contains("not ready") || msg.contains("not yet") {
        return ScanFailure::NotReady;
    }
    if status == 404
        || msg.contains("not found")
        || msg.contains("invalid invoice")
        || msg.contains("invalid order")
    {
        return ScanFailure::NotFound;
    }
    if status == 401
        || msg.contains("unauthorized")
        || msg.contains("session expired")
        || msg.contains("token expired")
    {
        return ScanFailure::SessionExpired;
    }
    if status == 400 || msg.contains("validation") {
        return ScanFailure::Validation(non_empty(message, "The request was rejected."));
    }
    if status >= 500 || msg.contains("server error") {
        return ScanFailure::Server(non_empty(message, "unexpected server failure"));
    }

    ScanFailure::Network(non_empty(message, "no response from server"))
}

fn non_empty(message: &str, fallback: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
