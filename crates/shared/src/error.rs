use thiserror::Error;

/// Every way a scan attempt can fail, as surfaced to the driver. All
/// variants are recoverable by rescanning except an expired session, which
/// the shell routes to re-login.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanFailure {
    #[error("The scanned code could not be read. Please scan the order QR code again.")]
    UnrecognizedCode,
    #[error("Scanned '{got}' but expected '{expected}'. Please scan the correct package.")]
    WrongItem { expected: String, got: String },
    #[error("Officer '{officer_id}' is not authorized to receive a cash handover.")]
    UnauthorizedOfficer { officer_id: String },
    #[error("This order is already assigned to you.")]
    AlreadyAssignedToSelf,
    #[error("This order is assigned to another driver or is no longer available.")]
    AssignedToOther,
    #[error("This order is not ready for this step yet.")]
    NotReady,
    #[error("No order matches the scanned code.")]
    NotFound,
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,
    #[error("{0}")]
    Validation(String),
    #[error("The server reported an error: {0}")]
    Server(String),
    #[error("Could not reach the server: {0}")]
    Network(String),
    #[error("No QR code was detected. Tap to scan again.")]
    Inactivity,
}

impl ScanFailure {
    pub fn modal_title(&self) -> &'static str {
        match self {
            ScanFailure::UnrecognizedCode => "Unrecognized QR Code",
            ScanFailure::WrongItem { .. } => "Wrong Package Scanned",
            ScanFailure::UnauthorizedOfficer { .. } => "Unauthorized Officer",
            ScanFailure::AlreadyAssignedToSelf => "Already Assigned",
            ScanFailure::AssignedToOther => "Order Unavailable",
            ScanFailure::NotReady => "Order Not Ready",
            ScanFailure::NotFound => "Order Not Found",
            ScanFailure::SessionExpired => "Session Expired",
            ScanFailure::Validation(_) => "Invalid Request",
            ScanFailure::Server(_) => "Server Error",
            ScanFailure::Network(_) => "Connection Problem",
            ScanFailure::Inactivity => "No Scan Detected",
        }
    }

    /// Whether the recovery action is "dismiss and rescan". The only
    /// exception is an expired session, which needs re-authentication.
    pub fn offers_rescan(&self) -> bool {
        !matches!(self, ScanFailure::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiry_does_not_offer_rescan() {
        assert!(!ScanFailure::SessionExpired.offers_rescan());
        assert!(ScanFailure::UnrecognizedCode.offers_rescan());
        assert!(ScanFailure::Inactivity.offers_rescan());
    }

    #[test]
    fn wrong_item_message_names_both_identifiers() {
        let failure = ScanFailure::WrongItem {
            expected: "INV001".into(),
            got: "INV002".into(),
        };
        let message = failure.to_string();
        assert!(message.contains("INV001"));
        assert!(message.contains("INV002"));
    }
}
