//! The per-screen scan state machine.
//!
//! One `ScanWorkflow` instance replaces the app's copy-pasted scan screens:
//! the same controller drives order assignment, hold, return, cash handover
//! and officer verification, parameterized by [`WorkflowConfig`]. Camera
//! detections and the inactivity timer race; the `scanned`/`loading` guard
//! flags decide the winner and neutralize the loser.

use std::{sync::Arc, time::Duration};

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared::{
    domain::{ids_match, OrderId, ScanBatch, ScanTarget, WorkflowKind},
    error::ScanFailure,
    store::ScanStore,
};

use crate::{
    api::DeliveryApi,
    decode,
    session::{BatchProgress, ScanSession},
    timeout::{TimeoutSupervisor, ASSIGNMENT_SCAN_TIMEOUT, CONFIRMATION_SCAN_TIMEOUT},
};

/// Role prefixes allowed to receive a cash handover.
pub const OFFICER_ROLE_PREFIXES: &[&str] = &["DCM", "DCH"];

pub fn officer_id_authorized(officer_id: &str) -> bool {
    let id = officer_id.trim().to_ascii_uppercase();
    OFFICER_ROLE_PREFIXES
        .iter()
        .any(|prefix| id.starts_with(prefix))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Scanning,
    Processing,
    Success {
        invoice_no: String,
        progress: Option<BatchProgress>,
    },
    Failed(ScanFailure),
    TimedOut,
}

/// Modal title and message for a terminal state, if the state shows one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalContent {
    pub title: String,
    pub message: String,
}

impl WorkflowState {
    pub fn modal(&self) -> Option<ModalContent> {
        match self {
            WorkflowState::Success {
                invoice_no,
                progress,
            } => {
                let message = match progress {
                    Some(p) if !p.is_complete() => {
                        format!("{invoice_no} accepted. Scanned {} of {} orders.", p.scanned, p.total)
                    }
                    _ => format!("{invoice_no} accepted."),
                };
                Some(ModalContent {
                    title: "Scan Successful".to_string(),
                    message,
                })
            }
            WorkflowState::Failed(failure) => Some(ModalContent {
                title: failure.modal_title().to_string(),
                message: failure.to_string(),
            }),
            WorkflowState::TimedOut => {
                let failure = ScanFailure::Inactivity;
                Some(ModalContent {
                    title: failure.modal_title().to_string(),
                    message: failure.to_string(),
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StateChanged(WorkflowState),
    /// Fired exactly once, when the batch completes and the success modal is
    /// acknowledged.
    Navigate {
        route: String,
        order_ids: Vec<OrderId>,
    },
}

/// Everything that differs between the scan screens.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub kind: WorkflowKind,
    /// Set for verification-style flows; the scan must match this value and
    /// no API call is made.
    pub target: Option<ScanTarget>,
    pub batch: ScanBatch,
    pub scan_timeout: Duration,
    pub success_route: String,
}

impl WorkflowConfig {
    /// An assignment-style flow: no expected identifier, the decoded value
    /// goes to the backend.
    pub fn assignment(kind: WorkflowKind, batch: ScanBatch, success_route: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            batch,
            scan_timeout: ASSIGNMENT_SCAN_TIMEOUT,
            success_route: success_route.into(),
        }
    }

    /// A verification-style flow: the scan must match `target` locally.
    pub fn verification(
        kind: WorkflowKind,
        target: ScanTarget,
        batch: ScanBatch,
        success_route: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target: Some(target),
            batch,
            scan_timeout: CONFIRMATION_SCAN_TIMEOUT,
            success_route: success_route.into(),
        }
    }

    pub fn with_scan_timeout(mut self, scan_timeout: Duration) -> Self {
        self.scan_timeout = scan_timeout;
        self
    }
}

struct ControllerState {
    state: WorkflowState,
    scanned: bool,
    loading: bool,
    navigated: bool,
}

pub struct ScanWorkflow {
    id: Uuid,
    config: WorkflowConfig,
    api: Arc<dyn DeliveryApi>,
    session: ScanSession,
    timer: TimeoutSupervisor,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl ScanWorkflow {
    pub fn new(
        config: WorkflowConfig,
        api: Arc<dyn DeliveryApi>,
        store: Arc<dyn ScanStore>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let session = ScanSession::new(store, config.batch.clone());
        Arc::new(Self {
            id: Uuid::new_v4(),
            config,
            api,
            session,
            timer: TimeoutSupervisor::new(),
            inner: Mutex::new(ControllerState {
                state: WorkflowState::Idle,
                scanned: false,
                loading: false,
                navigated: false,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub async fn state(&self) -> WorkflowState {
        self.inner.lock().await.state.clone()
    }

    /// Camera is live: reset the guard flags and arm the inactivity timer.
    pub async fn begin_scanning(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock().await;
            inner.scanned = false;
            inner.loading = false;
            inner.state = WorkflowState::Scanning;
        }
        self.emit_state(WorkflowState::Scanning);

        let workflow = Arc::clone(self);
        self.timer.reset(self.config.scan_timeout, async move {
            workflow.on_timer_fired().await;
        });
    }

    /// One camera detection of a QR payload. Duplicate detections of the
    /// same physical code are no-ops while a result is pending.
    pub async fn handle_scan(self: &Arc<Self>, raw: &str) {
        {
            let mut inner = self.inner.lock().await;
            if inner.scanned || inner.loading {
                debug!(workflow = %self.id, "scan ignored, already handling one");
                return;
            }
            inner.scanned = true;
        }
        self.timer.cancel();

        let profile = self.config.kind.decode_profile();
        let Some(decoded) = decode::decode(raw, profile) else {
            warn!(workflow = %self.id, "unrecognized QR payload");
            self.fail(ScanFailure::UnrecognizedCode).await;
            return;
        };

        // Verification flows match locally and never hit the backend.
        if let Some(target) = &self.config.target {
            if !ids_match(&decoded, &target.expected_id) {
                self.fail(ScanFailure::WrongItem {
                    expected: target.expected_id.clone(),
                    got: decoded,
                })
                .await;
                return;
            }
            self.succeed(decoded).await;
            return;
        }

        if self.config.kind == WorkflowKind::CashHandover && !officer_id_authorized(&decoded) {
            self.fail(ScanFailure::UnauthorizedOfficer {
                officer_id: decoded,
            })
            .await;
            return;
        }

        {
            let mut inner = self.inner.lock().await;
            inner.loading = true;
            inner.state = WorkflowState::Processing;
        }
        self.emit_state(WorkflowState::Processing);

        let result = self.submit(&decoded).await;

        {
            let mut inner = self.inner.lock().await;
            inner.loading = false;
        }

        match result {
            Ok(()) => self.succeed(decoded).await,
            Err(failure) => self.fail(failure).await,
        }
    }

    /// Dismisses the current modal. Errors and timeouts resume scanning;
    /// a success resumes scanning unless the batch completed, in which case
    /// the navigation signal fires (once) instead.
    pub async fn acknowledge(self: &Arc<Self>) {
        let state = self.state().await;
        match state {
            WorkflowState::Success { .. } => {
                let complete = if self.config.batch.is_empty() {
                    true
                } else {
                    self.session.progress().await.is_complete()
                };
                if complete {
                    {
                        let mut inner = self.inner.lock().await;
                        if inner.navigated {
                            return;
                        }
                        inner.navigated = true;
                        inner.state = WorkflowState::Idle;
                    }
                    self.session.finish().await;
                    info!(workflow = %self.id, route = %self.config.success_route, "batch complete");
                    let _ = self.events.send(WorkflowEvent::Navigate {
                        route: self.config.success_route.clone(),
                        order_ids: self.config.batch.order_ids(),
                    });
                    return;
                }
                self.begin_scanning().await;
            }
            WorkflowState::Failed(_) | WorkflowState::TimedOut => {
                self.begin_scanning().await;
            }
            _ => {}
        }
    }

    /// Screen lost focus: cancel the timer and go quiet. Any in-flight API
    /// call finishes on its own; the guard flags keep its result from
    /// racing a dismissed screen.
    pub async fn deactivate(&self) {
        self.timer.cancel();
        let mut inner = self.inner.lock().await;
        inner.state = WorkflowState::Idle;
        inner.scanned = false;
        inner.loading = false;
    }

    async fn on_timer_fired(&self) {
        {
            let mut inner = self.inner.lock().await;
            if inner.scanned || inner.loading {
                debug!(workflow = %self.id, "timer fired after a scan was accepted, ignoring");
                return;
            }
            inner.state = WorkflowState::TimedOut;
        }
        self.emit_state(WorkflowState::TimedOut);
    }

    async fn submit(&self, decoded: &str) -> Result<(), ScanFailure> {
        match self.config.kind {
            WorkflowKind::AssignOrder => self.api.assign_order(decoded).await,
            WorkflowKind::HoldOrder => self.api.hold_order(decoded).await,
            WorkflowKind::ReturnOrder => self.api.return_order(decoded).await,
            WorkflowKind::CashHandover => self.api.hand_over_cash(decoded).await,
            WorkflowKind::VerifyOfficer => self.api.verify_officer(decoded).await,
        }
    }

    async fn succeed(&self, decoded: String) {
        let progress = if let Some(member) = self.config.batch.member_for_invoice(&decoded) {
            self.session
                .record_scan(member.order_id, &member.invoice_no)
                .await;
            Some(self.session.progress().await)
        } else if self.config.batch.is_empty() {
            None
        } else {
            Some(self.session.progress().await)
        };

        info!(workflow = %self.id, invoice = %decoded, "scan accepted");
        let state = WorkflowState::Success {
            invoice_no: decoded,
            progress,
        };
        self.inner.lock().await.state = state.clone();
        self.emit_state(state);
    }

    async fn fail(&self, failure: ScanFailure) {
        info!(workflow = %self.id, title = failure.modal_title(), "scan failed");
        let state = WorkflowState::Failed(failure);
        self.inner.lock().await.state = state.clone();
        self.emit_state(state);
    }

    fn emit_state(&self, state: WorkflowState) {
        let _ = self.events.send(WorkflowEvent::StateChanged(state));
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
