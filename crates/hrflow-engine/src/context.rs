//! Per-request update context

use hrflow_audit::CaptureContext;
use hrflow_core::domain::{Actor, RequestId};

/// Who is updating, and why
///
/// Built by the host for every request and passed into each pipeline call;
/// nothing from one request's context survives into the next.
#[derive(Debug, Clone)]
pub struct UpdateContext {
    pub actor: Actor,
    /// Optional label of what triggered the update (copied onto audit records)
    pub trigger: Option<String>,
    pub request_id: RequestId,
}

impl UpdateContext {
    /// Creates a context with a fresh request id
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            trigger: None,
            request_id: RequestId::new(),
        }
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Borrows the parts the audit logger needs
    pub fn capture_context(&self) -> CaptureContext<'_> {
        let ctx = CaptureContext::new(&self.actor).with_request_id(self.request_id);
        match self.trigger.as_deref() {
            Some(trigger) => ctx.with_trigger(trigger),
            None => ctx,
        }
    }
}
