//! Two-phase access to a form instance.
//!
//! A host that creates a form handle before the form itself exists can
//! still issue calls; they are queued and replayed in order once the
//! instance is attached. Results become readable after replay.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::form::methods::SchemaForm;
use crate::form::props::SchemaFormProps;

type QueuedCall = Box<dyn FnOnce(&mut SchemaForm)>;

/// Result of a call that may have been queued.
pub struct PendingResult<R>(Rc<RefCell<Option<R>>>);

impl<R> Clone for PendingResult<R> {
    fn clone(&self) -> Self {
        PendingResult(Rc::clone(&self.0))
    }
}

impl<R: fmt::Debug> fmt::Debug for PendingResult<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PendingResult").field(&self.0.borrow()).finish()
    }
}

impl<R> PendingResult<R> {
    pub fn is_ready(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Take the value out, leaving the result empty.
    pub fn take(&self) -> Option<R> {
        self.0.borrow_mut().take()
    }
}

impl<R: Clone> PendingResult<R> {
    pub fn get(&self) -> Option<R> {
        self.0.borrow().clone()
    }
}

enum Slot {
    Pending {
        props: Option<SchemaFormProps>,
        queue: Vec<QueuedCall>,
    },
    Ready(SchemaForm),
}

/// Handle over a form that may not be attached yet.
pub struct FormHandle {
    slot: Slot,
}

impl Default for FormHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Pending { queue, .. } => f
                .debug_struct("FormHandle")
                .field("pending_calls", &queue.len())
                .finish(),
            Slot::Ready(form) => f.debug_struct("FormHandle").field("form", form).finish(),
        }
    }
}

impl FormHandle {
    pub fn new() -> Self {
        FormHandle {
            slot: Slot::Pending {
                props: None,
                queue: Vec::new(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.slot, Slot::Ready(_))
    }

    pub fn pending_calls(&self) -> usize {
        match &self.slot {
            Slot::Pending { queue, .. } => queue.len(),
            Slot::Ready(_) => 0,
        }
    }

    /// Run `f` now when attached, otherwise queue it.
    pub fn call<R: 'static>(&mut self, f: impl FnOnce(&mut SchemaForm) -> R + 'static) -> PendingResult<R> {
        let result = PendingResult(Rc::new(RefCell::new(None)));
        match &mut self.slot {
            Slot::Ready(form) => {
                *result.0.borrow_mut() = Some(f(form));
            }
            Slot::Pending { queue, .. } => {
                let out = result.clone();
                queue.push(Box::new(move |form| {
                    *out.0.borrow_mut() = Some(f(form));
                }));
            }
        }
        result
    }

    /// Props registered before attach are applied first on attach.
    pub fn set_props(&mut self, props: SchemaFormProps) {
        match &mut self.slot {
            Slot::Ready(form) => form.set_schema_form_props(props),
            Slot::Pending { props: stored, .. } => *stored = Some(props),
        }
    }

    /// Attach the instance and replay queued calls in order.
    pub fn resolve(&mut self, mut form: SchemaForm) {
        let previous = std::mem::replace(&mut self.slot, Slot::Pending { props: None, queue: Vec::new() });
        match previous {
            Slot::Pending { props, queue } => {
                if let Some(props) = props {
                    form.set_schema_form_props(props);
                }
                tracing::debug!("form attached, replaying {} queued call(s)", queue.len());
                for call in queue {
                    call(&mut form);
                }
            }
            Slot::Ready(_) => {
                tracing::warn!("form handle resolved twice; replacing the attached instance");
            }
        }
        self.slot = Slot::Ready(form);
    }

    pub fn form(&self) -> Option<&SchemaForm> {
        match &self.slot {
            Slot::Ready(form) => Some(form),
            Slot::Pending { .. } => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut SchemaForm> {
        match &mut self.slot {
            Slot::Ready(form) => Some(form),
            Slot::Pending { .. } => None,
        }
    }
}
