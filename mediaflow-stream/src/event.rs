//! Events, probes and the output interface

use crate::uref::Uref;

/// Events raised by pipes towards their probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The pipe is initialized and ready for input.
    Ready,
    /// The framer found a synchronization point in the stream.
    SyncAcquired,
    /// The framer lost synchronization and waits for the next one.
    SyncLost,
    /// A new output flow definition has been derived.
    NewFlowDefinition,
    /// An allocation failed; the affected frame was dropped.
    AllocationError,
    /// The input flow definition is missing or of the wrong type.
    FlowDefinitionError,
    /// The pipe is being destroyed.
    Dead,
}

/// Receiver of pipe events.
pub trait Probe {
    /// Handle one event.
    fn throw(&mut self, event: Event);
}

impl<F: FnMut(Event)> Probe for F {
    fn throw(&mut self, event: Event) {
        self(event)
    }
}

/// Probe that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProbe;

impl Probe for NullProbe {
    fn throw(&mut self, _event: Event) {}
}

/// Downstream consumer of framed output.
pub trait FrameSink {
    /// Announce the flow definition that applies to subsequent frames.
    fn flow_def(&mut self, flow_def: &Uref);
    /// Consume one completed frame.
    fn frame(&mut self, frame: Uref);
}
