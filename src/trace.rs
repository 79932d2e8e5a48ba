//! Feature-gated logging for the segmentation run.
//!
//! With the `tracing` feature the macros forward to `tracing`; without it
//! they expand to nothing, except that field expressions are still evaluated
//! so call sites do not produce unused-variable warnings.

/// Opens an info span around a pipeline stage (`preprocess`, `sweep`, `shape`).
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($stage:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($stage $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($stage:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Reports a progress event, such as an accepted match or a finished shape.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $event, $($key = $value),+)
    };
    ($event:expr) => {
        tracing::info!(name: $event)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($event:expr) => {};
}

/// Reports a shape, size or rotation that the sweep skipped.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::warn!(name: $event, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Stand-in span returned by `trace_span!` when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
