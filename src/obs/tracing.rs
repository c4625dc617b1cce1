// std
use std::io;
// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, LogFormat},
};

/// Span wrapper used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("design_gateway.flow", flow = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

/// Installs the global subscriber, writing to stderr so stdout stays free for stdio transport.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_tracing(level: &str, format: LogFormat) -> Result<(), String> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(level))
		.map_err(|e| format!("invalid log filter `{level}`: {e}"))?;
	let registry = tracing_subscriber::registry().with(filter);

	match format {
		LogFormat::Json => registry.with(fmt::layer().json().with_writer(io::stderr)).try_init(),
		LogFormat::Text => registry.with(fmt::layer().with_writer(io::stderr)).try_init(),
	}
	.map_err(|e| format!("failed to install tracing subscriber: {e}"))
}
