//! Progress and diagnostics reporting.
//!
//! Every pipeline stage reports a completion fraction and discrete messages to a
//! [`Progressable`]. A [`MessageKind::Fatal`] message marks the sink as failed;
//! the orchestrator checks [`Progressable::failed`] between stages and skips the
//! remaining ones once it is set. A stage already in progress always runs to
//! completion.

use tracing::{ debug, info, error };



/// Severity of a diagnostic.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum MessageKind {
	Debug,
	Info,
	/// A failure that does not unwind the current operation but halts the
	/// stages after it.
	Fatal,
}

impl std::fmt::Display for MessageKind {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{:?}", self )}
}

/// Sink for progress fractions and diagnostics.
pub trait Progressable {
	/// Sets the completion fraction of the current stage, in `[0, 1]`.
	fn set_progress( &mut self, fraction: f32 );
	/// Reports a diagnostic.
	fn message( &mut self, kind: MessageKind, message: &str );
	/// Whether a fatal diagnostic has been reported.
	fn failed( &self ) -> bool ;
}

/// A single reported diagnostic.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Message {
	pub kind: MessageKind,
	pub text: String,
}

/// A [`Progressable`] that records everything it receives and mirrors each
/// message as a `tracing` event.
#[derive( Debug, Default )]
pub struct ProgressLog {
	progress: f32,
	messages: Vec<Message>,
	failed: bool,
}

impl ProgressLog {

	pub fn new() -> Self { Self::default() }

	#[inline] pub fn progress( &self ) -> f32 { self.progress }
	#[inline] pub fn messages( &self ) -> &[Message] { &self.messages }
	/// Whether a fatal message has been recorded since the last reset.
	#[inline] pub fn failed( &self ) -> bool { self.failed }

	/// Messages of the given kind, in the order they were reported.
	pub fn messages_of( &self, kind: MessageKind ) -> impl Iterator<Item = &str> {
		self.messages.iter().filter( move | message | message.kind == kind ).map(| message | message.text.as_str() )
	}

	/// Clears the failed flag and all recorded messages.
	pub fn reset( &mut self ) {
		self.progress = 0.0 ;
		self.messages.clear();
		self.failed = false ;
	}

}

impl Progressable for ProgressLog {

	fn set_progress( &mut self, fraction: f32 ) {
		self.progress = fraction.clamp( 0.0, 1.0 );
	}

	fn message( &mut self, kind: MessageKind, message: &str ) {
		match kind {
			MessageKind::Debug => debug!( "{}", message ),
			MessageKind::Info => info!( "{}", message ),
			MessageKind::Fatal => {
				error!( "{}", message );
				self.failed = true ;
			},
		}
		self.messages.push( Message { kind, text: message.to_string() });
	}

	fn failed( &self ) -> bool { self.failed }

}

/// Fraction of `done` out of `total`, treating an empty batch as complete.
#[allow( clippy::cast_precision_loss )]
pub(crate) fn fraction( done: usize, total: usize ) -> f32 {
	match total {
		0 => 1.0,
		total => done as f32 / total as f32,
	}
}
