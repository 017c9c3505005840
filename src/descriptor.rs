//! Module classification and entry-point hooks.

use std::any::Any ;
use std::panic::{ catch_unwind, AssertUnwindSafe };
use thiserror::Error ;



/// What a module does when it is activated.
///
/// Decided once per module while the pool is built.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub enum ModuleDescriptor {
	/// Code other modules link against; has no entry point.
	Library,
	/// A plugin written against the host's plugin base. Carries the full name of
	/// its entry type.
	HostPlugin( String ),
	/// A plugin written against the legacy mod base. Carries the full name of
	/// its entry type.
	LegacyPlugin( String ),
}

impl ModuleDescriptor {

	/// The entry type to activate, or `None` for libraries.
	pub fn entry_type( &self ) -> Option<&str> {
		match self {
			Self::Library => None,
			Self::HostPlugin( entry_type ) | Self::LegacyPlugin( entry_type ) => Some( entry_type ),
		}
	}

	#[inline] pub fn is_library( &self ) -> bool { matches!( self, Self::Library )}

}

impl std::fmt::Display for ModuleDescriptor {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Library => write!( f, "library" ),
			Self::HostPlugin( entry_type ) => write!( f, "host plugin {}", entry_type ),
			Self::LegacyPlugin( entry_type ) => write!( f, "legacy plugin {}", entry_type ),
		}
	}
}

/// Opaque per-module state carried across a reload.
pub type ReloadState = Box<dyn Any + Send> ;

/// Error raised by an entry-point hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync> ;

/// The lifecycle hooks of an activated plugin.
///
/// Each hook is called at most once per lifecycle transition. Hooks may fail by
/// returning an error or by panicking; either way the failure is reported
/// against this module and the remaining modules are unaffected.
pub trait EntryPoint<Handle> {

	/// Runs the plugin's entry point against its loaded module.
	///
	/// # Errors
	/// Any error the plugin raises.
	fn initialize( &mut self, handle: &Handle ) -> Result<(), HookError> ;

	/// Tears the plugin down before its module is unloaded.
	///
	/// # Errors
	/// Any error the plugin raises.
	fn unload( &mut self ) -> Result<(), HookError> ;

	/// State to hand to the next instance of this module after a reload.
	///
	/// # Errors
	/// Any error the plugin raises.
	fn reload_state( &mut self ) -> Result<Option<ReloadState>, HookError> { Ok( None )}

	/// Receives the state the previous instance of this module saved.
	///
	/// # Errors
	/// Any error the plugin raises.
	fn set_unload_state( &mut self, _state: ReloadState ) -> Result<(), HookError> { Ok(())}

}

/// Why a module's hook did not complete.
#[derive( Error, Debug )]
pub enum HookFailure {
	/// The host could not create the plugin's entry point.
	#[error( "Failed to activate entry point: {0}" )]
	Activation( String ),
	/// The hook returned an error.
	#[error( "{0}" )]
	Raised( HookError ),
	/// The hook panicked.
	#[error( "Hook panicked: {0}" )]
	Panicked( String ),
}

/// Runs a hook, converting both returned errors and panics into a [`HookFailure`].
pub(crate) fn guarded<T>( hook: impl FnOnce() -> Result<T, HookError> ) -> Result<T, HookFailure> {
	match catch_unwind( AssertUnwindSafe( hook )) {
		Ok( Ok( value )) => Ok( value ),
		Ok( Err( err )) => Err( HookFailure::Raised( err )),
		Err( payload ) => Err( HookFailure::Panicked( panic_message( payload.as_ref() ))),
	}
}

fn panic_message( payload: &( dyn Any + Send )) -> String {
	payload.downcast_ref::<&str>().map(| message | ( *message ).to_string() )
		.or_else(|| payload.downcast_ref::<String>().cloned() )
		.unwrap_or_else(|| "<non-string panic payload>".to_string() )
}
