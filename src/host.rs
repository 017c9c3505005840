//! The host process the modules are injected into.

use crate::{ EntryPoint, ModuleDescriptor, TypeExtension };



/// The host-side collaborators of the loader: its module loader, its
/// runtime-patching subsystem, and its one-time fixups around initialisation.
///
/// Injected modules cannot be removed individually. The only reclamation
/// primitive is [`Host::remove_patches`], which undoes everything a module
/// installed into the host's code.
pub trait Host {

	/// A loaded module inside the host.
	type Handle ;
	type Error: std::fmt::Display ;

	/// Loads serialised module bytes into the host under `identity`.
	///
	/// # Errors
	/// Fails if the host rejects the module.
	fn inject( &mut self, identity: &str, bytes: Vec<u8> ) -> Result<Self::Handle, Self::Error> ;

	/// Creates the entry point named by a plugin `descriptor`. Never called for
	/// libraries.
	///
	/// # Errors
	/// Fails if the entry type cannot be found or instantiated.
	fn activate( &mut self, handle: &Self::Handle, descriptor: &ModuleDescriptor ) -> Result<Box<dyn EntryPoint<Self::Handle>>, Self::Error> ;

	/// Enum-style type extensions a loaded module declares.
	///
	/// # Errors
	/// Fails if the module's declarations cannot be read.
	fn extensions( &mut self, _handle: &Self::Handle ) -> Result<Vec<TypeExtension>, Self::Error> { Ok( Vec::new() )}

	/// Runs once before any module's entry point.
	fn pre_initialize( &mut self ) {}

	/// Runs once after every module's entry point.
	fn post_initialize( &mut self ) {}

	/// Removes every runtime patch `handle` installed into the host.
	fn remove_patches( &mut self, handle: &Self::Handle );

	/// Terminates the host process.
	fn quit( &mut self ) { std::process::exit( 0 )}

}
