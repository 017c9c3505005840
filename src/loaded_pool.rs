//! Modules injected into the host, and their lifecycle.
//!
//! Loading sorts the pool so every module is injected after the in-pool modules
//! it references, rewrites those references to pool identities, and hands each
//! module to the host. Failures are isolated per module: a module that fails to
//! inject, initialise or unload is reported as fatal and the batch carries on.
//! A dependency cycle is the one failure that aborts the whole load.

use std::collections::HashMap ;
use thiserror::Error ;
use tracing::debug ;

use crate::{ CycleError, EntryPoint, ExtensionRegistry, Host, ModuleDefinition, ModuleDescriptor, ModulePool, ReloadState };
use crate::descriptor::{ guarded, HookFailure };
use crate::progress::{ Progressable, MessageKind, fraction };
use crate::sort::topological_sort ;



/// Failure that aborts a whole load.
#[derive( Error, Debug )]
pub enum LoadError {
	/// The modules reference each other in a cycle.
	#[error( "{0}" )]
	CyclicDependency( #[from] CycleError<String> ),
}

enum InjectionError<S, I> {
	Serialise( S ),
	Inject( I ),
}

impl<S: std::fmt::Display, I: std::fmt::Display> std::fmt::Display for InjectionError<S, I> {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Serialise( err ) => write!( f, "Failed to serialise module: {}", err ),
			Self::Inject( err ) => write!( f, "{}", err ),
		}
	}
}

/// State saved by each module before an unload, keyed by logical name.
pub type SavedStates = Vec<( String, ReloadState )> ;

/// A module injected into the host.
pub struct LoadedModule<Handle> {
	handle: Handle,
	name: String,
	file_name: String,
	entry: Option<Box<dyn EntryPoint<Handle>>>,
}

impl<Handle: std::fmt::Debug> std::fmt::Debug for LoadedModule<Handle> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "LoadedModule" )
			.field( "handle", &self.handle )
			.field( "name", &self.name )
			.field( "file_name", &self.file_name )
			.field( "entry", &self.entry.as_ref().map(| _ | "<entry point>" ))
			.finish()
	}
}

impl<Handle> LoadedModule<Handle> {
	#[inline] pub fn handle( &self ) -> &Handle { &self.handle }
	/// Logical name of the module.
	#[inline] pub fn name( &self ) -> &str { &self.name }
	/// File name of the container the module came from.
	#[inline] pub fn file_name( &self ) -> &str { &self.file_name }
	/// Whether the module's entry point has been activated.
	#[inline] pub fn is_active( &self ) -> bool { self.entry.is_some() }
}

/// The injected modules of one [`ModulePool`], in injection order.
///
/// Owns the pool it was built from; both are torn down together by
/// [`LoadedModulePool::unload`].
#[derive( Debug )]
pub struct LoadedModulePool<D, Handle> {
	pool: ModulePool<D>,
	loaded: Vec<LoadedModule<Handle>>,
}

impl<D, Handle> LoadedModulePool<D, Handle>
where
	D: ModuleDefinition,
{

	#[inline] pub fn pool( &self ) -> &ModulePool<D> { &self.pool }
	#[inline] pub fn loaded( &self ) -> &[LoadedModule<Handle>] { &self.loaded }

	/// Looks up a loaded module by logical name.
	pub fn get( &self, name: &str ) -> Option<&LoadedModule<Handle>> {
		self.loaded.iter().find(| module | module.name == name )
	}

	/// Injects every module of `pool` into `host`, dependencies first.
	///
	/// A module that fails to serialise or inject is reported as fatal and left
	/// out of the result.
	///
	/// # Errors
	/// [`LoadError::CyclicDependency`] if the in-pool references form a cycle.
	/// Nothing is injected in that case.
	pub fn load<H>( progress: &mut dyn Progressable, mut pool: ModulePool<D>, host: &mut H ) -> Result<Self, LoadError>
	where
		H: Host<Handle = Handle>,
	{

		let dependencies = pool.records()
			.map(|( name, record )| ( name.to_string(), record.definition().references().into_iter()
				.filter(| reference | reference != name && pool.contains( reference ))
				.collect::<Vec<_>>() ))
			.collect::<HashMap<_, _>>();

		let order = topological_sort(
			pool.names().map( str::to_string ).collect::<Vec<_>>(),
			| name | dependencies.get( name ).cloned().unwrap_or_default(),
		)?;

		let total = order.len();
		let mut loaded = Vec::with_capacity( total );

		for ( done, name ) in order.into_iter().enumerate() {

			let identity = pool.identity( &name );
			let rewrites = dependencies.get( &name ).into_iter().flatten()
				.map(| dependency | ( dependency.clone(), pool.identity( dependency )))
				.collect::<Vec<_>>();

			let Some( record ) = pool.get_mut( &name ) else { continue };
			let definition = record.definition_mut();
			rewrites.iter().for_each(|( from, to )| definition.rewrite_reference( from, to ));
			definition.set_identity( &identity );

			let injected = definition.to_bytes()
				.map_err( InjectionError::Serialise )
				.and_then(| bytes | host.inject( &identity, bytes ).map_err( InjectionError::Inject ));

			match injected {
				Ok( handle ) => {
					debug!( module = name.as_str(), identity = identity.as_str(), "Injected module" );
					loaded.push( LoadedModule { handle, file_name: record.file_name().to_string(), name, entry: None });
				},
				Err( err ) => progress.message( MessageKind::Fatal, &format!( "Failed to load {}\n{}", name, err )),
			}

			progress.set_progress( fraction( done + 1, total ));

		}

		if total == 0 { progress.set_progress( 1.0 ); }
		Ok( Self { pool, loaded })

	}

	/// Registers each module's type extensions, then runs every module's entry
	/// point in injection order, bracketed by the host's one-time fixups.
	///
	/// A module whose extensions conflict registers none of them.
	///
	/// Each module reports either a debug "Finished loading" message or exactly
	/// one fatal message.
	pub fn initialize_mods<H>( &mut self, progress: &mut dyn Progressable, host: &mut H, registry: &mut ExtensionRegistry )
	where
		H: Host<Handle = Handle>,
	{

		for module in &self.loaded {
			let registered = host.extensions( &module.handle )
				.map_err(| err | err.to_string() )
				.and_then(| extensions | registry.register_all( &module.name, extensions ).map_err(| err | err.to_string() ));
			if let Err( err ) = registered {
				progress.message( MessageKind::Fatal, &format!( "Failed to register extensions for {}\n{}", module.name, err ));
			}
		}

		host.pre_initialize();

		let library = ModuleDescriptor::Library ;
		let total = self.loaded.len();
		for ( done, module ) in self.loaded.iter_mut().enumerate() {
			let descriptor = self.pool.get( &module.name ).map_or( &library, | record | record.descriptor() );
			match initialize_module( host, module, descriptor ) {
				Ok(()) => progress.message( MessageKind::Debug, &format!( "Finished loading {}", module.name )),
				Err( err ) => progress.message( MessageKind::Fatal, &format!( "Failed to initialize {}\n{}", module.name, err )),
			}
			progress.set_progress( fraction( done + 1, total ));
		}

		host.post_initialize();

	}

	/// Collects the state each active module wants carried across a reload.
	///
	/// A module whose hook fails is reported as fatal and saves nothing.
	pub fn reload_state( &mut self, progress: &mut dyn Progressable ) -> SavedStates {
		self.loaded.iter_mut()
			.filter_map(| module | {
				let entry = module.entry.as_mut()?;
				match guarded(|| entry.reload_state() ) {
					Ok( state ) => state.map(| state | ( module.name.clone(), state )),
					Err( err ) => {
						progress.message( MessageKind::Fatal, &format!( "An uncaught error was raised in {}. {}", module.name, err ));
						None
					},
				}
			})
			.collect()
	}

	/// Hands each saved state to the loaded module with the same name. States
	/// whose module is gone are dropped silently.
	pub fn deliver_reload_state( &mut self, progress: &mut dyn Progressable, states: SavedStates ) {
		for ( name, state ) in states {
			let Some( module ) = self.loaded.iter_mut().find(| module | module.name == name ) else { continue };
			let Some( entry ) = module.entry.as_mut() else { continue };
			if let Err( err ) = guarded(|| entry.set_unload_state( state )) {
				progress.message( MessageKind::Fatal, &format!( "An uncaught error was raised in {}. {}", name, err ));
			}
		}
	}

	/// Runs every module's unload hook in injection order and detaches each from
	/// the host's patching subsystem, even when its hook fails. Consumes the
	/// pool; the extension registry is cleared afterwards.
	pub fn unload<H>( self, progress: &mut dyn Progressable, host: &mut H, registry: &mut ExtensionRegistry )
	where
		H: Host<Handle = Handle>,
	{

		let Self { pool, loaded } = self ;
		let total = loaded.len();

		for ( done, mut module ) in loaded.into_iter().enumerate() {
			if let Some( entry ) = module.entry.as_mut() {
				if let Err( err ) = guarded(|| entry.unload() ) {
					progress.message( MessageKind::Fatal, &format!( "Failed to unload {}\n{}", module.name, err ));
				}
			}
			host.remove_patches( &module.handle );
			progress.set_progress( fraction( done + 1, total ));
		}

		registry.clear();
		debug!( pool = pool.id(), "Unloaded module pool" );

	}

}

fn initialize_module<H: Host>(
	host: &mut H,
	module: &mut LoadedModule<H::Handle>,
	descriptor: &ModuleDescriptor,
) -> Result<(), HookFailure> {
	if descriptor.is_library() { return Ok(()) }
	let entry = host.activate( &module.handle, descriptor ).map_err(| err | HookFailure::Activation( err.to_string() ))?;
	let entry = module.entry.insert( entry );
	guarded(|| entry.initialize( &module.handle ))
}
