//! The reload state machine.
//!
//! A [`ModLoader`] owns the currently loaded pool and sequences every transition
//! between pools:
//!
//! 1. save each loaded module's reload state, then unload the pool
//! 2. wrap newly dropped-in raw plugins and enable the containers produced
//! 3. open the enabled containers and build a fresh [`ModulePool`]
//! 4. inject it and initialise its mods
//! 5. hand the saved state to the new modules with matching names
//!
//! Each stage after the first is skipped once the progress sink reports a fatal
//! diagnostic. A stage that has started always runs to completion.

use std::collections::HashSet ;
use pipe_trait::Pipe ;
use tracing::debug ;

use crate::{ Container, ContainerSource, ExtensionRegistry, Host, LoadedModulePool, LoaderConfig,
	ModuleFormat, ModulePool, PluginWrapper, SearchPath };
use crate::loaded_pool::SavedStates ;
use crate::progress::{ Progressable, MessageKind };



/// Whether a module pool is currently injected.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum LoaderState {
	Unloaded,
	Loaded,
}

/// Container streams opened for one reload, released when it ends however far
/// it got.
struct OpenContainers( Vec<Container> );

impl Drop for OpenContainers {
	fn drop( &mut self ) {
		debug!( count = self.0.len(), "Releasing container streams" );
	}
}

/// Sequences unload, rebuild and reload of the module pool.
pub struct ModLoader<F: ModuleFormat, H: Host> {
	format: F,
	host: H,
	source: Box<dyn ContainerSource>,
	wrapper: Option<Box<dyn PluginWrapper>>,
	search_path: SearchPath,
	enabled_mods: HashSet<String>,
	extensions: ExtensionRegistry,
	loaded: Option<LoadedModulePool<F::Definition, H::Handle>>,
}

impl<F: ModuleFormat, H: Host> ModLoader<F, H> {

	/// Creates an unloaded loader. The enabled container set and the reference
	/// search path come from `config`.
	pub fn new( format: F, host: H, source: impl ContainerSource + 'static, config: &LoaderConfig ) -> Self {
		Self {
			format,
			host,
			source: Box::new( source ),
			wrapper: None,
			search_path: config.search_path(),
			enabled_mods: config.enabled_mods.iter().cloned().collect(),
			extensions: ExtensionRegistry::new(),
			loaded: None,
		}
	}

	/// Wraps raw plugins with `wrapper` at the start of every reload.
	pub fn with_wrapper( mut self, wrapper: impl PluginWrapper + 'static ) -> Self {
		self.wrapper = Some( Box::new( wrapper ));
		self
	}

	pub fn state( &self ) -> LoaderState {
		match self.loaded {
			Some( _ ) => LoaderState::Loaded,
			None => LoaderState::Unloaded,
		}
	}

	#[inline] pub fn loaded( &self ) -> Option<&LoadedModulePool<F::Definition, H::Handle>> { self.loaded.as_ref() }
	#[inline] pub fn host( &self ) -> &H { &self.host }
	#[inline] pub fn host_mut( &mut self ) -> &mut H { &mut self.host }
	#[inline] pub fn extensions( &self ) -> &ExtensionRegistry { &self.extensions }
	#[inline] pub fn enabled_mods( &self ) -> &HashSet<String> { &self.enabled_mods }
	#[inline] pub fn search_path( &self ) -> &SearchPath { &self.search_path }

	/// Enables the container named `name` for the next reload.
	pub fn enable( &mut self, name: impl Into<String> ) -> bool { self.enabled_mods.insert( name.into() )}

	/// Disables the container named `name` for the next reload.
	pub fn disable( &mut self, name: &str ) -> bool { self.enabled_mods.remove( name )}

	/// Unloads the current pool, if any, and loads a fresh one from the enabled
	/// containers, carrying reload state across.
	///
	/// If a stage reports a fatal diagnostic the remaining stages are skipped and
	/// the loader is left as that stage left it. Once modules have been injected
	/// the loader stays [`LoaderState::Loaded`] so they can still be unloaded.
	pub fn reload( &mut self, progress: &mut dyn Progressable ) {

		let saved = self.capture_reload_state( progress );
		self.unload( progress );

		let wrapped = self.wrapper.as_mut().map( | wrapper | wrapper.wrap( progress )).unwrap_or_default();
		if progress.failed() { return }
		if !wrapped.is_empty() {
			progress.message( MessageKind::Info, &format!( "Enabled {} newly wrapped mod(s)", wrapped.len() ));
			self.enabled_mods.extend( wrapped );
		}

		progress.message( MessageKind::Info, "Reading modules" );
		progress.set_progress( 0.0 );

		let mut containers = OpenContainers( self.source.containers( progress ));
		let enabled_mods = &self.enabled_mods ;
		let pool = containers.0.iter_mut()
			.filter(| container | enabled_mods.contains( container.header().name() ))
			.pipe(| enabled | ModulePool::build( progress, &self.format, &self.search_path, enabled ));

		if progress.failed() { return }
		progress.message( MessageKind::Info, "Loading modules" );
		progress.set_progress( 0.0 );

		let loaded = match LoadedModulePool::load( progress, pool, &mut self.host ) {
			Ok( loaded ) => self.loaded.insert( loaded ),
			Err( err ) => {
				progress.message( MessageKind::Fatal, &format!( "Failed to load modules\n{}", err ));
				return
			},
		};

		if progress.failed() { return }
		progress.message( MessageKind::Info, "Enabling mods" );
		progress.set_progress( 0.0 );

		loaded.initialize_mods( progress, &mut self.host, &mut self.extensions );

		if progress.failed() { return }
		loaded.deliver_reload_state( progress, saved );

	}

	/// Unloads the current pool, if any.
	pub fn unload( &mut self, progress: &mut dyn Progressable ) {
		progress.message( MessageKind::Info, "Disabling mods" );
		if let Some( loaded ) = self.loaded.take() {
			loaded.unload( progress, &mut self.host, &mut self.extensions );
		}
	}

	/// Saves reload state, unloads, then asks the host to quit.
	pub fn unload_and_quit( &mut self, progress: &mut dyn Progressable ) {
		let _ = self.capture_reload_state( progress );
		self.unload( progress );
		self.host.quit();
	}

	fn capture_reload_state( &mut self, progress: &mut dyn Progressable ) -> SavedStates {
		self.loaded.as_mut().map(| loaded | loaded.reload_state( progress )).unwrap_or_default()
	}

}
