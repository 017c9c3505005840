//! A [`Host`] that runs modules as WebAssembly components.
//!
//! Each injected module is compiled once into a [`Component`]. Activating a
//! plugin instantiates the component in its own [`Store`] and binds the export
//! instance named by the plugin's entry type. Hooks are plain functions on that
//! instance:
//!
//! | hook             | host plugin        | legacy plugin |
//! |------------------|--------------------|---------------|
//! | initialize       | `initialize`       | `on-enable`   |
//! | unload           | `unload`           | `on-disable`  |
//! | reload state     | `get-reload-state` | -             |
//! | set unload state | `set-unload-state` | -             |
//!
//! `get-reload-state` returns `option<list<u8>>` and `set-unload-state` takes a
//! `list<u8>`. A hook the component does not export is skipped.

use thiserror::Error ;
use tracing::debug ;
use wasmtime::{ Engine, Store };
use wasmtime::component::{ Component, ComponentExportIndex, Instance, Linker, ResourceTable, Val };

use crate::{ EntryPoint, Host, ModuleDescriptor, ReloadState };
use crate::descriptor::HookError ;



/// Data held by every plugin's [`Store`].
pub struct WasmContext {
	resource_table: ResourceTable,
}

impl Default for WasmContext {
	fn default() -> Self { Self { resource_table: ResourceTable::new() }}
}

impl WasmContext {
	#[inline] pub fn resource_table( &mut self ) -> &mut ResourceTable { &mut self.resource_table }
}

/// A module compiled by a [`WasmHost`].
#[derive( Clone )]
pub struct WasmModule {
	identity: String,
	component: Component,
}

impl std::fmt::Debug for WasmModule {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "WasmModule" )
			.field( "identity", &self.identity )
			.field( "component", &"<component>" )
			.finish()
	}
}

impl WasmModule {
	/// The name the module was injected under.
	#[inline] pub fn identity( &self ) -> &str { &self.identity }
	#[inline] pub fn component( &self ) -> &Component { &self.component }
}

/// Errors raised while compiling or activating a wasm module.
#[derive( Error, Debug )]
pub enum WasmHostError {
	#[error( "Failed to compile component: {0}" )]
	Compile( wasmtime::Error ),
	#[error( "Failed to instantiate component: {0}" )]
	Instantiate( wasmtime::Error ),
	#[error( "{0} does not export {1}" )]
	MissingExport( String, String ),
	#[error( "{0} has no entry point" )]
	NotAPlugin( String ),
}

/// Errors raised by the hooks of a wasm plugin.
#[derive( Error, Debug )]
pub enum WasmHookError {
	#[error( "{0} trapped: {1}" )]
	Trapped( String, String ),
	#[error( "{0} returned an unexpected value" )]
	UnexpectedResult( String ),
	#[error( "Reload state was not saved by a wasm plugin" )]
	ForeignState,
}

/// A [`Host`] backed by a `wasmtime` engine.
pub struct WasmHost {
	engine: Engine,
	linker: Linker<WasmContext>,
}

impl std::fmt::Debug for WasmHost {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "WasmHost" ).finish_non_exhaustive()
	}
}

impl Default for WasmHost {
	fn default() -> Self { Self::new( Engine::default() )}
}

impl WasmHost {

	pub fn new( engine: Engine ) -> Self {
		let linker = Linker::new( &engine );
		Self { engine, linker }
	}

	#[inline] pub fn engine( &self ) -> &Engine { &self.engine }

	/// The linker plugins are instantiated with. Host functions added here are
	/// visible to every plugin activated afterwards.
	#[inline] pub fn linker_mut( &mut self ) -> &mut Linker<WasmContext> { &mut self.linker }

}

impl Host for WasmHost {

	type Handle = WasmModule ;
	type Error = WasmHostError ;

	fn inject( &mut self, identity: &str, bytes: Vec<u8> ) -> Result<Self::Handle, Self::Error> {
		let component = Component::new( &self.engine, bytes ).map_err( WasmHostError::Compile )?;
		Ok( WasmModule { identity: identity.to_string(), component })
	}

	fn activate( &mut self, handle: &Self::Handle, descriptor: &ModuleDescriptor ) -> Result<Box<dyn EntryPoint<Self::Handle>>, Self::Error> {

		let ( entry_type, hooks ) = match descriptor {
			ModuleDescriptor::HostPlugin( entry_type ) => ( entry_type, &HOST_PLUGIN_HOOKS ),
			ModuleDescriptor::LegacyPlugin( entry_type ) => ( entry_type, &LEGACY_PLUGIN_HOOKS ),
			ModuleDescriptor::Library => return Err( WasmHostError::NotAPlugin( handle.identity.clone() )),
		};

		let mut store = Store::new( &self.engine, WasmContext::default() );
		let instance = self.linker.instantiate( &mut store, &handle.component ).map_err( WasmHostError::Instantiate )?;
		let interface = instance
			.get_export_index( &mut store, None, entry_type )
			.ok_or_else(|| WasmHostError::MissingExport( handle.identity.clone(), entry_type.clone() ))?;

		debug!( module = handle.identity.as_str(), entry_type = entry_type.as_str(), "Activated wasm plugin" );
		Ok( Box::new( WasmEntryPoint { store, instance, interface, hooks }))

	}

	fn remove_patches( &mut self, handle: &Self::Handle ) {
		debug!( module = handle.identity.as_str(), "No runtime patches to remove" );
	}

}

struct HookNames {
	initialize: &'static str,
	unload: &'static str,
	reload_state: Option<&'static str>,
	set_unload_state: Option<&'static str>,
}

const HOST_PLUGIN_HOOKS: HookNames = HookNames {
	initialize: "initialize",
	unload: "unload",
	reload_state: Some( "get-reload-state" ),
	set_unload_state: Some( "set-unload-state" ),
};

const LEGACY_PLUGIN_HOOKS: HookNames = HookNames {
	initialize: "on-enable",
	unload: "on-disable",
	reload_state: None,
	set_unload_state: None,
};

struct WasmEntryPoint {
	store: Store<WasmContext>,
	instance: Instance,
	interface: ComponentExportIndex,
	hooks: &'static HookNames,
}

impl WasmEntryPoint {

	/// Calls the hook `name`, returning its single result if it has one, or
	/// `None` if the component does not export it.
	fn call( &mut self, name: &str, params: &[Val], returns_value: bool ) -> Result<Option<Option<Val>>, WasmHookError> {

		let Some( func_index ) = self.instance.get_export_index( &mut self.store, Some( &self.interface ), name ) else {
			return Ok( None )
		};
		let Some( func ) = self.instance.get_func( &mut self.store, func_index ) else { return Ok( None )};

		let mut buffer = match returns_value {
			true => vec![ Val::Bool( false ) ],
			false => Vec::with_capacity( 0 ),
		};
		func.call( &mut self.store, params, &mut buffer )
			.map_err(| err | WasmHookError::Trapped( name.to_string(), err.to_string() ))?;
		let _ = func.post_return( &mut self.store );

		Ok( Some( buffer.pop() ))

	}

}

impl EntryPoint<WasmModule> for WasmEntryPoint {

	fn initialize( &mut self, _handle: &WasmModule ) -> Result<(), HookError> {
		self.call( self.hooks.initialize, &[], false )?;
		Ok(())
	}

	fn unload( &mut self ) -> Result<(), HookError> {
		self.call( self.hooks.unload, &[], false )?;
		Ok(())
	}

	fn reload_state( &mut self ) -> Result<Option<ReloadState>, HookError> {
		let Some( hook ) = self.hooks.reload_state else { return Ok( None )};
		match self.call( hook, &[], true )? {
			None | Some( Some( Val::Option( None ))) => Ok( None ),
			Some( Some( Val::Option( Some( list )))) => Ok( Some( Box::new( bytes_from_val( hook, *list )? ) as ReloadState )),
			Some( _ ) => Err( WasmHookError::UnexpectedResult( hook.to_string() ).into() ),
		}
	}

	fn set_unload_state( &mut self, state: ReloadState ) -> Result<(), HookError> {
		let Some( hook ) = self.hooks.set_unload_state else { return Ok(())};
		let bytes = state.downcast::<Vec<u8>>().map_err(| _ | WasmHookError::ForeignState )?;
		let list = Val::List(( *bytes ).into_iter().map( Val::U8 ).collect() );
		self.call( hook, &[ list ], false )?;
		Ok(())
	}

}

fn bytes_from_val( hook: &str, val: Val ) -> Result<Vec<u8>, WasmHookError> {
	let Val::List( items ) = val else { return Err( WasmHookError::UnexpectedResult( hook.to_string() ))};
	items.into_iter()
		.map(| item | match item {
			Val::U8( byte ) => Ok( byte ),
			_ => Err( WasmHookError::UnexpectedResult( hook.to_string() )),
		})
		.collect()
}
