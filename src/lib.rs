//! A hot-reloadable mod loader.
//!
//! Mods ship as **containers**: files with a small self-describing header
//! followed by one or more serialised modules. The loader turns a set of enabled
//! containers into modules running inside a host process, and can tear them all
//! down and bring a fresh set up again without restarting the host.
//!
//! # Pipeline
//!
//! - [`ContainerHeader`]: parses and writes the container header, rejecting
//! 	files that are not containers or whose format version is unsupported.
//!
//! - [`ModulePool`]: reads every module of every enabled container, skips the
//! 	ones that are not mods, and resolves same-name conflicts by version.
//! 	Modules from one pool are injected under identities unique to that pool,
//! 	so successive reloads never collide.
//!
//! - [`LoadedModulePool`]: injects the pool into the [`Host`] dependencies
//! 	first, runs each plugin's [`EntryPoint`], and later unloads them all.
//!
//! - [`ModLoader`]: sequences the stages of a reload and carries each module's
//! 	[`ReloadState`] from the old pool to the new one.
//!
//! Module bytes are opaque to the loader; a [`ModuleFormat`] reads them into
//! [`ModuleDefinition`]s that can be renamed and re-serialised.
//!
//! # Failure handling
//!
//! Nothing in the pipeline panics or returns early on a bad module. Failures are
//! reported to a [`Progressable`] sink as [`MessageKind::Fatal`] diagnostics and
//! the batch carries on; the orchestrator skips the remaining stages once the
//! sink reports that it has failed. A panicking plugin hook is caught and
//! reported like any other failure.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor ;
//! use semver::Version ;
//! use rwmod_loader::{ ContainerHeader, HeaderFlags };
//!
//! let header = ContainerHeader::new(
//! 	HeaderFlags::HIDDEN,
//! 	Some( Version::new( 1, 2, 0 )),
//! 	"Example", "someone", "https://example.com",
//! ).unwrap();
//!
//! let bytes = header.to_bytes();
//! let read = ContainerHeader::read( &mut Cursor::new( bytes )).unwrap();
//! assert_eq!( read, header );
//! ```

mod header ;
mod progress ;
mod sort ;
mod format ;
mod container ;
mod descriptor ;
mod extensions ;
mod host ;
mod pool ;
mod loaded_pool ;
mod loader ;
mod wrapper ;
mod config ;
mod wasm_host ;
mod utils ;

pub use header::{ ContainerHeader, HeaderError, HeaderFlags, MAGIC, LEGACY_MAGIC_LEAD, FORMAT_VERSION };
pub use progress::{ Progressable, ProgressLog, Message, MessageKind };
pub use sort::{ topological_sort, CycleError };
pub use format::{ ModuleDefinition, ModuleFormat, ModMarker, EntryKind, SearchPath };
pub use container::{ Container, ContainerStream, ContainerSource, HeaderReadError, container_paths, read_headers, CONTAINER_EXTENSION };
pub use descriptor::{ ModuleDescriptor, EntryPoint, ReloadState, HookError, HookFailure };
pub use extensions::{ TypeExtension, ExtensionRegistry, ExtensionError };
pub use host::Host ;
pub use pool::{ ModulePool, ModuleRecord, IGNORED_MODULES, IDENTITY_SEPARATOR };
pub use loaded_pool::{ LoadedModulePool, LoadedModule, LoadError, SavedStates };
pub use loader::{ ModLoader, LoaderState };
pub use wrapper::{ PluginWrapper, ProcessWrapper, WrapError };
pub use config::{ LoaderConfig, ConfigError };
pub use wasm_host::{ WasmHost, WasmModule, WasmContext, WasmHostError, WasmHookError };
pub use utils::PartialSuccess ;

pub use semver::Version ;
pub use wasmtime::Engine ;
pub use wasmtime::component::Component ;
