//! The deduplicated, conflict-resolved collection of mod modules.
//!
//! The pool is built in a single pass over the enabled containers and their
//! entries, in input order. That order matters: when two modules with the same
//! name disagree on their major version, the one registered first survives.

use std::collections::HashMap ;
use std::sync::atomic::{ AtomicU64, Ordering };
use semver::Version ;
use tracing::{ debug, warn };

use crate::{ Container, ModuleDefinition, ModuleDescriptor, ModuleFormat, EntryKind, SearchPath };
use crate::progress::{ Progressable, MessageKind, fraction };



/// Modules that are never loaded, even when they carry a mod marker.
pub const IGNORED_MODULES: [&str; 3] = [ "EnumExtender", "PublicityStunt", "AutoUpdate" ];

/// Separates a module's logical name from its pool id in its identity.
pub const IDENTITY_SEPARATOR: &str = ";;" ;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new( 0 );

/// A module accepted into the pool.
#[derive( Debug )]
pub struct ModuleRecord<D> {
	container: String,
	file_name: String,
	descriptor: ModuleDescriptor,
	definition: D,
	version: Version,
}

impl<D> ModuleRecord<D> {
	/// Name of the container the module came from.
	#[inline] pub fn container( &self ) -> &str { &self.container }
	/// File name of the container the module came from.
	#[inline] pub fn file_name( &self ) -> &str { &self.file_name }
	#[inline] pub fn descriptor( &self ) -> &ModuleDescriptor { &self.descriptor }
	#[inline] pub fn definition( &self ) -> &D { &self.definition }
	#[inline] pub(crate) fn definition_mut( &mut self ) -> &mut D { &mut self.definition }
	#[inline] pub fn version( &self ) -> &Version { &self.version }
}

/// Mod modules keyed by logical name. Names are unique.
///
/// Records iterate in the order their names were first inserted; a replaced
/// record keeps its predecessor's position.
#[derive( Debug )]
pub struct ModulePool<D> {
	id: u64,
	order: Vec<String>,
	records: HashMap<String, ModuleRecord<D>>,
}

impl<D> ModulePool<D> {

	fn empty() -> Self {
		Self {
			id: NEXT_POOL_ID.fetch_add( 1, Ordering::Relaxed ),
			order: Vec::new(),
			records: HashMap::new(),
		}
	}

	/// Identifier distinguishing this pool from every other pool built by this
	/// process.
	#[inline] pub fn id( &self ) -> u64 { self.id }
	#[inline] pub fn len( &self ) -> usize { self.order.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.order.is_empty() }
	#[inline] pub fn contains( &self, name: &str ) -> bool { self.records.contains_key( name )}
	#[inline] pub fn get( &self, name: &str ) -> Option<&ModuleRecord<D>> { self.records.get( name )}
	#[inline] pub(crate) fn get_mut( &mut self, name: &str ) -> Option<&mut ModuleRecord<D>> { self.records.get_mut( name )}

	/// Module names in pool order.
	pub fn names( &self ) -> impl Iterator<Item = &str> { self.order.iter().map( String::as_str )}

	/// Records in pool order.
	pub fn records( &self ) -> impl Iterator<Item = ( &str, &ModuleRecord<D> )> {
		self.order.iter().filter_map(| name | self.records.get( name ).map(| record | ( name.as_str(), record )))
	}

	/// The name a module is injected under, unique across reload generations.
	pub fn identity( &self, name: &str ) -> String {
		format!( "{}{}{}", name, IDENTITY_SEPARATOR, self.id )
	}

	fn insert( &mut self, name: String, record: ModuleRecord<D> ) {
		if self.records.insert( name.clone(), record ).is_none() {
			self.order.push( name );
		}
	}

}

impl<D: ModuleDefinition> ModulePool<D> {

	/// Builds a pool from `containers`, which must already be filtered to the
	/// enabled ones.
	///
	/// Every entry is processed; a module that cannot be read is reported as
	/// fatal and skipped. Progress is the fraction of entries processed across
	/// all containers.
	pub fn build<'a, F>(
		progress: &mut dyn Progressable,
		format: &F,
		search_path: &SearchPath,
		containers: impl IntoIterator<Item = &'a mut Container>,
	) -> Self
	where
		F: ModuleFormat<Definition = D>,
	{

		let mut pool = Self::empty();
		let mut containers = containers.into_iter().collect::<Vec<_>>();
		let total = containers.iter().map(| container | container.entries().len() ).sum::<usize>();
		let mut done = 0 ;

		for container in &mut containers {
			for index in 0..container.entries().len() {
				pool.read_entry( progress, format, search_path, container, index );
				done += 1 ;
				progress.set_progress( fraction( done, total ));
			}
		}

		if total == 0 { progress.set_progress( 1.0 ); }
		debug!( pool = pool.id, modules = pool.len(), "Built module pool" );
		pool

	}

	fn read_entry<F>(
		&mut self,
		progress: &mut dyn Progressable,
		format: &F,
		search_path: &SearchPath,
		container: &mut Container,
		index: usize,
	) where
		F: ModuleFormat<Definition = D>,
	{

		let definition = match container.read_entry( index ) {
			Ok( bytes ) => match format.read( bytes, search_path ) {
				Ok( definition ) => definition,
				Err( err ) => return progress.message( MessageKind::Fatal, &format!(
					"Failed to read module {} of {}\n{}", index, container.header().name(), err )),
			},
			Err( err ) => return progress.message( MessageKind::Fatal, &format!(
				"Failed to read entry {} of {}\n{}", index, container.header().name(), err )),
		};

		let name = definition.name().to_string();
		if IGNORED_MODULES.contains( &name.as_str() ) { return }
		let Some( marker ) = definition.mod_marker() else { return };

		let version = definition.version().cloned()
			.or_else(|| container.header().version().cloned() )
			.unwrap_or_else(|| Version::new( 0, 0, 0 ));

		if let Some( existing ) = self.records.get( &name ) {
			if existing.version.major != version.major {
				return progress.message( MessageKind::Fatal, &format!(
					"Two modules named {} are incompatible: {} from {} and {} from {}",
					name, version, container.header().name(), existing.version, existing.container,
				));
			}
			if existing.version >= version { return }
		}

		let descriptor = describe( progress, format, &definition, marker.entry_type.as_deref() );
		// Replacing drops the superseded definition.
		self.insert( name, ModuleRecord {
			container: container.header().name().to_string(),
			file_name: container.file_name(),
			descriptor,
			definition,
			version,
		});

	}

}

fn describe<F: ModuleFormat>(
	progress: &mut dyn Progressable,
	format: &F,
	definition: &F::Definition,
	entry_type: Option<&str>,
) -> ModuleDescriptor {
	let Some( entry_type ) = entry_type.filter(| entry_type | !entry_type.is_empty() ) else {
		return ModuleDescriptor::Library
	};
	match format.entry_kind( definition, entry_type ) {
		Some( EntryKind::HostPlugin ) => ModuleDescriptor::HostPlugin( entry_type.to_string() ),
		Some( EntryKind::LegacyPlugin ) => ModuleDescriptor::LegacyPlugin( entry_type.to_string() ),
		None => {
			warn!( module = definition.name(), entry_type, "Entry type is not a plugin, loading as a library" );
			progress.message( MessageKind::Debug, &format!(
				"The mod marker named a type that is neither a plugin nor a legacy mod: {} from {}",
				entry_type, definition.name(),
			));
			ModuleDescriptor::Library
		},
	}
}
