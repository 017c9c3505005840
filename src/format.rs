//! The contract between the pool and the module format.
//!
//! The pool never interprets module code. It only needs a module's name,
//! version, external references and mod marker, plus the ability to rename the
//! module and its references before handing the serialised bytes to the host.
//! A [`ModuleFormat`] supplies all of this.

use std::path::{ Path, PathBuf };
use semver::Version ;



/// Directories searched when a module format resolves references to modules
/// outside the container being read (host libraries and other plugins).
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct SearchPath {
	dirs: Vec<PathBuf>,
}

impl SearchPath {

	pub fn new( dirs: impl IntoIterator<Item = impl Into<PathBuf>> ) -> Self {
		Self { dirs: dirs.into_iter().map( Into::into ).collect() }
	}

	#[inline] pub fn dirs( &self ) -> &[PathBuf] { &self.dirs }

	/// Appends a directory, searched after the existing ones.
	pub fn push( &mut self, dir: impl Into<PathBuf> ) { self.dirs.push( dir.into() ); }

	/// Finds `file_name` in the first directory that contains it.
	pub fn resolve( &self, file_name: impl AsRef<Path> ) -> Option<PathBuf> {
		self.dirs.iter()
			.map(| dir | dir.join( file_name.as_ref() ))
			.find(| candidate | candidate.is_file() )
	}

}

/// The mod marker attached to a module's metadata.
///
/// Modules without a marker are not mods and are skipped by the pool.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct ModMarker {
	/// Full name of the type activated when the module loads; `None` or empty
	/// for library modules.
	pub entry_type: Option<String>,
}

/// Activation contract of a named entry type, decided from its ancestry.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum EntryKind {
	HostPlugin,
	LegacyPlugin,
}

impl EntryKind {

	/// Classifies a supertype chain: the first of `host_base` / `legacy_base`
	/// found in `ancestry` decides the kind.
	///
	/// Formats that can walk a type's supertypes use this to implement
	/// [`ModuleFormat::entry_kind`].
	pub fn from_ancestry<'a>(
		ancestry: impl IntoIterator<Item = &'a str>,
		host_base: &str,
		legacy_base: &str,
	) -> Option<Self> {
		ancestry.into_iter().find_map(| ancestor | match ancestor {
			_ if ancestor == host_base => Some( Self::HostPlugin ),
			_ if ancestor == legacy_base => Some( Self::LegacyPlugin ),
			_ => None,
		})
	}

}

/// A parsed, in-memory module definition.
///
/// Definitions are owned exclusively by the pool record holding them and are
/// released by dropping.
pub trait ModuleDefinition {

	/// Failure to serialise the definition back to bytes.
	type Error: std::fmt::Display ;

	/// Logical name of the module.
	fn name( &self ) -> &str ;

	/// Declared version, if the module carries one.
	fn version( &self ) -> Option<&Version> ;

	/// The mod marker, or `None` if this is not a mod module.
	fn mod_marker( &self ) -> Option<ModMarker> ;

	/// Names of every external module this module references.
	fn references( &self ) -> Vec<String> ;

	/// Renames the module itself.
	fn set_identity( &mut self, identity: &str );

	/// Retargets every reference to `from` at `to`.
	fn rewrite_reference( &mut self, from: &str, to: &str );

	/// Serialises the definition into the bytes handed to the host loader.
	///
	/// # Errors
	/// Format specific.
	fn to_bytes( &self ) -> Result<Vec<u8>, Self::Error> ;

}

/// Parses module bytes and inspects module metadata.
pub trait ModuleFormat {

	type Definition: ModuleDefinition ;
	type Error: std::fmt::Display ;

	/// Parses one embedded module, resolving cross-module references through
	/// `search_path`.
	///
	/// # Errors
	/// Format specific; the pool reports the failure and skips the module.
	fn read( &self, bytes: Vec<u8>, search_path: &SearchPath ) -> Result<Self::Definition, Self::Error> ;

	/// Resolves `entry_type` inside `definition` and classifies it by ancestry.
	///
	/// Returns `None` if the type cannot be resolved, is not a concrete class, or
	/// derives from neither known plugin base.
	fn entry_kind( &self, definition: &Self::Definition, entry_type: &str ) -> Option<EntryKind> ;

}
