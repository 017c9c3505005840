//! Loader configuration, read from TOML.
//!
//! ```toml
//! host_library_dirs = [ "host/managed" ]
//! plugin_dirs = [ "mods", "plugins" ]
//! raw_plugin_dir = "plugins"
//! wrapper_backend = "tools/wrapper"
//! enabled_mods = [ "Example" ]
//! ```

use std::path::{ Path, PathBuf };
use pipe_trait::Pipe ;
use serde::{ Deserialize, Serialize };
use thiserror::Error ;

use crate::{ ProcessWrapper, SearchPath };



#[derive( Error, Debug )]
pub enum ConfigError {
	#[error( "Failed to read config file {0}: {1}" )]
	Io( PathBuf, std::io::Error ),
	#[error( "Invalid config: {0}" )]
	Parse( #[from] toml::de::Error ),
}

/// Settings for a [`ModLoader`]( crate::ModLoader ). Missing keys take their
/// default values.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
#[serde( default )]
pub struct LoaderConfig {
	/// Directories holding the host's own libraries, searched first when
	/// resolving references.
	pub host_library_dirs: Vec<PathBuf>,
	/// Directories holding mod libraries and plugins.
	pub plugin_dirs: Vec<PathBuf>,
	/// Directory scanned for raw plugins to wrap.
	pub raw_plugin_dir: Option<PathBuf>,
	/// Executable that wraps raw plugins into containers.
	pub wrapper_backend: Option<PathBuf>,
	/// File extensions recognised as raw plugins.
	pub raw_plugin_extensions: Vec<String>,
	/// Names of the containers enabled at startup.
	pub enabled_mods: Vec<String>,
}

impl Default for LoaderConfig {
	fn default() -> Self {
		Self {
			host_library_dirs: Vec::new(),
			plugin_dirs: Vec::new(),
			raw_plugin_dir: None,
			wrapper_backend: None,
			raw_plugin_extensions: vec![ "wasm".to_string(), "zip".to_string() ],
			enabled_mods: Vec::new(),
		}
	}
}

impl LoaderConfig {

	/// # Errors
	/// Fails if `text` is not valid TOML or does not match the config layout.
	pub fn from_toml( text: &str ) -> Result<Self, ConfigError> {
		Ok( toml::from_str( text )? )
	}

	/// Reads the config file at `path`.
	///
	/// # Errors
	/// Fails if the file cannot be read or parsed.
	pub fn load( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		std::fs::read_to_string( path )
			.map_err(| err | ConfigError::Io( path.to_path_buf(), err ))?
			.pipe_as_ref( Self::from_toml )
	}

	/// The reference search path: host libraries first, then plugin directories.
	pub fn search_path( &self ) -> SearchPath {
		SearchPath::new( self.host_library_dirs.iter().chain( &self.plugin_dirs ))
	}

	/// A subprocess wrapper, if both a backend and a raw plugin directory are
	/// configured.
	pub fn wrapper( &self ) -> Option<ProcessWrapper> {
		let backend = self.wrapper_backend.as_ref()?;
		let plugin_dir = self.raw_plugin_dir.as_ref()?;
		Some( ProcessWrapper::new( backend, plugin_dir, self.raw_plugin_extensions.iter().cloned() ))
	}

}
