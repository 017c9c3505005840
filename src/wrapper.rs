//! Repackaging raw plugin files into containers.
//!
//! The repackaging itself is done by an external backend executable. It receives
//! one `-w <path>` argument per raw plugin file and prints the name of every
//! container it produced on its own line.

use std::path::{ Path, PathBuf };
use std::process::Command ;
use itertools::Itertools ;
use thiserror::Error ;
use tracing::debug ;

use crate::progress::{ Progressable, MessageKind };
use crate::utils::join_english ;



/// Turns newly dropped-in raw plugins into containers.
pub trait PluginWrapper {
	/// Wraps every pending raw plugin, returning the names of the containers
	/// produced. Failures are reported to `progress`.
	fn wrap( &mut self, progress: &mut dyn Progressable ) -> Vec<String> ;
}

#[derive( Error, Debug )]
pub enum WrapError {
	#[error( "Failed to list raw plugins in {0}: {1}" )]
	ListPlugins( PathBuf, std::io::Error ),
	#[error( "Failed to run {0}: {1}" )]
	Spawn( PathBuf, std::io::Error ),
}

/// A [`PluginWrapper`] that runs the backend executable as a subprocess.
#[derive( Debug, Clone )]
pub struct ProcessWrapper {
	backend: PathBuf,
	plugin_dir: PathBuf,
	extensions: Vec<String>,
}

impl ProcessWrapper {

	pub fn new(
		backend: impl Into<PathBuf>,
		plugin_dir: impl Into<PathBuf>,
		extensions: impl IntoIterator<Item = impl Into<String>>,
	) -> Self {
		Self {
			backend: backend.into(),
			plugin_dir: plugin_dir.into(),
			extensions: extensions.into_iter().map( Into::into ).collect(),
		}
	}

	/// Raw plugin files waiting to be wrapped: files with one of the configured
	/// extensions and directories, directly inside the plugin directory.
	///
	/// A missing plugin directory has no raw plugins.
	///
	/// # Errors
	/// Fails if the plugin directory exists but cannot be listed.
	pub fn raw_plugins( &self ) -> Result<Vec<PathBuf>, WrapError> {
		if !self.plugin_dir.is_dir() { return Ok( Vec::new() )}
		Ok( std::fs::read_dir( &self.plugin_dir )
			.map_err(| err | WrapError::ListPlugins( self.plugin_dir.clone(), err ))?
			.filter_map( Result::ok )
			.map(| entry | entry.path() )
			.filter(| path | path.is_dir() || self.has_plugin_extension( path ))
			.sorted()
			.collect() )
	}

	fn has_plugin_extension( &self, path: &Path ) -> bool {
		path.extension()
			.and_then(| ext | ext.to_str() )
			.is_some_and(| ext | self.extensions.iter().any(| wanted | wanted.eq_ignore_ascii_case( ext )))
	}

	fn command( &self, raw_plugins: &[PathBuf] ) -> Command {
		let mut command = Command::new( &self.backend );
		raw_plugins.iter().for_each(| path | { command.arg( "-w" ).arg( path ); });
		command
	}

}

impl PluginWrapper for ProcessWrapper {

	fn wrap( &mut self, progress: &mut dyn Progressable ) -> Vec<String> {

		let raw_plugins = match self.raw_plugins() {
			Ok( raw_plugins ) => raw_plugins,
			Err( err ) => {
				progress.message( MessageKind::Fatal, &err.to_string() );
				return Vec::new();
			},
		};
		if raw_plugins.is_empty() { return Vec::new() }
		debug!( count = raw_plugins.len(), backend = %self.backend.display(), "Wrapping raw plugins" );

		let output = match self.command( &raw_plugins ).output() {
			Ok( output ) => output,
			Err( err ) => {
				progress.message( MessageKind::Debug, &WrapError::Spawn( self.backend.clone(), err ).to_string() );
				progress.message( MessageKind::Fatal, "An error occurred while wrapping plugins. Error details logged." );
				return Vec::new();
			},
		};

		if !output.status.success() {
			let file_names = raw_plugins.iter()
				.map(| path | path.file_name().map_or_else(|| path.display().to_string(), | name | name.to_string_lossy().into_owned() ))
				.collect::<Vec<_>>();
			progress.message( MessageKind::Fatal, &format!( "Failed to wrap {}", join_english( &file_names )));
			progress.message( MessageKind::Fatal, &format!(
				"{} exited with {}\n{}",
				self.backend.display(), output.status, String::from_utf8_lossy( &output.stderr ),
			));
			return Vec::new();
		}

		let wrapped = String::from_utf8_lossy( &output.stdout )
			.lines()
			.map( str::trim )
			.filter(| line | !line.is_empty() )
			.map( str::to_string )
			.collect::<Vec<_>>();
		if !wrapped.is_empty() {
			progress.message( MessageKind::Debug, &format!( "Wrapped {}", join_english( &wrapped )));
		}
		wrapped

	}

}
