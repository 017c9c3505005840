//! Module containers: a header plus embedded module byte ranges.
//!
//! Locating the entries inside a container is the job of an external index
//! reader; a [`Container`] only holds the resulting ranges and the open stream
//! they point into.

use std::io::{ Read, Seek, SeekFrom };
use std::ops::Range ;
use std::path::{ Path, PathBuf };
use itertools::Itertools ;

use crate::{ ContainerHeader, HeaderError, Progressable };
use crate::utils::PartialSuccess ;



/// File extension of container files.
pub const CONTAINER_EXTENSION: &str = "rwmod" ;

/// A seekable byte stream backing a container.
pub trait ContainerStream: Read + Seek {}
impl<T: Read + Seek> ContainerStream for T {}

/// An opened container file.
///
/// The stream stays open for as long as the container lives; dropping the
/// container releases it.
pub struct Container {
	path: PathBuf,
	header: ContainerHeader,
	entries: Vec<Range<u64>>,
	stream: Box<dyn ContainerStream>,
}

impl std::fmt::Debug for Container {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Container" )
			.field( "path", &self.path )
			.field( "header", &self.header )
			.field( "entries", &self.entries )
			.field( "stream", &"<stream>" )
			.finish()
	}
}

impl Container {

	pub fn new(
		path: impl Into<PathBuf>,
		header: ContainerHeader,
		entries: impl IntoIterator<Item = Range<u64>>,
		stream: impl ContainerStream + 'static,
	) -> Self {
		Self { path: path.into(), header, entries: entries.into_iter().collect(), stream: Box::new( stream ) }
	}

	#[inline] pub fn path( &self ) -> &Path { &self.path }
	#[inline] pub fn header( &self ) -> &ContainerHeader { &self.header }
	#[inline] pub fn entries( &self ) -> &[Range<u64>] { &self.entries }

	/// The container's file name without its directory.
	pub fn file_name( &self ) -> String {
		self.path.file_name()
			.map_or_else(|| self.path.to_string_lossy(), | name | name.to_string_lossy() )
			.into_owned()
	}

	/// Reads the bytes of the entry at `index`.
	///
	/// # Errors
	/// `InvalidInput` for an out-of-range index or an inverted range,
	/// `UnexpectedEof` if the stream ends inside the entry, or any error
	/// from the stream itself.
	pub fn read_entry( &mut self, index: usize ) -> std::io::Result<Vec<u8>> {

		let range = self.entries.get( index ).cloned().ok_or_else(|| std::io::Error::new(
			std::io::ErrorKind::InvalidInput,
			format!( "entry {} out of range, container has {}", index, self.entries.len() ),
		))?;
		let len = range.end.checked_sub( range.start )
			.and_then(| len | usize::try_from( len ).ok() )
			.ok_or_else(|| std::io::Error::new( std::io::ErrorKind::InvalidInput, format!( "invalid entry range {:?}", range )))?;

		self.stream.seek( SeekFrom::Start( range.start ))?;
		let mut bytes = vec![ 0u8; len ];
		self.stream.read_exact( &mut bytes )?;
		Ok( bytes )

	}

}

/// Enumerates every discoverable container, opened and header-parsed.
pub trait ContainerSource {
	/// Opens all containers. Containers that fail to open are reported to
	/// `progress` and left out.
	fn containers( &mut self, progress: &mut dyn Progressable ) -> Vec<Container> ;
}

/// A header read from a container file that failed to parse.
#[derive( thiserror::Error, Debug )]
pub enum HeaderReadError {
	#[error( "Failed to open {0}: {1}" )]
	Io( PathBuf, std::io::Error ),
	#[error( "Failed to read header of {0}: {1}" )]
	Header( PathBuf, HeaderError ),
}

/// Lists the container files directly inside `dir`, sorted by path.
///
/// # Errors
/// Fails if `dir` cannot be listed.
pub fn container_paths( dir: impl AsRef<Path> ) -> std::io::Result<Vec<PathBuf>> {
	Ok( std::fs::read_dir( dir )?
		.filter_map( Result::ok )
		.map(| entry | entry.path() )
		.filter(| path | path.is_file() && path.extension().is_some_and(| ext | ext == CONTAINER_EXTENSION ))
		.sorted()
		.collect() )
}

/// Reads the header of every file in `paths`.
pub fn read_headers( paths: impl IntoIterator<Item = PathBuf> ) -> PartialSuccess<Vec<( PathBuf, ContainerHeader )>, HeaderReadError> {
	paths.into_iter()
		.map(| path | match std::fs::File::open( &path ) {
			Err( err ) => Err( HeaderReadError::Io( path, err )),
			Ok( file ) => match ContainerHeader::read( &mut std::io::BufReader::new( file )) {
				Ok( header ) => Ok(( path, header )),
				Err( err ) => Err( HeaderReadError::Header( path, err )),
			},
		})
		.partition_result()
}
