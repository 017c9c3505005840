//! The fixed binary header at the start of every module container.
//!
//! ```text
//! offset  size  field
//! 0       5     magic, "RWMOD" (a legacy first byte of 0x05 is accepted on read)
//! 5       2     format version, u16 big-endian
//! 7       1     flags
//! 8       var   version string (u16 big-endian length prefix, UTF-8)
//! ...     var   name
//! ...     var   owner
//! ...     var   homepage
//! ```
//!
//! Only format versions 1 and 2 are readable. Version 2 allows an empty version
//! string, meaning the container declares no version. Only the current magic and
//! format version are ever written.

use std::io::{ Read, Write };
use semver::Version ;
use thiserror::Error ;



/// Magic sequence written at the start of every container.
pub const MAGIC: [u8; 5] = [ 0x52, 0x57, 0x4D, 0x4F, 0x44 ];

/// First magic byte accepted on read for containers written by old tooling.
pub const LEGACY_MAGIC_LEAD: u8 = 0x05 ;

/// The format version this crate writes.
pub const FORMAT_VERSION: u16 = 2 ;

/// Bitset of container flags.
///
/// Unknown bits are preserved so a header survives a read/write round trip
/// even when it was written by newer tooling.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub struct HeaderFlags( u8 );

impl HeaderFlags {
	/// The container carries a region database entry.
	pub const RDB_ENTRY: Self = Self( 0x1 );
	/// The container carries an audio database entry.
	pub const AUDB_ENTRY: Self = Self( 0x2 );
	/// The container is hidden from the mod list.
	pub const HIDDEN: Self = Self( 0x4 );

	#[inline] pub const fn empty() -> Self { Self( 0 ) }
	#[inline] pub const fn from_bits( bits: u8 ) -> Self { Self( bits ) }
	#[inline] pub const fn bits( self ) -> u8 { self.0 }
	#[inline] pub const fn contains( self, other: Self ) -> bool { self.0 & other.0 == other.0 }
}

impl std::ops::BitOr for HeaderFlags {
	type Output = Self ;
	fn bitor( self, rhs: Self ) -> Self { Self( self.0 | rhs.0 ) }
}

/// Reasons a header could not be read or constructed.
#[derive( Error, Debug )]
pub enum HeaderError {
	/// The first five bytes are not a container magic sequence.
	#[error( "not a rwmod file" )]
	NotAContainer,
	/// Format version 0, written before the format stabilised.
	#[error( "older version; delete the loader folder and reinstall" )]
	TooOld,
	/// A format version this crate does not understand.
	#[error( "newer version ({0}); upgrade the loader" )]
	TooNew( u16 ),
	/// The version field is not a semantic version.
	#[error( "invalid semantic version: {0:?}" )]
	InvalidVersion( String ),
	/// The header is truncated or one of its strings is not UTF-8.
	#[error( "corrupt file: {0}" )]
	Corrupt( std::io::Error ),
	/// A field is longer than its length prefix can express.
	#[error( "field '{0}' is longer than {max} bytes", max = u16::MAX )]
	FieldTooLong( &'static str ),
}

/// Metadata describing a module container. Immutable once constructed.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct ContainerHeader {
	flags: HeaderFlags,
	version: Option<Version>,
	name: String,
	owner: String,
	homepage: String,
}

impl ContainerHeader {

	/// Creates a header.
	///
	/// # Errors
	/// Fails with [`HeaderError::FieldTooLong`] if a string field (or the rendered
	/// version) does not fit a u16 length prefix.
	pub fn new(
		flags: HeaderFlags,
		version: Option<Version>,
		name: impl Into<String>,
		owner: impl Into<String>,
		homepage: impl Into<String>,
	) -> Result<Self, HeaderError> {
		let header = Self { flags, version, name: name.into(), owner: owner.into(), homepage: homepage.into() };
		let rendered_version = header.version.as_ref().map( Version::to_string ).unwrap_or_default();
		[
			( "version", rendered_version.len() ),
			( "name", header.name.len() ),
			( "owner", header.owner.len() ),
			( "homepage", header.homepage.len() ),
		].into_iter()
			.find(|( _, len )| *len > usize::from( u16::MAX ))
			.map_or( Ok( header ), |( field, _ )| Err( HeaderError::FieldTooLong( field )))
	}

	#[inline] pub fn flags( &self ) -> HeaderFlags { self.flags }
	#[inline] pub fn version( &self ) -> Option<&Version> { self.version.as_ref() }
	#[inline] pub fn name( &self ) -> &str { &self.name }
	#[inline] pub fn owner( &self ) -> &str { &self.owner }
	#[inline] pub fn homepage( &self ) -> &str { &self.homepage }

	/// Reads a header from the start of `source`.
	///
	/// Never panics; every failure is classified into a [`HeaderError`]. A format
	/// version above [`FORMAT_VERSION`] is rejected without reading further.
	///
	/// # Errors
	/// See [`HeaderError`].
	pub fn read( source: &mut impl Read ) -> Result<Self, HeaderError> {

		let mut magic = [ 0u8; 5 ];
		source.read_exact( &mut magic ).map_err(|_| HeaderError::NotAContainer )?;
		if ( magic[0] != MAGIC[0] && magic[0] != LEGACY_MAGIC_LEAD ) || magic[1..] != MAGIC[1..] {
			return Err( HeaderError::NotAContainer );
		}

		match read_u16( source ).map_err( HeaderError::Corrupt )? {
			0 => Err( HeaderError::TooOld ),
			format @ ( 1 | 2 ) => Self::read_fields( format, source ),
			format => Err( HeaderError::TooNew( format )),
		}

	}

	fn read_fields( format: u16, source: &mut impl Read ) -> Result<Self, HeaderError> {

		let mut flags = [ 0u8 ];
		source.read_exact( &mut flags ).map_err( HeaderError::Corrupt )?;

		let version = match read_string( source ).map_err( HeaderError::Corrupt )? {
			text if format > 1 && text.is_empty() => None,
			text => Some( Version::parse( &text ).map_err(|_| HeaderError::InvalidVersion( text ))? ),
		};

		let name = read_string( source ).map_err( HeaderError::Corrupt )?;
		let owner = read_string( source ).map_err( HeaderError::Corrupt )?;
		let homepage = read_string( source ).map_err( HeaderError::Corrupt )?;

		Ok( Self { flags: HeaderFlags::from_bits( flags[0] ), version, name, owner, homepage })

	}

	/// Encodes the header with the current magic and format version.
	pub fn to_bytes( &self ) -> Vec<u8> {
		let version = self.version.as_ref().map( Version::to_string ).unwrap_or_default();
		let mut bytes = Vec::with_capacity( 8 + 8 + version.len() + self.name.len() + self.owner.len() + self.homepage.len() );
		bytes.extend_from_slice( &MAGIC );
		bytes.extend_from_slice( &FORMAT_VERSION.to_be_bytes() );
		bytes.push( self.flags.bits() );
		[ version.as_str(), self.name.as_str(), self.owner.as_str(), self.homepage.as_str() ].into_iter().for_each(| field | {
			// lengths are bounded by `new`
			let len = u16::try_from( field.len() ).unwrap_or( u16::MAX );
			bytes.extend_from_slice( &len.to_be_bytes() );
			bytes.extend_from_slice( field.as_bytes() );
		});
		bytes
	}

	/// Writes the header to `sink`.
	///
	/// # Errors
	/// Only I/O errors from `sink`; the encoding itself cannot fail.
	pub fn write( &self, sink: &mut impl Write ) -> std::io::Result<()> {
		sink.write_all( &self.to_bytes() )
	}

}

fn read_u16( source: &mut impl Read ) -> std::io::Result<u16> {
	let mut bytes = [ 0u8; 2 ];
	source.read_exact( &mut bytes )?;
	Ok( u16::from_be_bytes( bytes ))
}

fn read_string( source: &mut impl Read ) -> std::io::Result<String> {
	let len = read_u16( source )?;
	let mut bytes = vec![ 0u8; usize::from( len ) ];
	source.read_exact( &mut bytes )?;
	String::from_utf8( bytes ).map_err(| err | std::io::Error::new( std::io::ErrorKind::InvalidData, err ))
}
