use std::io::Cursor ;
use rwmod_loader::{ ContainerHeader, HeaderFlags, Version, MAGIC, FORMAT_VERSION };

fn sample( version: Option<Version> ) -> ContainerHeader {
	ContainerHeader::new(
		HeaderFlags::RDB_ENTRY | HeaderFlags::HIDDEN,
		version,
		"Example Mod", "someone", "https://example.com/mod",
	).expect( "valid header" )
}

#[test]
fn header_round_trip_with_version() {

	let header = sample( Some( Version::parse( "1.4.2-beta.1" ).unwrap() ));
	let read = ContainerHeader::read( &mut Cursor::new( header.to_bytes() ));

	match read {
		Ok( read ) if read == header => {},
		value => panic!( "Expected the written header back, found: {:#?}", value ),
	}

}

#[test]
fn header_round_trip_without_version() {

	let header = sample( None );
	let read = ContainerHeader::read( &mut Cursor::new( header.to_bytes() )).expect( "header reads back" );

	assert_eq!( read.version(), None );
	assert_eq!( read.name(), "Example Mod" );
	assert!( read.flags().contains( HeaderFlags::HIDDEN ));
	assert!( !read.flags().contains( HeaderFlags::AUDB_ENTRY ));

}

#[test]
fn header_write_matches_to_bytes() {

	let header = sample( Some( Version::new( 2, 0, 0 )));
	let mut written = Vec::new();
	header.write( &mut written ).expect( "writing to a vec cannot fail" );

	assert_eq!( written, header.to_bytes() );

}

#[test]
fn header_layout_is_big_endian() {

	let header = ContainerHeader::new( HeaderFlags::AUDB_ENTRY, Some( Version::new( 1, 0, 0 )), "A", "", "" ).unwrap();
	let bytes = header.to_bytes();

	let mut expected = MAGIC.to_vec();
	expected.extend_from_slice( &FORMAT_VERSION.to_be_bytes() );
	expected.push( 0x2 );
	expected.extend_from_slice( &[ 0, 5 ]);
	expected.extend_from_slice( b"1.0.0" );
	expected.extend_from_slice( &[ 0, 1, b'A', 0, 0, 0, 0 ]);

	assert_eq!( bytes, expected );

}

#[test]
fn header_read_stops_after_homepage() {

	let header = sample( None );
	let mut bytes = header.to_bytes();
	let header_len = bytes.len() as u64 ;
	bytes.extend_from_slice( b"entry data follows" );

	let mut cursor = Cursor::new( bytes );
	let _ = ContainerHeader::read( &mut cursor ).expect( "header reads" );

	assert_eq!( cursor.position(), header_len );

}
