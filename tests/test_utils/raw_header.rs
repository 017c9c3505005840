/// Hand-assembles header bytes so malformed and legacy layouts can be tested.
#[allow( dead_code )]
mod raw_header {

	pub fn raw_header( magic: &[u8], format: u16, flags: u8, fields: &[&str] ) -> Vec<u8> {
		let mut bytes = magic.to_vec();
		bytes.extend_from_slice( &format.to_be_bytes() );
		bytes.push( flags );
		for field in fields {
			bytes.extend_from_slice( &( field.len() as u16 ).to_be_bytes() );
			bytes.extend_from_slice( field.as_bytes() );
		}
		bytes
	}

}
