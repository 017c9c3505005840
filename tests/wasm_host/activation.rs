use rwmod_loader::{ Host, ModuleDescriptor, WasmHost, WasmHostError };

use crate::components::{ INTERFACE, MINIMAL };

#[test]
fn wasm_host_injects_and_initializes() {

	let mut host = WasmHost::default();
	let module = host.inject( "Minimal;;0", MINIMAL.as_bytes().to_vec() ).expect( "component compiles" );
	assert_eq!( module.identity(), "Minimal;;0" );

	let mut entry = match host.activate( &module, &ModuleDescriptor::HostPlugin( INTERFACE.to_string() )) {
		Ok( entry ) => entry,
		Err( err ) => panic!( "Failed to activate: {}", err ),
	};

	entry.initialize( &module ).expect( "initialize runs" );
	entry.unload().expect( "missing unload hook is a no-op" );
	assert!( entry.reload_state().expect( "missing state hook is a no-op" ).is_none() );

	host.remove_patches( &module );

}

#[test]
fn wasm_host_rejects_invalid_component() {
	match WasmHost::default().inject( "Broken;;0", b"\0asm not really".to_vec() ) {
		Err( WasmHostError::Compile( _ )) => {},
		Err( err ) => panic!( "Expected a compile error, found: {}", err ),
		Ok( module ) => panic!( "Expected a compile error, found: {:?}", module ),
	}
}

#[test]
fn wasm_host_requires_entry_export() {

	let mut host = WasmHost::default();
	let module = host.inject( "Minimal;;0", MINIMAL.as_bytes().to_vec() ).expect( "component compiles" );

	match host.activate( &module, &ModuleDescriptor::HostPlugin( "test:mod/missing".to_string() )) {
		Err( WasmHostError::MissingExport( identity, export )) => {
			assert_eq!( identity, "Minimal;;0" );
			assert_eq!( export, "test:mod/missing" );
		},
		Err( err ) => panic!( "Expected MissingExport, found: {}", err ),
		Ok( _ ) => panic!( "Expected MissingExport" ),
	}

}

#[test]
fn wasm_host_does_not_activate_libraries() {

	let mut host = WasmHost::default();
	let module = host.inject( "Minimal;;0", MINIMAL.as_bytes().to_vec() ).expect( "component compiles" );

	match host.activate( &module, &ModuleDescriptor::Library ) {
		Err( WasmHostError::NotAPlugin( identity )) if identity == "Minimal;;0" => {},
		Err( err ) => panic!( "Expected NotAPlugin, found: {}", err ),
		Ok( _ ) => panic!( "Expected NotAPlugin" ),
	}

}
