use rwmod_loader::{ LoadedModulePool, LoadError, ProgressLog };

use crate::fakes::{ build_pool, FakeFormat, FakeHost, ModuleSpec };

#[test]
fn load_aborts_on_cycle() {

	let format = FakeFormat::default();
	let pool = build_pool( &format, &[( "Mods", vec![
		ModuleSpec::library( "Standalone", "1.0.0" ),
		ModuleSpec::plugin( "A", "1.0.0" ).referencing( &[ "B" ]),
		ModuleSpec::plugin( "B", "1.0.0" ).referencing( &[ "A" ]),
	])]);
	let mut host = FakeHost::default();
	let mut progress = ProgressLog::new();

	match LoadedModulePool::load( &mut progress, pool, &mut host ) {
		Err( LoadError::CyclicDependency( err )) => {
			assert!( err.contains( &"A".to_string() ));
			assert!( err.contains( &"B".to_string() ));
		},
		Ok( loaded ) => panic!( "Expected a cycle, loaded: {:?}", loaded.loaded().iter().map(| module | module.name() ).collect::<Vec<_>>() ),
	}

	assert!( host.events().is_empty(), "Nothing may be injected: {:?}", host.events() );

}

#[test]
fn load_ignores_self_reference() {

	let format = FakeFormat::default();
	let pool = build_pool( &format, &[( "Mods", vec![ ModuleSpec::plugin( "Narcissus", "1.0.0" ).referencing( &[ "Narcissus" ])])]);
	let mut host = FakeHost::default();
	let mut progress = ProgressLog::new();

	match LoadedModulePool::load( &mut progress, pool, &mut host ) {
		Ok( loaded ) => assert_eq!( loaded.loaded().len(), 1 ),
		Err( err ) => panic!( "Unexpected error: {}", err ),
	}

}
