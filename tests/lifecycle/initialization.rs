use rwmod_loader::{ ExtensionRegistry, LoadedModulePool, MessageKind, ProgressLog };

use crate::fakes::{ build_pool, Behaviour, FakeDefinition, FakeFormat, FakeHandle, FakeHost, ModuleSpec };

fn load( format: &FakeFormat, host: &mut FakeHost, modules: Vec<ModuleSpec> ) -> LoadedModulePool<FakeDefinition, FakeHandle> {
	let pool = build_pool( format, &[( "Mods", modules )]);
	let mut progress = ProgressLog::new();
	let loaded = LoadedModulePool::load( &mut progress, pool, host ).expect( "acyclic pool loads" );
	assert!( !progress.failed(), "{:?}", progress.messages() );
	host.events.borrow_mut().clear();
	loaded
}

#[test]
fn initialization_failure_is_isolated() {

	let format = FakeFormat::default();
	let mut host = FakeHost::default().behave( "B", Behaviour { fail_initialize: true, ..Behaviour::default() });
	let mut loaded = load( &format, &mut host, vec![
		ModuleSpec::plugin( "A", "1.0.0" ),
		ModuleSpec::plugin( "B", "1.0.0" ),
		ModuleSpec::plugin( "C", "1.0.0" ),
	]);
	let mut progress = ProgressLog::new();

	loaded.initialize_mods( &mut progress, &mut host, &mut ExtensionRegistry::new() );

	assert_eq!( progress.messages_of( MessageKind::Debug ).collect::<Vec<_>>(), vec![ "Finished loading A", "Finished loading C" ]);
	assert_eq!( progress.messages_of( MessageKind::Fatal ).collect::<Vec<_>>(), vec![ "Failed to initialize B\nB refused to start" ]);
	assert_eq!( host.events(), vec![
		"pre_initialize",
		"activate A host plugin A.Entry", "initialize A",
		"activate B host plugin B.Entry", "initialize B",
		"activate C host plugin C.Entry", "initialize C",
		"post_initialize",
	]);
	assert_eq!( progress.progress(), 1.0 );

}

#[test]
fn initialization_panic_is_isolated() {

	let format = FakeFormat::default();
	let mut host = FakeHost::default().behave( "B", Behaviour { panic_initialize: true, ..Behaviour::default() });
	let mut loaded = load( &format, &mut host, vec![
		ModuleSpec::plugin( "A", "1.0.0" ),
		ModuleSpec::plugin( "B", "1.0.0" ),
		ModuleSpec::plugin( "C", "1.0.0" ),
	]);
	let mut progress = ProgressLog::new();

	loaded.initialize_mods( &mut progress, &mut host, &mut ExtensionRegistry::new() );

	let fatal = progress.messages_of( MessageKind::Fatal ).collect::<Vec<_>>();
	assert_eq!( fatal, vec![ "Failed to initialize B\nHook panicked: B blew up" ]);
	assert_eq!( host.events_starting( "initialize" ), vec![ "initialize A", "initialize C" ]);
	assert!( host.events().contains( &"post_initialize".to_string() ));

}

#[test]
fn initialization_skips_libraries() {

	let format = FakeFormat::default();
	let mut host = FakeHost::default();
	let mut loaded = load( &format, &mut host, vec![
		ModuleSpec::library( "Lib", "1.0.0" ),
		ModuleSpec::legacy_plugin( "Old", "1.0.0" ),
	]);
	let mut progress = ProgressLog::new();

	loaded.initialize_mods( &mut progress, &mut host, &mut ExtensionRegistry::new() );

	assert_eq!( progress.messages_of( MessageKind::Debug ).collect::<Vec<_>>(), vec![ "Finished loading Lib", "Finished loading Old" ]);
	assert_eq!( host.events_starting( "activate" ), vec![ "activate Old legacy plugin Old.Entry" ]);
	assert!( !loaded.get( "Lib" ).expect( "Lib is loaded" ).is_active() );
	assert!( loaded.get( "Old" ).expect( "Old is loaded" ).is_active() );

}

#[test]
fn initialization_reports_activation_failure() {

	let format = FakeFormat::default();
	let mut host = FakeHost::default();
	host.reject_activation.insert( "B".to_string() );
	let mut loaded = load( &format, &mut host, vec![
		ModuleSpec::plugin( "A", "1.0.0" ),
		ModuleSpec::plugin( "B", "1.0.0" ),
	]);
	let mut progress = ProgressLog::new();

	loaded.initialize_mods( &mut progress, &mut host, &mut ExtensionRegistry::new() );

	assert_eq!(
		progress.messages_of( MessageKind::Fatal ).collect::<Vec<_>>(),
		vec![ "Failed to initialize B\nFailed to activate entry point: no entry type in B" ],
	);
	assert!( !loaded.get( "B" ).expect( "B is loaded" ).is_active() );
	assert_eq!( host.events_starting( "initialize" ), vec![ "initialize A" ]);

}
