use rwmod_loader::{ LoaderConfig, LoaderState, MessageKind, ModLoader, ProgressLog };

use crate::fakes::{ Behaviour, FakeFormat, FakeHost, FakeSource, ModuleSpec };

fn config( enabled: &[&str] ) -> LoaderConfig {
	LoaderConfig { enabled_mods: enabled.iter().map( ToString::to_string ).collect(), ..LoaderConfig::default() }
}

fn stages( progress: &ProgressLog ) -> Vec<&str> {
	progress.messages_of( MessageKind::Info ).collect()
}

#[test]
fn fail_fast_after_read_stage() {

	let source = FakeSource::new( &[
		( "First", vec![ ModuleSpec::plugin( "Shared", "1.0.0" )]),
		( "Second", vec![ ModuleSpec::plugin( "Shared", "2.0.0" )]),
	]);
	let mut loader = ModLoader::new( FakeFormat::default(), FakeHost::default(), source, &config( &[ "First", "Second" ]));
	let mut progress = ProgressLog::new();

	loader.reload( &mut progress );

	assert!( progress.failed() );
	assert_eq!( stages( &progress ), vec![ "Disabling mods", "Reading modules" ]);
	assert_eq!( loader.state(), LoaderState::Unloaded );
	assert!( loader.host().events().is_empty() );

}

#[test]
fn fail_fast_on_cycle() {

	let source = FakeSource::new( &[( "Mods", vec![
		ModuleSpec::plugin( "A", "1.0.0" ).referencing( &[ "B" ]),
		ModuleSpec::plugin( "B", "1.0.0" ).referencing( &[ "A" ]),
	])]);
	let mut loader = ModLoader::new( FakeFormat::default(), FakeHost::default(), source, &config( &[ "Mods" ]));
	let mut progress = ProgressLog::new();

	loader.reload( &mut progress );

	let fatal = progress.messages_of( MessageKind::Fatal ).collect::<Vec<_>>();
	assert_eq!( fatal.len(), 1, "{:?}", fatal );
	assert!( fatal[0].starts_with( "Failed to load modules\nCyclic dependency:" ), "{}", fatal[0] );
	assert_eq!( stages( &progress ), vec![ "Disabling mods", "Reading modules", "Loading modules" ]);
	assert_eq!( loader.state(), LoaderState::Unloaded );
	assert!( loader.host().events().is_empty() );

}

#[test]
fn fail_fast_after_injection_keeps_pool() {

	let source = FakeSource::new( &[( "Mods", vec![ ModuleSpec::plugin( "A", "1.0.0" ), ModuleSpec::plugin( "B", "1.0.0" )])]);
	let mut host = FakeHost::default();
	host.reject.insert( "B".to_string() );
	let mut loader = ModLoader::new( FakeFormat::default(), host, source, &config( &[ "Mods" ]));
	let mut progress = ProgressLog::new();

	loader.reload( &mut progress );

	assert!( progress.failed() );
	assert_eq!( stages( &progress ), vec![ "Disabling mods", "Reading modules", "Loading modules" ]);
	assert_eq!( loader.state(), LoaderState::Loaded );
	assert!( loader.host().events_starting( "initialize" ).is_empty() );

	loader.unload( &mut ProgressLog::new() );
	assert_eq!( loader.host().events_starting( "remove_patches" ), vec![ "remove_patches A" ]);

}

#[test]
fn fail_fast_skips_state_delivery() {

	let source = FakeSource::new( &[( "Mods", vec![ ModuleSpec::plugin( "A", "1.0.0" )])]);
	let host = FakeHost::default()
		.behave( "A", Behaviour { reload_state: Some( "kept".to_string() ), ..Behaviour::default() })
		.behave( "Faulty", Behaviour { fail_initialize: true, ..Behaviour::default() });
	let shared = source.clone();
	let mut loader = ModLoader::new( FakeFormat::default(), host, source, &config( &[ "Mods", "Faulty" ]));
	loader.reload( &mut ProgressLog::new() );

	shared.add( "Faulty", vec![ ModuleSpec::plugin( "Faulty", "1.0.0" )]);
	let mut progress = ProgressLog::new();
	loader.reload( &mut progress );

	assert_eq!( progress.messages_of( MessageKind::Fatal ).collect::<Vec<_>>(), vec![ "Failed to initialize Faulty\nFaulty refused to start" ]);
	assert_eq!( stages( &progress ), vec![ "Disabling mods", "Reading modules", "Loading modules", "Enabling mods" ]);
	assert!( loader.host().events_starting( "receive" ).is_empty() );
	assert_eq!( loader.state(), LoaderState::Loaded );

}

#[test]
fn fail_fast_reported_by_earlier_stage() {

	let source = FakeSource::new( &[( "Mods", vec![ ModuleSpec::plugin( "A", "1.0.0" )])]);
	let host = FakeHost::default().behave( "A", Behaviour { fail_unload: true, ..Behaviour::default() });
	let mut loader = ModLoader::new( FakeFormat::default(), host, source, &config( &[ "Mods" ]));
	loader.reload( &mut ProgressLog::new() );
	loader.host().events.borrow_mut().clear();

	let mut progress = ProgressLog::new();
	loader.reload( &mut progress );

	assert_eq!( progress.messages_of( MessageKind::Fatal ).collect::<Vec<_>>(), vec![ "Failed to unload A\nA refused to stop" ]);
	assert_eq!( stages( &progress ), vec![ "Disabling mods" ]);
	assert_eq!( loader.state(), LoaderState::Unloaded );
	assert_eq!( loader.host().events(), vec![ "unload A", "remove_patches A" ]);

}

#[test]
fn progress_log_fails_on_fatal_until_reset() {

	let mut progress = ProgressLog::new();
	rwmod_loader::Progressable::message( &mut progress, MessageKind::Info, "Reading modules" );
	assert!( !progress.failed() );

	rwmod_loader::Progressable::message( &mut progress, MessageKind::Fatal, "Failed to load A" );
	assert!( progress.failed() );
	assert_eq!( progress.messages_of( MessageKind::Fatal ).collect::<Vec<_>>(), vec![ "Failed to load A" ]);

	progress.reset();
	assert!( !progress.failed() );
	assert!( progress.messages().is_empty() );

}
