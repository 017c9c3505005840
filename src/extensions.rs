//! Registry of enum-style type extensions declared by loaded modules.
//!
//! Populated while mods initialise and cleared when they unload. Values are
//! assigned ordinals per target type in registration order; the host maps an
//! ordinal onto the first free value of its own enum.

use std::collections::HashMap ;
use thiserror::Error ;



/// Extra values a module adds to one of the host's enum types.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct TypeExtension {
	/// Full name of the extended type.
	pub target: String,
	/// Names of the values added, in declaration order.
	pub values: Vec<String>,
}

impl TypeExtension {
	pub fn new( target: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>> ) -> Self {
		Self { target: target.into(), values: values.into_iter().map( Into::into ).collect() }
	}
}

#[derive( Error, Debug, PartialEq, Eq )]
pub enum ExtensionError {
	#[error( "{target}.{value} is already registered by {owner}" )]
	DuplicateValue { target: String, value: String, owner: String },
}

#[derive( Debug, Clone )]
struct ExtensionValue {
	name: String,
	owner: String,
}

/// Process-wide table of registered extension values.
#[derive( Debug, Default )]
pub struct ExtensionRegistry {
	types: HashMap<String, Vec<ExtensionValue>>,
}

impl ExtensionRegistry {

	pub fn new() -> Self { Self::default() }

	/// Registers every value of `extension` on behalf of `owner`.
	///
	/// Registration is all-or-nothing per extension.
	///
	/// # Errors
	/// Fails if a value is already registered for the target, or repeats within
	/// `extension` itself.
	pub fn register( &mut self, owner: &str, extension: TypeExtension ) -> Result<(), ExtensionError> {

		let registered = self.types.entry( extension.target.clone() ).or_default();

		let mut pending: Vec<ExtensionValue> = Vec::with_capacity( extension.values.len() );
		for value in extension.values {
			if let Some( existing ) = registered.iter().chain( pending.iter() ).find(| existing | existing.name == value ) {
				return Err( ExtensionError::DuplicateValue {
					target: extension.target,
					value,
					owner: existing.owner.clone(),
				});
			}
			pending.push( ExtensionValue { name: value, owner: owner.to_string() });
		}

		registered.extend( pending );
		Ok(())

	}

	/// Registers every extension a module declares on behalf of `owner`.
	///
	/// Registration is all-or-nothing per module: if any extension fails, the
	/// ones already registered by this call are rolled back.
	///
	/// # Errors
	/// The first [`ExtensionError`] raised by [`Self::register`].
	pub fn register_all( &mut self, owner: &str, extensions: impl IntoIterator<Item = TypeExtension> ) -> Result<(), ExtensionError> {
		let mut registered = Vec::new();
		for extension in extensions {
			let target = extension.target.clone();
			let len = self.types.get( &target ).map_or( 0, Vec::len );
			if let Err( err ) = self.register( owner, extension ) {
				self.roll_back( registered );
				return Err( err );
			}
			registered.push(( target, len ));
		}
		Ok(())
	}

	fn roll_back( &mut self, registered: Vec<( String, usize )> ) {
		registered.into_iter().rev().for_each(|( target, len )| {
			if let Some( values ) = self.types.get_mut( &target ) { values.truncate( len ); }
		});
	}

	/// Ordinal of `value` among the extension values of `target`.
	pub fn ordinal( &self, target: &str, value: &str ) -> Option<usize> {
		self.types.get( target )?.iter().position(| registered | registered.name == value )
	}

	/// Module that registered `target.value`.
	pub fn owner( &self, target: &str, value: &str ) -> Option<&str> {
		self.types.get( target )?.iter()
			.find(| registered | registered.name == value )
			.map(| registered | registered.owner.as_str() )
	}

	/// Registered values of `target`, in ordinal order.
	pub fn values<'a>( &'a self, target: &str ) -> impl Iterator<Item = &'a str> + 'a {
		self.types.get( target ).into_iter().flatten().map(| registered | registered.name.as_str() )
	}

	pub fn is_empty( &self ) -> bool { self.types.values().all( Vec::is_empty )}

	pub fn clear( &mut self ) { self.types.clear(); }

}
