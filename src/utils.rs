mod partial_success ;

pub use partial_success::PartialSuccess ;

use itertools::Itertools ;



/// Joins items as an English list: `a`, `a and b`, `a, b and c`.
pub(crate) fn join_english<T: std::fmt::Display>( items: &[T] ) -> String {
	match items {
		[] => String::new(),
		[ only ] => only.to_string(),
		[ rest @ .., last ] => format!( "{} and {}", rest.iter().join( ", " ), last ),
	}
}
