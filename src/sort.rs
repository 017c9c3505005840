//! Dependency ordering.

use std::collections::HashSet ;
use std::hash::Hash ;
use nonempty_collections::NEVec ;
use thiserror::Error ;



/// A dependency cycle found while sorting.
///
/// The chain starts with the node that was revisited, followed by the active
/// traversal stack from the most recently entered node back to the root, so
/// `A → B → A` is reported as `[A, B, A]`.
#[derive( Error, Debug, Clone )]
#[error( "Cyclic dependency:\n{}", render_chain( .chain ))]
pub struct CycleError<N: std::fmt::Display + Clone> {
	chain: NEVec<N>,
}

impl<N: std::fmt::Display + Clone> CycleError<N> {
	#[inline] pub fn chain( &self ) -> &NEVec<N> { &self.chain }
	#[inline] pub fn into_chain( self ) -> Vec<N> { Vec::from( self.chain ) }
	pub fn contains( &self, node: &N ) -> bool where N: PartialEq {
		self.chain.iter().any(| member | member == node )
	}
}

fn render_chain<N: std::fmt::Display + Clone>( chain: &NEVec<N> ) -> String {
	chain.iter()
		.map(| node | format!( " - {}", node ))
		.collect::<Vec<_>>()
		.join( "\n" )
}

/// Orders `nodes` so that every node comes after each of its dependencies that
/// is also part of `nodes`. Dependencies outside the node set are ignored.
///
/// Traversal is depth-first and deterministic: nodes are visited in input order
/// and each node's dependencies in the order `dependencies` yields them. The
/// walk keeps its own stack, so chain depth is bounded by memory only.
///
/// # Errors
/// Fails with a [`CycleError`] on the first node revisited while it is still
/// on the traversal stack. No partial ordering is returned.
pub fn topological_sort<N, D, I>(
	nodes: impl IntoIterator<Item = N>,
	dependencies: D,
) -> Result<Vec<N>, CycleError<N>>
where
	N: Clone + Eq + Hash + std::fmt::Display,
	D: FnMut( &N ) -> I,
	I: IntoIterator<Item = N>,
{

	let nodes = nodes.into_iter().collect::<Vec<_>>();
	let mut sorter = Sorter {
		dependencies,
		present: nodes.iter().cloned().collect(),
		visited: HashSet::with_capacity( nodes.len() ),
		finished: HashSet::with_capacity( nodes.len() ),
		sorted: Vec::with_capacity( nodes.len() ),
	};

	nodes.into_iter().try_for_each(| node | sorter.visit( node ))?;
	Ok( sorter.sorted )

}

/// A node on the traversal stack with the dependencies it has yet to visit.
type Frame<N> = ( N, std::vec::IntoIter<N> );

struct Sorter<N, D> {
	dependencies: D,
	present: HashSet<N>,
	visited: HashSet<N>,
	finished: HashSet<N>,
	sorted: Vec<N>,
}

impl<N, D, I> Sorter<N, D>
where
	N: Clone + Eq + Hash + std::fmt::Display,
	D: FnMut( &N ) -> I,
	I: IntoIterator<Item = N>,
{

	fn visit( &mut self, root: N ) -> Result<(), CycleError<N>> {

		if self.visited.contains( &root ) { return Ok(()) }

		let mut stack = Vec::new();
		self.enter( root, &mut stack );

		while let Some(( _, pending )) = stack.last_mut() {
			match pending.next() {
				Some( dependency ) => match ( self.visited.contains( &dependency ), self.finished.contains( &dependency )) {
					( false, _ ) => self.enter( dependency, &mut stack ),
					( true, true ) => {},
					( true, false ) => return Err( cycle( dependency, &stack )),
				},
				None => if let Some(( node, _ )) = stack.pop() {
					self.finished.insert( node.clone() );
					self.sorted.push( node );
				},
			}
		}

		Ok(())

	}

	fn enter( &mut self, node: N, stack: &mut Vec<Frame<N>> ) {
		self.visited.insert( node.clone() );
		let dependencies = ( self.dependencies )( &node ).into_iter()
			.filter(| dependency | self.present.contains( dependency ))
			.collect::<Vec<_>>();
		stack.push(( node, dependencies.into_iter() ));
	}

}

fn cycle<N: Clone + std::fmt::Display>( revisited: N, stack: &[Frame<N>] ) -> CycleError<N> {
	let mut chain = NEVec::new( revisited );
	stack.iter().rev().for_each(|( node, _ )| chain.push( node.clone() ));
	CycleError { chain }
}
