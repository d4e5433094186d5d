//! File resolution and page generation.
//!
//! A request path first goes through the [`resolver`], which picks the file
//! that answers it, then through the [`generator`], which turns that file
//! into a status code and a body. Random choices (which CSV file, which
//! line) come from an injectable [`random::RandomSource`].

pub mod generator;
pub mod random;
pub mod resolver;

pub use generator::{generate, ResponsePayload, NOT_FOUND_BODY};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use resolver::{ResolutionMode, ResolvedSource, Resolver, TraversalPolicy};
