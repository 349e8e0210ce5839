pub mod error;
pub mod orchestrator;
pub mod process;
pub mod request;
pub mod resolver;

pub use error::{ErrorKind, GenerationError, GenerationOutcome};
pub use orchestrator::Orchestrator;
pub use request::{GenerationOptions, GenerationRequest, Target};
pub use resolver::{Resolver, ResolverContext};
