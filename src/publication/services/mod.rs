//! Application services for agent component publication.

mod publication;

pub use publication::{
    CreateAgentComponentRequest, PublicationService, PublicationServiceError,
    PublicationServiceResult,
};
