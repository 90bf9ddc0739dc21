//! Application services for skill exposure.

mod registry;

pub use registry::{
    CreateWorkflowRequest, SkillRegistryService, SkillRegistryServiceError,
    SkillRegistryServiceResult,
};
