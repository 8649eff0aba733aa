/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match orchestrator: live scoring, undo, leg transitions, persistence hand-off.
pub mod match_service;
