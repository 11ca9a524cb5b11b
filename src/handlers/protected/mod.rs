// handlers/protected/mod.rs - Session-required handlers
//
// Mounted behind middleware::require_session, which injects the Session
// extension or answers 401 before these run.
pub mod profile; // GET /api/profile
pub mod theme; // POST /api/themes/activate
