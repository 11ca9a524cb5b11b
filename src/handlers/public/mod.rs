// handlers/public/mod.rs - Public handlers (no session required)
//
// Registration, the WhatsApp webhook and liveness endpoints. Every input is
// untrusted and validated before any external call.
pub mod auth;
pub mod health;
pub mod webhook;
