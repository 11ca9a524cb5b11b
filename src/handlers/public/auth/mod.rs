pub mod register; // POST /api/auth/register
pub mod utils;

pub use register::register;
