pub mod csrf_token;
pub mod email;
pub mod session_id;
