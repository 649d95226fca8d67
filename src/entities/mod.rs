pub mod prelude;

pub mod document_audit_logs;
pub mod document_shares;
pub mod documents;
pub mod password_reset_tokens;
pub mod paystub_audit_logs;
pub mod paystub_generation_logs;
pub mod paystubs;
pub mod users;
pub mod verification_audit_logs;
pub mod verification_requests;
