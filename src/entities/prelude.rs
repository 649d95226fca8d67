pub use super::document_audit_logs::Entity as DocumentAuditLogs;
pub use super::document_shares::Entity as DocumentShares;
pub use super::documents::Entity as Documents;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::paystub_audit_logs::Entity as PaystubAuditLogs;
pub use super::paystub_generation_logs::Entity as PaystubGenerationLogs;
pub use super::paystubs::Entity as Paystubs;
pub use super::users::Entity as Users;
pub use super::verification_audit_logs::Entity as VerificationAuditLogs;
pub use super::verification_requests::Entity as VerificationRequests;
