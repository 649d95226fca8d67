pub mod audit;
pub mod document;
pub mod password_reset;
pub mod paystub;
pub mod share;
pub mod user;
pub mod verification;
