pub mod aggregate;
pub mod gpa;
pub mod init;
pub mod percentile;
pub mod validate;
