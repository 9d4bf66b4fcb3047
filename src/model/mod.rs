pub mod answer;
pub mod assignment;
pub mod entity;
pub mod form_field;
pub mod pagination;
pub mod question;
pub mod survey;

/// Our question IDs are integers.
pub type QuestionId = i64;
/// Our vendor IDs are integers.
pub type VendorId = i64;
/// Our user IDs are integers.
pub type UserId = i64;
/// Our department IDs are integers.
pub type DepartmentId = i64;
