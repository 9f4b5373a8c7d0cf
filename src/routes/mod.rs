pub mod attendance;

pub mod auth;

pub mod grades;

pub mod reports;

pub mod students;

pub mod users;

pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use grades::configure_grade_routes;
pub use reports::configure_report_routes;
pub use students::configure_student_routes;
pub use users::configure_user_routes;
