//! API 业务错误码
//!
//! 0 表示成功；1xxx 通用错误；2xxx 认证与用户；3xxx 年级；4xxx 学生；
//! 5xxx 考勤；6xxx 报表。

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    RateLimitExceeded = 1029,

    // 认证与用户
    AuthFailed = 2000,
    UserNotFound = 2001,
    UserAlreadyExists = 2002,
    UserNameInvalid = 2003,
    UserEmailInvalid = 2004,
    UserPasswordInvalid = 2005,
    UserCreationFailed = 2006,
    UserUpdateFailed = 2007,
    UserDeleteFailed = 2008,
    UserEmailAlreadyExists = 2009,
    CanNotDeleteCurrentUser = 2010,
    TeacherGradeRequired = 2011,
    AccountDisabled = 2012,

    // 年级
    GradeNotFound = 3000,
    GradeAlreadyExists = 3001,
    GradeNotEmpty = 3002,
    GradePermissionDenied = 3003,
    GradeNameInvalid = 3004,

    // 学生
    StudentNotFound = 4000,
    StudentAlreadyExists = 4001,
    StudentDataInvalid = 4002,

    // 考勤
    AttendanceNotFound = 5000,
    AttendanceAlreadyExists = 5001,
    AttendanceDateInvalid = 5002,
    AttendanceRecordsInvalid = 5003,

    // 报表
    ReportDateRangeInvalid = 6000,
    ReportGenerationFailed = 6001,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.as_i32(), 0);
        assert_eq!(ErrorCode::Unauthorized.as_i32(), 1001);
        assert_eq!(ErrorCode::AttendanceAlreadyExists.as_i32(), 5001);
        assert_eq!(ErrorCode::ReportGenerationFailed.as_i32(), 6001);
    }
}
