use serde::{Deserialize, Serialize};

// 考勤状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub const PRESENT: &'static str = "present";
    pub const ABSENT: &'static str = "absent";

    /// 报表中显示的文本
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

// 兼容大小写输入，例如 "Present"
impl<'de> Deserialize<'de> for AttendanceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的考勤状态: '{s}'. 支持的状态: present, absent"
            ))
        })
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "{}", AttendanceStatus::PRESENT),
            AttendanceStatus::Absent => write!(f, "{}", AttendanceStatus::ABSENT),
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            AttendanceStatus::PRESENT => Ok(AttendanceStatus::Present),
            AttendanceStatus::ABSENT => Ok(AttendanceStatus::Absent),
            _ => Err(format!("Invalid attendance status: {s}")),
        }
    }
}

// 考勤记录实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    /// 记录考勤的教职工，账号删除后为空
    pub teacher_id: Option<i64>,
    pub attendance_date: chrono::NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 带学生、年级、教师信息的考勤记录，用于列表与报表
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceDetail {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub student_name: String,
    pub roll_number: String,
    pub grade_id: i64,
    pub grade_name: String,
    pub teacher_name: Option<String>,
}

/// 出勤/缺勤计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    pub present: i64,
    pub absent: i64,
}

impl AttendanceTally {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a AttendanceStatus>) -> Self {
        let mut tally = Self::default();
        for status in statuses {
            tally.add(*status);
        }
        tally
    }

    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.present + self.absent
    }

    /// 出勤率（百分比，保留两位小数），无记录时为 0
    pub fn present_percentage(&self) -> f64 {
        self.present_hundredths() as f64 / 100.0
    }

    /// 缺勤率，与出勤率之和恒为 100
    pub fn absent_percentage(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (10_000 - self.present_hundredths()) as f64 / 100.0
    }

    // 以 0.01% 为单位的出勤率
    fn present_hundredths(&self) -> i64 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (self.present as f64 * 10_000.0 / total as f64).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            "Present".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!(
            serde_json::from_str::<AttendanceStatus>("\"ABSENT\"").unwrap(),
            AttendanceStatus::Absent
        );
        assert!("late".parse::<AttendanceStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::Present).unwrap(),
            "\"present\""
        );
    }

    #[test]
    fn test_empty_tally_has_zero_percentages() {
        let tally = AttendanceTally::default();
        assert_eq!(tally.total(), 0);
        assert_eq!(tally.present_percentage(), 0.0);
        assert_eq!(tally.absent_percentage(), 0.0);
    }

    #[test]
    fn test_percentages_round_to_two_decimals() {
        let statuses = [
            AttendanceStatus::Present,
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
        ];
        let tally = AttendanceTally::from_statuses(statuses.iter());
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.present_percentage(), 66.67);
        assert_eq!(tally.absent_percentage(), 33.33);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let tally = AttendanceTally {
            present: 7,
            absent: 1,
        };
        assert_eq!(tally.present_percentage() + tally.absent_percentage(), 100.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred_when_both_round_up() {
        for (present, absent) in [(1, 159), (1, 799), (3, 157)] {
            let tally = AttendanceTally { present, absent };
            assert_eq!(
                tally.present_percentage() + tally.absent_percentage(),
                100.0,
                "{present}/{absent}"
            );
        }
        let tally = AttendanceTally {
            present: 1,
            absent: 159,
        };
        assert_eq!(tally.present_percentage(), 0.63);
        assert_eq!(tally.absent_percentage(), 99.37);
    }
}
