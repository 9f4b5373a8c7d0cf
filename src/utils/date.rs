use chrono::NaiveDate;

/// 服务器本地时区的今天
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn is_future_date(date: NaiveDate) -> bool {
    date > today()
}

/// 校验闭区间 [from, to]
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> Result<(), String> {
    if from > to {
        return Err(format!(
            "from_date ({from}) must not be later than to_date ({to})"
        ));
    }
    Ok(())
}
