use chrono::{Local, NaiveDate, NaiveTime};
use shared::handler::handler_fn;
use shared::plugin::{Plugin, PluginContext, Registration};

pub struct TimePlugin;

impl Plugin for TimePlugin {
    fn name(&self) -> &'static str {
        "time"
    }

    fn register(&self, _ctx: &PluginContext) -> Registration {
        Registration::new()
            .with(&["time"], handler_fn(|_| Ok(describe_time(Local::now().time()))))
            .with(&["date"], handler_fn(|_| Ok(describe_date(Local::now().date_naive()))))
    }
}

pub fn describe_time(time: NaiveTime) -> String {
    format!("The current time is {}", time.format("%H:%M:%S"))
}

pub fn describe_date(date: NaiveDate) -> String {
    format!("Today's date is {}", date.format("%A, %B %d, %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_time() {
        let time = NaiveTime::from_hms_opt(14, 5, 9).unwrap();
        assert_eq!(describe_time(time), "The current time is 14:05:09");
    }

    #[test]
    fn test_describe_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(describe_date(date), "Today's date is Thursday, March 07, 2024");
    }
}
