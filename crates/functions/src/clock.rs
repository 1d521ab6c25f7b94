//! Clock functions: `getDate` and `getTime` in the `clock` action group.
//!
//! Both accept an optional strftime `format` argument. Time is always UTC.

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use handback_core::definition::{FunctionSpec, ParameterSpec, ParameterType};
use handback_core::error::FunctionError;
use handback_core::function::{FunctionInvocationRequest, FunctionResult, LocalFunction};

pub const CLOCK_ACTION_GROUP: &str = "clock";

/// Where the functions read the current time from.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(t) => *t,
        }
    }
}

pub struct GetDate {
    clock: Clock,
}

impl GetDate {
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl LocalFunction for GetDate {
    fn action_group(&self) -> &str {
        CLOCK_ACTION_GROUP
    }

    fn name(&self) -> &str {
        "getDate"
    }

    fn spec(&self) -> FunctionSpec {
        FunctionSpec::new("Get today's date (UTC).").with_parameter(
            "format",
            ParameterSpec::optional(
                ParameterType::String,
                "strftime pattern for the answer (default: %Y-%m-%d)",
            ),
        )
    }

    async fn call(
        &self,
        request: &FunctionInvocationRequest,
    ) -> Result<FunctionResult, FunctionError> {
        let format = request.argument("format").unwrap_or("%Y-%m-%d");
        let text = render(self.clock.now(), format)?;
        Ok(FunctionResult::success(request, text))
    }
}

pub struct GetTime {
    clock: Clock,
}

impl GetTime {
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl LocalFunction for GetTime {
    fn action_group(&self) -> &str {
        CLOCK_ACTION_GROUP
    }

    fn name(&self) -> &str {
        "getTime"
    }

    fn spec(&self) -> FunctionSpec {
        FunctionSpec::new("Get the current time of day (UTC).").with_parameter(
            "format",
            ParameterSpec::optional(
                ParameterType::String,
                "strftime pattern for the answer (default: %H:%M:%S)",
            ),
        )
    }

    async fn call(
        &self,
        request: &FunctionInvocationRequest,
    ) -> Result<FunctionResult, FunctionError> {
        let format = request.argument("format").unwrap_or("%H:%M:%S");
        let text = render(self.clock.now(), format)?;
        Ok(FunctionResult::success(request, text))
    }
}

/// Format `at` with a user-supplied pattern, rejecting invalid specifiers
/// instead of panicking inside chrono's formatter.
fn render(at: DateTime<Utc>, format: &str) -> Result<String, FunctionError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return Err(FunctionError::InvalidArguments(format!(
            "invalid format pattern '{format}'"
        )));
    }
    Ok(at.format_with_items(items.into_iter()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> Clock {
        Clock::Fixed(Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 15).unwrap())
    }

    #[tokio::test]
    async fn get_date_default_format() {
        let function = GetDate::new(fixed());
        let request = FunctionInvocationRequest::new(CLOCK_ACTION_GROUP, "getDate");
        let result = function.call(&request).await.unwrap();
        assert_eq!(result.text(), Some("2024-01-01"));
        assert_eq!(result.function, "getDate");
    }

    #[tokio::test]
    async fn get_date_custom_format() {
        let function = GetDate::new(fixed());
        let request = FunctionInvocationRequest::new(CLOCK_ACTION_GROUP, "getDate")
            .with_parameter("format", "string", "%d/%m/%Y");
        let result = function.call(&request).await.unwrap();
        assert_eq!(result.text(), Some("01/01/2024"));
    }

    #[tokio::test]
    async fn get_time_default_format() {
        let function = GetTime::new(fixed());
        let request = FunctionInvocationRequest::new(CLOCK_ACTION_GROUP, "getTime");
        let result = function.call(&request).await.unwrap();
        assert_eq!(result.text(), Some("09:30:15"));
    }

    #[tokio::test]
    async fn invalid_format_is_rejected() {
        let function = GetDate::new(fixed());
        let request = FunctionInvocationRequest::new(CLOCK_ACTION_GROUP, "getDate")
            .with_parameter("format", "string", "%Q");
        let err = function.call(&request).await.unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArguments(_)));
    }

    #[test]
    fn spec_marks_format_optional() {
        let spec = GetDate::new(Clock::System).spec();
        assert!(!spec.parameters["format"].required);
    }
}
