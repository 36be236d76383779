//! Static tool registry and dispatcher.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value, json};
use tracing::{info, warn};

use crate::rchain::tools::{ToolCall, ToolDefinition, ToolFunction, ToolParam, ToolParamType};
use crate::weather::{DEFAULT_HOURS, MAX_HOURS, MIN_HOURS, WeatherClient};

pub const WEATHER_TOOL: &str = "fetch_weather_window";

/// Executes tool calls on behalf of the chat loop.
///
/// Implementations never fail: every problem is reported inside the returned
/// JSON payload.
pub trait ToolExecutor {
    /// Declarations sent to the model with each completion request.
    fn definitions(&self) -> &[ToolDefinition];

    fn execute(&self, call: &ToolCall) -> Value;
}

/// Declaration of the weather tool as exposed to the model.
pub fn weather_tool() -> ToolDefinition {
    ToolDefinition::from_function(
        ToolFunction::new(
            WEATHER_TOOL,
            "Query Open-Meteo for upcoming hourly temperature and precipitation chances.",
        )
        .with_param(
            ToolParam::new("city", ToolParamType::String, true)
                .with_description("Place name to look up, e.g. 'Lisbon'."),
        )
        .with_param(
            ToolParam::new("hours", ToolParamType::Integer, false)
                .with_description("Number of upcoming hours to return.")
                .with_bounds(MIN_HOURS, MAX_HOURS)
                .with_default(DEFAULT_HOURS),
        ),
    )
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeatherArgs {
    city: String,
    #[serde(default = "default_hours", deserialize_with = "saturating_hours")]
    hours: i64,
}

fn default_hours() -> i64 {
    DEFAULT_HOURS
}

/// Accepts any JSON number for `hours`; the weather client clamps it later.
///
/// Integers beyond `i64` saturate to its bounds and fractional values are
/// truncated toward zero. Non-numeric values are still rejected.
fn saturating_hours<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    Ok(number
        .as_i64()
        .or_else(|| number.as_u64().map(|_| i64::MAX))
        .or_else(|| number.as_f64().map(|value| value as i64))
        .unwrap_or(DEFAULT_HOURS))
}

/// Dispatcher over the built-in tools.
#[derive(Debug, Clone)]
pub struct Toolbox {
    weather: WeatherClient,
    definitions: Vec<ToolDefinition>,
}

impl Toolbox {
    pub fn new(weather: WeatherClient) -> Self {
        Self {
            weather,
            definitions: vec![weather_tool()],
        }
    }

    fn run_weather(&self, call: &ToolCall) -> Value {
        let args: WeatherArgs = match serde_json::from_value(Value::Object(call.parsed_arguments()))
        {
            Ok(args) => args,
            Err(err) => {
                warn!(tool = WEATHER_TOOL, arguments = call.arguments(), error = %err, "rejected tool arguments");
                return json!({ "error": format!("Invalid arguments for {WEATHER_TOOL}: {err}") });
            }
        };

        info!(city = %args.city, hours = args.hours, "fetching weather window");
        let report = self.weather.fetch_weather_window(&args.city, args.hours);
        serde_json::to_value(&report)
            .unwrap_or_else(|err| json!({ "city": args.city, "error": err.to_string() }))
    }
}

impl ToolExecutor for Toolbox {
    fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    fn execute(&self, call: &ToolCall) -> Value {
        match call.name() {
            WEATHER_TOOL => self.run_weather(call),
            other => {
                warn!(tool = other, "model requested an unknown tool");
                json!({ "error": format!("Unknown tool {other}") })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn offline_toolbox() -> Toolbox {
        // Unroutable endpoints: these tests never reach the network.
        Toolbox::new(
            WeatherClient::new("http://127.0.0.1:9/search", "http://127.0.0.1:9/forecast")
                .expect("client should build"),
        )
    }

    #[test]
    fn registry_exposes_weather_tool() {
        let toolbox = offline_toolbox();
        let names: Vec<&str> = toolbox.definitions().iter().map(|tool| tool.name()).collect();
        assert_eq!(names, vec![WEATHER_TOOL]);

        let schema = toolbox.definitions()[0].to_json();
        assert_eq!(schema["function"]["parameters"]["required"], json!(["city"]));
        assert_eq!(
            schema["function"]["parameters"]["properties"]["hours"]["maximum"],
            json!(24)
        );
    }

    #[test]
    fn unknown_tool_yields_error_payload() {
        let result = offline_toolbox().execute(&ToolCall::new("1", "book_hotel", "{}"));
        assert_eq!(result, json!({"error": "Unknown tool book_hotel"}));
    }

    #[test]
    fn malformed_arguments_are_treated_as_empty() {
        let result = offline_toolbox().execute(&ToolCall::new("1", WEATHER_TOOL, "{city:"));
        let error = result["error"].as_str().expect("error payload");
        assert!(error.starts_with("Invalid arguments for fetch_weather_window"));
        assert!(error.contains("city"), "{error}");
    }

    #[test]
    fn unexpected_argument_is_rejected() {
        let result = offline_toolbox().execute(&ToolCall::new(
            "1",
            WEATHER_TOOL,
            r#"{"city": "Rome", "units": "imperial"}"#,
        ));
        let error = result["error"].as_str().expect("error payload");
        assert!(error.contains("units"), "{error}");
    }

    fn mocked_toolbox(server: &mut mockito::ServerGuard) -> (Toolbox, mockito::Mock, mockito::Mock) {
        let geo = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Rome".into()))
            .with_status(200)
            .with_body(r#"{"results":[{"latitude":41.9,"longitude":12.5}]}"#)
            .create();
        let times: Vec<String> = (0..30).map(|h| format!("t{h}")).collect();
        let forecast = server
            .mock("GET", "/forecast")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"hourly": {"time": times}}).to_string())
            .create();

        let toolbox = Toolbox::new(
            WeatherClient::new(
                format!("{}/search", server.url()),
                format!("{}/forecast", server.url()),
            )
            .expect("client should build"),
        );
        (toolbox, geo, forecast)
    }

    fn window_hours_for(arguments: &str) -> Value {
        let mut server = mockito::Server::new();
        let (toolbox, _geo, _forecast) = mocked_toolbox(&mut server);
        let result = toolbox.execute(&ToolCall::new("1", WEATHER_TOOL, arguments));
        assert!(result.get("error").is_none(), "{result}");
        result["window_hours"].clone()
    }

    #[test]
    fn oversized_hours_saturate_to_maximum() {
        assert_eq!(
            window_hours_for(r#"{"city":"Rome","hours":100000000000000000000}"#),
            24
        );
        assert_eq!(
            window_hours_for(r#"{"city":"Rome","hours":18446744073709551615}"#),
            24
        );
        assert_eq!(
            window_hours_for(r#"{"city":"Rome","hours":-100000000000000000000}"#),
            1
        );
    }

    #[test]
    fn fractional_hours_are_truncated_then_clamped() {
        assert_eq!(window_hours_for(r#"{"city":"Rome","hours":6.0}"#), 6);
        assert_eq!(window_hours_for(r#"{"city":"Rome","hours":6.9}"#), 6);
        assert_eq!(window_hours_for(r#"{"city":"Rome","hours":0.5}"#), 1);
    }

    #[test]
    fn non_numeric_hours_are_rejected() {
        let result = offline_toolbox().execute(&ToolCall::new(
            "1",
            WEATHER_TOOL,
            r#"{"city": "Rome", "hours": "six"}"#,
        ));
        let error = result["error"].as_str().expect("error payload");
        assert!(error.starts_with("Invalid arguments for fetch_weather_window"), "{error}");
    }

    #[test]
    fn weather_call_defaults_hours_and_returns_window() {
        let mut server = mockito::Server::new();
        let (toolbox, _geo, _forecast) = mocked_toolbox(&mut server);
        let result = toolbox.execute(&ToolCall::new("1", WEATHER_TOOL, r#"{"city":"Rome"}"#));

        assert_eq!(result["city"], "Rome");
        assert_eq!(result["window_hours"], 12);
        assert_eq!(result["samples"][0]["temperature_c"], Value::Null);
    }
}
