//! Current weather tool backed by the KMA ultra-short-term observation API.
//!
//! Without an API key, or when the upstream call fails, the tool answers
//! with a fixed fallback report so the model can still recommend something.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{ChefError, Result};

use super::{Tool, ToolContext};

const KMA_NCST_URL: &str =
    "http://apis.data.go.kr/1360000/VilageFcstInfoService_2.0/getUltraSrtNcst";
const DEFAULT_LOCATION: &str = "서울";
const DEFAULT_GRID: (i64, i64) = (60, 127);

/// Forecast grid coordinates of major cities.
pub const LOCATION_COORDS: &[(&str, (i64, i64))] = &[
    ("서울", (60, 127)),
    ("부산", (98, 76)),
    ("대구", (89, 90)),
    ("인천", (55, 124)),
    ("광주", (58, 74)),
    ("대전", (67, 100)),
    ("울산", (102, 84)),
    ("수원", (60, 121)),
    ("제주", (52, 38)),
];

/// Grid coordinates for a city, falling back to Seoul.
pub fn grid_for(location: &str) -> (i64, i64) {
    LOCATION_COORDS
        .iter()
        .find(|(name, _)| *name == location.trim())
        .map(|(_, grid)| *grid)
        .unwrap_or(DEFAULT_GRID)
}

/// Current conditions as reported to the model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherReport {
    pub status: String,
    pub location: String,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub precipitation: Option<String>,
    pub wind_speed: Option<String>,
    pub sky_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherReport {
    /// Fixed report used when live data is unavailable.
    pub fn fallback(status: &str, location: &str, error: Option<String>) -> Self {
        Self {
            status: status.to_string(),
            location: location.to_string(),
            temperature: Some("15°C".to_string()),
            humidity: Some("60%".to_string()),
            precipitation: Some("없음".to_string()),
            wind_speed: Some("2.5m/s".to_string()),
            sky_status: "맑음".to_string(),
            error,
        }
    }

    /// Build a report from KMA observation items.
    pub fn from_observations(location: &str, items: &[Observation]) -> Self {
        let mut report = Self {
            status: "success".to_string(),
            location: location.to_string(),
            temperature: None,
            humidity: None,
            precipitation: None,
            wind_speed: None,
            sky_status: "맑음".to_string(),
            error: None,
        };

        for item in items {
            let value = item.value();
            match item.category.as_str() {
                "T1H" => report.temperature = Some(format!("{}°C", value)),
                "REH" => report.humidity = Some(format!("{}%", value)),
                "RN1" => {
                    let rain = value.parse::<f64>().map(|v| v > 0.0).unwrap_or(false);
                    report.precipitation = Some(if rain { "비" } else { "없음" }.to_string());
                }
                "WSD" => report.wind_speed = Some(format!("{}m/s", value)),
                "PTY" => match value.as_str() {
                    "1" => report.sky_status = "비".to_string(),
                    "2" => report.sky_status = "비/눈".to_string(),
                    "3" => report.sky_status = "눈".to_string(),
                    _ => {}
                },
                _ => {}
            }
        }
        report
    }
}

/// One KMA observation row.
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub category: String,
    #[serde(rename = "obsrValue")]
    pub obsr_value: Value,
}

impl Observation {
    fn value(&self) -> String {
        match &self.obsr_value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NcstEnvelope {
    response: NcstResponse,
}

#[derive(Debug, Deserialize)]
struct NcstResponse {
    body: NcstBody,
}

#[derive(Debug, Deserialize)]
struct NcstBody {
    items: NcstItems,
}

#[derive(Debug, Deserialize)]
struct NcstItems {
    item: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    #[serde(default = "default_location")]
    location: String,
    nx: Option<i64>,
    ny: Option<i64>,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

/// Current weather lookup for a Korean city or forecast grid point.
pub struct WeatherTool {
    api_key: Option<String>,
    endpoint: String,
    client: Client,
}

impl WeatherTool {
    /// Create a new weather tool. Without a key every call returns the mock report.
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: KMA_NCST_URL.to_string(),
            client,
        }
    }

    /// Point the tool at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    async fn fetch(
        &self,
        api_key: &str,
        nx: i64,
        ny: i64,
    ) -> std::result::Result<Vec<Observation>, FetchFailure> {
        let now = Local::now();
        let base_date = now.format("%Y%m%d").to_string();
        let base_time = now.format("%H00").to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("serviceKey", api_key),
                ("pageNo", "1"),
                ("numOfRows", "10"),
                ("dataType", "JSON"),
                ("base_date", base_date.as_str()),
                ("base_time", base_time.as_str()),
                ("nx", nx.to_string().as_str()),
                ("ny", ny.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchFailure::Failed(e.into()))?;

        if !response.status().is_success() {
            return Err(FetchFailure::Status(response.status()));
        }

        let envelope: NcstEnvelope = response
            .json()
            .await
            .map_err(|e| FetchFailure::Failed(e.into()))?;
        Ok(envelope.response.body.items.item)
    }
}

/// Why a live lookup produced no observations.
#[derive(Debug)]
enum FetchFailure {
    /// The API answered with a non-success status
    Status(StatusCode),
    /// Transport or decoding failed
    Failed(ChefError),
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "현재 날씨 정보 조회 (기온, 습도, 강수, 풍속, 하늘 상태)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "지역명 (예: '서울', '부산')",
                    "default": DEFAULT_LOCATION
                },
                "nx": {"type": "integer", "description": "격자 X 좌표"},
                "ny": {"type": "integer", "description": "격자 Y 좌표"}
            }
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let args: WeatherArgs = serde_json::from_value(args)?;
        let (grid_x, grid_y) = grid_for(&args.location);
        let nx = args.nx.unwrap_or(grid_x);
        let ny = args.ny.unwrap_or(grid_y);

        let report = match self.api_key.as_deref() {
            None => WeatherReport::fallback("mock", &args.location, None),
            Some(key) => match self.fetch(key, nx, ny).await {
                Ok(items) => WeatherReport::from_observations(&args.location, &items),
                Err(FetchFailure::Status(status)) => {
                    warn!(location = %args.location, status = %status, "KMA API error, using fallback");
                    WeatherReport::fallback("error_fallback", &args.location, None)
                }
                Err(FetchFailure::Failed(e)) => {
                    warn!(location = %args.location, error = %e, "Weather lookup failed, using fallback");
                    WeatherReport::fallback("exception_fallback", &args.location, Some(e.to_string()))
                }
            },
        };

        Ok(serde_json::to_value(report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(category: &str, value: &str) -> Observation {
        Observation {
            category: category.to_string(),
            obsr_value: json!(value),
        }
    }

    #[test]
    fn test_grid_for() {
        assert_eq!(grid_for("부산"), (98, 76));
        assert_eq!(grid_for(" 제주 "), (52, 38));
        assert_eq!(grid_for("Unknown"), (60, 127));
    }

    #[test]
    fn test_from_observations() {
        let items = vec![
            obs("T1H", "12.3"),
            obs("REH", "80"),
            obs("RN1", "1.5"),
            obs("WSD", "3.1"),
            obs("PTY", "1"),
            obs("VEC", "270"),
        ];
        let report = WeatherReport::from_observations("서울", &items);
        assert_eq!(report.status, "success");
        assert_eq!(report.temperature.as_deref(), Some("12.3°C"));
        assert_eq!(report.humidity.as_deref(), Some("80%"));
        assert_eq!(report.precipitation.as_deref(), Some("비"));
        assert_eq!(report.wind_speed.as_deref(), Some("3.1m/s"));
        assert_eq!(report.sky_status, "비");
    }

    #[test]
    fn test_from_observations_dry_and_snow() {
        let report =
            WeatherReport::from_observations("대구", &[obs("RN1", "0"), obs("PTY", "3")]);
        assert_eq!(report.precipitation.as_deref(), Some("없음"));
        assert_eq!(report.sky_status, "눈");
        assert!(report.temperature.is_none());
    }

    #[test]
    fn test_numeric_observation_values() {
        let item = Observation {
            category: "T1H".into(),
            obsr_value: json!(4.5),
        };
        let report = WeatherReport::from_observations("인천", &[item]);
        assert_eq!(report.temperature.as_deref(), Some("4.5°C"));
    }

    #[test]
    fn test_envelope_parsing() {
        let raw = r#"{"response":{"header":{"resultCode":"00"},"body":{"items":{"item":[
            {"baseDate":"20250101","category":"T1H","nx":60,"ny":127,"obsrValue":"-2.0"}
        ]}}}}"#;
        let envelope: NcstEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.response.body.items.item.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_without_key() {
        let tool = WeatherTool::new(None);
        let out = tool
            .execute(json!({"location": "부산"}), &ToolContext::new())
            .await
            .unwrap();
        assert_eq!(out["status"], "mock");
        assert_eq!(out["location"], "부산");
        assert_eq!(out["temperature"], "15°C");
        assert_eq!(out["sky_status"], "맑음");
        assert!(out.get("error").is_none());
    }

    #[tokio::test]
    async fn test_default_location() {
        let out = WeatherTool::new(None)
            .execute(json!({}), &ToolContext::new())
            .await
            .unwrap();
        assert_eq!(out["location"], "서울");
    }

    #[tokio::test]
    async fn test_unreachable_api_falls_back_with_error() {
        let tool = WeatherTool::new(Some("key".into())).with_endpoint("http://127.0.0.1:9/ncst");
        let out = tool
            .execute(json!({"location": "서울"}), &ToolContext::new())
            .await
            .unwrap();
        assert_eq!(out["status"], "exception_fallback");
        assert_eq!(out["humidity"], "60%");
        assert!(out["error"].is_string());
    }

    #[tokio::test]
    async fn test_error_status_falls_back_without_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let tool = WeatherTool::new(Some("key".into()))
            .with_endpoint(&format!("http://{}/ncst", addr));
        let out = tool
            .execute(json!({"location": "부산"}), &ToolContext::new())
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(out["status"], "error_fallback");
        assert_eq!(out["location"], "부산");
        assert_eq!(out["temperature"], "15°C");
        assert!(out.get("error").is_none());
    }
}
