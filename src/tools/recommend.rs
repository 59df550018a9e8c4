//! Mood and weather based recipe recommendation.
//!
//! A fixed lookup keyed by (weather category, mood). The weather argument is
//! the record returned by `get_current_weather`, so the model can pass it
//! through unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;

use super::{Tool, ToolContext};

const DEFAULT_TEMPERATURE: f64 = 20.0;

/// Mood buckets and the words that select them, in match order.
const MOOD_KEYWORDS: &[(&str, &[&str])] = &[
    ("행복", &["행복", "기쁨", "즐거움"]),
    ("우울", &["우울", "슬픔"]),
    ("피곤", &["피곤", "지침"]),
    ("스트레스", &["스트레스", "긴장"]),
];

/// A recommended dish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dish {
    pub name: &'static str,
    pub ingredients: &'static [&'static str],
    pub description: &'static str,
    pub time: &'static str,
}

const fn dish(
    name: &'static str,
    ingredients: &'static [&'static str],
    description: &'static str,
    time: &'static str,
) -> Dish {
    Dish {
        name,
        ingredients,
        description,
        time,
    }
}

const TABLE: &[((&str, &str), Dish)] = &[
    (
        ("추움", "행복"),
        dish(
            "따뜻한 핫초코",
            &["우유", "초콜릿", "마시멜로"],
            "추운 날 기분 좋을 때 즐기는 달콤한 음료",
            "10분",
        ),
    ),
    (
        ("추움", "우울"),
        dish(
            "따뜻한 미역국",
            &["미역", "소고기", "참기름", "마늘"],
            "마음을 따뜻하게 해주는 국물 요리",
            "40분",
        ),
    ),
    (
        ("추움", "피곤"),
        dish(
            "보양 삼계탕",
            &["닭", "인삼", "대추", "마늘", "찹쌀"],
            "피로 회복에 좋은 보양식",
            "90분",
        ),
    ),
    (
        ("따뜻", "행복"),
        dish(
            "신선한 포케볼",
            &["연어", "아보카도", "밥", "망고"],
            "상큼한 하와이안 요리",
            "25분",
        ),
    ),
    (
        ("따뜻", "피곤"),
        dish(
            "영양 비빔밥",
            &["밥", "시금치", "콩나물", "고사리", "계란"],
            "영양 가득한 한 그릇",
            "35분",
        ),
    ),
    (
        ("더움", "행복"),
        dish(
            "과일 샐러드",
            &["수박", "파인애플", "블루베리", "민트"],
            "시원하고 상큼한 디저트",
            "15분",
        ),
    ),
    (
        ("더움", "피곤"),
        dish(
            "시원한 콩국수",
            &["소면", "콩국물", "오이", "토마토"],
            "더위를 이기는 여름 별미",
            "20분",
        ),
    ),
    (
        ("비", "우울"),
        dish(
            "따뜻한 토마토 수프",
            &["토마토", "양파", "마늘", "바질", "크림"],
            "비 오는 날 우울함을 달래는 수프",
            "35분",
        ),
    ),
    (
        ("비", "default"),
        dish(
            "바삭한 파전",
            &["부침가루", "파", "해물", "계란"],
            "비 오는 날의 정석",
            "25분",
        ),
    ),
];

const FALLBACK: Dish = dish(
    "건강한 야채 볶음",
    &["브로콜리", "당근", "파프리카"],
    "언제나 좋은 건강 요리",
    "20분",
);

/// Weather bucket: 비 (rain), 추움 (< 15°C), 따뜻 (< 25°C), otherwise 더움.
pub fn weather_category(weather: &Map<String, Value>) -> &'static str {
    let field = |key: &str| weather.get(key).and_then(Value::as_str).unwrap_or("");
    if field("precipitation").contains('비') || field("sky_status").contains('비') {
        return "비";
    }

    let temp = weather
        .get("temperature")
        .and_then(|v| match v {
            Value::String(s) => s.trim().trim_end_matches("°C").trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .unwrap_or(DEFAULT_TEMPERATURE);

    if temp < 15.0 {
        "추움"
    } else if temp < 25.0 {
        "따뜻"
    } else {
        "더움"
    }
}

/// Mood bucket for free-form mood text, or "default".
pub fn mood_category(mood: &str) -> &'static str {
    let mood = mood.to_lowercase();
    MOOD_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| mood.contains(w)))
        .map(|(key, _)| *key)
        .unwrap_or("default")
}

/// Dish for a (weather, mood) pair, falling back to the weather default.
pub fn lookup(weather: &str, mood: &str) -> &'static Dish {
    let find = |m: &str| {
        TABLE
            .iter()
            .find(|((w, k), _)| *w == weather && *k == m)
            .map(|(_, d)| d)
    };
    find(mood).or_else(|| find("default")).unwrap_or(&FALLBACK)
}

#[derive(Debug, Deserialize)]
struct RecommendArgs {
    mood: String,
    #[serde(default)]
    weather: Map<String, Value>,
}

pub struct RecommendRecipeTool;

#[async_trait]
impl Tool for RecommendRecipeTool {
    fn name(&self) -> &str {
        "recommend_recipe"
    }

    fn description(&self) -> &str {
        "사용자의 기분과 현재 날씨 정보를 바탕으로 어울리는 요리를 추천합니다."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "mood": {"type": "string", "description": "사용자의 기분"},
                "weather": {
                    "type": "object",
                    "description": "get_current_weather 결과 (temperature, precipitation, sky_status)"
                }
            },
            "required": ["mood", "weather"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let args: RecommendArgs = serde_json::from_value(args)?;
        let weather = weather_category(&args.weather);
        let mood = mood_category(&args.mood);
        let dish = lookup(weather, mood);

        Ok(json!({
            "status": "success",
            "recipe": dish,
            "reasoning": format!("{} + {} → {}", weather, mood, dish.name),
        }))
    }
}
