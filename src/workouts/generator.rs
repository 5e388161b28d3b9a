//! Text-to-workout generation.
//!
//! A remote generator service is asked for a workout in the JSON shape of
//! [`Workout`]; any failure on that path falls back to [`LocalGenerator`],
//! which builds a workout from keywords in the request text.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::workouts::intervals::{expand, IntervalSpec};
use crate::workouts::types::{CollaboratorError, Segment, SegmentKind, Workout};

/// Default workout length when the request names none, in minutes.
pub const DEFAULT_MINUTES: u32 = 60;
/// Shortest generated workout, in minutes.
pub const MIN_MINUTES: u32 = 20;
/// Longest generated workout, in minutes.
pub const MAX_MINUTES: u32 = 180;

const WARMUP_SECONDS: u32 = 600;
const MIN_COOLDOWN_SECONDS: u32 = 300;

const JSON_INSTRUCTIONS: &str = "Return ONLY a valid JSON object with the fields \
name, description, author, sportType, totalDuration, segments and tss. Each segment \
has type, startTime, duration and either power or powerLow/powerHigh as fractions of FTP.";

/// Decode a workout from generator output.
///
/// The text may wrap the JSON in prose; everything from the first `{` to the
/// last `}` is decoded. Values are taken as given, nothing is re-derived.
pub fn parse_generated_json(text: &str) -> Result<Workout, CollaboratorError> {
    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(CollaboratorError::MalformedJson(
                "no JSON object in response".to_string(),
            ))
        }
    };

    let workout: Workout = serde_json::from_str(&text[start..=end])?;
    if workout.segments.is_empty() {
        return Err(CollaboratorError::EmptyWorkout);
    }

    Ok(workout)
}

/// Workout style picked from request keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Recovery,
    Endurance,
    SweetSpot,
    Threshold,
    Vo2Max,
    Ramp,
}

impl Template {
    /// Pick a template from free text; endurance when nothing matches.
    pub fn from_intent(intent: &str) -> Self {
        let text = intent.to_lowercase();
        if text.contains("recovery") {
            Template::Recovery
        } else if text.contains("sweet spot") || text.contains("sweetspot") {
            Template::SweetSpot
        } else if text.contains("threshold") || text.contains("ftp") {
            Template::Threshold
        } else if text.contains("vo2") || text.contains("interval") {
            Template::Vo2Max
        } else if text.contains("ramp") {
            Template::Ramp
        } else {
            Template::Endurance
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Template::Recovery => "Recovery Ride",
            Template::Endurance => "Endurance Ride",
            Template::SweetSpot => "Sweet Spot Intervals",
            Template::Threshold => "Threshold Intervals",
            Template::Vo2Max => "VO2max Intervals",
            Template::Ramp => "Ramp Builder",
        }
    }
}

/// Read the requested length from text such as "45 min" or "1.5 hours".
pub fn requested_minutes(intent: &str) -> u32 {
    let text = intent.to_lowercase();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
            i += 1;
        }
        let number: String = chars[start..i].iter().collect();
        let unit: String = chars[i..]
            .iter()
            .skip_while(|c| c.is_whitespace() || **c == '-')
            .take_while(|c| c.is_alphabetic())
            .collect();

        let Ok(value) = number.parse::<f64>() else {
            continue;
        };
        let minutes = if unit.starts_with("min") {
            value
        } else if unit == "h" || unit.starts_with("hour") || unit.starts_with("hr") {
            value * 60.0
        } else {
            continue;
        };
        return (minutes.round() as u32).clamp(MIN_MINUTES, MAX_MINUTES);
    }

    DEFAULT_MINUTES
}

/// Builds workouts from request text without any network access.
#[derive(Debug, Clone, Default)]
pub struct LocalGenerator;

impl LocalGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build a warmup, a main set and a cooldown filling the requested time.
    pub fn generate(&self, intent: &str) -> Workout {
        let template = Template::from_intent(intent);
        let minutes = requested_minutes(intent);
        let total = minutes * 60;
        let main_budget = total.saturating_sub(WARMUP_SECONDS + MIN_COOLDOWN_SECONDS);

        let mut segments = vec![Segment::ramp(
            SegmentKind::Warmup,
            0,
            WARMUP_SECONDS,
            0.5,
            0.75,
        )];
        segments.extend(main_set(template, WARMUP_SECONDS, main_budget));

        let cursor = segments.last().map(Segment::end_time).unwrap_or(0);
        let cooldown = total.saturating_sub(cursor).max(MIN_COOLDOWN_SECONDS);
        segments.push(Segment::ramp(
            SegmentKind::Cooldown,
            cursor,
            cooldown,
            0.65,
            0.45,
        ));

        let mut workout = Workout::new(format!("{} {} min", template.label(), minutes), segments);
        workout.description = intent.trim().to_string();
        workout.author = "ZwoForge".to_string();

        tracing::debug!(
            "Generated {:?} locally: {} segments, TSS {}",
            workout.name,
            workout.segments.len(),
            workout.tss
        );
        workout
    }
}

/// Repeats of `on` + `off` that fit `budget`, never fewer than one.
fn repeats(budget: u32, on: u32, off: u32) -> u32 {
    ((budget + off) / (on + off)).max(1)
}

fn main_set(template: Template, start: u32, budget: u32) -> Vec<Segment> {
    let intervals = |on_duration: u32, on: f64, off_duration: u32, off: f64| {
        let spec = IntervalSpec {
            repeat: repeats(budget, on_duration, off_duration),
            on_duration,
            off_duration,
            on_high: on,
            on_low: on,
            off_high: off,
            off_low: off,
        };
        expand(&spec, start)
    };

    match template {
        Template::Recovery => vec![Segment::flat(
            SegmentKind::SteadyState,
            start,
            budget.max(60),
            0.55,
        )],
        Template::Endurance => vec![Segment::flat(
            SegmentKind::SteadyState,
            start,
            budget.max(60),
            0.68,
        )],
        Template::SweetSpot => intervals(600, 0.9, 300, 0.55),
        Template::Threshold => intervals(480, 1.0, 240, 0.55),
        Template::Vo2Max => intervals(180, 1.15, 180, 0.5),
        Template::Ramp => vec![Segment::ramp(
            SegmentKind::Ramp,
            start,
            budget.max(60),
            0.6,
            1.2,
        )],
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Client for a remote text-to-workout service.
pub struct RemoteGenerator {
    /// HTTP client
    http: reqwest::Client,
    /// Chat endpoint URL
    endpoint: String,
}

impl RemoteGenerator {
    /// Create a client for `endpoint` with a request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the service for a workout matching `intent`.
    pub async fn generate(&self, intent: &str) -> Result<Workout, CollaboratorError> {
        let prompt = format!("Create a workout: {}\n\n{}", intent.trim(), JSON_INSTRUCTIONS);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest { message: &prompt })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout
                } else {
                    CollaboratorError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status(status.as_u16()));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CollaboratorError::Timeout
            } else {
                CollaboratorError::MalformedJson(e.to_string())
            }
        })?;

        parse_generated_json(&body.response)
    }
}

/// Where a generated workout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Remote,
    Local,
}

/// A workout and the generator that produced it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub workout: Workout,
    pub source: GenerationSource,
}

/// Try the remote generator if one is given, else or on failure generate locally.
pub async fn generate_with_fallback(intent: &str, remote: Option<&RemoteGenerator>) -> Generated {
    if let Some(remote) = remote {
        match remote.generate(intent).await {
            Ok(workout) => {
                tracing::info!("Generated {:?} via {}", workout.name, remote.endpoint());
                return Generated {
                    workout,
                    source: GenerationSource::Remote,
                };
            }
            Err(e) => {
                tracing::warn!("Remote generation failed ({}), using local generator", e);
            }
        }
    }

    Generated {
        workout: LocalGenerator::new().generate(intent),
        source: GenerationSource::Local,
    }
}
