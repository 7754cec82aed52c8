use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Feedback, JournalEntry, MoodEntry};

// Request bodies arrive either as HTML form posts or JSON, so every field is
// optional here and presence is checked by the handlers.

// -- Auth --

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default, alias = "email", alias = "username")]
    pub identity: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, alias = "displayName", alias = "display_name")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "email", alias = "username")]
    pub identity: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// -- Entries --

#[derive(Debug, Default, Deserialize)]
pub struct MoodRequest {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(
        default,
        alias = "stressLevel",
        alias = "stress",
        deserialize_with = "lenient_number"
    )]
    pub stress_level: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JournalRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// Body for confessions and feedback.
#[derive(Debug, Default, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAck {
    pub ok: bool,
}

// -- Admin --

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AdminFilter {
    #[serde(default, alias = "email", alias = "user")]
    pub identity: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
}

impl AdminFilter {
    /// Drops blank values so `?email=&mood=` behaves like no filter at all.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            identity: clean(self.identity),
            mood: clean(self.mood),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminData {
    pub moods: Vec<MoodEntry>,
    pub journals: Vec<JournalEntry>,
    pub feedbacks: Vec<Feedback>,
}

/// Accepts a JSON number, a numeric string (form posts), or an empty string
/// which is treated as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Num(f64),
        Text(String),
    }

    let value = match Option::<NumOrText>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumOrText::Num(n)) => n,
        Some(NumOrText::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid number '{}'", s)))?
        }
    };

    if !value.is_finite() {
        return Err(serde::de::Error::custom("number must be finite"));
    }
    Ok(Some(value))
}
