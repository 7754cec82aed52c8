use std::collections::HashSet;
use std::path::PathBuf;

use brightpath_types::models::Role;
use thiserror::Error;

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "brightpath_secret",
    "change-me",
    "dev-secret-change-me",
    "replace-with-a-long-random-string",
];

const MIN_SECRET_LEN: usize = 16;

/// One year. Expiry stamps have to stay inside the four-digit-year range.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BRIGHTPATH_SESSION_SECRET is unset or still a placeholder")]
    MissingSecret,

    #[error("session secret must be at least 16 bytes")]
    WeakSecret,

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Whether `/feedback` needs a logged-in caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackMode {
    Identified,
    Open,
}

/// What a successful form submission answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResponse {
    Redirect,
    Status,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub session_cleanup_secs: u64,
    pub cookie_secure: bool,
    pub public_dir: PathBuf,
    pub default_role: Role,
    /// Accounts seeded or promoted to admin at startup.
    pub admin_identities: HashSet<String>,
    pub admin_password: Option<String>,
    pub feedback_mode: FeedbackMode,
    pub submit_response: SubmitResponse,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let session_secret = get("BRIGHTPATH_SESSION_SECRET")
            .or_else(|| get("SESSION_SECRET"))
            .ok_or(ConfigError::MissingSecret)?;
        if PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let port = match get("BRIGHTPATH_PORT").or_else(|| get("PORT")) {
            Some(v) => parse_num("BRIGHTPATH_PORT", &v)?,
            None => 10000,
        };

        let session_ttl_hours: i64 = match get("BRIGHTPATH_SESSION_TTL_HOURS") {
            Some(v) => parse_num("BRIGHTPATH_SESSION_TTL_HOURS", &v)?,
            None => 24,
        };
        if session_ttl_hours <= 0 || session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(invalid(
                "BRIGHTPATH_SESSION_TTL_HOURS",
                &session_ttl_hours.to_string(),
                "must be between 1 and 8760",
            ));
        }

        let session_cleanup_secs: u64 = match get("BRIGHTPATH_SESSION_CLEANUP_SECS") {
            Some(v) => parse_num("BRIGHTPATH_SESSION_CLEANUP_SECS", &v)?,
            None => 3600,
        };
        if session_cleanup_secs == 0 {
            return Err(invalid("BRIGHTPATH_SESSION_CLEANUP_SECS", "0", "must be positive"));
        }

        let cookie_secure = match get("BRIGHTPATH_COOKIE_SECURE") {
            Some(v) => parse_bool("BRIGHTPATH_COOKIE_SECURE", &v)?,
            None => true,
        };

        let default_role = match get("BRIGHTPATH_DEFAULT_ROLE") {
            Some(v) => {
                let role: Role = v
                    .parse()
                    .map_err(|e: brightpath_types::models::ParseRoleError| {
                        invalid("BRIGHTPATH_DEFAULT_ROLE", &v, &e.to_string())
                    })?;
                if role.is_admin() {
                    return Err(invalid(
                        "BRIGHTPATH_DEFAULT_ROLE",
                        &v,
                        "the default role cannot be admin",
                    ));
                }
                role
            }
            None => Role::User,
        };

        let admin_identities: HashSet<String> = get("BRIGHTPATH_ADMIN_IDENTITIES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // Passwords are taken verbatim, same as at signup.
        let admin_password = lookup("BRIGHTPATH_ADMIN_PASSWORD").filter(|v| !v.is_empty());
        if !admin_identities.is_empty() && admin_password.is_none() {
            return Err(invalid(
                "BRIGHTPATH_ADMIN_PASSWORD",
                "",
                "required when BRIGHTPATH_ADMIN_IDENTITIES is set",
            ));
        }

        let feedback_mode = match get("BRIGHTPATH_FEEDBACK_MODE").as_deref().map(str::trim) {
            None | Some("identified") => FeedbackMode::Identified,
            Some("open") => FeedbackMode::Open,
            Some(other) => {
                return Err(invalid(
                    "BRIGHTPATH_FEEDBACK_MODE",
                    other,
                    "expected 'identified' or 'open'",
                ));
            }
        };

        let submit_response = match get("BRIGHTPATH_SUBMIT_RESPONSE").as_deref().map(str::trim) {
            None | Some("redirect") => SubmitResponse::Redirect,
            Some("status") => SubmitResponse::Status,
            Some(other) => {
                return Err(invalid(
                    "BRIGHTPATH_SUBMIT_RESPONSE",
                    other,
                    "expected 'redirect' or 'status'",
                ));
            }
        };

        Ok(Self {
            host: get("BRIGHTPATH_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("BRIGHTPATH_DB_PATH")
                .unwrap_or_else(|| "brightpath.db".into())
                .into(),
            session_secret,
            session_ttl_hours,
            session_cleanup_secs,
            cookie_secure,
            public_dir: get("BRIGHTPATH_PUBLIC_DIR")
                .unwrap_or_else(|| "./public".into())
                .into(),
            default_role,
            admin_identities,
            admin_password,
            feedback_mode,
            submit_response,
        })
    }

}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("session_secret", &"<redacted>")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("session_cleanup_secs", &self.session_cleanup_secs)
            .field("cookie_secure", &self.cookie_secure)
            .field("public_dir", &self.public_dir)
            .field("default_role", &self.default_role)
            .field("admin_identities", &self.admin_identities)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("feedback_mode", &self.feedback_mode)
            .field("submit_response", &self.submit_response)
            .finish()
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_num<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, &e.to_string()))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123";

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = config_from(&[("BRIGHTPATH_SESSION_SECRET", SECRET)]).unwrap();
        assert_eq!(cfg.port, 10000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.session_ttl_hours, 24);
        assert!(cfg.cookie_secure);
        assert_eq!(cfg.default_role, Role::User);
        assert_eq!(cfg.feedback_mode, FeedbackMode::Identified);
        assert_eq!(cfg.submit_response, SubmitResponse::Redirect);
        assert!(cfg.admin_identities.is_empty());
    }

    #[test]
    fn missing_or_placeholder_secret_is_fatal() {
        assert!(matches!(config_from(&[]), Err(ConfigError::MissingSecret)));
        assert!(matches!(
            config_from(&[("SESSION_SECRET", "brightpath_secret")]),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            config_from(&[("SESSION_SECRET", "short")]),
            Err(ConfigError::WeakSecret)
        ));
    }

    #[test]
    fn legacy_port_and_secret_names_are_honoured() {
        let cfg = config_from(&[("SESSION_SECRET", SECRET), ("PORT", "8080")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.session_secret, SECRET);
    }

    #[test]
    fn admin_default_role_is_rejected() {
        let res = config_from(&[
            ("BRIGHTPATH_SESSION_SECRET", SECRET),
            ("BRIGHTPATH_DEFAULT_ROLE", "admin"),
        ]);
        assert!(matches!(res, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn modes_and_admin_list_parse() {
        let cfg = config_from(&[
            ("BRIGHTPATH_SESSION_SECRET", SECRET),
            ("BRIGHTPATH_FEEDBACK_MODE", "open"),
            ("BRIGHTPATH_SUBMIT_RESPONSE", "status"),
            ("BRIGHTPATH_DEFAULT_ROLE", "student"),
            ("BRIGHTPATH_COOKIE_SECURE", "false"),
            ("BRIGHTPATH_ADMIN_IDENTITIES", "boss@x.com, , ops@x.com"),
            ("BRIGHTPATH_ADMIN_PASSWORD", "boss-pass"),
        ])
        .unwrap();
        assert_eq!(cfg.feedback_mode, FeedbackMode::Open);
        assert_eq!(cfg.submit_response, SubmitResponse::Status);
        assert!(!cfg.cookie_secure);
        assert_eq!(cfg.default_role, Role::Student);
        assert_eq!(cfg.admin_identities.len(), 2);
        assert!(cfg.admin_identities.contains("boss@x.com"));
        assert!(cfg.admin_identities.contains("ops@x.com"));
        assert_eq!(cfg.admin_password.as_deref(), Some("boss-pass"));
    }

    #[test]
    fn admin_list_without_password_is_rejected() {
        let res = config_from(&[
            ("BRIGHTPATH_SESSION_SECRET", SECRET),
            ("BRIGHTPATH_ADMIN_IDENTITIES", "boss@x.com"),
        ]);
        assert!(matches!(
            res,
            Err(ConfigError::Invalid { key: "BRIGHTPATH_ADMIN_PASSWORD", .. })
        ));
    }

    #[test]
    fn session_ttl_is_capped_at_one_year() {
        let cfg = config_from(&[
            ("BRIGHTPATH_SESSION_SECRET", SECRET),
            ("BRIGHTPATH_SESSION_TTL_HOURS", "8760"),
        ])
        .unwrap();
        assert_eq!(cfg.session_ttl_hours, MAX_SESSION_TTL_HOURS);

        for ttl in ["8761", "100000000", "0", "-5"] {
            let res = config_from(&[
                ("BRIGHTPATH_SESSION_SECRET", SECRET),
                ("BRIGHTPATH_SESSION_TTL_HOURS", ttl),
            ]);
            assert!(
                matches!(res, Err(ConfigError::Invalid { key: "BRIGHTPATH_SESSION_TTL_HOURS", .. })),
                "ttl: {}",
                ttl
            );
        }
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = config_from(&[
            ("BRIGHTPATH_SESSION_SECRET", SECRET),
            ("BRIGHTPATH_ADMIN_IDENTITIES", "boss@x.com"),
            ("BRIGHTPATH_ADMIN_PASSWORD", "boss-pass"),
        ])
        .unwrap();
        let out = format!("{:?}", cfg);
        assert!(!out.contains(SECRET));
        assert!(!out.contains("boss-pass"));
        assert!(out.contains("<redacted>"));
        assert!(out.contains("boss@x.com"));
    }

    #[test]
    fn bad_values_are_reported() {
        let res = config_from(&[
            ("BRIGHTPATH_SESSION_SECRET", SECRET),
            ("BRIGHTPATH_PORT", "eighty"),
        ]);
        assert!(matches!(res, Err(ConfigError::Invalid { key: "BRIGHTPATH_PORT", .. })));

        let res = config_from(&[
            ("BRIGHTPATH_SESSION_SECRET", SECRET),
            ("BRIGHTPATH_FEEDBACK_MODE", "sometimes"),
        ]);
        assert!(res.is_err());
    }
}
