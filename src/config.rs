use gotham_derive::StateData;

use std::{ops::RangeInclusive, path::Path};

/// Accepted session lifetimes, in days.
pub const MAX_AGE_DAYS: RangeInclusive<i64> = 1..=3650;

/// Application wide settings defined in configuration file.
#[derive(Deserialize, StateData, Clone, Debug)]
pub struct Settings {
    /// SQLite database path, or `:memory:`
    pub database_url: String,
    /// IP address to bind to
    pub host_address: String,
    /// bcrypt cost used when hashing new passwords
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    /// Cookie settings
    #[serde(default)]
    pub cookies: Cookies,
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Settings {
    pub fn from_slice(data: &[u8]) -> Result<Self, failure::Error> {
        let settings: Settings = toml::from_slice(data)?;
        if !MAX_AGE_DAYS.contains(&settings.cookies.max_age_days) {
            return Err(failure::format_err!(
                "cookies.max_age_days must be between {} and {}, got {}",
                MAX_AGE_DAYS.start(),
                MAX_AGE_DAYS.end(),
                settings.cookies.max_age_days
            ));
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, failure::Error> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data)
    }
}

/// Cookie related settings
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Cookies {
    /// Require HTTPS for cookies
    pub secure: bool,
    /// Restrict cookies to given domain if set
    pub domain: Option<String>,
    /// How long a session stays valid
    pub max_age_days: i64,
}

impl Default for Cookies {
    fn default() -> Self {
        Cookies {
            secure: false,
            domain: None,
            max_age_days: 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn minimal_file_uses_defaults() {
        let data = br#"
            database_url = ":memory:"
            host_address = "127.0.0.1:8000"
        "#;
        let settings = Settings::from_slice(data).unwrap();
        assert_eq!(settings.database_url, ":memory:");
        assert_eq!(settings.hash_cost, bcrypt::DEFAULT_COST);
        assert!(!settings.cookies.secure);
        assert_eq!(settings.cookies.domain, None);
        assert_eq!(settings.cookies.max_age_days, 14);
    }

    #[test]
    fn cookie_table() {
        let data = br#"
            database_url = "blog.sqlite3"
            host_address = "0.0.0.0:80"
            hash_cost = 6

            [cookies]
            secure = true
            domain = "blog.example.org"
        "#;
        let settings = Settings::from_slice(data).unwrap();
        assert_eq!(settings.hash_cost, 6);
        assert!(settings.cookies.secure);
        assert_eq!(settings.cookies.domain.as_deref(), Some("blog.example.org"));
        assert_eq!(settings.cookies.max_age_days, 14);
    }

    #[test]
    fn session_lifetime_is_bounded() {
        for days in &["0", "-3", "3651", "9223372036854775807"] {
            let data = format!(
                "database_url = \"x\"\nhost_address = \"y\"\n[cookies]\nmax_age_days = {}\n",
                days
            );
            assert!(Settings::from_slice(data.as_bytes()).is_err(), "{}", days);
        }
        let data = "database_url = \"x\"\nhost_address = \"y\"\n[cookies]\nmax_age_days = 3650\n";
        assert_eq!(
            Settings::from_slice(data.as_bytes())
                .unwrap()
                .cookies
                .max_age_days,
            3650
        );
    }

    #[test]
    fn missing_address_is_an_error() {
        assert!(Settings::from_slice(b"database_url = \"x\"").is_err());
    }
}
