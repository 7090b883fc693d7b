use std::{env, error::Error, net::SocketAddr, path::PathBuf, time::Duration};

/// Fixed listen address; the port is not configurable.
pub const LISTEN_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8001);

/// How long `main` waits for open sessions to close after Ctrl-C.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub const STATIC_DIR_VAR: &str = "METER_STREAM_STATIC_DIR";
pub const ALLOWED_ORIGINS_VAR: &str = "METER_STREAM_ALLOWED_ORIGINS";

/// Which `Origin` headers may open a stream. `Any` keeps the historical
/// permissive behaviour; requests without an `Origin` header (non-browser
/// clients) are always let through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OriginPolicy {
    Any,
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// `*` or empty means any origin, otherwise a comma-separated list.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|o| o.trim().trim_end_matches('/'))
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            OriginPolicy::Any
        } else {
            OriginPolicy::AllowList(origins)
        }
    }

    pub fn allows(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (OriginPolicy::Any, _) | (_, None) => true,
            (OriginPolicy::AllowList(list), Some(origin)) => {
                let origin = origin.trim_end_matches('/');
                list.iter().any(|o| o.eq_ignore_ascii_case(origin))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr:       SocketAddr,
    pub static_dir: PathBuf,
    pub origins:    OriginPolicy,
}

impl Config {
    /// Reads the environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let static_dir = match env::var(STATIC_DIR_VAR) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_static_dir()?,
        };
        let origins = env::var(ALLOWED_ORIGINS_VAR)
            .map(|raw| OriginPolicy::parse(&raw))
            .unwrap_or(OriginPolicy::Any);

        Ok(Self { addr: LISTEN_ADDR.into(), static_dir, origins })
    }
}

/// `<dir of the executable>/../frontend`
fn default_static_dir() -> Result<PathBuf, Box<dyn Error>> {
    let exe = env::current_exe()
        .map_err(|e| format!("Failed to locate executable: {}", e))?;
    let dir = exe
        .parent()
        .ok_or("Executable path has no parent directory")?;
    Ok(dir.join("..").join("frontend"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_blank_mean_any() {
        assert_eq!(OriginPolicy::parse("*"), OriginPolicy::Any);
        assert_eq!(OriginPolicy::parse(""), OriginPolicy::Any);
        assert_eq!(OriginPolicy::parse(" , "), OriginPolicy::Any);
        assert_eq!(OriginPolicy::parse("http://a.test, *"), OriginPolicy::Any);
    }

    #[test]
    fn allow_list_matches_exact_origins() {
        let policy = OriginPolicy::parse("http://localhost:3000, https://meters.example.com/");
        assert!(policy.allows(Some("http://localhost:3000")));
        assert!(policy.allows(Some("HTTPS://meters.example.com")));
        assert!(!policy.allows(Some("http://localhost:3001")));
        assert!(!policy.allows(Some("https://evil.example.com")));
    }

    #[test]
    fn missing_origin_is_allowed() {
        let policy = OriginPolicy::parse("http://localhost:3000");
        assert!(policy.allows(None));
    }

    #[test]
    fn any_allows_everything() {
        assert!(OriginPolicy::Any.allows(Some("https://anything.test")));
    }

    #[test]
    fn default_static_dir_sits_next_to_executable() {
        let dir = default_static_dir().unwrap();
        assert!(dir.ends_with("../frontend"));
    }
}
