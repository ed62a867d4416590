//! Run configuration and API credentials.

use log::{error, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Contents of `config.json`: which playlist to mirror and where.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunConfig {
    /// Spotify playlist id.
    pub playlist: String,
    /// Directory under which playlist folders are created.
    pub path: PathBuf,
}

impl RunConfig {
    /// Reads the config at `path`, asking for its values through `ask` and
    /// saving the answers if the file does not exist yet.
    pub fn load_or_create<F>(path: &Path, mut ask: F) -> Result<Self>
    where
        F: FnMut(&str) -> io::Result<String>,
    {
        if !path.exists() {
            let url = ask("Please enter a spotify playlist URL")?;
            let output = ask("Please enter a path to store downloaded playlists")?;
            let config = Self {
                playlist: extract_playlist_id(&url),
                path: PathBuf::from(output.trim()),
            };
            fs::write(path, serde_json::to_string(&config)?)?;
            info!("Configuration saved to: {}", path.display());
        }

        let config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        if config.playlist.is_empty() {
            return Err(Error::Config(format!(
                "{} has an empty playlist id",
                path.display()
            )));
        }
        Ok(config)
    }
}

/// Reduces a pasted playlist URL or URI to its id.
///
/// `https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc`,
/// `spotify:playlist:37i9dQZF1DXcBWIGoYBM5M` and the bare id all yield
/// `37i9dQZF1DXcBWIGoYBM5M`.
pub fn extract_playlist_id(input: &str) -> String {
    let input = input.trim();
    let without_query = input.split('?').next().unwrap_or(input);
    let without_slash = without_query.trim_end_matches('/');
    without_slash
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(without_slash)
        .to_string()
}

/// Spotify client credentials, persisted as TOML in the user's config dir.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Validates a Spotify client id or secret.
pub fn verify_key(key: &str) -> bool {
    Regex::new(r"^[[:xdigit:]]{32}$").is_ok_and(|re| re.is_match(key))
}

impl Credentials {
    fn trimmed(self) -> Self {
        Self {
            client_id: self.client_id.trim().to_string(),
            client_secret: self.client_secret.trim().to_string(),
        }
    }
}

/// Parses a saved credentials file, returning `None` when either key is invalid.
fn parse_stored(content: &str) -> std::result::Result<Option<Credentials>, toml::de::Error> {
    let keys = toml::from_str::<Credentials>(content)?.trimmed();
    if verify_key(&keys.client_id) && verify_key(&keys.client_secret) {
        Ok(Some(keys))
    } else {
        Ok(None)
    }
}

/// Reads the saved credentials, prompting for and saving new ones when the
/// file is missing, malformed or holds invalid keys.
pub fn stored_credentials() -> Result<Credentials> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("Could not find a valid config directory.".to_string()))?;
    let app_config_dir = config_dir.join("playlistdl");
    fs::create_dir_all(&app_config_dir)?;
    let config_path = app_config_dir.join("config.toml");

    if config_path.is_file() {
        match parse_stored(&fs::read_to_string(&config_path)?) {
            Ok(Some(keys)) => return Ok(keys),
            Ok(None) => error!("Keys in {} are not valid.", config_path.display()),
            Err(e) => error!("Malformed config file: {}", e),
        }
        fs::remove_file(&config_path)?;
        info!("The invalid config file has been deleted. Please re-enter your keys.");
    } else {
        println!(
            "No config file found, please enter the Spotify API keys:\n If you don't have them, here is a guide: https://developer.spotify.com/documentation/web-api"
        );
    }

    let keys = Credentials {
        client_id: prompt_key("Client ID")?,
        client_secret: prompt_key("Client Secret")?,
    };
    let value = toml::to_string(&keys).map_err(|e| Error::Config(e.to_string()))?;
    fs::write(&config_path, value)?;
    println!("Configuration saved to: {}", config_path.display());

    Ok(keys)
}

fn prompt_key(label: &str) -> io::Result<String> {
    loop {
        let key = prompt(&format!("Enter {label}"))?;
        if verify_key(&key) {
            return Ok(key);
        }
        println!("Invalid {label}. It must be a 32-character hexadecimal string.");
    }
}

/// Prints `label` and reads one trimmed line from stdin.
pub fn prompt(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
