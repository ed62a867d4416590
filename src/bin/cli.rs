use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{LevelFilter, error, info};
use playlistdl::config::{self, Credentials, RunConfig};
use playlistdl::metadata::HttpCoverSource;
use playlistdl::spotify::SpotifyProvider;
use playlistdl::transcode::Ffmpeg;
use playlistdl::youtube::YoutubeMusic;
use playlistdl::{DownloadOptions, Services, download_playlist};
use std::path::PathBuf;

#[derive(Parser, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Run configuration (playlist id and output path); created on first run.
    #[arg(long = "config", default_value = "config.json")]
    pub config: PathBuf,

    /// JSON list of already downloaded track URIs.
    #[arg(long = "progress-file", default_value = "tracks.json")]
    pub progress_file: PathBuf,

    #[arg(long = "client-id")]
    pub client_id: Option<String>,

    #[arg(long = "client-secret")]
    pub client_secret: Option<String>,

    #[arg(long = "ffmpeg", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    #[arg(
        long = "verbosity",
        short,
        default_value = "info",
        value_parser = clap::builder::PossibleValuesParser::new([
            "info", "debug", "error", "none", "full"
        ])
    )]
    pub verbosity: String,
}

fn level_filter(verbosity: &str) -> LevelFilter {
    match verbosity {
        "none" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "debug" => LevelFilter::Debug,
        "full" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// `--verbosity` sets the default level; `RUST_LOG` directives override it.
fn build_logger(level: LevelFilter, rust_log: Option<&str>) -> env_logger::Logger {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Some(filters) = rust_log {
        builder.parse_filters(filters);
    }
    builder.build()
}

fn credentials(args: &Cli) -> Result<Credentials, playlistdl::Error> {
    let from_env = || {
        Some((
            std::env::var("CLIENT_ID").ok()?,
            std::env::var("CLIENT_SECRET").ok()?,
        ))
    };
    match (args.client_id.clone(), args.client_secret.clone()) {
        (Some(client_id), Some(client_secret)) => Ok(Credentials {
            client_id,
            client_secret,
        }),
        _ => match from_env() {
            Some((client_id, client_secret)) => Ok(Credentials {
                client_id,
                client_secret,
            }),
            None => config::stored_credentials(),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Cli::parse();

    let logger = build_logger(
        level_filter(&args.verbosity),
        std::env::var("RUST_LOG").ok().as_deref(),
    );
    let multi = MultiProgress::new();
    // try_init sets the max level from the logger's combined filter.
    LogWrapper::new(multi.clone(), logger).try_init()?;

    let keys = credentials(&args)?;
    let run_config = RunConfig::load_or_create(&args.config, config::prompt)?;

    let spotify = match SpotifyProvider::authenticate(&keys.client_id, &keys.client_secret).await
    {
        Ok(spotify) => spotify,
        Err(e) => {
            error!("Something went wrong! {e}");
            return Err(e.into());
        }
    };
    let youtube = YoutubeMusic::new();
    let ffmpeg = Ffmpeg::new(args.ffmpeg.clone());
    let covers = HttpCoverSource::new();
    let services = Services {
        metadata: &spotify,
        search: &youtube,
        media: &youtube,
        transcoder: &ffmpeg,
        covers: &covers,
    };

    let options = DownloadOptions {
        playlist_id: run_config.playlist,
        output_dir: run_config.path,
        progress_file: args.progress_file.clone(),
    };

    let progress_bar = multi.add(ProgressBar::new(0));
    progress_bar.set_style(
        ProgressStyle::with_template(
            "Downloading tracks [{bar:40}] {percent}% | ETA: {eta} | {pos}/{len}",
        )?
        .progress_chars("=> "),
    );

    match download_playlist(&options, &services, &progress_bar).await {
        Ok(summary) => {
            info!(
                "Finished {}: {} downloaded, {} already present",
                summary.playlist, summary.downloaded, summary.already_done
            );
            Ok(())
        }
        Err(e) => {
            progress_bar.abandon();
            error!("Something went wrong! {e}");
            Err(e.into())
        }
    }
}
