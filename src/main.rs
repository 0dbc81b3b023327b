use std::{path::PathBuf, sync::Arc};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use spotfetch::{
    audio::{self, MetadataTagger, YoutubeSearchResolver, YtDlpDownloader},
    cli, config,
    config::FetchSettings,
    error,
    management::{ClientState, SpotifyFetcher},
    server::AppState,
    spotify::SpotifyClient,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show metadata of a single track
    Track(TrackOptions),

    /// List every track of playlists or albums
    Tracks(TracksOptions),

    /// Show an artist, optionally with their albums
    Artist(ArtistOptions),

    /// Show the public profile of a user
    User(UserOptions),

    /// Download a single track as a tagged MP3
    Download(DownloadOptions),

    /// Export the audio of playlists or albums into a ZIP archive
    Export(ExportOptions),

    /// Run the HTTP API
    Serve(ServeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOptions {
    /// Track URL, URI or id
    url: String,
    /// Print JSON instead of a table
    #[clap(long)]
    json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    /// Playlist (or album) URLs, URIs or ids
    #[clap(required = true, num_args = 1..)]
    urls: Vec<String>,
    /// Treat the references as albums
    #[clap(long)]
    album: bool,
    /// Print JSON instead of tables
    #[clap(long)]
    json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ArtistOptions {
    /// Artist URL, URI or id
    url: String,
    /// Include every album of the artist
    #[clap(long)]
    albums: bool,
    #[clap(long)]
    json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UserOptions {
    /// User id or profile URL
    id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadOptions {
    /// Track URL, URI or id
    url: String,
    /// Target file (default: "<title> - <artist>.mp3")
    #[clap(long, short)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ExportOptions {
    /// Playlist (or album) URLs, URIs or ids
    #[clap(required = true, num_args = 1..)]
    urls: Vec<String>,
    /// Treat the references as albums
    #[clap(long)]
    album: bool,
    /// Archive to write
    #[clap(long, short)]
    output: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Bind address (default: SERVER_ADDRESS or 0.0.0.0:$PORT)
    #[clap(long)]
    addr: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn session_from_env() -> ClientState {
    match ClientState::from_parts(
        config::spotify_client_id(),
        config::spotify_client_secret(),
        config::spotify_access_token(),
        config::spotify_refresh_token(),
    ) {
        Ok(session) => session,
        Err(e) => error!(
            "{}. Set SPOTIFY_ACCESS_TOKEN or SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET",
            e
        ),
    }
}

async fn app_state(with_proxy: bool) -> AppState {
    let http = reqwest::Client::new();
    let proxy = if with_proxy {
        audio::select_proxy(&http).await
    } else {
        None
    };

    AppState {
        catalog: Arc::new(SpotifyClient::new()),
        resolver: Arc::new(YoutubeSearchResolver::default()),
        downloader: Arc::new(YtDlpDownloader::from_env(proxy)),
        tagger: MetadataTagger::new(http),
        settings: FetchSettings::from_env(),
    }
}

async fn fetcher(with_proxy: bool) -> SpotifyFetcher {
    let session = session_from_env();
    app_state(with_proxy).await.fetcher(session)
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    let default_filter = match cli.command {
        Command::Serve(_) => "spotfetch=info",
        _ => "spotfetch=warn",
    };
    init_tracing(default_filter);

    match cli.command {
        Command::Track(opt) => cli::track(&fetcher(false).await, &opt.url, opt.json).await,
        Command::Tracks(opt) => {
            cli::tracks(&fetcher(false).await, &opt.urls, opt.album, opt.json).await
        }
        Command::Artist(opt) => {
            cli::artist(&fetcher(false).await, &opt.url, opt.albums, opt.json).await
        }
        Command::User(opt) => cli::user(&fetcher(false).await, &opt.id).await,
        Command::Download(opt) => cli::download(&fetcher(true).await, &opt.url, opt.output).await,
        Command::Export(opt) => {
            cli::export(&fetcher(true).await, &opt.urls, opt.album, &opt.output).await
        }
        Command::Serve(opt) => cli::serve(app_state(true).await, opt.addr).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
