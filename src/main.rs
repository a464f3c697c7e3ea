use clap::{Parser, Subcommand, ValueEnum};
use pump_stream::api::pump::PumpApi;
use pump_stream::cache::StreamCache;
use pump_stream::config::{Config, PathOpt, USizeOpt};
use pump_stream::log::Log;
use pump_stream::model::{EntityId, Kind, UserStream};
use pump_stream::net::Net;
use pump_stream::realtime::Realtime;
use pump_stream::ArcStr;
use tokio::io::{AsyncBufReadExt, BufReader};

const SCOPE: &str = "main";

#[derive(Parser)]
#[command(name = "pump-stream")]
#[command(about = "A CLI tool for reading pump.io activity streams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a stream by URL
    Stream {
        /// Absolute URL, or a path on the configured server
        #[arg(required = true)]
        url: String,
        /// What the stream holds
        #[arg(short, long, value_enum, default_value = "activities")]
        kind: StreamKind,
        /// Fetch the whole stream instead of one page
        #[arg(short, long)]
        all: bool,
        /// Number of items per page
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Fetch one of a user's streams
    User {
        /// The user's nickname (e.g., "evan")
        #[arg(required = true)]
        nickname: String,
        #[arg(short, long, value_enum, default_value = "inbox")]
        stream: UserStream,
        /// Fetch the whole stream instead of one page
        #[arg(short, long)]
        all: bool,
    },
    /// Open streams and apply push frames read from stdin, one per line
    Listen {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StreamKind {
    Activities,
    Objects,
    People,
    Lists,
}

impl From<StreamKind> for Kind {
    fn from(value: StreamKind) -> Self {
        match value {
            StreamKind::Activities => Kind::ActivityStream,
            StreamKind::Objects => Kind::ActivityObjectStream,
            StreamKind::People => Kind::PeopleStream,
            StreamKind::Lists => Kind::ListStream,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::spawn(Config::default_path());
    config.load().await?;

    let log = Log::spawn(
        config.log_level().await?,
        config.usize(USizeOpt::MaxAge).await?,
        config.path(PathOpt::LogDir).await?,
    )
    .await?;
    log.collect_garbage().await;

    let net = Net::spawn(config.clone(), log.clone()).await?;
    let api = PumpApi::spawn(net, config.clone()).await?;
    let cache = StreamCache::spawn(api, config.clone(), log.clone()).await?;

    log.info(SCOPE, "Starting pump-stream CLI");

    let result = match cli.command {
        Commands::Stream {
            url,
            kind,
            all,
            count,
        } => {
            let url = absolute(&config, &url).await?;
            handle_stream_command(&cache, url, kind.into(), all, count).await
        }
        Commands::User {
            nickname,
            stream,
            all,
        } => {
            let url = ArcStr::from(stream.url(&config.domain().await?, &nickname));
            handle_stream_command(&cache, url, Kind::ActivityStream, all, None).await
        }
        Commands::Listen { urls } => {
            let mut absolute_urls = Vec::with_capacity(urls.len());
            for url in &urls {
                absolute_urls.push(absolute(&config, url).await?);
            }
            handle_listen_command(&cache, &config, &log, absolute_urls).await
        }
    };

    let result = log.error_on_error(SCOPE, result);
    let _ = log.flush().await;
    result
}

async fn absolute(config: &Config, url: &str) -> anyhow::Result<ArcStr> {
    let domain = config.domain().await?;
    Ok(ArcStr::from(pump_stream::absolute_url(&domain, url)))
}

/// Handle the stream and user commands: fetch and print the items as JSON
async fn handle_stream_command(
    cache: &StreamCache,
    url: ArcStr,
    kind: Kind,
    all: bool,
    count: Option<usize>,
) -> anyhow::Result<()> {
    eprintln!("Fetching {url}...");

    let stream = cache.open(kind, url.clone()).await?;
    let added = if all {
        cache.fetch_full(url.clone()).await?
    } else {
        fetch_first_page(cache, stream, url.clone(), count).await?
    };

    let items = cache.items(url.clone()).await?;
    eprintln!("{added} items fetched");
    println!("{}", serde_json::to_string_pretty(&items)?);

    Ok(())
}

/// An unseen stream has no cursor yet; its first page is the stream URL
/// itself.
async fn fetch_first_page(
    cache: &StreamCache,
    stream: EntityId,
    url: ArcStr,
    count: Option<usize>,
) -> anyhow::Result<usize> {
    cache
        .merge(
            stream,
            serde_json::json!({ "links": { "next": { "href": &*url } } }),
        )
        .await?;
    cache.fetch_older(url, count).await
}

/// Handle the listen command: apply frames from stdin and print the commands
/// the client would send back
async fn handle_listen_command(
    cache: &StreamCache,
    config: &Config,
    log: &Log,
    urls: Vec<ArcStr>,
) -> anyhow::Result<()> {
    let (commands_tx, mut commands) = tokio::sync::mpsc::channel(pump_stream::BUFFER_SIZE);
    let (challenges_tx, mut challenges) = tokio::sync::mpsc::channel(pump_stream::BUFFER_SIZE);
    let realtime = Realtime::spawn(
        cache.clone(),
        config.clone(),
        log.clone(),
        commands_tx,
        challenges_tx,
    )
    .await?;

    let printer = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            if let Ok(line) = serde_json::to_string(&command) {
                println!("{line}");
            }
        }
    });
    let challenge_printer = tokio::spawn(async move {
        while let Some(challenge) = challenges.recv().await {
            eprintln!("Challenge for {} ({}) needs signing", challenge.url, challenge.method);
        }
    });

    for url in &urls {
        cache.open(Kind::ActivityStream, url.clone()).await?;
        let fetched = cache.fetch_full(url.clone()).await;
        log.warn_on_error(SCOPE, fetched).ok();
    }
    realtime.opened().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        realtime.receive(ArcStr::from(line)).await?;
    }

    for url in &urls {
        realtime.unfollow(url.clone()).await?;
    }
    realtime.closed(pump_stream::realtime::data::NORMAL_CLOSE).await?;
    drop(realtime);

    for url in urls {
        eprintln!("{url}: {} items", cache.len(url.clone()).await?);
    }

    let _ = tokio::join!(printer, challenge_printer);
    Ok(())
}
