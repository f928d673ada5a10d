use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::app::{AppContext, GiflistError, Result};
use crate::debounce::spawn_query_debouncer;
use crate::domain::{FeedSettings, NormalizedPost, SortOrder};
use crate::feed::{spawn_feed_controller, FeedEvent, FeedHandle, FeedSession};
use crate::store::SettingsStore;
use crate::view::BrowserView;

const BROWSE_HELP: &str = "Type a feed name to switch feeds. Commands:
  :more         load another page
  :sort <order> change sort order (hot, new, rising, top, controversial)
  :open <n>     open post n in the browser
  :comments <n> open the comments for post n
  :play <n>     toggle the loader for post n
  :list         print the current posts
  :help         show this help
  :quit         exit";

/// One line of input in the interactive browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseInput {
    FeedName(String),
    More,
    Sort(SortOrder),
    Open(usize),
    Comments(usize),
    Play(usize),
    List,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_input(line: &str) -> BrowseInput {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return BrowseInput::FeedName(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();

    let index = |arg: Option<&str>| -> std::result::Result<usize, String> {
        match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) if n > 0 => Ok(n - 1),
            _ => Err(format!(":{} needs a post number", name)),
        }
    };

    match name {
        "more" | "m" => BrowseInput::More,
        "list" | "l" => BrowseInput::List,
        "help" | "h" => BrowseInput::Help,
        "quit" | "q" => BrowseInput::Quit,
        "sort" | "s" => match arg.map(str::parse::<SortOrder>) {
            Some(Ok(order)) => BrowseInput::Sort(order),
            Some(Err(e)) => BrowseInput::Invalid(e),
            None => BrowseInput::Invalid(":sort needs an order".to_string()),
        },
        "open" | "o" => index(arg).map_or_else(BrowseInput::Invalid, BrowseInput::Open),
        "comments" | "c" => index(arg).map_or_else(BrowseInput::Invalid, BrowseInput::Comments),
        "play" | "p" => index(arg).map_or_else(BrowseInput::Invalid, BrowseInput::Play),
        other => BrowseInput::Invalid(format!("Unknown command :{}", other)),
    }
}

fn format_item(index: usize, post: &NormalizedPost) -> String {
    format!(
        "{:>4}. [{:<5}] {}  {}",
        index + 1,
        post.media_kind.label(),
        post.playable_url,
        post.display_title()
    )
}

fn start_feed(ctx: &AppContext, settings: &FeedSettings) -> (FeedHandle, mpsc::UnboundedReceiver<FeedEvent>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let session = FeedSession::new(
        settings.clone(),
        ctx.classifier.clone(),
        ctx.config.session.retry_ceiling,
        events_tx,
    );
    (spawn_feed_controller(session, ctx.source.clone()), events_rx)
}

pub async fn fetch_feed(
    ctx: &AppContext,
    feed: Option<String>,
    sort: Option<SortOrder>,
    page_size: Option<usize>,
    pages: usize,
) -> Result<()> {
    let mut settings = ctx.load_settings().await?;
    if let Some(feed) = feed {
        settings.feed_name = feed;
    }
    if let Some(sort) = sort {
        settings.sort_order = sort;
    }
    if let Some(page_size) = page_size {
        settings.page_size = page_size;
    }

    println!(
        "r/{} ({}, {} per page)",
        settings.feed_name, settings.sort_order, settings.page_size
    );

    let (handle, mut events) = start_feed(ctx, &settings);
    let mut view = BrowserView::new();
    let mut pages_done = 0;

    handle.reset(settings).await;

    while let Some(event) = events.recv().await {
        let printed = view.items.len();
        if view.apply(&event) {
            for (i, post) in view.items.iter().enumerate().skip(printed) {
                println!("{}", format_item(i, post));
            }
        }

        match event {
            FeedEvent::Exhausted => {
                if let Some(message) = &view.status_message {
                    eprintln!("{}", message);
                }
                break;
            }
            FeedEvent::Settled => {
                pages_done += 1;
                if pages_done >= pages {
                    break;
                }
                handle.load_more().await;
            }
            _ => {}
        }
    }

    handle.shutdown().await;
    println!("{} posts", view.items.len());
    Ok(())
}

pub async fn browse(ctx: &AppContext) -> Result<()> {
    let mut settings = ctx.load_settings().await?;
    let (feed, mut events) = start_feed(ctx, &settings);
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();
    let input = spawn_query_debouncer(ctx.config.debounce.quiet_interval(), settled_tx);
    let mut view = BrowserView::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", BROWSE_HELP);
    println!("--- r/{} ({}) ---", settings.feed_name, settings.sort_order);
    feed.reset(settings.clone()).await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    BrowseInput::FeedName(name) => input.submit(name),
                    BrowseInput::More => feed.load_more().await,
                    BrowseInput::Sort(order) => {
                        settings.sort_order = order;
                        ctx.settings_store.save(&settings).await?;
                        println!("--- r/{} ({}) ---", settings.feed_name, settings.sort_order);
                        feed.reset(settings.clone()).await;
                    }
                    BrowseInput::Open(n) => match view.get(n) {
                        Some(post) => open_url(&post.playable_url),
                        None => println!("No post {}", n + 1),
                    },
                    BrowseInput::Comments(n) => match view.get(n) {
                        Some(post) => open_url(&post.comments_url()),
                        None => println!("No post {}", n + 1),
                    },
                    BrowseInput::Play(n) => {
                        let id = view.get(n).map(|post| post.id().to_string());
                        match id {
                            Some(id) => {
                                let shown = view.toggle_loader(&id);
                                println!("Post {} loader {}", n + 1, if shown { "on" } else { "off" });
                            }
                            None => println!("No post {}", n + 1),
                        }
                    }
                    BrowseInput::List => {
                        for (i, post) in view.items.iter().enumerate() {
                            println!("{}", format_item(i, post));
                        }
                        if view.is_loading {
                            println!("(loading...)");
                        }
                    }
                    BrowseInput::Help => println!("{}", BROWSE_HELP),
                    BrowseInput::Quit => break,
                    BrowseInput::Invalid(message) => println!("{}", message),
                }
            }
            Some(event) = events.recv() => {
                let printed = view.items.len();
                if view.apply(&event) {
                    for (i, post) in view.items.iter().enumerate().skip(printed) {
                        println!("{}", format_item(i, post));
                    }
                }
                if event == FeedEvent::Exhausted {
                    if let Some(message) = &view.status_message {
                        println!("Oops! {}", message);
                    }
                }
            }
            Some(name) = settled_rx.recv() => {
                settings.feed_name = name;
                ctx.settings_store.save(&settings).await?;
                println!("--- r/{} ({}) ---", settings.feed_name, settings.sort_order);
                feed.reset(settings.clone()).await;
            }
        }
    }

    feed.shutdown().await;
    Ok(())
}

fn open_url(url: &str) {
    if let Err(e) = open::that(url) {
        println!("Failed to open browser: {}", e);
    }
}

pub async fn show_settings(ctx: &AppContext) -> Result<()> {
    let settings = ctx.load_settings().await?;
    println!("feed_name  = {}", settings.feed_name);
    println!("sort_order = {}", settings.sort_order);
    println!("page_size  = {}", settings.page_size);
    match ctx.settings_store.updated_at()? {
        Some(at) => println!("(saved {})", at),
        None => println!("(defaults, nothing saved yet)"),
    }
    Ok(())
}

pub async fn set_settings(
    ctx: &AppContext,
    feed: Option<String>,
    sort: Option<SortOrder>,
    page_size: Option<usize>,
) -> Result<()> {
    let mut settings = ctx.load_settings().await?;

    if let Some(feed) = feed {
        let feed = feed.trim();
        if feed.is_empty() {
            return Err(GiflistError::Config("Feed name cannot be empty".into()));
        }
        settings.feed_name = feed.to_string();
    }
    if let Some(sort) = sort {
        settings.sort_order = sort;
    }
    if let Some(page_size) = page_size {
        if page_size == 0 {
            return Err(GiflistError::Config("Page size must be at least 1".into()));
        }
        settings.page_size = page_size;
    }

    ctx.settings_store.save(&settings).await?;
    println!("Saved settings");
    Ok(())
}
