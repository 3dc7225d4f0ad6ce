use crate::app::{AppContext, IslanderError, Result};
use crate::domain::{select_best_cdn, Identity, Thread};
use crate::store::IdentityStore;
use crate::timeline::{LoadOutcome, TimelineController};

pub async fn list_forums(ctx: &AppContext) -> Result<()> {
    let groups = ctx.api.load_forum_groups().await?;

    if groups.is_empty() {
        println!("No forums");
        return Ok(());
    }

    for group in groups {
        println!("{}", group.name);
        for forum in group.forums.iter().filter(|f| !f.is_timeline()) {
            println!(
                "  {:>4}  {} ({} threads)",
                forum.id,
                forum.display_title(),
                forum.thread_count
            );
        }
    }

    Ok(())
}

pub async fn list_channels(ctx: &AppContext) -> Result<()> {
    let channels = ctx.api.load_timeline_channels().await?;

    if channels.is_empty() {
        println!("No timelines");
        return Ok(());
    }

    for channel in channels {
        println!(
            "{:>3}  {} ({} pages)",
            channel.id,
            channel.display_title(),
            channel.last_page()
        );
    }

    Ok(())
}

pub async fn show_cdn(ctx: &AppContext) -> Result<()> {
    let endpoints = ctx.api.get_cdn_endpoints().await?;
    let best = select_best_cdn(&endpoints).map(|e| e.url.clone());

    for endpoint in &endpoints {
        let marker = if Some(&endpoint.url) == best.as_ref() { "*" } else { " " };
        println!("{} {:.2}  {}", marker, endpoint.rate, endpoint.url);
    }

    if best.is_none() {
        println!("No CDN endpoints");
    }

    Ok(())
}

pub async fn show_timeline(ctx: &AppContext, channel: Option<i64>, pages: u32) -> Result<()> {
    let report = ctx.bootstrap().await;
    for error in &report.errors {
        eprintln!("Warning: {}", error);
    }

    let timeline = ctx.timeline_controller();
    expect_loaded(timeline.start().await)?;

    if let Some(channel_id) = channel {
        match timeline.select_channel(channel_id).await {
            LoadOutcome::Unchanged => {}
            outcome => expect_loaded(outcome)?,
        }
    }

    for _ in 1..pages {
        match timeline.load_more().await {
            LoadOutcome::NoMorePages => break,
            LoadOutcome::Failed(e) => {
                eprintln!("Stopped early: {}", e);
                break;
            }
            _ => {}
        }
    }

    print_feed(ctx, &timeline);
    Ok(())
}

fn expect_loaded(outcome: LoadOutcome) -> Result<()> {
    match outcome {
        LoadOutcome::Applied => Ok(()),
        LoadOutcome::Failed(e) => Err(IslanderError::Other(e)),
        other => Err(IslanderError::Other(format!(
            "Timeline did not load: {:?}",
            other
        ))),
    }
}

fn print_feed(ctx: &AppContext, timeline: &TimelineController) {
    if let Some(channel) = timeline.current_channel() {
        println!(
            "== {} (page {}/{}) ==\n",
            channel.display_title(),
            timeline.current_page(),
            timeline.max_page()
        );
    }

    let threads = timeline.threads();
    if threads.is_empty() {
        println!("No threads");
        return;
    }

    for thread in &threads {
        print_thread(ctx, thread);
    }
}

fn print_thread(ctx: &AppContext, thread: &Thread) {
    let forum = ctx
        .session
        .forum_name(&thread.forum_id)
        .unwrap_or_else(|| thread.forum_id.clone());

    println!(
        "No.{}  {}  {}  [{}]  {} replies",
        thread.id, thread.author_hash, thread.posted_at, forum, thread.reply_count
    );
    if !thread.title.is_empty() && thread.title != "无标题" {
        println!("{}", thread.title);
    }
    println!("{}", thread.content);
    if let Some(url) = ctx.session.image_url(thread) {
        println!("{}", url);
    }
    println!();
}

pub fn list_cookies(ctx: &AppContext) -> Result<()> {
    let identities = ctx.store.list()?;

    if identities.is_empty() {
        println!("No cookies");
        return Ok(());
    }

    let current = ctx.store.get_current()?.map(|i| i.name);
    for identity in identities {
        let marker = if current.as_deref() == Some(identity.name.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}  (added {})",
            marker,
            identity.name,
            identity.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub fn add_cookie(ctx: &AppContext, name: &str, token: &str) -> Result<()> {
    if name.trim().is_empty() || token.trim().is_empty() {
        return Err(IslanderError::InvalidIdentityPayload(
            "name and cookie must not be empty".into(),
        ));
    }

    ctx.store.add(&Identity::new(name.trim(), token.trim()))?;
    println!("Saved cookie: {}", name.trim());
    Ok(())
}

pub fn import_cookie(ctx: &AppContext, payload: &str) -> Result<()> {
    let identity = Identity::from_import_payload(payload)?;
    ctx.store.add(&identity)?;
    println!("Imported cookie: {}", identity.name);
    Ok(())
}

pub fn use_cookie(ctx: &AppContext, name: &str) -> Result<()> {
    let identity = ctx.use_identity(name)?;
    println!("Using cookie: {}", identity.name);
    Ok(())
}

pub fn clear_cookie(ctx: &AppContext) -> Result<()> {
    ctx.clear_identity()?;
    println!("No cookie selected");
    Ok(())
}

pub fn remove_cookie(ctx: &AppContext, name: &str) -> Result<()> {
    ctx.remove_identity(name)?;
    println!("Removed cookie: {}", name);
    Ok(())
}
