use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use crate::comments;
use crate::config;
use crate::medium;
use crate::render;

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// URL of the Medium story whose responses to fetch.
    pub post_url: String,
    /// Write the rendered page here instead of a temp file.
    pub output: Option<PathBuf>,
    /// Skip opening the rendered page in a browser.
    pub no_open: bool,
    pub config_file: Option<PathBuf>,
}

/// Resolve the story, fetch its full response tree, render it, write the
/// page, and open it. The first failure at any stage aborts the run; no
/// partial page is written.
pub async fn run(options: Options) -> Result<()> {
    let cfg = config::load(config::LoadOptions {
        config_file: options.config_file.clone(),
        env_prefix: None,
    })
    .context("load config")?;

    let post_url = Url::parse(&options.post_url)
        .with_context(|| format!("invalid post URL {}", options.post_url))?;

    let client = medium::Client::new(medium::ClientConfig {
        user_agent: cfg.http.user_agent.clone(),
        base_url: Some(cfg.http.base_url.clone()),
        timeout: Some(cfg.http.timeout),
        http_client: None,
    })
    .context("build medium client")?;

    let post = client
        .resolve_post(&post_url)
        .await
        .with_context(|| format!("resolve post at {post_url}"))?;
    tracing::info!(post_id = %post.id, "resolved post");

    let thread = comments::fetch_tree(&client, &post.id)
        .await
        .context("fetch response thread")?;
    let total: usize = thread.iter().map(comments::CommentRecord::count).sum();
    tracing::info!(top_level = thread.len(), total, "fetched response thread");

    let title = post.title.as_deref().unwrap_or(options.post_url.as_str());
    let html = render::page(title, post_url.as_str(), &thread);

    let path = write_page(&html, options.output.as_deref(), cfg.output.dir.as_deref())
        .context("write rendered page")?;
    println!("{}", path.display());

    if !options.no_open && cfg.output.open {
        let target = format!("file://{}", path.display());
        webbrowser::open(&target).with_context(|| format!("open {target}"))?;
    }

    Ok(())
}

fn write_page(html: &str, explicit: Option<&Path>, dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(path, html).with_context(|| format!("write {}", path.display()))?;
        return Ok(path.to_path_buf());
    }

    let dir = dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    fs::create_dir_all(&dir).with_context(|| format!("create directory {}", dir.display()))?;

    let mut file = tempfile::Builder::new()
        .prefix("medium-responses-")
        .suffix(".html")
        .tempfile_in(&dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    file.write_all(html.as_bytes()).context("write temp file")?;
    let (_, path) = file.keep().context("persist temp file")?;
    Ok(path)
}
