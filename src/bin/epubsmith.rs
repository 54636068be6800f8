use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use epubsmith::{
    BlobStore, CoverStyle, EntrySet, FontSource, GenerationSettings, RenderOptions, RenderWorker,
    TypesetterProvider, UriResolver, compose_cover,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "epubsmith", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template EPUB against a settings JSON file.
    Render(RenderArgs),
    /// Composite a single cover image.
    Cover(CoverArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Template EPUB (zip).
    #[arg(long)]
    template: PathBuf,

    /// Generation settings JSON (camelCase keys).
    #[arg(long)]
    settings: PathBuf,

    /// Output EPUB path.
    #[arg(long)]
    out: PathBuf,

    /// Cover source; overrides `coverImageUri` from the settings file.
    #[arg(long)]
    cover: Option<String>,

    /// Caption font (TTF/OTF). Defaults to the system sans-serif face.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Cover style JSON overrides.
    #[arg(long)]
    style: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CoverArgs {
    /// Source image (raster or SVG).
    #[arg(long)]
    image: PathBuf,

    /// Caption text.
    #[arg(long)]
    title: String,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Caption font (TTF/OTF). Defaults to the system sans-serif face.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Cover style JSON overrides.
    #[arg(long)]
    style: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
        Command::Cover(args) => cmd_cover(args).await,
    }
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let entries = EntrySet::load(&args.template)
        .await
        .with_context(|| format!("load template '{}'", args.template.display()))?;

    let raw = tokio::fs::read(&args.settings)
        .await
        .with_context(|| format!("read settings '{}'", args.settings.display()))?;
    let mut settings: GenerationSettings = serde_json::from_slice(&raw)
        .with_context(|| format!("parse settings '{}'", args.settings.display()))?;
    if let Some(cover) = args.cover {
        settings.cover_image_uri = cover;
    }

    let mut options = RenderOptions::default().with_cover_style(load_style(args.style.as_deref())?);
    if let Some(font) = &args.font {
        options = options.with_font_bytes(read_font(font).await?);
    }

    let blobs = BlobStore::new();
    let base_dir = args
        .settings
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let resolver = UriResolver::new(blobs.clone()).with_base_dir(base_dir);
    let handle = RenderWorker::spawn(blobs.clone(), Arc::new(resolver), options);

    let url = handle.render(entries, settings).await?;
    let blob = blobs.fetch(url.as_str())?;
    blobs.revoke(url.as_str());

    create_parent_dir(&args.out)?;
    tokio::fs::write(&args.out, &blob.bytes)
        .await
        .with_context(|| format!("write epub '{}'", args.out.display()))?;

    eprintln!("wrote {} ({} bytes)", args.out.display(), blob.bytes.len());
    Ok(())
}

async fn cmd_cover(args: CoverArgs) -> anyhow::Result<()> {
    let style = load_style(args.style.as_deref())?;
    let source = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    let fonts = match &args.font {
        Some(font) => FontSource::Bytes(Arc::new(read_font(font).await?)),
        None => FontSource::SystemSansSerif,
    };

    let title = args.title;
    let bytes = tokio::task::spawn_blocking(move || {
        let mut typesetter = fonts.typesetter(&style)?;
        compose_cover(&source, &title, &style, typesetter.as_mut())
    })
    .await
    .context("cover task panicked")??;

    create_parent_dir(&args.out)?;
    tokio::fs::write(&args.out, &bytes)
        .await
        .with_context(|| format!("write cover '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn load_style(path: Option<&Path>) -> anyhow::Result<CoverStyle> {
    match path {
        Some(p) => Ok(CoverStyle::from_json_file(p)?),
        None => Ok(CoverStyle::default()),
    }
}

async fn read_font(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("read font '{}'", path.display()))
}

fn create_parent_dir(out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
