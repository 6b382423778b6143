use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use simplelog::{Config, LevelFilter, WriteLogger};

use comicbook::book::{ComicBook, DisplayMode, ZoomMode};
use comicbook::geometry::{Point, Size};
use comicbook::loader::ImageLoader;
use comicbook::pages;
use comicbook::panic_handler;
use comicbook::preload::{EventKind, PreloadEvent};
use comicbook::settings::{self, PartialOptions};
use comicbook::surface::{Canvas, Surface};

#[derive(Parser, Debug)]
#[command(name = "comicbook", version, about = "Render a comic book spread to a PNG")]
struct Cli {
    /// Page images, directories of page images, or data: URIs, in reading order
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<String>,

    /// Pages per view: single or double
    #[arg(long = "display", value_name = "MODE")]
    display_mode: Option<DisplayMode>,

    /// Zoom policy: manual or fitWidth
    #[arg(long = "zoom", value_name = "MODE")]
    zoom_mode: Option<String>,

    /// Manual zoom factor, switches to manual zoom
    #[arg(long)]
    scale: Option<f32>,

    /// Window size the spread is laid out for
    #[arg(long, value_name = "WxH", default_value = "1280x800", value_parser = parse_viewport)]
    viewport: Size,

    /// Page to open at, starting from 1
    #[arg(long, value_name = "N")]
    page: Option<usize>,

    /// Click at this x position after loading; left half goes back, right half forward
    #[arg(long = "click", value_name = "X", allow_negative_numbers = true)]
    clicks: Vec<f32>,

    /// Pages to load before the first draw
    #[arg(long = "buffer", value_name = "N")]
    buffer_size: Option<usize>,

    /// Extra attempts for a page that fails to load
    #[arg(long)]
    retries: Option<u32>,

    /// Options file (default: $COMICBOOK_CONFIG, then the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the rendered spread
    #[arg(long, short, default_value = "spread.png")]
    output: PathBuf,

    #[arg(long, default_value = "comicbook.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> PartialOptions {
        PartialOptions {
            display_mode: self.display_mode,
            zoom_mode: self.zoom_mode.as_deref().map(ZoomMode::from),
            buffer_size: self.buffer_size,
            retries: self.retries,
        }
    }
}

fn parse_viewport(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: f32 = width
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{width}': {e}"))?;
    let height: f32 = height
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{height}': {e}"))?;
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return Err(format!("viewport must be positive, got {width}x{height}"));
    }
    let size = Size::new(width, height);
    let (w, h) = size.to_pixels();
    if u64::from(w) * u64::from(h) > Canvas::MAX_PIXELS {
        return Err(format!(
            "viewport {w}x{h} exceeds the {} pixel budget",
            Canvas::MAX_PIXELS
        ));
    }
    Ok(size)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {:?}", cli.log_file))?,
    )?;

    panic_handler::initialize_panic_handler();
    info!("Starting comicbook");

    let options = settings::load_options(cli.config.as_deref())?.merged(&cli.overrides());
    info!("Options: {options:?}");

    let sources = pages::collect_sources(&cli.sources)?;
    let mut book = ComicBook::new(sources, options, Canvas::new(cli.viewport))
        .context("Failed to open book")?;

    book.on(EventKind::Error, |event| {
        if let PreloadEvent::Error {
            index,
            source,
            error,
        } = event
        {
            eprintln!(
                "Skipping page {} ({}): {error}",
                index + 1,
                source.display_name()
            );
        }
    });
    book.on(EventKind::Ready, |event| {
        if let PreloadEvent::Ready { loaded } = event {
            info!("{loaded} pages buffered");
        }
    });

    let loader = ImageLoader::new();
    let summary = smol::block_on(book.preloader().run(&loader))?;
    if summary.loaded == 0 {
        bail!("None of the {} pages could be loaded", book.page_count());
    }
    if summary.failed > 0 {
        warn!("{} of {} pages failed to load", summary.failed, book.page_count());
    }

    if let Some(page) = cli.page {
        book.go_to_page(page.saturating_sub(1))
            .with_context(|| format!("Failed to open page {page}"))?;
    }
    if let Some(scale) = cli.scale {
        book.zoom(scale).context("Failed to zoom")?;
    }
    for &x in &cli.clicks {
        let bounds = book.surface().bounds();
        let side = book
            .navigate(Point::new(x, bounds.y), bounds)
            .with_context(|| format!("Failed to turn page on click at {x}"))?;
        info!("Click at {x} turned {side:?} to page {}", book.current_page() + 1);
    }

    let layout = book.draw().context("Failed to draw spread")?;
    book.surface()
        .save(&cli.output)
        .with_context(|| format!("Failed to write {:?}", cli.output))?;

    let shown = match book.view().trailing_index() {
        Some(next) if book.cache().contains(next) => {
            format!("pages {}-{}", book.current_page() + 1, next + 1)
        }
        _ => format!("page {}", book.current_page() + 1),
    };
    println!(
        "Wrote {shown} of {} to {} ({}x{}, zoom {:.2})",
        book.page_count(),
        cli.output.display(),
        layout.surface.width.ceil(),
        layout.surface.height.ceil(),
        layout.zoom_scale
    );
    info!("Done");
    Ok(())
}
