use comicbook::book::{ComicBook, DisplayMode, DrawError, MAX_SCALE, ZoomMode};
use comicbook::geometry::Size;
use comicbook::loader::{ImageLoader, PageSource};
use comicbook::settings::Options;
use comicbook::surface::{Canvas, Surface, SurfaceError};
use comicbook::test_utils::{PLACEHOLDER_SHADES, ScriptedLoader, placeholder_sources};
use image::Rgba;

fn grey(level: u8) -> Rgba<u8> {
    Rgba([level, level, level, 0xff])
}

fn manual(display_mode: DisplayMode) -> Options {
    Options {
        display_mode,
        zoom_mode: ZoomMode::Manual,
        ..Options::default()
    }
}

fn placeholder_book(display_mode: DisplayMode, canvas: Canvas) -> ComicBook<Canvas> {
    let book = ComicBook::new(placeholder_sources(), manual(display_mode), canvas).unwrap();
    smol::block_on(book.preloader().run(&ImageLoader::new())).unwrap();
    book
}

fn wide_canvas() -> Canvas {
    Canvas::new(Size::new(40.0, 20.0))
}

/// A single page zoomed to 10x10 sits in the middle of the frame
#[test]
fn test_single_page_is_centred() {
    let mut book = placeholder_book(DisplayMode::Single, wide_canvas());
    assert!(book.zoom(10.0).unwrap());

    let frame = book.surface().frame();
    assert_eq!(frame.dimensions(), (40, 20));
    assert_eq!(*frame.get_pixel(20, 10), grey(PLACEHOLDER_SHADES[0]));
    assert_eq!(*frame.get_pixel(16, 6), grey(PLACEHOLDER_SHADES[0]));
    assert_eq!(*frame.get_pixel(2, 2), Canvas::DEFAULT_BACKGROUND);
    assert_eq!(*frame.get_pixel(30, 10), Canvas::DEFAULT_BACKGROUND);
}

/// A double spread shows consecutive pages left to right, and advancing
/// moves the spread by one page
#[test]
fn test_double_spread_pixels() {
    let mut book = placeholder_book(DisplayMode::Double, wide_canvas());
    book.zoom(10.0).unwrap();

    let frame = book.surface().frame();
    assert_eq!(*frame.get_pixel(15, 10), grey(PLACEHOLDER_SHADES[0]));
    assert_eq!(*frame.get_pixel(25, 10), grey(PLACEHOLDER_SHADES[1]));
    assert_eq!(*frame.get_pixel(5, 10), Canvas::DEFAULT_BACKGROUND);

    book.advance().unwrap();
    let frame = book.surface().frame();
    assert_eq!(*frame.get_pixel(15, 10), grey(PLACEHOLDER_SHADES[1]));
    assert_eq!(*frame.get_pixel(25, 10), grey(PLACEHOLDER_SHADES[2]));
}

/// Zoomed content larger than the viewport grows the frame
#[test]
fn test_large_zoom_grows_frame() {
    let mut book = placeholder_book(DisplayMode::Single, Canvas::new(Size::new(8.0, 4.0)));
    book.zoom(10.0).unwrap();

    assert_eq!(book.surface().size(), Size::new(10.0, 10.0));
    assert_eq!(book.surface().frame().dimensions(), (10, 10));
    assert_eq!(
        *book.surface().frame().get_pixel(9, 9),
        grey(PLACEHOLDER_SHADES[0])
    );
}

/// An absurd zoom factor is an error, and the last frame survives it
#[test]
fn test_huge_zoom_is_rejected_without_drawing() {
    let mut book = placeholder_book(DisplayMode::Single, wide_canvas());
    book.zoom(10.0).unwrap();

    for scale in [1e10, MAX_SCALE * 2.0] {
        assert!(matches!(book.zoom(scale), Err(DrawError::InvalidScale(_))));
    }
    assert_eq!(book.view().scale, 10.0);
    assert_eq!(book.surface().frame().dimensions(), (40, 20));
    assert_eq!(
        *book.surface().frame().get_pixel(20, 10),
        grey(PLACEHOLDER_SHADES[0])
    );
}

/// A spread that outgrows the canvas pixel budget fails the draw instead of
/// allocating the frame
#[test]
fn test_frame_over_pixel_budget_is_refused() {
    let canvas = Canvas::new(Size::new(8.0, 4.0)).with_max_pixels(64);
    let mut book = placeholder_book(DisplayMode::Single, canvas);

    let err = book.zoom(10.0).unwrap_err();
    assert!(matches!(
        err,
        DrawError::Surface(SurfaceError::TooLarge {
            width: 10,
            height: 10,
            limit: 64
        })
    ));
    assert_eq!(book.surface().frame().dimensions(), (8, 4));

    // A 1x1 page centred on 8x4 rounds to (4, 2)
    book.zoom(1.0).unwrap();
    assert_eq!(
        *book.surface().frame().get_pixel(4, 2),
        grey(PLACEHOLDER_SHADES[0])
    );
}

/// Pages coloured by the loader land on the canvas in that colour
#[test]
fn test_loader_colour_reaches_canvas() {
    let red = Rgba([0xff, 0, 0, 0xff]);
    let sources: Vec<_> = (0..2).map(|i| PageSource::new(format!("page-{i}"))).collect();
    let mut book = ComicBook::new(
        sources,
        manual(DisplayMode::Single),
        Canvas::new(Size::new(20.0, 20.0)),
    )
    .unwrap();
    let loader = ScriptedLoader::new().with_page_size(4, 4).with_color(red);
    smol::block_on(book.preloader().run(&loader)).unwrap();

    book.zoom(2.0).unwrap();

    let frame = book.surface().frame();
    assert_eq!(*frame.get_pixel(10, 10), red);
    assert_eq!(*frame.get_pixel(1, 1), Canvas::DEFAULT_BACKGROUND);
}

/// The surface handed back by the book holds the drawn frame and saves as PNG
#[test]
fn test_frame_saves_as_png() {
    let mut book = placeholder_book(DisplayMode::Single, wide_canvas());
    book.go_to_page(4).unwrap();
    book.zoom(10.0).unwrap();

    let canvas = book.into_surface();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spread.png");
    canvas.save(&path).unwrap();

    let saved = image::open(&path).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), (40, 20));
    assert_eq!(*saved.get_pixel(20, 10), grey(PLACEHOLDER_SHADES[4]));
}
