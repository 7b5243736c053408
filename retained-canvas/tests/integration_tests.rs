//! Integration tests for retained-canvas.

use std::sync::Arc;

use retained_canvas::{
    ApproximateShaper, BlendMode, Canvas, CanvasError, Color, FillRule, FilterQuality, Gradient,
    Image, ImageRectParams, Matrix, Paint, Path, Pattern, Point, RasterSurface, Rect,
    RecordingSurface, Region, Repetition, Size, SrcRectConstraint, Surface, ThreadedSurface,
};

const RED: Color = Color::rgb(255, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

fn raster_canvas(width: u32, height: u32) -> (Canvas, Arc<RasterSurface>) {
    let surface = Arc::new(RasterSurface::new(width, height).unwrap());
    (Canvas::from_surface(surface.clone()), surface)
}

fn assert_close(actual: Color, expected: Color, tolerance: u8) {
    let channels = [
        (actual.r, expected.r),
        (actual.g, expected.g),
        (actual.b, expected.b),
        (actual.a, expected.a),
    ];
    assert!(
        channels.iter().all(|(a, e)| a.abs_diff(*e) <= tolerance),
        "{actual:?} != {expected:?}"
    );
}

/// translate(10,10) then scale(2,2) puts Rect(0,0,10,10) at Rect(10,10,20,20).
#[test]
fn test_transformed_rect_scenario() {
    let (mut canvas, surface) = raster_canvas(100, 100);
    canvas.translate(10.0, 10.0);
    canvas.scale(2.0, 2.0);
    canvas
        .draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::fill(RED))
        .unwrap();
    canvas.finish().unwrap();

    assert_eq!(surface.pixel(10, 10), Some(RED));
    assert_eq!(surface.pixel(29, 29), Some(RED));
    assert_eq!(surface.pixel(30, 30), Some(Color::TRANSPARENT));
    assert_eq!(surface.pixel(9, 15), Some(Color::TRANSPARENT));
}

/// Draws after save/clip/restore are unclipped again.
#[test]
fn test_save_restore_clip_round_trip() {
    let (mut canvas, surface) = raster_canvas(60, 60);
    canvas.save();
    canvas.clip_rect(Rect::new(0.0, 0.0, 20.0, 20.0), false).unwrap();
    canvas.draw_color(RED).unwrap();
    canvas.restore();
    canvas
        .draw_rect(Rect::new(40.0, 40.0, 10.0, 10.0), &Paint::fill(BLUE))
        .unwrap();

    assert_eq!(surface.pixel(5, 5), Some(RED));
    assert_eq!(surface.pixel(30, 30), Some(Color::TRANSPARENT));
    assert_eq!(surface.pixel(45, 45), Some(BLUE));
    assert_eq!(canvas.clip_bounds(), None);
}

/// clip_out_rect leaves a hole in a full-clip fill.
#[test]
fn test_clip_out_hole() {
    let (mut canvas, surface) = raster_canvas(40, 40);
    canvas.clip_out_rect(Rect::new(10.0, 10.0, 20.0, 20.0), false).unwrap();
    canvas.draw_color(BLUE).unwrap();

    assert_eq!(surface.pixel(20, 20), Some(Color::TRANSPARENT));
    assert_eq!(surface.pixel(5, 20), Some(BLUE));
    assert!(!canvas.contains_point(Point::new(20.0, 20.0)));
    assert!(canvas.contains_point(Point::new(5.0, 20.0)));
}

/// A region clip admits only its rectangles.
#[test]
fn test_region_clip() {
    let (mut canvas, surface) = raster_canvas(40, 10);
    canvas.clip_region(&Region::from_rects([
        Rect::new(0.0, 0.0, 10.0, 10.0),
        Rect::new(30.0, 0.0, 10.0, 10.0),
    ]));
    canvas.draw_color(RED).unwrap();

    assert_eq!(surface.pixel(5, 5), Some(RED));
    assert_eq!(surface.pixel(20, 5), Some(Color::TRANSPARENT));
    assert_eq!(surface.pixel(35, 5), Some(RED));
}

/// A layer is composited at restore with the opacity captured at save time.
#[test]
fn test_layer_opacity_applied_at_restore() {
    let (mut canvas, surface) = raster_canvas(20, 20);
    canvas.clear(Color::WHITE).unwrap();
    canvas.save_layer_alpha(None, 128).unwrap();
    canvas
        .draw_rect(Rect::new(0.0, 0.0, 20.0, 20.0), &Paint::fill(Color::BLACK))
        .unwrap();
    assert_eq!(surface.layer_depth(), 1);
    // Nothing reaches the base pixels until restore.
    assert_eq!(surface.pixel(10, 10), Some(Color::WHITE));
    canvas.restore();

    assert_eq!(surface.layer_depth(), 0);
    assert_close(surface.pixel(10, 10).unwrap(), Color::rgb(127, 127, 127), 2);
}

/// Layer bounds and the clip at save time limit the composite.
#[test]
fn test_layer_bounds_limit_composite() {
    let (mut canvas, surface) = raster_canvas(30, 30);
    canvas
        .save_layer(Some(Rect::new(0.0, 0.0, 10.0, 10.0)), &Paint::new())
        .unwrap();
    canvas.draw_color(RED).unwrap();
    canvas.restore();

    assert_eq!(surface.pixel(5, 5), Some(RED));
    assert_eq!(surface.pixel(20, 20), Some(Color::TRANSPARENT));
}

/// Blend modes captured from the layer paint apply to the composite.
#[test]
fn test_layer_blend_mode() {
    let (mut canvas, surface) = raster_canvas(10, 10);
    canvas.clear(Color::rgb(255, 255, 0)).unwrap();
    let paint = Paint::new().with_blend_mode(BlendMode::Multiply);
    canvas.save_layer(None, &paint).unwrap();
    canvas.draw_color(Color::rgb(255, 0, 255)).unwrap();
    canvas.restore();

    assert_close(surface.pixel(5, 5).unwrap(), RED, 1);
}

/// finish() inside a layer leaves the layer open; draws after it still go
/// offscreen and the matching restore composites both halves alike.
#[test]
fn test_finish_inside_layer_keeps_layer_open() {
    let (mut canvas, surface) = raster_canvas(20, 10);
    canvas.clear(Color::WHITE).unwrap();
    canvas.save_layer_alpha(None, 128).unwrap();
    let black = Paint::fill(Color::BLACK);
    canvas
        .draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &black)
        .unwrap();
    canvas.finish().unwrap();
    assert_eq!(surface.layer_depth(), 1);
    canvas
        .draw_rect(Rect::new(10.0, 0.0, 10.0, 10.0), &black)
        .unwrap();
    assert_eq!(surface.pixel(15, 5), Some(Color::WHITE));
    canvas.restore();

    assert!(canvas.is_valid());
    assert_eq!(surface.layer_depth(), 0);
    let left = surface.pixel(5, 5).unwrap();
    let right = surface.pixel(15, 5).unwrap();
    assert_close(left, Color::rgb(127, 127, 127), 2);
    assert_eq!(left, right);
}

/// Dropping a canvas with an open layer still composites it.
#[test]
fn test_drop_composites_open_layer() {
    let surface = Arc::new(RasterSurface::new(10, 10).unwrap());
    {
        let mut canvas = Canvas::from_surface(surface.clone());
        canvas.save_layer(None, &Paint::new()).unwrap();
        canvas.draw_color(BLUE).unwrap();
    }
    assert_eq!(surface.layer_depth(), 0);
    assert_eq!(surface.pixel(3, 3), Some(BLUE));
}

#[test]
fn test_clear_rect_under_translation() {
    let (mut canvas, surface) = raster_canvas(20, 20);
    canvas.draw_color(RED).unwrap();
    canvas.translate(5.0, 5.0);
    canvas
        .clear_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::TRANSPARENT)
        .unwrap();

    assert_eq!(surface.pixel(7, 7), Some(Color::TRANSPARENT));
    assert_eq!(surface.pixel(2, 2), Some(RED));
    assert_eq!(surface.pixel(12, 12), Some(RED));
}

#[test]
fn test_stroke_and_fill_convenience() {
    let (mut canvas, surface) = raster_canvas(40, 40);
    canvas.paint_mut().set_color(BLUE);
    canvas.paint_mut().set_stroke_width(2.0);
    canvas.stroke_rect(Rect::new(10.0, 10.0, 20.0, 20.0)).unwrap();

    assert_eq!(surface.pixel(10, 20), Some(BLUE));
    assert_eq!(surface.pixel(20, 20), Some(Color::TRANSPARENT));

    canvas.fill_circle(Point::new(20.0, 20.0), 5.0).unwrap();
    assert_eq!(surface.pixel(20, 20), Some(BLUE));
}

#[test]
fn test_path_fill_rule() {
    let (mut canvas, surface) = raster_canvas(40, 40);
    let mut path = Path::from_svg_path_data("M0 0 H40 V40 H0 Z M10 10 H30 V30 H10 Z").unwrap();
    path.set_fill_rule(FillRule::EvenOdd);
    canvas.fill_path(&path).unwrap();

    assert_eq!(surface.pixel(5, 5), Some(Color::BLACK));
    assert_eq!(surface.pixel(20, 20), Some(Color::TRANSPARENT));
}

#[test]
fn test_gradient_fill() {
    let (mut canvas, surface) = raster_canvas(100, 10);
    let mut gradient = Gradient::new_linear(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
    gradient.add_color_stop(0.0, Color::BLACK).unwrap();
    gradient.add_color_stop(1.0, Color::WHITE).unwrap();
    canvas.draw_gradient(Arc::new(gradient)).unwrap();

    let left = surface.pixel(2, 5).unwrap();
    let right = surface.pixel(97, 5).unwrap();
    assert!(left.r < 20, "{left:?}");
    assert!(right.r > 235, "{right:?}");
}

#[test]
fn test_repeating_pattern() {
    let (mut canvas, surface) = raster_canvas(8, 8);
    let mut pixels = Vec::new();
    for (x, _) in (0..2).flat_map(|y| (0..2).map(move |x| (x, y))) {
        let c = if x == 0 { RED } else { BLUE };
        pixels.extend_from_slice(&[c.r, c.g, c.b, c.a]);
    }
    let tile = Arc::new(Image::from_rgba(pixels, 2, 2).unwrap());
    canvas.paint_mut().set_filter_quality(FilterQuality::Nearest);
    canvas
        .draw_pattern(Arc::new(Pattern::new(tile, Repetition::Repeat)))
        .unwrap();

    assert_eq!(surface.pixel(0, 0), Some(RED));
    assert_eq!(surface.pixel(1, 0), Some(BLUE));
    assert_eq!(surface.pixel(4, 7), Some(RED));
    assert_eq!(surface.pixel(7, 3), Some(BLUE));
}

#[test]
fn test_draw_image_rect_crops_source() {
    let (mut canvas, surface) = raster_canvas(20, 20);
    let mut pixels = Vec::new();
    for x in 0..4 {
        let c = if x < 2 { RED } else { BLUE };
        pixels.extend_from_slice(&[c.r, c.g, c.b, c.a]);
    }
    let image = Arc::new(Image::from_rgba(pixels, 4, 1).unwrap());
    let params = ImageRectParams {
        src: Rect::new(2.0, 0.0, 2.0, 1.0),
        dst: Rect::new(0.0, 0.0, 20.0, 20.0),
    };
    canvas
        .draw_image_rect(&image, &params, SrcRectConstraint::Strict, &Paint::new())
        .unwrap();

    assert_eq!(surface.pixel(1, 10), Some(BLUE));
    assert_eq!(surface.pixel(18, 10), Some(BLUE));
}

#[test]
fn test_draw_canvas_copies_pixels() {
    let (mut source, _source_surface) = raster_canvas(4, 4);
    source.draw_color(RED).unwrap();

    let (mut target, surface) = raster_canvas(10, 10);
    target
        .draw_canvas(&source, Point::new(3.0, 3.0), &Paint::new())
        .unwrap();

    assert_eq!(surface.pixel(4, 4), Some(RED));
    assert_eq!(surface.pixel(1, 1), Some(Color::TRANSPARENT));
}

#[test]
fn test_from_image_draws_over_copy() {
    let image = Image::filled(10, 10, Color::WHITE).unwrap();
    let mut canvas = Canvas::from_image(&image).unwrap();
    canvas
        .draw_rect(Rect::new(0.0, 0.0, 5.0, 10.0), &Paint::fill(RED))
        .unwrap();
    let snapshot = canvas.surface().and_then(|s| s.snapshot()).unwrap();

    assert_eq!(snapshot.pixel(2, 2), Some(RED));
    assert_eq!(snapshot.pixel(7, 2), Some(Color::WHITE));
    // The source image is untouched.
    assert_eq!(image.pixel(2, 2), Some(Color::WHITE));
}

#[test]
fn test_text_without_fonts_draws_nothing_but_marks_dirty() {
    let (mut canvas, surface) = raster_canvas(50, 20);
    canvas.set_text_shaper(Arc::new(ApproximateShaper::default()));
    canvas.fill_text("hello", Point::new(5.0, 15.0)).unwrap();

    assert!(canvas.is_dirty());
    assert!(canvas.dirty_bounds().is_some());
    assert_eq!(surface.pixel(10, 10), Some(Color::TRANSPARENT));
}

/// A recorded display list replays to the same pixels.
#[test]
fn test_recording_replay_matches_direct_render() {
    let draw = |canvas: &mut Canvas| {
        canvas.rotate_about(0.3, Point::new(16.0, 16.0));
        canvas
            .draw_rect(Rect::new(8.0, 8.0, 16.0, 16.0), &Paint::fill(RED))
            .unwrap();
        canvas.save_layer_alpha(None, 200).unwrap();
        canvas
            .draw_circle(Point::new(16.0, 16.0), 6.0, &Paint::fill(BLUE))
            .unwrap();
        canvas.restore();
    };

    let (mut direct, direct_surface) = raster_canvas(32, 32);
    draw(&mut direct);

    let recording = Arc::new(RecordingSurface::new(Size::new(32.0, 32.0)));
    let mut recorded = Canvas::from_surface(recording.clone());
    draw(&mut recorded);
    let replayed = RasterSurface::new(32, 32).unwrap();
    recording.replay(&replayed).unwrap();

    assert_eq!(direct_surface.image_data(), replayed.image_data());
}

#[test]
fn test_threaded_surface_wait() {
    let raster = Arc::new(RasterSurface::new(16, 16).unwrap());
    let threaded = Arc::new(ThreadedSurface::new(raster.clone()).unwrap());
    let mut canvas = Canvas::from_surface(threaded);
    for i in 0..16 {
        canvas
            .draw_rect(Rect::new(i as f64, 0.0, 1.0, 16.0), &Paint::fill(BLUE))
            .unwrap();
    }
    canvas.flush().unwrap();
    canvas.wait().unwrap();

    assert!(!canvas.is_dirty());
    assert_eq!(raster.pixel(15, 15), Some(BLUE));
}

/// N saves followed by N restores return to the initial matrix and clip.
#[test]
fn test_save_restore_round_trip_law() {
    let mut canvas = Canvas::new();
    let initial = (canvas.matrix(), canvas.clip_bounds());
    for i in 0..5 {
        canvas.save();
        canvas.translate(i as f64, 2.0);
        canvas.rotate(0.1 * i as f64);
        canvas.clip_rect(Rect::new(0.0, 0.0, 100.0, 50.0 + i as f64), true).unwrap();
        canvas.clip_out_rect(Rect::new(1.0, 1.0, 2.0, 2.0), false).unwrap();
    }
    canvas.restore_to_count(0);
    canvas.restore();
    assert_eq!((canvas.matrix(), canvas.clip_bounds()), initial);
    assert!(!canvas.is_clip_out());
}

#[test]
fn test_singular_unmap_fallback() {
    let mut canvas = Canvas::new();
    canvas.set_matrix(Matrix::scaling(0.0, 0.0));
    let p = Point::new(3.0, 4.0);
    assert_eq!(canvas.unmap_point(p), p);
    assert!(matches!(
        canvas.try_unmap_point(p),
        Err(CanvasError::InvalidOperation(_))
    ));
}

#[test]
fn test_png_export() {
    let (mut canvas, surface) = raster_canvas(8, 6);
    canvas.draw_color(RED).unwrap();
    canvas.finish().unwrap();
    let png_data = surface.to_png(Some(144.0)).unwrap();

    let decoded = image::load_from_memory(&png_data).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (8, 6));
    assert_eq!(decoded.get_pixel(4, 3).0, [255, 0, 0, 255]);
}

#[test]
fn test_png_written_to_disk() {
    let (mut canvas, surface) = raster_canvas(4, 4);
    canvas.draw_color(BLUE).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    std::fs::write(&path, surface.to_png(None).unwrap()).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
}
