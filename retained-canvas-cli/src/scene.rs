//! Line-oriented scene scripts.
//!
//! One command per line; `#` starts a comment. Coordinates are in the scene
//! viewport (200x200 unless a `viewport` line says otherwise), which is
//! scaled to the output size at render time. Colors are single CSS tokens
//! without spaces (`red`, `#1f77b4`, `rgba(0,0,0,0.5)`).
//!
//! ```text
//! viewport 100 100
//! color #1f77b4
//! save
//! clip-rect 10 10 80 80
//! fill-circle 50 50 45
//! restore
//! ```

use std::fs;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use retained_canvas::{
    BlendMode, Canvas, CanvasResult, Color, Gradient, PaintStyle, Path, Point, Rect, Size,
    TextAlign,
};

const DEFAULT_VIEWPORT: f64 = 200.0;

/// Scenes shipped with the binary: name, description, script.
pub const BUILTIN_SCENES: &[(&str, &str, &str)] = &[
    ("shapes", "fills, strokes, paths and a gradient", SHAPES),
    ("layers", "layer opacity and blend modes", LAYERS),
    ("clip", "rectangle clip with a clipped-out hole", CLIP),
    ("text", "aligned and rotated text", TEXT),
];

const SHAPES: &str = "\
clear white
color #1f77b4
fill-rect 20 20 70 50
color #ff7f0e
fill-circle 145 45 28
color #2ca02c
line-width 4
stroke-rect 20 100 70 50
color #9467bd
fill-path M 110 150 L 145 100 L 180 150 Z
color #d62728
line-width 2
line 20 165 180 165
gradient 20 0 180 0 #d62728 #1f77b4
fill-rect 20 175 160 15
";

const LAYERS: &str = "\
clear white
color #d62728
fill-rect 20 20 100 100
layer 128
color #1f77b4
fill-rect 80 80 100 100
restore
save
blend multiply
color yellow
fill-rect 20 140 80 40
color magenta
fill-rect 60 140 80 40
restore
";

const CLIP: &str = "\
clear white
save
clip-rect 20 20 160 160
clip-out-rect 70 70 60 60
color #1f77b4
fill-rect 0 0 200 200
restore
color black
line-width 2
stroke-rect 20 20 160 160
";

const TEXT: &str = "\
clear white
color black
font-size 24
text 20 50 retained canvas
align center
font-size 18
text 100 100 centered
translate 100 150
rotate -15
color #d62728
text 0 0 rotated
";

/// One parsed script line.
#[derive(Debug, Clone)]
pub enum SceneCommand {
    Color(Color),
    Gradient(Arc<Gradient>),
    LineWidth(f64),
    Opacity(f64),
    Blend(BlendMode),
    FontSize(f64),
    Align(TextAlign),
    Translate(f64, f64),
    Scale(f64, f64),
    /// Degrees, clockwise in y-down space.
    Rotate(f64),
    Save,
    Restore,
    Layer { alpha: u8, bounds: Option<Rect> },
    ClipRect(Rect),
    ClipOutRect(Rect),
    ClipPath(Path),
    Clear(Color),
    ClearRect(Rect, Color),
    FillRect(Rect),
    StrokeRect(Rect),
    FillCircle(Point, f64),
    StrokeCircle(Point, f64),
    Line(Point, Point),
    FillPath(Path),
    StrokePath(Path),
    Text(Point, String),
}

#[derive(Debug, Clone)]
pub struct Scene {
    viewport: Size,
    commands: Vec<SceneCommand>,
}

impl Scene {
    /// Resolve a built-in scene name, or read a script file.
    pub fn load(name_or_path: &str) -> Result<Self> {
        if let Some((_, _, source)) = BUILTIN_SCENES
            .iter()
            .find(|(name, _, _)| *name == name_or_path)
        {
            return Scene::parse(source)
                .with_context(|| format!("built-in scene {name_or_path} is invalid"));
        }
        let path = std::path::Path::new(name_or_path);
        if !path.is_file() {
            bail!("unknown scene '{name_or_path}': not a built-in scene or a readable file");
        }
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene file {}", path.display()))?;
        Scene::parse(&source).with_context(|| format!("invalid scene file {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        let mut scene = Scene {
            viewport: Size::new(DEFAULT_VIEWPORT, DEFAULT_VIEWPORT),
            commands: Vec::new(),
        };
        for (index, raw) in source.lines().enumerate() {
            let line = if raw.trim_start().starts_with('#') {
                ""
            } else {
                strip_comment(raw).trim()
            };
            if line.is_empty() {
                continue;
            }
            scene
                .parse_line(line)
                .with_context(|| format!("line {}: {}", index + 1, line))?;
        }
        Ok(scene)
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn commands(&self) -> &[SceneCommand] {
        &self.commands
    }

    fn parse_line(&mut self, line: &str) -> Result<()> {
        let mut tokens = Tokens::new(line);
        let keyword = tokens.word("command")?;
        let command = match keyword {
            "viewport" => {
                let width = tokens.number("width")?;
                let height = tokens.number("height")?;
                if !(width > 0.0 && height > 0.0) {
                    bail!("viewport must be positive, got {width}x{height}");
                }
                tokens.finish()?;
                self.viewport = Size::new(width, height);
                return Ok(());
            }
            "color" => SceneCommand::Color(tokens.color()?),
            "gradient" => {
                let start = tokens.point()?;
                let end = tokens.point()?;
                let mut gradient = Gradient::new_linear(start, end);
                gradient.add_color_stop(0.0, tokens.color()?)?;
                gradient.add_color_stop(1.0, tokens.color()?)?;
                SceneCommand::Gradient(Arc::new(gradient))
            }
            "line-width" => SceneCommand::LineWidth(tokens.number("line width")?),
            "opacity" => SceneCommand::Opacity(tokens.number("opacity")?),
            "blend" => SceneCommand::Blend(tokens.word("blend mode")?.parse()?),
            "font-size" => SceneCommand::FontSize(tokens.number("font size")?),
            "align" => SceneCommand::Align(match tokens.word("alignment")? {
                "left" | "start" => TextAlign::Left,
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                other => bail!("unknown alignment {other:?}"),
            }),
            "translate" => SceneCommand::Translate(tokens.number("dx")?, tokens.number("dy")?),
            "scale" => {
                let sx = tokens.number("sx")?;
                let sy = if tokens.is_empty() {
                    sx
                } else {
                    tokens.number("sy")?
                };
                SceneCommand::Scale(sx, sy)
            }
            "rotate" => SceneCommand::Rotate(tokens.number("angle")?),
            "save" => SceneCommand::Save,
            "restore" => SceneCommand::Restore,
            "layer" => {
                let alpha = tokens.number("alpha")?;
                if !(0.0..=255.0).contains(&alpha) {
                    bail!("layer alpha must be within 0..=255, got {alpha}");
                }
                let bounds = if tokens.is_empty() {
                    None
                } else {
                    Some(tokens.rect()?)
                };
                SceneCommand::Layer {
                    alpha: alpha.round() as u8,
                    bounds,
                }
            }
            "clip-rect" => SceneCommand::ClipRect(tokens.rect()?),
            "clip-out-rect" => SceneCommand::ClipOutRect(tokens.rect()?),
            "clip-path" => SceneCommand::ClipPath(tokens.path()?),
            "clear" => SceneCommand::Clear(tokens.color()?),
            "clear-rect" => SceneCommand::ClearRect(tokens.rect()?, tokens.color()?),
            "fill-rect" => SceneCommand::FillRect(tokens.rect()?),
            "stroke-rect" => SceneCommand::StrokeRect(tokens.rect()?),
            "fill-circle" => SceneCommand::FillCircle(tokens.point()?, tokens.number("radius")?),
            "stroke-circle" => {
                SceneCommand::StrokeCircle(tokens.point()?, tokens.number("radius")?)
            }
            "line" => SceneCommand::Line(tokens.point()?, tokens.point()?),
            "fill-path" => SceneCommand::FillPath(tokens.path()?),
            "stroke-path" => SceneCommand::StrokePath(tokens.path()?),
            "text" => {
                let origin = tokens.point()?;
                SceneCommand::Text(origin, tokens.remainder("text")?.to_string())
            }
            other => bail!("unknown command {other:?}"),
        };
        tokens.finish()?;
        self.commands.push(command);
        Ok(())
    }

    /// Replay the script onto `canvas` under its current matrix and clip.
    pub fn draw(&self, canvas: &mut Canvas) -> CanvasResult<()> {
        for command in &self.commands {
            apply(canvas, command)?;
        }
        Ok(())
    }
}

fn apply(canvas: &mut Canvas, command: &SceneCommand) -> CanvasResult<()> {
    match command {
        SceneCommand::Color(color) => canvas.paint_mut().set_color(*color),
        SceneCommand::Gradient(gradient) => canvas.paint_mut().set_gradient(gradient.clone()),
        SceneCommand::LineWidth(width) => canvas.paint_mut().set_stroke_width(*width),
        SceneCommand::Opacity(opacity) => canvas.paint_mut().set_opacity(*opacity),
        SceneCommand::Blend(mode) => canvas.paint_mut().set_blend_mode(*mode),
        SceneCommand::FontSize(size) => canvas.paint_mut().set_text_size(*size),
        SceneCommand::Align(align) => canvas.paint_mut().set_text_align(*align),
        SceneCommand::Translate(dx, dy) => canvas.translate(*dx, *dy),
        SceneCommand::Scale(sx, sy) => canvas.scale(*sx, *sy),
        SceneCommand::Rotate(degrees) => canvas.rotate(degrees.to_radians()),
        SceneCommand::Save => canvas.save(),
        SceneCommand::Restore => canvas.restore(),
        SceneCommand::Layer { alpha, bounds } => canvas.save_layer_alpha(*bounds, *alpha)?,
        SceneCommand::ClipRect(rect) => canvas.clip_rect(*rect, true)?,
        SceneCommand::ClipOutRect(rect) => canvas.clip_out_rect(*rect, true)?,
        SceneCommand::ClipPath(path) => canvas.clip_path(path, true)?,
        SceneCommand::Clear(color) => canvas.clear(*color)?,
        SceneCommand::ClearRect(rect, color) => canvas.clear_rect(*rect, *color)?,
        SceneCommand::FillRect(rect) => canvas.fill_rect(*rect)?,
        SceneCommand::StrokeRect(rect) => canvas.stroke_rect(*rect)?,
        SceneCommand::FillCircle(center, radius) => canvas.fill_circle(*center, *radius)?,
        SceneCommand::StrokeCircle(center, radius) => canvas.stroke_circle(*center, *radius)?,
        SceneCommand::Line(from, to) => {
            let paint = canvas.paint().clone().with_style(PaintStyle::Stroke);
            canvas.draw_line(*from, *to, &paint)?
        }
        SceneCommand::FillPath(path) => canvas.fill_path(path)?,
        SceneCommand::StrokePath(path) => canvas.stroke_path(path)?,
        SceneCommand::Text(origin, text) => canvas.fill_text(text, *origin)?,
    }
    Ok(())
}

/// `#` begins a comment only at the start of a word and when not followed
/// by a hex digit, so `#fff` stays a color.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'#' {
            continue;
        }
        let word_start = i == 0 || bytes[i - 1].is_ascii_whitespace();
        let hex_follows = bytes.get(i + 1).is_some_and(|c| c.is_ascii_hexdigit());
        if word_start && !hex_follows {
            return &line[..i];
        }
    }
    line
}

/// Whitespace-separated cursor over one script line.
struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn is_empty(&self) -> bool {
        self.rest.trim().is_empty()
    }

    fn word(&mut self, what: &str) -> Result<&'a str> {
        let s = self.rest.trim_start();
        if s.is_empty() {
            return Err(anyhow!("missing {what}"));
        }
        let end = s.find(char::is_whitespace).unwrap_or(s.len());
        let (word, rest) = s.split_at(end);
        self.rest = rest;
        Ok(word)
    }

    fn number(&mut self, what: &str) -> Result<f64> {
        let word = self.word(what)?;
        let value: f64 = word
            .parse()
            .with_context(|| format!("invalid {what} {word:?}"))?;
        if !value.is_finite() {
            bail!("{what} must be finite, got {word:?}");
        }
        Ok(value)
    }

    fn point(&mut self) -> Result<Point> {
        Ok(Point::new(self.number("x")?, self.number("y")?))
    }

    fn rect(&mut self) -> Result<Rect> {
        Ok(Rect::new(
            self.number("x")?,
            self.number("y")?,
            self.number("width")?,
            self.number("height")?,
        ))
    }

    fn color(&mut self) -> Result<Color> {
        Ok(Color::parse(self.word("color")?)?)
    }

    /// SVG path data up to the end of the line.
    fn path(&mut self) -> Result<Path> {
        let data = self.remainder("path data")?;
        Ok(Path::from_svg_path_data(data)?)
    }

    fn remainder(&mut self, what: &str) -> Result<&'a str> {
        let rest = self.rest.trim();
        self.rest = "";
        if rest.is_empty() {
            bail!("missing {what}");
        }
        Ok(rest)
    }

    fn finish(&self) -> Result<()> {
        if !self.is_empty() {
            bail!("unexpected trailing input {:?}", self.rest.trim());
        }
        Ok(())
    }
}
