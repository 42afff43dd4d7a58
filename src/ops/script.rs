// ============================================================================
// DRAWING SCRIPTS — one command per line, replayed against a DrawingApp
// ============================================================================
//
//   canvas 800 600
//   layer add
//   brush color #ff0000
//   brush size 10
//   stroke brush 100,100 200,100
//   fill 5,5
//
// Blank lines and `#` comments are ignored. Layer indices are 0-based
// (bottom layer = 0), matching the JSON report.

use crate::app::DrawingApp;
use crate::canvas::Point;
use crate::components::colors::parse_hex_color;
use crate::components::tools::{BrushShape, Tool};
use crate::error::{CanvasError, CanvasResult};
use crate::io::load_brush_image;
use image::Rgb;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Canvas { width: u32, height: u32 },
    LayerAdd,
    LayerDuplicate,
    LayerDelete,
    LayerSelect(usize),
    LayerToggle(usize),
    Clear,
    ClearAll,
    BrushColor(Rgb<u8>),
    BrushSize(f32),
    BrushOpacity(f32),
    BrushShape(BrushShape),
    BrushImage(PathBuf),
    EraserSize(f32),
    EraserHardness(u32),
    EraserOpacity(f32),
    FillColor(Rgb<u8>),
    FillTolerance(u8),
    Stroke { tool: Tool, points: Vec<Point> },
    Fill(Point),
}

/// A parsed command with its 1-based source line.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

pub fn parse_script(source: &str) -> CanvasResult<Vec<ScriptLine>> {
    let mut out = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let words = strip_comment(raw.split_whitespace().collect());
        if words.is_empty() {
            continue;
        }
        let command = parse_command(&words).map_err(|msg| CanvasError::script(line, msg))?;
        out.push(ScriptLine { line, command });
    }
    Ok(out)
}

/// Drop everything from the first word starting with `#`, except the colour
/// argument of `brush color` / `fill color`.
fn strip_comment(mut words: Vec<&str>) -> Vec<&str> {
    let colour_slot = matches!(words.as_slice(), [_, "color", ..]).then_some(2);
    let end = words
        .iter()
        .enumerate()
        .position(|(i, w)| w.starts_with('#') && Some(i) != colour_slot)
        .unwrap_or(words.len());
    words.truncate(end);
    words
}

fn parse_command(words: &[&str]) -> Result<Command, String> {
    let cmd = match words {
        ["canvas", w, h] => Command::Canvas {
            width: number(w)?,
            height: number(h)?,
        },
        ["layer", "add"] => Command::LayerAdd,
        ["layer", "duplicate"] => Command::LayerDuplicate,
        ["layer", "delete"] => Command::LayerDelete,
        ["layer", "select", n] => Command::LayerSelect(number(n)?),
        ["layer", "toggle", n] => Command::LayerToggle(number(n)?),
        ["clear"] => Command::Clear,
        ["clear", "all"] => Command::ClearAll,
        ["brush", "color", c] => Command::BrushColor(colour(c)?),
        ["brush", "size", v] => Command::BrushSize(number(v)?),
        ["brush", "opacity", v] => Command::BrushOpacity(number(v)?),
        ["brush", "shape", s] => Command::BrushShape(
            BrushShape::from_name(s).ok_or_else(|| format!("unknown brush shape '{s}'"))?,
        ),
        ["brush", "image", rest @ ..] if !rest.is_empty() => {
            Command::BrushImage(PathBuf::from(rest.join(" ")))
        }
        ["eraser", "size", v] => Command::EraserSize(number(v)?),
        ["eraser", "hardness", v] => Command::EraserHardness(number(v)?),
        ["eraser", "opacity", v] => Command::EraserOpacity(number(v)?),
        ["fill", "color", c] => Command::FillColor(colour(c)?),
        ["fill", "tolerance", v] => Command::FillTolerance(number(v)?),
        ["fill", p] => Command::Fill(point(p)?),
        ["stroke", tool, pts @ ..] if !pts.is_empty() => {
            let tool = match Tool::from_name(tool) {
                Some(t @ (Tool::Brush | Tool::Eraser)) => t,
                _ => return Err(format!("cannot stroke with '{tool}'")),
            };
            let points = pts.iter().map(|p| point(p)).collect::<Result<Vec<_>, _>>()?;
            Command::Stroke { tool, points }
        }
        _ => return Err(format!("unrecognised command '{}'", words.join(" "))),
    };
    Ok(cmd)
}

fn number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse::<T>().map_err(|_| format!("invalid number '{s}'"))
}

fn colour(s: &str) -> Result<Rgb<u8>, String> {
    parse_hex_color(s).ok_or_else(|| format!("invalid colour '{s}'"))
}

fn point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let x: f32 = number(x.trim())?;
    let y: f32 = number(y.trim())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("non-finite point '{s}'"));
    }
    Ok(Point::new(x, y))
}

/// Replay parsed commands in order. The first failure stops the run and is
/// reported with its line number. Relative brush image paths resolve
/// against `base_dir` when given.
pub fn run_script(
    app: &mut DrawingApp,
    script: &[ScriptLine],
    base_dir: Option<&Path>,
) -> CanvasResult<()> {
    for entry in script {
        run_command(app, &entry.command, base_dir)
            .map_err(|e| match e {
                CanvasError::Script { .. } => e,
                other => CanvasError::script(entry.line, other.to_string()),
            })?;
    }
    crate::log_info!("Replayed {} script commands", script.len());
    Ok(())
}

fn run_command(
    app: &mut DrawingApp,
    command: &Command,
    base_dir: Option<&Path>,
) -> CanvasResult<()> {
    match command {
        Command::Canvas { width, height } => app.initialize_canvas(*width, *height)?,
        Command::LayerAdd => {
            app.add_layer()?;
        }
        Command::LayerDuplicate => {
            app.duplicate_active_layer();
        }
        Command::LayerDelete => app.delete_active_layer()?,
        Command::LayerSelect(i) => app.set_active_layer(*i)?,
        Command::LayerToggle(i) => {
            app.toggle_layer_visibility(*i)?;
        }
        Command::Clear => app.clear_active_layer(),
        Command::ClearAll => app.clear_all_layers(),
        Command::BrushColor(c) => app.set_brush_color(*c),
        Command::BrushSize(v) => app.set_brush_size(*v),
        Command::BrushOpacity(v) => app.set_brush_opacity(*v),
        Command::BrushShape(s) => app.set_brush_shape(s.clone()),
        Command::BrushImage(path) => {
            let path = match base_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path.clone(),
            };
            app.set_custom_brush(load_brush_image(&path)?);
        }
        Command::EraserSize(v) => app.set_eraser_size(*v),
        Command::EraserHardness(v) => app.set_eraser_hardness(*v),
        Command::EraserOpacity(v) => app.set_eraser_opacity(*v),
        Command::FillColor(c) => app.set_fill_color(*c),
        Command::FillTolerance(v) => app.set_fill_tolerance(*v),
        Command::Stroke { tool, points } => {
            let Some((first, rest)) = points.split_first() else {
                return Ok(());
            };
            app.stroke_begin(*tool, *first);
            for p in rest {
                app.stroke_move(*tool, *p);
            }
            app.stroke_end(*tool);
        }
        Command::Fill(p) => {
            let config = app.fill_config().clone();
            app.fill_at(*p, &config);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn parses_commands_and_skips_comments() {
        let script = parse_script(
            "# header\n\
             \n\
             canvas 100 80   # trailing comment\n\
             brush color #f00\n\
             fill color #00ff00\n\
             stroke brush 1,2 3.5,4\n\
             layer select 0\n",
        )
        .unwrap();
        let cmds: Vec<_> = script.iter().map(|s| (s.line, s.command.clone())).collect();
        assert_eq!(cmds[0], (3, Command::Canvas { width: 100, height: 80 }));
        assert_eq!(cmds[1].1, Command::BrushColor(Rgb([255, 0, 0])));
        assert_eq!(cmds[2].1, Command::FillColor(Rgb([0, 255, 0])));
        assert_eq!(
            cmds[3].1,
            Command::Stroke {
                tool: Tool::Brush,
                points: vec![Point::new(1.0, 2.0), Point::new(3.5, 4.0)]
            }
        );
        assert_eq!(cmds[4], (7, Command::LayerSelect(0)));
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_script("layer add\nbrush size big\n").unwrap_err();
        assert!(matches!(err, CanvasError::Script { line: 2, .. }));

        let err = parse_script("\n\nstroke fill 1,1\n").unwrap_err();
        assert!(matches!(err, CanvasError::Script { line: 3, .. }));

        assert!(parse_script("paint everything").is_err());
        assert!(parse_script("fill 3;4").is_err());
    }

    #[test]
    fn runtime_failures_are_reported_with_line() {
        let mut app = DrawingApp::new().unwrap();
        let script = parse_script("layer add\nlayer delete\nlayer delete\n").unwrap();
        let err = run_script(&mut app, &script, None).unwrap_err();
        assert!(matches!(err, CanvasError::Script { line: 3, .. }), "{err}");
        assert_eq!(app.layers().len(), 1);
    }

    #[test]
    fn replays_a_small_drawing() {
        let mut app = DrawingApp::new().unwrap();
        let script = parse_script(
            "canvas 120 90\n\
             fill color #0000ff\n\
             fill 1,1\n\
             layer add\n\
             brush color #ff0000\n\
             brush size 6\n\
             stroke brush 10,40 100,40\n\
             eraser size 6\n\
             stroke eraser 50,30 50,50\n",
        )
        .unwrap();
        run_script(&mut app, &script, None).unwrap();

        assert_eq!((app.width(), app.height()), (120, 90));
        assert_eq!(app.layers().len(), 2);
        let c = app.composite();
        assert_eq!(c.get_pixel(20, 40), Some(Rgba([255, 0, 0, 255])));
        // Erased on the top layer: the blue bottom layer shows through.
        assert_eq!(c.get_pixel(50, 40), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(c.get_pixel(5, 80), Some(Rgba([0, 0, 255, 255])));
    }
}
