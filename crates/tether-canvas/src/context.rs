//! Canvas 2D Context
//!
//! Records drawing calls into a [`DrawPacker`] and mirrors the property
//! state of the native context so writes that change nothing are skipped.

use tether_codec::{CodecError, CodecResult, Color, Font, Value};

use crate::{DrawPacker, DrawPacket, DrawPacketFormat};

/// Line cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
}

/// Text baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    Top,
    Hanging,
    Middle,
    #[default]
    Alphabetic,
    Ideographic,
    Bottom,
}

macro_rules! keyword_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            const NAMES: &'static [&'static str] = &[$($name),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }

            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($name => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

keyword_enum!(LineCap { Butt => "butt", Round => "round", Square => "square" });
keyword_enum!(LineJoin { Miter => "miter", Round => "round", Bevel => "bevel" });
keyword_enum!(TextAlign {
    Start => "start",
    End => "end",
    Left => "left",
    Right => "right",
    Center => "center",
});
keyword_enum!(TextBaseline {
    Top => "top",
    Hanging => "hanging",
    Middle => "middle",
    Alphabetic => "alphabetic",
    Ideographic => "ideographic",
    Bottom => "bottom",
});

/// Property state saved and restored as a whole
#[derive(Debug, Clone, PartialEq)]
pub struct ContextState {
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub fill_style: Color,
    pub stroke_style: Color,
    pub font: Font,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    pub global_alpha: f64,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.0,
            fill_style: Color::BLACK,
            stroke_style: Color::BLACK,
            font: Font {
                family: vec!["sans-serif".into()],
                ..Font::default()
            },
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
            global_alpha: 1.0,
        }
    }
}

/// 2D drawing context bound to one native drawing object
#[derive(Debug)]
pub struct Context2d {
    packer: DrawPacker,
    state: ContextState,
    saved: Vec<ContextState>,
}

fn invalid(property: &str, value: impl Into<Value>, reason: &str) -> CodecError {
    CodecError::new(&value.into(), reason).with_property(property)
}

fn keyword<T>(property: &str, name: &str, parse: fn(&str) -> Option<T>, names: &[&str]) -> CodecResult<T> {
    parse(name).ok_or_else(|| {
        let accepted: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
        invalid(property, name, &format!("accepted values are {}", accepted.join(", ")))
    })
}

impl Context2d {
    pub fn new(format: DrawPacketFormat) -> Self {
        Self {
            packer: DrawPacker::new(format),
            state: ContextState::default(),
            saved: Vec::new(),
        }
    }

    pub fn state(&self) -> &ContextState {
        &self.state
    }

    pub fn packer(&self) -> &DrawPacker {
        &self.packer
    }

    /// Take the calls recorded since the last flush
    pub fn flush(&mut self) -> Option<DrawPacket> {
        self.packer.flush()
    }

    fn op(&mut self, name: &str, doubles: &[f64]) {
        self.packer.add_operation(name);
        if !doubles.is_empty() {
            self.packer.add_double(doubles);
        }
    }

    // State stack

    /// Snapshot the full property state
    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
        self.op("save", &[]);
    }

    /// Pop the latest snapshot; no-op when nothing was saved
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
            self.op("restore", &[]);
        }
    }

    // Properties

    pub fn set_line_width(&mut self, width: f64) -> CodecResult<()> {
        if !width.is_finite() || width <= 0.0 {
            return Err(invalid("lineWidth", width, "must be a positive number"));
        }
        if self.state.line_width != width {
            self.state.line_width = width;
            self.op("lineWidth", &[width]);
        }
        Ok(())
    }

    pub fn set_line_cap(&mut self, name: &str) -> CodecResult<()> {
        let cap = keyword("lineCap", name, LineCap::parse, LineCap::NAMES)?;
        if self.state.line_cap != cap {
            self.state.line_cap = cap;
            self.packer.add_operation("lineCap");
            self.packer.add_string(&[cap.as_str()]);
        }
        Ok(())
    }

    pub fn set_line_join(&mut self, name: &str) -> CodecResult<()> {
        let join = keyword("lineJoin", name, LineJoin::parse, LineJoin::NAMES)?;
        if self.state.line_join != join {
            self.state.line_join = join;
            self.packer.add_operation("lineJoin");
            self.packer.add_string(&[join.as_str()]);
        }
        Ok(())
    }

    pub fn set_miter_limit(&mut self, limit: f64) -> CodecResult<()> {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(invalid("miterLimit", limit, "must be a positive number"));
        }
        if self.state.miter_limit != limit {
            self.state.miter_limit = limit;
            self.op("miterLimit", &[limit]);
        }
        Ok(())
    }

    pub fn set_fill_style(&mut self, color: &str) -> CodecResult<()> {
        let color = Color::parse(color).ok_or_else(|| invalid("fillStyle", color, "invalid color"))?;
        if self.state.fill_style != color {
            self.state.fill_style = color;
            self.packer.add_operation("fillStyle");
            self.packer.add_int(&[color.r.into(), color.g.into(), color.b.into(), color.a.into()]);
        }
        Ok(())
    }

    pub fn set_stroke_style(&mut self, color: &str) -> CodecResult<()> {
        let color = Color::parse(color).ok_or_else(|| invalid("strokeStyle", color, "invalid color"))?;
        if self.state.stroke_style != color {
            self.state.stroke_style = color;
            self.packer.add_operation("strokeStyle");
            self.packer.add_int(&[color.r.into(), color.g.into(), color.b.into(), color.a.into()]);
        }
        Ok(())
    }

    pub fn set_font(&mut self, font: &str) -> CodecResult<()> {
        let font = Font::parse(font).ok_or_else(|| invalid("font", font, "invalid font"))?;
        if self.state.font != font {
            let css = font.to_css();
            self.state.font = font;
            self.packer.add_operation("font");
            self.packer.add_string(&[css.as_str()]);
        }
        Ok(())
    }

    pub fn set_text_align(&mut self, name: &str) -> CodecResult<()> {
        let align = keyword("textAlign", name, TextAlign::parse, TextAlign::NAMES)?;
        if self.state.text_align != align {
            self.state.text_align = align;
            self.packer.add_operation("textAlign");
            self.packer.add_string(&[align.as_str()]);
        }
        Ok(())
    }

    pub fn set_text_baseline(&mut self, name: &str) -> CodecResult<()> {
        let baseline = keyword("textBaseline", name, TextBaseline::parse, TextBaseline::NAMES)?;
        if self.state.text_baseline != baseline {
            self.state.text_baseline = baseline;
            self.packer.add_operation("textBaseline");
            self.packer.add_string(&[baseline.as_str()]);
        }
        Ok(())
    }

    pub fn set_global_alpha(&mut self, alpha: f64) -> CodecResult<()> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(invalid("globalAlpha", alpha, "must be between 0 and 1"));
        }
        if self.state.global_alpha != alpha {
            self.state.global_alpha = alpha;
            self.op("globalAlpha", &[alpha]);
        }
        Ok(())
    }

    // Paths

    pub fn begin_path(&mut self) {
        self.op("beginPath", &[]);
    }

    pub fn close_path(&mut self) {
        self.op("closePath", &[]);
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.op("moveTo", &[x, y]);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.op("lineTo", &[x, y]);
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.op("rect", &[x, y, width, height]);
    }

    pub fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.op("arc", &[x, y, radius, start, end]);
        self.packer.add_boolean(&[anticlockwise]);
    }

    pub fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.op("quadraticCurveTo", &[cpx, cpy, x, y]);
    }

    pub fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.op("bezierCurveTo", &[cp1x, cp1y, cp2x, cp2y, x, y]);
    }

    pub fn fill(&mut self) {
        self.op("fill", &[]);
    }

    pub fn stroke(&mut self) {
        self.op("stroke", &[]);
    }

    // Rectangles

    pub fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.op("clearRect", &[x, y, width, height]);
    }

    /// Expands to `beginPath`, `rect`, `fill`
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.begin_path();
        self.rect(x, y, width, height);
        self.fill();
    }

    /// Expands to `beginPath`, `rect`, `stroke`
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.begin_path();
        self.rect(x, y, width, height);
        self.stroke();
    }

    // Text

    pub fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.packer.add_operation("fillText");
        self.packer.add_string(&[text]);
        self.packer.add_double(&[x, y]);
    }

    pub fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.packer.add_operation("strokeText");
        self.packer.add_string(&[text]);
        self.packer.add_double(&[x, y]);
    }

    // Transforms

    pub fn scale(&mut self, x: f64, y: f64) {
        self.op("scale", &[x, y]);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.op("rotate", &[angle]);
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.op("translate", &[x, y]);
    }

    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.op("transform", &[a, b, c, d, e, f]);
    }

    pub fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.op("setTransform", &[a, b, c, d, e, f]);
    }

    // Images

    /// Draw an image by source id
    ///
    /// `coords` is `[dx, dy]`, `[dx, dy, dw, dh]` or the full nine-argument
    /// source/destination form without the image.
    pub fn draw_image(&mut self, image: &str, coords: &[f64]) -> CodecResult<()> {
        if image.is_empty() {
            return Err(invalid("image", image, "must not be empty"));
        }
        if !matches!(coords.len(), 2 | 4 | 8) {
            let value = Value::Array(coords.iter().map(|c| Value::from(*c)).collect());
            return Err(CodecError::new(&value, "expected 2, 4 or 8 coordinates").with_property("drawImage"));
        }
        self.packer.add_operation("drawImage");
        self.packer.add_string(&[image]);
        self.packer.add_double(coords);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(packet: DrawPacket) -> (Vec<String>, Vec<u32>, Vec<f64>, Vec<String>) {
        match packet {
            DrawPacket::Tables { new_opcodes, sequence, doubles, strings, .. } => {
                (new_opcodes, sequence, doubles, strings)
            }
            DrawPacket::Nested(_) => panic!("expected tables"),
        }
    }

    #[test]
    fn test_fill_rect_expands() {
        let mut ctx = Context2d::new(DrawPacketFormat::ParallelTables);
        ctx.fill_rect(10.0, 20.0, 30.0, 40.0);
        let (names, sequence, doubles, _) = tables(ctx.flush().unwrap());
        assert_eq!(names, vec!["beginPath", "rect", "fill"]);
        assert_eq!(sequence, vec![0, 1, 2]);
        assert_eq!(doubles, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_unchanged_property_emits_nothing() {
        let mut ctx = Context2d::new(DrawPacketFormat::ParallelTables);
        ctx.set_line_width(1.0).unwrap();
        ctx.set_fill_style("#000").unwrap();
        ctx.set_text_align("start").unwrap();
        assert!(ctx.flush().is_none());

        ctx.set_line_width(3.0).unwrap();
        ctx.set_line_width(3.0).unwrap();
        let (names, _, doubles, _) = tables(ctx.flush().unwrap());
        assert_eq!(names, vec!["lineWidth"]);
        assert_eq!(doubles, vec![3.0]);
    }

    #[test]
    fn test_invalid_properties_rejected() {
        let mut ctx = Context2d::new(DrawPacketFormat::ParallelTables);
        assert!(ctx.set_line_width(-1.0).is_err());
        assert!(ctx.set_global_alpha(1.5).is_err());
        assert!(ctx.set_fill_style("nope").is_err());
        let err = ctx.set_line_cap("flat").unwrap_err();
        assert_eq!(err.property.as_deref(), Some("lineCap"));
        assert_eq!(err.reason, "accepted values are \"butt\", \"round\", \"square\"");
        assert!(ctx.flush().is_none());
    }

    #[test]
    fn test_save_restore_stack() {
        let mut ctx = Context2d::new(DrawPacketFormat::ParallelTables);
        ctx.restore();
        assert!(ctx.flush().is_none());

        ctx.set_global_alpha(0.5).unwrap();
        ctx.save();
        ctx.set_global_alpha(0.25).unwrap();
        ctx.set_font("bold 14px serif").unwrap();
        ctx.restore();
        assert_eq!(ctx.state().global_alpha, 0.5);
        assert_eq!(ctx.state().font, ContextState::default().font);

        // Restored value matches, so this write is a no-op.
        ctx.set_global_alpha(0.5).unwrap();
        let (names, sequence, _, strings) = tables(ctx.flush().unwrap());
        assert_eq!(names, vec!["globalAlpha", "save", "font", "restore"]);
        assert_eq!(sequence, vec![0, 1, 0, 2, 3]);
        assert_eq!(strings, vec!["bold 14px serif"]);
    }

    #[test]
    fn test_draw_image_arity() {
        let mut ctx = Context2d::new(DrawPacketFormat::NestedArrays);
        assert!(ctx.draw_image("$4", &[1.0]).is_err());
        ctx.draw_image("$4", &[0.0, 0.0, 10.0, 10.0]).unwrap();
        let packet = ctx.flush().unwrap();
        assert_eq!(packet.operations(&[]), vec!["drawImage"]);
    }
}
