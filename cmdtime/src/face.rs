//! Watch face window and its text layers
//!
//! The face shows three shell prompts, each one a label line with the
//! command and a value line with its output:
//!
//! ```text
//! p:~$ time
//! 14:07
//! p:~$ date
//! 2026-10-19
//! p:~$ weather
//! Cloudy, 12 °C
//! ```

use chrono::NaiveDateTime;
use embedded_graphics::{
    draw_target::{DrawTarget, DrawTargetExt},
    geometry::{Point, Size},
    mono_font::{iso_8859_1::FONT_10X20, MonoFont, MonoTextStyle},
    pixelcolor::{Rgb565, RgbColor},
    primitives::Rectangle,
    text::{Baseline, Text},
    Drawable,
};

use crate::{
    clock::{format_date, format_time, ClockStyle},
    text::{format_truncated, push_truncated, LayerText},
};

/// Shell prompt in front of every command
pub const PROMPT: &str = "p:~$ ";

/// Placement and styling of the prompts
#[derive(Clone, Copy)]
pub struct Layout {
    /// Top left corner of the first label
    pub origin: Point,
    /// Width of every layer
    pub width: u32,
    /// Height of a single line
    pub line_height: u32,
    /// Space between the value of one section and the next label
    pub section_gap: u32,
    pub font: &'static MonoFont<'static>,
    pub text_color: Rgb565,
    pub background: Rgb565,
}

impl Default for Layout {
    /// Layout for the 240x240 PineTime display
    fn default() -> Self {
        Self {
            origin: Point::new(8, 8),
            width: 224,
            line_height: 24,
            section_gap: 16,
            // ISO 8859-1 so the degree sign renders
            font: &FONT_10X20,
            text_color: Rgb565::WHITE,
            background: Rgb565::BLACK,
        }
    }
}

impl Layout {
    fn section_top(&self, section: Section) -> i32 {
        let stride = 2 * self.line_height + self.section_gap;
        self.origin.y + (section.index() as u32 * stride) as i32
    }

    /// Frame of the command line of `section`
    pub fn label_frame(&self, section: Section) -> Rectangle {
        Rectangle::new(
            Point::new(self.origin.x, self.section_top(section)),
            Size::new(self.width, self.line_height),
        )
    }

    /// Frame of the output line of `section`
    pub fn value_frame(&self, section: Section) -> Rectangle {
        Rectangle::new(
            Point::new(
                self.origin.x,
                self.section_top(section) + self.line_height as i32,
            ),
            Size::new(self.width, self.line_height),
        )
    }
}

/// One prompt on the face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Section {
    Time,
    Date,
    Weather,
}

impl Section {
    /// Sections from top to bottom
    pub const ALL: [Section; 3] = [Section::Time, Section::Date, Section::Weather];

    /// Command shown after the prompt
    pub fn command(self) -> &'static str {
        match self {
            Section::Time => "time",
            Section::Date => "date",
            Section::Weather => "weather",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Section::Time => 0,
            Section::Date => 1,
            Section::Weather => 2,
        }
    }

    /// Full label line, e.g. `p:~$ time`
    pub fn label(self) -> LayerText {
        format_truncated(format_args!("{}{}", PROMPT, self.command()))
    }
}

/// Single line of text at a fixed position
#[derive(Debug, Clone)]
pub struct TextLayer {
    frame: Rectangle,
    text: LayerText,
    hidden: bool,
    /// Needs to be redrawn
    dirty: bool,
}

impl TextLayer {
    fn new(frame: Rectangle) -> Self {
        Self {
            frame,
            text: LayerText::new(),
            hidden: false,
            dirty: true,
        }
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the text; anything beyond the layer capacity is dropped.
    pub fn set_text(&mut self, text: &str) {
        let mut new = LayerText::new();
        push_truncated(&mut new, text);
        if new != self.text {
            self.text = new;
            self.dirty = true;
        }
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        if hidden != self.hidden {
            self.hidden = hidden;
            self.dirty = true;
        }
    }

    fn draw<D>(
        &mut self,
        target: &mut D,
        style: MonoTextStyle<'_, Rgb565>,
        background: Rgb565,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.fill_solid(&self.frame, background)?;
        if !self.hidden && !self.text.is_empty() {
            let mut clipped = target.clipped(&self.frame);
            Text::with_baseline(&self.text, self.frame.top_left, style, Baseline::Top)
                .draw(&mut clipped)?;
        }
        self.dirty = false;
        Ok(())
    }
}

/// Label and value layer of one section
#[derive(Debug, Clone)]
struct Prompt {
    label: TextLayer,
    value: TextLayer,
}

/// The watch face window
pub struct Watchface {
    layout: Layout,
    style: ClockStyle,
    prompts: [Prompt; 3],
    /// Last time shown, kept to reformat on style changes
    time: Option<NaiveDateTime>,
}

impl Watchface {
    /// Create all layers. Text starts out blank until the first tick.
    pub fn load(layout: Layout, style: ClockStyle) -> Self {
        let prompts = Section::ALL.map(|section| Prompt {
            label: TextLayer::new(layout.label_frame(section)),
            value: TextLayer::new(layout.value_frame(section)),
        });
        Self {
            layout,
            style,
            prompts,
            time: None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn clock_style(&self) -> ClockStyle {
        self.style
    }

    pub fn label(&self, section: Section) -> &TextLayer {
        &self.prompts[section.index()].label
    }

    pub fn value(&self, section: Section) -> &TextLayer {
        &self.prompts[section.index()].value
    }

    pub fn label_mut(&mut self, section: Section) -> &mut TextLayer {
        &mut self.prompts[section.index()].label
    }

    pub fn value_mut(&mut self, section: Section) -> &mut TextLayer {
        &mut self.prompts[section.index()].value
    }

    /// Minute tick: refresh time and date, then show every prompt.
    pub fn tick(&mut self, now: &NaiveDateTime) {
        self.set_time(now);
        self.show_prompts();
    }

    /// Update the time and date outputs without touching visibility.
    pub fn set_time(&mut self, now: &NaiveDateTime) {
        self.time = Some(*now);
        let time = format_time(now, self.style);
        let date = format_date(&now.date());
        self.value_mut(Section::Time).set_text(&time);
        self.value_mut(Section::Date).set_text(&date);
    }

    /// Full command on every label, every output visible
    pub fn show_prompts(&mut self) {
        for section in Section::ALL {
            self.label_mut(section).set_text(&section.label());
            self.value_mut(section).set_hidden(false);
        }
    }

    pub fn set_weather(&mut self, text: &str) {
        self.value_mut(Section::Weather).set_text(text);
    }

    /// Switch between 12 and 24 hour display, reformatting the shown time.
    pub fn set_clock_style(&mut self, style: ClockStyle) {
        self.style = style;
        if let Some(time) = self.time {
            let text = format_time(&time, style);
            self.value_mut(Section::Time).set_text(&text);
        }
    }

    /// Any layer waiting to be redrawn
    pub fn is_dirty(&self) -> bool {
        self.prompts
            .iter()
            .any(|prompt| prompt.label.dirty || prompt.value.dirty)
    }

    /// Force a full redraw
    pub fn invalidate(&mut self) {
        for prompt in self.prompts.iter_mut() {
            prompt.label.dirty = true;
            prompt.value.dirty = true;
        }
    }

    /// Redraw every dirty layer.
    pub fn draw<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let style = MonoTextStyle::new(self.layout.font, self.layout.text_color);
        let background = self.layout.background;
        for prompt in self.prompts.iter_mut() {
            for layer in [&mut prompt.label, &mut prompt.value] {
                if layer.dirty {
                    layer.draw(target, style, background)?;
                }
            }
        }
        Ok(())
    }
}
