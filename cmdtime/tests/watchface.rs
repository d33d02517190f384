use core::convert::Infallible;

use chrono::{NaiveDate, NaiveDateTime};
use cmdtime::{
    face::Section,
    message::{Dictionary, DictionaryWriter},
    weather::{KEY_CONDITIONS, KEY_TEMPERATURE},
    ClockStyle, Layout, Typist, Watchface, Weather,
};
use embedded_graphics::{
    pixelcolor::{Rgb565, RgbColor},
    prelude::*,
    primitives::{ContainsPoint, PointsIter, Rectangle},
};

const WIDTH: u32 = 240;
const HEIGHT: u32 = 240;

/// Frame buffer that remembers which pixels were written
struct Screen {
    pixels: Vec<Rgb565>,
    writes: Vec<Point>,
}

impl Screen {
    fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; (WIDTH * HEIGHT) as usize],
            writes: Vec::new(),
        }
    }

    fn lit_in(&self, area: Rectangle) -> usize {
        area.points()
            .filter(|p| self.pixels[(p.y as u32 * WIDTH + p.x as u32) as usize] != Rgb565::BLACK)
            .count()
    }

    fn lit_outside(&self, area: Rectangle) -> usize {
        self.bounding_box()
            .points()
            .filter(|p| !area.contains(*p))
            .filter(|p| self.pixels[(p.y as u32 * WIDTH + p.x as u32) as usize] != Rgb565::BLACK)
            .count()
    }
}

impl OriginDimensions for Screen {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for Screen {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if self.bounding_box().contains(point) {
                self.pixels[(point.y as u32 * WIDTH + point.x as u32) as usize] = color;
                self.writes.push(point);
            }
        }
        Ok(())
    }
}

fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(7, 3, 0)
        .unwrap()
}

fn weather_message(buf: &mut [u8], celsius: i32, conditions: &str) -> usize {
    let mut writer = DictionaryWriter::new(buf).unwrap();
    writer
        .push_int(KEY_TEMPERATURE, celsius)
        .unwrap()
        .push_cstr(KEY_CONDITIONS, conditions)
        .unwrap();
    writer.finish().len()
}

#[test]
fn first_tick_draws_time_and_date() {
    let layout = Layout::default();
    let mut face = Watchface::load(layout, ClockStyle::TwentyFourHour);
    let mut screen = Screen::new();

    face.tick(&morning());
    face.draw(&mut screen).unwrap();

    assert_eq!(face.value(Section::Time).text(), "07:03");
    for section in Section::ALL {
        assert!(screen.lit_in(layout.label_frame(section)) > 0);
    }
    assert!(screen.lit_in(layout.value_frame(Section::Time)) > 0);
    assert!(screen.lit_in(layout.value_frame(Section::Date)) > 0);
    assert_eq!(screen.lit_in(layout.value_frame(Section::Weather)), 0);
    assert!(!face.is_dirty());
}

#[test]
fn redraws_only_changed_layers() {
    let layout = Layout::default();
    let mut face = Watchface::load(layout, ClockStyle::TwentyFourHour);
    let mut screen = Screen::new();
    face.tick(&morning());
    face.draw(&mut screen).unwrap();

    screen.writes.clear();
    face.tick(&morning());
    face.draw(&mut screen).unwrap();
    assert!(screen.writes.is_empty());

    let mut buf = [0u8; 64];
    let len = weather_message(&mut buf, 11, "Overcast");
    let mut weather = Weather::new();
    let dict = Dictionary::parse(&buf[..len]).unwrap();
    assert_eq!(weather.apply_dictionary(&dict, |err| panic!("{:?}", err)), 2);
    face.set_weather(&weather.summary());
    assert_eq!(face.value(Section::Weather).text(), "Overcast, 11 °C");

    face.draw(&mut screen).unwrap();
    let frame = layout.value_frame(Section::Weather);
    assert!(!screen.writes.is_empty());
    assert!(screen.writes.iter().all(|p| frame.contains(*p)));
    assert!(screen.lit_in(frame) > 0);
}

#[test]
fn long_weather_text_stays_in_its_frame() {
    let layout = Layout::default();
    let mut face = Watchface::load(layout, ClockStyle::TwentyFourHour);
    let mut screen = Screen::new();

    face.set_weather("Freezing drizzle and patchy fog, -12 °C");
    face.draw(&mut screen).unwrap();

    let frame = layout.value_frame(Section::Weather);
    assert!(screen.lit_in(frame) > 0);
    assert_eq!(screen.lit_outside(frame), 0);
}

#[test]
fn typing_hides_outputs_until_revealed() {
    let layout = Layout::default();
    let mut face = Watchface::load(layout, ClockStyle::TwelveHour);
    let mut screen = Screen::new();
    face.tick(&morning());
    face.draw(&mut screen).unwrap();

    let mut typist = Typist::new();
    typist.start(&mut face);
    face.draw(&mut screen).unwrap();
    for section in Section::ALL {
        assert_eq!(screen.lit_in(layout.value_frame(section)), 0);
        // bare prompt is still visible
        assert!(screen.lit_in(layout.label_frame(section)) > 0);
    }

    while typist.step(&mut face).is_some() {
        face.draw(&mut screen).unwrap();
    }
    face.draw(&mut screen).unwrap();
    assert!(screen.lit_in(layout.value_frame(Section::Time)) > 0);
    assert!(screen.lit_in(layout.value_frame(Section::Date)) > 0);
}

#[test]
fn invalidate_redraws_everything() {
    let layout = Layout::default();
    let mut face = Watchface::load(layout, ClockStyle::TwentyFourHour);
    let mut screen = Screen::new();
    face.tick(&morning());
    face.draw(&mut screen).unwrap();

    face.invalidate();
    assert!(face.is_dirty());
    screen.writes.clear();
    face.draw(&mut screen).unwrap();
    for section in Section::ALL {
        let frame = layout.label_frame(section);
        assert!(screen.writes.iter().any(|p| frame.contains(*p)));
    }
}
