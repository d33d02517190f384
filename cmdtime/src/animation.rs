//! Typed prompt animation
//!
//! On every minute the commands are "typed" one character at a time. Once a
//! command is complete its output appears after a short pause, then the next
//! prompt starts.

use core::time::Duration;

use crate::{
    face::{Section, Watchface, PROMPT},
    text::{format_truncated, LayerText},
};

/// Delay between two typed characters
pub const TYPE_DELAY: Duration = Duration::from_millis(200);
/// Delay between a complete command and its output
pub const PROMPT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    /// `typed` characters of the command of `Section::ALL[section]` are shown
    Typing { section: usize, typed: usize },
}

/// Drives the typing animation of a [`Watchface`]
#[derive(Debug)]
pub struct Typist {
    stage: Stage,
}

impl Default for Typist {
    fn default() -> Self {
        Self::new()
    }
}

impl Typist {
    pub const fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    pub fn is_running(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// Clear the commands and hide all outputs. Returns the delay until the
    /// first [`Typist::step`]. Restarts from the top if already running.
    pub fn start(&mut self, face: &mut Watchface) -> Duration {
        for section in Section::ALL {
            face.label_mut(section).set_text(PROMPT);
            face.value_mut(section).set_hidden(true);
        }
        self.stage = Stage::Typing {
            section: 0,
            typed: 0,
        };
        TYPE_DELAY
    }

    /// Advance by one step. Returns the delay until the next step, or `None`
    /// once every output is shown.
    pub fn step(&mut self, face: &mut Watchface) -> Option<Duration> {
        let Stage::Typing { section, typed } = self.stage else {
            return None;
        };
        let current = Section::ALL[section];
        let command = current.command();

        if typed < command.len() {
            let typed = typed + 1;
            let label: LayerText =
                format_truncated(format_args!("{}{}", PROMPT, &command[..typed]));
            face.label_mut(current).set_text(&label);
            self.stage = Stage::Typing { section, typed };
            return Some(if typed == command.len() {
                PROMPT_DELAY
            } else {
                TYPE_DELAY
            });
        }

        face.value_mut(current).set_hidden(false);
        if section + 1 < Section::ALL.len() {
            self.stage = Stage::Typing {
                section: section + 1,
                typed: 0,
            };
            Some(TYPE_DELAY)
        } else {
            self.stage = Stage::Idle;
            None
        }
    }

    /// Jump to the end state with all prompts shown.
    pub fn finish(&mut self, face: &mut Watchface) {
        face.show_prompts();
        self.stage = Stage::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ClockStyle, face::Layout};
    use chrono::NaiveDate;

    fn ticked_face() -> Watchface {
        let mut face = Watchface::load(Layout::default(), ClockStyle::TwentyFourHour);
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 41, 0)
            .unwrap();
        face.tick(&now);
        face
    }

    #[test]
    fn start_blanks_commands_and_hides_outputs() {
        let mut face = ticked_face();
        let mut typist = Typist::new();
        assert_eq!(typist.start(&mut face), TYPE_DELAY);
        assert!(typist.is_running());
        for section in Section::ALL {
            assert_eq!(face.label(section).text(), "p:~$ ");
            assert!(face.value(section).is_hidden());
        }
        // hidden outputs keep their text
        assert_eq!(face.value(Section::Time).text(), "09:41");
    }

    #[test]
    fn types_first_command() {
        let mut face = ticked_face();
        let mut typist = Typist::new();
        typist.start(&mut face);

        assert_eq!(typist.step(&mut face), Some(TYPE_DELAY));
        assert_eq!(face.label(Section::Time).text(), "p:~$ t");
        typist.step(&mut face);
        typist.step(&mut face);
        assert_eq!(typist.step(&mut face), Some(PROMPT_DELAY));
        assert_eq!(face.label(Section::Time).text(), "p:~$ time");
        assert!(face.value(Section::Time).is_hidden());

        assert_eq!(typist.step(&mut face), Some(TYPE_DELAY));
        assert!(!face.value(Section::Time).is_hidden());
        assert!(face.value(Section::Date).is_hidden());
    }

    #[test]
    fn runs_to_completion() {
        let mut face = ticked_face();
        let mut typist = Typist::new();
        let mut total = typist.start(&mut face);
        let mut steps = 0;
        while let Some(delay) = typist.step(&mut face) {
            total += delay;
            steps += 1;
        }
        // "time" + "date" + "weather" characters, plus one reveal per section
        // of which the last one ends the run
        assert_eq!(steps, 4 + 4 + 7 + 2);
        assert_eq!(total, Duration::from_millis(200 * 15 + 1000 * 3));
        assert!(!typist.is_running());
        for section in Section::ALL {
            assert_eq!(face.label(section).text(), section.label().as_str());
            assert!(!face.value(section).is_hidden());
        }
        assert_eq!(typist.step(&mut face), None);
    }

    #[test]
    fn restart_begins_with_first_section() {
        let mut face = ticked_face();
        let mut typist = Typist::new();
        typist.start(&mut face);
        // all of "time", its output, then "da"
        for _ in 0..7 {
            typist.step(&mut face);
        }
        assert_eq!(face.label(Section::Date).text(), "p:~$ da");
        assert!(!face.value(Section::Time).is_hidden());

        assert_eq!(typist.start(&mut face), TYPE_DELAY);
        for section in Section::ALL {
            assert_eq!(face.label(section).text(), "p:~$ ");
            assert!(face.value(section).is_hidden());
        }
        typist.step(&mut face);
        assert_eq!(face.label(Section::Time).text(), "p:~$ t");
        assert_eq!(face.label(Section::Date).text(), "p:~$ ");
    }

    #[test]
    fn finish_shows_everything() {
        let mut face = ticked_face();
        let mut typist = Typist::new();
        typist.start(&mut face);
        typist.step(&mut face);
        typist.finish(&mut face);
        assert!(!typist.is_running());
        assert_eq!(face.label(Section::Weather).text(), "p:~$ weather");
        assert!(!face.value(Section::Weather).is_hidden());
    }
}
