//! Weather pushed by the companion app

use core::fmt::Write;

use heapless::String;

use crate::{
    message::{self, Dictionary, DictionaryWriter, Tuple},
    text::{format_truncated, push_truncated, LayerText, Truncating},
};

/// Temperature in degrees Celsius (integer)
pub const KEY_TEMPERATURE: u32 = 0;
/// Current conditions (C string)
pub const KEY_CONDITIONS: u32 = 1;
/// Sent to the companion to ask for fresh weather
pub const KEY_REQUEST: u32 = 2;

pub const TEMPERATURE_LEN: usize = 8;
pub const CONDITIONS_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Tuple key is not a weather key
    UnrecognizedKey(u32),
    /// Known key with a value of the wrong type
    UnexpectedType { key: u32 },
    /// The message itself could not be decoded
    Message(message::Error),
}

impl From<message::Error> for Error {
    fn from(err: message::Error) -> Self {
        Self::Message(err)
    }
}

/// Last known weather
#[derive(Debug, Clone, Default)]
pub struct Weather {
    temperature: String<TEMPERATURE_LEN>,
    conditions: String<CONDITIONS_LEN>,
}

impl Weather {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatted temperature, e.g. `12 °C`
    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    pub fn conditions(&self) -> &str {
        &self.conditions
    }

    /// No weather received yet
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty() && self.conditions.is_empty()
    }

    /// Store a single tuple. Fields not carried by the tuple keep their value.
    pub fn apply(&mut self, tuple: &Tuple<'_>) -> Result<(), Error> {
        match tuple.key {
            KEY_TEMPERATURE => {
                let celsius = tuple
                    .value
                    .as_i64()
                    .ok_or(Error::UnexpectedType { key: tuple.key })?;
                self.temperature = format_truncated(format_args!("{} °C", celsius));
            }
            KEY_CONDITIONS => {
                let text = tuple
                    .value
                    .as_str()
                    .ok_or(Error::UnexpectedType { key: tuple.key })?;
                self.conditions.clear();
                push_truncated(&mut self.conditions, text);
            }
            key => return Err(Error::UnrecognizedKey(key)),
        }
        Ok(())
    }

    /// Apply every tuple of a message.
    ///
    /// Rejected tuples are handed to `on_error` and skipped. Decoding stops at
    /// the first malformed tuple. Returns the number of tuples stored.
    pub fn apply_dictionary(
        &mut self,
        dict: &Dictionary<'_>,
        mut on_error: impl FnMut(Error),
    ) -> usize {
        let mut applied = 0;
        for tuple in dict.iter() {
            match tuple {
                Ok(tuple) => match self.apply(&tuple) {
                    Ok(()) => applied += 1,
                    Err(err) => on_error(err),
                },
                Err(err) => {
                    on_error(err.into());
                    break;
                }
            }
        }
        applied
    }

    /// Text for the weather line: `"<conditions>, <temperature>"`
    pub fn summary(&self) -> LayerText {
        let mut text = LayerText::new();
        let _ = write!(
            Truncating::new(&mut text),
            "{}, {}",
            self.conditions,
            self.temperature
        );
        text
    }
}

/// Encode the request asking the companion for fresh weather.
pub fn weather_request(buf: &mut [u8]) -> Result<&[u8], message::Error> {
    let mut writer = DictionaryWriter::new(buf)?;
    writer.push_uint(KEY_REQUEST, 1)?;
    Ok(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TupleValue;

    fn tuple(key: u32, value: TupleValue<'_>) -> Tuple<'_> {
        Tuple { key, value }
    }

    #[test]
    fn formats_summary() {
        let mut weather = Weather::new();
        weather.apply(&tuple(KEY_TEMPERATURE, TupleValue::Int(-4))).unwrap();
        weather
            .apply(&tuple(KEY_CONDITIONS, TupleValue::CStr("Snow")))
            .unwrap();
        assert_eq!(weather.summary().as_str(), "Snow, -4 °C");
    }

    #[test]
    fn partial_update_keeps_other_field() {
        let mut weather = Weather::new();
        weather.apply(&tuple(KEY_TEMPERATURE, TupleValue::UInt(21))).unwrap();
        weather
            .apply(&tuple(KEY_CONDITIONS, TupleValue::CStr("Clear")))
            .unwrap();
        weather.apply(&tuple(KEY_TEMPERATURE, TupleValue::Int(19))).unwrap();
        assert_eq!(weather.summary().as_str(), "Clear, 19 °C");
    }

    #[test]
    fn summary_before_any_message() {
        let weather = Weather::new();
        assert!(weather.is_empty());
        assert_eq!(weather.summary().as_str(), ", ");
    }

    #[test]
    fn unknown_key_is_rejected_without_changes() {
        let mut weather = Weather::new();
        assert_eq!(
            weather.apply(&tuple(42, TupleValue::Int(1))),
            Err(Error::UnrecognizedKey(42))
        );
        assert!(weather.is_empty());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut weather = Weather::new();
        assert_eq!(
            weather.apply(&tuple(KEY_CONDITIONS, TupleValue::Int(1))),
            Err(Error::UnexpectedType {
                key: KEY_CONDITIONS
            })
        );
    }

    #[test]
    fn long_conditions_are_cut() {
        let mut weather = Weather::new();
        weather
            .apply(&tuple(
                KEY_CONDITIONS,
                TupleValue::CStr("Thunderstorm with heavy rain and hail"),
            ))
            .unwrap();
        assert_eq!(weather.conditions().len(), CONDITIONS_LEN);
        weather.apply(&tuple(KEY_TEMPERATURE, TupleValue::Int(3))).unwrap();
        assert_eq!(
            weather.summary().as_str(),
            "Thunderstorm with heavy rain and"
        );
    }

    #[test]
    fn applies_dictionary_and_reports_unknown_keys() {
        let mut buf = [0u8; 64];
        let mut writer = DictionaryWriter::new(&mut buf).unwrap();
        writer
            .push_int(KEY_TEMPERATURE, 7)
            .unwrap()
            .push_uint(9, 1)
            .unwrap()
            .push_cstr(KEY_CONDITIONS, "Rain")
            .unwrap();
        let bytes = writer.finish();

        let mut weather = Weather::new();
        let mut errors = std::vec::Vec::new();
        let dict = Dictionary::parse(bytes).unwrap();
        let applied = weather.apply_dictionary(&dict, |err| errors.push(err));

        assert_eq!(applied, 2);
        assert_eq!(errors, [Error::UnrecognizedKey(9)]);
        assert_eq!(weather.summary().as_str(), "Rain, 7 °C");
    }

    #[test]
    fn stops_on_malformed_tuple() {
        // Temperature tuple followed by a truncated header
        let bytes = [2, 0, 0, 0, 0, 3, 1, 0, 5, 1, 0];
        let mut weather = Weather::new();
        let mut errors = std::vec::Vec::new();
        let dict = Dictionary::parse(&bytes).unwrap();
        let applied = weather.apply_dictionary(&dict, |err| errors.push(err));

        assert_eq!(applied, 1);
        assert_eq!(errors, [Error::Message(message::Error::Truncated)]);
        assert_eq!(weather.temperature(), "5 °C");
    }

    #[test]
    fn encodes_weather_request() {
        let mut buf = [0u8; 16];
        let request = weather_request(&mut buf).unwrap();
        let dict = Dictionary::parse(request).unwrap();
        let tuple = dict.find(KEY_REQUEST).unwrap().unwrap();
        assert_eq!(tuple.value, TupleValue::UInt(1));
    }
}
