use std::fmt;

use super::attribute::{Control, MediaLine, Rtpmap};
use super::error::{Error, Result};

/// Keys that may occur more than once in a block. Any other key keeps only
/// the last value it was given.
pub const REPEATABLE_KEYS: [char; 3] = ['b', 'a', 'r'];

/// Field values of one description block, keyed by the single letter field
/// type, in order of first appearance.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Fields {
    entries: Vec<(char, Vec<String>)>,
}

impl Fields {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn set(&mut self, key: char, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(var, _)| *var == key) {
            Some((_, values)) if REPEATABLE_KEYS.contains(&key) => values.push(value),
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    #[must_use]
    pub fn get(&self, key: char) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    #[must_use]
    pub fn get_all(&self, key: char) -> &[String] {
        self.entries
            .iter()
            .find(|(var, _)| *var == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// Write all fields as `<key>=<value>` lines. Keys in `order` come first
    /// in that order, followed by any other keys in order of appearance.
    fn write(&self, order: &[char], f: &mut fmt::Formatter) -> fmt::Result {
        let known = order.iter().copied();
        let unknown = self.keys().filter(|key| !order.contains(key));
        for key in known.chain(unknown) {
            for value in self.get_all(key) {
                write!(f, "{key}={value}\r\n")?;
            }
        }
        Ok(())
    }
}

/// A section of a session description that owns fields and knows in which
/// order to write them.
pub trait Block {
    const KEY_ORDER: &'static [char];

    fn fields(&self) -> &Fields;

    fn fields_mut(&mut self) -> &mut Fields;

    fn set(&mut self, key: char, value: impl Into<String>) {
        self.fields_mut().set(key, value);
    }

    fn get(&self, key: char) -> Option<&str> {
        self.fields().get(key)
    }

    fn attributes(&self) -> &[String] {
        self.fields().get_all('a')
    }
}

/// Session level description, opened by `v=`.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Session {
    fields: Fields,
}

impl Session {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: Fields::new(),
        }
    }
}

impl Block for Session {
    // Session level keys of RFC 4566 section 5 in their required order.
    const KEY_ORDER: &'static [char] = &[
        'v', 'o', 's', 'i', 'u', 'e', 'p', 'c', 'b', 't', 'r', 'z', 'k', 'a',
    ];

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fields.write(Self::KEY_ORDER, f)
    }
}

/// Media level description, opened by `m=`.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Media {
    fields: Fields,
}

impl Media {
    #[must_use]
    pub fn new(line: &MediaLine) -> Self {
        let mut media = Self::default();
        media.set('m', line.to_string());
        media
    }

    #[must_use]
    pub fn with_attribute(mut self, value: impl Into<String>) -> Self {
        self.set('a', value);
        self
    }

    #[must_use]
    pub fn with_rtpmap(self, rtpmap: &Rtpmap) -> Self {
        self.with_attribute(format!("rtpmap:{rtpmap}"))
    }

    #[must_use]
    pub fn with_control(self, control: &str) -> Self {
        self.with_attribute(format!("control:{control}"))
    }

    /// The parsed `m=` line.
    pub fn m(&self) -> Result<MediaLine> {
        self.get('m')
            .ok_or(Error::FieldMissing { key: 'm' })?
            .parse()
    }

    /// All `a=rtpmap:` attributes in order.
    pub fn rtpmaps(&self) -> Result<Vec<Rtpmap>> {
        self.attributes()
            .iter()
            .filter(|attribute| attribute.starts_with("rtpmap"))
            .map(|attribute| Rtpmap::parse_attribute(attribute))
            .collect()
    }

    /// All `a=control:` attributes in order.
    #[must_use]
    pub fn controls(&self) -> Vec<Control> {
        self.attributes()
            .iter()
            .filter_map(|attribute| attribute.strip_prefix("control:"))
            .map(Control::new)
            .collect()
    }
}

impl Block for Media {
    const KEY_ORDER: &'static [char] = &['m', 'i', 'c', 'b', 'k', 'a'];

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fields.write(Self::KEY_ORDER, f)
    }
}
