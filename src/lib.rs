pub mod encoding;
pub mod heap_collection;
pub mod index;
pub mod io_helper;
pub mod search;
pub mod segment;
pub mod stats;
pub mod tokenize;

#[macro_use]
extern crate serde_derive;

use fnv::FnvHashMap as HashMap;
use fnv::FnvHashSet as HashSet;
use std::{io, str::Utf8Error};

#[derive(Debug)]
pub enum Error {
    BadEncodedId(String),
    BadRunLine(String),
    BadOffset(String),
    MissingManifest,
    BadManifest(serde_json::Error),
    MissingTitle(u64),
    IO(io::Error),
    Utf8DecodeError(Utf8Error),
    XML(quick_xml::Error),
    Context(String, Box<Error>),
}

impl Error {
    pub fn with_context<S>(self, msg: S) -> Error
    where
        S: Into<String>,
    {
        Error::Context(msg.into(), Box::new(self))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IO(err)
    }
}
impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::XML(err)
    }
}
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::BadManifest(err)
    }
}
impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Error {
        Error::Utf8DecodeError(err)
    }
}

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone)]
#[repr(transparent)]
pub struct DocId(pub u32);

impl DocId {
    pub fn encode(&self) -> String {
        crate::encoding::encode(self.0 as u64)
    }
}

/// The six article sections that each get their own index.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Copy, Clone)]
pub enum Field {
    Title,
    Body,
    Infobox,
    Categories,
    ExternalLinks,
    References,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Body,
        Field::Infobox,
        Field::Categories,
        Field::ExternalLinks,
        Field::References,
    ];

    /// Single-letter tag used in file names and query markers.
    pub fn tag(self) -> char {
        match self {
            Field::Title => 't',
            Field::Body => 'b',
            Field::Infobox => 'i',
            Field::Categories => 'c',
            Field::ExternalLinks => 'l',
            Field::References => 'r',
        }
    }

    pub fn from_tag(tag: char) -> Option<Field> {
        match tag {
            't' => Some(Field::Title),
            'b' => Some(Field::Body),
            'i' => Some(Field::Infobox),
            'c' => Some(Field::Categories),
            'l' => Some(Field::ExternalLinks),
            'r' => Some(Field::References),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}
