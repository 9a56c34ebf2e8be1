//! The named aggregate of publications and patrons, and its file codec.

use std::{
    fmt,
    io::{BufRead, Write},
};

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::{
    codec::LineReader,
    error::{LibraryError, Result},
    models::{Patron, Publication, PublicationKind, PATRON_TAG},
};

/// Ordered publications and patrons under a library name.
///
/// Entries are addressed by position; indices are only meaningful until the
/// next mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    name: String,
    publications: Vec<Publication>,
    patrons: Vec<Patron>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            publications: Vec::new(),
            patrons: Vec::new(),
        }
    }

    /// Library name shown in listings and stored on the first line of a file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publications in insertion order.
    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    /// Patrons in insertion order.
    pub fn patrons(&self) -> &[Patron] {
        &self.patrons
    }

    /// Append a publication.
    pub fn add_publication(&mut self, publication: Publication) {
        debug!(
            title = %publication.title(),
            kind = publication.kind().label(),
            "added publication"
        );
        self.publications.push(publication);
    }

    /// Append a patron.
    pub fn add_patron(&mut self, patron: Patron) {
        debug!(patron = %patron.name(), "added patron");
        self.patrons.push(patron);
    }

    /// Lend the publication at `publication_index` to the patron at `patron_index`.
    pub fn check_out(&mut self, publication_index: i64, patron_index: i64) -> Result<()> {
        self.check_out_on(publication_index, patron_index, Local::now().date_naive())
    }

    /// [`Catalog::check_out`] with an explicit checkout date.
    pub fn check_out_on(
        &mut self,
        publication_index: i64,
        patron_index: i64,
        today: NaiveDate,
    ) -> Result<()> {
        let slot = self.publication_slot(publication_index)?;
        let patron = self.patron(patron_index)?.clone();
        self.publications[slot].check_out_on(patron, today);
        Ok(())
    }

    /// Return the publication at `publication_index` to the shelf.
    pub fn check_in(&mut self, publication_index: i64) -> Result<()> {
        let slot = self.publication_slot(publication_index)?;
        self.publications[slot].check_in();
        Ok(())
    }

    /// Patron at `index`, or a lookup failure. No separate bounds policy applies.
    pub fn patron(&self, index: i64) -> Result<&Patron> {
        usize::try_from(index)
            .ok()
            .and_then(|slot| self.patrons.get(slot))
            .ok_or(LibraryError::NoSuchEntry {
                kind: "patron",
                index,
            })
    }

    // The bound admits `index == len`; such a call fails at the lookup instead.
    fn publication_slot(&self, index: i64) -> Result<usize> {
        let len = self.publications.len();
        if index < 0 || index > len as i64 {
            return Err(LibraryError::IndexOutOfRange { index, len });
        }
        usize::try_from(index)
            .ok()
            .filter(|slot| *slot < len)
            .ok_or(LibraryError::NoSuchEntry {
                kind: "publication",
                index,
            })
    }

    /// Decode a whole catalog from a buffered stream.
    pub fn read_from<R: BufRead>(input: R) -> Result<Self> {
        let mut reader = LineReader::new(input);
        Self::decode(&mut reader)
    }

    /// Decode a whole catalog from an existing line reader.
    ///
    /// Records tagged with anything other than `video` or `publication` are
    /// dropped after consuming only their tag line.
    pub fn decode<R: BufRead>(reader: &mut LineReader<R>) -> Result<Self> {
        let mut catalog = Self::new(reader.next_line("catalog name")?);

        let count = reader.next_parsed::<i64>("publication count")?;
        for _ in 0..count.max(0) {
            let tag = reader.next_line("publication type")?;
            match tag.as_str() {
                "video" => catalog.publications.push(Publication::read_video(reader)?),
                "publication" => catalog.publications.push(Publication::read_book(reader)?),
                other => {
                    warn!(line = reader.line(), tag = other, "skipping unknown publication type")
                }
            }
        }

        let count = reader.next_parsed::<i64>("patron count")?;
        for _ in 0..count.max(0) {
            reader.next_line("patron tag")?;
            catalog.patrons.push(Patron::read_from(reader)?);
        }

        debug!(
            name = %catalog.name,
            publications = catalog.publications.len(),
            patrons = catalog.patrons.len(),
            "decoded catalog"
        );
        Ok(catalog)
    }

    /// Encode the whole catalog.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.name)?;
        writeln!(out, "{}", self.publications.len())?;
        for publication in &self.publications {
            writeln!(out, "{}", publication.kind().tag())?;
            publication.write_to(out)?;
        }
        writeln!(out, "{}", self.patrons.len())?;
        for patron in &self.patrons {
            writeln!(out, "{PATRON_TAG}")?;
            patron.write_to(out)?;
        }
        Ok(())
    }

    /// Numbered listing of publications under the library name.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Numbered listing of patrons.
    pub fn patron_menu(&self) -> String {
        let mut menu = String::from(">>>  Patron  <<<\n\n");
        for (num, patron) in self.patrons.iter().enumerate() {
            menu.push_str(&format!("{num}. {patron}\n"));
        }
        menu
    }

    /// Number of videos, used for status summaries.
    pub fn video_count(&self) -> usize {
        self.publications
            .iter()
            .filter(|publication| matches!(publication.kind(), PublicationKind::Video(_)))
            .count()
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-->>  {}  <<--\n\n", self.name)?;
        for (num, publication) in self.publications.iter().enumerate() {
            writeln!(f, "{num}. {publication}")?;
        }
        Ok(())
    }
}
