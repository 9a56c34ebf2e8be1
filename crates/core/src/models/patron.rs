use std::{
    fmt,
    io::{BufRead, Write},
};

use crate::{codec::LineReader, error::Result};

/// Tag line written ahead of every record in the catalog's patron section.
pub const PATRON_TAG: &str = "Patron";

/// Library member who can borrow publications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patron {
    name: String,
    email: String,
}

impl Patron {
    /// Build a patron record. No validation is applied to either field.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Patron's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Patron's contact address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Decode the two-line body: name, then email.
    pub fn read_from<R: BufRead>(reader: &mut LineReader<R>) -> Result<Self> {
        let name = reader.next_line("patron name")?;
        let email = reader.next_line("patron email")?;
        Ok(Self { name, email })
    }

    /// Encode the two-line body.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.name)?;
        writeln!(out, "{}", self.email)?;
        Ok(())
    }
}

impl fmt::Display for Patron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.email)
    }
}
