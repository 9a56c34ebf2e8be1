//! Menu-driven session over a single catalog.

use std::io::{BufRead, Write};

use anyhow::Result;
use library_core::{Catalog, CatalogStore, Patron, Publication};
use thiserror::Error;
use tracing::{debug, error, info, warn};

const MAIN_MENU: &str = "\n:::::::: MAIN MENU ::::::::\n\n\
>> Publication\n\
1) List\n\
2) Add (Video)\n\
3) Add (Book)\n\
4) Check Out\n\
5) Check In\n\n\
>> Patrons\n\
6) List\n\
7) Add\n\n\
8) Save\n\
9) Open\n\
0) Exit\n";

const INDEX_ERROR: &str = "Index Error: Invalid publication or patron index.";

/// Raised when the input handle reaches end of file mid-session.
#[derive(Debug, Error)]
#[error("input closed")]
struct InputClosed;

/// Interactive session holding the current catalog and its I/O handles.
pub struct LibraryManager<R, W> {
    catalog: Catalog,
    store: CatalogStore,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LibraryManager<R, W> {
    pub fn new(catalog: Catalog, store: CatalogStore, input: R, output: W) -> Self {
        Self {
            catalog,
            store,
            input,
            output,
        }
    }

    #[cfg(test)]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Show the main menu until the user exits or input runs out.
    pub fn run(&mut self) -> Result<()> {
        loop {
            write!(self.output, "{MAIN_MENU}")?;
            let step = match self.prompt_number("Choose an option: ") {
                Ok(Some(selection)) => self.dispatch(selection),
                Ok(None) => Ok(true),
                Err(err) => Err(err),
            };
            match step {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) if err.is::<InputClosed>() => {
                    debug!("input closed");
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        info!(name = %self.catalog.name(), "session ended");
        Ok(())
    }

    fn dispatch(&mut self, selection: i64) -> Result<bool> {
        match selection {
            1 => self.list_publications()?,
            2 => self.add_video()?,
            3 => self.add_book()?,
            4 => self.check_out()?,
            5 => self.check_in()?,
            6 => self.list_patrons()?,
            7 => self.add_patron()?,
            8 => self.save()?,
            9 => self.open()?,
            0 => return Ok(false),
            _ => writeln!(self.output, "Invalid choice. Please enter a valid option.")?,
        }
        Ok(true)
    }

    fn list_publications(&mut self) -> Result<()> {
        writeln!(self.output, "\n{}", self.catalog.describe())?;
        Ok(())
    }

    fn list_patrons(&mut self) -> Result<()> {
        writeln!(self.output, "\n{}", self.catalog.patron_menu())?;
        Ok(())
    }

    fn add_book(&mut self) -> Result<()> {
        let title = self.prompt("\nEnter the Title: ")?;
        let author = self.prompt("Enter name of the author: ")?;
        let Some(year) = self.prompt_number("Enter the copyright Year: ")? else {
            return Ok(());
        };
        self.add(Publication::new(title, author, year_value(year)))
    }

    fn add_video(&mut self) -> Result<()> {
        let title = self.prompt("\nEnter the Title: ")?;
        let author = self.prompt("Enter name of the author: ")?;
        let Some(year) = self.prompt_number("Enter the copyright Year: ")? else {
            return Ok(());
        };
        let Some(runtime) = self.prompt_number("Enter the Runtime in minutes: ")? else {
            return Ok(());
        };
        self.add(Publication::video(title, author, year_value(year), runtime))
    }

    fn add(&mut self, built: library_core::Result<Publication>) -> Result<()> {
        match built {
            Ok(publication) => self.catalog.add_publication(publication),
            Err(err) => {
                warn!("Rejected publication: {err}");
                writeln!(self.output, "Could not add publication: {err}")?;
            }
        }
        Ok(())
    }

    fn add_patron(&mut self) -> Result<()> {
        let name = self.prompt("\nEnter the name: ")?;
        let email = self.prompt("\nEnter the email: ")?;
        self.catalog.add_patron(Patron::new(name, email));
        Ok(())
    }

    fn check_out(&mut self) -> Result<()> {
        self.list_publications()?;
        let Some(publication) = self.prompt_number("\nWhich publication do you want to check out: ")?
        else {
            return Ok(());
        };
        self.list_patrons()?;
        let Some(patron) = self.prompt_number("\nWho are you: ")? else {
            return Ok(());
        };
        let outcome = self.catalog.check_out(publication, patron);
        self.report_lending(outcome)
    }

    fn check_in(&mut self) -> Result<()> {
        self.list_publications()?;
        let Some(publication) = self.prompt_number("\nWhich publication do you want to check in: ")?
        else {
            return Ok(());
        };
        let outcome = self.catalog.check_in(publication);
        self.report_lending(outcome)
    }

    fn report_lending(&mut self, outcome: library_core::Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {}
            Err(err) if err.is_lookup_failure() => {
                warn!("{err}");
                writeln!(self.output, "{INDEX_ERROR}")?;
            }
            Err(err) => writeln!(self.output, "Error: {err}")?,
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let file_name = self.prompt("Enter Filename: ")?;
        if file_name.trim().is_empty() {
            writeln!(self.output, "No file name given.")?;
            return Ok(());
        }
        match self.store.save(&self.catalog, file_name.trim()) {
            Ok(path) => writeln!(
                self.output,
                "Saved '{}' to {}",
                self.catalog.name(),
                path.display()
            )?,
            Err(err) => {
                error!("Save failed: {err:#}");
                writeln!(self.output, "Error: {err:#}")?;
            }
        }
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        let file_name = self.prompt("Enter Filename: ")?;
        if file_name.trim().is_empty() {
            return self.list_saved();
        }
        match self.store.open(file_name.trim()) {
            Ok(catalog) => {
                self.catalog = catalog;
                writeln!(
                    self.output,
                    "Opened '{}': {} publications ({} videos), {} patrons",
                    self.catalog.name(),
                    self.catalog.publications().len(),
                    self.catalog.video_count(),
                    self.catalog.patrons().len()
                )?;
            }
            Err(err) => {
                error!("Open failed: {err:#}");
                writeln!(self.output, "Error: {err:#}")?;
            }
        }
        Ok(())
    }

    fn list_saved(&mut self) -> Result<()> {
        let entries = match self.store.entries() {
            Ok(entries) => entries,
            Err(err) => {
                writeln!(self.output, "Error: {err:#}")?;
                return Ok(());
            }
        };
        if entries.is_empty() {
            writeln!(self.output, "No saved catalogs in {}", self.store.root().display())?;
            return Ok(());
        }
        writeln!(self.output, "Saved catalogs in {}:", self.store.root().display())?;
        for entry in entries {
            let file = entry
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(
                self.output,
                "  {file}  {} ({} publications, {})",
                entry.name,
                entry.publications,
                entry.modified.format("%Y-%m-%d %H:%M")
            )?;
        }
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> Result<String> {
        writeln!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputClosed.into());
        }
        Ok(line.trim_end_matches(|c| c == '\n' || c == '\r').to_string())
    }

    /// Prompt for an integer. Unparseable input is reported and yields `None`.
    fn prompt_number(&mut self, label: &str) -> Result<Option<i64>> {
        let raw = self.prompt(label)?;
        match raw.trim().parse::<i64>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                writeln!(self.output, "'{}' is not a number.", raw.trim())?;
                Ok(None)
            }
        }
    }
}

// Years outside i32 can never pass validation; clamp so the error names a year.
fn year_value(year: i64) -> i32 {
    i32::try_from(year).unwrap_or(if year < 0 { i32::MIN } else { i32::MAX })
}
