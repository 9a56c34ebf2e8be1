use std::{
    fmt,
    io::{BufRead, Write},
};

use chrono::{Datelike, Days, Local, NaiveDate, TimeDelta};
use tracing::debug;

use crate::{
    codec::LineReader,
    error::{LibraryError, Result},
    runtime::{parse_duration, Runtime},
};

use super::Patron;

/// Earliest copyright year accepted by the constructors.
pub const MIN_COPYRIGHT_YEAR: i32 = 1900;
/// Length of a loan, counted from the checkout date.
pub const LOAN_PERIOD_DAYS: u64 = 14;

const CHECKED_IN: &str = "checked in";
const CHECKED_OUT: &str = "checked out";

/// Calendar year according to the local clock.
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Whether a publication is on the shelf or with a patron.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoanState {
    /// Available for checkout.
    #[default]
    Unloaned,
    /// Borrowed until `due`.
    Loaned {
        /// Borrower recorded at checkout.
        patron: Patron,
        /// Date the publication is expected back.
        due: NaiveDate,
    },
}

/// Variant of a catalog entry. Fixed when the publication is built or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationKind {
    /// Plain publication, listed as a book.
    Book,
    /// Video with a strictly positive runtime.
    Video(Runtime),
}

impl PublicationKind {
    /// Type tag written ahead of the record in a catalog file.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Book => "publication",
            Self::Video(_) => "video",
        }
    }

    /// Heading used when rendering the entry.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::Video(_) => "Video",
        }
    }
}

/// A catalog entry together with its lending state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    title: String,
    author: String,
    copyright_year: i32,
    loan: LoanState,
    kind: PublicationKind,
}

impl Publication {
    /// Build a book, rejecting copyright years outside `1900..=current year`.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        copyright_year: i32,
    ) -> Result<Self> {
        validate_copyright_year(copyright_year)?;
        Ok(Self {
            title: title.into(),
            author: author.into(),
            copyright_year,
            loan: LoanState::Unloaned,
            kind: PublicationKind::Book,
        })
    }

    /// Build a video. The copyright year is checked before the runtime.
    pub fn video(
        title: impl Into<String>,
        author: impl Into<String>,
        copyright_year: i32,
        runtime_minutes: i64,
    ) -> Result<Self> {
        let mut publication = Self::new(title, author, copyright_year)?;
        let runtime = Runtime::from_minutes(runtime_minutes).ok_or_else(|| {
            LibraryError::InvalidRuntime {
                title: publication.title.clone(),
                minutes: runtime_minutes,
            }
        })?;
        publication.kind = PublicationKind::Video(runtime);
        Ok(publication)
    }

    /// Title line.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Author or creator.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Copyright year as constructed or stored.
    pub fn copyright_year(&self) -> i32 {
        self.copyright_year
    }

    /// Variant tag.
    pub fn kind(&self) -> PublicationKind {
        self.kind
    }

    /// Current lending state.
    pub fn loan(&self) -> &LoanState {
        &self.loan
    }

    /// Runtime for videos, `None` for books.
    pub fn runtime(&self) -> Option<Runtime> {
        match self.kind {
            PublicationKind::Video(runtime) => Some(runtime),
            PublicationKind::Book => None,
        }
    }

    /// True while a patron holds the publication.
    pub fn is_loaned(&self) -> bool {
        matches!(self.loan, LoanState::Loaned { .. })
    }

    /// Lend to `patron`, due [`LOAN_PERIOD_DAYS`] after today.
    pub fn check_out(&mut self, patron: Patron) {
        self.check_out_on(patron, Local::now().date_naive());
    }

    /// Lend to `patron` as if checked out on `today`. Any existing loan is replaced.
    pub fn check_out_on(&mut self, patron: Patron, today: NaiveDate) {
        let due = today
            .checked_add_days(Days::new(LOAN_PERIOD_DAYS))
            .unwrap_or(NaiveDate::MAX);
        debug!(title = %self.title, patron = %patron.name(), %due, "checked out");
        self.loan = LoanState::Loaned { patron, due };
    }

    /// Return to the shelf. Checking in an unloaned publication is a no-op.
    pub fn check_in(&mut self) {
        if self.is_loaned() {
            debug!(title = %self.title, "checked in");
        }
        self.loan = LoanState::Unloaned;
    }

    /// Decode a `publication` record body.
    ///
    /// The copyright year is taken as stored; the constructor range check is
    /// not repeated here. The loan status line must be exactly `checked in`
    /// or `checked out`: any other text is a format error instead of being
    /// read as a loan.
    pub fn read_book<R: BufRead>(reader: &mut LineReader<R>) -> Result<Self> {
        let title = reader.next_line("title")?;
        let author = reader.next_line("author")?;
        let copyright_year = reader.next_parsed::<i32>("copyright year")?;

        let status = reader.next_line("loan status")?;
        let loan = match status.as_str() {
            CHECKED_IN => LoanState::Unloaned,
            CHECKED_OUT => {
                let patron = Patron::read_from(reader)?;
                let raw = reader.next_line("due date")?;
                let due = raw
                    .parse::<NaiveDate>()
                    .map_err(|_| reader.format_error(format!("invalid due date '{raw}'")))?;
                LoanState::Loaned { patron, due }
            }
            other => {
                return Err(reader.format_error(format!(
                    "invalid loan status '{other}', expected '{CHECKED_IN}' or '{CHECKED_OUT}'"
                )))
            }
        };

        Ok(Self {
            title,
            author,
            copyright_year,
            loan,
            kind: PublicationKind::Book,
        })
    }

    /// Decode a `video` record body: the book fields followed by the runtime line.
    ///
    /// A missing or blank runtime line counts as zero, which is rejected like
    /// any other non-positive runtime.
    pub fn read_video<R: BufRead>(reader: &mut LineReader<R>) -> Result<Self> {
        let mut publication = Self::read_book(reader)?;

        let duration = match reader.next_optional()? {
            Some(raw) if !raw.is_empty() => parse_duration(&raw)
                .ok_or_else(|| reader.format_error(format!("invalid runtime '{raw}'")))?,
            _ => TimeDelta::zero(),
        };
        let runtime = Runtime::new(duration).ok_or_else(|| LibraryError::InvalidRuntime {
            title: publication.title.clone(),
            minutes: duration.num_minutes(),
        })?;

        publication.kind = PublicationKind::Video(runtime);
        Ok(publication)
    }

    /// Encode the record body in the field order of its variant.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.title)?;
        writeln!(out, "{}", self.author)?;
        writeln!(out, "{}", self.copyright_year)?;
        match &self.loan {
            LoanState::Unloaned => writeln!(out, "{CHECKED_IN}")?,
            LoanState::Loaned { patron, due } => {
                writeln!(out, "{CHECKED_OUT}")?;
                patron.write_to(out)?;
                writeln!(out, "{due}")?;
            }
        }
        if let PublicationKind::Video(runtime) = self.kind {
            writeln!(out, "{runtime}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Publication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}\n Author: {}\n Copyright Year: {}",
            self.kind.label(),
            self.title,
            self.author,
            self.copyright_year
        )?;
        if let PublicationKind::Video(runtime) = self.kind {
            write!(f, "\n RunTime Minutes: {} minutes", runtime.minutes())?;
        }
        if let LoanState::Loaned { patron, due } = &self.loan {
            write!(f, "\n   >>> loaned to {patron} until {due}")?;
        }
        f.write_str("\n\n")
    }
}

fn validate_copyright_year(year: i32) -> Result<()> {
    let max = current_year();
    if !(MIN_COPYRIGHT_YEAR..=max).contains(&year) {
        return Err(LibraryError::InvalidCopyrightYear { year, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn decode(text: &str, video: bool) -> Result<Publication> {
        let mut reader = LineReader::new(Cursor::new(text.to_string()));
        if video {
            Publication::read_video(&mut reader)
        } else {
            Publication::read_book(&mut reader)
        }
    }

    #[test]
    fn copyright_year_bounds() {
        let year = current_year();
        assert!(matches!(
            Publication::new("T", "A", 1899),
            Err(LibraryError::InvalidCopyrightYear { year: 1899, .. })
        ));
        assert!(matches!(
            Publication::new("T", "A", year + 1),
            Err(LibraryError::InvalidCopyrightYear { .. })
        ));
        assert!(Publication::new("T", "A", 1900).is_ok());
        assert!(Publication::new("T", "A", year).is_ok());
    }

    #[test]
    fn video_runtime_must_be_positive() {
        for minutes in [0, -5] {
            match Publication::video("Clip", "D", 2000, minutes) {
                Err(LibraryError::InvalidRuntime { title, minutes: got }) => {
                    assert_eq!(title, "Clip");
                    assert_eq!(got, minutes);
                }
                other => panic!("expected invalid runtime, got {other:?}"),
            }
        }
        let video = Publication::video("Clip", "D", 2000, 1).expect("valid video");
        assert_eq!(video.runtime().map(|r| r.minutes()), Some(1));
    }

    #[test]
    fn oversized_runtime_is_out_of_range() {
        let err = Publication::video("Epic", "D", 2000, i64::MAX).unwrap_err();
        assert!(matches!(err, LibraryError::InvalidRuntime { minutes: i64::MAX, .. }));
        assert!(err.to_string().ends_with("(out of range)"));

        let zero = Publication::video("Clip", "D", 2000, 0).unwrap_err();
        assert_eq!(zero.to_string(), "Invalid runtime for video 'Clip': 0");
    }

    #[test]
    fn video_checks_year_before_runtime() {
        assert!(matches!(
            Publication::video("Clip", "D", 1850, 0),
            Err(LibraryError::InvalidCopyrightYear { .. })
        ));
    }

    #[test]
    fn checkout_sets_due_date_and_replaces_prior_loan() -> Result<()> {
        let mut book = Publication::new("T", "A", 2000)?;
        book.check_out_on(Patron::new("a", "a@x"), date(2024, 1, 1));
        book.check_out_on(Patron::new("b", "b@x"), date(2024, 2, 20));
        assert_eq!(
            book.loan(),
            &LoanState::Loaned {
                patron: Patron::new("b", "b@x"),
                due: date(2024, 3, 5),
            }
        );
        Ok(())
    }

    #[test]
    fn check_in_is_idempotent() -> Result<()> {
        let mut book = Publication::new("T", "A", 2000)?;
        book.check_out(Patron::new("a", "a@x"));
        book.check_in();
        let once = book.clone();
        book.check_in();
        assert_eq!(book, once);
        assert!(!book.is_loaned());
        Ok(())
    }

    #[test]
    fn encodes_loaned_video() -> Result<()> {
        let mut video = Publication::video("C", "D", 2010, 90)?;
        video.check_out_on(Patron::new("Ada", "ada@x"), date(2024, 5, 1));
        let mut out = Vec::new();
        video.write_to(&mut out)?;
        assert_eq!(
            String::from_utf8_lossy(&out),
            "C\nD\n2010\nchecked out\nAda\nada@x\n2024-05-15\nPT1H30M\n"
        );
        Ok(())
    }

    #[test]
    fn decode_skips_copyright_validation() -> Result<()> {
        let book = decode("Old\nScribe\n1500\nchecked in\n", false)?;
        assert_eq!(book.copyright_year(), 1500);
        assert_eq!(book.kind(), PublicationKind::Book);
        Ok(())
    }

    #[test]
    fn decode_rejects_bad_fields() {
        assert!(matches!(
            decode("T\nA\nnineteen\nchecked in\n", false),
            Err(LibraryError::Format { line: 3, .. })
        ));
        assert!(matches!(
            decode("T\nA\n2000\nchecked out\nAda\nada@x\n2024-13-01\n", false),
            Err(LibraryError::Format { line: 7, .. })
        ));
        assert!(matches!(
            decode("T\nA\n2000\non loan\n", false),
            Err(LibraryError::Format { line: 4, .. })
        ));
        assert!(matches!(
            decode("T\nA\n2000\nchecked out\nAda\n", false),
            Err(LibraryError::Format { .. })
        ));
    }

    #[test]
    fn video_runtime_line_is_validated() {
        for body in ["C\nD\n2010\nchecked in\n", "C\nD\n2010\nchecked in\nPT0S\n"] {
            assert!(matches!(
                decode(body, true),
                Err(LibraryError::InvalidRuntime { .. })
            ));
        }
        assert!(matches!(
            decode("C\nD\n2010\nchecked in\nninety\n", true),
            Err(LibraryError::Format { line: 5, .. })
        ));
        let video = decode("C\nD\n2010\nchecked in\nPT90M\n", true).expect("valid video");
        assert_eq!(video.runtime().map(|r| r.minutes()), Some(90));
    }

    #[test]
    fn renders_description() -> Result<()> {
        let mut video = Publication::video("C", "D", 2010, 90)?;
        assert_eq!(
            video.to_string(),
            "Video: C\n Author: D\n Copyright Year: 2010\n RunTime Minutes: 90 minutes\n\n"
        );
        video.check_out_on(Patron::new("Ada", "ada@x"), date(2024, 5, 1));
        assert!(video
            .to_string()
            .ends_with("\n   >>> loaned to Ada -> ada@x until 2024-05-15\n\n"));

        let book = Publication::new("A", "B", 2000)?;
        assert!(book.to_string().starts_with("Book: A\n Author: B"));
        Ok(())
    }
}
