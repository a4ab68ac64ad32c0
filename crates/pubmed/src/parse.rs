//! `efetch` XML to [`ArticleRecord`]s.
//!
//! Only the elements the renderer needs are read. Text inside the captured
//! elements is concatenated across inline markup (`<i>`, `<sup>`, ...), so
//! titles and abstract sections keep their words but lose their styling.

use pipeline::{AbstractSection, ArticleId, ArticleRecord, Author, SourceError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateSlot {
    Journal,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePart {
    Year,
    Month,
    Day,
    Medline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthorPart {
    LastName,
    ForeName,
    Initials,
    CollectiveName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Pmid,
    Title,
    Journal,
    ElocationDoi,
    ArticleIdDoi,
    AbstractText { label: String },
    Date(DateSlot, DatePart),
    Author(AuthorPart),
}

/// Text being collected for one element.
struct Capture {
    target: Target,
    depth: usize,
    text: String,
}

#[derive(Debug, Default)]
struct DateParts {
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
    medline: Option<String>,
}

impl DateParts {
    fn set(&mut self, part: DatePart, value: String) {
        let slot = match part {
            DatePart::Year => &mut self.year,
            DatePart::Month => &mut self.month,
            DatePart::Day => &mut self.day,
            DatePart::Medline => &mut self.medline,
        };
        slot.get_or_insert(value);
    }

    fn is_empty(&self) -> bool {
        self.year.is_none() && self.medline.is_none()
    }

    /// `YYYY-MM-DD`, shortened to what the record actually carries.
    fn render(&self) -> String {
        let Some(year) = self.year.as_deref() else {
            return self.medline.clone().unwrap_or_default();
        };
        let Some(month) = self.month.as_deref().and_then(month_number) else {
            return year.to_string();
        };
        match self.day.as_deref().and_then(|d| d.parse::<u32>().ok()) {
            Some(day) => format!("{year}-{month:02}-{day:02}"),
            None => format!("{year}-{month:02}"),
        }
    }
}

fn month_number(month: &str) -> Option<u32> {
    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    const NAMES: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = month.get(..3)?.to_ascii_lowercase();
    NAMES.iter().position(|m| *m == prefix).map(|i| i as u32 + 1)
}

#[derive(Debug, Default)]
struct RecordBuilder {
    pmid: Option<String>,
    title: String,
    journal: String,
    elocation_doi: Option<String>,
    article_id_doi: Option<String>,
    journal_date: DateParts,
    history_date: DateParts,
    sections: Vec<AbstractSection>,
    authors: Vec<Author>,
    current_author: Option<Author>,
}

impl RecordBuilder {
    fn finish(self) -> Option<ArticleRecord> {
        let Some(id) = self.pmid.and_then(ArticleId::new) else {
            warn!(title = %self.title, "Skipping record without PMID");
            return None;
        };

        let publication_date = if self.history_date.is_empty() {
            self.journal_date.render()
        } else {
            self.history_date.render()
        };

        let (abstract_text, structured_abstract) = if self.sections.is_empty() {
            (None, None)
        } else {
            let text = self
                .sections
                .iter()
                .map(|s| s.body.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            (Some(text), Some(self.sections))
        };

        Some(ArticleRecord {
            id,
            title: self.title,
            journal: self.journal,
            doi: self.elocation_doi.or(self.article_id_doi),
            publication_date,
            abstract_text,
            structured_abstract,
            authors: self.authors,
        })
    }

    fn store(&mut self, target: Target, text: String) {
        let text = text.trim().to_string();
        match target {
            Target::Pmid => {
                self.pmid.get_or_insert(text);
            }
            Target::Title => self.title = text,
            Target::Journal => self.journal = text,
            Target::ElocationDoi => {
                self.elocation_doi.get_or_insert(text);
            }
            Target::ArticleIdDoi => {
                self.article_id_doi.get_or_insert(text);
            }
            Target::AbstractText { label } => {
                if !text.is_empty() {
                    self.sections.push(AbstractSection::new(label, text));
                }
            }
            Target::Date(slot, part) => match slot {
                DateSlot::Journal => self.journal_date.set(part, text),
                DateSlot::History => self.history_date.set(part, text),
            },
            Target::Author(part) => {
                if let Some(author) = self.current_author.as_mut() {
                    match part {
                        AuthorPart::LastName | AuthorPart::CollectiveName => author.last_name = text,
                        AuthorPart::ForeName => author.first_name = text,
                        AuthorPart::Initials => author.initials = text,
                    }
                }
            }
        }
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn parse_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> SourceError {
    SourceError::Parse(format!("efetch XML at byte {}: {err}", reader.buffer_position()))
}

/// Parses an `efetch` `PubmedArticleSet` document.
///
/// Records are returned in document order. A record without a PMID is
/// dropped with a warning.
pub fn parse_article_set(xml: &str) -> Result<Vec<ArticleRecord>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut records = Vec::new();
    let mut current: Option<RecordBuilder> = None;
    let mut capture: Option<Capture> = None;
    let mut in_pubmed_history_date = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let parent = stack.last().map(String::as_str).unwrap_or_default();

                if name == "PubmedArticle" {
                    current = Some(RecordBuilder::default());
                }

                if let Some(builder) = current.as_mut() {
                    if name == "Author" && parent == "AuthorList" {
                        builder.current_author = Some(Author::default());
                    }
                    if name == "PubMedPubDate" {
                        in_pubmed_history_date =
                            attribute(&e, "PubStatus").as_deref() == Some("pubmed");
                    }

                    if capture.is_none() {
                        let grandparent = stack
                            .len()
                            .checked_sub(2)
                            .and_then(|i| stack.get(i))
                            .map(String::as_str)
                            .unwrap_or_default();
                        let target = capture_target(
                            &e,
                            &name,
                            parent,
                            grandparent,
                            in_pubmed_history_date,
                        );
                        if let Some(target) = target {
                            capture = Some(Capture {
                                target,
                                depth: stack.len() + 1,
                                text: String::new(),
                            });
                        }
                    }
                }

                stack.push(name);
            }
            Ok(Event::Text(t)) => {
                if let Some(c) = capture.as_mut() {
                    let text = t.unescape().map_err(|e| parse_error(&reader, e))?;
                    c.text.push_str(&text);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(_)) => {
                if capture.as_ref().is_some_and(|c| c.depth == stack.len()) {
                    if let (Some(c), Some(builder)) = (capture.take(), current.as_mut()) {
                        builder.store(c.target, c.text);
                    }
                }

                let name = stack.pop().unwrap_or_default();
                match name.as_str() {
                    "Author" => {
                        if let Some(builder) = current.as_mut() {
                            if let Some(author) = builder.current_author.take() {
                                builder.authors.push(author);
                            }
                        }
                    }
                    "PubMedPubDate" => in_pubmed_history_date = false,
                    "PubmedArticle" => {
                        if let Some(record) = current.take().and_then(RecordBuilder::finish) {
                            records.push(record);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(&reader, e)),
            _ => {}
        }
    }

    Ok(records)
}

fn capture_target(
    element: &BytesStart<'_>,
    name: &str,
    parent: &str,
    grandparent: &str,
    in_pubmed_history_date: bool,
) -> Option<Target> {
    let target = match (name, parent) {
        ("PMID", "MedlineCitation") => Target::Pmid,
        ("ArticleTitle", "Article") => Target::Title,
        ("Title", "Journal") => Target::Journal,
        ("ELocationID", "Article")
            if attribute(element, "EIdType").as_deref() == Some("doi") =>
        {
            Target::ElocationDoi
        }
        ("ArticleId", "ArticleIdList")
            if grandparent == "PubmedData"
                && attribute(element, "IdType").as_deref() == Some("doi") =>
        {
            Target::ArticleIdDoi
        }
        ("AbstractText", "Abstract") => Target::AbstractText {
            label: attribute(element, "Label").unwrap_or_default(),
        },
        ("Year", "PubDate") => Target::Date(DateSlot::Journal, DatePart::Year),
        ("Month", "PubDate") => Target::Date(DateSlot::Journal, DatePart::Month),
        ("Day", "PubDate") => Target::Date(DateSlot::Journal, DatePart::Day),
        ("MedlineDate", "PubDate") => Target::Date(DateSlot::Journal, DatePart::Medline),
        ("Year", "PubMedPubDate") if in_pubmed_history_date => {
            Target::Date(DateSlot::History, DatePart::Year)
        }
        ("Month", "PubMedPubDate") if in_pubmed_history_date => {
            Target::Date(DateSlot::History, DatePart::Month)
        }
        ("Day", "PubMedPubDate") if in_pubmed_history_date => {
            Target::Date(DateSlot::History, DatePart::Day)
        }
        ("LastName", "Author") => Target::Author(AuthorPart::LastName),
        ("ForeName", "Author") => Target::Author(AuthorPart::ForeName),
        ("Initials", "Author") => Target::Author(AuthorPart::Initials),
        ("CollectiveName", "Author") => Target::Author(AuthorPart::CollectiveName),
        _ => return None,
    };
    Some(target)
}
