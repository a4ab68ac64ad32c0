//! Word-processor review document.
//!
//! One section per article, each after a page break except the first: bold
//! title, author line, an indented red "Importance: ***" placeholder for the
//! reviewer, the summary in blue when there is one, the abstract sections
//! (headings bold), and a metadata footer.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, RunFonts};
use pipeline::{NormalizedArticle, SummaryOutcome};

use crate::{RenderError, RenderOptions};

/// Left indent of the reviewer and summary paragraphs (0.5 inch, in twips).
const NOTE_INDENT_TWIPS: i32 = 720;

const FONT: &str = "Arial";
/// 9 pt, in half-points.
const FONT_SIZE_HALF_POINTS: usize = 18;

const IMPORTANCE_COLOR: &str = "FF0000";
const SUMMARY_COLOR: &str = "0000FF";

#[derive(Default)]
pub(crate) struct DocumentBuilder {
    paragraphs: Vec<Paragraph>,
    sections: usize,
}

impl DocumentBuilder {
    pub(crate) fn push(
        &mut self,
        article: &NormalizedArticle,
        summary: Option<&SummaryOutcome>,
        options: &RenderOptions,
    ) {
        if self.sections > 0 {
            self.paragraphs
                .push(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }
        self.sections += 1;

        self.paragraphs
            .push(Paragraph::new().add_run(Run::new().add_text(article.title()).bold()));
        self.paragraphs
            .push(Paragraph::new().add_run(Run::new().add_text(article.authors_display())));

        self.paragraphs.push(
            indented()
                .add_run(
                    Run::new()
                        .add_text("Importance:")
                        .bold()
                        .color(IMPORTANCE_COLOR),
                )
                .add_run(Run::new().add_text(" ***").color(IMPORTANCE_COLOR)),
        );

        if let Some(summary) = summary {
            self.paragraphs.push(
                indented()
                    .add_run(
                        Run::new()
                            .add_text(format!("{} Summary: ", options.model_display_name))
                            .bold()
                            .color(SUMMARY_COLOR),
                    )
                    .add_run(Run::new().add_text(summary.text()).color(SUMMARY_COLOR)),
            );
        }

        for section in article.sections() {
            let mut paragraph = Paragraph::new();
            if section.has_heading() {
                paragraph = paragraph
                    .add_run(Run::new().add_text(section.heading.as_str()).bold())
                    .add_run(Run::new().add_text(": "));
            }
            self.paragraphs
                .push(paragraph.add_run(Run::new().add_text(section.body.as_str())));
        }

        self.paragraphs.push(Paragraph::new().add_run(Run::new().add_text(format!(
            "{} - {} - {} - {}",
            article.publication_date(),
            article.journal(),
            article.id(),
            article.doi()
        ))));
    }

    fn into_docx(self) -> Docx {
        self.paragraphs.into_iter().fold(
            Docx::new()
                .default_fonts(RunFonts::new().ascii(FONT).hi_ansi(FONT).cs(FONT))
                .default_size(FONT_SIZE_HALF_POINTS),
            Docx::add_paragraph,
        )
    }

    /// Packs the document into `.docx` bytes.
    pub(crate) fn build(self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        self.into_docx()
            .build()
            .pack(Cursor::new(&mut bytes))
            .map_err(|e| RenderError::Document(e.to_string()))?;
        Ok(bytes)
    }
}

fn indented() -> Paragraph {
    Paragraph::new().indent(Some(NOTE_INDENT_TWIPS), None, None, None)
}
