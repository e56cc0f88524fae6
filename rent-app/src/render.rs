use clap::ValueEnum;
use rent_core::export::{DocumentRenderer, ExportError, ReportDocument};

const LABEL_WIDTH: usize = 30;

/// Output formats the export command understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
}

impl ExportFormat {
    pub fn renderer(self) -> Box<dyn DocumentRenderer> {
        match self {
            Self::Text => Box::new(TextRenderer),
            Self::Csv => Box::new(CsvRenderer),
        }
    }
}

/// Plain-text page: title, date line, then one block per section.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn to_text(document: &ReportDocument) -> String {
        let mut out = String::new();
        out.push_str(&document.title);
        out.push('\n');
        out.push_str(&format!(
            "Generated on {}\n",
            document.generated_on.format("%B %-d, %Y")
        ));
        out.push_str(&"=".repeat(document.title.chars().count().max(LABEL_WIDTH)));
        out.push('\n');

        for section in &document.sections {
            out.push('\n');
            out.push_str(&section.heading);
            out.push('\n');
            out.push_str(&"-".repeat(section.heading.chars().count()));
            out.push('\n');
            for line in &section.lines {
                out.push_str(&format!("{:<width$}{}\n", line.label, line.value, width = LABEL_WIDTH));
            }
        }
        out
    }
}

impl DocumentRenderer for TextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, ExportError> {
        Ok(Self::to_text(document).into_bytes())
    }
}

/// `section,item,value` rows, headed by the title and date.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvRenderer;

impl DocumentRenderer for CsvRenderer {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, ExportError> {
        let render_err = |e: csv::Error| ExportError::Render(e.to_string());
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(["section", "item", "value"]).map_err(render_err)?;
        writer
            .write_record(["Report", "Title", document.title.as_str()])
            .map_err(render_err)?;
        let date = document.generated_on.format("%Y-%m-%d").to_string();
        writer
            .write_record(["Report", "Generated on", date.as_str()])
            .map_err(render_err)?;

        for section in &document.sections {
            for line in &section.lines {
                writer
                    .write_record([
                        section.heading.as_str(),
                        line.label.as_str(),
                        line.value.as_str(),
                    ])
                    .map_err(render_err)?;
            }
        }

        writer
            .into_inner()
            .map_err(|e| ExportError::Render(e.to_string()))
    }
}
