use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use recdiff_catalog::{Record, RecordCatalog};
use recdiff_types::DiffReport;

use crate::error::ReportResult;
use crate::extended::ExtendedReport;
use crate::flat::FlatReport;
use crate::simple::SimpleReport;

/// The payload layouts a diff can be rendered as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportShape {
    #[default]
    Simple,
    Extended,
    Flat,
}

impl fmt::Display for ReportShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportShape::Simple => write!(f, "simple"),
            ReportShape::Extended => write!(f, "extended"),
            ReportShape::Flat => write!(f, "flat"),
        }
    }
}

/// JSON output for a report shape.
pub trait Render: Serialize {
    /// Serialize to a JSON string, indented when `pretty` is set.
    fn to_json_string(&self, pretty: bool) -> ReportResult<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }

    /// Write the JSON form to `path`, replacing any existing file.
    fn save(&self, path: impl AsRef<Path>, pretty: bool) -> ReportResult<()>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        let text = self.to_json_string(pretty)?;
        fs::write(path, &text)?;
        debug!(path = %path.display(), bytes = text.len(), "report written");
        Ok(())
    }
}

/// A report in one of the [`ReportShape`]s.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Simple(SimpleReport),
    Extended(ExtendedReport),
    Flat(FlatReport),
}

impl Report {
    /// Shape `report`, reading records from the catalogs it was computed from.
    pub fn build<P: Record, C: Record>(
        shape: ReportShape,
        previous: &RecordCatalog<P>,
        current: &RecordCatalog<C>,
        report: &DiffReport,
    ) -> ReportResult<Self> {
        Ok(match shape {
            ReportShape::Simple => Report::Simple(SimpleReport::from(report)),
            ReportShape::Extended => Report::Extended(ExtendedReport::build(previous, current, report)?),
            ReportShape::Flat => Report::Flat(FlatReport::build(previous, current, report)?),
        })
    }

    pub fn shape(&self) -> ReportShape {
        match self {
            Report::Simple(_) => ReportShape::Simple,
            Report::Extended(_) => ReportShape::Extended,
            Report::Flat(_) => ReportShape::Flat,
        }
    }
}

impl Render for Report {}
