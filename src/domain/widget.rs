// Widget catalogue - fixed chart bindings and their sample data
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Pie,
    Bar,
    Scatter,
    Geo,
}

/// Rows handed to the chart sink. Serializes header-first, as an array of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    pub header: (&'static str, &'static str),
    pub rows: Vec<(&'static str, f64)>,
}

impl Serialize for SampleTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len() + 1))?;
        seq.serialize_element(&[self.header.0, self.header.1])?;
        for (label, value) in &self.rows {
            seq.serialize_element(&(label, value))?;
        }
        seq.end()
    }
}

fn sector_table() -> SampleTable {
    SampleTable {
        header: ("Sector", "Intensity"),
        rows: vec![
            ("Sector 1", 60.0),
            ("Sector 2", 30.0),
            ("Sector 3", 70.0),
            ("Sector 4", 40.0),
        ],
    }
}

fn country_table() -> SampleTable {
    SampleTable {
        header: ("Country", "Intensity"),
        rows: vec![
            ("USA", 10.0),
            ("Canada", 20.0),
            ("Russia", 10.0),
            ("Brazil", 6.0),
            ("Australia", 15.0),
            ("Algeria", 10.0),
            ("India", 20.0),
            ("South Africa", 15.0),
        ],
    }
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 4] = [Self::Pie, Self::Bar, Self::Scatter, Self::Geo];

    pub fn from_cell_id(cell_id: &str) -> Option<Self> {
        match cell_id {
            "1" => Some(Self::Pie),
            "2" => Some(Self::Bar),
            "3" => Some(Self::Scatter),
            "4" => Some(Self::Geo),
            _ => None,
        }
    }

    pub fn cell_id(self) -> &'static str {
        match self {
            Self::Pie => "1",
            Self::Bar => "2",
            Self::Scatter => "3",
            Self::Geo => "4",
        }
    }

    pub fn chart_type(self) -> &'static str {
        match self {
            Self::Pie => "PieChart",
            Self::Bar => "BarChart",
            Self::Scatter => "ScatterChart",
            Self::Geo => "GeoChart",
        }
    }

    pub fn table(self) -> SampleTable {
        match self {
            Self::Geo => country_table(),
            _ => sector_table(),
        }
    }

    pub fn options(self) -> Value {
        match self {
            Self::Pie => json!({
                "title": "Sector and Intensity",
                "colors": [
                    "#b3ccff", "#cce0ff", "#99c2ff", "#66a3ff", "#3385ff",
                    "#0066ff", "#0052cc", "#003d99", "#002966"
                ],
            }),
            Self::Bar => json!({
                "title": "Sector and Intensity",
                "chartArea": { "width": "50%" },
                "hAxis": { "title": "Intensity", "minValue": 0, "maxValue": 100 },
                "vAxis": { "title": "Sector" },
            }),
            Self::Scatter => json!({
                "title": "Correlation between Region, Relevance and Intensity",
                "hAxis": { "title": "Region" },
                "vAxis": { "title": "Relevance" },
                "legend": { "position": "none" },
            }),
            Self::Geo => json!({
                "title": "Countries-Intensity",
                "colorAxis": {
                    "colors": [
                        "#e6f2ff", "#b3d1ff", "#80bfff", "#4da6ff",
                        "#1a8cff", "#0077e6", "#005cb3", "#004080"
                    ],
                    "minValue": 0,
                    "maxValue": 12,
                },
            }),
        }
    }

    /// Thumbnail fill used by the snapshot renderer.
    pub fn tint(self) -> [u8; 4] {
        match self {
            Self::Pie => [0xe5, 0xe7, 0xeb, 0xff],
            Self::Bar => [0xd1, 0xd5, 0xdb, 0xff],
            Self::Scatter => [0x9c, 0xa3, 0xaf, 0xff],
            Self::Geo => [0x6b, 0x72, 0x80, 0xff],
        }
    }
}

/// Everything the rendering sink needs for one widget.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub cell_id: &'static str,
    pub kind: WidgetKind,
    pub chart_type: &'static str,
    pub table: SampleTable,
    pub options: Value,
}

impl From<WidgetKind> for ChartSpec {
    fn from(kind: WidgetKind) -> Self {
        Self {
            cell_id: kind.cell_id(),
            kind,
            chart_type: kind.chart_type(),
            table: kind.table(),
            options: kind.options(),
        }
    }
}
