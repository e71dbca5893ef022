// Dashboard domain model
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Position and size of one widget in grid units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    #[serde(rename = "i")]
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl CellRect {
    pub fn new(id: impl Into<String>, x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
        }
    }
}

/// Snapshot payload shown on the listing screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    Symbol(String),
    Image(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IconSymbol {
    #[serde(rename = "FaRegSmile")]
    Smile,
    #[serde(rename = "FaRegSadTear")]
    SadTear,
    #[serde(rename = "FaRegGrinSquint")]
    GrinSquint,
    #[serde(rename = "FaRegDizzy")]
    Dizzy,
}

impl IconSymbol {
    /// Unknown tags fall back to the smile icon.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "FaRegSadTear" => Self::SadTear,
            "FaRegGrinSquint" => Self::GrinSquint,
            "FaRegDizzy" => Self::Dizzy,
            _ => Self::Smile,
        }
    }
}

impl Icon {
    /// Classifies a stored payload. Empty strings mean "no icon".
    pub fn from_payload(payload: String) -> Option<Self> {
        if payload.is_empty() {
            None
        } else if payload.starts_with("data:") {
            Some(Self::Image(payload))
        } else {
            Some(Self::Symbol(payload))
        }
    }

    pub fn as_payload(&self) -> &str {
        match self {
            Self::Symbol(tag) => tag,
            Self::Image(uri) => uri,
        }
    }

    pub fn symbol(&self) -> Option<IconSymbol> {
        match self {
            Self::Symbol(tag) => Some(IconSymbol::from_tag(tag)),
            Self::Image(_) => None,
        }
    }
}

impl Serialize for Icon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_payload())
    }
}

fn deserialize_icon<'de, D>(deserializer: D) -> Result<Option<Icon>, D::Error>
where
    D: Deserializer<'de>,
{
    let payload: Option<String> = Option::deserialize(deserializer)?;
    Ok(payload.and_then(Icon::from_payload))
}

/// Layouts are stored per breakpoint; only the large breakpoint is used.
mod breakpoint_layout {
    use super::CellRect;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct Borrowed<'a> {
        lg: &'a [CellRect],
    }

    #[derive(Deserialize)]
    struct Owned {
        #[serde(default)]
        lg: Vec<CellRect>,
    }

    pub fn serialize<S: Serializer>(cells: &[CellRect], serializer: S) -> Result<S::Ok, S::Error> {
        Borrowed { lg: cells }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<CellRect>, D::Error> {
        Ok(Owned::deserialize(deserializer)?.lg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRecord {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    #[serde(
        default,
        deserialize_with = "deserialize_icon",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<Icon>,
    #[serde(with = "breakpoint_layout")]
    pub layout: Vec<CellRect>,
}

impl DashboardRecord {
    pub fn new(
        id: String,
        name: String,
        date: NaiveDate,
        icon: Option<Icon>,
        layout: Vec<CellRect>,
    ) -> Self {
        Self {
            id,
            name,
            date,
            icon,
            layout,
        }
    }
}

/// Random 9 character base-36 token.
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
