use std::{fmt, str::FromStr};

use common::error::AppError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketId {
    Us,
    Japan,
    Germany,
    Brazil,
    Uae,
    Uk,
}

impl MarketId {
    pub const ALL: [MarketId; 6] = [
        MarketId::Us,
        MarketId::Japan,
        MarketId::Germany,
        MarketId::Brazil,
        MarketId::Uae,
        MarketId::Uk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MarketId::Us => "us",
            MarketId::Japan => "japan",
            MarketId::Germany => "germany",
            MarketId::Brazil => "brazil",
            MarketId::Uae => "uae",
            MarketId::Uk => "uk",
        }
    }

    pub fn market(self) -> &'static Market {
        match self {
            MarketId::Us => &US,
            MarketId::Japan => &JAPAN,
            MarketId::Germany => &GERMANY,
            MarketId::Brazil => &BRAZIL,
            MarketId::Uae => &UAE,
            MarketId::Uk => &UK,
        }
    }
}

impl FromStr for MarketId {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        MarketId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::Validation(format!("Unknown market: {wanted}")))
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cultural profile used to adapt a campaign to one market.
#[derive(Debug)]
pub struct Market {
    pub name: &'static str,
    pub culture: &'static str,
    pub adaptations: [&'static str; 3],
    /// Appended to the campaign text to form the image prompt.
    pub prompt_style: &'static str,
    /// `background/foreground` hex pair for the placeholder image.
    pub placeholder_colors: &'static str,
}

static US: Market = Market {
    name: "United States",
    culture: "Direct, value-focused",
    adaptations: [
        "Bold, direct messaging",
        "Red/white/blue accent colors",
        "Action-oriented CTAs",
    ],
    prompt_style: "bold and direct style, red white blue accents, aspirational lifestyle",
    placeholder_colors: "1d3557/e63946",
};

static JAPAN: Market = Market {
    name: "Japan",
    culture: "Subtle, harmony-oriented",
    adaptations: [
        "Minimal text overlay",
        "Soft color palette",
        "Group harmony themes",
    ],
    prompt_style: "minimalist japanese aesthetic, soft colors, harmonious composition",
    placeholder_colors: "f1faee/e63946",
};

static GERMANY: Market = Market {
    name: "Germany",
    culture: "Technical, quality-driven",
    adaptations: [
        "Technical specifications prominent",
        "Clean, structured layout",
        "Quality certifications visible",
    ],
    prompt_style: "clean technical style, precision and quality focus, structured layout",
    placeholder_colors: "457b9d/1d3557",
};

static BRAZIL: Market = Market {
    name: "Brazil",
    culture: "Vibrant, emotional",
    adaptations: [
        "Vibrant colors and energy",
        "Community and celebration themes",
        "Warm, personal tone",
    ],
    prompt_style: "vibrant and energetic, warm colors, celebration and community",
    placeholder_colors: "e63946/f1faee",
};

static UAE: Market = Market {
    name: "UAE",
    culture: "Luxury, aspirational",
    adaptations: [
        "Luxury positioning",
        "Gold accent colors",
        "Premium imagery and styling",
    ],
    prompt_style: "luxury premium style, gold accents, sophisticated and aspirational",
    placeholder_colors: "1d3557/FFD700",
};

static UK: Market = Market {
    name: "United Kingdom",
    culture: "Witty, understated",
    adaptations: [
        "Clever wordplay",
        "Heritage visual cues",
        "Understated elegance",
    ],
    prompt_style: "refined british aesthetic, heritage elements, understated elegance",
    placeholder_colors: "457b9d/e63946",
};

/// Escapes everything except ASCII alphanumerics and `- _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

impl Market {
    pub fn prompt_for(&self, campaign: &str) -> String {
        format!("{campaign}, {}", self.prompt_style)
    }

    pub fn placeholder_url(&self) -> Result<String, AppError> {
        let url = Url::parse("https://placehold.co/800x600/")
            .and_then(|base| base.join(self.placeholder_colors))
            .map_err(|err| AppError::InternalError(format!("building placeholder url: {err}")))?;
        Ok(format!(
            "{url}?text={}",
            utf8_percent_encode(self.name, URI_COMPONENT)
        ))
    }
}
