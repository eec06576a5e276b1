use serde::{Deserialize, Serialize};

/// Era filter vocabulary accepted by the recommendation endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EraFilter {
    #[default]
    All,
    Old,
    #[serde(rename = "80s")]
    Eighties,
    #[serde(rename = "90s")]
    Nineties,
    #[serde(rename = "2000s")]
    TwoThousands,
    Recent,
}

impl EraFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            EraFilter::All => "all",
            EraFilter::Old => "old",
            EraFilter::Eighties => "80s",
            EraFilter::Nineties => "90s",
            EraFilter::TwoThousands => "2000s",
            EraFilter::Recent => "recent",
        }
    }

    /// Inclusive release-year bounds, or `None` when unfiltered.
    pub fn year_bounds(self) -> Option<(i32, i32)> {
        match self {
            EraFilter::All => None,
            EraFilter::Old => Some((1, 1979)),
            EraFilter::Eighties => Some((1980, 1989)),
            EraFilter::Nineties => Some((1990, 1999)),
            EraFilter::TwoThousands => Some((2000, 2010)),
            EraFilter::Recent => Some((2011, i32::MAX)),
        }
    }
}

/// One suggested title from the model. The model is instructed to use
/// lowercase unaccented keys, but Spanish variants show up anyway, so the
/// aliases are resolved once here at the decoding boundary.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Suggestion {
    #[serde(default, alias = "titulo", alias = "título")]
    pub title: Option<String>,
    #[serde(default, alias = "razon", alias = "razón")]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuggestionList {
    #[serde(default)]
    pub top_picks: Vec<Suggestion>,
    #[serde(default)]
    pub also_like: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub era: EraFilter,
    #[serde(default)]
    pub user_id: Option<i32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecommendedItem {
    pub id: i32,
    pub title: String,
    pub poster: Option<String>,
    pub genres: Vec<String>,
    pub reason: String,
    pub year: Option<i32>,
    pub runtime: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RecommendationResponse {
    pub top_picks: Vec<RecommendedItem>,
    pub also_like: Vec<RecommendedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_msg: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_filter_parses_short_names() {
        let era: EraFilter = serde_json::from_str("\"80s\"").unwrap();
        assert_eq!(era, EraFilter::Eighties);
        let era: EraFilter = serde_json::from_str("\"2000s\"").unwrap();
        assert_eq!(era, EraFilter::TwoThousands);
        let era: EraFilter = serde_json::from_str("\"recent\"").unwrap();
        assert_eq!(era, EraFilter::Recent);
    }

    #[test]
    fn era_bounds_match_catalog_ranges() {
        assert_eq!(EraFilter::All.year_bounds(), None);
        assert_eq!(EraFilter::Old.year_bounds(), Some((1, 1979)));
        assert_eq!(EraFilter::TwoThousands.year_bounds(), Some((2000, 2010)));
    }

    #[test]
    fn suggestion_accepts_spanish_aliases() {
        let s: Suggestion =
            serde_json::from_str(r#"{"título": "El Padrino", "razón": "clásico"}"#).unwrap();
        assert_eq!(s.title.as_deref(), Some("El Padrino"));
        assert_eq!(s.reason.as_deref(), Some("clásico"));

        let s: Suggestion = serde_json::from_str(r#"{"title": "Heat"}"#).unwrap();
        assert_eq!(s.title.as_deref(), Some("Heat"));
        assert!(s.reason.is_none());
    }

    #[test]
    fn suggestion_list_tolerates_missing_keys() {
        let list: SuggestionList =
            serde_json::from_str(r#"{"top_picks": [{"title": "Alien"}]}"#).unwrap();
        assert_eq!(list.top_picks.len(), 1);
        assert!(list.also_like.is_empty());
    }
}
