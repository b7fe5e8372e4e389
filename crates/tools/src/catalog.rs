//! Access-Metric Column Catalog
//!
//! The access dataset has a fixed, ordered schema. Each column has a canonical
//! name used on the wire, the CSV headers it may appear under, and keywords
//! for matching free-text operator requests.

use serde::{Deserialize, Serialize};

/// How cells of a column are typed and aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Text,
    /// Non-negative integer counts, summed when grouped
    Count,
    /// Percentages like "35%", averaged when grouped
    Percent,
    /// `h:mm:ss` durations, averaged when grouped
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessColumn {
    Date,
    PageTitle,
    Url,
    Visits,
    BounceRate,
    AvgSessionDuration,
    Conversions,
    ConversionRate,
}

impl AccessColumn {
    pub const ALL: [AccessColumn; 8] = [
        AccessColumn::Date,
        AccessColumn::PageTitle,
        AccessColumn::Url,
        AccessColumn::Visits,
        AccessColumn::BounceRate,
        AccessColumn::AvgSessionDuration,
        AccessColumn::Conversions,
        AccessColumn::ConversionRate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AccessColumn::Date => "date",
            AccessColumn::PageTitle => "page_title",
            AccessColumn::Url => "url",
            AccessColumn::Visits => "visits",
            AccessColumn::BounceRate => "bounce_rate",
            AccessColumn::AvgSessionDuration => "avg_session_duration",
            AccessColumn::Conversions => "conversions",
            AccessColumn::ConversionRate => "conversion_rate",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            AccessColumn::Date => ColumnKind::Date,
            AccessColumn::PageTitle | AccessColumn::Url => ColumnKind::Text,
            AccessColumn::Visits | AccessColumn::Conversions => ColumnKind::Count,
            AccessColumn::BounceRate | AccessColumn::ConversionRate => ColumnKind::Percent,
            AccessColumn::AvgSessionDuration => ColumnKind::Duration,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AccessColumn::Date => "day the record was taken (e.g. 2025-01-03)",
            AccessColumn::PageTitle => "title of the web page",
            AccessColumn::Url => "URL of the page",
            AccessColumn::Visits => "number of visits (a.k.a. PV, page views, access count)",
            AccessColumn::BounceRate => "share of visitors leaving immediately (e.g. 35%)",
            AccessColumn::AvgSessionDuration => "average time on page (h:mm:ss, e.g. 0:02:45)",
            AccessColumn::Conversions => "number of conversions",
            AccessColumn::ConversionRate => "conversion rate (e.g. 1.67%)",
        }
    }

    /// CSV headers this column is accepted under, canonical name first.
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            AccessColumn::Date => &["date", "日付"],
            AccessColumn::PageTitle => &["page_title", "ページタイトル"],
            AccessColumn::Url => &["url", "URL"],
            AccessColumn::Visits => &["visits", "訪問数"],
            AccessColumn::BounceRate => &["bounce_rate", "直帰率"],
            AccessColumn::AvgSessionDuration => &["avg_session_duration", "平均滞在時間"],
            AccessColumn::Conversions => &["conversions", "CV数"],
            AccessColumn::ConversionRate => &["conversion_rate", "CV率"],
        }
    }

    /// Lowercase keywords for fallback matching against free text.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            AccessColumn::Date => &["date", "day", "daily", "日付", "日別", "日ごと"],
            AccessColumn::PageTitle => &["title", "page name", "タイトル", "ページ名"],
            AccessColumn::Url => &["url", "link", "address", "リンク", "アドレス"],
            AccessColumn::Visits => &["visit", "pv", "page view", "access", "訪問", "ページビュー", "アクセス"],
            AccessColumn::BounceRate => &["bounce", "直帰", "バウンス"],
            AccessColumn::AvgSessionDuration => &["duration", "time on page", "滞在", "時間"],
            AccessColumn::Conversions => &[
                "cv count",
                "conversions",
                "conversion count",
                "cv数",
                "コンバージョン数",
                "成約数",
                "成約件数",
            ],
            AccessColumn::ConversionRate => &[
                "cv rate",
                "cvr",
                "conversion rate",
                "cv率",
                "コンバージョン率",
                "成約率",
            ],
        }
    }

    /// Resolve a column name or header, ignoring ASCII case and surrounding whitespace.
    pub fn resolve(name: &str) -> Option<AccessColumn> {
        let wanted = name.trim();
        Self::ALL.into_iter().find(|col| {
            col.headers()
                .iter()
                .any(|h| h.eq_ignore_ascii_case(wanted))
        })
    }

    /// Columns whose keywords occur in `text`, in catalog order.
    pub fn match_keywords(text: &str) -> Vec<AccessColumn> {
        let haystack = text.trim().to_lowercase();
        if haystack.is_empty() {
            return Vec::new();
        }
        Self::ALL
            .into_iter()
            .filter(|col| col.keywords().iter().any(|k| keyword_occurs(&haystack, k)))
            .collect()
    }

    /// Markdown description of the catalog for model instructions.
    pub fn catalog_markdown() -> String {
        let mut out = String::from("| column | type | description |\n|---|---|---|\n");
        for col in Self::ALL {
            let kind = match col.kind() {
                ColumnKind::Date => "DATE",
                ColumnKind::Text => "STRING",
                ColumnKind::Count => "INTEGER",
                ColumnKind::Percent => "PERCENT",
                ColumnKind::Duration => "TIME (h:mm:ss)",
            };
            out.push_str(&format!("| `{}` | {} | {} |\n", col.name(), kind, col.description()));
        }
        out
    }
}

/// ASCII keywords must start a word, so "day" does not hit "today".
fn keyword_occurs(haystack: &str, keyword: &str) -> bool {
    let ascii = keyword.starts_with(|c: char| c.is_ascii_alphanumeric());
    haystack.match_indices(keyword).any(|(at, _)| {
        !ascii || !haystack[..at].ends_with(|c: char| c.is_ascii_alphanumeric())
    })
}

impl std::fmt::Display for AccessColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
