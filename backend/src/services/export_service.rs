use crate::error::ConfigError;
use crate::models::{ResultRow, ViralReport};
use crate::utils::{compare_with_order_float, SortOrder};
use std::cmp::Ordering;
use url::form_urlencoded;

pub const EXPORT_FILENAME: &str = "viral_videos_last_days.csv";

pub const CSV_COLUMNS: [&str; 10] = [
    "Keyword",
    "Title",
    "Channel",
    "Subscribers",
    "Language",
    "DurationSec",
    "PublishedAt",
    "Views",
    "Views/Day",
    "URL",
];

/// `sort` keys of the table columns, aligned with [`CSV_COLUMNS`].
/// The URL column can't be sorted on.
const SORT_KEYS: [Option<&str>; 10] = [
    Some("keyword"),
    Some("title"),
    Some("channel"),
    Some("subscribers"),
    Some("language"),
    Some("duration"),
    Some("published"),
    Some("views"),
    Some("views_per_day"),
    None,
];

/// Column and direction of the HTML table. Defaults to Views/Day, fastest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSort {
    pub column: usize,
    pub order: SortOrder,
}

impl Default for TableSort {
    fn default() -> Self {
        TableSort {
            column: 8,
            order: SortOrder::Desc,
        }
    }
}

impl TableSort {
    pub fn parse(sort: Option<&str>, order: Option<&str>) -> Result<Self, ConfigError> {
        let column = match sort {
            None => TableSort::default().column,
            Some(raw) => {
                let wanted = raw.trim().to_lowercase();
                SORT_KEYS
                    .iter()
                    .position(|key| *key == Some(wanted.as_str()))
                    .ok_or_else(|| ConfigError::invalid("sort", format!("unknown column '{raw}'")))?
            }
        };

        let order = match order.map(|o| o.trim().to_lowercase()).as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(other) => {
                return Err(ConfigError::invalid("order", format!("'{other}' is not asc or desc")))
            }
        };

        Ok(TableSort { column, order })
    }

    fn key(&self) -> &'static str {
        SORT_KEYS[self.column].unwrap_or("views_per_day")
    }

    fn compare(&self, a: &ResultRow, b: &ResultRow) -> Ordering {
        let ascending = match self.column {
            0 => a.keyword.cmp(&b.keyword),
            1 => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            2 => a.channel.to_lowercase().cmp(&b.channel.to_lowercase()),
            3 => a.subscribers.cmp(&b.subscribers),
            4 => a.language.cmp(&b.language),
            5 => a.duration_sec.cmp(&b.duration_sec),
            6 => a.published_at.cmp(&b.published_at),
            7 => a.views.cmp(&b.views),
            _ => return compare_with_order_float(a.views_per_day, b.views_per_day, self.order),
        };
        match self.order {
            SortOrder::Asc => ascending,
            SortOrder::Desc => ascending.reverse(),
        }
    }
}

/// Stable: rows equal on the column keep their current order.
pub fn sort_table_rows(rows: &mut [ResultRow], sort: TableSort) {
    rows.sort_by(|a, b| sort.compare(a, b));
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row_fields(row: &ResultRow) -> [String; 10] {
    [
        row.keyword.clone(),
        row.title.clone(),
        row.channel.clone(),
        row.subscribers.map(|s| s.to_string()).unwrap_or_default(),
        row.language.clone(),
        row.duration_sec.to_string(),
        row.published_at.clone(),
        row.views.to_string(),
        format!("{:.2}", row.views_per_day),
        row.url.clone(),
    ]
}

/// Header line plus one line per row, in the order given.
pub fn rows_to_csv(rows: &[ResultRow]) -> String {
    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');

    for row in rows {
        let line: Vec<String> = row_fields(row).iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Link target for a column header: the current run parameters with `sort`
/// and `order` replaced. Clicking the active column flips its direction.
fn header_href(query: &str, key: &str, current: TableSort) -> String {
    let order = match (current.key() == key, current.order) {
        (true, SortOrder::Desc) => "asc",
        _ => "desc",
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if name != "sort" && name != "order" {
            serializer.append_pair(&name, &value);
        }
    }
    serializer.append_pair("sort", key);
    serializer.append_pair("order", order);
    format!("?{}", serializer.finish())
}

/// Standalone HTML page with the report message and the row table, ordered
/// by `sort`. Column headers link back with `query` (the raw run parameters)
/// re-sorted on that column. The URL column links to the video.
pub fn report_to_html(report: &ViralReport, sort: TableSort, query: &str) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Viral Topics</title></head>\n<body>\n",
    );
    html.push_str(&format!("<p>{}</p>\n", escape_html(&report.message)));

    for issue in &report.issues {
        html.push_str(&format!(
            "<p class=\"issue\">{:?} error for {}: {}</p>\n",
            issue.scope,
            escape_html(&issue.target),
            escape_html(&issue.message)
        ));
    }

    if !report.rows.is_empty() {
        html.push_str("<table>\n<thead><tr>");
        for (column, key) in CSV_COLUMNS.iter().zip(SORT_KEYS) {
            match key {
                Some(key) => html.push_str(&format!(
                    "<th><a href=\"{}\">{}</a></th>",
                    escape_html(&header_href(query, key, sort)),
                    escape_html(column)
                )),
                None => html.push_str(&format!("<th>{}</th>", escape_html(column))),
            }
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        let mut rows = report.rows.clone();
        sort_table_rows(&mut rows, sort);
        for row in &rows {
            html.push_str("<tr>");
            let fields = row_fields(row);
            let [cells @ .., url] = &fields;
            for cell in cells {
                html.push_str(&format!("<td>{}</td>", escape_html(cell)));
            }
            let url = escape_html(url);
            html.push_str(&format!("<td><a href=\"{url}\">{url}</a></td>"));
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueScope, RunIssue, RunOutcome};

    fn sample_row() -> ResultRow {
        ResultRow {
            keyword: "Test".to_string(),
            title: "Hello, \"world\"".to_string(),
            channel: "Chan <1>".to_string(),
            subscribers: Some(500),
            language: "en".to_string(),
            duration_sec: 90,
            published_at: "2026-10-18T00:00:00Z".to_string(),
            views: 3000,
            views_per_day: 3000.0,
            url: "https://www.youtube.com/watch?v=abc".to_string(),
        }
    }

    #[test]
    fn csv_has_fixed_header_and_quotes_when_needed() {
        let mut hidden = sample_row();
        hidden.subscribers = None;
        hidden.title = "plain".to_string();
        hidden.views_per_day = 12.5;

        let csv = rows_to_csv(&[sample_row(), hidden]);
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Keyword,Title,Channel,Subscribers,Language,DurationSec,PublishedAt,Views,Views/Day,URL"
        );
        assert_eq!(
            lines[1],
            "Test,\"Hello, \"\"world\"\"\",Chan <1>,500,en,90,2026-10-18T00:00:00Z,3000,3000.00,https://www.youtube.com/watch?v=abc"
        );
        assert_eq!(
            lines[2],
            "Test,plain,Chan <1>,,en,90,2026-10-18T00:00:00Z,3000,12.50,https://www.youtube.com/watch?v=abc"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_of_no_rows_is_just_the_header() {
        assert_eq!(rows_to_csv(&[]).lines().count(), 1);
    }

    #[test]
    fn html_links_urls_and_escapes_text() {
        let report = ViralReport {
            outcome: RunOutcome::Found,
            message: RunOutcome::Found.message(1),
            candidates_found: 1,
            rows: vec![sample_row()],
            issues: vec![RunIssue {
                scope: IssueScope::Search,
                target: "cats".to_string(),
                message: "HTTP 403: <quota>".to_string(),
            }],
        };

        let html = report_to_html(&report, TableSort::default(), "keywords=cats");
        assert!(html.contains(
            "<a href=\"https://www.youtube.com/watch?v=abc\">https://www.youtube.com/watch?v=abc</a>"
        ));
        assert!(html.contains("<td>Chan &lt;1&gt;</td>"));
        assert!(html.contains("<td>Hello, &quot;world&quot;</td>"));
        assert!(html.contains("HTTP 403: &lt;quota&gt;"));
        assert!(html.contains(
            "<th><a href=\"?keywords=cats&amp;sort=views_per_day&amp;order=asc\">Views/Day</a></th>"
        ));
        assert!(html.contains(
            "<th><a href=\"?keywords=cats&amp;sort=views&amp;order=desc\">Views</a></th>"
        ));
        assert!(html.contains("<th>URL</th>"));
    }

    #[test]
    fn html_without_rows_has_no_table() {
        let report = ViralReport {
            outcome: RunOutcome::NoCandidates,
            message: RunOutcome::NoCandidates.message(0),
            candidates_found: 0,
            rows: vec![],
            issues: vec![],
        };

        let html = report_to_html(&report, TableSort::default(), "");
        assert!(html.contains("No videos collected"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn table_sort_parses_keys_and_rejects_unknown() {
        assert_eq!(TableSort::parse(None, None).unwrap(), TableSort::default());

        let views = TableSort::parse(Some("Views"), Some("ASC")).unwrap();
        assert_eq!(views.key(), "views");
        assert!(matches!(views.order, SortOrder::Asc));

        assert!(TableSort::parse(Some("url"), None).is_err());
        assert!(TableSort::parse(Some("colour"), None).is_err());
        assert!(TableSort::parse(None, Some("sideways")).is_err());
    }

    #[test]
    fn table_rows_follow_the_chosen_column() {
        let mut rows = vec![sample_row(), sample_row(), sample_row()];
        rows[0].channel = "beta".to_string();
        rows[0].subscribers = None;
        rows[1].channel = "Alpha".to_string();
        rows[1].subscribers = Some(10);
        rows[2].channel = "gamma".to_string();
        rows[2].subscribers = Some(5);

        let mut by_channel = rows.clone();
        sort_table_rows(&mut by_channel, TableSort::parse(Some("channel"), Some("asc")).unwrap());
        let channels: Vec<_> = by_channel.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(channels, vec!["Alpha", "beta", "gamma"]);

        // Unknown subscribers sort below every known count.
        let mut by_subs = rows.clone();
        sort_table_rows(&mut by_subs, TableSort::parse(Some("subscribers"), None).unwrap());
        let subs: Vec<_> = by_subs.iter().map(|r| r.subscribers).collect();
        assert_eq!(subs, vec![Some(10), Some(5), None]);
    }

    #[test]
    fn header_links_keep_run_parameters() {
        let current = TableSort::parse(Some("views"), Some("desc")).unwrap();
        let query = "keywords=a+b&keywords=c&days=7&sort=views&order=desc";

        assert_eq!(
            header_href(query, "views", current),
            "?keywords=a+b&keywords=c&days=7&sort=views&order=asc"
        );
        assert_eq!(
            header_href(query, "title", current),
            "?keywords=a+b&keywords=c&days=7&sort=title&order=desc"
        );
    }
}
