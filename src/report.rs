use time::Date;

use crate::aggregate::Headline;
use crate::data;

const HTML_HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Vaccination Statistics Malaysia</title>
<style>
body { font-family: sans-serif; margin: 1em 2em; background: #fafafa; color: #1a1a1a; }
h1 { margin-bottom: 0.2em; }
.row { display: flex; flex-wrap: wrap; }
.col-1 { flex: 1; min-width: 480px; margin: 0.5em; background: #fff; border: 1px solid #ddd; padding: 0.5em; }
.headline { display: inline-block; margin-right: 1.5em; }
.headline .delta { color: #666; font-size: 0.9em; }
footer { margin-top: 1em; font-size: 0.85em; color: #555; }
</style>
</head>
<body>
"#;

/// Metadata lines printed above the chart grid.
pub struct ReportMeta {
    pub generated_at: String,
    pub timezone_label: String,
    pub latest_date: Date,
}

/// One cell of the chart grid: optional headline numbers plus a rendered
/// SVG fragment.
pub struct Panel {
    pub headlines: Vec<Headline>,
    pub svg: String,
}

/// Groups digits in threes, zero decimal places.
pub fn format_count(value: f64) -> String {
    let negative = value < 0.0;
    let digits = (value.abs().round() as u64).to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_delta(value: f64) -> String {
    if value < 0.0 {
        format_count(value)
    } else {
        format!("+{}", format_count(value))
    }
}

/// Assembles the whole document: header fragment, metadata, two panels per
/// row, then footnotes and attribution.
pub fn render_document(meta: &ReportMeta, panels: &[Panel], footnotes: &[String]) -> String {
    let mut html = String::with_capacity(
        HTML_HEADER.len() + panels.iter().map(|p| p.svg.len() + 256).sum::<usize>(),
    );

    html.push_str(HTML_HEADER);
    html.push_str("<h1>Vaccination Statistics Malaysia</h1>\n");
    html.push_str(
        "<p>Data source: <a href=\"https://github.com/CITF-Malaysia/citf-public\">CITF Malaysia public datasets</a></p>\n",
    );
    html.push_str(&format!(
        "<p>Data refreshed: {} ({})<br>\n",
        meta.generated_at, meta.timezone_label
    ));
    html.push_str(&format!(
        "Latest date in data: {}</p>\n",
        data::format_date(meta.latest_date)
    ));

    for pair in panels.chunks(2) {
        html.push_str("<div class=\"row\">\n");
        for panel in pair {
            html.push_str("<div class=\"col-1\">\n");
            for headline in &panel.headlines {
                html.push_str(&format!(
                    "<div class=\"headline\">{} <strong>{}</strong> <span class=\"delta\">{}</span></div>\n",
                    headline.label,
                    format_count(headline.latest),
                    format_delta(headline.delta)
                ));
            }
            html.push_str(&panel.svg);
            html.push_str("\n</div>\n");
        }
        html.push_str("</div>\n");
    }

    html.push_str("<footer>\n");
    for note in footnotes {
        html.push_str(&format!("<p>{note}</p>\n"));
    }
    html.push_str(
        "<p>Official datapoint licensing: <a href=\"https://www.data.gov.my/p/pekeliling-data-terbuka\">Pekeliling Pelaksanaan Data Terbuka Bil.1/2015</a></p>\n",
    );
    html.push_str("</footer>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn counts_group_digits() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1234567.0), "1,234,567");
        assert_eq!(format_count(-1234.0), "-1,234");
        // Zero decimal places: rounds, never truncates.
        assert_eq!(format_count(1499.6), "1,500");
    }

    #[test]
    fn deltas_are_signed() {
        assert_eq!(format_delta(1234.0), "+1,234");
        assert_eq!(format_delta(0.0), "+0");
        assert_eq!(format_delta(-56.0), "-56");
    }

    #[test]
    fn document_carries_metadata_and_panels() {
        let meta = ReportMeta {
            generated_at: "2021-08-10 12:00:00".to_string(),
            timezone_label: "MYT".to_string(),
            latest_date: date!(2021 - 08 - 10),
        };
        let panels = vec![
            Panel {
                headlines: vec![Headline {
                    label: "Total doses".to_string(),
                    latest: 1680.0,
                    delta: 180.0,
                }],
                svg: "<svg>one</svg>".to_string(),
            },
            Panel {
                headlines: vec![],
                svg: "<svg>two</svg>".to_string(),
            },
            Panel {
                headlines: vec![],
                svg: "<svg>three</svg>".to_string(),
            },
        ];
        let footnotes = vec!["*Klang Valley consists of three states".to_string()];

        let html = render_document(&meta, &panels, &footnotes);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Data refreshed: 2021-08-10 12:00:00 (MYT)"));
        assert!(html.contains("Latest date in data: 2021-08-10"));
        assert!(html.contains("<strong>1,680</strong>"));
        assert!(html.contains("+180"));
        assert!(html.contains("<svg>three</svg>"));
        assert!(html.contains("*Klang Valley consists of three states"));
        assert_eq!(html.matches("<div class=\"row\">").count(), 2);
        assert!(html.ends_with("</html>\n"));
    }
}
