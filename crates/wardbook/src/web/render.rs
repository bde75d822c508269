//! HTML rendering.
//!
//! Pages are `Display` implementations written straight into the response
//! body. Every value that came from a user passes through [`Escaped`].

use std::fmt::{self, Display, Formatter};

use chrono::NaiveDate;

use crate::records::{Outcome, StaffDetail, StaffSummary, MAX_DEPENDANTS};
use crate::storage::Statistics;

use super::dispatch::{ADD_DEPENDANT, CREATE_STAFF, EXPORT_CSV, LOG_VISIT, VIEW_STAFF};

const TITLE: &str = "Staff Clinic Records";
const PLACEHOLDER_PHOTO: &str = "https://via.placeholder.com/90";
const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js";

const STYLE: &str = r"
body{margin:0;background:#f5f7fb;color:#0f172a;font-family:system-ui,sans-serif}
.container{max-width:1200px;margin:24px auto;padding:16px}
.header{display:flex;align-items:center;justify-content:space-between;gap:12px}
.card{background:#fff;padding:18px;border-radius:12px;box-shadow:0 8px 20px rgba(2,6,23,.06)}
.grid{display:grid;gap:16px;margin-top:16px}
.cols-3{grid-template-columns:repeat(3,1fr)}
.cols-2{grid-template-columns:repeat(2,1fr)}
.row{display:flex;gap:12px}
.input{width:100%;padding:10px;border-radius:8px;border:1px solid #e6eef8;box-sizing:border-box}
.btn{padding:10px 14px;border-radius:8px;background:#0ea5a4;color:#fff;border:none;cursor:pointer;text-decoration:none}
.small{font-size:13px;color:#6b7280}
.table{width:100%;border-collapse:collapse;margin-top:12px}
.table th,.table td{padding:10px;border-bottom:1px solid #eef2f7;text-align:left}
.preview{width:72px;height:72px;border-radius:6px;object-fit:cover}
.notice{background:#fef2f2;color:#991b1b;padding:12px;border-radius:8px;margin-top:16px}
@media(max-width:900px){.cols-3,.cols-2{grid-template-columns:1fr}.row{flex-direction:column}}
";

/// HTML-escape a string.
#[must_use]
pub fn escape_html(s: &str) -> String {
    Escaped(s).to_string()
}

/// Displays its contents with HTML metacharacters escaped.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for ch in self.0.chars() {
            match ch {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                _ => write!(f, "{ch}")?,
            }
        }
        Ok(())
    }
}

/// What the detail panel below the dashboard shows.
#[derive(Debug, Clone, Copy)]
pub enum DetailPanel<'a> {
    /// No record was requested.
    Hidden,
    /// A record was requested but does not exist.
    NotFound,
    /// The requested record.
    Staff(&'a StaffDetail),
}

/// The single application page.
#[derive(Debug)]
pub struct IndexPage<'a> {
    /// Current listing filter.
    pub search: &'a str,
    /// Notice carried over from a redirect.
    pub notice: Option<&'a str>,
    /// Staff listing.
    pub staff: &'a [StaffSummary],
    /// Dashboard counters.
    pub stats: &'a Statistics,
    /// Detail panel.
    pub detail: DetailPanel<'a>,
    /// Prefilled visit date.
    pub today: NaiveDate,
}

impl Display for IndexPage<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n\
             <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
             <div class=\"container\">\n"
        )?;

        self.header(f)?;
        if let Some(notice) = self.notice {
            writeln!(f, "<div class=\"notice\">{}</div>", Escaped(notice))?;
        }

        f.write_str("<div class=\"grid cols-3\">\n")?;
        registration_form(f)?;
        self.dashboard(f)?;
        self.listing(f)?;
        f.write_str("</div>\n")?;

        match self.detail {
            DetailPanel::Hidden => {}
            DetailPanel::NotFound => {
                f.write_str("<div class=\"grid\"><div class=\"card\">Staff not found</div></div>\n")?;
            }
            DetailPanel::Staff(detail) => self.detail_panel(f, detail)?,
        }

        f.write_str("</div>\n")?;
        self.chart_script(f)?;
        f.write_str("</body>\n</html>\n")
    }
}

impl IndexPage<'_> {
    fn header(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<div class=\"header\">\n<div><h2 style=\"margin:0\">{TITLE}</h2>\
             <div class=\"small\">Manage staff, dependants, visits and admissions</div></div>\n\
             <div class=\"row\">\n<form method=\"get\" class=\"row\" style=\"margin:0\">\
             <input class=\"input\" name=\"search\" placeholder=\"Search by hospital no, name, station...\" value=\"{}\">\
             <button class=\"btn\">Search</button></form>\n\
             <a class=\"btn\" href=\"?action={EXPORT_CSV}\">Export CSV</a>\n</div>\n</div>\n",
            Escaped(self.search)
        )
    }

    fn dashboard(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let stats = self.stats;
        f.write_str("<div class=\"card\">\n<h3 style=\"margin-top:0\">Quick Stats</h3>\n<div class=\"row\">\n")?;
        for (label, value) in [
            ("Total Staff", stats.total_staff),
            ("Total Visits", stats.total_visits),
            ("Admissions", stats.admissions),
        ] {
            write!(
                f,
                "<div><div class=\"small\">{label}</div>\
                 <div style=\"font-weight:700;font-size:20px\">{value}</div></div>\n"
            )?;
        }
        f.write_str(
            "</div>\n<div style=\"margin-top:12px\"><canvas id=\"dashboardChart\" height=\"120\"></canvas></div>\n</div>\n",
        )
    }

    fn listing(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(
            "<div class=\"card\">\n<h3 style=\"margin-top:0\">Latest Staff</h3>\n\
             <table class=\"table\">\n<thead><tr><th>Hospital No</th><th>Name</th><th>Station</th><th></th></tr></thead>\n<tbody>\n",
        )?;
        for staff in self.staff {
            write!(
                f,
                "<tr><td>{}</td><td>{}</td><td>{}</td>\
                 <td><a href=\"?action={VIEW_STAFF}&amp;id={}\">View</a></td></tr>\n",
                Escaped(&staff.hospital_number),
                Escaped(&staff.full_name),
                Escaped(&staff.station),
                staff.id
            )?;
        }
        f.write_str("</tbody>\n</table>\n</div>\n")
    }

    fn detail_panel(&self, f: &mut Formatter<'_>, detail: &StaffDetail) -> fmt::Result {
        let staff = &detail.staff;
        f.write_str("<div class=\"grid cols-2\">\n<div class=\"card\">\n")?;
        write!(
            f,
            "<div class=\"row\" style=\"align-items:center\">\
             <img src=\"{}\" class=\"preview\" alt=\"\">\
             <div><h3 style=\"margin:0\">{}</h3>\
             <div class=\"small\">Hospital No: {}</div>\
             <div class=\"small\">Station: {} &bull; Rank: {}</div>\
             <div class=\"small\">Telephone: {}</div></div></div>\n",
            PhotoSrc(staff.photo.as_deref()),
            Escaped(&staff.full_name),
            Escaped(&staff.hospital_number),
            Escaped(&staff.station),
            Escaped(&staff.rank),
            Escaped(&staff.telephone),
        )?;

        write!(
            f,
            "<hr style=\"margin:12px 0\">\n<h4>Dependants ({}/{MAX_DEPENDANTS})</h4>\n\
             <div style=\"display:flex;gap:8px;flex-wrap:wrap\">\n",
            detail.dependants.len()
        )?;
        for dependant in &detail.dependants {
            write!(
                f,
                "<div style=\"width:120px\" class=\"small card\">\
                 <img src=\"{}\" alt=\"\" style=\"width:100%;height:80px;object-fit:cover;border-radius:6px\">\
                 <div style=\"padding:6px 0\"><strong>{}</strong><br><span class=\"small\">{}</span></div></div>\n",
                PhotoSrc(dependant.photo.as_deref()),
                Escaped(&dependant.name),
                Escaped(&dependant.relation),
            )?;
        }
        if detail.can_add_dependant() {
            write!(
                f,
                "<div style=\"width:220px\" class=\"card small\">\
                 <form method=\"post\" enctype=\"multipart/form-data\" action=\"?action={ADD_DEPENDANT}\">\
                 <input type=\"hidden\" name=\"staff_id\" value=\"{}\">\
                 <input class=\"input\" name=\"dep_name\" placeholder=\"Dependant Name\" required>\
                 <input class=\"input\" name=\"dep_relation\" placeholder=\"Relation\" required>\
                 <input class=\"input\" name=\"dep_dob\" placeholder=\"DOB (YYYY-MM-DD)\">\
                 Photo <input type=\"file\" name=\"dep_photo\" accept=\"image/*\">\
                 <div style=\"margin-top:8px\"><button class=\"btn\">Add Dependant</button></div></form></div>\n",
                staff.id
            )?;
        }
        f.write_str("</div>\n</div>\n")?;

        self.visit_card(f, detail)?;
        f.write_str("</div>\n")
    }

    fn visit_card(&self, f: &mut Formatter<'_>, detail: &StaffDetail) -> fmt::Result {
        write!(
            f,
            "<div class=\"card\">\n<h4>Log Visit / Admission</h4>\n\
             <form method=\"post\" action=\"?action={LOG_VISIT}\">\
             <input type=\"hidden\" name=\"staff_id\" value=\"{}\">\
             <div class=\"row\"><input class=\"input\" name=\"date_visit\" value=\"{}\">\
             <input class=\"input\" name=\"type\" placeholder=\"Type (Exam/Treatment/Checkup)\"></div>\
             <div class=\"row\"><input class=\"input\" name=\"reason\" placeholder=\"Reason\">\
             <input class=\"input\" name=\"condition\" placeholder=\"Condition (stable/critical)\"></div>\
             <div><label><input type=\"checkbox\" name=\"admitted\" value=\"1\"> Admit patient</label></div>\
             <div class=\"row\"><input class=\"input\" name=\"date_admission\" placeholder=\"Date of admission\">\
             <select class=\"input\" name=\"outcome\"><option value=\"\">--Outcome--</option>",
            detail.staff.id,
            self.today.format("%Y-%m-%d"),
        )?;
        for outcome in Outcome::ALL {
            write!(f, "<option>{outcome}</option>")?;
        }
        f.write_str(
            "</select></div>\
             <div class=\"row\"><input class=\"input\" name=\"referral_destination\" placeholder=\"Referral destination\">\
             <input class=\"input\" name=\"discharge_date\" placeholder=\"Discharge date\"></div>\
             <div><textarea class=\"input\" name=\"notes\" placeholder=\"Notes\"></textarea></div>\
             <div style=\"margin-top:8px\"><button class=\"btn\">Save Visit</button></div></form>\n",
        )?;

        f.write_str(
            "<hr style=\"margin:12px 0\">\n<h4>Visit History</h4>\n<table class=\"table\">\n\
             <thead><tr><th>Date</th><th>Type</th><th>Condition</th><th>Admitted</th><th>Outcome</th></tr></thead>\n<tbody>\n",
        )?;
        for visit in &detail.visits {
            write!(
                f,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}",
                visit.visit_date,
                Escaped(&visit.visit_type),
                Escaped(&visit.condition),
                if visit.admitted { "Yes" } else { "No" },
                visit.outcome.as_ref().map_or("", Outcome::as_str),
            )?;
            if let Some(destination) = &visit.referral_destination {
                write!(f, " &rarr; {}", Escaped(destination))?;
            }
            f.write_str("</td></tr>\n")?;
        }
        f.write_str("</tbody>\n</table>\n</div>\n")
    }

    fn chart_script(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let stats = self.stats;
        write!(
            f,
            "<script src=\"{CHART_JS}\"></script>\n<script>\n\
             const ctx = document.getElementById('dashboardChart');\n\
             if (ctx && window.Chart) {{\n\
             new Chart(ctx, {{type: 'doughnut', data: {{\
             labels: ['Admissions','Deaths','Discharged','Referred'], \
             datasets: [{{data: [{}, {}, {}, {}], \
             backgroundColor: ['#60a5fa','#f87171','#34d399','#fbbf24']}}]}}, \
             options: {{plugins: {{legend: {{position: 'bottom'}}}}}}}});\n}}\n</script>\n",
            stats.admissions, stats.deaths, stats.discharged, stats.referred
        )
    }
}

fn registration_form(f: &mut Formatter<'_>) -> fmt::Result {
    write!(
        f,
        "<div class=\"card\">\n<h3 style=\"margin-top:0\">Register Staff</h3>\n\
         <form method=\"post\" enctype=\"multipart/form-data\" action=\"?action={CREATE_STAFF}\">\
         <div class=\"row\"><input class=\"input\" name=\"hospital_number\" placeholder=\"Hospital Number\" required>\
         <input class=\"input\" name=\"full_name\" placeholder=\"Full Name\" required></div>\
         <div class=\"row\"><input class=\"input\" name=\"dob\" placeholder=\"Date of Birth (YYYY-MM-DD)\">\
         <select class=\"input\" name=\"gender\"><option>Male</option><option>Female</option></select></div>\
         <div class=\"row\"><input class=\"input\" name=\"telephone\" placeholder=\"Telephone\">\
         <input class=\"input\" name=\"force_file_number\" placeholder=\"Force/File Number\"></div>\
         <div class=\"row\"><input class=\"input\" name=\"station\" placeholder=\"Station\">\
         <input class=\"input\" name=\"rank\" placeholder=\"Rank\"></div>\
         <div style=\"margin-top:8px\">Photo <input type=\"file\" name=\"photo\" accept=\"image/*\"></div>\
         <div style=\"margin-top:12px\"><button class=\"btn\">Save Staff</button></div></form>\n</div>\n"
    )
}

/// An `<img src>` for a stored photo, or the placeholder.
struct PhotoSrc<'a>(Option<&'a str>);

impl Display for PhotoSrc<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, "/{}", Escaped(path)),
            None => f.write_str(PLACEHOLDER_PHOTO),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::records::{Dependant, Staff, Visit};

    fn summary(id: i64, name: &str) -> StaffSummary {
        StaffSummary {
            id,
            hospital_number: format!("HN-{id}"),
            full_name: name.to_string(),
            station: "Kirikiri".to_string(),
            rank: "Inspector".to_string(),
        }
    }

    fn detail(dependants: usize) -> StaffDetail {
        StaffDetail {
            staff: Staff {
                id: 4,
                hospital_number: "HN-4".to_string(),
                full_name: "Ada <Obi>".to_string(),
                dob: String::new(),
                gender: String::new(),
                telephone: "0803".to_string(),
                force_file_number: String::new(),
                station: "Ikoyi".to_string(),
                rank: "Sergeant".to_string(),
                photo: Some("uploads/1_ada.jpg".to_string()),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            dependants: (0..dependants)
                .map(|n| Dependant {
                    id: i64::try_from(n).unwrap(),
                    staff_id: 4,
                    name: format!("Child {n}"),
                    dob: String::new(),
                    relation: "Son".to_string(),
                    photo: None,
                })
                .collect(),
            visits: vec![Visit {
                id: 1,
                staff_id: 4,
                visit_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
                reason: "Fever".to_string(),
                condition: "stable".to_string(),
                visit_type: "Exam".to_string(),
                admitted: true,
                admission_date: None,
                outcome: Some(Outcome::Referred),
                referral_destination: Some("LUTH".to_string()),
                discharge_date: None,
                notes: None,
                created_at: Utc::now(),
            }],
        }
    }

    fn render(detail: DetailPanel<'_>, notice: Option<&str>) -> String {
        let staff = [summary(1, "Bayo <script>")];
        let stats = Statistics {
            total_staff: 1,
            admissions: 7,
            ..Statistics::default()
        };
        IndexPage {
            search: "a\"12",
            notice,
            staff: &staff,
            stats: &stats,
            detail,
            today: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        }
        .to_string()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_listing_is_escaped() {
        let html = render(DetailPanel::Hidden, None);
        assert!(html.contains("Bayo &lt;script&gt;"));
        assert!(!html.contains("Bayo <script>"));
        assert!(html.contains("value=\"a&quot;12\""));
        assert!(html.contains("?action=view_staff&amp;id=1"));
        assert!(!html.contains("Staff not found"));
    }

    #[test]
    fn test_chart_carries_counters() {
        let html = render(DetailPanel::Hidden, None);
        assert!(html.contains("data: [7, 0, 0, 0]"));
        assert!(html.contains("'doughnut'"));
    }

    #[test]
    fn test_notice_is_shown() {
        let html = render(DetailPanel::Hidden, Some("Max dependants reached"));
        assert!(html.contains("<div class=\"notice\">Max dependants reached</div>"));
    }

    #[test]
    fn test_not_found_panel() {
        let html = render(DetailPanel::NotFound, None);
        assert!(html.contains("Staff not found"));
    }

    #[test]
    fn test_detail_panel() {
        let detail = detail(2);
        let html = render(DetailPanel::Staff(&detail), None);
        assert!(html.contains("Ada &lt;Obi&gt;"));
        assert!(html.contains("src=\"/uploads/1_ada.jpg\""));
        assert!(html.contains("Dependants (2/10)"));
        assert!(html.contains("name=\"dep_name\""));
        assert!(html.contains("value=\"2024-03-10\""));
        assert!(html.contains("Referred &rarr; LUTH"));
        assert!(html.contains("<td>Yes</td>"));
    }

    #[test]
    fn test_full_detail_hides_dependant_form() {
        let detail = detail(10);
        let html = render(DetailPanel::Staff(&detail), None);
        assert!(html.contains("Dependants (10/10)"));
        assert!(!html.contains("name=\"dep_name\""));
    }
}
