//! # PDF Reports
//!
//! Sizing reports rendered with Typst.
//!
//! - Templates are embedded string constants with `{{KEY}}` placeholders
//! - Values are formatted and escaped before compilation
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use shaft_core::calculations::low_speed_shaft::{calculate, FatigueMode, LowSpeedShaftInput};
//! use shaft_core::calculations::static_sizing::SupportTopology;
//! use shaft_core::config::DesignConstants;
//! use shaft_core::pdf::render_shaft_pdf;
//!
//! let input = LowSpeedShaftInput::reference_5mw(SupportTopology::FourPoint, FatigueMode::Synthesized);
//! let result = calculate(&input, &DesignConstants::default()).unwrap();
//! let pdf_bytes = render_shaft_pdf(&input, &result, "Jane Engineer", "WT-042").unwrap();
//! std::fs::write("lss_report.pdf", pdf_bytes).unwrap();
//! ```

use chrono::{Datelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::calculations::low_speed_shaft::{BearingResult, LowSpeedShaftInput, LowSpeedShaftResult};
use crate::calculations::static_sizing::SupportTopology;
use crate::calculations::{CalculationItem, CalculationOutput};
use crate::errors::{CalcError, CalcResult};
use crate::project::Project;

// ============================================================================
// Typst World Implementation
// ============================================================================

/// Single-source Typst world with the bundled fonts.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts: Vec<Font> = typst_assets::fonts()
            .flat_map(|data| Font::iter(Bytes::new(data.to_vec())))
            .collect();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(now.year(), u8::try_from(now.month()).ok()?, u8::try_from(now.day()).ok()?)
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Page setup shared by every report
const PAGE_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  margin: (top: 2.5cm, bottom: 2.5cm, left: 2.2cm, right: 2.2cm),
  header: align(right)[
    #text(size: 9pt, fill: gray)[Shaftwork Drivetrain Calculations]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Job: {{JOB_ID}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(font: "DejaVu Sans Mono", size: 10pt)
"##;

/// One low-speed shaft design
const SHAFT_TEMPLATE: &str = r##"
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[Low-Speed Shaft Sizing]
    #v(4pt)
    #text(size: 14pt)[{{LABEL}}]
  ]
]

#v(12pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 4pt,
  [Engineer:], [{{ENGINEER}}],
  [Job ID:], [{{JOB_ID}}],
  [Layout:], [{{TOPOLOGY}}, fatigue {{FATIGUE_MODE}}],
  [Bearings:], [{{UPWIND_TYPE}} upwind, {{SECOND_TYPE}} downwind],
)

== Extreme Hub Loads

#table(
  columns: (1fr, 1fr, 1fr, 1fr, 1fr, 1fr),
  inset: 6pt,
  stroke: 0.5pt,
  align: right,
  table.header([*F#sub[x] kN*], [*F#sub[y] kN*], [*F#sub[z] kN*], [*M#sub[x] kN·m*], [*M#sub[y] kN·m*], [*M#sub[z] kN·m*]),
  [{{FX}}], [{{FY}}], [{{FZ}}], [{{MX}}], [{{MY}}], [{{MZ}}],
)

#table(
  columns: (1fr, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, left),
  table.header([*Parameter*], [*Value*], [*Unit*]),
  [Rotor mass], [{{ROTOR_MASS}}], [kg],
  [Overhang], [{{OVERHANG}}], [m],
  [Shaft angle], [{{SHAFT_ANGLE}}], [deg],
  [Hub to upwind bearing], [{{L_RB}}], [m],
  [Span budget], [{{SPAN_BUDGET}}], [m],
)

== Static Sizing

$ d = ( (16 n) / (pi S_y) sqrt(4 M^2 + 3 T^2) )^(1/3) $

#table(
  columns: (1fr, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, left),
  table.header([*Dimension*], [*Value*], [*Unit*]),
  [Main span], [{{MAIN_SPAN}}], [m],
  [Gearbox span], [{{GEARBOX_SPAN}}], [m],
  [Hub seat diameter], [{{HUB_SEAT}}], [m],
  [Second seat diameter], [{{SECOND_SEAT}}], [m],
  [Bore], [{{BORE}}], [m],
  [Peak bending moment], [{{MAX_MOMENT}}], [kN·m],
)

=== Slope Checks

#table(
  columns: (1fr, auto, auto, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, right, right, center),
  table.header([*Station*], [*x (m)*], [*Slope (rad)*], [*Limit (rad)*], [*Status*]),
{{SLOPE_ROWS}}
)

== Fatigue

{{FATIGUE_BLOCK}}

== Bearings

#table(
  columns: (auto, auto, auto, auto, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, left, right, right, right, right),
  table.header([*Position*], [*Type*], [*Bore (m)*], [*Width (m)*], [*Mass (kg)*], [*C#sub[req] (kN)*]),
{{BEARING_ROWS}}
)

== Mass Properties

#table(
  columns: (1fr, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, left),
  table.header([*Property*], [*Value*], [*Unit*]),
  [Length], [{{LENGTH}}], [m],
  [Mass], [{{MASS}}], [kg],
  [Center of mass], [{{CM}}], [m],
  [Inertia (xx, yy, zz)], [{{INERTIA}}], [kg·m#super[2]],
)

#v(12pt)

#align(center)[
  #block(width: auto, fill: rgb("#d4edda"), inset: 14pt, radius: 4pt)[
    #text(size: 14pt, weight: "bold")[Governing: {{GOVERNING}}]
  ]
]
"##;

const FATIGUE_TEMPLATE: &str = r##"
$ D = integral_0^(N_"tot") (d N) / (N_f (S(N))) + n_"rot" / (N_f (S_"det")) $

#table(
  columns: (1fr, auto, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, right, right),
  table.header([*Seat*], [*Stochastic*], [*Deterministic*], [*Total*]),
{{DAMAGE_ROWS}}
)
"##;

const DISCLAIMER: &str = r##"
#v(24pt)
#line(length: 100%, stroke: 0.5pt)
#text(size: 9pt, fill: gray)[
  Generated by Shaftwork \
  Preliminary sizing; verify against certified load cases before release.
]
"##;

// ============================================================================
// Rendering
// ============================================================================

/// Render one sized shaft to PDF.
pub fn render_shaft_pdf(
    input: &LowSpeedShaftInput,
    result: &LowSpeedShaftResult,
    engineer: &str,
    job_id: &str,
) -> CalcResult<Vec<u8>> {
    let mut source = page_setup(job_id);
    source.push_str(&shaft_section(input, result, engineer, job_id));
    source.push_str(DISCLAIMER);
    compile(source)
}

/// Render every design in a project: a summary page, then one section per
/// design that sized successfully.
///
/// Designs that fail are listed in the summary with their error code.
pub fn render_project_pdf(project: &Project) -> CalcResult<Vec<u8>> {
    if project.items.is_empty() {
        return Err(CalcError::invalid_input("items", "0", "Project has no designs to export"));
    }

    let mut outcomes = project.run_all();
    let mut summary_rows = Vec::new();
    let mut sections = Vec::new();

    for (index, (id, item)) in project.items_by_label().into_iter().enumerate() {
        let CalculationItem::LowSpeedShaft(input) = item;
        match outcomes.remove(id) {
            Some(Ok(CalculationOutput::LowSpeedShaft(result))) => {
                summary_rows.push(format!(
                    "  [{}], [{}], [{:.3}], [{:.0}], [{}],",
                    index + 1,
                    escape_typst(&input.label),
                    result.hub_seat_diameter_m,
                    result.mass_kg,
                    governing(&result)
                ));
                sections.push(shaft_section(input, &result, &project.meta.engineer, &project.meta.job_id));
            }
            Some(Err(e)) => {
                summary_rows.push(format!(
                    "  [{}], [{}], [-], [-], [{}],",
                    index + 1,
                    escape_typst(&input.label),
                    e.error_code()
                ));
            }
            None => {}
        }
    }

    let mut source = page_setup(&project.meta.job_id);
    source.push_str(&format!(
        r##"
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 20pt, radius: 4pt)[
    #text(size: 22pt, weight: "bold")[Drivetrain Calculation Package]
    #v(8pt)
    #text(size: 14pt)[{turbine}]
  ]
]

#v(16pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 4pt,
  [Engineer:], [{engineer}],
  [Job ID:], [{job_id}],
  [Load basis:], [{standard}],
)

== Summary

#table(
  columns: (auto, 1fr, auto, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, left, right, right, center),
  table.header([*No.*], [*Design*], [*Hub seat (m)*], [*Mass (kg)*], [*Outcome*]),
{rows}
)
"##,
        turbine = escape_typst(&project.meta.turbine),
        engineer = escape_typst(&project.meta.engineer),
        job_id = escape_typst(&project.meta.job_id),
        standard = escape_typst(&project.settings.standard),
        rows = summary_rows.join("\n"),
    ));

    for section in sections {
        source.push_str("\n#pagebreak()\n");
        source.push_str(&section);
    }
    source.push_str(DISCLAIMER);

    compile(source)
}

fn page_setup(job_id: &str) -> String {
    PAGE_TEMPLATE
        .replace("{{JOB_ID}}", &escape_typst(job_id))
        .replace("{{DATE}}", &Utc::now().format("%Y-%m-%d").to_string())
}

fn governing(result: &LowSpeedShaftResult) -> &'static str {
    if result.fatigue_governs() {
        "fatigue"
    } else {
        "static"
    }
}

fn kilo(value: f64) -> String {
    format!("{:.1}", value / 1000.0)
}

fn triple(values: &[f64; 3], precision: usize) -> String {
    format!(
        "{:.p$}, {:.p$}, {:.p$}",
        values[0],
        values[1],
        values[2],
        p = precision
    )
}

fn bearing_row(position: &str, bearing: &BearingResult) -> String {
    let rating = bearing
        .required_rating_n
        .map(kilo)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "  [{}], [{}], [{:.3}], [{:.3}], [{:.0}], [{}],",
        position,
        bearing.seat.bearing_type.code(),
        bearing.seat.diameter_m,
        bearing.seat.face_width_m,
        bearing.assembly.mass_kg,
        rating
    )
}

fn shaft_section(input: &LowSpeedShaftInput, result: &LowSpeedShaftResult, engineer: &str, job_id: &str) -> String {
    let sizing = &result.static_sizing;
    let geometry = &sizing.geometry;
    let loads = &input.rotor_loads;

    let slope_rows = sizing
        .slopes
        .iter()
        .map(|check| {
            format!(
                "  [{}], [{:.3}], [{:.2e}], [{:.2e}], [{}],",
                escape_typst(&check.station),
                check.position_m,
                check.slope_rad,
                check.limit_rad,
                if check.margin() <= 0.0 { "OK" } else { "OVER" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let fatigue_block = match (&result.hub_seat_damage, &result.gearbox_seat_damage) {
        (None, None) => "Fatigue check not requested.".to_string(),
        (hub, gearbox) => {
            let rows = [("Hub side", hub), ("Gearbox side", gearbox)]
                .into_iter()
                .filter_map(|(name, damage)| {
                    damage.as_ref().map(|d| {
                        format!(
                            "  [{}], [{:.3e}], [{:.3e}], [{:.3}],",
                            name,
                            d.stochastic,
                            d.deterministic,
                            d.total()
                        )
                    })
                })
                .collect::<Vec<_>>()
                .join("\n");
            FATIGUE_TEMPLATE.replace("{{DAMAGE_ROWS}}", &rows)
        }
    };

    let second_position = match result.topology {
        SupportTopology::ThreePoint => "Gearbox seat",
        SupportTopology::FourPoint => "Downwind",
    };
    let bearing_rows = [
        bearing_row("Upwind", &result.upwind_bearing),
        bearing_row(second_position, &result.second_bearing),
    ]
    .join("\n");

    SHAFT_TEMPLATE
        .replace("{{LABEL}}", &escape_typst(&result.label))
        .replace("{{ENGINEER}}", &escape_typst(engineer))
        .replace("{{JOB_ID}}", &escape_typst(job_id))
        .replace("{{TOPOLOGY}}", result.topology.display_name())
        .replace("{{FATIGUE_MODE}}", result.fatigue_mode.display_name())
        .replace("{{UPWIND_TYPE}}", input.upwind_bearing.code())
        .replace("{{SECOND_TYPE}}", input.downwind_bearing.code())
        .replace("{{FX}}", &kilo(loads.fx))
        .replace("{{FY}}", &kilo(loads.fy))
        .replace("{{FZ}}", &kilo(loads.fz))
        .replace("{{MX}}", &kilo(loads.mx))
        .replace("{{MY}}", &kilo(loads.my))
        .replace("{{MZ}}", &kilo(loads.mz))
        .replace("{{ROTOR_MASS}}", &format!("{:.0}", result.rotor_mass_kg))
        .replace("{{OVERHANG}}", &format!("{:.3}", input.overhang_m))
        .replace("{{SHAFT_ANGLE}}", &format!("{:.1}", input.shaft_angle_deg))
        .replace("{{L_RB}}", &format!("{:.3}", result.hub_to_bearing_m))
        .replace("{{SPAN_BUDGET}}", &format!("{:.3}", result.span_budget_m))
        .replace("{{MAIN_SPAN}}", &format!("{:.3}", geometry.main_span_m))
        .replace("{{GEARBOX_SPAN}}", &format!("{:.3}", geometry.gearbox_span_m))
        .replace("{{HUB_SEAT}}", &format!("{:.3}", result.hub_seat_diameter_m))
        .replace("{{SECOND_SEAT}}", &format!("{:.3}", result.second_seat_diameter_m))
        .replace("{{BORE}}", &format!("{:.3}", result.bore_m))
        .replace("{{MAX_MOMENT}}", &kilo(sizing.max_moment_nm))
        .replace("{{SLOPE_ROWS}}", &slope_rows)
        .replace("{{FATIGUE_BLOCK}}", &fatigue_block)
        .replace("{{BEARING_ROWS}}", &bearing_rows)
        .replace("{{LENGTH}}", &format!("{:.3}", result.length_m))
        .replace("{{MASS}}", &format!("{:.0}", result.mass_kg))
        .replace("{{CM}}", &triple(&result.cm, 3))
        .replace("{{INERTIA}}", &triple(&result.inertia, 0))
        .replace("{{GOVERNING}}", governing(result))
}

fn compile(source: String) -> CalcResult<Vec<u8>> {
    let world = PdfWorld::new(source);
    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::Internal {
            message: format!("Typst compilation failed: {}", messages.join("; ")),
        }
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::Internal {
            message: format!("PDF rendering failed: {}", messages.join("; ")),
        }
    })
}

/// Escape Typst markup characters in user text
fn escape_typst(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::low_speed_shaft::{calculate, FatigueMode};
    use crate::config::DesignConstants;

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("LSS_1 #2"), "LSS\\_1 \\#2");
        assert_eq!(escape_typst("[a]"), "\\[a\\]");
        assert_eq!(escape_typst("plain"), "plain");
    }

    #[test]
    fn test_section_fills_every_placeholder() {
        let input = LowSpeedShaftInput::reference_5mw(SupportTopology::FourPoint, FatigueMode::Synthesized);
        let result = calculate(&input, &DesignConstants::default()).unwrap();
        let section = shaft_section(&input, &result, "Engineer", "WT-1");
        assert!(!section.contains("{{"), "unfilled placeholder in report");
        assert!(section.contains("Hub side"));
    }

    #[test]
    fn test_shaft_pdf_generation() {
        let input = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
        let result = calculate(&input, &DesignConstants::default()).unwrap();
        let pdf = render_shaft_pdf(&input, &result, "Test Engineer", "WT-001");

        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());
        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_project_pdf_lists_failed_designs() {
        let mut project = Project::new("Engineer", "WT-2", "NREL 5MW");
        project.add_item(CalculationItem::LowSpeedShaft(LowSpeedShaftInput::reference_5mw(
            SupportTopology::FourPoint,
            FatigueMode::Off,
        )));
        let mut cramped = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
        cramped.overhang_m = 1.5;
        project.add_item(CalculationItem::LowSpeedShaft(cramped));

        let pdf = render_project_pdf(&project).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_project_is_rejected() {
        let project = Project::new("Engineer", "WT-3", "Test");
        assert!(render_project_pdf(&project).is_err());
    }
}
