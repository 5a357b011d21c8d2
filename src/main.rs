use std::{fs, sync::LazyLock};

use chemgraph::{Catalog, Model, Molecule};
use cml_convert::{Convention, ExportOptions, ImportOptions, export, import_bytes};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, IntoDiagnostic, Report, Result, bail};
use rust_decimal::Decimal;
use rustyline::DefaultEditor;

static CATALOG: LazyLock<Catalog> = LazyLock::new(Catalog::default);

// NOTE: Each line is a path, optionally followed by a convention to re-export the file in:
// `ethanol.cml chemdraw`
fn main() -> Result<()> {
    let mut rl = DefaultEditor::new().into_diagnostic()?;
    while let Ok(line) = rl.readline("CML File: ") {
        rl.add_history_entry(&line).into_diagnostic()?;
        match cml_info(&line) {
            Ok(info) => print!("{info}"),
            Err(report) => render_error(&report),
        }
    }
    Ok(())
}

fn cml_info(line: &str) -> Result<String> {
    let mut words = line.split_whitespace();
    let Some(path) = words.next() else {
        bail!("expected the path of a CML file");
    };
    let convention = words.next().map(parse_convention).transpose()?;

    let raw = fs::read(path).into_diagnostic()?;
    let model = import_bytes(&CATALOG, &raw, &ImportOptions::default());
    let mut buf = summary(&model);

    if let Some(convention) = convention {
        let options = ExportOptions {
            compressed: false,
            convention,
        };
        buf.push_str(&export(&model, &options)?);
        buf.push('\n');
    }
    buf.push('\n');

    Ok(buf)
}

fn parse_convention(name: &str) -> Result<Convention> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "default" | "cml" => Convention::Default,
        "chemdraw" => Convention::ChemDraw,
        "marvin" | "marvinjs" => Convention::MarvinJs,
        _ => bail!("unknown convention {name:?} (expected default, chemdraw, or marvin)"),
    })
}

fn summary(model: &Model) -> String {
    let mut lines = vec![format!("Molecules: {}", model.molecule_count())];
    for (_, molecule) in model.molecules() {
        lines.push(molecule_line(molecule));
    }
    lines.push(format!("Reaction Schemes: {}", model.reaction_schemes.len()));
    lines.push(format!("Annotations: {}", model.annotations.len()));

    for (heading, messages) in [("Errors", model.all_errors()), ("Warnings", model.all_warnings())] {
        if !messages.is_empty() {
            lines.push(format!("{heading}:"));
            lines.extend(messages.iter().map(|m| format!("  {m}")));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

fn molecule_line(molecule: &Molecule) -> String {
    let properties = molecule.properties();
    format!(
        "  {}: {} ({} g/mol), {} atoms, {} ring atoms",
        molecule.id,
        properties.formula(),
        decimal_round_workaround(properties.weight(), 4),
        molecule.total_atom_count(),
        properties.ring_atom_count()
    )
}

fn render_error(report: &Report) {
    let mut buf = String::new();
    let diagnostic: &dyn Diagnostic = report.as_ref();
    let rendered = GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic);
    if rendered.is_ok() {
        println!("{buf}");
    } else {
        println!("{report}");
    }
}

// FIXME: Really this should be fixed in `rust_decimal`...
fn decimal_round_workaround(value: Decimal, decimal_points: u32) -> String {
    let value = value.round_dp(decimal_points);
    format!("{value}")
}
