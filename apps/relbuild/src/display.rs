//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use relbuild_ops::{
    BuildReport, OperationResult, PopulateReport, PublishReport, SignReport, SweepReport,
};
use relbuild_types::TagAdvisory;
use std::io;

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    json_output: bool,
}

impl OutputRenderer {
    #[must_use]
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render operation result
    pub fn render_result(self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            let json = result.to_json().map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            OperationResult::Build(report) => render_build_report(report),
            OperationResult::Sign(report) => render_sign_report(report),
            OperationResult::Populate(report) => render_populate_report(report),
            OperationResult::Publish(report) => render_publish_report(report),
            OperationResult::Sweep(report) => render_sweep_report(report),
        }
        Ok(())
    }
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h)));
    table
}

fn render_build_report(report: &BuildReport) {
    if !report.records.is_empty() {
        let mut table = table(&["Package", "Version", "Reason", "Source", "Binaries"]);
        for record in &report.records {
            table.add_row(vec![
                Cell::new(&record.package),
                Cell::new(format!("{}-{}", record.version, record.release)),
                Cell::new(record.reason),
                Cell::new(if record.fetched { "fetched" } else { "built" }),
                Cell::new(record.binary_packages.len()),
            ]);
        }
        println!("{table}");
    }

    println!(
        "{}: {} built, {} fetched in {:.1}s",
        report.operation,
        report.built(),
        report.fetched(),
        seconds(report.duration_ms)
    );
    if let Some(population) = &report.population {
        render_populate_report(population);
    }
    if let Some(signing) = &report.signing {
        render_sign_report(signing);
    }
}

fn render_sign_report(report: &SignReport) {
    let summary = &report.summary;
    println!(
        "Signed {} artifact(s) under {} ({} already signed) in {:.1}s",
        summary.signed,
        report.root.display(),
        summary.already_signed,
        seconds(report.duration_ms)
    );
}

fn render_populate_report(report: &PopulateReport) {
    println!(
        "Populated {} from {} record(s): {} binary, {} source package(s)",
        report.rpm_dir.display(),
        report.records,
        report.binaries,
        report.sources
    );
    if report.skipped_sources > 0 {
        println!(
            "  {} unsigned source package(s) skipped",
            report.skipped_sources
        );
    }
}

fn render_publish_report(report: &PublishReport) {
    let mut table = table(&["Package", "Version", "Release", "Status", "Tag"]);
    for status in &report.targets {
        let state = if status.publish_required {
            format!("publish required ({})", status.reason)
        } else {
            "published".to_string()
        };
        table.add_row(vec![
            Cell::new(&status.package),
            Cell::new(&status.version),
            Cell::new(&status.release),
            Cell::new(state),
            Cell::new(status.tag.as_ref().map_or_else(String::new, tag_text)),
        ]);
    }
    println!("{table}");
    println!(
        "{} of {} target(s) need publishing, {} need a tag",
        report.pending().count(),
        report.targets.len(),
        report.tag_owed().count()
    );
}

fn render_sweep_report(report: &SweepReport) {
    println!("{}: {} director(ies) done", report.task, report.directories);
}

fn tag_text(advisory: &TagAdvisory) -> String {
    match advisory {
        TagAdvisory::NoTag => "none, tag owed".to_string(),
        TagAdvisory::TagOwed { tag } => format!("{tag}, tag owed"),
        TagAdvisory::UpToDate { tag } => tag.clone(),
        TagAdvisory::Indeterminate { tag } => format!("{tag}?"),
        TagAdvisory::Unparseable { tag } => format!("{tag} (unparseable)"),
    }
}

#[allow(clippy::cast_precision_loss)]
fn seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
