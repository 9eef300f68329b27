//! Enrichment of the decoded catalog from the per-unit detail pages

mod naming;
mod schedule;

pub use naming::{GroupNaming, derive_group_naming, group_number};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::html::{self, Labels};
use crate::model::{
    CourseCatalog, Module, ModuleInterval, ModulePart, ModuleType, ParallelGroup, Room, RoomId,
    UnitId,
};
use crate::session::Portal;

pub const DETAIL_FLOW: &str = "detailView-flow";

static PARALLEL_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^detailViewData:tabContainer:term-planning-container:parallelGroupSchedule_\d+$")
        .expect("static regex")
});

static HEADING: LazyLock<Selector> = LazyLock::new(|| html::selector("h3"));
static BOX_CONTENT: LazyLock<Selector> = LazyLock::new(|| html::selector(".box_content"));
static SCHEDULE_TABLE: LazyLock<Selector> = LazyLock::new(|| html::selector(".tableWithBorder"));
static TABLE_BODY: LazyLock<Selector> = LazyLock::new(|| html::selector("tbody"));

/// Visits the detail page of every module and module part, one at a time.
pub struct DetailEnricher<'a, P: Portal> {
    portal: &'a P,
    period_id: u64,
}

impl<'a, P: Portal> DetailEnricher<'a, P> {
    pub fn new(portal: &'a P, period_id: u64) -> Self {
        Self { portal, period_id }
    }

    /// Fill in module metadata, then module part metadata and schedules.
    pub fn enrich(&self, catalog: &mut CourseCatalog) -> Result<()> {
        self.for_each_unit(&mut catalog.modules, "module", |module, document| {
            apply_module_details(module, document);
            Ok(())
        })?;

        let CourseCatalog {
            module_parts,
            rooms,
            ..
        } = catalog;
        self.for_each_unit(module_parts, "module part", |part, document| {
            apply_module_part_details(part, document, rooms)
        })
    }

    fn for_each_unit<T>(
        &self,
        units: &mut BTreeMap<UnitId, T>,
        kind: &str,
        mut apply: impl FnMut(&mut T, &Html) -> Result<()>,
    ) -> Result<()> {
        let total = units.len();

        for (i, (unit_id, unit)) in units.iter_mut().enumerate() {
            let done = i + 1;
            tracing::info!(
                "Getting details page for {} {} ({}/{} | {} %)",
                kind,
                unit_id,
                done,
                total,
                done * 100 / total
            );

            let page = self.portal.start_flow(
                DETAIL_FLOW,
                &[
                    ("unitId", unit_id.to_string()),
                    ("periodId", self.period_id.to_string()),
                ],
            )?;
            apply(unit, &page.document)?;
        }

        Ok(())
    }
}

/// Copy the labelled fields of a module detail page into `module`.
///
/// Numbers that do not parse are left empty.
pub fn apply_module_details(module: &mut Module, document: &Html) {
    let root = document.root_element();
    let labels = Labels::collect(root);

    module.short_name = labels.text("Kurztext");
    module.long_name = labels.text("Langtext");
    module.number = labels.text("Nummer");
    module.language = labels.text("Lehrsprache");
    module.module_type = Some(ModuleType::from_portal_str(
        &labels.text("Teilnahmepflicht").unwrap_or_default(),
    ));
    module.recommended_semester = labels.text("Empfohlenes FS").and_then(|s| s.parse().ok());
    module.organisational_unit = labels.text("Einrichtungen");
    module.weekly_hours = labels
        .text("Semesterwochenstunden")
        .and_then(|s| s.parse().ok());
    // "2 Semester"
    module.duration = html::description_text(root, "Moduldauer")
        .and_then(|d| d.split(' ').next().and_then(|n| n.parse().ok()));
    module.interval = ModuleInterval::from_portal_str(
        &html::description_text(root, "Angebotshäufigkeit").unwrap_or_default(),
    );
}

/// Copy the labelled fields and parallel groups of a module part detail page
/// into `part`, registering every room referenced by a schedule.
pub fn apply_module_part_details(
    part: &mut ModulePart,
    document: &Html,
    rooms: &mut BTreeMap<RoomId, Room>,
) -> Result<()> {
    let root = document.root_element();
    let labels = Labels::collect(root);

    part.short_name = labels.text("Kurztext");
    part.long_name = labels.text("Langtext");
    part.short_comment = labels.text("Kurzkommentar");
    part.organisational_unit = labels.text("Organisationseinheit");
    part.interval = Some(ModuleInterval::from_portal_str(
        &labels.text("Angebotshäufigkeit").unwrap_or_default(),
    ));
    part.weekly_hours = labels
        .text("Semesterwochenstunden")
        .map(|s| parse_decimal("module part weekly hours", &s))
        .transpose()?;
    part.enrollment_time_ranges = labels.text("Zeitraum");

    // Capacity is only ever shown once per page, outside of the group boxes.
    let max_participant_count = labels
        .text("Maximale Anzahl Teilnehmer/-innen")
        .map(|s| s.parse::<u32>().map_err(|_| Error::parse("max participant count", s)))
        .transpose()?;

    let sections: Vec<_> = html::find_by_id_pattern(root, &PARALLEL_GROUP).collect();
    let is_only_group = sections.len() == 1;

    let groups = sections
        .into_iter()
        .map(|section| {
            parse_parallel_group(section, part, is_only_group, max_participant_count, rooms)
        })
        .collect::<Result<Vec<_>>>()?;
    part.parallel_groups.extend(groups);

    Ok(())
}

fn parse_parallel_group(
    section: ElementRef<'_>,
    part: &ModulePart,
    is_only_group: bool,
    max_participant_count: Option<u32>,
    rooms: &mut BTreeMap<RoomId, Room>,
) -> Result<ParallelGroup> {
    let title = html::first(section, &HEADING)
        .map(html::own_text)
        .ok_or_else(|| Error::not_found("parallel group title"))?;
    let naming = derive_group_naming(&title, part, is_only_group);

    let content = html::first(section, &BOX_CONTENT)
        .ok_or_else(|| Error::not_found("parallel group box content"))?;
    let labels = Labels::collect(content);

    let weekly_hours = labels
        .text("Semesterwochenstunden")
        .ok_or_else(|| Error::not_found(format!("weekly hours of parallel group '{}'", title)))
        .and_then(|s| parse_decimal("parallel group weekly hours", &s))?;

    let instructors = labels
        .value("Verantwortliche/-r")
        .and_then(html::first_element_child)
        .map(|list| html::child_elements(list).map(html::text).collect());

    let dates = match html::first(content, &SCHEDULE_TABLE)
        .and_then(|table| html::first(table, &TABLE_BODY))
    {
        Some(body) => schedule::parse_schedule(body, rooms)?,
        None => Vec::new(),
    };

    Ok(ParallelGroup {
        short_name: naming.short_name,
        name: naming.name,
        group_number: naming.group_number,
        weekly_hours,
        language: labels.text("Lehrsprache"),
        instructors,
        max_participant_count,
        dates,
        original_title: title,
    })
}

/// Decimal numbers use either a comma or a dot.
fn parse_decimal(field: &'static str, s: &str) -> Result<f64> {
    s.trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| Error::parse(field, s))
}
