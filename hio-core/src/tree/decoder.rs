//! Decoder from the expanded tree markup to a [`CourseCatalog`]
//!
//! Every tree row carries its position in the hierarchy inside its id, e.g.
//! `...:courseCatalog:0:3:1:0:2:row` is the third child of the first child of
//! the second study course of the fourth faculty. Rows appear top-down, so by
//! the time a row is decoded all of its ancestors already exist in the catalog
//! and the path can be walked against the partially built structure.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::tree_view;
use crate::error::{Error, Result};
use crate::html;
use crate::model::{
    CourseCatalog, Faculty, Module, ModuleGroup, ModulePart, ModulePartType, SiblingKey,
    StudyCourse, SubModule, UnitId,
};

const ROW_PREFIX: &str = "hierarchy:content-container:courseCatalogFieldset:courseCatalog:0:";
const ROW_SUFFIX: &str = ":row";
const PERMALINK_ID: &str = "hierarchy:content-container:courseCatalogFieldset:courseCatalog:0:unitLeafElementRootPermalink:permalinkPopup:permalink";
const UNKNOWN_ELEMENT: &str = "Unbekanntes Element";

static UNIT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"unitId=(\d+)").expect("static regex"));
static PERIOD_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"periodId=(\d+)").expect("static regex"));

static IMG: LazyLock<Selector> = LazyLock::new(|| html::selector("img"));
static LINK: LazyLock<Selector> = LazyLock::new(|| html::selector("a"));
static ELEMENT_NAME: LazyLock<Selector> = LazyLock::new(|| html::selector(".treeElementName"));

/// Result of decoding one expanded tree
#[derive(Debug)]
pub struct DecodedTree {
    /// Academic period the catalog belongs to
    pub period_id: u64,
    pub catalog: CourseCatalog,
}

/// Row classification, taken from the title of the row's icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Heading,
    Account,
    SubModule,
    Module,
    ModulePart,
}

impl RowKind {
    pub fn from_icon_title(title: &str) -> Option<Self> {
        match title {
            "Überschriftenelement" => Some(RowKind::Heading),
            "Konto" => Some(RowKind::Account),
            "Teilmodul" => Some(RowKind::SubModule),
            "Modul" => Some(RowKind::Module),
            "Veranstaltung" => Some(RowKind::ModulePart),
            _ => None,
        }
    }

    fn is_group_like(self) -> bool {
        matches!(self, RowKind::Heading | RowKind::Account | RowKind::SubModule)
    }
}

/// The collection a decoded node is inserted into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Faculties,
    StudyCourses {
        faculty: usize,
    },
    /// Sub-groups of the group reached via `groups`, or the study course's
    /// top-level groups when `groups` is empty
    ModuleGroups {
        faculty: usize,
        course: usize,
        groups: Vec<SiblingKey>,
    },
    /// Module slots of the group reached via `groups`
    GroupModules {
        faculty: usize,
        course: usize,
        groups: Vec<SiblingKey>,
    },
    /// Sub-modules of the sub-module reached via `chain`, or of the module
    /// itself when `chain` is empty
    SubModules {
        module: UnitId,
        chain: Vec<SiblingKey>,
    },
    ModuleParts {
        module: UnitId,
    },
    /// Parts of the sub-module reached via `chain` (never empty)
    SubModuleParts {
        module: UnitId,
        chain: Vec<SiblingKey>,
    },
}

/// Where a node goes: its container plus its sibling key inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub container: Container,
    pub key: SiblingKey,
}

/// Decode the fully expanded tree view.
pub fn decode_tree(document: &Html) -> Result<DecodedTree> {
    let view = tree_view(document)?;
    let mut catalog = CourseCatalog::default();

    for row in html::child_elements(view.body) {
        decode_row(row, &mut catalog)?;
    }

    let period_id = html::find_by_id(view.body, PERMALINK_ID)
        .map(html::own_text)
        .and_then(|permalink| html::capture_id(&PERIOD_ID, &permalink))
        .ok_or_else(|| Error::not_found("periodId"))?;

    tracing::info!(
        "Decoded catalog for period {}: {} faculties, {} modules, {} module parts",
        period_id,
        catalog.faculties.len(),
        catalog.modules.len(),
        catalog.module_parts.len()
    );

    Ok(DecodedTree { period_id, catalog })
}

/// Extract the sibling-index path encoded in a row id.
///
/// Returns `Ok(None)` for ids that are not tree rows.
pub fn parse_row_path(row_id: &str) -> Result<Option<Vec<SiblingKey>>> {
    let Some(encoded) = row_id
        .strip_prefix(ROW_PREFIX)
        .and_then(|rest| rest.strip_suffix(ROW_SUFFIX))
    else {
        return Ok(None);
    };
    if encoded.is_empty() {
        return Ok(None);
    }

    encoded
        .split(':')
        .map(|segment| {
            segment
                .parse::<SiblingKey>()
                .map_err(|_| Error::parse("tree row path", row_id))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn decode_row(row: ElementRef<'_>, catalog: &mut CourseCatalog) -> Result<()> {
    let Some(row_id) = row.value().id() else {
        return Ok(());
    };
    let Some(path) = parse_row_path(row_id)? else {
        return Ok(());
    };
    let Some(kind) = html::first(row, &IMG)
        .and_then(|img| img.value().attr("title"))
        .and_then(RowKind::from_icon_title)
    else {
        return Ok(());
    };

    let Some(slot) = resolve_slot(catalog, &path, kind)? else {
        tracing::warn!(
            "Skipping {:?} row {}: its module is not part of the catalog",
            kind,
            row_id
        );
        return Ok(());
    };

    match kind {
        RowKind::Heading | RowKind::Account | RowKind::SubModule => {
            let name = group_name(row, row_id, kind);
            insert_group_like(catalog, slot, name)
        }
        RowKind::Module => {
            let (id, name) = unit_link(row)?;
            insert_module_ref(catalog, &slot, id)?;
            catalog.modules.insert(id, Module::new(id, name));
            Ok(())
        }
        RowKind::ModulePart => {
            let (id, title) = unit_link(row)?;
            let (number, name, part_type) = split_part_title(&title);
            insert_part_ref(catalog, &slot, id)?;
            catalog
                .module_parts
                .insert(id, ModulePart::new(id, name, number, part_type));
            Ok(())
        }
    }
}

/// Work out where the node at `path` belongs.
///
/// This is the only place that interprets path arithmetic. `Ok(None)` means a
/// module part whose owning module is absent, which the portal occasionally
/// produces and which is skipped rather than treated as fatal.
pub fn resolve_slot(
    catalog: &CourseCatalog,
    path: &[SiblingKey],
    kind: RowKind,
) -> Result<Option<Slot>> {
    let last = *path
        .last()
        .ok_or_else(|| Error::not_found("tree row path"))?;

    if kind.is_group_like() && path.len() == 1 {
        return Ok(Some(Slot {
            container: Container::Faculties,
            key: last,
        }));
    }

    let faculty = path[0] as usize;
    let study_courses = &catalog
        .faculties
        .get(faculty)
        .ok_or_else(|| Error::not_found(format!("faculty {}", faculty)))?
        .study_courses;

    if kind.is_group_like() && path.len() == 2 {
        return Ok(Some(Slot {
            container: Container::StudyCourses { faculty },
            key: last,
        }));
    }

    let course = *path
        .get(1)
        .ok_or_else(|| Error::not_found("study course segment"))? as usize;
    let top_groups = &study_courses
        .get(course)
        .ok_or_else(|| Error::not_found(format!("study course {}:{}", faculty, course)))?
        .module_groups;

    match kind {
        RowKind::Heading | RowKind::Account | RowKind::SubModule => {
            let below = &path[2..];
            let (consumed, group) = walk_groups(top_groups, below);
            let groups = below[..consumed].to_vec();

            // The first segment that is not a group may address a module, in
            // which case a "Teilmodul" row is a sub-module of that module.
            let anchor = 2 + consumed.min(path.len() - 3);
            let module = group
                .and_then(|group| group.modules.get(&path[anchor]))
                .and_then(|id| catalog.modules.get(id));

            match module {
                Some(module) if kind == RowKind::SubModule => {
                    let rest = &path[anchor + 1..];
                    let depth = walk_sub_modules(&module.sub_modules, rest);
                    Ok(Some(Slot {
                        container: Container::SubModules {
                            module: module.id,
                            chain: rest[..depth].to_vec(),
                        },
                        key: last,
                    }))
                }
                _ => Ok(Some(Slot {
                    container: Container::ModuleGroups {
                        faculty,
                        course,
                        groups,
                    },
                    key: last,
                })),
            }
        }

        RowKind::Module => {
            if path.len() < 4 {
                return Err(Error::not_found(format!("module group for {:?}", path)));
            }
            let groups = &path[2..path.len() - 1];
            let (consumed, _) = walk_groups(top_groups, groups);
            if consumed != groups.len() {
                return Err(Error::not_found(format!("module group for {:?}", path)));
            }

            Ok(Some(Slot {
                container: Container::GroupModules {
                    faculty,
                    course,
                    groups: groups.to_vec(),
                },
                key: last,
            }))
        }

        RowKind::ModulePart => {
            if path.len() < 4 {
                return Err(Error::not_found(format!("module for part {:?}", path)));
            }
            let (consumed, group) = walk_groups(top_groups, &path[2..]);
            let Some(group) = group else {
                return Err(Error::not_found(format!("module group for part {:?}", path)));
            };

            let anchor = 2 + consumed.min(path.len() - 3);
            let Some(module) = group
                .modules
                .get(&path[anchor])
                .and_then(|id| catalog.modules.get(id))
            else {
                return Ok(None);
            };

            if anchor == path.len() - 2 {
                return Ok(Some(Slot {
                    container: Container::ModuleParts { module: module.id },
                    key: last,
                }));
            }
            if anchor == path.len() - 1 {
                return Err(Error::not_found(format!("module part segment in {:?}", path)));
            }

            let head = path[anchor + 1];
            let first = module.sub_modules.get(&head).ok_or_else(|| {
                Error::not_found(format!("sub-module {} of module {}", head, module.id))
            })?;
            let rest = &path[anchor + 2..];
            let depth = walk_sub_modules(&first.sub_modules, rest);
            let key_index = (anchor + 2 + depth).min(path.len() - 1);

            Ok(Some(Slot {
                container: Container::SubModuleParts {
                    module: module.id,
                    chain: path[anchor + 1..anchor + 2 + depth].to_vec(),
                },
                key: path[key_index],
            }))
        }
    }
}

/// Follow `keys` through nested module groups for as long as they resolve.
///
/// Returns how many keys were consumed and the deepest group reached.
fn walk_groups<'g>(
    mut groups: &'g BTreeMap<SiblingKey, ModuleGroup>,
    keys: &[SiblingKey],
) -> (usize, Option<&'g ModuleGroup>) {
    let mut deepest = None;
    for (consumed, key) in keys.iter().enumerate() {
        match groups.get(key) {
            Some(group) => {
                deepest = Some(group);
                groups = &group.sub_groups;
            }
            None => return (consumed, deepest),
        }
    }
    (keys.len(), deepest)
}

fn walk_sub_modules(mut sub_modules: &BTreeMap<SiblingKey, SubModule>, keys: &[SiblingKey]) -> usize {
    for (consumed, key) in keys.iter().enumerate() {
        match sub_modules.get(key) {
            Some(sub_module) => sub_modules = &sub_module.sub_modules,
            None => return consumed,
        }
    }
    keys.len()
}

fn sub_groups_mut<'g>(
    groups: &'g mut BTreeMap<SiblingKey, ModuleGroup>,
    chain: &[SiblingKey],
) -> Option<&'g mut BTreeMap<SiblingKey, ModuleGroup>> {
    chain
        .iter()
        .try_fold(groups, |groups, key| groups.get_mut(key).map(|group| &mut group.sub_groups))
}

fn sub_modules_mut<'m>(
    sub_modules: &'m mut BTreeMap<SiblingKey, SubModule>,
    chain: &[SiblingKey],
) -> Option<&'m mut BTreeMap<SiblingKey, SubModule>> {
    chain.iter().try_fold(sub_modules, |sub_modules, key| {
        sub_modules
            .get_mut(key)
            .map(|sub_module| &mut sub_module.sub_modules)
    })
}

fn course_groups_mut(
    catalog: &mut CourseCatalog,
    faculty: usize,
    course: usize,
) -> Result<&mut BTreeMap<SiblingKey, ModuleGroup>> {
    catalog
        .faculties
        .get_mut(faculty)
        .and_then(|faculty| faculty.study_courses.get_mut(course))
        .map(|course| &mut course.module_groups)
        .ok_or_else(|| Error::not_found(format!("study course {}:{}", faculty, course)))
}

fn module_mut(catalog: &mut CourseCatalog, module: UnitId) -> Result<&mut Module> {
    catalog
        .modules
        .get_mut(&module)
        .ok_or_else(|| Error::not_found(format!("module {}", module)))
}

fn insert_group_like(catalog: &mut CourseCatalog, slot: Slot, name: String) -> Result<()> {
    match slot.container {
        Container::Faculties => catalog.faculties.push(Faculty {
            name,
            study_courses: Vec::new(),
        }),
        Container::StudyCourses { faculty } => {
            let (name, po) = split_program_code(&name);
            catalog
                .faculties
                .get_mut(faculty)
                .ok_or_else(|| Error::not_found(format!("faculty {}", faculty)))?
                .study_courses
                .push(StudyCourse {
                    name,
                    po,
                    module_groups: BTreeMap::new(),
                });
        }
        Container::ModuleGroups {
            faculty,
            course,
            groups,
        } => {
            let top = course_groups_mut(catalog, faculty, course)?;
            sub_groups_mut(top, &groups)
                .ok_or_else(|| Error::not_found(format!("module group {:?}", groups)))?
                .insert(slot.key, ModuleGroup::new(name));
        }
        Container::SubModules { module, chain } => {
            let module = module_mut(catalog, module)?;
            sub_modules_mut(&mut module.sub_modules, &chain)
                .ok_or_else(|| Error::not_found(format!("sub-module {:?}", chain)))?
                .insert(slot.key, SubModule::new(name));
        }
        other => {
            return Err(Error::not_found(format!("group container, got {:?}", other)));
        }
    }
    Ok(())
}

fn insert_module_ref(catalog: &mut CourseCatalog, slot: &Slot, id: UnitId) -> Result<()> {
    let Container::GroupModules {
        faculty,
        course,
        groups,
    } = &slot.container
    else {
        return Err(Error::not_found(format!("module container, got {:?}", slot.container)));
    };
    let (leaf, parents) = groups
        .split_last()
        .ok_or_else(|| Error::not_found("module group"))?;

    let top = course_groups_mut(catalog, *faculty, *course)?;
    sub_groups_mut(top, parents)
        .and_then(|groups| groups.get_mut(leaf))
        .ok_or_else(|| Error::not_found(format!("module group {:?}", groups)))?
        .modules
        .insert(slot.key, id);
    Ok(())
}

fn insert_part_ref(catalog: &mut CourseCatalog, slot: &Slot, id: UnitId) -> Result<()> {
    match &slot.container {
        Container::ModuleParts { module } => {
            module_mut(catalog, *module)?.parts.insert(slot.key, id);
        }
        Container::SubModuleParts { module, chain } => {
            let (leaf, parents) = chain
                .split_last()
                .ok_or_else(|| Error::not_found("sub-module"))?;
            let module = module_mut(catalog, *module)?;
            sub_modules_mut(&mut module.sub_modules, parents)
                .and_then(|sub_modules| sub_modules.get_mut(leaf))
                .ok_or_else(|| Error::not_found(format!("sub-module {:?}", chain)))?
                .parts
                .insert(slot.key, id);
        }
        other => {
            return Err(Error::not_found(format!("module part container, got {:?}", other)));
        }
    }
    Ok(())
}

fn group_name(row: ElementRef<'_>, row_id: &str, kind: RowKind) -> String {
    let element = if kind == RowKind::Heading {
        let name_id = format!("{}:ot_3", &row_id[..row_id.len() - ROW_SUFFIX.len()]);
        html::find_by_id(row, &name_id)
    } else {
        html::first(row, &ELEMENT_NAME)
    };

    element
        .map(html::own_text)
        .unwrap_or_else(|| UNKNOWN_ELEMENT.to_string())
}

fn unit_link(row: ElementRef<'_>) -> Result<(UnitId, String)> {
    let link = html::first(row, &LINK).ok_or_else(|| Error::not_found("unit link"))?;
    let href = link
        .value()
        .attr("href")
        .ok_or_else(|| Error::not_found("unit link target"))?;
    let id = html::capture_id(&UNIT_ID, href)
        .ok_or_else(|| Error::not_found(format!("unitId in '{}'", href)))?;

    Ok((id, html::own_text(link)))
}

/// "Informatik (2020)" -> ("Informatik", "2020")
fn split_program_code(name: &str) -> (String, String) {
    let course = name.split_once(" (").map_or(name, |(course, _)| course);
    let po = name
        .split_once('(')
        .map_or(name, |(_, po)| po)
        .trim_end_matches(')');
    (course.to_string(), po.to_string())
}

/// "1INF-MA1.LV Mathematik 1 - Vorlesung" -> ("1INF-MA1.LV", "Mathematik 1", Lecture)
fn split_part_title(title: &str) -> (String, String, ModulePartType) {
    let (number, rest) = title.split_once(' ').unwrap_or((title, title));
    let name = rest.split(" - ").next().unwrap_or(rest);
    let type_str = rest.rsplit(" - ").next().unwrap_or(rest);

    (
        number.to_string(),
        name.to_string(),
        ModulePartType::from_portal_str(type_str),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::{self, PREFIX};

    fn sample_rows() -> Vec<String> {
        vec![
            fixtures::group_row("0", "Konto", "Fakultät Informatik"),
            fixtures::group_row("0:0", "Konto", "Informatik (2020)"),
            fixtures::heading_row("0:0:0", "Pflichtmodule"),
            fixtures::unit_row("0:0:0:0", "Modul", 100, "Mathematik 1"),
            fixtures::unit_row("0:0:0:0:0", "Veranstaltung", 1000, "1INF-MA1.LV Mathematik 1 - Vorlesung"),
            fixtures::unit_row("0:0:0:0:1", "Veranstaltung", 1001, "1INF-MA1.UE Mathematik 1 - Übung"),
            fixtures::group_row("0:0:0:1", "Konto", "Vertiefung"),
            fixtures::unit_row("0:0:0:1:0", "Modul", 101, "Programmierung"),
            fixtures::group_row("0:0:0:1:0:0", "Teilmodul", "Teil A"),
            fixtures::unit_row("0:0:0:1:0:0:0", "Veranstaltung", 1010, "1INF-PR.A Programmierung A - Seminar"),
            fixtures::group_row("0:0:0:1:0:0:1", "Teilmodul", "Teil A.1"),
            fixtures::unit_row("0:0:0:1:0:0:1:0", "Veranstaltung", 1011, "1INF-PR.A1 Programmierung A1 - Projekt"),
            fixtures::group_row("1", "Konto", "Fakultät Soziales"),
            fixtures::group_row("1:0", "Konto", "Soziale Arbeit (2019)"),
        ]
    }

    fn decode(rows: &[String]) -> Result<DecodedTree> {
        let body = format!("{}{}", rows.concat(), fixtures::permalink_row(42));
        decode_tree(&Html::parse_document(&fixtures::page(&body)))
    }

    fn path_of(row: &str) -> Vec<SiblingKey> {
        let start = row.find(PREFIX).unwrap();
        let end = row[start..].find("\"").unwrap() + start;
        parse_row_path(&row[start..end]).unwrap().unwrap()
    }

    /// Re-derive every node's path from the built catalog's key structure
    fn catalog_paths(catalog: &CourseCatalog) -> Vec<Vec<SiblingKey>> {
        fn sub_modules(
            catalog_paths: &mut Vec<Vec<SiblingKey>>,
            prefix: &[SiblingKey],
            map: &BTreeMap<SiblingKey, SubModule>,
        ) {
            for (key, sub_module) in map {
                let path = [prefix, &[*key]].concat();
                catalog_paths.push(path.clone());
                for part_key in sub_module.parts.keys() {
                    catalog_paths.push([path.as_slice(), &[*part_key]].concat());
                }
                sub_modules(catalog_paths, &path, &sub_module.sub_modules);
            }
        }

        fn groups(
            catalog: &CourseCatalog,
            out: &mut Vec<Vec<SiblingKey>>,
            prefix: &[SiblingKey],
            map: &BTreeMap<SiblingKey, ModuleGroup>,
        ) {
            for (key, group) in map {
                let path = [prefix, &[*key]].concat();
                out.push(path.clone());
                for (module_key, module_id) in &group.modules {
                    let module_path = [path.as_slice(), &[*module_key]].concat();
                    out.push(module_path.clone());
                    let module = &catalog.modules[module_id];
                    for part_key in module.parts.keys() {
                        out.push([module_path.as_slice(), &[*part_key]].concat());
                    }
                    sub_modules(out, &module_path, &module.sub_modules);
                }
                groups(catalog, out, &path, &group.sub_groups);
            }
        }

        let mut out = Vec::new();
        for (f, faculty) in catalog.faculties.iter().enumerate() {
            out.push(vec![f as SiblingKey]);
            for (c, course) in faculty.study_courses.iter().enumerate() {
                let path = vec![f as SiblingKey, c as SiblingKey];
                out.push(path.clone());
                groups(catalog, &mut out, &path, &course.module_groups);
            }
        }
        out
    }

    #[test]
    fn test_parse_row_path() {
        assert_eq!(
            parse_row_path(&format!("{}3:1:0:row", PREFIX)).unwrap(),
            Some(vec![3, 1, 0])
        );
        assert_eq!(parse_row_path(&format!("{}row", PREFIX)).unwrap(), None);
        assert_eq!(parse_row_path("someOtherElement:row").unwrap(), None);
        assert!(parse_row_path(&format!("{}3:x:row", PREFIX)).is_err());
    }

    #[test]
    fn test_decode_builds_hierarchy() {
        let decoded = decode(&sample_rows()).unwrap();
        let catalog = &decoded.catalog;

        assert_eq!(decoded.period_id, 42);
        assert_eq!(catalog.faculties.len(), 2);

        let course = &catalog.faculties[0].study_courses[0];
        assert_eq!(course.name, "Informatik");
        assert_eq!(course.po, "2020");

        let mandatory = &course.module_groups[&0];
        assert_eq!(mandatory.name, "Pflichtmodule");
        assert_eq!(mandatory.modules[&0], 100);
        assert_eq!(mandatory.sub_groups[&1].modules[&0], 101);

        let maths = &catalog.modules[&100];
        assert_eq!(maths.parts.values().copied().collect::<Vec<_>>(), vec![1000, 1001]);

        let programming = &catalog.modules[&101];
        let part_a = &programming.sub_modules[&0];
        assert_eq!(part_a.name, "Teil A");
        assert_eq!(part_a.parts[&0], 1010);
        assert_eq!(part_a.sub_modules[&1].parts[&0], 1011);

        let lecture = &catalog.module_parts[&1000];
        assert_eq!(lecture.number, "1INF-MA1.LV");
        assert_eq!(lecture.name, "Mathematik 1");
        assert_eq!(lecture.part_type, ModulePartType::Lecture);
        assert_eq!(
            catalog.module_parts[&1001].part_type,
            ModulePartType::TheoreticalExercise
        );
    }

    #[test]
    fn test_paths_round_trip() {
        let rows = sample_rows();
        let decoded = decode(&rows).unwrap();

        let mut expected: Vec<_> = rows.iter().map(|row| path_of(row)).collect();
        let mut derived = catalog_paths(&decoded.catalog);
        expected.sort();
        derived.sort();

        assert_eq!(derived, expected);
    }

    #[test]
    fn test_part_of_unknown_module_is_skipped() {
        let mut rows = sample_rows();
        rows.push(fixtures::unit_row("0:0:0:7", "Veranstaltung", 1999, "X Verwaist - Seminar"));
        let decoded = decode(&rows).unwrap();
        assert!(!decoded.catalog.module_parts.contains_key(&1999));
    }

    #[test]
    fn test_missing_period_is_fatal() {
        let page = fixtures::page(&sample_rows().concat());
        let result = decode_tree(&Html::parse_document(&page));
        assert!(matches!(result, Err(Error::NotFound(what)) if what == "periodId"));
    }

    #[test]
    fn test_resolve_slot_for_nested_sub_module_part() {
        let decoded = decode(&sample_rows()).unwrap();
        let slot = resolve_slot(&decoded.catalog, &[0, 0, 0, 1, 0, 0, 1, 3], RowKind::ModulePart)
            .unwrap()
            .unwrap();
        assert_eq!(
            slot,
            Slot {
                container: Container::SubModuleParts {
                    module: 101,
                    chain: vec![0, 1],
                },
                key: 3,
            }
        );
    }

    #[test]
    fn test_resolve_slot_distinguishes_sub_module_from_group() {
        let decoded = decode(&sample_rows()).unwrap();

        let sub_module = resolve_slot(&decoded.catalog, &[0, 0, 0, 0, 5], RowKind::SubModule)
            .unwrap()
            .unwrap();
        assert_eq!(
            sub_module.container,
            Container::SubModules {
                module: 100,
                chain: vec![],
            }
        );

        // an account at the same position stays a plain group
        let group = resolve_slot(&decoded.catalog, &[0, 0, 0, 0, 5], RowKind::Account)
            .unwrap()
            .unwrap();
        assert_eq!(
            group.container,
            Container::ModuleGroups {
                faculty: 0,
                course: 0,
                groups: vec![0],
            }
        );
    }

    #[test]
    fn test_references_land_in_deepest_container() {
        let mut catalog = decode(&sample_rows()).unwrap().catalog;

        let module_slot = Slot {
            container: Container::GroupModules {
                faculty: 0,
                course: 0,
                groups: vec![0, 1],
            },
            key: 4,
        };
        insert_module_ref(&mut catalog, &module_slot, 555).unwrap();
        let course = &catalog.faculties[0].study_courses[0];
        assert_eq!(course.module_groups[&0].sub_groups[&1].modules[&4], 555);
        assert!(!course.module_groups[&0].modules.contains_key(&4));

        let part_slot = Slot {
            container: Container::SubModuleParts {
                module: 101,
                chain: vec![0, 1],
            },
            key: 2,
        };
        insert_part_ref(&mut catalog, &part_slot, 5550).unwrap();
        let part_a = &catalog.modules[&101].sub_modules[&0];
        assert_eq!(part_a.sub_modules[&1].parts[&2], 5550);
        assert!(!part_a.parts.contains_key(&2));

        let missing = Slot {
            container: Container::GroupModules {
                faculty: 0,
                course: 0,
                groups: vec![0, 9],
            },
            key: 0,
        };
        assert!(matches!(
            insert_module_ref(&mut catalog, &missing, 556),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_split_helpers() {
        assert_eq!(
            split_program_code("Soziale Arbeit (2019)"),
            ("Soziale Arbeit".to_string(), "2019".to_string())
        );
        let (number, name, part_type) = split_part_title("1AI-ENG1.LV Englisch - Teil 1 - Seminar");
        assert_eq!(number, "1AI-ENG1.LV");
        assert_eq!(name, "Englisch");
        assert_eq!(part_type, ModulePartType::Seminar);
    }
}
