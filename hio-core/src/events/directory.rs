use std::collections::{BTreeMap, HashMap};

use super::{Directory, DirectoryEvent, ExportResult, expand_parallel_group};
use crate::error::{Error, Result};
use crate::model::{
    CourseCatalog, Faculty, ModuleGroup, ModulePart, ParallelGroup, SiblingKey, SubModule, UnitId,
};

/// Build the export directory tree and every event list of `catalog`.
///
/// Walks every faculty, study course and module group in tree order. Modules
/// holding a single part are flattened into their parent, and empty branches
/// are dropped. Each parallel group becomes one directory entry whose events
/// are its expanded schedule rows.
///
/// # Returns
/// One directory per faculty plus the event lists keyed by entry id. Fails
/// when the catalog references a module, part or room it does not contain.
pub fn expand_events(catalog: &CourseCatalog) -> Result<ExportResult> {
    let mut expander = EventExpander {
        catalog,
        events: BTreeMap::new(),
    };

    let directories = catalog
        .faculties
        .iter()
        .map(|faculty| expander.faculty(faculty))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        "Expanded {} event lists for {} faculties",
        expander.events.len(),
        directories.len()
    );

    Ok(ExportResult {
        directories,
        events: expander.events,
    })
}

struct EventExpander<'a> {
    catalog: &'a CourseCatalog,
    events: BTreeMap<String, Vec<super::Event>>,
}

impl<'a> EventExpander<'a> {
    fn faculty(&mut self, faculty: &Faculty) -> Result<Directory> {
        let mut directory = Directory::new(faculty.name.as_str());

        for course in &faculty.study_courses {
            let groups = self.module_groups(&course.module_groups)?;
            if groups.is_empty() {
                continue;
            }
            let mut course_directory = Directory::new(format!("{} ({})", course.name, course.po));
            course_directory.sub_directories = groups;
            directory.sub_directories.push(course_directory);
        }

        if directory
            .sub_directories
            .iter()
            .all(|course| course.sub_directories.is_empty())
        {
            directory.sub_directories.clear();
        }

        Ok(directory)
    }

    fn module_groups(&mut self, groups: &BTreeMap<SiblingKey, ModuleGroup>) -> Result<Vec<Directory>> {
        let mut directories = Vec::new();

        for group in groups.values() {
            let mut directory = Directory::new(group.name.as_str());
            directory.sub_directories = self.module_groups(&group.sub_groups)?;

            for module_id in group.modules.values() {
                let module = self
                    .catalog
                    .modules
                    .get(module_id)
                    .ok_or_else(|| Error::not_found(format!("module {}", module_id)))?;
                self.module(&module.name, &module.parts, &module.sub_modules, &mut directory)?;
            }

            if !directory.is_empty() {
                directories.push(directory);
            }
        }

        Ok(directories)
    }

    /// Emit a module or sub-module into `parent`, flattening it away when it
    /// holds a single part.
    fn module(
        &mut self,
        name: &str,
        parts: &BTreeMap<SiblingKey, UnitId>,
        sub_modules: &BTreeMap<SiblingKey, SubModule>,
        parent: &mut Directory,
    ) -> Result<()> {
        let direct = parts.len();
        let nested: usize = sub_modules.values().map(SubModule::part_count).sum();

        match (direct, nested) {
            (0, 0) => {
                tracing::debug!("Skipping module '{}' since it is empty", name);
            }
            (1, 0) => {
                let part = self.part(parts.values().next())?;
                self.module_part(part, parent)?;
            }
            (0, 1) => {
                let part = self.part(first_nested_part(sub_modules))?;
                self.module_part(part, parent)?;
            }
            _ => {
                let mut directory = Directory::new(name);

                for part_id in parts.values() {
                    let part = self.part(Some(part_id))?;
                    self.module_part(part, &mut directory)?;
                }
                for sub_module in sub_modules.values() {
                    self.module(
                        &sub_module.name,
                        &sub_module.parts,
                        &sub_module.sub_modules,
                        &mut directory,
                    )?;
                }

                if !directory.is_empty() {
                    parent.sub_directories.push(directory);
                }
            }
        }

        Ok(())
    }

    fn part(&self, id: Option<&UnitId>) -> Result<&'a ModulePart> {
        let id = id.ok_or_else(|| Error::not_found("module part of single-part module"))?;
        self.catalog
            .module_parts
            .get(id)
            .ok_or_else(|| Error::not_found(format!("module part {}", id)))
    }

    fn module_part(&mut self, part: &ModulePart, parent: &mut Directory) -> Result<()> {
        match part.parallel_groups.as_slice() {
            [] => {}
            [group] => {
                let id = format!("{}_1", part.id);
                let name = match &part.short_name {
                    Some(short_name) => format!("{} ({})", short_name, part.name),
                    None => part.name.clone(),
                };
                self.emit(group, id, name, parent)?;
            }
            groups => {
                let mut directory = Directory::new(part.name.as_str());

                let mut sorted: Vec<&ParallelGroup> = groups.iter().collect();
                sorted.sort_by(|a, b| a.short_name.cmp(&b.short_name));

                let mut taken: HashMap<String, usize> = HashMap::new();
                for group in sorted {
                    let base = match group.group_number {
                        Some(number) => format!("{}_{}", part.id, number),
                        None => format!("{}_x", part.id),
                    };
                    // Groups without (or with repeated) numbers would share an id.
                    let seen = taken.entry(base.clone()).or_insert(0);
                    *seen += 1;
                    let id = if *seen == 1 {
                        base
                    } else {
                        format!("{}-{}", base, seen)
                    };

                    self.emit(group, id, group_display_name(group, part), &mut directory)?;
                }

                parent.sub_directories.push(directory);
            }
        }

        Ok(())
    }

    fn emit(
        &mut self,
        group: &ParallelGroup,
        id: String,
        name: String,
        directory: &mut Directory,
    ) -> Result<()> {
        let events = expand_parallel_group(group, &id, &name, &self.catalog.rooms)?;
        directory.events.push(DirectoryEvent {
            id: id.clone(),
            name,
        });
        self.events.insert(id, events);
        Ok(())
    }
}

fn group_display_name(group: &ParallelGroup, part: &ModulePart) -> String {
    match (&group.short_name, &group.name) {
        (Some(short_name), Some(name)) => format!("{} ({})", short_name, name),
        (Some(only), None) | (None, Some(only)) => only.clone(),
        (None, None) => part.name.clone(),
    }
}

/// Depth-first search, highest sibling key first, for the first sub-module
/// holding a part.
fn first_nested_part(sub_modules: &BTreeMap<SiblingKey, SubModule>) -> Option<&UnitId> {
    let mut stack: Vec<&SubModule> = sub_modules.values().collect();

    while let Some(sub_module) = stack.pop() {
        if let Some(part) = sub_module.parts.values().next() {
            return Some(part);
        }
        stack.extend(sub_module.sub_modules.values());
    }

    None
}
