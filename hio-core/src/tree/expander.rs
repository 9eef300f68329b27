//! Drives the portal's collapse/expand protocol until the whole tree is rendered
//!
//! The catalog page initially shows only the faculties. Expanding a faculty
//! reveals its study courses, and the "expand all" button of a study course
//! reveals everything below it. Both steps are plain JSF actions posted once
//! per row, after which a re-fetch of the page returns the expanded markup.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::{COURSE_CATALOG_FLOW, COURSE_CATALOG_PAGE, tree_view};
use crate::error::{Error, Result};
use crate::html;
use crate::session::Portal;

static FACULTY_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^hierarchy:content-container:courseCatalogFieldset:courseCatalog:0:\d+:row$")
        .expect("static regex")
});
static STUDY_COURSE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^hierarchy:content-container:courseCatalogFieldset:courseCatalog:0:\d+:\d+:row$")
        .expect("static regex")
});

static DIV: LazyLock<Selector> = LazyLock::new(|| html::selector("div"));
static BUTTON: LazyLock<Selector> = LazyLock::new(|| html::selector("button"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    Unexpanded,
    FacultiesExpanded,
    FullyExpanded,
}

/// Which of a row's buttons triggers the expansion
#[derive(Debug, Clone, Copy)]
enum Trigger {
    FirstButton,
    LastButton,
}

/// A (source control, action) pair to post for one row
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowAction {
    source: String,
    action: String,
}

pub struct TreeExpander<'a, P: Portal> {
    portal: &'a P,
    execution_key: String,
    state: ExpansionState,
}

impl<'a, P: Portal> TreeExpander<'a, P> {
    /// Open the course catalog flow.
    pub fn start(portal: &'a P) -> Result<Self> {
        let flow = portal.start_flow(COURSE_CATALOG_FLOW, &[])?;
        Ok(Self {
            portal,
            execution_key: flow.execution_key,
            state: ExpansionState::Unexpanded,
        })
    }

    pub fn state(&self) -> ExpansionState {
        self.state
    }

    /// Run every remaining transition and return the fully expanded tree view.
    pub fn expand(mut self) -> Result<Html> {
        loop {
            match self.state {
                ExpansionState::Unexpanded => {
                    self.expand_rows(&FACULTY_ROW, Trigger::FirstButton)?;
                    self.state = ExpansionState::FacultiesExpanded;
                }
                ExpansionState::FacultiesExpanded => {
                    self.expand_rows(&STUDY_COURSE_ROW, Trigger::LastButton)?;
                    self.state = ExpansionState::FullyExpanded;
                }
                ExpansionState::FullyExpanded => {
                    let document = self.fetch_tree()?;
                    let legend = tree_view(&document)?.legend;
                    tracing::info!("Course catalog '{}' fully expanded", legend);
                    return Ok(document);
                }
            }
        }
    }

    fn fetch_tree(&self) -> Result<Html> {
        self.portal.fetch_page(
            COURSE_CATALOG_PAGE,
            COURSE_CATALOG_FLOW,
            &self.execution_key,
            Some(200),
        )
    }

    /// Post the expand action of every row whose id matches `rows`.
    ///
    /// All actions are collected before the first post so that a row missing
    /// its ids aborts the run without leaving a half-expanded tree behind.
    fn expand_rows(&self, rows: &Regex, trigger: Trigger) -> Result<()> {
        let document = self.fetch_tree()?;
        let view = tree_view(&document)?;

        let actions = html::find_by_id_pattern(view.body, rows)
            .map(|row| row_action(row, trigger))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Expanding {} rows ({:?})", actions.len(), self.state);

        for RowAction { source, action } in &actions {
            self.portal.submit_action(
                COURSE_CATALOG_PAGE,
                COURSE_CATALOG_FLOW,
                &self.execution_key,
                source,
                action,
                true,
            )?;
        }

        Ok(())
    }
}

fn row_action(row: ElementRef<'_>, trigger: Trigger) -> Result<RowAction> {
    let action = html::first(row, &DIV)
        .and_then(|div| div.value().id())
        .ok_or_else(|| Error::not_found("tree row action"))?;

    let mut buttons = row.select(&BUTTON);
    let button = match trigger {
        Trigger::FirstButton => buttons.next(),
        Trigger::LastButton => buttons.last(),
    };
    let source = button
        .and_then(|button| button.value().id())
        .ok_or_else(|| Error::not_found("tree row source"))?;

    Ok(RowAction {
        source: source.to_string(),
        action: action.to_string(),
    })
}
