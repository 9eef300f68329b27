//! Course catalog tree: expansion over the session and decoding into a catalog

mod decoder;
mod expander;

pub use decoder::{Container, DecodedTree, RowKind, Slot, decode_tree, parse_row_path, resolve_slot};
pub use expander::{ExpansionState, TreeExpander};

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::html;

pub const COURSE_CATALOG_FLOW: &str = "showCourseCatalog-flow";
pub const COURSE_CATALOG_PAGE: &str = "cm/exa/coursecatalog/showCourseCatalog.xhtml";

const TREE_FIELDSET_ID: &str =
    "hierarchy:content-container:courseCatalogFieldset:courseCatalogFieldset_innerFieldset";

static LEGEND: LazyLock<Selector> = LazyLock::new(|| html::selector("legend"));
static TREE_TABLE: LazyLock<Selector> = LazyLock::new(|| html::selector(".treeTableWithIcons"));

/// The rendered tree: its caption and the table body holding one row per node
pub(crate) struct TreeView<'a> {
    pub legend: String,
    pub body: ElementRef<'a>,
}

pub(crate) fn tree_view(document: &Html) -> Result<TreeView<'_>> {
    let fieldset = html::find_by_id(document.root_element(), TREE_FIELDSET_ID)
        .ok_or_else(|| Error::not_found("course catalog fieldset"))?;
    let legend = html::first(fieldset, &LEGEND)
        .map(html::text)
        .ok_or_else(|| Error::not_found("course catalog legend"))?;
    let body = html::first(fieldset, &TREE_TABLE)
        .and_then(html::first_element_child)
        .ok_or_else(|| Error::not_found("course catalog tree table"))?;

    Ok(TreeView { legend, body })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Markup shaped like the portal's tree view

    pub const PREFIX: &str = "hierarchy:content-container:courseCatalogFieldset:courseCatalog:0:";

    pub fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <fieldset id="hierarchy:content-container:courseCatalogFieldset:courseCatalogFieldset_innerFieldset">
              <legend>Vorlesungsverzeichnis</legend>
              <table class="treeTableWithIcons"><tbody>{}</tbody></table>
            </fieldset></body></html>"#,
            rows
        )
    }

    pub fn group_row(path: &str, icon: &str, name: &str) -> String {
        format!(
            r#"<tr id="{p}{path}:row"><td><div id="{p}{path}:action"><button id="{p}{path}:toggle"></button>
               <img title="{icon}"/><span class="treeElementName">{name}</span>
               <button id="{p}{path}:expandAll"></button></div></td></tr>"#,
            p = PREFIX,
            path = path,
            icon = icon,
            name = name
        )
    }

    pub fn heading_row(path: &str, name: &str) -> String {
        format!(
            r#"<tr id="{p}{path}:row"><td><div id="{p}{path}:action"><button id="{p}{path}:toggle"></button>
               <img title="Überschriftenelement"/><span id="{p}{path}:ot_3">{name}</span></div></td></tr>"#,
            p = PREFIX,
            path = path,
            name = name
        )
    }

    pub fn unit_row(path: &str, icon: &str, unit_id: u64, text: &str) -> String {
        format!(
            r#"<tr id="{p}{path}:row"><td><img title="{icon}"/>
               <a href="/qisserver/pages/startFlow.xhtml?_flowId=detailView-flow&amp;unitId={id}&amp;periodId=11">{text}</a></td></tr>"#,
            p = PREFIX,
            path = path,
            icon = icon,
            id = unit_id,
            text = text
        )
    }

    pub fn permalink_row(period_id: u64) -> String {
        format!(
            r#"<tr><td><span id="{p}unitLeafElementRootPermalink:permalinkPopup:permalink">https://hio.example.edu/qisserver/pages/cm/exa/coursecatalog/showCourseCatalog.xhtml?_flowId=showCourseCatalog-flow&amp;periodId={id}</span></td></tr>"#,
            p = PREFIX,
            id = period_id
        )
    }
}
