//! Release promotion phase selectors.
//!
//! A phase selector includes the tasks of every earlier phase too; those are
//! optimized away downstream but keep the dependency edges intact.

use std::collections::HashSet;

use ciselect_core::{Parameters, ShippingPhase, Task, TaskGraph};
use ciselect_filters::filter_out_missing_signoffs;

use crate::common::select;
use crate::context::SelectionContext;
use crate::error::Result;
use crate::registry::{selector_fn, RegistryError, SelectorRegistry};

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register("promote_desktop", selector_fn!(promote_desktop))?;
    registry.register("push_desktop", selector_fn!(push_desktop))?;
    registry.register("ship_desktop", selector_fn!(ship_desktop))?;
    Ok(())
}

fn is_rc(parameters: &Parameters) -> Result<bool> {
    Ok(parameters.release_type()? == "release-rc")
}

/// Whether `task` belongs to `phase` of the product being released.
fn in_phase(task: &Task, parameters: &Parameters, phase: ShippingPhase) -> Result<bool> {
    let product = parameters.str_or("release_product", "")?;
    if task.attr_str("shipping_product")? != Some(product) {
        return Ok(false);
    }
    Ok(task
        .attr_str("shipping_phase")?
        .and_then(ShippingPhase::parse)
        == Some(phase))
}

/// `promote` tasks of the release product. Secondary tasks only run for RCs.
pub fn promote_desktop(graph: &TaskGraph, parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    let rc = is_rc(parameters)?;
    select(graph, |task| {
        if !filter_out_missing_signoffs(task, parameters)? {
            return Ok(false);
        }
        if !rc && task.kind.contains("secondary") {
            return Ok(false);
        }
        in_phase(task, parameters, ShippingPhase::Promote)
    })
}

/// Promotion tasks plus `push` tasks.
pub fn push_desktop(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    let promoted = promote_desktop(graph, parameters, ctx)?;
    let promoted: HashSet<&str> = promoted.iter().map(String::as_str).collect();
    select(graph, |task| {
        if !filter_out_missing_signoffs(task, parameters)? {
            return Ok(false);
        }
        if promoted.contains(task.label.as_str()) {
            return Ok(true);
        }
        in_phase(task, parameters, ShippingPhase::Push)
    })
}

/// `ship` tasks on top of the phase they follow: `promote` for RCs,
/// `push` otherwise.
pub fn ship_desktop(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    let rc = is_rc(parameters)?;
    let base = if rc {
        promote_desktop(graph, parameters, ctx)?
    } else {
        push_desktop(graph, parameters, ctx)?
    };
    let base: HashSet<&str> = base.iter().map(String::as_str).collect();
    select(graph, |task| {
        if !filter_out_missing_signoffs(task, parameters)? {
            return Ok(false);
        }
        if base.contains(task.label.as_str()) {
            return Ok(true);
        }
        if !in_phase(task, parameters, ShippingPhase::Ship)? {
            return Ok(false);
        }
        Ok(rc || !task.kind.contains("secondary"))
    })
}
