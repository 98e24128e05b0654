use super::{colorize_bool, json_pretty, EXIT_SUCCESS};
use clap::ValueEnum;
use geopub_core::{GeoError, GeoServerReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceArg {
    Workspace,
    Datastore,
    Coveragestore,
    Layer,
    Layergroup,
    Style,
}

impl ResourceArg {
    fn label(self) -> &'static str {
        match self {
            ResourceArg::Workspace => "workspace",
            ResourceArg::Datastore => "data store",
            ResourceArg::Coveragestore => "coverage store",
            ResourceArg::Layer => "layer",
            ResourceArg::Layergroup => "layer group",
            ResourceArg::Style => "style",
        }
    }
}

fn scoped<'a>(kind: ResourceArg, workspace: Option<&'a str>) -> Result<&'a str, String> {
    workspace.ok_or_else(|| format!("invalid input: a {} query needs --workspace", kind.label()))
}

pub fn exists(
    reader: &GeoServerReader,
    kind: ResourceArg,
    name: &str,
    workspace: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let found = match kind {
        ResourceArg::Workspace => reader.exists_workspace(name),
        ResourceArg::Datastore => reader.exists_datastore(scoped(kind, workspace)?, name),
        ResourceArg::Coveragestore => reader.exists_coverage_store(scoped(kind, workspace)?, name),
        ResourceArg::Layer => reader.exists_layer(scoped(kind, workspace)?, name),
        ResourceArg::Layergroup => reader.exists_layer_group(scoped(kind, workspace)?, name),
        ResourceArg::Style => match workspace {
            Some(ws) => reader.exists_style_in_workspace(ws, name),
            None => reader.exists_style(name),
        },
    }
    .map_err(|e: GeoError| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "kind": kind.label(),
            "name": name,
            "workspace": workspace,
            "exists": found,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        let qualified = match workspace {
            Some(ws) if kind != ResourceArg::Workspace => format!("{ws}:{name}"),
            _ => name.to_owned(),
        };
        println!("{} {qualified}: {}", kind.label(), colorize_bool(found));
    }
    Ok(EXIT_SUCCESS)
}

pub fn list(
    reader: &GeoServerReader,
    kind: ResourceArg,
    workspace: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let names = match kind {
        ResourceArg::Workspace => reader.workspaces(),
        ResourceArg::Datastore => reader.datastores(scoped(kind, workspace)?),
        ResourceArg::Coveragestore => reader.coverage_stores(scoped(kind, workspace)?),
        ResourceArg::Layer => match workspace {
            Some(ws) => reader.layers(ws),
            None => reader.all_layers(),
        },
        ResourceArg::Layergroup => reader.layer_groups(scoped(kind, workspace)?),
        ResourceArg::Style => match workspace {
            Some(ws) => reader.styles_in_workspace(ws),
            None => reader.styles(),
        },
    }
    .map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&names)?);
    } else if names.is_empty() {
        println!("no {}s found", kind.label());
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    Ok(EXIT_SUCCESS)
}
