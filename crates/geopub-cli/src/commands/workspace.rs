use super::{json_pretty, run_mutation, EXIT_FAILURE, EXIT_SUCCESS};
use dialoguer::Confirm;
use geopub_core::GeoServerManager;
use std::io::{stderr, stdin, IsTerminal};

pub fn create(
    manager: &GeoServerManager,
    name: &str,
    uri: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    run_mutation("create workspace", name, json, || {
        manager.create_workspace(name, uri)
    })
}

/// Remove a workspace with everything in it, asking first on a terminal.
pub fn remove(manager: &GeoServerManager, name: &str, yes: bool, json: bool) -> Result<u8, String> {
    if !yes {
        let is_tty = stdin().is_terminal() && stderr().is_terminal();
        if !is_tty {
            return Err(format!(
                "invalid input: removing workspace {name} deletes everything in it; pass --yes"
            ));
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("remove workspace {name} and all its stores, layers and styles?"))
            .default(false)
            .interact()
            .map_err(|e| format!("prompt failed: {e}"))?;
        if !confirmed {
            eprintln!("aborted");
            return Ok(EXIT_FAILURE);
        }
    }
    run_mutation("remove workspace", name, json, || manager.remove_workspace(name))
}

pub fn ensure(manager: &GeoServerManager, name: &str, json: bool) -> Result<u8, String> {
    let created = manager.ensure_workspace(name).map_err(|e| e.to_string())?;
    if json {
        let payload = serde_json::json!({ "workspace": name, "created": created });
        println!("{}", json_pretty(&payload)?);
    } else if created {
        println!("created workspace {name}");
    } else {
        println!("workspace {name} already exists");
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopub_core::GeoServerConfig;
    use geopub_rest::mock::MockTransport;
    use std::sync::Arc;

    fn manager(mock: MockTransport) -> GeoServerManager {
        GeoServerManager::with_transport(GeoServerConfig::new("http://gs"), Arc::new(mock))
    }

    #[test]
    fn create_then_duplicate() {
        let mgr = manager(MockTransport::new());
        assert_eq!(create(&mgr, "topp", None, false).unwrap(), EXIT_SUCCESS);
        let err = create(&mgr, "topp", None, false).unwrap_err();
        assert_eq!(err, "workspace already exists: topp");
    }

    #[test]
    fn remove_with_yes_skips_prompt() {
        let mgr = manager(MockTransport::new().with_workspace("topp"));
        assert_eq!(remove(&mgr, "topp", true, true).unwrap(), EXIT_SUCCESS);
        assert!(!mgr.reader().exists_workspace("topp").unwrap());
    }

    #[test]
    fn ensure_existing_is_success() {
        let mgr = manager(MockTransport::new().with_workspace("shp"));
        assert_eq!(ensure(&mgr, "shp", false).unwrap(), EXIT_SUCCESS);
    }
}
